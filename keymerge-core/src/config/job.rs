use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::{
    color::KeyColor,
    error::{KeymergeError, KeymergeResult},
};

/// JSON manifest describing one merge.
///
/// ```json
/// { "color": "#00ff00", "layers": ["base.png", "top.png"], "out": "merged.png" }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Job {
    /// Key color as a hex string. Missing or malformed means white.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Layer files, base first.
    pub layers: Vec<PathBuf>,
    /// Output PNG path. When absent the result goes to the output store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<PathBuf>,
}

impl Job {
    /// Parse a manifest from a JSON reader. Paths are left as written.
    pub fn from_reader<R: std::io::Read>(r: R) -> KeymergeResult<Self> {
        serde_json::from_reader(r).map_err(|e| KeymergeError::serde(format!("parse job JSON: {e}")))
    }

    /// Parse a manifest from disk, resolving relative paths against its directory.
    pub fn from_path(path: impl AsRef<Path>) -> KeymergeResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open job '{}'", path.display()))?;
        let job = Self::from_reader(BufReader::new(f))?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(job.resolved_against(root))
    }

    /// Rebase relative layer and output paths onto `root`.
    pub fn resolved_against(mut self, root: &Path) -> Self {
        for layer in &mut self.layers {
            if layer.is_relative() {
                *layer = root.join(&*layer);
            }
        }
        if let Some(out) = self.out.as_mut()
            && out.is_relative()
        {
            *out = root.join(&*out);
        }
        self
    }

    /// Key color for this job, defaulting to white.
    pub fn key_color(&self) -> KeyColor {
        self.color
            .as_deref()
            .map(KeyColor::parse_or_default)
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/job.rs"]
mod tests;

use std::{
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::{DynamicImage, ImageFormat};

use crate::foundation::error::{KeymergeError, KeymergeResult};

/// Options for writing a merged image to disk.
#[derive(Clone, Debug)]
pub struct PngOutOpts {
    /// Output PNG path.
    pub out_path: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
}

impl PngOutOpts {
    /// Options for writing to `out_path`, replacing any existing file.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
        }
    }
}

/// Encode `img` as lossless PNG bytes, keeping its bit depth.
pub fn encode_png(img: &DynamicImage) -> KeymergeResult<Vec<u8>> {
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Encode `img` and write it to `opts.out_path`, creating parent directories.
pub fn write_png(img: &DynamicImage, opts: &PngOutOpts) -> KeymergeResult<()> {
    ensure_parent_dir(&opts.out_path)?;
    if !opts.overwrite && opts.out_path.exists() {
        return Err(KeymergeError::Other(anyhow::anyhow!(
            "output file '{}' already exists",
            opts.out_path.display()
        )));
    }

    let bytes = encode_png(img)?;
    std::fs::write(&opts.out_path, bytes)
        .with_context(|| format!("write png '{}'", opts.out_path.display()))?;
    tracing::debug!(path = %opts.out_path.display(), "wrote png");
    Ok(())
}

/// Create the parent directory of `path` if it has one.
pub fn ensure_parent_dir(path: &Path) -> KeymergeResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/png.rs"]
mod tests;

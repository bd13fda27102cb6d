use std::{
    fs::OpenOptions,
    io::{ErrorKind, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use image::DynamicImage;
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    encode::png::encode_png,
    foundation::error::{KeymergeError, KeymergeResult},
};

/// Suggested file name when a stored output is handed to a user.
pub const DOWNLOAD_NAME: &str = "combined.png";

const MAX_ID_ATTEMPTS: usize = 8;

/// Source of output ids. Ids must match `[0-9a-z]+`.
pub trait IdGenerator: Send {
    /// Produce the next id.
    fn next_id(&mut self) -> String;
}

/// Random ids: a non-negative 63-bit integer rendered in base 36.
#[derive(Debug)]
pub struct RandomIds {
    rng: StdRng,
}

impl RandomIds {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic generator for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> String {
        to_base36(self.rng.random::<u64>() >> 1)
    }
}

/// Counter ids `0`, `1`, ..., `a`, `b`, ... in base 36.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    /// Counter starting at `start`.
    pub fn starting_at(start: u64) -> Self {
        Self { next: start }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = to_base36(self.next);
        self.next = self.next.wrapping_add(1);
        id
    }
}

/// Render `v` in lowercase base 36.
pub fn to_base36(mut v: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if v == 0 {
        return "0".to_owned();
    }
    let mut out = Vec::with_capacity(13);
    while v > 0 {
        out.push(DIGITS[(v % 36) as usize]);
        v /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}

/// Merged image persisted by [`OutputStore::save`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredOutput {
    /// Id to look the output up again.
    pub id: String,
    /// Location of the PNG on disk.
    pub path: PathBuf,
}

/// Directory of merged PNGs addressed by generated ids.
pub struct OutputStore {
    dir: PathBuf,
    ids: Box<dyn IdGenerator>,
}

impl std::fmt::Debug for OutputStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStore")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

impl OutputStore {
    /// Store rooted at `dir` that names outputs with `ids`.
    pub fn new(dir: impl Into<PathBuf>, ids: impl IdGenerator + 'static) -> Self {
        Self {
            dir: dir.into(),
            ids: Box::new(ids),
        }
    }

    /// Store rooted at `dir` with OS-seeded random ids.
    pub fn with_random_ids(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, RandomIds::new())
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Encode `img` as PNG under a fresh id. Never replaces an existing output.
    #[tracing::instrument(skip_all, fields(dir = %self.dir.display()))]
    pub fn save(&mut self, img: &DynamicImage) -> KeymergeResult<StoredOutput> {
        let bytes = encode_png(img)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create output directory '{}'", self.dir.display()))?;

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = self.ids.next_id();
            let path = self.path_for(&id)?;
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(f) => f,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    tracing::debug!(%id, "id already taken");
                    continue;
                }
                Err(err) => {
                    return Err(anyhow::Error::new(err)
                        .context(format!("create output '{}'", path.display()))
                        .into());
                }
            };
            file.write_all(&bytes)
                .with_context(|| format!("write output '{}'", path.display()))?;
            tracing::debug!(%id, "stored output");
            return Ok(StoredOutput { id, path });
        }
        Err(KeymergeError::Other(anyhow::anyhow!(
            "no free output id after {MAX_ID_ATTEMPTS} attempts in '{}'",
            self.dir.display()
        )))
    }

    /// Path of the output named `id`. The file need not exist.
    pub fn path_for(&self, id: &str) -> KeymergeResult<PathBuf> {
        if id.is_empty()
            || !id
                .bytes()
                .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
        {
            return Err(KeymergeError::invalid_id(format!("{id:?}")));
        }
        Ok(self.dir.join(format!("{id}.png")))
    }

    /// Read the PNG bytes stored under `id`.
    pub fn open(&self, id: &str) -> KeymergeResult<Vec<u8>> {
        let path = self.path_for(id)?;
        if !path.is_file() {
            return Err(KeymergeError::not_found(format!("output {id}")));
        }
        let bytes =
            std::fs::read(&path).with_context(|| format!("read output '{}'", path.display()))?;
        Ok(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/output.rs"]
mod tests;

use std::path::Path;

use anyhow::Context;
use image::DynamicImage;

use crate::KeymergeResult;

/// Decode encoded image bytes into a layer, sniffing the format from the bytes.
///
/// The layer keeps its native pixel format; no conversion happens here.
pub fn decode_layer(bytes: &[u8]) -> KeymergeResult<DynamicImage> {
    let img = image::load_from_memory(bytes).context("decode image from memory")?;
    Ok(img)
}

/// Read and decode one layer from disk.
pub fn load_layer(path: &Path) -> KeymergeResult<DynamicImage> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read layer '{}'", path.display()))?;
    let img =
        decode_layer(&bytes).with_context(|| format!("decode layer '{}'", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        width = img.width(),
        height = img.height(),
        color = ?img.color(),
        "loaded layer"
    );
    Ok(img)
}

/// Read and decode layers in order, stopping at the first failure.
pub fn load_layers<P: AsRef<Path>>(paths: &[P]) -> KeymergeResult<Vec<DynamicImage>> {
    paths.iter().map(|p| load_layer(p.as_ref())).collect()
}

/// Split a newline-separated list of layer locations.
///
/// Carriage returns are dropped, entries are trimmed and blank entries skipped.
pub fn parse_layer_list(list: &str) -> Vec<String> {
    list.replace('\r', "")
        .split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

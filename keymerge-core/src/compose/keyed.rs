use std::borrow::Cow;

use image::{DynamicImage, Rgba};

use crate::{
    foundation::color::KeyColor,
    foundation::error::{KeymergeError, KeymergeResult},
    raster::view::{Raster, WorkingBuffer, WorkingPixel, fits_in_8_bits, to_working_buffer},
};

/// Merge an ordered layer stack, filling key-colored pixels from later layers.
///
/// - no layers: `Ok(None)`
/// - one layer: that layer, borrowed and untouched
/// - two or more: a new image with the base layer's bounds
///
/// A pixel is replaced by layer `L` only while the merged pixel still has the key's
/// RGB, the candidate's RGB differs from the key, and the candidate is not fully
/// transparent. The candidate's alpha is taken along with its color. Every overlay
/// must have the base's dimensions.
///
/// The result is RGBA8 when every layer stores at most 8 bits per channel and
/// RGBA16 otherwise. Either way exactly one buffer is allocated.
#[tracing::instrument(skip_all, fields(key = %key, layers = layers.len()))]
pub fn combine<'a>(
    key: KeyColor,
    layers: &'a [DynamicImage],
) -> KeymergeResult<Option<Cow<'a, DynamicImage>>> {
    let merged = match layers {
        [] => return Ok(None),
        [only] => return Ok(Some(Cow::Borrowed(only))),
        _ if layers.iter().all(fits_in_8_bits) => {
            combine_rasters::<Rgba<u8>, _>(key, layers)?.map(DynamicImage::ImageRgba8)
        }
        _ => combine_rasters::<Rgba<u16>, _>(key, layers)?.map(DynamicImage::ImageRgba16),
    };
    Ok(merged.map(Cow::Owned))
}

/// Generic compositing engine behind [`combine`].
///
/// Accumulates into a fresh buffer of `P`, even for a single layer. Dimensions are
/// checked before anything is allocated. `P` must be able to hold every layer's
/// values exactly; `Rgba<u16>` always can.
pub fn combine_rasters<P, R>(
    key: KeyColor,
    layers: &[R],
) -> KeymergeResult<Option<WorkingBuffer<P>>>
where
    P: WorkingPixel,
    R: Raster,
{
    let Some((base, overlays)) = layers.split_first() else {
        return Ok(None);
    };

    let expected = base.dimensions();
    for (i, layer) in overlays.iter().enumerate() {
        let found = layer.dimensions();
        if found != expected {
            return Err(KeymergeError::DimensionMismatch {
                index: i + 1,
                expected,
                found,
            });
        }
    }

    let mut dst = to_working_buffer::<P, R>(base);
    let mut replaced = 0u64;
    for layer in overlays {
        replaced += fill_keyed(&mut dst, layer, key);
    }

    tracing::debug!(
        width = expected.0,
        height = expected.1,
        replaced,
        "merged layer stack"
    );
    Ok(Some(dst))
}

fn fill_keyed<P: WorkingPixel, R: Raster>(
    dst: &mut WorkingBuffer<P>,
    layer: &R,
    key: KeyColor,
) -> u64 {
    let mut replaced = 0;
    for (x, y, px) in dst.enumerate_pixels_mut() {
        if !key.matches_rgb(px.to_rgba16()) {
            continue;
        }
        let candidate = layer.rgba16(x, y);
        if key.matches_rgb(candidate) || candidate.0[3] == 0 {
            continue;
        }
        *px = P::from_rgba16(candidate);
        replaced += 1;
    }
    replaced
}

#[cfg(test)]
#[path = "../../tests/unit/compose/keyed.rs"]
mod tests;

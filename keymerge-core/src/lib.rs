//! keymerge stacks same-sized raster images using a chroma-key background color.
//!
//! The base layer is copied into a working buffer. Each later layer then fills in
//! the pixels that still show the key color, as long as its own pixel is neither
//! key-colored nor fully transparent. Later layers never overwrite a pixel that an
//! earlier layer already filled.
//!
//! # Pipeline overview
//!
//! 1. **Decode**: files or bytes to [`image::DynamicImage`] ([`load_layer`], [`decode_layer`])
//! 2. **Combine**: `KeyColor + [DynamicImage]` to one merged image ([`combine`])
//! 3. **Encode**: merged image to PNG ([`encode_png`], [`write_png`], [`OutputStore`])
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Pure compositing**: [`combine`] reads its layers immutably and performs no IO.
//! - **Depth-agnostic matching**: every pixel is compared as straight RGBA on a
//!   16-bit scale ([`Rgba16`]), so gray, RGB, 16-bit and float sources agree.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod compose;
mod config;
mod encode;
mod foundation;
mod raster;
mod store;

pub use assets::decode::{decode_layer, load_layer, load_layers, parse_layer_list};
pub use compose::keyed::{combine, combine_rasters};
pub use config::job::Job;
pub use encode::png::{PngOutOpts, encode_png, ensure_parent_dir, write_png};
pub use foundation::color::{KeyColor, Rgba16};
pub use foundation::error::{KeymergeError, KeymergeResult};
pub use raster::view::{
    Channel16, Raster, Rgba16Buffer, WorkingBuffer, WorkingPixel, fits_in_8_bits,
    to_working_buffer,
};
pub use store::output::{
    DOWNLOAD_NAME, IdGenerator, OutputStore, RandomIds, SequentialIds, StoredOutput, to_base36,
};

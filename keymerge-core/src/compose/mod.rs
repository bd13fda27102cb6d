//! Chroma-key compositing.

pub(crate) mod keyed;

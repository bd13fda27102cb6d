//! Layer acquisition: decoding bytes and files into images.

pub(crate) mod decode;

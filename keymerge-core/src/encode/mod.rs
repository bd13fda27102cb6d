//! Output encoding.

pub(crate) mod png;

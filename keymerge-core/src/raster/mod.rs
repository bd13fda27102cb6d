//! Format-independent pixel access.

pub(crate) mod view;

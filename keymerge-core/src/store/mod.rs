//! Id-addressed storage of merged outputs.

pub(crate) mod output;

/// Convenience result type used across keymerge.
pub type KeymergeResult<T> = Result<T, KeymergeError>;

/// Top-level error taxonomy used by library APIs.
///
/// An empty layer list is not an error: [`crate::combine`] reports it as `Ok(None)`.
#[derive(thiserror::Error, Debug)]
pub enum KeymergeError {
    /// An overlay layer does not share the base layer's dimensions.
    #[error(
        "dimension mismatch: layer {index} is {}x{}, base is {}x{}",
        .found.0,
        .found.1,
        .expected.0,
        .expected.1
    )]
    DimensionMismatch {
        /// Position of the offending layer in the stack (the base is 0).
        index: usize,
        /// Base layer dimensions `(width, height)`.
        expected: (u32, u32),
        /// Offending layer dimensions `(width, height)`.
        found: (u32, u32),
    },

    /// A key color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// An output id contains characters outside `[0-9a-z]` or is empty.
    #[error("invalid output id: {0}")]
    InvalidId(String),

    /// A stored output does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl KeymergeError {
    /// Build a [`KeymergeError::InvalidColor`] value.
    pub fn invalid_color(msg: impl Into<String>) -> Self {
        Self::InvalidColor(msg.into())
    }

    /// Build a [`KeymergeError::InvalidId`] value.
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Build a [`KeymergeError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`KeymergeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

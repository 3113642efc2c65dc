//! Error types for the rain-type classifier.

use thiserror::Error;

/// Result type alias using RainTypeError.
pub type RainTypeResult<T> = Result<T, RainTypeError>;

/// Input-contract violations. All of these are caught before any
/// computation begins; the classification itself cannot fail.
#[derive(Debug, Error)]
pub enum RainTypeError {
    #[error("grid dimensions must be nonzero, got {width}x{height}")]
    EmptyGrid { width: usize, height: usize },

    #[error("grid shape mismatch: {len} values for a {width}x{height} grid")]
    ShapeMismatch {
        len: usize,
        width: usize,
        height: usize,
    },

    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        name: &'static str,
        message: String,
    },
}

//! Error types for embedding geometry operations.
//!
//! Every estimator in this crate fails fast with a [`GeometryError`] instead
//! of letting NaN or infinities leak out of a degenerate computation.

use thiserror::Error;

/// Main error type for embedding geometry operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Fewer samples than the operation needs.
    #[error("Insufficient samples: need at least {min}, got {actual}")]
    InsufficientSamples { min: usize, actual: usize },

    /// Input carries no usable variance or structure.
    #[error("Degenerate input: {context}")]
    DegenerateInput { context: String },

    /// Near-zero singular values or a non-finite intermediate.
    #[error("Numerical instability: {context}")]
    NumericalInstability { context: String },

    /// Two matrices that must agree in shape do not.
    #[error("Shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Input validation errors.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for embedding geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;

impl GeometryError {
    /// Create an insufficient samples error.
    #[must_use]
    pub const fn insufficient_samples(min: usize, actual: usize) -> Self {
        Self::InsufficientSamples { min, actual }
    }

    /// Create a degenerate input error.
    #[must_use]
    pub fn degenerate(context: impl Into<String>) -> Self {
        Self::DegenerateInput {
            context: context.into(),
        }
    }

    /// Create a numerical instability error.
    #[must_use]
    pub fn numerical_instability(context: impl Into<String>) -> Self {
        Self::NumericalInstability {
            context: context.into(),
        }
    }

    /// Create a shape mismatch error.
    #[must_use]
    pub const fn shape_mismatch(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::ShapeMismatch { expected, actual }
    }

    /// Create an invalid input error.
    #[must_use]
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

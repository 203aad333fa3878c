//! Error types for core value validation.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("Lower threshold {lower} must be below upper threshold {upper}")]
    InvertedThresholds { lower: f64, upper: f64 },

    #[error("Margin fraction {0} must be in [0, 1)")]
    MarginOutOfRange(f64),

    #[error("Threshold must be a finite positive number, got {0}")]
    InvalidThreshold(f64),
}

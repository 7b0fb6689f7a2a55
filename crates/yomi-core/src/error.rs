//! Error types for the yomi-core library.
//!
//! The layout algorithms themselves never fail on degenerate geometry; errors
//! only come from the input boundary (malformed detection records) and from
//! loading or saving files.

use thiserror::Error;

/// Main error type for the yomi library.
#[derive(Error, Debug)]
pub enum YomiError {
    /// Detection input violates the record contract.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shape violations in detection records, rejected before entering the core.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    /// A word polygon does not have exactly four points.
    #[error("word quad must have 4 points, got {points}")]
    InvalidQuad { points: usize },

    /// A coordinate is NaN or infinite.
    #[error("non-finite coordinate in {context}")]
    NonFinite { context: &'static str },
}

/// Result type for the yomi library.
pub type Result<T> = std::result::Result<T, YomiError>;

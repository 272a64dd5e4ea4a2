//! Error types for the Basket engine.

use thiserror::Error;

/// All possible errors from the Basket engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("invalid price for field '{field}': {value}")]
    InvalidPrice { field: String, value: String },

    #[error("cart total does not fit in a decimal")]
    TotalOverflow,
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for lattice-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lattice-core
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Invalid cell address components
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Invalid cell range endpoints
    #[error("Invalid cell range: {0}")]
    InvalidRange(String),
}

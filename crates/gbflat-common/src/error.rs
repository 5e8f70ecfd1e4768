//! Error types shared across gbflat crates

use thiserror::Error;

/// Result type alias for shared gbflat operations
pub type Result<T> = std::result::Result<T, GbflatError>;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum GbflatError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GbflatError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

//! Core error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where configuration problems can surface.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("configuration parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Shorthand result type for `rp-core`.
pub type CoreResult<T> = Result<T, CoreError>;

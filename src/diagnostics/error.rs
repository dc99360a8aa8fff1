//! Crate error type for configuration and I/O failures.
//!
//! Exceptions raised by guarded work are not errors in this sense; they are
//! [`crate::runtime::Exception`] values routed through the dispatcher.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DiagError {
    #[error("failed to read `{path}`: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type DiagResult<T> = Result<T, DiagError>;

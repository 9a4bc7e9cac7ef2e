//! Error types for the analysis library.
//!
//! Only [`ParseError`] (wrapped in [`AnalysisError`]) stops a run. Everything
//! else the pipeline encounters is downgraded to an
//! [`AnalysisWarning`](crate::models::AnalysisWarning) attached to the affected
//! result. The CLI wraps these in `anyhow` with file context.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Transcript is empty")]
    Empty,

    #[error("Unrecognized export format: none of the {sampled} sampled lines matched a known line pattern")]
    UnrecognizedFormat { sampled: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid name prefix pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Analysis cancelled")]
    Cancelled,
}

/// Failure reported by an external collaborator (classifier, progress sink).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Rate limited")]
    RateLimited,

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

impl CollaboratorError {
    /// Whether a bounded retry may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, CollaboratorError::Timeout(_) | CollaboratorError::RateLimited)
    }
}

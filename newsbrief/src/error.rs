//! Error types for the news digest pipeline

use thiserror::Error;

/// Errors that can occur while fetching news or generating a digest
#[derive(Debug, Error)]
pub enum BriefError {
    /// The model API key is absent from the environment and `.env`
    #[error("Missing {var} in environment or .env")]
    MissingCredential {
        /// Name of the environment variable that was looked up
        var: String,
    },

    /// The news search provider failed (network, status, or payload)
    #[error("News provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The language model endpoint failed
    #[error("Language model unavailable: {0}")]
    ModelUnavailable(String),

    /// Reading input or writing output failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

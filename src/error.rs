//! Error types for pageboot.

use thiserror::Error;

/// pageboot error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Declarations rejected at registration
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// A resource could not be loaded
    #[error("Failed to load '{resource}': {reason}")]
    LoadFailed {
        resource: String,
        reason: crate::loader::fetch::FetchError,
    },

    /// The page continuation failed while applying setup or widgets
    #[error("Page error: {0}")]
    Page(#[from] crate::page::PageError),

    /// The request did not complete within its wait window
    #[error("Load timeout; still pending: {}", pending.join(", "))]
    Timeout { pending: Vec<String> },

    /// The request was cancelled before its continuation ran
    #[error("Load request cancelled")]
    Cancelled,

    /// A load state channel closed before the resource settled
    #[error("Channel closed")]
    ChannelClosed,

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for pageboot operations.
pub type Result<T> = std::result::Result<T, Error>;

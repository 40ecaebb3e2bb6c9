//! Error types for the raven client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, RavenError>;

/// Boxed error returned by processors and custom transports.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced to the caller. Transport failures are not among them:
/// those degrade to a `Warning` and an absent event id.
#[derive(Debug, Error)]
pub enum RavenError {
    /// Missing or malformed DSN. Raised at construction.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A processor failed or returned nothing; the event was not sent.
    #[error("processor #{index} ({name}) failed: {reason}")]
    Processor {
        /// Position in the chain, starting at 0.
        index: usize,
        name: String,
        reason: String,
    },

    #[error("failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to encode payload: {0}")]
    Encoding(#[from] std::io::Error),

    /// A captured failure could not be confirmed as delivered.
    /// `event` holds the JSON of the event that was lost.
    #[error("failed to report captured failure, undelivered event: {event}")]
    ReportingFailed { event: String },
}

/// Reasons a DSN cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("no DSN given and SENTRY_DSN is not set")]
    MissingDsn,

    #[error("DSN is not a valid URI: {0}")]
    InvalidDsn(String),

    #[error("DSN has no host")]
    MissingHost,

    #[error("DSN has no credentials")]
    MissingCredentials,

    #[error("DSN credentials must be `public_key:secret_key`")]
    MissingKeyPair,

    #[error("DSN has no project id")]
    MissingProjectId,
}

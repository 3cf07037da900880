use thiserror::Error;

/// Top-level error type for the `shopsync-api` crate.
///
/// Covers transport failures, structured backend errors, and decoding
/// problems. `shopsync-core` converts these into cache state — consumers
/// of the caches observe errors as data, never as panics.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The backend rejected the bearer credential (HTTP 401).
    #[error("Unauthorized: credential rejected by backend")]
    Unauthorized,

    /// Structured error response from the backend.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The message a cache entry should carry for this failure.
    ///
    /// Backend errors surface their own message; anything without one
    /// falls back to a fixed string so the `error` field is never empty.
    pub fn cache_message(&self) -> String {
        let message = match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        };
        if message.is_empty() {
            FALLBACK_ERROR_MESSAGE.to_owned()
        } else {
            message
        }
    }
}

/// Fallback message for failures that carry no message of their own.
pub const FALLBACK_ERROR_MESSAGE: &str = "Something went wrong";

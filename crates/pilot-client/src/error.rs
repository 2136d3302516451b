//! Error types for pilot-client

use thiserror::Error;

/// Result type alias using pilot-client Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the agent backend
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local file access failed (document uploads)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend answered with a non-success status
    #[error("API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    /// The response body stream broke off mid-read
    #[error("Stream error: {0}")]
    Stream(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an API error from a status code and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the failure happened on the wire rather than in our own code.
    pub fn is_transport(&self) -> bool {
        match self {
            Error::Http(_) | Error::Stream(_) => true,
            Error::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Text shown to the user for a failed request.
    ///
    /// The backend reports failures as `{"error": "..."}` or
    /// `{"success": false, "message": "..."}`; those bodies are unwrapped so
    /// the user sees the backend's own wording.
    pub fn user_message(&self) -> String {
        match self {
            Error::Api { status, message } => {
                let detail = serde_json::from_str::<serde_json::Value>(message)
                    .ok()
                    .and_then(|body| {
                        body.get("error")
                            .or_else(|| body.get("message"))
                            .and_then(|v| v.as_str())
                            .map(str::to_string)
                    })
                    .unwrap_or_else(|| message.clone());
                if detail.is_empty() {
                    format!("request failed with status {}", status)
                } else {
                    detail
                }
            }
            other => other.to_string(),
        }
    }
}

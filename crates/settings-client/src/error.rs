use thiserror::Error;

/// Error type returned by [`SettingsClient`](crate::SettingsClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured base URL could not be parsed.
    #[error("invalid base url: {0}")]
    Url(#[from] url::ParseError),

    /// Transport errors, including timeouts.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// The response envelope reported a failure code.
    #[error("request rejected ({code}): {message}")]
    Envelope { code: i64, message: String },

    /// The body was not the expected JSON.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

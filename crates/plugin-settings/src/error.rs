use thiserror::Error;

/// Failure talking to a [`SettingsBackend`](crate::SettingsBackend).
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Transport errors, including timeouts.
    #[error("http error: {0}")]
    Http(String),

    /// Non-success HTTP status.
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend accepted the request but reported a failure code.
    #[error("rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    /// The record did not have the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("other error: {0}")]
    Other(String),
}

/// Errors surfaced by [`PluginEnablementStore`](crate::PluginEnablementStore).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Loading the record failed; the store fell back to "nothing enabled".
    #[error("failed to load plugin settings: {0}")]
    Fetch(#[source] BackendError),

    /// Saving failed after the local change was applied. The local state is
    /// ahead of the backend until the next successful save or load.
    #[error("failed to save plugin settings: {0}")]
    Persistence(#[source] BackendError),

    #[error("unknown plugin: {0}")]
    UnknownPlugin(String),
}

#[cfg(feature = "http-backend")]
impl From<settings_client::ClientError> for BackendError {
    fn from(e: settings_client::ClientError) -> Self {
        use settings_client::ClientError;

        match e {
            ClientError::Http(e) => BackendError::Http(e.to_string()),
            ClientError::Status { status, message } => BackendError::Status { status, message },
            ClientError::Envelope { code, message } => BackendError::Rejected { code, message },
            ClientError::Decode(e) => BackendError::Decode(e.to_string()),
            ClientError::Url(e) => BackendError::Other(e.to_string()),
        }
    }
}

/// Relay error types.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream weather API returned status {0}")]
    UpstreamStatus(u16),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Zenoh error: {0}")]
    Zenoh(String),

    #[error("publish not acknowledged within {0}s")]
    PublishTimeout(u64),

    #[error("Config error: {0}")]
    Config(String),

    #[error("blob '{0}' not found")]
    NameNotFound(String),

    #[error("invalid push envelope: {0}")]
    InvalidEnvelope(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RelayError>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GitHubUsersError {
    /// The request never produced an HTTP response.
    #[error("Network error: {0}")]
    TransportError(String),

    #[error("GitHub API request failed with status {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("HTTP client error: {0}")]
    HttpClientError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Actor error: {0}")]
    ActorError(String),
}

impl GitHubUsersError {
    /// Maps a failed `send()` into the transport/remote split.
    pub fn from_request(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => GitHubUsersError::ApiError {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => GitHubUsersError::TransportError(err.to_string()),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, GitHubUsersError::TransportError(_))
    }
}

pub type Result<T> = std::result::Result<T, GitHubUsersError>;

use thiserror::Error;

/// Result of a single backend call.
pub type ApiResult<T> = std::result::Result<T, FailureReason>;

/// Why a backend operation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Server reported failure: {0}")]
    Server(String),

    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FailureReason {
    fn from(err: reqwest::Error) -> Self {
        FailureReason::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FailureReason {
    fn from(err: serde_json::Error) -> Self {
        FailureReason::Decode(err.to_string())
    }
}

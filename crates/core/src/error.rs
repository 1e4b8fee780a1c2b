use stubdex_api::{ApiError, StubError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StubdexError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Stub(#[from] StubError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Registry error: {0}")]
    Registry(String),
    #[error("Parsing error: {0}")]
    Parsing(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Plugin error: {0}")]
    Plugin(String),
    #[error("Indexing pass cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Box<dyn std::error::Error + Send + Sync>> for StubdexError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        StubdexError::Plugin(err.to_string())
    }
}

impl From<StubdexError> for ApiError {
    fn from(err: StubdexError) -> Self {
        match err {
            StubdexError::Stub(e) => ApiError::Stub(e),
            StubdexError::NotFound(what) => ApiError::NotFound(what),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, StubdexError>;

use crate::models::StubId;

/// Failures of the stub format itself. All variants are recoverable at file
/// granularity: the owning file's stub is dropped and rebuilt, the rest of the
/// corpus is unaffected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StubError {
    /// The external id is not registered with the reading registry.
    #[error("unknown stub kind: {external_id}")]
    UnknownKind { external_id: String },

    /// Truncated or corrupt stream, or a kind version that differs from the registry.
    #[error("stub format mismatch: {0}")]
    FormatMismatch(String),

    /// A kind-specific payload could not be decoded.
    #[error("payload codec error in {external_id}: {reason}")]
    PayloadCodec { external_id: String, reason: String },

    /// A fresh parse no longer contains the element a stub points at.
    #[error("stale stub {id:?}: {reason}")]
    StaleStub { id: StubId, reason: String },

    /// A stub type failed while contributing index entries.
    #[error("index contribution failed in {external_id}: {reason}")]
    IndexContribution { external_id: String, reason: String },
}

impl StubError {
    pub fn format(reason: impl Into<String>) -> Self {
        StubError::FormatMismatch(reason.into())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Stub error: {0}")]
    Stub(#[from] StubError),
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

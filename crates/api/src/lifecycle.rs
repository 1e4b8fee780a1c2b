use crate::ApiResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of loading a persisted index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadReport {
    /// Whether a persisted index was found and accepted.
    pub loaded: bool,
    /// Stub kinds whose stored version differs from the registry.
    pub outdated_kinds: Vec<String>,
    /// Files dropped from the index and scheduled for a rebuild.
    pub invalidated_files: Vec<PathBuf>,
}

#[async_trait]
pub trait IndexLifecycle: Send + Sync {
    /// Rebuild the index from scratch
    async fn rebuild(&self) -> ApiResult<()>;

    /// Load the index from disk
    async fn load(&self) -> ApiResult<LoadReport>;

    /// Save the index to disk
    async fn save(&self) -> ApiResult<()>;

    /// Re-index changed, new, deleted and invalidated files
    async fn refresh(&self) -> ApiResult<()>;

    /// Clear the index for the current corpus
    async fn clear_index(&self) -> ApiResult<()>;
}

use crate::ApiResult;
use crate::models::{IndexHit, IndexStats};
use async_trait::async_trait;

/// Consumer-facing search interface.
#[async_trait]
pub trait IndexService: Send + Sync {
    /// All hits for `key`, in commit order of their files and pre-order
    /// within each file. Stable for a given index state.
    async fn lookup(&self, key: &str) -> ApiResult<Vec<IndexHit>>;

    /// Keys starting with `prefix`, sorted.
    async fn keys_with_prefix(&self, prefix: &str) -> ApiResult<Vec<String>>;

    async fn stats(&self) -> ApiResult<IndexStats>;
}

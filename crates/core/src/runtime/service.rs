use super::*;
use async_trait::async_trait;
use stubdex_api::{ApiResult, IndexLifecycle, IndexService, LoadReport};

#[async_trait]
impl IndexService for IndexManager {
    async fn lookup(&self, key: &str) -> ApiResult<Vec<IndexHit>> {
        Ok(IndexManager::lookup(self, key).await)
    }

    async fn keys_with_prefix(&self, prefix: &str) -> ApiResult<Vec<String>> {
        Ok(IndexManager::keys_with_prefix(self, prefix).await)
    }

    async fn stats(&self) -> ApiResult<IndexStats> {
        Ok(IndexManager::stats(self).await)
    }
}

#[async_trait]
impl IndexLifecycle for IndexManager {
    async fn rebuild(&self) -> ApiResult<()> {
        IndexManager::rebuild(self).await?;
        Ok(())
    }

    async fn load(&self) -> ApiResult<LoadReport> {
        Ok(IndexManager::load(self).await?)
    }

    async fn save(&self) -> ApiResult<()> {
        Ok(IndexManager::save(self).await?)
    }

    async fn refresh(&self) -> ApiResult<()> {
        IndexManager::refresh(self).await?;
        Ok(())
    }

    async fn clear_index(&self) -> ApiResult<()> {
        Ok(IndexManager::clear_index(self).await?)
    }
}

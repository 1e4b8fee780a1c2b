use super::*;
use crate::index::{INDEX_FORMAT_VERSION, PersistedIndex};
use std::collections::BTreeSet;
use stubdex_api::LoadReport;

impl IndexManager {
    /// Load the persisted index and check it against the registry.
    ///
    /// Every file holding stubs of a kind whose version changed (or that is
    /// no longer registered) is dropped and queued for the next refresh.
    pub async fn load(&self) -> Result<LoadReport> {
        let worker = self.worker.clone();
        tokio::task::spawn_blocking(move || -> Result<LoadReport> {
            let Some(persisted) = worker.store.load_index()? else {
                return Ok(LoadReport::default());
            };
            let registered = worker.registry.versions();
            let mut snapshot = persisted.snapshot;

            let mut outdated: BTreeSet<String> = persisted
                .kind_stamps
                .iter()
                .filter(|(kind, version)| registered.get(*kind) != Some(*version))
                .map(|(kind, _)| kind.clone())
                .collect();
            for record in snapshot.files() {
                for (kind, version) in &record.stamps {
                    if registered.get(kind) != Some(version) {
                        outdated.insert(kind.clone());
                    }
                }
            }

            let outdated_kinds: Vec<String> = outdated.into_iter().collect();
            let invalidated_files = snapshot.files_using(&outdated_kinds);
            if !outdated_kinds.is_empty() {
                tracing::warn!(
                    "Stub kinds changed version: {:?}. Rebuilding {} files.",
                    outdated_kinds,
                    invalidated_files.len()
                );
            }
            for path in &invalidated_files {
                snapshot.retract(path);
                if let Err(e) = worker.store.remove_stub(path) {
                    tracing::warn!("Failed to remove stub of {}: {}", path.display(), e);
                }
                worker.dirty.insert(path.clone());
            }

            worker.stubs.clear();
            *worker.current.blocking_write() = Arc::new(snapshot);

            Ok(LoadReport {
                loaded: true,
                outdated_kinds,
                invalidated_files,
            })
        })
        .await
        .map_err(|e| StubdexError::Internal(e.to_string()))?
    }

    /// Persist the key index together with the registry's kind versions.
    pub async fn save(&self) -> Result<()> {
        let snapshot = self.snapshot().await;
        let store = self.worker.store.clone();
        let kind_stamps = self.worker.registry.versions();
        let compress = self.config.compress;

        tokio::task::spawn_blocking(move || {
            let persisted = PersistedIndex {
                version: INDEX_FORMAT_VERSION,
                kind_stamps,
                snapshot: (*snapshot).clone(),
            };
            store.save_index(&persisted, compress)
        })
        .await
        .map_err(|e| StubdexError::Internal(e.to_string()))?
    }

    /// Drop everything and index the corpus from scratch.
    pub async fn rebuild(&self) -> Result<UpdateReport> {
        self.worker.inflight.cancel_all();
        {
            let mut lock = self.worker.current.write().await;
            *lock = Arc::new(IndexSnapshot::empty());
        }
        self.worker.stubs.clear();
        self.worker.dirty.clear();

        let store = self.worker.store.clone();
        tokio::task::spawn_blocking(move || store.clear_stubs())
            .await
            .map_err(|e| StubdexError::Internal(e.to_string()))??;

        let paths = self.scan().await?;
        self.run_pass(paths, true).await
    }

    /// Index new, changed and invalidated files and drop deleted ones.
    pub async fn refresh(&self) -> Result<UpdateReport> {
        let mut paths = self.scan().await?;
        let known: BTreeSet<PathBuf> = paths.iter().cloned().collect();
        let snapshot = self.snapshot().await;
        paths.extend(
            snapshot
                .files()
                .map(|r| r.path().to_path_buf())
                .filter(|p| !known.contains(p)),
        );
        paths.extend(self.dirty_files().into_iter().filter(|p| !known.contains(p)));
        paths.sort();
        paths.dedup();

        self.update_files(paths).await
    }

    /// Clear the index for the current corpus
    pub async fn clear_index(&self) -> Result<()> {
        self.worker.inflight.cancel_all();
        {
            let mut lock = self.worker.current.write().await;
            *lock = Arc::new(IndexSnapshot::empty());
        }
        self.worker.stubs.clear();
        self.worker.dirty.clear();

        let store = self.worker.store.clone();
        tokio::task::spawn_blocking(move || store.clear())
            .await
            .map_err(|e| StubdexError::Internal(e.to_string()))??;
        tracing::info!("Cleared index for {}", self.root.display());
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<PathBuf>> {
        let root = self.root.clone();
        let caps = self.worker.caps.clone();
        tokio::task::spawn_blocking(move || scanner::collect_paths(&root, &caps))
            .await
            .map_err(|e| StubdexError::Internal(e.to_string()))
    }
}

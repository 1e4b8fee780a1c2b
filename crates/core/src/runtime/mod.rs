//! Index manager with MVCC snapshots

use crate::config::IndexConfig;
use crate::error::{Result, StubdexError};
use crate::index::{IndexSnapshot, IndexStore};
use crate::stub::{Materializer, StubRegistry};
use dashmap::{DashMap, DashSet};
use inflight::InflightPasses;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use stubdex_api::models::{Element, FileIdentity, IndexHit, IndexStats, Language, StubTree};
use stubdex_plugin::LanguageCaps;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use worker::IndexWorker;

mod inflight;
mod lifecycle;
mod scanner;
mod service;
mod watch;
mod worker;

pub use worker::UpdateReport;

/// Owner of one corpus' aggregate index.
///
/// Readers take cheap snapshots (Arc clone). Per-file passes run on a worker
/// pool and every change to the aggregate index goes through a single
/// commit path that builds the next snapshot and swaps it in.
pub struct IndexManager {
    root: PathBuf,
    config: IndexConfig,
    worker: IndexWorker,
    /// Cancels the watcher and every in-flight pass.
    cancel_token: CancellationToken,
}

pub struct IndexManagerBuilder {
    root: PathBuf,
    config: IndexConfig,
    lang_caps: Vec<LanguageCaps>,
}

impl IndexManagerBuilder {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            config: IndexConfig::default(),
            lang_caps: Vec::new(),
        }
    }

    pub fn with_language_caps(mut self, caps: LanguageCaps) -> Self {
        self.lang_caps.push(caps);
        self
    }

    pub fn with_config(mut self, config: IndexConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails if two plugins register the same stub kind.
    pub fn build(self) -> Result<IndexManager> {
        let root = self
            .root
            .canonicalize()
            .unwrap_or_else(|_| self.root.clone());
        let registry = Arc::new(StubRegistry::from_caps(&self.lang_caps)?);
        let store = IndexStore::new(self.config.corpus_dir(&root));
        tracing::debug!(
            "Index for {} lives in {}",
            root.display(),
            store.dir().display()
        );

        let worker = IndexWorker {
            materializer: Materializer::new(registry.clone()),
            registry,
            store,
            caps: Arc::new(self.lang_caps),
            current: Arc::new(RwLock::new(Arc::new(IndexSnapshot::empty()))),
            inflight: Arc::new(InflightPasses::new()),
            stubs: Arc::new(DashMap::new()),
            dirty: Arc::new(DashSet::new()),
            batch_size: self.config.effective_batch_size(),
        };

        Ok(IndexManager {
            root,
            config: self.config,
            worker,
            cancel_token: CancellationToken::new(),
        })
    }
}

impl Drop for IndexManager {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

impl IndexManager {
    pub fn builder(root: PathBuf) -> IndexManagerBuilder {
        IndexManagerBuilder::new(root)
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn index_dir(&self) -> &Path {
        self.worker.store.dir()
    }

    pub fn registry(&self) -> &Arc<StubRegistry> {
        &self.worker.registry
    }

    pub fn materializer(&self) -> &Materializer {
        &self.worker.materializer
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Current snapshot of the aggregate index.
    pub async fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.worker.current.read().await.clone()
    }

    pub async fn lookup(&self, key: &str) -> Vec<IndexHit> {
        self.snapshot().await.lookup(key)
    }

    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.snapshot().await.keys_with_prefix(prefix)
    }

    pub async fn stats(&self) -> IndexStats {
        self.snapshot().await.stats()
    }

    /// Files queued for re-indexing regardless of content.
    pub fn dirty_files(&self) -> Vec<PathBuf> {
        self.worker.dirty.iter().map(|p| p.key().clone()).collect()
    }

    /// Re-indexes `files`. Paths are resolved against the corpus root.
    /// Unchanged files are skipped unless they were invalidated.
    pub async fn update_files(&self, files: Vec<PathBuf>) -> Result<UpdateReport> {
        self.run_pass(files, false).await
    }

    async fn run_pass(&self, files: Vec<PathBuf>, force: bool) -> Result<UpdateReport> {
        let tickets: Vec<_> = files
            .into_iter()
            .map(|p| self.resolve(p))
            .filter(|p| !p.is_dir())
            .map(|p| {
                let ticket = self.worker.inflight.begin(&p, &self.cancel_token);
                (p, ticket)
            })
            .collect();
        if tickets.is_empty() {
            return Ok(UpdateReport::default());
        }

        let worker = self.worker.clone();
        tokio::task::spawn_blocking(move || worker.run_pass(tickets, force))
            .await
            .map_err(|e| StubdexError::Internal(e.to_string()))
    }

    /// Producer entry point: indexes an already parsed file.
    ///
    /// `identity.content_hash` must be [`content_hash`](crate::content_hash)
    /// of the file's bytes when the file exists on disk; refresh and
    /// drill-down compare it against the file.
    pub async fn index_parsed(
        &self,
        identity: FileIdentity,
        language: Language,
        root: Element,
    ) -> Result<UpdateReport> {
        let path = self.resolve(identity.path.clone());
        let identity = FileIdentity::new(path.clone(), identity.content_hash);
        let ticket = self.worker.inflight.begin(&path, &self.cancel_token);
        let worker = self.worker.clone();

        tokio::task::spawn_blocking(move || {
            let outcome = {
                let lock = worker.inflight.work_lock(&path);
                let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());
                if ticket.token.is_cancelled() {
                    worker::FileOutcome::Cancelled
                } else {
                    let mtime = worker::modified_secs(&path);
                    match worker.build_file(identity, language.as_str(), &root, mtime) {
                        Ok(indexed) => worker::FileOutcome::Indexed(indexed),
                        Err(e) => worker::FileOutcome::Failed(e.to_string()),
                    }
                }
            };
            let mut report = UpdateReport::default();
            worker.commit(vec![(&path, &ticket, outcome)], &mut report);
            report
        })
        .await
        .map_err(|e| StubdexError::Internal(e.to_string()))
    }

    /// Decoded stub tree of an indexed file.
    ///
    /// A stub that no longer decodes invalidates the file: it leaves the
    /// index and is rebuilt by the next refresh.
    pub async fn stub_tree(&self, path: &Path) -> Result<Arc<StubTree>> {
        let path = self.resolve(path.to_path_buf());
        let snapshot = self.snapshot().await;
        let record = snapshot
            .file(&path)
            .ok_or_else(|| StubdexError::NotFound(path.display().to_string()))?;
        if let Some(tree) = self.worker.stubs.get(&path) {
            return Ok(tree.clone());
        }

        let worker = self.worker.clone();
        let content_hash = record.identity.content_hash;
        tokio::task::spawn_blocking(move || -> Result<Arc<StubTree>> {
            let decoded = worker
                .store
                .read_stub(&path, content_hash)
                .and_then(|bytes| {
                    Ok(crate::stub::deserialize_with_report(&bytes, &worker.registry)?)
                });
            match decoded {
                Ok(decoded) if decoded.dropped.is_empty() => {
                    let tree = Arc::new(decoded.tree);
                    worker.stubs.insert(path, tree.clone());
                    Ok(tree)
                }
                Ok(decoded) => {
                    for err in &decoded.dropped {
                        tracing::warn!("Dropped stub subtree in {}: {}", path.display(), err);
                    }
                    worker.dirty.insert(path);
                    Ok(Arc::new(decoded.tree))
                }
                Err(e @ StubdexError::Stub(_)) | Err(e @ StubdexError::Storage(_)) => {
                    worker.invalidate(&path, &e);
                    Err(e)
                }
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(|e| StubdexError::Internal(e.to_string()))?
    }

    /// Opens a drill-down handle for a lookup hit.
    pub async fn materialize(&self, hit: &IndexHit) -> Result<crate::stub::MaterializedHandle> {
        let path = hit.file.path();
        let snapshot = self.snapshot().await;
        let record = snapshot
            .file(path)
            .ok_or_else(|| StubdexError::NotFound(path.display().to_string()))?;
        if record.identity != hit.file {
            return Err(stubdex_api::StubError::StaleStub {
                id: hit.owner,
                reason: format!("{} was re-indexed", hit.file),
            }
            .into());
        }

        let tree = self.stub_tree(path).await?;
        if tree.len() != record.stub_count {
            return Err(stubdex_api::StubError::StaleStub {
                id: hit.owner,
                reason: format!("stub of {} decoded partially", hit.file),
            }
            .into());
        }

        let caps = scanner::caps_for(&self.worker.caps, path).ok_or_else(|| {
            StubdexError::Plugin(format!("no language claims {}", path.display()))
        })?;
        Ok(crate::stub::MaterializedHandle::new(
            hit.file.clone(),
            hit.owner,
            tree,
            caps.language.clone(),
            self.worker.materializer.clone(),
            caps.parser.clone(),
        )?)
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.root.join(path)
        }
    }
}

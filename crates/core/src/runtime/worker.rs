use super::inflight::{InflightPasses, PassTicket};
use super::scanner::caps_for;
use crate::error::{Result, StubdexError};
use crate::index::{FileRecord, IndexSnapshot, IndexStore, collect_entries, content_hash};
use crate::stub::{Materializer, StubRegistry, serialize};
use dashmap::{DashMap, DashSet};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use stubdex_api::models::{Element, FileIdentity, StubTree};
use stubdex_plugin::LanguageCaps;
use tokio::sync::RwLock;

/// Summary of one update pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateReport {
    pub indexed: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
    pub unchanged: usize,
    /// Passes that were cancelled or superseded before they could commit.
    pub cancelled: Vec<PathBuf>,
}

impl UpdateReport {
    pub fn is_noop(&self) -> bool {
        self.indexed.is_empty() && self.removed.is_empty() && self.failed.is_empty()
    }
}

/// Output of one file pass. Nothing of it is visible before commit.
pub(crate) struct Indexed {
    record: FileRecord,
    tree: Arc<StubTree>,
    bytes: Vec<u8>,
}

pub(crate) enum FileOutcome {
    Indexed(Indexed),
    Removed,
    Failed(String),
    Unchanged,
    Cancelled,
}

/// Shared state of the per-file pipeline. Cheap to clone into blocking tasks.
#[derive(Clone)]
pub(crate) struct IndexWorker {
    pub registry: Arc<StubRegistry>,
    pub materializer: Materializer,
    pub store: IndexStore,
    pub caps: Arc<Vec<LanguageCaps>>,
    pub current: Arc<RwLock<Arc<IndexSnapshot>>>,
    pub inflight: Arc<InflightPasses>,
    pub stubs: Arc<DashMap<PathBuf, Arc<StubTree>>>,
    /// Files re-indexed by the next pass even if their content is unchanged.
    pub dirty: Arc<DashSet<PathBuf>>,
    pub batch_size: usize,
}

impl IndexWorker {
    /// Runs a pass over `files`, committing one batch at a time.
    ///
    /// Blocking; call from `spawn_blocking`.
    pub fn run_pass(&self, files: Vec<(PathBuf, PassTicket)>, force: bool) -> UpdateReport {
        let base = self.current.blocking_read().clone();
        let mut report = UpdateReport::default();

        for batch in files.chunks(self.batch_size) {
            let results: Vec<(&PathBuf, &PassTicket, FileOutcome)> = batch
                .par_iter()
                .map(|(path, ticket)| (path, ticket, self.process(path, ticket, &base, force)))
                .collect();
            self.commit(results, &mut report);
        }

        tracing::info!(
            "Pass done: {} indexed, {} removed, {} failed, {} unchanged, {} cancelled",
            report.indexed.len(),
            report.removed.len(),
            report.failed.len(),
            report.unchanged,
            report.cancelled.len()
        );
        report
    }

    fn process(
        &self,
        path: &Path,
        ticket: &PassTicket,
        base: &IndexSnapshot,
        force: bool,
    ) -> FileOutcome {
        let lock = self.inflight.work_lock(path);
        let _guard = lock.lock().unwrap_or_else(|e| e.into_inner());

        if ticket.token.is_cancelled() {
            return FileOutcome::Cancelled;
        }
        let Some(caps) = caps_for(&self.caps, path) else {
            return FileOutcome::Removed;
        };

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return FileOutcome::Removed,
            Err(e) => return FileOutcome::Failed(e.to_string()),
        };
        let hash = content_hash(&bytes);
        if !force
            && !self.dirty.contains(path)
            && base
                .file(path)
                .is_some_and(|r| r.identity.content_hash == hash)
        {
            return FileOutcome::Unchanged;
        }

        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(e) => return FileOutcome::Failed(format!("not utf-8: {}", e)),
        };
        let root = match caps.parser.parse_file(&source, path) {
            Ok(root) => root,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                return FileOutcome::Failed(format!("parse error: {}", e));
            }
        };
        if ticket.token.is_cancelled() {
            return FileOutcome::Cancelled;
        }

        let identity = FileIdentity::new(path, hash);
        match self.build_file(identity, caps.language.as_str(), &root, modified_secs(path)) {
            Ok(indexed) => FileOutcome::Indexed(indexed),
            Err(e) => {
                tracing::warn!("Failed to index {}: {}", path.display(), e);
                FileOutcome::Failed(e.to_string())
            }
        }
    }

    /// Stub tree, serialized bytes and index entries of one parsed file.
    /// The bytes are only written by `commit`.
    pub fn build_file(
        &self,
        identity: FileIdentity,
        language: &str,
        root: &Element,
        last_modified: u64,
    ) -> Result<Indexed> {
        let tree = self.materializer.from_materialized(language, root)?;
        let bytes = serialize(&tree, &self.registry)?;

        let (entries, index_error) = match collect_entries(&tree, &self.registry) {
            Ok(entries) => (entries, None),
            Err(e) => {
                tracing::warn!("No index entries for {}: {}", identity, e);
                (Vec::new(), Some(e.to_string()))
            }
        };

        let mut stamps = BTreeMap::new();
        let mut kind_counts: BTreeMap<String, usize> = BTreeMap::new();
        for node in tree.iter() {
            let ty = self.registry.type_of(node.kind())?;
            stamps.insert(ty.external_id().to_string(), ty.version());
            *kind_counts.entry(ty.external_id().to_string()).or_default() += 1;
        }

        tracing::trace!("Built {} stubs for {}", tree.len(), identity);
        Ok(Indexed {
            record: FileRecord {
                identity,
                last_modified,
                stamps,
                stub_count: tree.len(),
                kind_counts,
                entries,
                index_error,
            },
            tree: Arc::new(tree),
            bytes,
        })
    }

    /// Applies finished files to the aggregate index. This is the only path
    /// that writes the snapshot or the stub store.
    pub fn commit(
        &self,
        results: Vec<(&PathBuf, &PassTicket, FileOutcome)>,
        report: &mut UpdateReport,
    ) {
        let mut guard = self.current.blocking_write();
        let snapshot = Arc::make_mut(&mut *guard);

        for (path, ticket, outcome) in results {
            let lock = self.inflight.work_lock(path);
            {
                let _work = lock.lock().unwrap_or_else(|e| e.into_inner());
                if self.inflight.is_current(path, ticket.generation) {
                    self.apply(snapshot, path, outcome, report);
                } else {
                    tracing::debug!("Discarding superseded pass over {}", path.display());
                    report.cancelled.push(path.clone());
                }
            }
            drop(lock);
            self.inflight.finish(path, ticket.generation);
        }
    }

    fn apply(
        &self,
        snapshot: &mut IndexSnapshot,
        path: &Path,
        outcome: FileOutcome,
        report: &mut UpdateReport,
    ) {
        match outcome {
            FileOutcome::Indexed(indexed) => {
                let identity = &indexed.record.identity;
                if let Err(e) =
                    self.store
                        .write_stub(identity.path(), identity.content_hash, &indexed.bytes)
                {
                    tracing::warn!("Failed to persist stub of {}: {}", path.display(), e);
                    snapshot.retract(path);
                    self.drop_stub(path);
                    report.failed.push((path.to_path_buf(), e.to_string()));
                    return;
                }
                snapshot.merge(indexed.record);
                self.stubs.insert(path.to_path_buf(), indexed.tree);
                self.dirty.remove(path);
                report.indexed.push(path.to_path_buf());
            }
            FileOutcome::Removed => {
                if snapshot.retract(path).is_some() {
                    report.removed.push(path.to_path_buf());
                }
                self.drop_stub(path);
            }
            FileOutcome::Failed(reason) => {
                snapshot.retract(path);
                self.drop_stub(path);
                report.failed.push((path.to_path_buf(), reason));
            }
            FileOutcome::Unchanged => report.unchanged += 1,
            FileOutcome::Cancelled => report.cancelled.push(path.to_path_buf()),
        }
    }

    fn drop_stub(&self, path: &Path) {
        self.stubs.remove(path);
        self.dirty.remove(path);
        if let Err(e) = self.store.remove_stub(path) {
            tracing::warn!("Failed to remove stub of {}: {}", path.display(), e);
        }
    }

    /// Drops a file whose persisted stub could not be read back and queues it
    /// for the next pass.
    pub fn invalidate(&self, path: &Path, reason: &StubdexError) {
        tracing::warn!("Invalidating stub of {}: {}", path.display(), reason);
        {
            let mut guard = self.current.blocking_write();
            Arc::make_mut(&mut *guard).retract(path);
        }
        self.drop_stub(path);
        self.dirty.insert(path.to_path_buf());
    }
}

pub(crate) fn modified_secs(path: &Path) -> u64 {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

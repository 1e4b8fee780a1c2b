use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Identifies one indexing pass over one file.
#[derive(Debug, Clone)]
pub(crate) struct PassTicket {
    pub generation: u64,
    pub token: CancellationToken,
}

struct Pass {
    generation: u64,
    token: CancellationToken,
}

/// Registry of in-flight per-file passes.
///
/// Starting a pass for a file cancels the file's previous pass; only the
/// newest pass of a file may commit. Work locks keep two workers off the
/// same file's stub at the same time.
#[derive(Default)]
pub(crate) struct InflightPasses {
    passes: DashMap<PathBuf, Pass>,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
    next: AtomicU64,
}

impl InflightPasses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, path: &Path, parent: &CancellationToken) -> PassTicket {
        let generation = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let token = parent.child_token();
        let previous = self.passes.insert(
            path.to_path_buf(),
            Pass {
                generation,
                token: token.clone(),
            },
        );
        if let Some(previous) = previous {
            tracing::debug!("Superseding pass {} of {}", previous.generation, path.display());
            previous.token.cancel();
        }
        PassTicket { generation, token }
    }

    /// Whether `generation` is still the newest, uncancelled pass of `path`.
    pub fn is_current(&self, path: &Path, generation: u64) -> bool {
        self.passes
            .get(path)
            .is_some_and(|p| p.generation == generation && !p.token.is_cancelled())
    }

    /// Ends a pass. The work lock of `path` goes away with the last pass
    /// that used it; callers must have released their guard.
    pub fn finish(&self, path: &Path, generation: u64) {
        self.passes.remove_if(path, |_, p| p.generation == generation);
        if !self.passes.contains_key(path) {
            self.locks.remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
        }
    }

    pub fn work_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Cancels every in-flight pass.
    pub fn cancel_all(&self) {
        for pass in self.passes.iter() {
            pass.token.cancel();
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.passes.len()
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_pass_supersedes_older() {
        let inflight = InflightPasses::new();
        let root = CancellationToken::new();
        let path = Path::new("a.properties");

        let first = inflight.begin(path, &root);
        assert!(inflight.is_current(path, first.generation));

        let second = inflight.begin(path, &root);
        assert!(first.token.is_cancelled());
        assert!(!inflight.is_current(path, first.generation));
        assert!(inflight.is_current(path, second.generation));

        // A stale finish must not drop the newer pass.
        inflight.finish(path, first.generation);
        assert_eq!(inflight.len(), 1);
        inflight.finish(path, second.generation);
        assert_eq!(inflight.len(), 0);
    }

    #[test]
    fn finished_passes_release_their_work_lock() {
        let inflight = InflightPasses::new();
        let root = CancellationToken::new();
        let path = Path::new("gone.txt");

        let first = inflight.begin(path, &root);
        let second = inflight.begin(path, &root);
        drop(inflight.work_lock(path));
        inflight.finish(path, first.generation);
        assert_eq!(inflight.lock_count(), 1);

        let held = inflight.work_lock(path);
        inflight.finish(path, second.generation);
        assert_eq!(inflight.lock_count(), 1);
        drop(held);

        let third = inflight.begin(path, &root);
        drop(inflight.work_lock(path));
        inflight.finish(path, third.generation);
        assert_eq!(inflight.lock_count(), 0);
        assert_eq!(inflight.len(), 0);
    }

    #[test]
    fn parent_cancellation_reaches_passes() {
        let inflight = InflightPasses::new();
        let root = CancellationToken::new();
        let ticket = inflight.begin(Path::new("b"), &root);
        root.cancel();
        assert!(ticket.token.is_cancelled());
        assert!(!inflight.is_current(Path::new("b"), ticket.generation));
    }

    #[test]
    fn passes_on_other_files_are_independent() {
        let inflight = InflightPasses::new();
        let root = CancellationToken::new();
        let a = inflight.begin(Path::new("a"), &root);
        let _b = inflight.begin(Path::new("b"), &root);
        assert!(!a.token.is_cancelled());
        inflight.cancel_all();
        assert!(a.token.is_cancelled());
    }
}

use super::*;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::mpsc;

struct FsWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
}

impl FsWatcher {
    fn new(root: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;
        watcher.watch(root, RecursiveMode::Recursive)?;
        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    async fn next_event_async(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Some(Ok(event)) => return Some(event),
                Some(Err(e)) => tracing::warn!("Watch error: {}", e),
                None => return None,
            }
        }
    }
}

impl IndexManager {
    /// Watch the corpus and re-index changed files until `cancel_token` fires.
    ///
    /// Each debounced batch runs as its own task, so a file that changes
    /// again while its pass is running cancels that pass.
    pub async fn start_watch_with_token(
        self: Arc<Self>,
        cancel_token: CancellationToken,
    ) -> Result<()> {
        let root = self.root.clone();
        let mut watcher =
            FsWatcher::new(&root).map_err(|e| StubdexError::Internal(e.to_string()))?;
        let debounce_interval = Duration::from_millis(self.config.watch_debounce_ms);
        let manager_weak = Arc::downgrade(&self);
        drop(self);

        tokio::spawn(async move {
            tracing::info!("Started watching {}", root.display());
            let mut pending_events: Vec<Event> = Vec::new();

            loop {
                tokio::select! {
                    _ = cancel_token.cancelled() => {
                        break;
                    }
                    event = watcher.next_event_async() => {
                        match event {
                            Some(e) => pending_events.push(e),
                            None => break,
                        }
                    }
                    _ = tokio::time::sleep(debounce_interval), if !pending_events.is_empty() => {
                        let mut paths = HashSet::new();
                        for event in pending_events.drain(..) {
                            for path in event.paths {
                                let relevant = path
                                    .strip_prefix(&root)
                                    .map(|rel| rel.components().all(|c| scanner::is_relevant_path(Path::new(c.as_os_str()))))
                                    .unwrap_or(false);
                                if relevant {
                                    paths.insert(path);
                                }
                            }
                        }

                        if paths.is_empty() {
                            continue;
                        }
                        let Some(manager) = manager_weak.upgrade() else {
                            break;
                        };
                        let path_vec: Vec<_> = paths.into_iter().collect();
                        tracing::info!("Detected changes in {} files. Updating...", path_vec.len());
                        tokio::spawn(async move {
                            match manager.update_files(path_vec).await {
                                Ok(report) => tracing::debug!("Watch pass: {:?}", report),
                                Err(err) => tracing::error!("Failed to update files: {}", err),
                            }
                        });
                    }
                }
            }
            tracing::info!("File watcher task ended for {}", root.display());
        });

        Ok(())
    }

    /// Watch using the manager-wide cancellation token.
    pub async fn watch(self: Arc<Self>) -> Result<()> {
        let cancel_token = self.cancel_token.clone();
        self.start_watch_with_token(cancel_token).await
    }
}

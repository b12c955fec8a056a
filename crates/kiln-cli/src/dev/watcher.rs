//! File system watcher with trailing-edge debouncing.
//!
//! Raw `notify` events are forwarded from the watcher thread into a channel
//! and folded by [`debounce`]: each event restarts the quiet window, and the
//! listener runs once when the window elapses with no new event.

use crate::dev::trigger::ChangeListener;
use crate::error::{CliError, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Buffer between the watcher thread and the debounce loop.
const EVENT_QUEUE: usize = 256;

/// File change event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// File was modified
    Modified(PathBuf),
    /// File was created
    Created(PathBuf),
    /// File was removed
    Removed(PathBuf),
}

impl FileChange {
    /// Get the path affected by this change.
    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }

    /// Map a notify event kind onto a change. Access and other
    /// metadata-only events yield `None`.
    fn from_kind(kind: &EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }
}

/// A running recursive watch. Watching stops when this is dropped.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
    task: JoinHandle<()>,
}

impl ChangeWatcher {
    /// Watch `root` recursively and call `listener.on_change()` once per
    /// burst of changes, after `window` of quiet.
    ///
    /// # Errors
    ///
    /// Fails when `root` does not exist, is not a directory, or the
    /// platform watcher cannot be created.
    pub fn watch<L>(root: impl Into<PathBuf>, window: Duration, listener: L) -> Result<Self>
    where
        L: ChangeListener + 'static,
    {
        let root = root.into();
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }
        if !root.is_dir() {
            return Err(CliError::InvalidArgument(format!(
                "Watch path is not a directory: {}",
                root.display()
            )));
        }

        let (tx, rx) = mpsc::channel(EVENT_QUEUE);

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for path in event.paths {
                        if let Some(change) = FileChange::from_kind(&event.kind, path) {
                            // The receiver is gone only during shutdown.
                            if tx.blocking_send(change).is_err() {
                                return;
                            }
                        }
                    }
                }
                Err(e) => tracing::warn!(error = %e, "File watcher error"),
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        let task = tokio::spawn(debounce(rx, window, listener));
        tracing::debug!(root = %root.display(), window_ms = window.as_millis() as u64, "Watching");

        Ok(Self {
            _watcher: watcher,
            root,
            task,
        })
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Fold bursts of changes from `rx` into single `on_change` calls.
///
/// Returns when the sender side closes; a burst still pending at that
/// point is flushed first.
pub async fn debounce<L>(mut rx: mpsc::Receiver<FileChange>, window: Duration, listener: L)
where
    L: ChangeListener,
{
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();

    loop {
        if pending.is_empty() {
            match rx.recv().await {
                Some(change) => {
                    pending.insert(change.path().to_path_buf());
                }
                None => return,
            }
            continue;
        }

        match tokio::time::timeout(window, rx.recv()).await {
            Ok(Some(change)) => {
                pending.insert(change.path().to_path_buf());
            }
            Ok(None) => {
                flush(&mut pending, &listener);
                return;
            }
            Err(_) => flush(&mut pending, &listener),
        }
    }
}

fn flush<L: ChangeListener>(pending: &mut BTreeSet<PathBuf>, listener: &L) {
    tracing::debug!(paths = pending.len(), "Change burst settled");
    for path in pending.iter() {
        tracing::debug!(path = %path.display(), "changed");
    }
    pending.clear();
    listener.on_change();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WINDOW: Duration = Duration::from_millis(100);

    #[derive(Clone, Default)]
    struct Counter(Arc<AtomicUsize>);

    impl Counter {
        fn get(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    impl ChangeListener for Counter {
        fn on_change(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn change(name: &str) -> FileChange {
        FileChange::Modified(PathBuf::from("/project/src").join(name))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_within_window_fires_once() {
        let (tx, rx) = mpsc::channel(16);
        let counter = Counter::default();
        let task = tokio::spawn(debounce(rx, WINDOW, counter.clone()));

        for i in 0..5 {
            tx.send(change(&format!("file{i}.ts"))).await.unwrap();
            tokio::time::sleep(WINDOW / 2).await;
        }
        assert_eq!(counter.get(), 0);

        tokio::time::sleep(WINDOW * 2).await;
        assert_eq!(counter.get(), 1);

        drop(tx);
        task.await.unwrap();
        assert_eq!(counter.get(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_events_fire_each_time() {
        let (tx, rx) = mpsc::channel(16);
        let counter = Counter::default();
        let task = tokio::spawn(debounce(rx, WINDOW, counter.clone()));

        for _ in 0..4 {
            tx.send(change("app.tsx")).await.unwrap();
            tokio::time::sleep(WINDOW * 3).await;
        }
        assert_eq!(counter.get(), 4);

        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_then_remove_in_one_burst() {
        let (tx, rx) = mpsc::channel(16);
        let counter = Counter::default();
        let task = tokio::spawn(debounce(rx, WINDOW, counter.clone()));

        let path = PathBuf::from("/project/src/.app.tsx.swp");
        tx.send(FileChange::Created(path.clone())).await.unwrap();
        tx.send(FileChange::Removed(path)).await.unwrap();
        tokio::time::sleep(WINDOW * 2).await;

        assert_eq!(counter.get(), 1);
        drop(tx);
        task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_burst_flushed_on_close() {
        let (tx, rx) = mpsc::channel(16);
        let counter = Counter::default();

        tx.send(change("a.ts")).await.unwrap();
        drop(tx);
        debounce(rx, WINDOW, counter.clone()).await;

        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_from_kind_skips_access() {
        use notify::event::{AccessKind, CreateKind};

        let path = PathBuf::from("/project/src/index.ts");
        assert_eq!(
            FileChange::from_kind(&EventKind::Create(CreateKind::File), path.clone()),
            Some(FileChange::Created(path.clone()))
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Access(AccessKind::Any), path),
            None
        );
    }

    #[test]
    fn test_file_change_path() {
        let path = PathBuf::from("/project/src/index.js");

        let change = FileChange::Modified(path.clone());
        assert_eq!(change.path(), path.as_path());

        let change = FileChange::Removed(path.clone());
        assert_eq!(change.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_watch_missing_root() {
        let err = ChangeWatcher::watch("/definitely/not/here", WINDOW, Counter::default())
            .err()
            .unwrap();
        assert!(matches!(err, CliError::FileNotFound(_)));
    }

    #[tokio::test]
    async fn test_watch_file_root_rejected() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let err = ChangeWatcher::watch(temp.path(), WINDOW, Counter::default())
            .err()
            .unwrap();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}

//! Sequenced change records fanned out to every active watcher.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::engine::WatcherShared;
use super::filter::FileAccessKinds;
use crate::{AbsolutePath, EntryKind};

/// One observed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChangeRecord {
    /// Monotonic per-filesystem sequence number, starting at 1.
    pub(crate) sequence: u64,
    pub(crate) path: AbsolutePath,
    /// Set for renames and moves.
    pub(crate) previous_path: Option<AbsolutePath>,
    pub(crate) kind: EntryKind,
    pub(crate) access: FileAccessKinds,
}

/// Owned by the filesystem; holds weak references to watcher queues.
#[derive(Default)]
pub(crate) struct ChangeTracker {
    sequence: AtomicU64,
    watchers: Mutex<Vec<Weak<WatcherShared>>>,
}

impl ChangeTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, watcher: &Arc<WatcherShared>) {
        self.watchers.lock().push(Arc::downgrade(watcher));
    }

    /// Sequence number of the most recent record (0 if none).
    pub(crate) fn last_sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }

    pub(crate) fn record_change(&self, path: AbsolutePath, kind: EntryKind, access: FileAccessKinds) {
        if access.is_empty() {
            return;
        }
        self.publish(path, None, kind, access);
    }

    pub(crate) fn record_rename(&self, from: AbsolutePath, to: AbsolutePath, kind: EntryKind) {
        self.publish(
            to,
            Some(from),
            kind,
            FileAccessKinds::RENAME_OLD | FileAccessKinds::RENAME_NEW,
        );
    }

    fn publish(
        &self,
        path: AbsolutePath,
        previous_path: Option<AbsolutePath>,
        kind: EntryKind,
        access: FileAccessKinds,
    ) {
        let record = ChangeRecord {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            path,
            previous_path,
            kind,
            access,
        };
        let mut watchers = self.watchers.lock();
        watchers.retain(|watcher| watcher.strong_count() > 0);
        for watcher in watchers.iter().filter_map(Weak::upgrade) {
            watcher.offer(&record);
        }
    }
}

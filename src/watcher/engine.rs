//! Per-watcher queue, background consumer and the public watcher handle.
//!
//! Lock order: filesystem state, then watcher state. Listeners always run with
//! neither lock held.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use super::event::{
    FileSystemEventArgs, RenamedEventArgs, WaitForChangedResult, WaitTimeout, WatcherChangeTypes,
    WatcherEvent,
};
use super::filter::{FileAccessKinds, NotifyFilters};
use super::tracker::ChangeRecord;
use crate::filesystem::Shared;
use crate::{AbsolutePath, EntryKind, FsError, FsWatcher, WildcardPattern};

const TARGET: &str = "anyfs_fakes::watcher";

/// Bytes one queued notification occupies in the internal buffer.
const RECORD_SIZE: usize = 64;

/// Smallest accepted internal buffer.
pub const MIN_INTERNAL_BUFFER_SIZE: usize = 4096;

const DEFAULT_INTERNAL_BUFFER_SIZE: usize = 8192;

type Listener = Arc<dyn Fn(&WatcherEvent) + Send + Sync>;

/// Initial configuration for a watcher.
///
/// Every field can also be changed later through [`FsWatcher`]; changing
/// `path`, `filter`, `include_subdirectories` or `internal_buffer_size` on a
/// running watcher restarts it, discarding queued notifications.
///
/// ```rust
/// use anyfs_fakes::{NotifyFilters, WatcherConfig};
///
/// let config = WatcherConfig::new(r"C:\logs")
///     .with_filter("*.log")
///     .with_notify_filter(NotifyFilters::SIZE)
///     .with_include_subdirectories(true);
/// assert_eq!(config.internal_buffer_size, 8192);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatcherConfig {
    /// Directory to watch; empty for none.
    pub path: String,
    /// Name pattern; `*` and `*.*` match everything.
    pub filter: String,
    /// Categories of change to report.
    pub notify_filter: NotifyFilters,
    /// Report changes below direct children too.
    pub include_subdirectories: bool,
    /// Queue size in bytes; values below 4096 are raised to 4096.
    pub internal_buffer_size: usize,
}

impl WatcherConfig {
    /// Watch `path` with default settings.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Replace the name filter.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Replace the notify filter.
    pub fn with_notify_filter(mut self, notify_filter: NotifyFilters) -> Self {
        self.notify_filter = notify_filter;
        self
    }

    /// Include or exclude subdirectories.
    pub fn with_include_subdirectories(mut self, include: bool) -> Self {
        self.include_subdirectories = include;
        self
    }

    /// Replace the internal buffer size.
    pub fn with_internal_buffer_size(mut self, size: usize) -> Self {
        self.internal_buffer_size = size;
        self
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            filter: "*.*".into(),
            notify_filter: NotifyFilters::default(),
            include_subdirectories: false,
            internal_buffer_size: DEFAULT_INTERNAL_BUFFER_SIZE,
        }
    }
}

// ============================================================================
// Shared state
// ============================================================================

#[derive(Debug, Clone)]
struct Settings {
    path: Option<AbsolutePath>,
    filter: WildcardPattern,
    notify_filter: NotifyFilters,
    include_subdirectories: bool,
    internal_buffer_size: usize,
}

impl Settings {
    fn capacity(&self) -> usize {
        self.internal_buffer_size / RECORD_SIZE
    }

    /// Path of `path` relative to the watched directory, if in scope.
    fn relative_name(&self, path: &AbsolutePath) -> Option<String> {
        let watched = self.path.as_ref()?;
        if self.include_subdirectories {
            return path
                .is_descendant_of(watched)
                .then(|| path.relative_to(watched))
                .flatten();
        }
        let parent = path.try_get_parent_path()?;
        parent
            .is_equivalent_to(watched)
            .then(|| path.name().to_string())
    }

    fn event_args(&self, path: &AbsolutePath) -> Option<FileSystemEventArgs> {
        let name = self.relative_name(path)?;
        let watched = self.path.as_ref()?;
        let mut full_path = watched.get_text();
        if !full_path.ends_with(crate::SEPARATOR) {
            full_path.push(crate::SEPARATOR);
        }
        full_path.push_str(&name);
        Some(FileSystemEventArgs { full_path, name })
    }

    /// `true` if deleting or renaming `path` takes the watched directory away.
    fn is_watched_or_ancestor(&self, path: &AbsolutePath) -> bool {
        self.path
            .as_ref()
            .is_some_and(|watched| watched.is_equivalent_to(path) || watched.is_descendant_of(path))
    }

    /// Whether the record deserves a slot in the queue.
    fn is_relevant(&self, record: &ChangeRecord) -> bool {
        let in_scope = |path: &AbsolutePath| {
            self.relative_name(path).is_some() || self.is_watched_or_ancestor(path)
        };
        in_scope(&record.path) || record.previous_path.as_ref().is_some_and(in_scope)
    }

    /// `true` if the record deletes or moves away the watched directory.
    fn is_fatal(&self, record: &ChangeRecord) -> bool {
        let removed = if record.access.contains(FileAccessKinds::DELETE) {
            Some(&record.path)
        } else {
            record.previous_path.as_ref()
        };
        record.kind == EntryKind::Directory && removed.is_some_and(|p| self.is_watched_or_ancestor(p))
    }

    fn translate(&self, record: &ChangeRecord) -> Translation {
        if self.is_fatal(record) {
            return Translation::Fatal;
        }

        let filters = record.access.notify_filters(record.kind);
        if !filters.intersects(self.notify_filter) {
            return Translation::Events(Vec::new());
        }
        let matches = |path: &AbsolutePath| self.filter.is_match(path.name());
        let mut events = Vec::new();

        if let Some(old) = &record.previous_path {
            let new = &record.path;
            let same_parent = match (old.try_get_parent_path(), new.try_get_parent_path()) {
                (Some(a), Some(b)) => a.is_equivalent_to(&b),
                _ => false,
            };
            if same_parent {
                if let (Some(old_args), Some(new_args)) = (self.event_args(old), self.event_args(new)) {
                    if matches(old) || matches(new) {
                        events.push(WatcherEvent::Renamed(RenamedEventArgs {
                            full_path: new_args.full_path,
                            name: new_args.name,
                            old_full_path: old_args.full_path,
                            old_name: old_args.name,
                        }));
                    }
                }
            } else {
                if let Some(args) = self.event_args(old).filter(|_| matches(old)) {
                    events.push(WatcherEvent::Deleted(args));
                }
                if let Some(args) = self.event_args(new).filter(|_| matches(new)) {
                    events.push(WatcherEvent::Created(args));
                }
            }
            return Translation::Events(events);
        }

        if let Some(args) = self.event_args(&record.path).filter(|_| matches(&record.path)) {
            events.push(if record.access.contains(FileAccessKinds::CREATE) {
                WatcherEvent::Created(args)
            } else if record.access.contains(FileAccessKinds::DELETE) {
                WatcherEvent::Deleted(args)
            } else {
                WatcherEvent::Changed(args)
            });
        }
        Translation::Events(events)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Translation {
    Events(Vec<WatcherEvent>),
    /// The watched directory went away.
    Fatal,
}

enum QueuedEntry {
    Record(ChangeRecord),
    /// Records from `sequence` on were dropped for lack of space.
    Overflow { sequence: u64 },
}

struct QueuedRecord {
    generation: u64,
    entry: QueuedEntry,
}

impl QueuedRecord {
    fn sequence(&self) -> u64 {
        match &self.entry {
            QueuedEntry::Record(record) => record.sequence,
            QueuedEntry::Overflow { sequence } => *sequence,
        }
    }
}

struct Waiter {
    id: u64,
    change_types: WatcherChangeTypes,
    result: Option<WaitForChangedResult>,
}

struct WatcherState {
    settings: Settings,
    raising_events: bool,
    disposed: bool,
    generation: u64,
    queue: VecDeque<QueuedRecord>,
    /// An overflow marker is queued and not yet reported.
    overflow_pending: bool,
    /// Last sequence still dispatched after a stop.
    drain_through: Option<u64>,
    /// Sequence of the record currently being dispatched.
    in_flight: Option<u64>,
    waiters: Vec<Waiter>,
    next_waiter_id: u64,
    listeners: Vec<Listener>,
    senders: Vec<Sender<WatcherEvent>>,
}

impl WatcherState {
    fn is_active(&self) -> bool {
        !self.disposed && (self.raising_events || !self.waiters.is_empty())
    }

    /// Invalidate everything queued so far.
    fn restart(&mut self) {
        self.generation += 1;
        self.queue.clear();
        self.overflow_pending = false;
        self.drain_through = None;
    }

    /// Stop raising events; what is already queued still gets dispatched.
    fn stop(&mut self) -> bool {
        if !self.raising_events {
            return false;
        }
        self.raising_events = false;
        self.drain_through = self.queue.back().map(QueuedRecord::sequence);
        true
    }

    fn enqueue(&mut self, entry: QueuedEntry) {
        let generation = self.generation;
        self.queue.push_back(QueuedRecord { generation, entry });
    }

    /// Take the next unit of work, skipping stale records.
    fn next_batch(&mut self) -> Option<Batch> {
        while let Some(queued) = self.queue.pop_front() {
            let sequence = queued.sequence();
            if queued.generation != self.generation {
                tracing::trace!(
                    target: TARGET,
                    sequence,
                    "discarding record from an earlier generation"
                );
                continue;
            }
            let raise =
                self.raising_events || self.drain_through.is_some_and(|last| sequence <= last);
            let record = match queued.entry {
                QueuedEntry::Record(record) => record,
                QueuedEntry::Overflow { .. } => {
                    self.overflow_pending = false;
                    let path = self
                        .settings
                        .path
                        .as_ref()
                        .map(AbsolutePath::get_text)
                        .unwrap_or_default();
                    return Some(Batch {
                        sequence,
                        events: vec![WatcherEvent::Error(FsError::BufferOverflow { path })],
                        raise,
                    });
                }
            };
            return Some(match self.settings.translate(&record) {
                Translation::Events(events) => Batch {
                    sequence,
                    events,
                    raise,
                },
                Translation::Fatal => {
                    tracing::warn!(
                        target: TARGET,
                        path = %record.path,
                        "watched directory removed; stopping watcher"
                    );
                    self.raising_events = false;
                    self.restart();
                    Batch {
                        sequence,
                        events: vec![WatcherEvent::Error(FsError::AccessDenied)],
                        raise,
                    }
                }
            });
        }
        self.drain_through = None;
        None
    }

    fn deliver_to_waiters(&mut self, events: &[WatcherEvent]) {
        for event in events {
            let Some(result) = WaitForChangedResult::from_event(event) else {
                continue;
            };
            for waiter in self
                .waiters
                .iter_mut()
                .filter(|w| w.result.is_none() && w.change_types.intersects(result.change_type))
            {
                waiter.result = Some(result.clone());
            }
        }
    }
}

struct Batch {
    sequence: u64,
    events: Vec<WatcherEvent>,
    /// Dispatch to listeners; waiters see the events either way.
    raise: bool,
}

/// State shared by a watcher handle, its worker and the change tracker.
pub(crate) struct WatcherShared {
    state: Mutex<WatcherState>,
    signal: Condvar,
}

impl WatcherShared {
    /// Enqueue a record without blocking.
    ///
    /// A full queue drops the record and queues one overflow marker in its
    /// place. Records that take the watched directory away are always queued.
    pub(crate) fn offer(&self, record: &ChangeRecord) {
        let mut state = self.state.lock();
        if !state.is_active() || !state.settings.is_relevant(record) {
            return;
        }
        if state.queue.len() < state.settings.capacity() || state.settings.is_fatal(record) {
            state.enqueue(QueuedEntry::Record(record.clone()));
        } else if !state.overflow_pending {
            tracing::warn!(
                target: TARGET,
                capacity = state.settings.capacity(),
                "watcher buffer overflow; dropping notifications"
            );
            state.overflow_pending = true;
            state.enqueue(QueuedEntry::Overflow {
                sequence: record.sequence,
            });
        }
        self.signal.notify_all();
    }
}

fn run_worker(shared: Arc<WatcherShared>) {
    loop {
        let (batch, raising, listeners, senders) = {
            let mut state = shared.state.lock();
            let batch = loop {
                if state.disposed {
                    return;
                }
                if let Some(batch) = state.next_batch() {
                    break batch;
                }
                shared.signal.wait(&mut state);
            };
            state.in_flight = Some(batch.sequence);
            let raising = batch.raise;
            (batch, raising, state.listeners.clone(), state.senders.clone())
        };

        let mut disconnected = Vec::new();
        if raising {
            for event in &batch.events {
                dispatch(event, &listeners, &senders, &mut disconnected);
            }
        }

        let mut state = shared.state.lock();
        state.deliver_to_waiters(&batch.events);
        state.in_flight = None;
        if !disconnected.is_empty() {
            state
                .senders
                .retain(|s| !disconnected.iter().any(|d: &Sender<WatcherEvent>| d.same_channel(s)));
        }
        shared.signal.notify_all();
    }
}

fn dispatch(
    event: &WatcherEvent,
    listeners: &[Listener],
    senders: &[Sender<WatcherEvent>],
    disconnected: &mut Vec<Sender<WatcherEvent>>,
) {
    for listener in listeners {
        if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
            tracing::error!(target: TARGET, ?event, "watcher listener panicked");
        }
    }
    for sender in senders {
        if sender.send(event.clone()).is_err() {
            disconnected.push(sender.clone());
        }
    }
}

// ============================================================================
// Public handle
// ============================================================================

/// A change watcher over a [`FakeFileSystem`](crate::FakeFileSystem).
///
/// Created stopped; call
/// [`set_enable_raising_events(true)`](FsWatcher::set_enable_raising_events)
/// to start delivering events. Each watcher owns one background thread that
/// translates change records into [`WatcherEvent`]s. Dropping the watcher
/// disposes it.
pub struct FakeFileSystemWatcher {
    shared: Arc<WatcherShared>,
    filesystem: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl FakeFileSystemWatcher {
    pub(crate) fn spawn(filesystem: Arc<Shared>, config: WatcherConfig) -> Result<Self, FsError> {
        let path = resolve_watch_path(&filesystem, &config.path)?;
        let settings = Settings {
            path,
            filter: WildcardPattern::new(normalize_filter(&config.filter)),
            notify_filter: config.notify_filter,
            include_subdirectories: config.include_subdirectories,
            internal_buffer_size: config.internal_buffer_size.max(MIN_INTERNAL_BUFFER_SIZE),
        };
        let shared = Arc::new(WatcherShared {
            state: Mutex::new(WatcherState {
                settings,
                raising_events: false,
                disposed: false,
                generation: 0,
                queue: VecDeque::new(),
                overflow_pending: false,
                drain_through: None,
                in_flight: None,
                waiters: Vec::new(),
                next_waiter_id: 0,
                listeners: Vec::new(),
                senders: Vec::new(),
            }),
            signal: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("anyfs-fakes-watcher".into())
            .spawn(move || run_worker(worker_shared))
            .map_err(|e| FsError::Io {
                message: e.to_string(),
            })?;
        filesystem.tracker.register(&shared);
        tracing::debug!(target: TARGET, path = %config.path, "watcher created");

        Ok(Self {
            shared,
            filesystem,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Block until every change made before this call has been dispatched.
    ///
    /// Returns `false` if `timeout` elapsed first.
    pub fn wait_until_flushed(&self, timeout: Duration) -> bool {
        let target = self.filesystem.tracker.last_sequence();
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            let pending = state
                .queue
                .front()
                .is_some_and(|q| q.sequence() <= target)
                || state.in_flight.is_some_and(|sequence| sequence <= target);
            if !pending || state.disposed {
                return true;
            }
            if self.shared.signal.wait_until(&mut state, deadline).timed_out() {
                return false;
            }
        }
    }

    /// Apply a setting that restarts the watcher when it changes.
    fn reconfigure(&self, apply: impl FnOnce(&mut Settings) -> bool) {
        let mut state = self.shared.state.lock();
        if apply(&mut state.settings) {
            state.restart();
            tracing::debug!(
                target: TARGET,
                generation = state.generation,
                "watcher configuration changed; restarting"
            );
        }
    }
}

impl FsWatcher for FakeFileSystemWatcher {
    fn path(&self) -> String {
        let state = self.shared.state.lock();
        state
            .settings
            .path
            .as_ref()
            .map(AbsolutePath::get_text)
            .unwrap_or_default()
    }

    fn set_path(&self, path: &str) -> Result<(), FsError> {
        if self.shared.state.lock().disposed {
            return Ok(());
        }
        let resolved = resolve_watch_path(&self.filesystem, path)?;
        self.reconfigure(|settings| {
            let changed = match (&settings.path, &resolved) {
                (Some(a), Some(b)) => a != b,
                (None, None) => false,
                _ => true,
            };
            settings.path = resolved;
            changed
        });
        Ok(())
    }

    fn filter(&self) -> String {
        self.shared.state.lock().settings.filter.as_str().to_string()
    }

    fn set_filter(&self, filter: &str) {
        let pattern = WildcardPattern::new(normalize_filter(filter));
        self.reconfigure(|settings| {
            let changed = settings.filter.as_str() != pattern.as_str();
            settings.filter = pattern;
            changed
        });
    }

    fn notify_filter(&self) -> NotifyFilters {
        self.shared.state.lock().settings.notify_filter
    }

    fn set_notify_filter(&self, notify_filter: NotifyFilters) {
        self.shared.state.lock().settings.notify_filter = notify_filter;
    }

    fn include_subdirectories(&self) -> bool {
        self.shared.state.lock().settings.include_subdirectories
    }

    fn set_include_subdirectories(&self, include: bool) {
        self.reconfigure(|settings| {
            let changed = settings.include_subdirectories != include;
            settings.include_subdirectories = include;
            changed
        });
    }

    fn internal_buffer_size(&self) -> usize {
        self.shared.state.lock().settings.internal_buffer_size
    }

    fn set_internal_buffer_size(&self, size: usize) {
        let size = size.max(MIN_INTERNAL_BUFFER_SIZE);
        self.reconfigure(|settings| {
            let changed = settings.internal_buffer_size != size;
            settings.internal_buffer_size = size;
            changed
        });
    }

    fn enable_raising_events(&self) -> bool {
        self.shared.state.lock().raising_events
    }

    fn set_enable_raising_events(&self, enabled: bool) -> Result<(), FsError> {
        if !enabled {
            let mut state = self.shared.state.lock();
            if state.stop() {
                tracing::debug!(target: TARGET, queued = state.queue.len(), "watcher stopped");
            }
            return Ok(());
        }

        let path = {
            let state = self.shared.state.lock();
            if state.disposed {
                return Err(FsError::Disposed {
                    object_name: "FileSystemWatcher",
                });
            }
            if state.raising_events {
                return Ok(());
            }
            state.settings.path.clone()
        };
        let path = path.ok_or_else(|| FsError::WatcherPathInvalid {
            path: String::new(),
        })?;
        if !self.filesystem.directory_exists(&path) {
            return Err(FsError::WatchedDirectoryMissing {
                path: path.get_text(),
            });
        }

        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(FsError::Disposed {
                object_name: "FileSystemWatcher",
            });
        }
        if !state.raising_events {
            state.restart();
            state.raising_events = true;
            tracing::debug!(
                target: TARGET,
                path = %path,
                generation = state.generation,
                "watcher started"
            );
        }
        Ok(())
    }

    fn subscribe(&self) -> Receiver<WatcherEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.shared.state.lock().senders.push(sender);
        receiver
    }

    fn add_listener(&self, listener: Box<dyn Fn(&WatcherEvent) + Send + Sync>) {
        self.shared.state.lock().listeners.push(Arc::from(listener));
    }

    fn wait_for_changed(
        &self,
        change_types: WatcherChangeTypes,
        timeout: WaitTimeout,
    ) -> Result<WaitForChangedResult, FsError> {
        let deadline = match timeout {
            WaitTimeout::Infinite => None,
            WaitTimeout::After(duration) if duration.is_zero() => {
                return Err(FsError::invalid_argument("Timeout must be greater than zero."));
            }
            WaitTimeout::After(duration) => Some(Instant::now() + duration),
        };

        let mut state = self.shared.state.lock();
        if state.disposed {
            return Err(FsError::Disposed {
                object_name: "FileSystemWatcher",
            });
        }
        if state.settings.path.is_none() {
            return Err(FsError::WatcherPathInvalid {
                path: String::new(),
            });
        }
        let id = state.next_waiter_id;
        state.next_waiter_id += 1;
        state.waiters.push(Waiter {
            id,
            change_types,
            result: None,
        });

        let outcome = loop {
            if state.disposed {
                break Err(FsError::Disposed {
                    object_name: "FileSystemWatcher",
                });
            }
            let ready = state
                .waiters
                .iter_mut()
                .find(|w| w.id == id)
                .and_then(|w| w.result.take());
            if let Some(result) = ready {
                break Ok(result);
            }
            match deadline {
                None => self.shared.signal.wait(&mut state),
                Some(deadline) => {
                    if self.shared.signal.wait_until(&mut state, deadline).timed_out() {
                        let late = state
                            .waiters
                            .iter_mut()
                            .find(|w| w.id == id)
                            .and_then(|w| w.result.take());
                        break Ok(late.unwrap_or_else(WaitForChangedResult::timed_out));
                    }
                }
            }
        };
        state.waiters.retain(|w| w.id != id);
        outcome
    }

    fn dispose(&self) {
        {
            let mut state = self.shared.state.lock();
            if state.disposed {
                return;
            }
            state.disposed = true;
            state.raising_events = false;
            state.queue.clear();
            self.shared.signal.notify_all();
        }
        tracing::debug!(target: TARGET, "watcher disposed");
        if let Some(worker) = self.worker.lock().take() {
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl Drop for FakeFileSystemWatcher {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for FakeFileSystemWatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("FakeFileSystemWatcher")
            .field("path", &state.settings.path)
            .field("filter", &state.settings.filter.as_str())
            .field("raising_events", &state.raising_events)
            .field("disposed", &state.disposed)
            .finish()
    }
}

fn normalize_filter(filter: &str) -> &str {
    if filter.is_empty() { "*" } else { filter }
}

fn resolve_watch_path(filesystem: &Shared, text: &str) -> Result<Option<AbsolutePath>, FsError> {
    if text.is_empty() {
        return Ok(None);
    }
    let invalid = || FsError::WatcherPathInvalid { path: text.into() };
    let path = filesystem.absolute_path(text).map_err(|_| invalid())?;
    if !filesystem.directory_exists(&path) {
        return Err(invalid());
    }
    Ok(Some(path))
}

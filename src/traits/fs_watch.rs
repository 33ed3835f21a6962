//! Change notification.

use crossbeam_channel::Receiver;

use crate::{
    FsError, NotifyFilters, WaitForChangedResult, WaitTimeout, WatcherChangeTypes, WatcherConfig,
    WatcherEvent,
};

/// A directory watcher.
///
/// A watcher starts stopped. Changing [`path`](Self::set_path),
/// [`filter`](Self::set_filter),
/// [`include_subdirectories`](Self::set_include_subdirectories) or
/// [`internal_buffer_size`](Self::set_internal_buffer_size) while running
/// restarts it: notifications queued before the change are discarded.
/// [`notify_filter`](Self::set_notify_filter) applies immediately without a
/// restart.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWatcher`.
pub trait FsWatcher: Send + Sync {
    /// Watched directory, or an empty string if none.
    fn path(&self) -> String;

    /// Watch a different directory. An empty string clears the path.
    ///
    /// # Errors
    ///
    /// - [`FsError::WatcherPathInvalid`] unless `path` names an existing directory
    fn set_path(&self, path: &str) -> Result<(), FsError>;

    /// Name pattern applied to the last path component.
    fn filter(&self) -> String;

    /// Change the name pattern. An empty pattern matches everything.
    fn set_filter(&self, filter: &str);

    /// Categories of change reported.
    fn notify_filter(&self) -> NotifyFilters;

    /// Change the reported categories.
    fn set_notify_filter(&self, notify_filter: NotifyFilters);

    /// Whether changes below direct children are reported.
    fn include_subdirectories(&self) -> bool;

    /// Report changes anywhere below the watched directory.
    fn set_include_subdirectories(&self, include: bool);

    /// Queue size in bytes. Each pending notification takes 64 bytes.
    fn internal_buffer_size(&self) -> usize;

    /// Resize the queue. Sizes below 4096 bytes are raised to 4096.
    fn set_internal_buffer_size(&self, size: usize);

    /// Whether events are currently delivered to listeners.
    fn enable_raising_events(&self) -> bool;

    /// Start or stop delivering events.
    ///
    /// Stopping still delivers notifications queued before the call; changes
    /// made afterwards are ignored. Starting discards anything still queued.
    ///
    /// # Errors
    ///
    /// - [`FsError::Disposed`] when starting a disposed watcher
    /// - [`FsError::WatcherPathInvalid`] when starting without a path
    /// - [`FsError::WatchedDirectoryMissing`] when the directory no longer exists
    fn set_enable_raising_events(&self, enabled: bool) -> Result<(), FsError>;

    /// A channel receiving every event raised from now on.
    fn subscribe(&self) -> Receiver<WatcherEvent>;

    /// Register a callback invoked for every event on the watcher's thread.
    ///
    /// A panicking listener is logged and skipped; dispatch continues.
    fn add_listener(&self, listener: Box<dyn Fn(&WatcherEvent) + Send + Sync>);

    /// Block until a change of one of `change_types` happens, or `timeout` elapses.
    ///
    /// Works whether or not events are being raised.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] for a zero timeout
    /// - [`FsError::WatcherPathInvalid`] without a path
    /// - [`FsError::Disposed`] if the watcher is or becomes disposed
    fn wait_for_changed(
        &self,
        change_types: WatcherChangeTypes,
        timeout: WaitTimeout,
    ) -> Result<WaitForChangedResult, FsError>;

    /// Stop the watcher for good. Idempotent.
    fn dispose(&self);
}

/// Filesystems that can hand out watchers.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsWatch`.
pub trait FsWatch: Send + Sync {
    /// Create a stopped watcher.
    ///
    /// # Errors
    ///
    /// - [`FsError::WatcherPathInvalid`] if a non-empty `config.path` is not an
    ///   existing directory
    fn create_watcher(&self, config: WatcherConfig) -> Result<Box<dyn FsWatcher>, FsError>;
}

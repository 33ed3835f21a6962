//! # Change Notification
//!
//! Every mutating operation publishes a change record through the
//! filesystem's [`ChangeTracker`](tracker::ChangeTracker). Each
//! [`FakeFileSystemWatcher`] keeps a bounded queue of the records in its scope
//! and a worker thread that filters them and raises [`WatcherEvent`]s.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`WatcherConfig`] | Initial path, filters and buffer size |
//! | [`NotifyFilters`] | Categories of change to report |
//! | [`WatcherEvent`] | Created / Deleted / Changed / Renamed / Error |
//! | [`WaitTimeout`] / [`WaitForChangedResult`] | Blocking waits |

mod engine;
mod event;
mod filter;
mod tracker;

pub use engine::{FakeFileSystemWatcher, WatcherConfig, MIN_INTERNAL_BUFFER_SIZE};
pub use event::{
    FileSystemEventArgs, RenamedEventArgs, WaitForChangedResult, WaitTimeout, WatcherChangeTypes,
    WatcherEvent,
};
pub use filter::NotifyFilters;

pub(crate) use filter::FileAccessKinds;
pub(crate) use tracker::ChangeTracker;

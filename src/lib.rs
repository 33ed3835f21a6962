//! # anyfs-fakes
//!
//! An in-memory emulation of a **Windows-style filesystem** for testing code
//! that is written against filesystem abstractions.
//!
//! The emulation reproduces the observable behavior of the real platform:
//! drive letters and UNC shares, case-insensitive but case-preserving names,
//! file attributes, three timestamps per entry, exclusive-access tracking for
//! open files, disk-space accounting and asynchronous change notification.
//! Errors carry the same message text the operating system produces, so a
//! test can assert on them.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use anyfs_fakes::{
//!     EnumerationKind, FakeFileSystem, FsDirectory, FsError, FsExt, SearchOption,
//! };
//!
//! let fs = FakeFileSystem::new();
//! fs.create_directory(r"C:\Projects\Demo").unwrap();
//! fs.write_all_text(r"C:\Projects\Demo\readme.md", "# Demo").unwrap();
//!
//! let found = fs
//!     .enumerate(r"c:\projects", "*.md", SearchOption::AllDirectories, EnumerationKind::Files)
//!     .unwrap();
//! assert_eq!(found, [r"C:\projects\Demo\readme.md"]);
//!
//! let err = fs.delete_directory(r"C:\Projects", false).unwrap_err();
//! assert!(matches!(err, FsError::DirectoryNotEmpty { .. }));
//! ```
//!
//! ---
//!
//! ## Trait Hierarchy
//!
//! ```text
//! FsFile + FsDirectory + FsEntry + FsCrypto + FsWatch = FileSystem
//! ```
//!
//! [`FileSystem`] has a blanket implementation. Client code takes
//! `&dyn FileSystem` or `impl FileSystem`; tests hand it a
//! [`FakeFileSystem`].
//!
//! ---
//!
//! ## Paths
//!
//! Every operation accepts a path string. Drive-absolute (`C:\a`), UNC
//! (`\\server\share\a`), extended (`\\?\C:\a`), rooted (`\a`) and relative
//! (`a\b`) forms are accepted; the last two resolve against the current
//! directory. See [`parse_path`] for normalization rules and rejected forms.
//!
//! ---
//!
//! ## Watching for Changes
//!
//! ```rust
//! use anyfs_fakes::{FakeFileSystem, FsExt, FsWatcher, WatcherConfig, WatcherEvent};
//! use std::time::Duration;
//!
//! let fs = FakeFileSystem::new();
//! let watcher = fs.watch(WatcherConfig::new(r"C:\")).unwrap();
//! let events = watcher.subscribe();
//! watcher.set_enable_raising_events(true).unwrap();
//!
//! fs.write_all_text(r"C:\new.txt", "hi").unwrap();
//! match events.recv_timeout(Duration::from_secs(5)).unwrap() {
//!     WatcherEvent::Created(args) => assert_eq!(args.name, "new.txt"),
//!     other => panic!("unexpected event {other:?}"),
//! }
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync` and take `&self`. A [`FakeFileSystem`]
//! clone shares state with the original; operations are serialized on one
//! internal lock. Each watcher delivers events from its own thread.
//!
//! ---
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events under the
//! `anyfs_fakes` targets. No subscriber is installed.
//!
//! ---
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `serde` | Serialization for value types and options; `FsExtJson` helpers |

// Private modules
mod clock;
mod config;
mod error;
mod ext;
mod filesystem;
mod handlers;
mod path;
mod resolve;
mod stream;
mod traits;
mod tree;
mod types;
mod watcher;

// Public re-exports - error types
pub use error::{ErrorKind, FsError};

// Public re-exports - value types
pub use types::{
    win32_epoch, DriveInfo, DriveType, EntryKind, EntryMetadata, EnumerationKind,
    FileAccess, FileAttributes, FileMode, SearchOption, TimeKind, VolumeInfo,
};

// Public re-exports - paths
pub use path::{
    parse as parse_path, parse_relative_to, AbsolutePath, PathNavigator, WildcardPattern,
    SEPARATOR,
};

// Public re-exports - traits
pub use traits::{
    FileStream, FileSystem, FsCrypto, FsDirectory, FsEntry, FsFile, FsWatch, FsWatcher,
};

// Public re-exports - the emulation
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{FakeFileSystemOptions, VolumeSpec};
pub use filesystem::FakeFileSystem;
pub use stream::FakeFileStream;

// Public re-exports - change notification
pub use watcher::{
    FakeFileSystemWatcher, FileSystemEventArgs, NotifyFilters, RenamedEventArgs,
    WaitForChangedResult, WaitTimeout, WatcherChangeTypes, WatcherConfig, WatcherEvent,
    MIN_INTERNAL_BUFFER_SIZE,
};

// Public re-exports - infrastructure
pub use ext::FsExt;

// Conditional re-exports
#[cfg(feature = "serde")]
pub use ext::FsExtJson;

//! # Filesystem Traits
//!
//! The trait surface client code is written against.
//!
//! ## Trait Layers
//!
//! ```text
//! FsFile + FsDirectory + FsEntry + FsCrypto + FsWatch = FileSystem
//! ```
//!
//! | Trait | Covers |
//! |-------|--------|
//! | [`FsFile`] | open, delete, move, copy, replace files |
//! | [`FsDirectory`] | create, delete, move, enumerate directories; current directory |
//! | [`FsEntry`] | metadata, attributes, timestamps, drives |
//! | [`FsCrypto`] | encrypt, decrypt |
//! | [`FsWatch`] | change watchers ([`FsWatcher`]) |
//!
//! ## Blanket Implementation
//!
//! [`FileSystem`] is implemented for every type implementing all component
//! traits, so code can take `&dyn FileSystem` or `impl FileSystem`:
//!
//! ```rust
//! use anyfs_fakes::{FakeFileSystem, FileSystem, FsDirectory, FsError};
//!
//! fn prepare(fs: &dyn FileSystem) -> Result<(), FsError> {
//!     fs.create_directory(r"C:\work\logs")?;
//!     fs.set_current_directory(r"C:\work")?;
//!     Ok(())
//! }
//!
//! let fs = FakeFileSystem::new();
//! prepare(&fs).unwrap();
//! assert!(fs.directory_exists("logs"));
//! ```
//!
//! ## Thread Safety
//!
//! All traits require `Send + Sync`; methods take `&self`.

mod fs_crypto;
mod fs_directory;
mod fs_entry;
mod fs_file;
mod fs_watch;

pub use fs_crypto::FsCrypto;
pub use fs_directory::FsDirectory;
pub use fs_entry::FsEntry;
pub use fs_file::{FileStream, FsFile};
pub use fs_watch::{FsWatch, FsWatcher};

/// A complete filesystem.
///
/// # Blanket Implementation
///
/// Automatically implemented for any type that implements all component
/// traits. You never need to implement `FileSystem` directly.
///
/// # Example
///
/// ```rust
/// use anyfs_fakes::{FileAccess, FileMode, FileSystem, FsError};
/// use std::io::Write;
///
/// fn touch<F: FileSystem>(fs: &F, path: &str) -> Result<(), FsError> {
///     let mut stream = fs.open(path, FileMode::OpenOrCreate, FileAccess::Write)?;
///     stream.write_all(b"")?;
///     stream.close()
/// }
/// ```
pub trait FileSystem: FsFile + FsDirectory + FsEntry + FsCrypto + FsWatch {}

// Blanket implementation
impl<T: FsFile + FsDirectory + FsEntry + FsCrypto + FsWatch> FileSystem for T {}

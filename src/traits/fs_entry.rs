//! Operations that apply to files and directories alike.

use std::time::SystemTime;

use crate::{DriveInfo, EntryMetadata, FileAttributes, FsError, TimeKind};

/// Metadata, attributes and timestamps of any entry, plus volume listing.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsEntry`.
pub trait FsEntry: Send + Sync {
    /// Returns `true` if a file or directory exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Metadata for the entry at `path`.
    ///
    /// # Errors
    ///
    /// - [`FsError::FileNotFound`] / [`FsError::DirectoryNotFound`] if missing
    fn metadata(&self, path: &str) -> Result<EntryMetadata, FsError>;

    /// Attributes as reported by the platform.
    ///
    /// # Errors
    ///
    /// - [`FsError::FileNotFound`] / [`FsError::DirectoryNotFound`] if missing
    fn attributes(&self, path: &str) -> Result<FileAttributes, FsError> {
        Ok(self.metadata(path)?.attributes)
    }

    /// Store attributes, dropping bits the entry kind cannot hold.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] for a network share root
    /// - [`FsError::UnauthorizedAccess`] if encrypted by another account
    /// - [`FsError::FileInUse`] if the file is open for writing
    fn set_attributes(&self, path: &str, attributes: FileAttributes) -> Result<(), FsError>;

    /// One of the entry's timestamps.
    ///
    /// A missing entry reports the Win32 epoch
    /// ([`win32_epoch`](crate::win32_epoch)), not an error.
    ///
    /// # Errors
    ///
    /// - Path syntax errors only
    fn time(&self, path: &str, kind: TimeKind) -> Result<SystemTime, FsError>;

    /// Store one of the entry's timestamps.
    ///
    /// # Errors
    ///
    /// - [`FsError::PathIsDrive`] for a volume root
    /// - [`FsError::InvalidFileTime`] for a time before 1601-01-01 UTC
    /// - [`FsError::UnauthorizedAccess`] for a read-only or externally encrypted file
    /// - [`FsError::FileInUse`] if the file is open
    fn set_time(&self, path: &str, kind: TimeKind, value: SystemTime) -> Result<(), FsError>;

    /// Mounted volumes in name order.
    fn drives(&self) -> Vec<DriveInfo>;
}

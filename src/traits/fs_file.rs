//! File-level operations and the stream handle they hand out.

use std::io::{Read, Seek, Write};

use crate::{FileAccess, FileMode, FsError};

/// An open file.
///
/// Reads and writes move a single position; `Seek` past the end is allowed
/// and a later write zero-fills the gap. Closing releases the handle's share
/// of the file; dropping the stream closes it.
pub trait FileStream: Read + Write + Seek + Send {
    /// Full path of the file as it was opened.
    fn name(&self) -> String;

    /// Current length in bytes.
    ///
    /// # Errors
    ///
    /// - [`FsError::StreamClosed`] after [`close`](Self::close)
    fn len(&self) -> Result<u64, FsError>;

    /// `true` if the file has no content.
    ///
    /// # Errors
    ///
    /// - [`FsError::StreamClosed`] after [`close`](Self::close)
    fn is_empty(&self) -> Result<bool, FsError> {
        Ok(self.len()? == 0)
    }

    /// Truncate or zero-extend the file.
    ///
    /// # Errors
    ///
    /// - [`FsError::StreamNotWritable`] if opened without write access
    /// - [`FsError::NotEnoughSpace`] if the volume cannot hold the growth
    /// - [`FsError::StreamClosed`] after [`close`](Self::close)
    fn set_len(&mut self, len: u64) -> Result<(), FsError>;

    /// Current position.
    ///
    /// # Errors
    ///
    /// - [`FsError::StreamClosed`] after [`close`](Self::close)
    fn position(&self) -> Result<u64, FsError>;

    /// Returns `true` if the stream was opened with read access and is open.
    fn can_read(&self) -> bool;

    /// Returns `true` if the stream was opened with write access and is open.
    fn can_write(&self) -> bool;

    /// Release the handle. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Implementations in this crate never fail; the `Result` leaves room for
    /// backends that flush on close.
    fn close(&mut self) -> Result<(), FsError>;
}

/// File operations.
///
/// # Thread Safety
///
/// All methods take `&self`; implementations serialize access internally.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsFile`.
pub trait FsFile: Send + Sync {
    /// Open a file.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidArgument`] for an invalid `mode`/`access` pair
    /// - [`FsError::FileAlreadyExists`] for [`FileMode::CreateNew`] on an existing file
    /// - [`FsError::FileNotFound`] for [`FileMode::Open`] or [`FileMode::Truncate`]
    ///   on a missing file
    /// - [`FsError::UnauthorizedAccess`] if the path is a directory, or the
    ///   file is read-only (write access), hidden ([`FileMode::Create`]) or
    ///   encrypted by another account
    /// - [`FsError::FileInUse`] if an existing handle conflicts
    fn open(
        &self,
        path: &str,
        mode: FileMode,
        access: FileAccess,
    ) -> Result<Box<dyn FileStream>, FsError>;

    /// Returns `true` if `path` names an existing file. Invalid paths yield `false`.
    fn file_exists(&self, path: &str) -> bool;

    /// Delete a file. Deleting a missing file in an existing directory succeeds.
    ///
    /// # Errors
    ///
    /// - [`FsError::DirectoryNotFound`] if the containing directory is missing
    /// - [`FsError::UnauthorizedAccess`] if the path is a directory or the file is read-only
    /// - [`FsError::FileInUse`] if the file is open
    fn delete_file(&self, path: &str) -> Result<(), FsError>;

    /// Move or rename a file, across volumes if needed.
    ///
    /// Moving a file onto itself does nothing; a case-only rename is allowed.
    ///
    /// # Errors
    ///
    /// - [`FsError::FileNotFound`] if the source is missing
    /// - [`FsError::CannotCreateFileExists`] if the destination exists
    /// - [`FsError::FileInUse`] if the source is open
    /// - [`FsError::NotEnoughSpace`] if the target volume cannot hold the file
    fn move_file(&self, source: &str, destination: &str) -> Result<(), FsError>;

    /// Copy a file.
    ///
    /// The copy takes the source's attributes and last-write time.
    ///
    /// # Errors
    ///
    /// - [`FsError::FileInUse`] if the source is open or both paths name the same file
    /// - [`FsError::UnauthorizedAccess`] if the source is a directory, or an
    ///   overwritten destination is hidden or read-only
    /// - [`FsError::FileAlreadyExists`] if the destination exists and `overwrite` is `false`
    /// - [`FsError::TargetIsDirectory`] if the destination is a directory
    fn copy_file(&self, source: &str, destination: &str, overwrite: bool) -> Result<(), FsError>;

    /// Replace `destination` with `source`, optionally keeping the old
    /// destination at `backup`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InUse`] if any two paths name the same file
    /// - [`FsError::UnableToMoveReplacement`] if the paths span volumes
    /// - [`FsError::FileNotFound`] if the source or destination is missing
    /// - [`FsError::FileInUse`] if any involved file is open
    fn replace_file(
        &self,
        source: &str,
        destination: &str,
        backup: Option<&str>,
    ) -> Result<(), FsError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fs_file_is_object_safe() {
        fn _check(_: &dyn FsFile) {}
    }

    #[test]
    fn file_stream_is_object_safe() {
        fn _check(_: &mut dyn FileStream) {}
    }

    #[test]
    fn fs_file_requires_send_sync() {
        fn _assert_send_sync<T: Send + Sync>() {}
        fn _check<T: FsFile>() {
            _assert_send_sync::<T>();
        }
    }
}

impl std::fmt::Debug for dyn FileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStream").finish_non_exhaustive()
    }
}

//! Directory operations.

use crate::{EnumerationKind, FsError, SearchOption};

/// Directory operations and the process-wide current directory.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsDirectory`.
pub trait FsDirectory: Send + Sync {
    /// Create a directory and any missing ancestors.
    ///
    /// An existing directory is not an error.
    ///
    /// # Errors
    ///
    /// - [`FsError::CannotCreateExisting`] if a file occupies any component
    /// - [`FsError::DirectoryNotFound`] / [`FsError::NetworkPathNotFound`] if
    ///   the volume does not exist
    fn create_directory(&self, path: &str) -> Result<(), FsError>;

    /// Delete a directory.
    ///
    /// With `recursive`, everything deletable is deleted and the first
    /// failure is reported afterwards.
    ///
    /// # Errors
    ///
    /// - [`FsError::UnauthorizedAccess`] for a volume root or read-only directory
    /// - [`FsError::FileInUse`] if the directory contains the current directory
    /// - [`FsError::InvalidDirectoryName`] if the path is a file
    /// - [`FsError::DirectoryNotEmpty`] for a non-recursive delete of a non-empty directory
    fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), FsError>;

    /// Move or rename a directory within one volume.
    ///
    /// # Errors
    ///
    /// - [`FsError::SameSourceAndDestination`] if both paths are identical
    /// - [`FsError::CrossVolumeMove`] if the paths are on different volumes
    /// - [`FsError::InUse`] if the destination lies below the source
    /// - [`FsError::CannotCreateFileExists`] if the destination exists
    /// - [`FsError::UnauthorizedAccess`] for a volume root or a tree holding open files
    fn move_directory(&self, source: &str, destination: &str) -> Result<(), FsError>;

    /// Returns `true` if `path` names an existing directory or volume root.
    fn directory_exists(&self, path: &str) -> bool;

    /// Full paths of the entries below `path` matching `pattern`.
    ///
    /// `pattern` may contain separator-delimited directory segments, each
    /// matched at successive depths; `*` and `?` are wildcards. Results are
    /// sorted case-insensitively within each directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::DirectoryNotFound`] if `path` does not exist
    /// - [`FsError::InvalidDirectoryName`] if `path` is a file
    /// - [`FsError::InvalidArgument`] if `pattern` contains `..`
    fn enumerate(
        &self,
        path: &str,
        pattern: &str,
        option: SearchOption,
        kind: EnumerationKind,
    ) -> Result<Vec<String>, FsError>;

    /// The current directory.
    fn current_directory(&self) -> String;

    /// Change the current directory. Relative paths resolve against the old one.
    ///
    /// # Errors
    ///
    /// - [`FsError::DirectoryNotFound`] if `path` is not an existing directory
    fn set_current_directory(&self, path: &str) -> Result<(), FsError>;
}

//! Error types for the emulated filesystem.
//!
//! Every variant renders the phrasing the real Windows APIs use, so tests
//! written against the OS can assert on the same message text.

use std::fmt;

/// Broad classification of an [`FsError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A file, directory or network path does not exist.
    NotFound,
    /// The target already exists.
    AlreadyExists,
    /// Access was denied (read-only, hidden, encrypted, volume root).
    AccessDenied,
    /// The entry is held open or is in use by the process.
    InUse,
    /// Malformed path, bad timestamp, bad argument combination.
    InvalidArgument,
    /// Unsupported namespace, reserved name or unsupported feature.
    NotSupported,
    /// A watcher dropped notifications because its buffer filled up.
    Overflow,
    /// The object was used after being disposed or closed.
    Disposed,
    /// A directory could not be removed because it still has children.
    DirectoryNotEmpty,
    /// Any other I/O failure.
    Io,
}

/// Filesystem error type with contextual variants.
///
/// # Examples
///
/// ```rust
/// use anyfs_fakes::{ErrorKind, FsError};
///
/// let err = FsError::FileNotFound { path: r"C:\missing.txt".into() };
/// assert_eq!(err.to_string(), r"Could not find file 'C:\missing.txt'.");
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// ```
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FsError {
    // Path syntax errors
    /// The path is empty.
    #[error("The path is empty.")]
    EmptyPath,

    /// The path consists of whitespace only.
    #[error("The path is not of a legal form.")]
    IllegalPathForm,

    /// The path contains wildcard or control characters.
    #[error("Illegal characters in path '{path}'.")]
    IllegalCharacters {
        /// The offending path text.
        path: String,
    },

    /// The path has a shape the emulation cannot handle (extra colon, relative).
    #[error("The given path's format is not supported.")]
    UnsupportedPathFormat {
        /// The offending path text.
        path: String,
    },

    /// Device or NT namespace prefixes.
    #[error("Only Win32 File Namespaces are supported.")]
    UnsupportedNamespace {
        /// The offending path text.
        path: String,
    },

    /// A component is a reserved device name such as `CON` or `LPT1`.
    #[error("Reserved names are not supported.")]
    ReservedName {
        /// The offending path text.
        path: String,
    },

    /// A network path without a share segment.
    #[error("The UNC path should be of the form \\\\server\\share.")]
    InvalidUncPath {
        /// The offending path text.
        path: String,
    },

    /// The path is syntactically valid but cannot be used here.
    #[error("The specified path is invalid : '{path}'")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    // Lookup errors
    /// File does not exist.
    #[error("Could not find file '{path}'.")]
    FileNotFound {
        /// The missing file.
        path: String,
    },

    /// A directory in the path does not exist.
    #[error("Could not find a part of the path '{path}'.")]
    DirectoryNotFound {
        /// The path that could not be resolved.
        path: String,
    },

    /// The network host or share does not exist.
    #[error("The network path was not found.")]
    NetworkPathNotFound {
        /// The path that could not be resolved.
        path: String,
    },

    // Conflict errors
    /// A file already exists at the target path.
    #[error("The file '{path}' already exists.")]
    FileAlreadyExists {
        /// The existing file.
        path: String,
    },

    /// A file or directory already occupies the name.
    #[error("Cannot create '{path}' because a file or directory with the same name already exists.")]
    CannotCreateExisting {
        /// The occupied path.
        path: String,
    },

    /// Move target already exists.
    #[error("Cannot create a file when that file already exists.")]
    CannotCreateFileExists {
        /// The occupied path.
        path: String,
    },

    /// Non-recursive delete of a directory that has children.
    #[error("The directory is not empty. : '{path}'")]
    DirectoryNotEmpty {
        /// The non-empty directory.
        path: String,
    },

    // Access errors
    /// Access to the entry is denied.
    #[error("Access to the path '{path}' is denied.")]
    UnauthorizedAccess {
        /// The protected path.
        path: String,
    },

    /// Generic access failure without a path (watcher termination).
    #[error("Access is denied.")]
    AccessDenied,

    /// The file is held open.
    #[error("The process cannot access the file '{path}' because it is being used by another process.")]
    FileInUse {
        /// The file in use.
        path: String,
    },

    /// The entry is in use, no path reported.
    #[error("The process cannot access the file because it is being used by another process.")]
    InUse,

    // Operation-specific I/O errors
    /// The path refers to a file where a directory was expected.
    #[error("The directory name is invalid. : '{path}'")]
    InvalidDirectoryName {
        /// The offending path.
        path: String,
    },

    /// Directory move onto itself.
    #[error("Source and destination path must be different.")]
    SameSourceAndDestination,

    /// Directory move between volumes.
    #[error("Source and destination path must have identical roots. Move will not work across volumes.")]
    CrossVolumeMove,

    /// Copy target is a directory.
    #[error("The target file '{path}' is a directory, not a file.")]
    TargetIsDirectory {
        /// The directory path.
        path: String,
    },

    /// Replace across volumes.
    #[error("Unable to move the replacement file to the file to be replaced.")]
    UnableToMoveReplacement,

    /// The volume has no room for the requested growth.
    #[error("There is not enough space on the disk. : '{path}'")]
    NotEnoughSpace {
        /// The file being grown.
        path: String,
    },

    // Argument errors
    /// Timestamps cannot be applied to a volume root.
    #[error("Path must not be a drive.")]
    PathIsDrive {
        /// The volume root path.
        path: String,
    },

    /// Timestamp before the Win32 epoch.
    #[error("Not a valid Win32 FileTime.")]
    InvalidFileTime,

    /// Other invalid arguments.
    #[error("{message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    // Feature errors
    /// The volume format does not support encryption.
    #[error("File encryption support only works on NTFS partition.")]
    EncryptionNotSupported {
        /// The path on the unsupported volume.
        path: String,
    },

    /// Stream opened without read access.
    #[error("Stream does not support reading.")]
    StreamNotReadable,

    /// Stream opened without write access.
    #[error("Stream does not support writing.")]
    StreamNotWritable,

    // Watcher errors
    /// The watcher could not keep up and dropped notifications.
    #[error("Too many changes at once in directory:{path}.")]
    BufferOverflow {
        /// The watched directory.
        path: String,
    },

    /// The watcher path is not an existing directory.
    #[error("The directory name '{path}' is invalid.")]
    WatcherPathInvalid {
        /// The rejected path.
        path: String,
    },

    /// The watched directory vanished before the watcher started.
    #[error("Error reading the {path} directory.")]
    WatchedDirectoryMissing {
        /// The watched directory.
        path: String,
    },

    // Lifetime errors
    /// The object was disposed.
    #[error("Cannot access a disposed object.\nObject name: '{object_name}'.")]
    Disposed {
        /// Type name of the disposed object.
        object_name: &'static str,
    },

    /// The stream was closed.
    #[error("Cannot access a closed file.")]
    StreamClosed,

    // Data errors
    /// File content is not what the caller expected (e.g. invalid UTF-8).
    #[error("invalid data: {path} ({details})")]
    InvalidData {
        /// The file with invalid data.
        path: String,
        /// Details about the invalid data.
        details: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Other I/O failure.
    #[error("{message}")]
    Io {
        /// Description of the failure.
        message: String,
    },
}

impl FsError {
    /// Returns the broad classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            FsError::FileNotFound { .. }
            | FsError::DirectoryNotFound { .. }
            | FsError::NetworkPathNotFound { .. }
            | FsError::WatchedDirectoryMissing { .. } => ErrorKind::NotFound,

            FsError::FileAlreadyExists { .. }
            | FsError::CannotCreateExisting { .. }
            | FsError::CannotCreateFileExists { .. } => ErrorKind::AlreadyExists,

            FsError::UnauthorizedAccess { .. } | FsError::AccessDenied => ErrorKind::AccessDenied,

            FsError::FileInUse { .. } | FsError::InUse => ErrorKind::InUse,

            FsError::EmptyPath
            | FsError::IllegalPathForm
            | FsError::IllegalCharacters { .. }
            | FsError::InvalidUncPath { .. }
            | FsError::InvalidPath { .. }
            | FsError::PathIsDrive { .. }
            | FsError::InvalidFileTime
            | FsError::InvalidArgument { .. }
            | FsError::WatcherPathInvalid { .. } => ErrorKind::InvalidArgument,

            FsError::UnsupportedPathFormat { .. }
            | FsError::UnsupportedNamespace { .. }
            | FsError::ReservedName { .. }
            | FsError::EncryptionNotSupported { .. }
            | FsError::StreamNotReadable
            | FsError::StreamNotWritable => ErrorKind::NotSupported,

            FsError::BufferOverflow { .. } => ErrorKind::Overflow,

            FsError::Disposed { .. } | FsError::StreamClosed => ErrorKind::Disposed,

            FsError::DirectoryNotEmpty { .. } => ErrorKind::DirectoryNotEmpty,

            FsError::InvalidDirectoryName { .. }
            | FsError::SameSourceAndDestination
            | FsError::CrossVolumeMove
            | FsError::TargetIsDirectory { .. }
            | FsError::UnableToMoveReplacement
            | FsError::NotEnoughSpace { .. }
            | FsError::InvalidData { .. }
            | FsError::Serialization(_)
            | FsError::Deserialization(_)
            | FsError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Shorthand for [`FsError::InvalidArgument`].
    pub(crate) fn invalid_argument(message: impl fmt::Display) -> Self {
        FsError::InvalidArgument {
            message: message.to_string(),
        }
    }
}

impl From<FsError> for std::io::Error {
    fn from(error: FsError) -> Self {
        let kind = match error.kind() {
            ErrorKind::NotFound => std::io::ErrorKind::NotFound,
            ErrorKind::AlreadyExists => std::io::ErrorKind::AlreadyExists,
            ErrorKind::AccessDenied => std::io::ErrorKind::PermissionDenied,
            ErrorKind::InvalidArgument => std::io::ErrorKind::InvalidInput,
            ErrorKind::NotSupported => std::io::ErrorKind::Unsupported,
            _ => std::io::ErrorKind::Other,
        };
        std::io::Error::new(kind, error)
    }
}

impl From<std::io::Error> for FsError {
    fn from(error: std::io::Error) -> Self {
        // Errors raised by our own streams travel through `io::Error` intact
        let kind = error.kind();
        match error.into_inner() {
            Some(inner) => match inner.downcast::<FsError>() {
                Ok(fs_error) => *fs_error,
                Err(other) => FsError::Io {
                    message: other.to_string(),
                },
            },
            None => match kind {
                std::io::ErrorKind::InvalidInput => FsError::invalid_argument(kind),
                _ => FsError::Io {
                    message: kind.to_string(),
                },
            },
        }
    }
}

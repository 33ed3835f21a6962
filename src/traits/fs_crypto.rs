//! Content encryption.

use crate::FsError;

/// Encrypt and decrypt entries on volumes that support it.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn FsCrypto`.
pub trait FsCrypto: Send + Sync {
    /// Encrypt a file or directory.
    ///
    /// # Errors
    ///
    /// - [`FsError::EncryptionNotSupported`] unless the volume is NTFS
    /// - [`FsError::FileInUse`] if the file is open
    /// - [`FsError::UnauthorizedAccess`] if read-only or encrypted by another account
    fn encrypt(&self, path: &str) -> Result<(), FsError>;

    /// Decrypt a file or directory.
    ///
    /// Also clears encryption applied by another account, which unlocks the
    /// entry for attribute and time changes.
    ///
    /// # Errors
    ///
    /// - [`FsError::EncryptionNotSupported`] unless the volume is NTFS
    /// - [`FsError::FileInUse`] if the file is open
    /// - [`FsError::UnauthorizedAccess`] if read-only
    fn decrypt(&self, path: &str) -> Result<(), FsError>;
}

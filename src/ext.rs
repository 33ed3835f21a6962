//! # Extension Traits
//!
//! Whole-file convenience methods built on [`FsFile::open`].
//!
//! ## Available Methods
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`read_all_bytes`](FsExt::read_all_bytes) | Read a whole file |
//! | [`read_all_text`](FsExt::read_all_text) | Read a whole file as UTF-8 |
//! | [`write_all_bytes`](FsExt::write_all_bytes) | Create or truncate, then write |
//! | [`write_all_text`](FsExt::write_all_text) | Same, from a string |
//! | [`append_all_bytes`](FsExt::append_all_bytes) | Append, creating the file if missing |
//!
//! ## JSON Support (Feature-Gated)
//!
//! With the `serde` feature enabled, [`FsExtJson`] adds `read_json` and
//! `write_json`.
//!
//! ```toml
//! [dependencies]
//! anyfs-fakes = { version = "0.1", features = ["serde"] }
//! ```

use std::io::{Read, Write};

use crate::{FileAccess, FileMode, FsError, FsFile};

/// Extension methods for any [`FsFile`] implementation.
///
/// Every method opens a stream, does its work and closes the stream before
/// returning, so change notifications are published by the time the call
/// completes.
///
/// # Example
///
/// ```rust
/// use anyfs_fakes::{FakeFileSystem, FsError, FsExt, FsFile};
///
/// fn bump<F: FsFile>(fs: &F, path: &str) -> Result<u32, FsError> {
///     let count: u32 = fs.read_all_text(path)?.trim().parse().unwrap_or(0);
///     fs.write_all_text(path, &(count + 1).to_string())?;
///     Ok(count + 1)
/// }
///
/// let fs = FakeFileSystem::new();
/// fs.write_all_text(r"C:\count.txt", "41").unwrap();
/// assert_eq!(bump(&fs, r"C:\count.txt").unwrap(), 42);
/// ```
pub trait FsExt: FsFile {
    /// Read the whole file.
    ///
    /// # Errors
    ///
    /// - [`FsError::FileNotFound`] if the file doesn't exist
    /// - [`FsError::FileInUse`] if it is open for writing
    fn read_all_bytes(&self, path: &str) -> Result<Vec<u8>, FsError> {
        let mut stream = self.open(path, FileMode::Open, FileAccess::Read)?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data)?;
        stream.close()?;
        Ok(data)
    }

    /// Read the whole file as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidData`] if the content isn't valid UTF-8
    /// - Same as [`read_all_bytes`](Self::read_all_bytes)
    fn read_all_text(&self, path: &str) -> Result<String, FsError> {
        let data = self.read_all_bytes(path)?;
        String::from_utf8(data).map_err(|e| FsError::InvalidData {
            path: path.into(),
            details: e.to_string(),
        })
    }

    /// Create or truncate the file and write `data`.
    ///
    /// # Errors
    ///
    /// - [`FsError::DirectoryNotFound`] if the parent directory doesn't exist
    /// - [`FsError::UnauthorizedAccess`] for read-only or hidden files
    /// - [`FsError::NotEnoughSpace`] if the volume is full
    fn write_all_bytes(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let mut stream = self.open(path, FileMode::Create, FileAccess::Write)?;
        stream.write_all(data)?;
        stream.close()
    }

    /// Create or truncate the file and write `text`.
    ///
    /// # Errors
    ///
    /// Same as [`write_all_bytes`](Self::write_all_bytes).
    fn write_all_text(&self, path: &str, text: &str) -> Result<(), FsError> {
        self.write_all_bytes(path, text.as_bytes())
    }

    /// Append `data`, creating the file if missing.
    ///
    /// # Errors
    ///
    /// Same as [`write_all_bytes`](Self::write_all_bytes).
    fn append_all_bytes(&self, path: &str, data: &[u8]) -> Result<(), FsError> {
        let mut stream = self.open(path, FileMode::Append, FileAccess::Write)?;
        stream.write_all(data)?;
        stream.close()
    }
}

// Blanket implementation - any FsFile gets FsExt for free
impl<F: FsFile + ?Sized> FsExt for F {}

// =============================================================================
// JSON Support (Feature-Gated)
// =============================================================================

#[cfg(feature = "serde")]
mod json {
    use super::*;
    use serde::{de::DeserializeOwned, Serialize};

    /// JSON serialization extension methods.
    ///
    /// Available when the `serde` feature is enabled.
    pub trait FsExtJson: FsFile {
        /// Read a file and deserialize it as JSON.
        ///
        /// # Errors
        ///
        /// - [`FsError::FileNotFound`] if the file doesn't exist
        /// - [`FsError::InvalidData`] if the file isn't valid UTF-8
        /// - [`FsError::Deserialization`] if JSON parsing failed
        ///
        /// # Example
        ///
        /// ```rust
        /// # #[cfg(feature = "serde")]
        /// # {
        /// use anyfs_fakes::{FakeFileSystem, FsExt, FsExtJson};
        ///
        /// let fs = FakeFileSystem::new();
        /// fs.write_all_text(r"C:\config.json", r#"{"retries": 3}"#).unwrap();
        /// let value: serde_json::Value = fs.read_json(r"C:\config.json").unwrap();
        /// assert_eq!(value["retries"], 3);
        /// # }
        /// ```
        fn read_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, FsError> {
            let data = self.read_all_text(path)?;
            serde_json::from_str(&data).map_err(|e| FsError::Deserialization(e.to_string()))
        }

        /// Serialize a value and write it as pretty-printed JSON.
        ///
        /// # Errors
        ///
        /// - [`FsError::Serialization`] if JSON serialization failed
        /// - Same as [`FsExt::write_all_bytes`]
        fn write_json<T: Serialize>(&self, path: &str, value: &T) -> Result<(), FsError> {
            let json = serde_json::to_string_pretty(value)
                .map_err(|e| FsError::Serialization(e.to_string()))?;
            self.write_all_bytes(path, json.as_bytes())
        }
    }

    // Blanket implementation
    impl<F: FsFile + ?Sized> FsExtJson for F {}
}

#[cfg(feature = "serde")]
pub use json::FsExtJson;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, FakeFileSystem, FsEntry, FsFile};

    #[test]
    fn read_all_bytes_returns_content() {
        let fs = FakeFileSystem::new();
        fs.seed_file(r"C:\data.bin", [1u8, 2, 3]).unwrap();
        assert_eq!(fs.read_all_bytes(r"C:\data.bin").unwrap(), [1, 2, 3]);
    }

    #[test]
    fn read_all_bytes_errors_on_missing() {
        let fs = FakeFileSystem::new();
        let result = fs.read_all_bytes(r"C:\missing.bin");
        assert!(matches!(result, Err(FsError::FileNotFound { .. })));
    }

    #[test]
    fn read_all_text_rejects_invalid_utf8() {
        let fs = FakeFileSystem::new();
        fs.seed_file(r"C:\bad.txt", [0xffu8, 0xfe]).unwrap();
        let err = fs.read_all_text(r"C:\bad.txt").unwrap_err();
        assert!(matches!(err, FsError::InvalidData { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn write_all_text_truncates_existing_content() {
        let fs = FakeFileSystem::new();
        fs.write_all_text(r"C:\note.txt", "a longer first draft").unwrap();
        fs.write_all_text(r"C:\note.txt", "short").unwrap();
        assert_eq!(fs.read_all_text(r"C:\note.txt").unwrap(), "short");
        assert_eq!(fs.metadata(r"C:\note.txt").unwrap().size, 5);
    }

    #[test]
    fn append_all_bytes_creates_then_appends() {
        let fs = FakeFileSystem::new();
        fs.append_all_bytes(r"C:\log.txt", b"one\n").unwrap();
        fs.append_all_bytes(r"C:\log.txt", b"two\n").unwrap();
        assert_eq!(fs.read_all_text(r"C:\log.txt").unwrap(), "one\ntwo\n");
    }

    #[test]
    fn write_all_bytes_requires_parent_directory() {
        let fs = FakeFileSystem::new();
        let result = fs.write_all_bytes(r"C:\missing\file.txt", b"x");
        assert!(matches!(result, Err(FsError::DirectoryNotFound { .. })));
    }

    #[test]
    fn fs_ext_available_on_dyn_fs_file() {
        let fs = FakeFileSystem::new();
        let file: &dyn FsFile = &fs;
        file.write_all_text(r"C:\dyn.txt", "ok").unwrap();
        assert_eq!(file.read_all_text(r"C:\dyn.txt").unwrap(), "ok");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_round_trips_through_the_file_system() {
        let fs = FakeFileSystem::new();
        let value = serde_json::json!({ "name": "fake", "volumes": ["C:", "D:"] });
        fs.write_json(r"C:\settings.json", &value).unwrap();
        let loaded: serde_json::Value = fs.read_json(r"C:\settings.json").unwrap();
        assert_eq!(loaded, value);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn read_json_reports_deserialization_errors() {
        let fs = FakeFileSystem::new();
        fs.write_all_text(r"C:\broken.json", "{ not json").unwrap();
        let result: Result<serde_json::Value, _> = fs.read_json(r"C:\broken.json");
        assert!(matches!(result, Err(FsError::Deserialization(_))));
    }
}

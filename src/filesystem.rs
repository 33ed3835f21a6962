//! The in-memory filesystem and its trait implementations.

use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::clock::{Clock, SystemClock};
use crate::handlers::{
    CopyFile, DeleteDirectory, DirectoryCreateHandler, DirectoryDeleteHandler,
    DirectoryMoveHandler, EntryCryptoHandler, EntrySetAttributesHandler, EntrySetTimeHandler,
    FileCopyHandler, FileDeleteHandler, FileMoveHandler, FileOpenHandler, FileReplaceHandler,
    HandlerContext, MoveDirectory, MoveFile, OpenFile, OperationHandler, ReplaceFile,
    SetAttributes, SetEncryption, SetTime,
};
use crate::path::{parse_relative_to, SearchPattern};
use crate::resolve::{walk_directory, EntryResolver, ResolveFailure};
use crate::stream::FakeFileStream;
use crate::tree::{EncryptionState, EntryTree};
use crate::watcher::{ChangeTracker, FakeFileSystemWatcher, FileAccessKinds, WatcherConfig};
use crate::{
    win32_epoch, AbsolutePath, DriveInfo, EntryKind, EntryMetadata, EnumerationKind,
    FakeFileSystemOptions, FileAccess, FileAttributes, FileMode, FileStream, FsCrypto,
    FsDirectory, FsEntry, FsError, FsFile, FsWatch, FsWatcher, SearchOption, TimeKind,
    VolumeInfo,
};

const TARGET: &str = "anyfs_fakes::filesystem";

struct FileSystemState {
    tree: EntryTree,
    current_directory: AbsolutePath,
}

/// State shared by the filesystem, its streams and its watchers.
pub(crate) struct Shared {
    state: Mutex<FileSystemState>,
    pub(crate) tracker: ChangeTracker,
    clock: Arc<dyn Clock>,
}

impl Shared {
    /// Parse `text`, resolving relative forms against the current directory.
    pub(crate) fn absolute_path(&self, text: &str) -> Result<AbsolutePath, FsError> {
        let current = self.state.lock().current_directory.clone();
        parse_relative_to(text, &current)
    }

    pub(crate) fn directory_exists(&self, path: &AbsolutePath) -> bool {
        self.state
            .lock()
            .tree
            .try_get_existing_directory(path)
            .is_some()
    }

    /// Run `op` with the tree locked.
    pub(crate) fn with_tree<T>(
        &self,
        op: impl FnOnce(&mut EntryTree, &ChangeTracker, SystemTime) -> T,
    ) -> T {
        let now = self.clock.now();
        let mut state = self.state.lock();
        op(&mut state.tree, &self.tracker, now)
    }

    fn run<H: OperationHandler>(
        &self,
        handler: H,
        arguments: H::Arguments,
    ) -> Result<H::Output, FsError> {
        let now = self.clock.now();
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut ctx = HandlerContext {
            tree: &mut state.tree,
            current_directory: &state.current_directory,
            tracker: &self.tracker,
            now,
        };
        handler.handle(&mut ctx, arguments)
    }

    fn query<T>(&self, op: impl FnOnce(&EntryTree, &AbsolutePath) -> T) -> T {
        let state = self.state.lock();
        op(&state.tree, &state.current_directory)
    }
}

/// An in-memory, Windows-style filesystem.
///
/// Cloning is cheap and yields another handle to the same filesystem. All
/// operations are serialized on one internal lock; watchers are notified
/// asynchronously.
///
/// # Examples
///
/// ```rust
/// use anyfs_fakes::{FakeFileSystem, FsDirectory, FsEntry, FsExt, FsFile};
///
/// let fs = FakeFileSystem::new();
/// fs.create_directory(r"C:\Docs").unwrap();
/// fs.write_all_text(r"c:\docs\Notes.txt", "hello").unwrap();
///
/// assert!(fs.file_exists(r"C:\DOCS\NOTES.TXT"));
/// let meta = fs.metadata(r"C:\docs\notes.txt").unwrap();
/// assert_eq!(meta.full_name, r"C:\Docs\Notes.txt");
/// assert_eq!(meta.size, 5);
/// ```
#[derive(Clone)]
pub struct FakeFileSystem {
    shared: Arc<Shared>,
}

impl FakeFileSystem {
    /// A filesystem with the default options and the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// A filesystem built from `options`.
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if a volume name is not a drive or share root
    /// - [`FsError::CannotCreateExisting`] for duplicate volume names
    /// - [`FsError::DirectoryNotFound`] if the current directory does not exist
    pub fn with_options(options: FakeFileSystemOptions) -> Result<Self, FsError> {
        Self::with_options_and_clock(options, Arc::new(SystemClock))
    }

    /// The default filesystem (a single `C:` drive) with an injected clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let mut tree = EntryTree::new();
        // Mounting into an empty tree cannot collide
        let _ = tree.add_volume("C:", VolumeInfo::default(), clock.now());
        let current_directory = AbsolutePath::from_parts(vec!["C:".into()], false);
        Self::from_parts(tree, current_directory, clock)
    }

    /// A filesystem built from `options` with an injected clock.
    ///
    /// # Errors
    ///
    /// Same as [`with_options`](Self::with_options).
    pub fn with_options_and_clock(
        options: FakeFileSystemOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, FsError> {
        let now = clock.now();
        let mut tree = EntryTree::new();
        for volume in &options.volumes {
            let name = volume_name(&volume.name)?;
            tree.add_volume(&name, volume.info.clone(), now)?;
        }
        let current_directory = crate::path::parse(&options.current_directory)?;
        if tree.try_get_existing_directory(&current_directory).is_none() {
            return Err(FsError::DirectoryNotFound {
                path: current_directory.get_text(),
            });
        }
        Ok(Self::from_parts(tree, current_directory, clock))
    }

    fn from_parts(tree: EntryTree, current_directory: AbsolutePath, clock: Arc<dyn Clock>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(FileSystemState {
                    tree,
                    current_directory,
                }),
                tracker: ChangeTracker::new(),
                clock,
            }),
        }
    }

    /// Mount another volume.
    ///
    /// `name` is a drive (`D:`) or share (`\\server\share`).
    ///
    /// # Errors
    ///
    /// - [`FsError::InvalidPath`] if `name` is not a drive or share root
    /// - [`FsError::CannotCreateExisting`] if the volume already exists
    pub fn add_volume(&self, name: &str, info: VolumeInfo) -> Result<(), FsError> {
        let name = volume_name(name)?;
        self.shared.with_tree(|tree, _, now| {
            tree.add_volume(&name, info, now).map(|_| ())
        })?;
        tracing::debug!(target: TARGET, volume = %name, "volume added");
        Ok(())
    }

    /// Create a file with `contents`, creating missing directories.
    ///
    /// Intended for test setup: raises change notifications but skips
    /// attribute and sharing checks on an existing file.
    ///
    /// # Errors
    ///
    /// - Path syntax errors
    /// - [`FsError::DirectoryNotFound`] if the volume does not exist
    /// - [`FsError::UnauthorizedAccess`] if `path` names a directory
    /// - [`FsError::NotEnoughSpace`] if the volume cannot hold `contents`
    pub fn seed_file(&self, path: &str, contents: impl AsRef<[u8]>) -> Result<(), FsError> {
        let path = self.shared.absolute_path(path)?;
        let contents = contents.as_ref();
        self.shared.with_tree(|tree, tracker, now| {
            let (id, created) = tree.get_or_create_file(&path, true, now)?;
            tree.resize_content(id, contents.len() as u64)?;
            if let Some(file) = tree.node_mut(id).as_file_mut() {
                file.content.copy_from_slice(contents);
            }
            let node = tree.node_mut(id);
            node.times.last_write = now;
            node.times.last_access = now;
            let access = if created {
                FileAccessKinds::CREATE | FileAccessKinds::WRITE
            } else {
                FileAccessKinds::WRITE | FileAccessKinds::RESIZE
            };
            tracker.record_change(tree.path_of(id), EntryKind::File, access);
            Ok(())
        })
    }

    /// Mark an entry as encrypted by another user account.
    ///
    /// Such entries reject attribute, timestamp and encryption changes and
    /// cannot be opened.
    ///
    /// # Errors
    ///
    /// - [`FsError::FileNotFound`] / [`FsError::DirectoryNotFound`] if missing
    pub fn mark_externally_encrypted(&self, path: &str) -> Result<(), FsError> {
        let path = self.shared.absolute_path(path)?;
        self.shared.with_tree(|tree, _, _| {
            let (id, _) = EntryResolver::new(tree)
                .resolve_entry(&path)
                .map_err(|failure| failure.into_error(&path))?;
            tree.node_mut(id).encryption = EncryptionState::ExternallyEncrypted;
            Ok(())
        })
    }

    /// Create a watcher with a concrete type.
    ///
    /// # Errors
    ///
    /// Same as [`FsWatch::create_watcher`].
    pub fn watch(&self, config: WatcherConfig) -> Result<FakeFileSystemWatcher, FsError> {
        FakeFileSystemWatcher::spawn(Arc::clone(&self.shared), config)
    }

    fn absolute(&self, path: &str) -> Result<AbsolutePath, FsError> {
        self.shared.absolute_path(path)
    }
}

impl Default for FakeFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        let volumes: Vec<String> = state
            .tree
            .volumes()
            .map(|root| state.tree.path_of(root).get_text())
            .collect();
        f.debug_struct("FakeFileSystem")
            .field("volumes", &volumes)
            .field("current_directory", &state.current_directory.get_text())
            .finish()
    }
}

/// Normalize a volume name through the path parser.
fn volume_name(name: &str) -> Result<String, FsError> {
    let path = crate::path::parse(name)?;
    if !path.is_volume_root() {
        return Err(FsError::InvalidPath { path: name.into() });
    }
    Ok(path.volume_name().to_string())
}

// ============================================================================
// Trait implementations
// ============================================================================

impl FsFile for FakeFileSystem {
    fn open(
        &self,
        path: &str,
        mode: FileMode,
        access: FileAccess,
    ) -> Result<Box<dyn FileStream>, FsError> {
        let path = self.absolute(path)?;
        let core = self
            .shared
            .run(FileOpenHandler, OpenFile { path, mode, access })?;
        Ok(Box::new(FakeFileStream::new(Arc::clone(&self.shared), core)))
    }

    fn file_exists(&self, path: &str) -> bool {
        let Ok(path) = self.absolute(path) else {
            return false;
        };
        self.shared
            .query(|tree, _| tree.try_get_existing_file(&path).is_some())
    }

    fn delete_file(&self, path: &str) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared.run(FileDeleteHandler, path)
    }

    fn move_file(&self, source: &str, destination: &str) -> Result<(), FsError> {
        let arguments = MoveFile {
            source: self.absolute(source)?,
            destination: self.absolute(destination)?,
        };
        self.shared.run(FileMoveHandler, arguments)
    }

    fn copy_file(&self, source: &str, destination: &str, overwrite: bool) -> Result<(), FsError> {
        let arguments = CopyFile {
            source: self.absolute(source)?,
            destination: self.absolute(destination)?,
            overwrite,
        };
        self.shared.run(FileCopyHandler, arguments)
    }

    fn replace_file(
        &self,
        source: &str,
        destination: &str,
        backup: Option<&str>,
    ) -> Result<(), FsError> {
        let arguments = ReplaceFile {
            source: self.absolute(source)?,
            destination: self.absolute(destination)?,
            backup: backup.map(|path| self.absolute(path)).transpose()?,
        };
        self.shared.run(FileReplaceHandler, arguments)
    }
}

impl FsDirectory for FakeFileSystem {
    fn create_directory(&self, path: &str) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared.run(DirectoryCreateHandler, path)
    }

    fn delete_directory(&self, path: &str, recursive: bool) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared
            .run(DirectoryDeleteHandler, DeleteDirectory { path, recursive })
    }

    fn move_directory(&self, source: &str, destination: &str) -> Result<(), FsError> {
        let arguments = MoveDirectory {
            source: self.absolute(source)?,
            destination: self.absolute(destination)?,
        };
        self.shared.run(DirectoryMoveHandler, arguments)
    }

    fn directory_exists(&self, path: &str) -> bool {
        self.absolute(path)
            .is_ok_and(|path| self.shared.directory_exists(&path))
    }

    fn enumerate(
        &self,
        path: &str,
        pattern: &str,
        option: SearchOption,
        kind: EnumerationKind,
    ) -> Result<Vec<String>, FsError> {
        let path = self.absolute(path)?;
        let pattern = SearchPattern::parse(pattern)?;
        self.shared.query(|tree, _| {
            let directory = walk_directory(tree, &path).map_err(|failure| match failure {
                ResolveFailure::LastDirectoryFoundAsFile => FsError::InvalidDirectoryName {
                    path: path.get_text(),
                },
                other => other.into_error(&path),
            })?;
            Ok(tree.enumerate(directory, &path, &pattern, option, kind))
        })
    }

    fn current_directory(&self) -> String {
        self.shared
            .query(|_, current| current.get_text())
    }

    fn set_current_directory(&self, path: &str) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        let mut state = self.shared.state.lock();
        if state.tree.try_get_existing_directory(&path).is_none() {
            return Err(FsError::DirectoryNotFound {
                path: path.get_text(),
            });
        }
        tracing::debug!(target: TARGET, path = %path, "current directory changed");
        state.current_directory = path;
        Ok(())
    }
}

impl FsEntry for FakeFileSystem {
    fn exists(&self, path: &str) -> bool {
        let Ok(path) = self.absolute(path) else {
            return false;
        };
        self.shared
            .query(|tree, _| EntryResolver::new(tree).resolve_entry(&path).is_ok())
    }

    fn metadata(&self, path: &str) -> Result<EntryMetadata, FsError> {
        let path = self.absolute(path)?;
        self.shared.query(|tree, _| {
            EntryResolver::new(tree)
                .resolve_entry(&path)
                .map(|(id, _)| tree.metadata(id))
                .map_err(|failure| failure.into_error(&path))
        })
    }

    fn set_attributes(&self, path: &str, attributes: FileAttributes) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared
            .run(EntrySetAttributesHandler, SetAttributes { path, attributes })
    }

    fn time(&self, path: &str, kind: TimeKind) -> Result<SystemTime, FsError> {
        let path = self.absolute(path)?;
        Ok(self.shared.query(|tree, _| {
            EntryResolver::new(tree)
                .resolve_entry(&path)
                .map_or_else(|_| win32_epoch(), |(id, _)| tree.node(id).times.get(kind))
        }))
    }

    fn set_time(&self, path: &str, kind: TimeKind, value: SystemTime) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared
            .run(EntrySetTimeHandler, SetTime { path, kind, value })
    }

    fn drives(&self) -> Vec<DriveInfo> {
        self.shared.query(|tree, _| {
            tree.volumes()
                .filter_map(|root| {
                    let info = tree.volume_info(root)?.clone();
                    Some(DriveInfo {
                        name: tree.path_of(root).get_text(),
                        info,
                    })
                })
                .collect()
        })
    }
}

impl FsCrypto for FakeFileSystem {
    fn encrypt(&self, path: &str) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared.run(
            EntryCryptoHandler,
            SetEncryption {
                path,
                encrypt: true,
            },
        )
    }

    fn decrypt(&self, path: &str) -> Result<(), FsError> {
        let path = self.absolute(path)?;
        self.shared.run(
            EntryCryptoHandler,
            SetEncryption {
                path,
                encrypt: false,
            },
        )
    }
}

impl FsWatch for FakeFileSystem {
    fn create_watcher(&self, config: WatcherConfig) -> Result<Box<dyn FsWatcher>, FsError> {
        Ok(Box::new(self.watch(config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::{ErrorKind, FsExt, VolumeSpec};
    use std::io::{Read, Seek, SeekFrom, Write};
    use std::time::Duration;

    #[test]
    fn relative_paths_resolve_against_current_directory() {
        let fs = FakeFileSystem::new();
        fs.create_directory(r"C:\work\sub").unwrap();
        fs.set_current_directory(r"C:\work").unwrap();
        assert_eq!(fs.current_directory(), r"C:\work");
        fs.write_all_text(r"sub\a.txt", "x").unwrap();
        assert!(fs.file_exists(r"C:\work\sub\a.txt"));
        assert!(fs.directory_exists(r"\work"));
        assert!(fs.set_current_directory(r"C:\missing").is_err());
    }

    #[test]
    fn options_mount_volumes_and_validate_current_directory() {
        let mut options = FakeFileSystemOptions::default();
        options
            .volumes
            .push(VolumeSpec::network_share(r"\\server\share"));
        options.volumes.push(VolumeSpec::new("d:", VolumeInfo::ntfs(10)));
        options.current_directory = r"D:\".into();
        let fs = FakeFileSystem::with_options(options.clone()).unwrap();
        let names: Vec<String> = fs.drives().into_iter().map(|d| d.name).collect();
        assert_eq!(names, [r"\\server\share", r"C:\", r"D:\"]);
        assert_eq!(fs.current_directory(), r"D:\");

        options.current_directory = r"D:\nowhere".into();
        assert!(matches!(
            FakeFileSystem::with_options(options),
            Err(FsError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn add_volume_rejects_paths_and_duplicates() {
        let fs = FakeFileSystem::new();
        fs.add_volume("E:", VolumeInfo::default()).unwrap();
        assert!(matches!(
            fs.add_volume(r"E:\sub", VolumeInfo::default()),
            Err(FsError::InvalidPath { .. })
        ));
        assert_eq!(
            fs.add_volume("e:", VolumeInfo::default()).unwrap_err().kind(),
            ErrorKind::AlreadyExists
        );
    }

    #[test]
    fn stream_round_trip_and_zero_fill() {
        let fs = FakeFileSystem::new();
        let mut stream = fs
            .open(r"C:\data.bin", FileMode::Create, FileAccess::ReadWrite)
            .unwrap();
        stream.write_all(b"abc").unwrap();
        stream.seek(SeekFrom::Start(5)).unwrap();
        stream.write_all(b"z").unwrap();
        stream.seek(SeekFrom::Start(0)).unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        assert_eq!(buf, b"abc\0\0z");
        stream.close().unwrap();
        assert_eq!(fs.metadata(r"C:\data.bin").unwrap().size, 6);
    }

    #[test]
    fn closed_stream_rejects_use() {
        let fs = FakeFileSystem::new();
        let mut stream = fs
            .open(r"C:\x.txt", FileMode::Create, FileAccess::Write)
            .unwrap();
        stream.close().unwrap();
        stream.close().unwrap();
        let err = FsError::from(stream.write(b"late").unwrap_err());
        assert_eq!(err, FsError::StreamClosed);
        assert_eq!(err.to_string(), "Cannot access a closed file.");
        assert!(!stream.can_write());
    }

    #[test]
    fn dropping_a_stream_releases_the_file() {
        let fs = FakeFileSystem::new();
        {
            let _stream = fs
                .open(r"C:\x.txt", FileMode::Create, FileAccess::Write)
                .unwrap();
            assert_eq!(fs.delete_file(r"C:\x.txt").unwrap_err().kind(), ErrorKind::InUse);
        }
        fs.delete_file(r"C:\x.txt").unwrap();
    }

    #[test]
    fn times_use_injected_clock_and_default_to_epoch() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(86_400);
        let clock = Arc::new(ManualClock::new(start));
        let fs = FakeFileSystem::with_clock(clock.clone());
        fs.seed_file(r"C:\a.txt", "a").unwrap();
        assert_eq!(fs.time(r"C:\a.txt", TimeKind::Creation).unwrap(), start);

        clock.advance(Duration::from_secs(10));
        fs.write_all_text(r"C:\a.txt", "b").unwrap();
        assert_eq!(
            fs.time(r"C:\a.txt", TimeKind::LastWrite).unwrap(),
            start + Duration::from_secs(10)
        );
        assert_eq!(fs.time(r"C:\a.txt", TimeKind::Creation).unwrap(), start);
        assert_eq!(
            fs.time(r"C:\missing.txt", TimeKind::LastAccess).unwrap(),
            win32_epoch()
        );
    }

    #[test]
    fn enumerate_validates_directory_and_pattern() {
        let fs = FakeFileSystem::new();
        fs.seed_file(r"C:\dir\file.txt", "").unwrap();
        assert!(matches!(
            fs.enumerate(r"C:\dir\file.txt", "*", SearchOption::TopDirectoryOnly, EnumerationKind::All),
            Err(FsError::InvalidDirectoryName { .. })
        ));
        assert_eq!(
            fs.enumerate(r"C:\dir", r"..\*", SearchOption::TopDirectoryOnly, EnumerationKind::All)
                .unwrap_err()
                .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            fs.enumerate(r"c:\DIR", "*.TXT", SearchOption::TopDirectoryOnly, EnumerationKind::Files)
                .unwrap(),
            [r"C:\DIR\file.txt"]
        );
    }

    #[test]
    fn externally_encrypted_file_cannot_be_opened() {
        let fs = FakeFileSystem::new();
        fs.seed_file(r"C:\theirs.txt", "x").unwrap();
        fs.mark_externally_encrypted(r"C:\theirs.txt").unwrap();
        assert_eq!(
            fs.open(r"C:\theirs.txt", FileMode::Open, FileAccess::Read)
                .unwrap_err()
                .kind(),
            ErrorKind::AccessDenied
        );
        assert!(fs
            .attributes(r"C:\theirs.txt")
            .unwrap()
            .contains(FileAttributes::ENCRYPTED));
    }

    #[test]
    fn clones_share_state() {
        let fs = FakeFileSystem::new();
        let other = fs.clone();
        other.create_directory(r"C:\shared").unwrap();
        assert!(fs.directory_exists(r"C:\shared"));
    }
}

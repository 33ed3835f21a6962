//! Byte streams over file content.
//!
//! [`StreamCore`] does the actual work against a borrowed [`EntryTree`], so
//! handlers that already hold the filesystem lock (copy, for one) can stream
//! content without re-entering it. [`FakeFileStream`] wraps a core for callers
//! and takes the lock per call.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::sync::Arc;
use std::time::SystemTime;

use crate::filesystem::Shared;
use crate::tree::{EntryTree, NodeId};
use crate::watcher::{ChangeTracker, FileAccessKinds};
use crate::{AbsolutePath, EntryKind, FileAccess, FileStream, FsError};

/// An open handle's position and accumulated change kinds.
#[derive(Debug)]
pub(crate) struct StreamCore {
    node: NodeId,
    path: AbsolutePath,
    access: FileAccess,
    position: u64,
    /// Set in append mode: data before this offset cannot be overwritten.
    append_floor: Option<u64>,
    pending: FileAccessKinds,
}

impl StreamCore {
    /// Register a handle on `node`. Sharing rules are checked by the caller.
    pub(crate) fn open(
        tree: &mut EntryTree,
        node: NodeId,
        path: AbsolutePath,
        access: FileAccess,
    ) -> Self {
        if let Some(file) = tree.node_mut(node).as_file_mut() {
            file.register_handle(access);
        }
        Self {
            node,
            path,
            access,
            position: 0,
            append_floor: None,
            pending: FileAccessKinds::NONE,
        }
    }

    pub(crate) fn path(&self) -> &AbsolutePath {
        &self.path
    }

    pub(crate) fn access(&self) -> FileAccess {
        self.access
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    /// Record a change made on the handle's behalf (truncation at open).
    pub(crate) fn mark(&mut self, kinds: FileAccessKinds) {
        self.pending |= kinds;
    }

    /// Position at the end and forbid writing before it.
    pub(crate) fn enter_append_mode(&mut self, tree: &EntryTree) -> Result<(), FsError> {
        let len = self.len(tree)?;
        self.position = len;
        self.append_floor = Some(len);
        Ok(())
    }

    pub(crate) fn len(&self, tree: &EntryTree) -> Result<u64, FsError> {
        tree.get(self.node)
            .map(|node| node.size())
            .ok_or(FsError::StreamClosed)
    }

    pub(crate) fn read(
        &mut self,
        tree: &mut EntryTree,
        buf: &mut [u8],
        now: SystemTime,
    ) -> Result<usize, FsError> {
        if !self.access.can_read() {
            return Err(FsError::StreamNotReadable);
        }
        let node = tree.get_mut(self.node).ok_or(FsError::StreamClosed)?;
        let content = node
            .as_file()
            .map(|file| file.content.as_slice())
            .unwrap_or_default();
        let start = usize::try_from(self.position)
            .unwrap_or(usize::MAX)
            .min(content.len());
        let count = buf.len().min(content.len() - start);
        buf[..count].copy_from_slice(&content[start..start + count]);
        self.position += count as u64;
        node.times.last_access = now;
        self.pending |= FileAccessKinds::READ;
        Ok(count)
    }

    pub(crate) fn write(
        &mut self,
        tree: &mut EntryTree,
        buf: &[u8],
        now: SystemTime,
    ) -> Result<usize, FsError> {
        if !self.access.can_write() {
            return Err(FsError::StreamNotWritable);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let end = self
            .position
            .checked_add(buf.len() as u64)
            .ok_or_else(|| FsError::NotEnoughSpace {
                path: self.path.get_text(),
            })?;
        if end > self.len(tree)? {
            tree.resize_content(self.node, end)?;
            self.pending |= FileAccessKinds::RESIZE;
        }

        let start = usize::try_from(self.position).map_err(|_| FsError::NotEnoughSpace {
            path: self.path.get_text(),
        })?;
        let node = tree.node_mut(self.node);
        if let Some(file) = node.as_file_mut() {
            file.content[start..start + buf.len()].copy_from_slice(buf);
        }
        node.times.last_write = now;
        node.times.last_access = now;
        self.position = end;
        self.pending |= FileAccessKinds::WRITE;
        Ok(buf.len())
    }

    pub(crate) fn seek(&mut self, tree: &EntryTree, pos: SeekFrom) -> Result<u64, FsError> {
        let target = match pos {
            SeekFrom::Start(offset) => i128::from(offset),
            SeekFrom::Current(delta) => i128::from(self.position) + i128::from(delta),
            SeekFrom::End(delta) => i128::from(self.len(tree)?) + i128::from(delta),
        };
        if target < 0 {
            return Err(FsError::invalid_argument(
                "An attempt was made to move the position before the beginning of the stream.",
            ));
        }
        let target = u64::try_from(target).map_err(FsError::invalid_argument)?;
        self.check_append_floor(target)?;
        self.position = target;
        Ok(target)
    }

    /// Truncate or zero-extend the content.
    pub(crate) fn set_len(
        &mut self,
        tree: &mut EntryTree,
        len: u64,
        now: SystemTime,
    ) -> Result<(), FsError> {
        if !self.access.can_write() {
            return Err(FsError::StreamNotWritable);
        }
        self.check_append_floor(len)?;
        if len != self.len(tree)? {
            tree.resize_content(self.node, len)?;
            let node = tree.node_mut(self.node);
            node.times.last_write = now;
            node.times.last_access = now;
            self.pending |= FileAccessKinds::RESIZE;
        }
        self.position = self.position.min(len);
        Ok(())
    }

    /// Release the handle and publish one record for everything it did.
    pub(crate) fn close(self, tree: &mut EntryTree, tracker: &ChangeTracker) {
        let Some(node) = tree.get_mut(self.node) else {
            return;
        };
        if let Some(file) = node.as_file_mut() {
            file.release_handle(self.access);
        }
        if !self.pending.is_empty() {
            tracker.record_change(tree.path_of(self.node), EntryKind::File, self.pending);
        }
    }

    fn check_append_floor(&self, offset: u64) -> Result<(), FsError> {
        match self.append_floor {
            Some(floor) if offset < floor => Err(FsError::Io {
                message: "Unable seek backward to overwrite data that previously existed in a file opened in Append mode.".into(),
            }),
            _ => Ok(()),
        }
    }
}

/// An open file on a [`FakeFileSystem`](crate::FakeFileSystem).
///
/// Implements [`Read`], [`Write`] and [`Seek`]; errors surface as
/// [`io::Error`] values wrapping the underlying [`FsError`], which converts
/// back losslessly with `FsError::from`. Writing past the end zero-fills the
/// gap. Closing (or dropping) the stream releases its share of the file and
/// publishes a single change notification for everything it did.
pub struct FakeFileStream {
    filesystem: Arc<Shared>,
    core: Option<StreamCore>,
}

impl FakeFileStream {
    pub(crate) fn new(filesystem: Arc<Shared>, core: StreamCore) -> Self {
        Self {
            filesystem,
            core: Some(core),
        }
    }

    fn with_core<T>(
        &mut self,
        op: impl FnOnce(&mut StreamCore, &mut EntryTree, SystemTime) -> Result<T, FsError>,
    ) -> Result<T, FsError> {
        let core = self.core.as_mut().ok_or(FsError::StreamClosed)?;
        self.filesystem
            .with_tree(|tree, _, now| op(core, tree, now))
    }
}

impl FileStream for FakeFileStream {
    fn name(&self) -> String {
        self.core
            .as_ref()
            .map(|core| core.path().get_text())
            .unwrap_or_default()
    }

    fn len(&self) -> Result<u64, FsError> {
        let core = self.core.as_ref().ok_or(FsError::StreamClosed)?;
        self.filesystem.with_tree(|tree, _, _| core.len(tree))
    }

    fn set_len(&mut self, len: u64) -> Result<(), FsError> {
        self.with_core(|core, tree, now| core.set_len(tree, len, now))
    }

    fn position(&self) -> Result<u64, FsError> {
        self.core
            .as_ref()
            .map(StreamCore::position)
            .ok_or(FsError::StreamClosed)
    }

    fn can_read(&self) -> bool {
        self.core.as_ref().is_some_and(|core| core.access().can_read())
    }

    fn can_write(&self) -> bool {
        self.core
            .as_ref()
            .is_some_and(|core| core.access().can_write())
    }

    fn close(&mut self) -> Result<(), FsError> {
        if let Some(core) = self.core.take() {
            self.filesystem
                .with_tree(|tree, tracker, _| core.close(tree, tracker));
        }
        Ok(())
    }
}

impl Read for FakeFileStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.with_core(|core, tree, now| core.read(tree, buf, now))?)
    }
}

impl Write for FakeFileStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.with_core(|core, tree, now| core.write(tree, buf, now))?)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.core.is_none() {
            return Err(FsError::StreamClosed.into());
        }
        Ok(())
    }
}

impl Seek for FakeFileStream {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.with_core(|core, tree, _| core.seek(tree, pos))?)
    }
}

impl Drop for FakeFileStream {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for FakeFileStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeFileStream")
            .field("core", &self.core)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VolumeInfo;

    fn now() -> SystemTime {
        SystemTime::UNIX_EPOCH
    }

    fn setup(capacity: u64) -> (EntryTree, NodeId, AbsolutePath) {
        let mut tree = EntryTree::new();
        tree.add_volume("C:", VolumeInfo::ntfs(capacity), now()).unwrap();
        let path = AbsolutePath::parse(r"C:\file.bin").unwrap();
        let (node, _) = tree.get_or_create_file(&path, false, now()).unwrap();
        (tree, node, path)
    }

    #[test]
    fn seek_past_end_then_write_zero_fills() {
        let (mut tree, node, path) = setup(1 << 20);
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::ReadWrite);
        core.write(&mut tree, b"abc", now()).unwrap();
        core.seek(&tree, SeekFrom::End(4)).unwrap();
        core.write(&mut tree, b"z", now()).unwrap();
        let content = &tree.node(node).as_file().unwrap().content;
        assert_eq!(content.len(), 8);
        assert_eq!(&content[3..7], &[0, 0, 0, 0]);
        assert_eq!(content[7], b'z');
    }

    #[test]
    fn seek_before_start_is_invalid() {
        let (mut tree, node, path) = setup(1 << 20);
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::Read);
        let err = core.seek(&tree, SeekFrom::Current(-1)).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::InvalidArgument);
    }

    #[test]
    fn read_and_write_respect_access() {
        let (mut tree, node, path) = setup(1 << 20);
        let mut reader = StreamCore::open(&mut tree, node, path.clone(), FileAccess::Read);
        assert_eq!(
            reader.write(&mut tree, b"x", now()),
            Err(FsError::StreamNotWritable)
        );
        reader.close(&mut tree, &ChangeTracker::new());
        let mut writer = StreamCore::open(&mut tree, node, path, FileAccess::Write);
        let mut buf = [0u8; 4];
        assert_eq!(
            writer.read(&mut tree, &mut buf, now()),
            Err(FsError::StreamNotReadable)
        );
    }

    #[test]
    fn set_len_truncates_and_extends() {
        let (mut tree, node, path) = setup(1 << 20);
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::ReadWrite);
        core.write(&mut tree, b"hello", now()).unwrap();
        core.set_len(&mut tree, 2, now()).unwrap();
        assert_eq!(core.position(), 2);
        core.set_len(&mut tree, 4, now()).unwrap();
        assert_eq!(tree.node(node).as_file().unwrap().content, b"he\0\0");
    }

    #[test]
    fn writes_fail_when_volume_is_full() {
        let (mut tree, node, path) = setup(4);
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::Write);
        core.write(&mut tree, b"1234", now()).unwrap();
        let err = core.write(&mut tree, b"5", now()).unwrap_err();
        assert_eq!(
            err.to_string(),
            r"There is not enough space on the disk. : 'C:\file.bin'"
        );
    }

    #[test]
    fn write_at_maximum_offset_reports_no_space() {
        let (mut tree, node, path) = setup(1 << 20);
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::Write);
        assert_eq!(core.seek(&tree, SeekFrom::Start(u64::MAX)).unwrap(), u64::MAX);
        let err = core.write(&mut tree, b"x", now()).unwrap_err();
        assert!(matches!(err, FsError::NotEnoughSpace { .. }));
        assert_eq!(core.position(), u64::MAX);
        assert!(tree.node(node).as_file().unwrap().content.is_empty());
    }

    #[test]
    fn append_mode_forbids_overwriting_existing_data() {
        let (mut tree, node, path) = setup(1 << 20);
        let mut core = StreamCore::open(&mut tree, node, path.clone(), FileAccess::Write);
        core.write(&mut tree, b"old", now()).unwrap();
        core.close(&mut tree, &ChangeTracker::new());

        let mut append = StreamCore::open(&mut tree, node, path, FileAccess::Write);
        append.enter_append_mode(&tree).unwrap();
        assert_eq!(append.position(), 3);
        assert!(append.seek(&tree, SeekFrom::Start(0)).is_err());
        append.write(&mut tree, b"new", now()).unwrap();
        assert_eq!(tree.node(node).as_file().unwrap().content, b"oldnew");
    }

    #[test]
    fn close_releases_handle_and_publishes_once() {
        let (mut tree, node, path) = setup(1 << 20);
        let tracker = ChangeTracker::new();
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::Write);
        assert!(tree.node(node).as_file().unwrap().is_open());
        core.write(&mut tree, b"a", now()).unwrap();
        core.write(&mut tree, b"b", now()).unwrap();
        core.close(&mut tree, &tracker);
        assert!(!tree.node(node).as_file().unwrap().is_open());
        assert_eq!(tracker.last_sequence(), 1);
    }

    #[test]
    fn read_updates_last_access_time() {
        let (mut tree, node, path) = setup(1 << 20);
        let later = now() + std::time::Duration::from_secs(30);
        let mut core = StreamCore::open(&mut tree, node, path, FileAccess::Read);
        let mut buf = [0u8; 1];
        assert_eq!(core.read(&mut tree, &mut buf, later).unwrap(), 0);
        assert_eq!(tree.node(node).times.last_access, later);
        assert_eq!(tree.node(node).times.last_write, now());
    }
}

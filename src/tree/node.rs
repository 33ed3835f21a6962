//! Arena nodes shared by files, directories and volume roots.

use std::time::SystemTime;

use crate::{EntryKind, FileAttributes, TimeKind};

use super::directory::DirectoryData;
use super::file::FileData;

/// Attributes a file can persist.
const FILE_STORABLE: FileAttributes = FileAttributes::from_bits(
    FileAttributes::READ_ONLY.bits()
        | FileAttributes::HIDDEN.bits()
        | FileAttributes::SYSTEM.bits()
        | FileAttributes::ARCHIVE.bits()
        | FileAttributes::TEMPORARY.bits()
        | FileAttributes::OFFLINE.bits()
        | FileAttributes::NOT_CONTENT_INDEXED.bits(),
);

/// Attributes a directory can persist, besides the mandatory `DIRECTORY` bit.
const DIRECTORY_STORABLE: FileAttributes = FileAttributes::from_bits(
    FileAttributes::READ_ONLY.bits()
        | FileAttributes::HIDDEN.bits()
        | FileAttributes::SYSTEM.bits()
        | FileAttributes::ARCHIVE.bits()
        | FileAttributes::OFFLINE.bits()
        | FileAttributes::NOT_CONTENT_INDEXED.bits(),
);

/// Stable arena index. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct NodeId(pub(crate) u64);

/// Whether an entry's content is encrypted, and by whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum EncryptionState {
    #[default]
    None,
    /// Encrypted through this filesystem.
    Encrypted,
    /// Encrypted by another user account; the entry rejects most mutation.
    ExternallyEncrypted,
}

/// The three timestamps every entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Timestamps {
    pub(crate) creation: SystemTime,
    pub(crate) last_write: SystemTime,
    pub(crate) last_access: SystemTime,
}

impl Timestamps {
    pub(crate) fn all(now: SystemTime) -> Self {
        Self {
            creation: now,
            last_write: now,
            last_access: now,
        }
    }

    pub(crate) fn get(&self, kind: TimeKind) -> SystemTime {
        match kind {
            TimeKind::Creation => self.creation,
            TimeKind::LastWrite => self.last_write,
            TimeKind::LastAccess => self.last_access,
        }
    }

    pub(crate) fn set(&mut self, kind: TimeKind, value: SystemTime) {
        match kind {
            TimeKind::Creation => self.creation = value,
            TimeKind::LastWrite => self.last_write = value,
            TimeKind::LastAccess => self.last_access = value,
        }
    }
}

#[derive(Debug)]
pub(crate) enum NodeData {
    Directory(DirectoryData),
    File(FileData),
}

/// A file, directory or volume root.
#[derive(Debug)]
pub(crate) struct Node {
    /// Name with the casing it was created with.
    pub(crate) name: String,
    /// `None` for volume roots.
    pub(crate) parent: Option<NodeId>,
    pub(crate) times: Timestamps,
    pub(crate) encryption: EncryptionState,
    pub(crate) data: NodeData,
    attributes: FileAttributes,
}

impl Node {
    pub(crate) fn new_directory(
        name: &str,
        parent: Option<NodeId>,
        data: DirectoryData,
        now: SystemTime,
    ) -> Self {
        let attributes = if data.volume.is_some() {
            FileAttributes::HIDDEN | FileAttributes::SYSTEM
        } else {
            FileAttributes::EMPTY
        };
        Self {
            name: name.to_string(),
            parent,
            times: Timestamps::all(now),
            encryption: EncryptionState::None,
            data: NodeData::Directory(data),
            attributes,
        }
    }

    pub(crate) fn new_file(name: &str, parent: NodeId, now: SystemTime) -> Self {
        Self {
            name: name.to_string(),
            parent: Some(parent),
            times: Timestamps::all(now),
            encryption: EncryptionState::None,
            data: NodeData::File(FileData::default()),
            attributes: FileAttributes::ARCHIVE,
        }
    }

    pub(crate) fn kind(&self) -> EntryKind {
        match self.data {
            NodeData::Directory(_) => EntryKind::Directory,
            NodeData::File(_) => EntryKind::File,
        }
    }

    pub(crate) fn is_file(&self) -> bool {
        matches!(self.data, NodeData::File(_))
    }

    pub(crate) fn is_directory(&self) -> bool {
        matches!(self.data, NodeData::Directory(_))
    }

    pub(crate) fn as_directory(&self) -> Option<&DirectoryData> {
        match &self.data {
            NodeData::Directory(dir) => Some(dir),
            NodeData::File(_) => None,
        }
    }

    pub(crate) fn as_directory_mut(&mut self) -> Option<&mut DirectoryData> {
        match &mut self.data {
            NodeData::Directory(dir) => Some(dir),
            NodeData::File(_) => None,
        }
    }

    pub(crate) fn as_file(&self) -> Option<&FileData> {
        match &self.data {
            NodeData::File(file) => Some(file),
            NodeData::Directory(_) => None,
        }
    }

    pub(crate) fn as_file_mut(&mut self) -> Option<&mut FileData> {
        match &mut self.data {
            NodeData::File(file) => Some(file),
            NodeData::Directory(_) => None,
        }
    }

    pub(crate) fn is_volume_root(&self) -> bool {
        self.as_directory().is_some_and(|dir| dir.volume.is_some())
    }

    /// Attributes as the platform reports them.
    pub(crate) fn attributes(&self) -> FileAttributes {
        let mut reported = self.attributes;
        if self.encryption != EncryptionState::None {
            reported |= FileAttributes::ENCRYPTED;
        }
        match self.data {
            NodeData::Directory(_) => reported | FileAttributes::DIRECTORY,
            NodeData::File(_) if reported.is_empty() => FileAttributes::NORMAL,
            NodeData::File(_) => reported,
        }
    }

    /// Attributes that were explicitly stored (no derived bits).
    pub(crate) fn stored_attributes(&self) -> FileAttributes {
        self.attributes
    }

    /// Store `attributes`, dropping bits this kind of entry cannot hold.
    ///
    /// Volume roots keep their fixed attributes. Returns `true` if anything
    /// changed.
    pub(crate) fn set_attributes(&mut self, attributes: FileAttributes) -> bool {
        if self.is_volume_root() {
            return false;
        }
        let storable = match self.data {
            NodeData::Directory(_) => DIRECTORY_STORABLE,
            NodeData::File(_) => FILE_STORABLE,
        };
        let filtered = attributes & storable;
        let changed = filtered != self.attributes;
        self.attributes = filtered;
        changed
    }

    pub(crate) fn is_read_only(&self) -> bool {
        self.attributes.contains(FileAttributes::READ_ONLY)
    }

    pub(crate) fn is_hidden(&self) -> bool {
        self.attributes.contains(FileAttributes::HIDDEN)
    }

    pub(crate) fn is_externally_encrypted(&self) -> bool {
        self.encryption == EncryptionState::ExternallyEncrypted
    }

    /// Content length for files, zero for directories.
    pub(crate) fn size(&self) -> u64 {
        self.as_file().map_or(0, FileData::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file() -> Node {
        Node::new_file("a.txt", NodeId(1), SystemTime::UNIX_EPOCH)
    }

    fn directory() -> Node {
        Node::new_directory(
            "dir",
            Some(NodeId(1)),
            DirectoryData::default(),
            SystemTime::UNIX_EPOCH,
        )
    }

    #[test]
    fn new_file_reports_archive() {
        assert_eq!(file().attributes(), FileAttributes::ARCHIVE);
    }

    #[test]
    fn file_without_attributes_reports_normal() {
        let mut node = file();
        node.set_attributes(FileAttributes::EMPTY);
        assert_eq!(node.attributes(), FileAttributes::NORMAL);
        node.set_attributes(FileAttributes::NORMAL);
        assert_eq!(node.attributes(), FileAttributes::NORMAL);
    }

    #[test]
    fn directory_always_reports_directory_bit() {
        let mut node = directory();
        node.set_attributes(FileAttributes::HIDDEN);
        assert_eq!(
            node.attributes(),
            FileAttributes::HIDDEN | FileAttributes::DIRECTORY
        );
    }

    #[test]
    fn directory_drops_temporary() {
        let mut node = directory();
        node.set_attributes(FileAttributes::TEMPORARY | FileAttributes::SPARSE_FILE);
        assert_eq!(node.attributes(), FileAttributes::DIRECTORY);
    }

    #[test]
    fn file_keeps_temporary_but_not_derived_bits() {
        let mut node = file();
        let changed = node.set_attributes(
            FileAttributes::TEMPORARY | FileAttributes::ENCRYPTED | FileAttributes::DIRECTORY,
        );
        assert!(changed);
        assert_eq!(node.attributes(), FileAttributes::TEMPORARY);
    }

    #[test]
    fn encryption_is_reported_as_attribute() {
        let mut node = file();
        node.encryption = EncryptionState::Encrypted;
        assert!(node.attributes().contains(FileAttributes::ENCRYPTED));
        assert!(!node.stored_attributes().contains(FileAttributes::ENCRYPTED));
    }

    #[test]
    fn volume_root_attributes_are_fixed() {
        let mut volume = Node::new_directory(
            "C:",
            None,
            DirectoryData::volume(crate::VolumeInfo::default()),
            SystemTime::UNIX_EPOCH,
        );
        assert!(!volume.set_attributes(FileAttributes::READ_ONLY));
        assert_eq!(
            volume.attributes(),
            FileAttributes::HIDDEN | FileAttributes::SYSTEM | FileAttributes::DIRECTORY
        );
    }

    #[test]
    fn timestamps_get_and_set_by_kind() {
        let mut times = Timestamps::all(SystemTime::UNIX_EPOCH);
        let later = SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(9);
        times.set(TimeKind::LastAccess, later);
        assert_eq!(times.get(TimeKind::LastAccess), later);
        assert_eq!(times.get(TimeKind::Creation), SystemTime::UNIX_EPOCH);
    }
}

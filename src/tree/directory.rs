//! Directory payload: case-insensitive child maps and optional volume metadata.

use std::collections::BTreeMap;

use crate::path::name_key;
use crate::{EntryKind, VolumeInfo};

use super::node::NodeId;

/// Children of a directory, keyed by their case-folded name.
///
/// A name lives in at most one of the two maps.
#[derive(Debug, Default)]
pub(crate) struct DirectoryData {
    pub(crate) directories: BTreeMap<String, NodeId>,
    pub(crate) files: BTreeMap<String, NodeId>,
    /// Present only on volume roots.
    pub(crate) volume: Option<VolumeInfo>,
}

impl DirectoryData {
    pub(crate) fn volume(info: VolumeInfo) -> Self {
        Self {
            volume: Some(info),
            ..Self::default()
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.directories.is_empty() && self.files.is_empty()
    }

    pub(crate) fn directory(&self, name: &str) -> Option<NodeId> {
        self.directories.get(&name_key(name)).copied()
    }

    pub(crate) fn file(&self, name: &str) -> Option<NodeId> {
        self.files.get(&name_key(name)).copied()
    }

    pub(crate) fn child(&self, name: &str) -> Option<(NodeId, EntryKind)> {
        self.directory(name)
            .map(|id| (id, EntryKind::Directory))
            .or_else(|| self.file(name).map(|id| (id, EntryKind::File)))
    }

    pub(crate) fn insert(&mut self, name: &str, id: NodeId, kind: EntryKind) {
        let map = match kind {
            EntryKind::Directory => &mut self.directories,
            EntryKind::File => &mut self.files,
        };
        map.insert(name_key(name), id);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<NodeId> {
        let key = name_key(name);
        self.directories
            .remove(&key)
            .or_else(|| self.files.remove(&key))
    }

    /// All children in case-insensitive name order.
    pub(crate) fn children(&self) -> Vec<NodeId> {
        let mut children: Vec<(&String, NodeId)> = self
            .directories
            .iter()
            .chain(self.files.iter())
            .map(|(key, id)| (key, *id))
            .collect();
        children.sort_by(|a, b| a.0.cmp(b.0));
        children.into_iter().map(|(_, id)| id).collect()
    }
}

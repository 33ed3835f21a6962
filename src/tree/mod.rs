//! # Entry Tree
//!
//! Arena of file, directory and volume nodes addressed by [`NodeId`].
//!
//! Volumes hang off an implicit root container. Every node except a volume
//! root records its parent id; children are owned through the parent's
//! case-insensitive maps. Ids are never reused, so a stale id simply stops
//! resolving.

mod directory;
mod file;
mod node;

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::SystemTime;

use crate::path::{name_key, SearchPattern, WildcardPattern};
use crate::{
    AbsolutePath, EntryKind, EntryMetadata, EnumerationKind, FsError, PathNavigator,
    SearchOption, VolumeInfo,
};

pub(crate) use directory::DirectoryData;
pub(crate) use file::FileData;
pub(crate) use node::{EncryptionState, Node, NodeId, Timestamps};

/// The whole emulated namespace.
#[derive(Debug, Default)]
pub(crate) struct EntryTree {
    nodes: HashMap<NodeId, Node>,
    volumes: BTreeMap<String, NodeId>,
    next_id: u64,
}

impl EntryTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Volumes
    // ========================================================================

    /// Mount a new volume at depth 0.
    pub(crate) fn add_volume(
        &mut self,
        name: &str,
        info: VolumeInfo,
        now: SystemTime,
    ) -> Result<NodeId, FsError> {
        if self.volumes.contains_key(&name_key(name)) {
            return Err(FsError::CannotCreateExisting { path: name.into() });
        }
        let id = self.allocate();
        let node = Node::new_directory(name, None, DirectoryData::volume(info), now);
        self.nodes.insert(id, node);
        self.volumes.insert(name_key(name), id);
        Ok(id)
    }

    pub(crate) fn volume(&self, name: &str) -> Option<NodeId> {
        self.volumes.get(&name_key(name)).copied()
    }

    /// Volume roots in name order.
    pub(crate) fn volumes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.volumes.values().copied()
    }

    /// The volume root that `id` lives on.
    pub(crate) fn volume_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.node(current).parent {
            current = parent;
        }
        current
    }

    pub(crate) fn volume_info(&self, id: NodeId) -> Option<&VolumeInfo> {
        let root = self.volume_of(id);
        self.node(root).as_directory()?.volume.as_ref()
    }

    fn volume_info_mut(&mut self, id: NodeId) -> Option<&mut VolumeInfo> {
        let root = self.volume_of(id);
        self.node_mut(root).as_directory_mut()?.volume.as_mut()
    }

    // ========================================================================
    // Node access
    // ========================================================================

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Node for an id handed out by this tree and not yet removed.
    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[&id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes.get_mut(&id).unwrap_or_else(|| unreachable!("dangling {id:?}"))
    }

    pub(crate) fn child_directory(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent).as_directory()?.directory(name)
    }

    pub(crate) fn child_file(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent).as_directory()?.file(name)
    }

    /// Full path of a node, rendered with the stored casing.
    pub(crate) fn path_of(&self, id: NodeId) -> AbsolutePath {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.node(node_id);
            names.push(node.name.clone());
            current = node.parent;
        }
        names.reverse();
        AbsolutePath::from_parts(names, false)
    }

    /// `true` if `ancestor` is `id` itself or lies above it.
    pub(crate) fn is_same_or_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == ancestor {
                return true;
            }
            current = self.node(node_id).parent;
        }
        false
    }

    /// `true` if any file at or below `id` has an open handle.
    pub(crate) fn has_open_files(&self, id: NodeId) -> bool {
        let node = self.node(id);
        match node.as_directory() {
            Some(dir) => dir
                .directories
                .values()
                .chain(dir.files.values())
                .any(|child| self.has_open_files(*child)),
            None => node.as_file().is_some_and(FileData::is_open),
        }
    }

    pub(crate) fn metadata(&self, id: NodeId) -> EntryMetadata {
        let node = self.node(id);
        EntryMetadata {
            full_name: self.path_of(id).get_text(),
            kind: node.kind(),
            attributes: node.attributes(),
            size: node.size(),
            creation_time_utc: node.times.creation,
            last_write_time_utc: node.times.last_write,
            last_access_time_utc: node.times.last_access,
        }
    }

    // ========================================================================
    // Creation
    // ========================================================================

    pub(crate) fn create_directory(
        &mut self,
        parent: NodeId,
        name: &str,
        now: SystemTime,
    ) -> Result<NodeId, FsError> {
        self.check_new_child(parent, name)?;
        let id = self.allocate();
        let node = Node::new_directory(name, Some(parent), DirectoryData::default(), now);
        self.nodes.insert(id, node);
        self.attach_child(parent, name, id, EntryKind::Directory);
        Ok(id)
    }

    pub(crate) fn create_file(
        &mut self,
        parent: NodeId,
        name: &str,
        now: SystemTime,
    ) -> Result<NodeId, FsError> {
        self.check_new_child(parent, name)?;
        let id = self.allocate();
        self.nodes.insert(id, Node::new_file(name, parent, now));
        self.attach_child(parent, name, id, EntryKind::File);
        Ok(id)
    }

    /// Walk to the file at `path`, creating it if missing.
    ///
    /// With `create_tree`, missing intermediate directories are created too.
    /// Returns the file and whether it was newly created.
    pub(crate) fn get_or_create_file(
        &mut self,
        path: &AbsolutePath,
        create_tree: bool,
        now: SystemTime,
    ) -> Result<(NodeId, bool), FsError> {
        let not_found = || FsError::DirectoryNotFound {
            path: path.get_text(),
        };
        if path.is_volume_root() {
            return Err(FsError::UnauthorizedAccess {
                path: path.get_text(),
            });
        }

        let mut navigator = PathNavigator::new(path);
        let mut directory = self.volume(navigator.current()).ok_or_else(not_found)?;
        while navigator.move_next() {
            let name = navigator.current();
            if navigator.is_at_end() {
                if self.child_directory(directory, name).is_some() {
                    return Err(FsError::UnauthorizedAccess {
                        path: path.get_text(),
                    });
                }
                return match self.child_file(directory, name) {
                    Some(file) => Ok((file, false)),
                    None => Ok((self.create_file(directory, name, now)?, true)),
                };
            }
            directory = match self.child_directory(directory, name) {
                Some(next) => next,
                None if create_tree => self.create_directory(directory, name, now)?,
                None => return Err(not_found()),
            };
        }
        Err(not_found())
    }

    pub(crate) fn try_get_existing_directory(&self, path: &AbsolutePath) -> Option<NodeId> {
        let mut current = self.volume(path.volume_name())?;
        for name in &path.components()[1..] {
            current = self.child_directory(current, name)?;
        }
        Some(current)
    }

    pub(crate) fn try_get_existing_file(&self, path: &AbsolutePath) -> Option<NodeId> {
        let parent = self.try_get_existing_directory(&path.try_get_parent_path()?)?;
        self.child_file(parent, path.name())
    }

    // ========================================================================
    // Detach, reattach, remove
    // ========================================================================

    /// Move `id` under `new_parent` as `new_name`.
    ///
    /// File content moves with the node; when the volume changes, its size is
    /// refunded to the old volume and charged to the new one.
    pub(crate) fn move_node(
        &mut self,
        id: NodeId,
        new_parent: NodeId,
        new_name: &str,
    ) -> Result<(), FsError> {
        let old_volume = self.volume_of(id);
        let new_volume = self.volume_of(new_parent);
        let size = self.subtree_size(id);
        if old_volume != new_volume && size > 0 {
            let free = self.volume_info(new_parent).map_or(0, |v| v.free_space);
            if free < size {
                let path = self.path_of(new_parent).append(new_name).get_text();
                return Err(FsError::NotEnoughSpace { path });
            }
            self.adjust_free_space(id, size as i128);
            self.adjust_free_space(new_parent, -(size as i128));
        }

        let kind = self.node(id).kind();
        self.detach(id);
        let node = self.node_mut(id);
        node.name = new_name.to_string();
        node.parent = Some(new_parent);
        self.attach_child(new_parent, new_name, id, kind);
        Ok(())
    }

    /// Change only the stored casing of a name.
    pub(crate) fn rename_in_place(&mut self, id: NodeId, new_name: &str) {
        if let Some(parent) = self.node(id).parent {
            let kind = self.node(id).kind();
            self.detach(id);
            self.node_mut(id).name = new_name.to_string();
            self.attach_child(parent, new_name, id, kind);
        }
    }

    /// Remove `id` and everything below it, refunding file content.
    pub(crate) fn remove(&mut self, id: NodeId) {
        let size = self.subtree_size(id);
        self.adjust_free_space(id, size as i128);
        self.detach(id);
        let mut pending = vec![id];
        while let Some(next) = pending.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                if let Some(dir) = node.as_directory() {
                    pending.extend(dir.directories.values().chain(dir.files.values()));
                }
            }
        }
    }

    // ========================================================================
    // File content
    // ========================================================================

    /// Resize file content, charging growth to the volume's free space.
    pub(crate) fn resize_content(&mut self, id: NodeId, new_len: u64) -> Result<(), FsError> {
        let old_len = self.node(id).size();
        if new_len > old_len {
            let growth = new_len - old_len;
            let free = self.volume_info(id).map_or(0, |v| v.free_space);
            if growth > free {
                return Err(FsError::NotEnoughSpace {
                    path: self.path_of(id).get_text(),
                });
            }
        }
        let new_size = usize::try_from(new_len).map_err(|_| FsError::NotEnoughSpace {
            path: self.path_of(id).get_text(),
        })?;
        self.adjust_free_space(id, old_len as i128 - new_len as i128);
        if let Some(file) = self.node_mut(id).as_file_mut() {
            file.content.resize(new_size, 0);
        }
        Ok(())
    }

    // ========================================================================
    // Enumeration
    // ========================================================================

    /// Entries below `directory` matching `pattern`, as absolute path strings.
    ///
    /// Directory segments of the pattern select directories at successive
    /// depths; the last segment filters the yielded names. Results are
    /// rendered relative to `base`, the caller's spelling of `directory`.
    pub(crate) fn enumerate(
        &self,
        directory: NodeId,
        base: &AbsolutePath,
        pattern: &SearchPattern,
        option: SearchOption,
        kind: EnumerationKind,
    ) -> Vec<String> {
        let mut results = Vec::new();
        if pattern.is_empty() {
            return results;
        }

        let mut landing = vec![(directory, base.clone())];
        for segment in pattern.directories() {
            landing = landing
                .iter()
                .flat_map(|(id, path)| self.matching_subdirectories(*id, path, segment))
                .collect();
        }

        let mut seen = HashSet::new();
        for (id, path) in landing {
            self.collect_matches(
                id,
                &path,
                pattern.name(),
                option,
                kind,
                &mut seen,
                &mut results,
            );
        }
        results
    }

    fn matching_subdirectories(
        &self,
        id: NodeId,
        path: &AbsolutePath,
        segment: &WildcardPattern,
    ) -> Vec<(NodeId, AbsolutePath)> {
        let Some(dir) = self.node(id).as_directory() else {
            return Vec::new();
        };
        dir.directories
            .values()
            .map(|child| (*child, &self.node(*child).name))
            .filter(|(_, name)| segment.is_match(name))
            .map(|(child, name)| (child, path.append(name)))
            .collect()
    }

    #[allow(clippy::too_many_arguments)]
    fn collect_matches(
        &self,
        id: NodeId,
        path: &AbsolutePath,
        name_pattern: &WildcardPattern,
        option: SearchOption,
        kind: EnumerationKind,
        seen: &mut HashSet<NodeId>,
        results: &mut Vec<String>,
    ) {
        let Some(dir) = self.node(id).as_directory() else {
            return;
        };
        for child in dir.children() {
            let node = self.node(child);
            let wanted = match kind {
                EnumerationKind::Files => node.is_file(),
                EnumerationKind::Directories => node.is_directory(),
                EnumerationKind::All => true,
            };
            if wanted && name_pattern.is_match(&node.name) && seen.insert(child) {
                results.push(path.append(&node.name).get_text());
            }
        }
        if option == SearchOption::AllDirectories {
            for sub in dir.directories.values() {
                let sub_path = path.append(&self.node(*sub).name);
                self.collect_matches(*sub, &sub_path, name_pattern, option, kind, seen, results);
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn allocate(&mut self) -> NodeId {
        self.next_id += 1;
        NodeId(self.next_id)
    }

    fn check_new_child(&self, parent: NodeId, name: &str) -> Result<(), FsError> {
        let parent_node = self.node(parent);
        let conflict = || FsError::CannotCreateExisting {
            path: self.path_of(parent).append(name).get_text(),
        };
        // Drive and share names only exist at depth 0
        if name.contains(':') || name.starts_with('\\') {
            return Err(FsError::InvalidPath {
                path: self.path_of(parent).append(name).get_text(),
            });
        }
        match parent_node.as_directory() {
            Some(dir) if dir.child(name).is_some() => Err(conflict()),
            Some(_) => Ok(()),
            None => Err(conflict()),
        }
    }

    fn attach_child(&mut self, parent: NodeId, name: &str, id: NodeId, kind: EntryKind) {
        if let Some(dir) = self.node_mut(parent).as_directory_mut() {
            dir.insert(name, id, kind);
        }
    }

    fn detach(&mut self, id: NodeId) {
        let (parent, name) = {
            let node = self.node(id);
            (node.parent, node.name.clone())
        };
        match parent {
            Some(parent) => {
                if let Some(dir) = self.node_mut(parent).as_directory_mut() {
                    dir.remove(&name);
                }
            }
            None => {
                self.volumes.remove(&name_key(&name));
            }
        }
    }

    fn subtree_size(&self, id: NodeId) -> u64 {
        let node = self.node(id);
        match node.as_directory() {
            Some(dir) => dir
                .directories
                .values()
                .chain(dir.files.values())
                .map(|child| self.subtree_size(*child))
                .sum(),
            None => node.size(),
        }
    }

    /// Positive `delta` frees space, negative consumes it.
    fn adjust_free_space(&mut self, id: NodeId, delta: i128) {
        if delta == 0 {
            return;
        }
        if let Some(info) = self.volume_info_mut(id) {
            let updated = (info.free_space as i128 + delta).clamp(0, info.capacity as i128);
            info.free_space = updated as u64;
        }
    }
}

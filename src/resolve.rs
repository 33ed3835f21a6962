//! # Resolvers
//!
//! Walk the [`EntryTree`] along an [`AbsolutePath`] and report *why* a walk
//! stopped as a [`ResolveFailure`]. Handlers match on the failure to raise the
//! error their operation is expected to raise for that tree shape.

use crate::tree::{EntryTree, NodeId};
use crate::{AbsolutePath, EntryKind, FsError, PathNavigator};

/// Reason a walk could not reach its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveFailure {
    /// The UNC share is not mounted.
    NetworkPathNotFound,
    /// An interior component is a file.
    DirectoryFoundAsFile,
    /// The terminal component is a file where a directory was expected.
    LastDirectoryFoundAsFile,
    /// A component does not exist.
    DirectoryNotFound,
    /// The terminal component is a directory where a file was expected.
    FileFoundAsDirectory,
    /// The terminal file does not exist.
    FileNotFound,
    /// The path names a volume root where an entry below it was expected.
    PathIsVolumeRoot,
}

impl ResolveFailure {
    /// The error most operations raise for this failure.
    pub(crate) fn into_error(self, path: &AbsolutePath) -> FsError {
        let path = path.get_text();
        match self {
            ResolveFailure::NetworkPathNotFound => FsError::NetworkPathNotFound { path },
            ResolveFailure::DirectoryFoundAsFile
            | ResolveFailure::LastDirectoryFoundAsFile
            | ResolveFailure::DirectoryNotFound => FsError::DirectoryNotFound { path },
            ResolveFailure::FileNotFound => FsError::FileNotFound { path },
            ResolveFailure::FileFoundAsDirectory | ResolveFailure::PathIsVolumeRoot => {
                FsError::UnauthorizedAccess { path }
            }
        }
    }
}

/// Walk every component of `path` as a directory.
pub(crate) fn walk_directory(tree: &EntryTree, path: &AbsolutePath) -> Result<NodeId, ResolveFailure> {
    let mut navigator = PathNavigator::new(path);
    let mut current = match tree.volume(navigator.current()) {
        Some(volume) => volume,
        None if !path.is_on_local_drive() => return Err(ResolveFailure::NetworkPathNotFound),
        None => return Err(ResolveFailure::DirectoryNotFound),
    };

    while navigator.move_next() {
        let name = navigator.current();
        if let Some(next) = tree.child_directory(current, name) {
            current = next;
            continue;
        }
        if tree.child_file(current, name).is_some() {
            return Err(if navigator.is_at_end() {
                ResolveFailure::LastDirectoryFoundAsFile
            } else {
                ResolveFailure::DirectoryFoundAsFile
            });
        }
        return Err(ResolveFailure::DirectoryNotFound);
    }
    Ok(current)
}

/// Resolves paths that must name directories.
pub(crate) struct DirectoryResolver<'t> {
    tree: &'t EntryTree,
}

impl<'t> DirectoryResolver<'t> {
    pub(crate) fn new(tree: &'t EntryTree) -> Self {
        Self { tree }
    }

    pub(crate) fn resolve_directory(&self, path: &AbsolutePath) -> Result<NodeId, ResolveFailure> {
        walk_directory(self.tree, path)
    }

    /// The directory that would contain `path`.
    pub(crate) fn resolve_containing_directory(
        &self,
        path: &AbsolutePath,
    ) -> Result<NodeId, ResolveFailure> {
        let parent = path
            .try_get_parent_path()
            .ok_or(ResolveFailure::PathIsVolumeRoot)?;
        walk_directory(self.tree, &parent)
    }
}

/// Outcome of a non-failing file lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileResolution {
    /// Directory that holds (or would hold) the file.
    pub(crate) directory: NodeId,
    pub(crate) existing_file: Option<NodeId>,
    /// Final path component as the caller spelled it.
    pub(crate) name: String,
}

/// Resolves paths that must name files.
pub(crate) struct FileResolver<'t> {
    tree: &'t EntryTree,
}

impl<'t> FileResolver<'t> {
    pub(crate) fn new(tree: &'t EntryTree) -> Self {
        Self { tree }
    }

    /// Locate the containing directory and, if present, the file itself.
    pub(crate) fn try_resolve_file(
        &self,
        path: &AbsolutePath,
    ) -> Result<FileResolution, ResolveFailure> {
        let directory = DirectoryResolver::new(self.tree).resolve_containing_directory(path)?;
        let name = path.name();
        if self.tree.child_directory(directory, name).is_some() {
            return Err(ResolveFailure::FileFoundAsDirectory);
        }
        Ok(FileResolution {
            directory,
            existing_file: self.tree.child_file(directory, name),
            name: name.to_string(),
        })
    }

    pub(crate) fn resolve_existing_file(&self, path: &AbsolutePath) -> Result<NodeId, ResolveFailure> {
        self.try_resolve_file(path)?
            .existing_file
            .ok_or(ResolveFailure::FileNotFound)
    }
}

/// Resolves paths that may name either kind of entry.
pub(crate) struct EntryResolver<'t> {
    tree: &'t EntryTree,
}

impl<'t> EntryResolver<'t> {
    pub(crate) fn new(tree: &'t EntryTree) -> Self {
        Self { tree }
    }

    /// The file or directory at `path`, including volume roots.
    pub(crate) fn resolve_entry(
        &self,
        path: &AbsolutePath,
    ) -> Result<(NodeId, EntryKind), ResolveFailure> {
        if path.is_volume_root() {
            return walk_directory(self.tree, path).map(|id| (id, EntryKind::Directory));
        }
        let directory = DirectoryResolver::new(self.tree).resolve_containing_directory(path)?;
        self.tree
            .node(directory)
            .as_directory()
            .and_then(|dir| dir.child(path.name()))
            .ok_or(ResolveFailure::FileNotFound)
    }
}

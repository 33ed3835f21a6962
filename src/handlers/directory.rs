//! Directory create, delete and move.

use crate::resolve::{walk_directory, DirectoryResolver, EntryResolver, ResolveFailure};
use crate::tree::NodeId;
use crate::watcher::FileAccessKinds;
use crate::{AbsolutePath, EntryKind, FsError, PathNavigator};

use super::file::{FileMoveHandler, MoveFile};
use super::{HandlerContext, OperationHandler, TARGET};

/// Creates a directory and every missing ancestor.
///
/// An existing directory is not an error. Each created component raises its
/// own Create record, outermost first.
pub(crate) struct DirectoryCreateHandler;

impl OperationHandler for DirectoryCreateHandler {
    type Arguments = AbsolutePath;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, path: AbsolutePath) -> Result<(), FsError> {
        let volume = match ctx.tree.volume(path.volume_name()) {
            Some(volume) => volume,
            None if !path.is_on_local_drive() => {
                return Err(FsError::NetworkPathNotFound {
                    path: path.get_text(),
                });
            }
            None => {
                return Err(FsError::DirectoryNotFound {
                    path: path.get_text(),
                });
            }
        };

        let mut navigator = PathNavigator::new(&path);
        let mut current = volume;
        let mut created = Vec::new();
        while navigator.move_next() {
            let name = navigator.current();
            if let Some(next) = ctx.tree.child_directory(current, name) {
                current = next;
                continue;
            }
            if ctx.tree.child_file(current, name).is_some() {
                return Err(FsError::CannotCreateExisting {
                    path: navigator.path_up_to_here().get_text(),
                });
            }
            current = ctx.tree.create_directory(current, name, ctx.now)?;
            created.push(current);
        }

        for id in created {
            ctx.notify(id, FileAccessKinds::CREATE);
        }
        tracing::debug!(target: TARGET, path = %path, "directory created");
        Ok(())
    }
}

/// Arguments for [`DirectoryDeleteHandler`].
pub(crate) struct DeleteDirectory {
    pub(crate) path: AbsolutePath,
    pub(crate) recursive: bool,
}

/// Deletes a directory.
///
/// A recursive delete removes everything it can, depth first, and then
/// reports the first entry it could not remove.
pub(crate) struct DirectoryDeleteHandler;

impl OperationHandler for DirectoryDeleteHandler {
    type Arguments = DeleteDirectory;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: DeleteDirectory) -> Result<(), FsError> {
        let path = &args.path;
        let id = walk_directory(ctx.tree, path).map_err(|failure| match failure {
            ResolveFailure::LastDirectoryFoundAsFile => FsError::InvalidDirectoryName {
                path: path.get_text(),
            },
            other => other.into_error(path),
        })?;

        let node = ctx.tree.node(id);
        if node.is_volume_root() || node.is_read_only() {
            return Err(FsError::UnauthorizedAccess {
                path: path.get_text(),
            });
        }
        if ctx.contains_current_directory(id) {
            return Err(FsError::FileInUse {
                path: path.get_text(),
            });
        }

        if !args.recursive {
            if !node.as_directory().is_some_and(|dir| dir.is_empty()) {
                return Err(FsError::DirectoryNotEmpty {
                    path: path.get_text(),
                });
            }
            remove_and_notify(ctx, id);
            tracing::debug!(target: TARGET, path = %path, "directory deleted");
            return Ok(());
        }

        let mut first_failure = None;
        delete_tree(ctx, id, &mut first_failure);
        match first_failure {
            Some(error) => {
                tracing::debug!(target: TARGET, path = %path, %error, "recursive delete incomplete");
                Err(error)
            }
            None => {
                tracing::debug!(target: TARGET, path = %path, "directory tree deleted");
                Ok(())
            }
        }
    }
}

/// Delete `id` and its descendants; returns `true` if `id` itself went away.
fn delete_tree(ctx: &mut HandlerContext<'_>, id: NodeId, first_failure: &mut Option<FsError>) -> bool {
    let children = ctx
        .tree
        .node(id)
        .as_directory()
        .map(|dir| dir.children())
        .unwrap_or_default();

    let mut emptied = true;
    for child in children {
        let node = ctx.tree.node(child);
        let removable = if node.is_directory() {
            delete_tree(ctx, child, first_failure)
        } else if node.as_file().is_some_and(|file| file.is_open()) {
            first_failure.get_or_insert(FsError::FileInUse {
                path: ctx.tree.path_of(child).get_text(),
            });
            false
        } else if node.is_read_only() {
            first_failure.get_or_insert(FsError::UnauthorizedAccess {
                path: ctx.tree.path_of(child).get_text(),
            });
            false
        } else {
            remove_and_notify(ctx, child);
            true
        };
        emptied &= removable;
    }

    if !emptied {
        return false;
    }
    if ctx.tree.node(id).is_read_only() {
        first_failure.get_or_insert(FsError::UnauthorizedAccess {
            path: ctx.tree.path_of(id).get_text(),
        });
        return false;
    }
    remove_and_notify(ctx, id);
    true
}

pub(super) fn remove_and_notify(ctx: &mut HandlerContext<'_>, id: NodeId) {
    let path = ctx.tree.path_of(id);
    let kind = ctx.tree.node(id).kind();
    ctx.tree.remove(id);
    ctx.tracker.record_change(path, kind, FileAccessKinds::DELETE);
}

/// Arguments for [`DirectoryMoveHandler`].
pub(crate) struct MoveDirectory {
    pub(crate) source: AbsolutePath,
    pub(crate) destination: AbsolutePath,
}

/// Moves or renames a directory within one volume.
///
/// A source that turns out to be a file is moved as a file.
pub(crate) struct DirectoryMoveHandler;

impl OperationHandler for DirectoryMoveHandler {
    type Arguments = MoveDirectory;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: MoveDirectory) -> Result<(), FsError> {
        let MoveDirectory {
            source,
            destination,
        } = args;
        if source.components() == destination.components() {
            return Err(FsError::SameSourceAndDestination);
        }
        if !source.is_on_same_volume(&destination) {
            return Err(FsError::CrossVolumeMove);
        }

        let (id, kind) = EntryResolver::new(ctx.tree)
            .resolve_entry(&source)
            .map_err(|failure| match failure {
                ResolveFailure::NetworkPathNotFound => failure.into_error(&source),
                _ => FsError::DirectoryNotFound {
                    path: source.get_text(),
                },
            })?;
        if kind == EntryKind::File {
            return FileMoveHandler.handle(
                ctx,
                MoveFile {
                    source,
                    destination,
                },
            );
        }
        if ctx.tree.node(id).is_volume_root() {
            return Err(FsError::UnauthorizedAccess {
                path: source.get_text(),
            });
        }
        if destination.is_descendant_of(&source) {
            return Err(FsError::InUse);
        }

        let parent = DirectoryResolver::new(ctx.tree)
            .resolve_containing_directory(&destination)
            .map_err(|failure| failure.into_error(&destination))?;
        let occupant = ctx
            .tree
            .node(parent)
            .as_directory()
            .and_then(|dir| dir.child(destination.name()));
        if occupant.is_some_and(|(existing, _)| existing != id) {
            return Err(FsError::CannotCreateFileExists {
                path: destination.get_text(),
            });
        }
        if ctx.tree.has_open_files(id) {
            return Err(FsError::UnauthorizedAccess {
                path: source.get_text(),
            });
        }
        if ctx.contains_current_directory(id) {
            return Err(FsError::FileInUse {
                path: source.get_text(),
            });
        }

        let old_path = ctx.tree.path_of(id);
        if occupant.is_some() {
            ctx.tree.rename_in_place(id, destination.name());
        } else {
            ctx.tree.move_node(id, parent, destination.name())?;
        }
        let new_path = ctx.tree.path_of(id);
        tracing::debug!(target: TARGET, from = %old_path, to = %new_path, "directory moved");
        ctx.tracker
            .record_rename(old_path, new_path, EntryKind::Directory);
        Ok(())
    }
}

//! File delete, move, copy, replace and open.

use crate::resolve::{FileResolver, ResolveFailure};
use crate::stream::StreamCore;
use crate::tree::NodeId;
use crate::watcher::FileAccessKinds;
use crate::{AbsolutePath, EntryKind, FileAccess, FileMode, FsError};

use super::directory::remove_and_notify;
use super::{HandlerContext, OperationHandler, TARGET};

/// Map a failed lookup of a file that must exist.
fn existing_file_error(failure: ResolveFailure, path: &AbsolutePath) -> FsError {
    match failure {
        ResolveFailure::FileFoundAsDirectory | ResolveFailure::PathIsVolumeRoot => {
            FsError::UnauthorizedAccess {
                path: path.get_text(),
            }
        }
        other => other.into_error(path),
    }
}

fn in_use(path: &AbsolutePath) -> FsError {
    FsError::FileInUse {
        path: path.get_text(),
    }
}

fn denied(path: &AbsolutePath) -> FsError {
    FsError::UnauthorizedAccess {
        path: path.get_text(),
    }
}

fn is_open(ctx: &HandlerContext<'_>, id: NodeId) -> bool {
    ctx.tree
        .node(id)
        .as_file()
        .is_some_and(|file| file.is_open())
}

// ============================================================================
// Delete
// ============================================================================

/// Deletes a file. A missing file in an existing directory is not an error.
pub(crate) struct FileDeleteHandler;

impl OperationHandler for FileDeleteHandler {
    type Arguments = AbsolutePath;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, path: AbsolutePath) -> Result<(), FsError> {
        let resolution = FileResolver::new(ctx.tree)
            .try_resolve_file(&path)
            .map_err(|failure| existing_file_error(failure, &path))?;
        let Some(id) = resolution.existing_file else {
            return Ok(());
        };
        if ctx.tree.node(id).is_read_only() {
            return Err(denied(&path));
        }
        if is_open(ctx, id) {
            return Err(in_use(&path));
        }
        remove_and_notify(ctx, id);
        tracing::debug!(target: TARGET, path = %path, "file deleted");
        Ok(())
    }
}

// ============================================================================
// Move
// ============================================================================

/// Arguments for [`FileMoveHandler`].
pub(crate) struct MoveFile {
    pub(crate) source: AbsolutePath,
    pub(crate) destination: AbsolutePath,
}

/// Moves or renames a file, across volumes if needed.
pub(crate) struct FileMoveHandler;

impl OperationHandler for FileMoveHandler {
    type Arguments = MoveFile;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: MoveFile) -> Result<(), FsError> {
        let MoveFile {
            source,
            destination,
        } = args;
        let id = FileResolver::new(ctx.tree)
            .resolve_existing_file(&source)
            .map_err(|failure| match failure {
                ResolveFailure::NetworkPathNotFound
                | ResolveFailure::DirectoryFoundAsFile
                | ResolveFailure::DirectoryNotFound => failure.into_error(&source),
                _ => FsError::FileNotFound {
                    path: source.get_text(),
                },
            })?;
        if source.components() == destination.components() {
            return Ok(());
        }

        let target = FileResolver::new(ctx.tree)
            .try_resolve_file(&destination)
            .map_err(|failure| match failure {
                ResolveFailure::FileFoundAsDirectory => FsError::CannotCreateFileExists {
                    path: destination.get_text(),
                },
                other => other.into_error(&destination),
            })?;
        let case_only = target.existing_file == Some(id);
        if target.existing_file.is_some() && !case_only {
            return Err(FsError::CannotCreateFileExists {
                path: destination.get_text(),
            });
        }
        if is_open(ctx, id) {
            return Err(in_use(&source));
        }

        let old_path = ctx.tree.path_of(id);
        if case_only {
            ctx.tree.rename_in_place(id, &target.name);
        } else {
            ctx.tree.move_node(id, target.directory, &target.name)?;
        }
        let new_path = ctx.tree.path_of(id);
        tracing::debug!(target: TARGET, from = %old_path, to = %new_path, "file moved");
        ctx.tracker.record_rename(old_path, new_path, EntryKind::File);
        Ok(())
    }
}

// ============================================================================
// Copy
// ============================================================================

/// Arguments for [`FileCopyHandler`].
pub(crate) struct CopyFile {
    pub(crate) source: AbsolutePath,
    pub(crate) destination: AbsolutePath,
    pub(crate) overwrite: bool,
}

/// Copies content, stored attributes and last-write time to a new or
/// existing file.
pub(crate) struct FileCopyHandler;

impl OperationHandler for FileCopyHandler {
    type Arguments = CopyFile;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: CopyFile) -> Result<(), FsError> {
        let CopyFile {
            source,
            destination,
            overwrite,
        } = args;
        let source_id = FileResolver::new(ctx.tree)
            .resolve_existing_file(&source)
            .map_err(|failure| existing_file_error(failure, &source))?;
        if is_open(ctx, source_id) {
            return Err(in_use(&source));
        }

        let target = FileResolver::new(ctx.tree)
            .try_resolve_file(&destination)
            .map_err(|failure| match failure {
                ResolveFailure::FileFoundAsDirectory => FsError::TargetIsDirectory {
                    path: destination.get_text(),
                },
                other => existing_file_error(other, &destination),
            })?;
        if let Some(existing) = target.existing_file {
            if existing == source_id {
                return Err(in_use(&destination));
            }
            if !overwrite {
                return Err(FsError::FileAlreadyExists {
                    path: destination.get_text(),
                });
            }
            let node = ctx.tree.node(existing);
            if node.is_hidden() || node.is_read_only() {
                return Err(denied(&destination));
            }
            if is_open(ctx, existing) {
                return Err(in_use(&destination));
            }
        }

        let source_len = ctx.tree.node(source_id).size();
        let replaced_len = target
            .existing_file
            .map_or(0, |existing| ctx.tree.node(existing).size());
        let free = ctx
            .tree
            .volume_info(target.directory)
            .map_or(0, |info| info.free_space);
        if source_len.saturating_sub(replaced_len) > free {
            return Err(FsError::NotEnoughSpace {
                path: destination.get_text(),
            });
        }

        let (destination_id, created) = match target.existing_file {
            Some(existing) => (existing, false),
            None => {
                let id = ctx.tree.create_file(target.directory, &target.name, ctx.now)?;
                ctx.notify(id, FileAccessKinds::CREATE);
                (id, true)
            }
        };
        copy_content(ctx, source_id, &source, destination_id, &destination)?;

        let (attributes, last_write) = {
            let node = ctx.tree.node(source_id);
            (node.stored_attributes(), node.times.last_write)
        };
        let now = ctx.now;
        let node = ctx.tree.node_mut(destination_id);
        let attributes_changed = node.set_attributes(attributes);
        node.times.last_write = last_write;
        node.times.last_access = now;
        if created {
            node.times.creation = now;
        }
        if attributes_changed {
            ctx.notify(destination_id, FileAccessKinds::ATTRIBUTES);
        }
        tracing::debug!(target: TARGET, from = %source, to = %destination, "file copied");
        Ok(())
    }
}

/// Stream the source's bytes over the destination's content.
fn copy_content(
    ctx: &mut HandlerContext<'_>,
    source_id: NodeId,
    source: &AbsolutePath,
    destination_id: NodeId,
    destination: &AbsolutePath,
) -> Result<(), FsError> {
    let now = ctx.now;
    let mut reader = StreamCore::open(ctx.tree, source_id, source.clone(), FileAccess::Read);
    let mut writer = StreamCore::open(
        ctx.tree,
        destination_id,
        destination.clone(),
        FileAccess::Write,
    );

    let mut outcome = writer.set_len(ctx.tree, 0, now);
    let mut buffer = [0u8; 8192];
    while outcome.is_ok() {
        match reader.read(ctx.tree, &mut buffer, now) {
            Ok(0) => break,
            Ok(count) => {
                outcome = writer.write(ctx.tree, &buffer[..count], now).map(|_| ());
            }
            Err(error) => outcome = Err(error),
        }
    }

    writer.close(ctx.tree, ctx.tracker);
    reader.close(ctx.tree, ctx.tracker);
    outcome
}

// ============================================================================
// Replace
// ============================================================================

/// Arguments for [`FileReplaceHandler`].
pub(crate) struct ReplaceFile {
    pub(crate) source: AbsolutePath,
    pub(crate) destination: AbsolutePath,
    pub(crate) backup: Option<AbsolutePath>,
}

/// Puts the source in the destination's place, keeping the destination's
/// creation time and attributes. The old destination becomes the backup
/// when one is named.
pub(crate) struct FileReplaceHandler;

impl OperationHandler for FileReplaceHandler {
    type Arguments = ReplaceFile;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: ReplaceFile) -> Result<(), FsError> {
        let ReplaceFile {
            source,
            destination,
            backup,
        } = args;
        let mut paths = vec![&source, &destination];
        paths.extend(backup.as_ref());
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                if a.is_equivalent_to(b) {
                    return Err(FsError::InUse);
                }
            }
        }
        if paths.iter().any(|p| !p.is_on_same_volume(&source)) {
            return Err(FsError::UnableToMoveReplacement);
        }

        let resolver = FileResolver::new(ctx.tree);
        let source_id = resolver
            .resolve_existing_file(&source)
            .map_err(|failure| existing_file_error(failure, &source))?;
        let destination_id = resolver
            .resolve_existing_file(&destination)
            .map_err(|failure| existing_file_error(failure, &destination))?;
        let backup_target = backup
            .as_ref()
            .map(|path| {
                resolver
                    .try_resolve_file(path)
                    .map_err(|failure| existing_file_error(failure, path))
            })
            .transpose()?;

        if is_open(ctx, source_id) {
            return Err(in_use(&source));
        }
        if is_open(ctx, destination_id) {
            return Err(in_use(&destination));
        }
        if ctx.tree.node(destination_id).is_read_only() {
            return Err(denied(&destination));
        }
        if let (Some(path), Some(target)) = (&backup, &backup_target) {
            if let Some(existing) = target.existing_file {
                if ctx.tree.node(existing).is_read_only() {
                    return Err(denied(path));
                }
                if is_open(ctx, existing) {
                    return Err(in_use(path));
                }
            }
        }

        let (destination_parent, destination_name, creation, attributes) = {
            let node = ctx.tree.node(destination_id);
            (
                node.parent,
                node.name.clone(),
                node.times.creation,
                node.stored_attributes(),
            )
        };
        let Some(destination_parent) = destination_parent else {
            return Err(denied(&destination));
        };

        match backup_target {
            Some(target) => {
                if let Some(existing) = target.existing_file {
                    remove_and_notify(ctx, existing);
                }
                let old_path = ctx.tree.path_of(destination_id);
                ctx.tree
                    .move_node(destination_id, target.directory, &target.name)?;
                let new_path = ctx.tree.path_of(destination_id);
                ctx.tracker.record_rename(old_path, new_path, EntryKind::File);
            }
            None => remove_and_notify(ctx, destination_id),
        }

        let old_path = ctx.tree.path_of(source_id);
        ctx.tree
            .move_node(source_id, destination_parent, &destination_name)?;
        let node = ctx.tree.node_mut(source_id);
        node.times.creation = creation;
        node.set_attributes(attributes);
        let new_path = ctx.tree.path_of(source_id);
        tracing::debug!(target: TARGET, from = %old_path, to = %new_path, "file replaced");
        ctx.tracker.record_rename(old_path, new_path, EntryKind::File);
        Ok(())
    }
}

// ============================================================================
// Open
// ============================================================================

/// Arguments for [`FileOpenHandler`].
pub(crate) struct OpenFile {
    pub(crate) path: AbsolutePath,
    pub(crate) mode: FileMode,
    pub(crate) access: FileAccess,
}

/// Validates mode and access, applies sharing rules and hands back a
/// registered stream handle.
pub(crate) struct FileOpenHandler;

impl FileOpenHandler {
    fn validate(mode: FileMode, access: FileAccess) -> Result<(), FsError> {
        let writes = matches!(
            mode,
            FileMode::CreateNew | FileMode::Create | FileMode::Truncate | FileMode::Append
        );
        if writes && !access.can_write() {
            return Err(FsError::invalid_argument(format!(
                "Combining FileMode: {mode:?} with FileAccess: {access:?} is invalid."
            )));
        }
        if mode == FileMode::Append && access != FileAccess::Write {
            return Err(FsError::invalid_argument(
                "Append access can be requested only in write-only mode.",
            ));
        }
        Ok(())
    }
}

impl OperationHandler for FileOpenHandler {
    type Arguments = OpenFile;
    type Output = StreamCore;

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: OpenFile) -> Result<StreamCore, FsError> {
        let OpenFile { path, mode, access } = args;
        Self::validate(mode, access)?;

        let target = FileResolver::new(ctx.tree)
            .try_resolve_file(&path)
            .map_err(|failure| existing_file_error(failure, &path))?;

        let Some(id) = target.existing_file else {
            if matches!(mode, FileMode::Open | FileMode::Truncate) {
                return Err(FsError::FileNotFound {
                    path: path.get_text(),
                });
            }
            let id = ctx.tree.create_file(target.directory, &target.name, ctx.now)?;
            ctx.notify(id, FileAccessKinds::CREATE);
            tracing::debug!(target: TARGET, path = %path, ?mode, "file created by open");
            return Ok(StreamCore::open(ctx.tree, id, path, access));
        };

        if mode == FileMode::CreateNew {
            return Err(FsError::FileAlreadyExists {
                path: path.get_text(),
            });
        }
        let node = ctx.tree.node(id);
        if node.is_externally_encrypted()
            || (access.can_write() && node.is_read_only())
            || (mode == FileMode::Create && node.is_hidden())
        {
            return Err(denied(&path));
        }
        if !node.as_file().is_some_and(|file| file.can_open(access)) {
            return Err(in_use(&path));
        }

        let mut core = StreamCore::open(ctx.tree, id, path, access);
        match mode {
            FileMode::Create | FileMode::Truncate if node_len(ctx, id) > 0 => {
                core.set_len(ctx.tree, 0, ctx.now)?;
                core.mark(FileAccessKinds::WRITE);
            }
            FileMode::Append => core.enter_append_mode(ctx.tree)?,
            _ => {}
        }
        Ok(core)
    }
}

fn node_len(ctx: &HandlerContext<'_>, id: NodeId) -> u64 {
    ctx.tree.node(id).size()
}

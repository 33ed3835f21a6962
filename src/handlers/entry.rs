//! Attribute, timestamp and encryption changes on either kind of entry.

use std::time::SystemTime;

use crate::resolve::EntryResolver;
use crate::tree::{EncryptionState, NodeId};
use crate::watcher::FileAccessKinds;
use crate::{win32_epoch, AbsolutePath, FileAttributes, FsError, TimeKind};

use super::{HandlerContext, OperationHandler, TARGET};

fn resolve(ctx: &HandlerContext<'_>, path: &AbsolutePath) -> Result<NodeId, FsError> {
    EntryResolver::new(ctx.tree)
        .resolve_entry(path)
        .map(|(id, _)| id)
        .map_err(|failure| failure.into_error(path))
}

fn denied(path: &AbsolutePath) -> FsError {
    FsError::UnauthorizedAccess {
        path: path.get_text(),
    }
}

/// Arguments for [`EntrySetAttributesHandler`].
pub(crate) struct SetAttributes {
    pub(crate) path: AbsolutePath,
    pub(crate) attributes: FileAttributes,
}

/// Stores attributes, filtered to what the entry kind can hold.
pub(crate) struct EntrySetAttributesHandler;

impl OperationHandler for EntrySetAttributesHandler {
    type Arguments = SetAttributes;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: SetAttributes) -> Result<(), FsError> {
        let path = &args.path;
        if path.is_volume_root() && !path.is_on_local_drive() {
            return Err(FsError::InvalidPath {
                path: path.get_text(),
            });
        }
        let id = resolve(ctx, path)?;
        let node = ctx.tree.node(id);
        if node.is_externally_encrypted() {
            return Err(denied(path));
        }
        if node.as_file().is_some_and(|file| file.is_open_for_write()) {
            return Err(FsError::FileInUse {
                path: path.get_text(),
            });
        }

        if ctx.tree.node_mut(id).set_attributes(args.attributes) {
            ctx.notify(id, FileAccessKinds::ATTRIBUTES);
        }
        Ok(())
    }
}

/// Arguments for [`EntrySetTimeHandler`].
pub(crate) struct SetTime {
    pub(crate) path: AbsolutePath,
    pub(crate) kind: TimeKind,
    pub(crate) value: SystemTime,
}

/// Stores one of the three timestamps.
pub(crate) struct EntrySetTimeHandler;

impl OperationHandler for EntrySetTimeHandler {
    type Arguments = SetTime;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: SetTime) -> Result<(), FsError> {
        let path = &args.path;
        if path.is_volume_root() {
            return Err(FsError::PathIsDrive {
                path: path.get_text(),
            });
        }
        if args.value < win32_epoch() {
            return Err(FsError::InvalidFileTime);
        }
        let id = resolve(ctx, path)?;
        let node = ctx.tree.node(id);
        if let Some(file) = node.as_file() {
            if node.is_read_only() || node.is_externally_encrypted() {
                return Err(denied(path));
            }
            if file.is_open() {
                return Err(FsError::FileInUse {
                    path: path.get_text(),
                });
            }
        }
        if node.times.get(args.kind) == args.value {
            return Ok(());
        }

        ctx.tree.node_mut(id).times.set(args.kind, args.value);
        let access = match args.kind {
            TimeKind::Creation => FileAccessKinds::CREATION_TIME,
            TimeKind::LastWrite => FileAccessKinds::LAST_WRITE_TIME,
            TimeKind::LastAccess => FileAccessKinds::LAST_ACCESS_TIME,
        };
        ctx.notify(id, access);
        Ok(())
    }
}

/// Arguments for [`EntryCryptoHandler`].
pub(crate) struct SetEncryption {
    pub(crate) path: AbsolutePath,
    pub(crate) encrypt: bool,
}

/// Encrypts or decrypts a file or directory on an NTFS volume.
pub(crate) struct EntryCryptoHandler;

impl OperationHandler for EntryCryptoHandler {
    type Arguments = SetEncryption;
    type Output = ();

    fn handle(&self, ctx: &mut HandlerContext<'_>, args: SetEncryption) -> Result<(), FsError> {
        let path = &args.path;
        let id = resolve(ctx, path)?;
        if !ctx
            .tree
            .volume_info(id)
            .is_some_and(|info| info.supports_encryption())
        {
            return Err(FsError::EncryptionNotSupported {
                path: path.get_text(),
            });
        }
        let node = ctx.tree.node(id);
        // Another user's encryption can only be removed, never replaced.
        let foreign = node.is_externally_encrypted() && args.encrypt;
        if node.is_volume_root() || foreign || node.is_read_only() {
            return Err(denied(path));
        }
        if node.as_file().is_some_and(|file| file.is_open()) {
            return Err(FsError::FileInUse {
                path: path.get_text(),
            });
        }

        let state = if args.encrypt {
            EncryptionState::Encrypted
        } else {
            EncryptionState::None
        };
        if node.encryption == state {
            return Ok(());
        }
        ctx.tree.node_mut(id).encryption = state;
        ctx.notify(id, FileAccessKinds::ATTRIBUTES);
        tracing::debug!(target: TARGET, path = %path, encrypted = args.encrypt, "encryption changed");
        Ok(())
    }
}

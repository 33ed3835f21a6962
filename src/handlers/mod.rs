//! # Operation Handlers
//!
//! One handler per mutating operation. Every handler follows the same shape:
//! validate arguments, resolve paths, check tree invariants, mutate, and
//! finally publish change records. Nothing is mutated before the last check
//! passes, so a failed operation leaves the tree untouched (recursive delete
//! is the one exception; it deletes what it can and reports the first
//! failure).
//!
//! | Handler | Operation |
//! |---------|-----------|
//! | [`DirectoryCreateHandler`] | create a directory and missing ancestors |
//! | [`DirectoryDeleteHandler`] | delete a directory, optionally recursive |
//! | [`DirectoryMoveHandler`] | move or rename a directory |
//! | [`FileDeleteHandler`] | delete a file |
//! | [`FileMoveHandler`] | move or rename a file |
//! | [`FileCopyHandler`] | copy a file |
//! | [`FileReplaceHandler`] | replace a file, optionally keeping a backup |
//! | [`FileOpenHandler`] | open a stream |
//! | [`EntrySetAttributesHandler`] | store attributes |
//! | [`EntrySetTimeHandler`] | store a timestamp |
//! | [`EntryCryptoHandler`] | encrypt or decrypt |

mod directory;
mod entry;
mod file;

use std::time::SystemTime;

use crate::tree::{EntryTree, NodeId};
use crate::watcher::{ChangeTracker, FileAccessKinds};
use crate::{AbsolutePath, FsError};

pub(crate) use directory::{
    DeleteDirectory, DirectoryCreateHandler, DirectoryDeleteHandler, DirectoryMoveHandler,
    MoveDirectory,
};
pub(crate) use entry::{
    EntryCryptoHandler, EntrySetAttributesHandler, EntrySetTimeHandler, SetAttributes,
    SetEncryption, SetTime,
};
pub(crate) use file::{
    CopyFile, FileCopyHandler, FileDeleteHandler, FileMoveHandler, FileOpenHandler,
    FileReplaceHandler, MoveFile, OpenFile, ReplaceFile,
};

const TARGET: &str = "anyfs_fakes::handlers";

/// Everything a handler may touch while the filesystem lock is held.
pub(crate) struct HandlerContext<'a> {
    pub(crate) tree: &'a mut EntryTree,
    pub(crate) current_directory: &'a AbsolutePath,
    pub(crate) tracker: &'a ChangeTracker,
    pub(crate) now: SystemTime,
}

impl HandlerContext<'_> {
    /// Publish a change for an existing node at its current location.
    pub(crate) fn notify(&self, id: NodeId, access: FileAccessKinds) {
        let kind = self.tree.node(id).kind();
        self.tracker.record_change(self.tree.path_of(id), kind, access);
    }

    /// `true` if `id` is the current directory or one of its ancestors.
    pub(crate) fn contains_current_directory(&self, id: NodeId) -> bool {
        self.tree
            .try_get_existing_directory(self.current_directory)
            .is_some_and(|current| self.tree.is_same_or_ancestor(id, current))
    }
}

/// A single validated, atomic operation on the tree.
pub(crate) trait OperationHandler {
    type Arguments;
    type Output;

    /// # Errors
    ///
    /// The operation's own error vocabulary; see the handler docs.
    fn handle(
        &self,
        ctx: &mut HandlerContext<'_>,
        arguments: Self::Arguments,
    ) -> Result<Self::Output, FsError>;
}

//! File payload: content bytes and open-handle bookkeeping.

use crate::FileAccess;

/// Content and sharing state of a file node.
///
/// A writer is exclusive; readers share.
#[derive(Debug, Default)]
pub(crate) struct FileData {
    pub(crate) content: Vec<u8>,
    readers: usize,
    has_writer: bool,
}

impl FileData {
    pub(crate) fn len(&self) -> u64 {
        self.content.len() as u64
    }

    pub(crate) fn is_open(&self) -> bool {
        self.has_writer || self.readers > 0
    }

    pub(crate) fn is_open_for_write(&self) -> bool {
        self.has_writer
    }

    /// `true` if a new handle with `access` would not conflict.
    pub(crate) fn can_open(&self, access: FileAccess) -> bool {
        if access.can_write() {
            !self.is_open()
        } else {
            !self.has_writer
        }
    }

    pub(crate) fn register_handle(&mut self, access: FileAccess) {
        if access.can_write() {
            self.has_writer = true;
        } else {
            self.readers += 1;
        }
    }

    pub(crate) fn release_handle(&mut self, access: FileAccess) {
        if access.can_write() {
            self.has_writer = false;
        } else {
            self.readers = self.readers.saturating_sub(1);
        }
    }
}

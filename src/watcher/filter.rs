//! Change categories: what a watcher subscribes to and what a record carries.

use std::ops::{BitOr, BitOrAssign};

use crate::EntryKind;

/// Categories of change a watcher reports, using the platform's bit values.
///
/// ```rust
/// use anyfs_fakes::NotifyFilters;
///
/// let filter = NotifyFilters::FILE_NAME | NotifyFilters::SIZE;
/// assert_eq!(filter.bits(), 0x9);
/// assert!(NotifyFilters::default().contains(NotifyFilters::LAST_WRITE));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NotifyFilters(u32);

impl NotifyFilters {
    /// Nothing.
    pub const NONE: Self = Self(0);
    /// File creation, deletion and renames.
    pub const FILE_NAME: Self = Self(0x1);
    /// Directory creation, deletion and renames.
    pub const DIRECTORY_NAME: Self = Self(0x2);
    /// Attribute changes.
    pub const ATTRIBUTES: Self = Self(0x4);
    /// File size changes.
    pub const SIZE: Self = Self(0x8);
    /// Last-write time changes.
    pub const LAST_WRITE: Self = Self(0x10);
    /// Last-access time changes.
    pub const LAST_ACCESS: Self = Self(0x20);
    /// Creation time changes.
    pub const CREATION_TIME: Self = Self(0x40);
    /// Security descriptor changes.
    pub const SECURITY: Self = Self(0x100);
    /// Every category.
    pub const ALL: Self = Self(0x17F);

    /// Create from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set.
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for NotifyFilters {
    /// File names, directory names and last-write times.
    fn default() -> Self {
        Self::FILE_NAME | Self::DIRECTORY_NAME | Self::LAST_WRITE
    }
}

impl BitOr for NotifyFilters {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for NotifyFilters {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// What happened to an entry, as recorded by the change tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct FileAccessKinds(u32);

impl FileAccessKinds {
    pub(crate) const NONE: Self = Self(0);
    pub(crate) const CREATE: Self = Self(0x1);
    pub(crate) const READ: Self = Self(0x2);
    pub(crate) const WRITE: Self = Self(0x4);
    pub(crate) const RESIZE: Self = Self(0x8);
    pub(crate) const DELETE: Self = Self(0x10);
    pub(crate) const RENAME_OLD: Self = Self(0x20);
    pub(crate) const RENAME_NEW: Self = Self(0x40);
    pub(crate) const ATTRIBUTES: Self = Self(0x80);
    pub(crate) const LAST_WRITE_TIME: Self = Self(0x100);
    pub(crate) const LAST_ACCESS_TIME: Self = Self(0x200);
    pub(crate) const CREATION_TIME: Self = Self(0x400);
    pub(crate) const SECURITY: Self = Self(0x800);

    pub(crate) const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub(crate) const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub(crate) const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Watcher categories this access touches for an entry of `kind`.
    pub(crate) fn notify_filters(self, kind: EntryKind) -> NotifyFilters {
        let mut filters = NotifyFilters::NONE;
        if self.intersects(
            Self::CREATE | Self::DELETE | Self::RENAME_OLD | Self::RENAME_NEW,
        ) {
            filters |= match kind {
                EntryKind::File => NotifyFilters::FILE_NAME,
                EntryKind::Directory => NotifyFilters::DIRECTORY_NAME,
            };
        }
        let mapping = [
            (Self::WRITE, NotifyFilters::LAST_WRITE),
            (Self::RESIZE, NotifyFilters::SIZE | NotifyFilters::LAST_WRITE),
            (Self::READ, NotifyFilters::LAST_ACCESS),
            (Self::ATTRIBUTES, NotifyFilters::ATTRIBUTES),
            (Self::LAST_WRITE_TIME, NotifyFilters::LAST_WRITE),
            (Self::LAST_ACCESS_TIME, NotifyFilters::LAST_ACCESS),
            (Self::CREATION_TIME, NotifyFilters::CREATION_TIME),
            (Self::SECURITY, NotifyFilters::SECURITY),
        ];
        for (access, filter) in mapping {
            if self.intersects(access) {
                filters |= filter;
            }
        }
        filters
    }
}

impl BitOr for FileAccessKinds {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FileAccessKinds {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

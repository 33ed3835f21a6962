//! Events a watcher raises and the results of blocking waits.

use std::ops::BitOr;
use std::time::Duration;

use crate::FsError;

/// Kinds of change, as a bitmask so waits can ask for several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatcherChangeTypes(u32);

impl WatcherChangeTypes {
    /// Entry created.
    pub const CREATED: Self = Self(0x1);
    /// Entry deleted.
    pub const DELETED: Self = Self(0x2);
    /// Entry content, attributes or times changed.
    pub const CHANGED: Self = Self(0x4);
    /// Entry renamed within its directory.
    pub const RENAMED: Self = Self(0x8);
    /// Any change.
    pub const ALL: Self = Self(0xF);

    /// Raw bits.
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if any bit of `other` is set.
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Returns `true` if no bit is set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub(crate) const fn empty() -> Self {
        Self(0)
    }
}

impl BitOr for WatcherChangeTypes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Payload of a created, deleted or changed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemEventArgs {
    /// The watched directory joined with [`name`](Self::name).
    pub full_path: String,
    /// Path relative to the watched directory.
    pub name: String,
}

/// Payload of a renamed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamedEventArgs {
    /// New full path.
    pub full_path: String,
    /// New path relative to the watched directory.
    pub name: String,
    /// Previous full path.
    pub old_full_path: String,
    /// Previous path relative to the watched directory.
    pub old_name: String,
}

/// A notification delivered to watcher listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherEvent {
    /// An entry appeared.
    Created(FileSystemEventArgs),
    /// An entry disappeared.
    Deleted(FileSystemEventArgs),
    /// Content, size, attributes or timestamps changed.
    Changed(FileSystemEventArgs),
    /// An entry was renamed within the same directory.
    Renamed(RenamedEventArgs),
    /// The watcher lost notifications or stopped.
    Error(FsError),
}

impl WatcherEvent {
    /// The change type, or `None` for [`WatcherEvent::Error`].
    pub fn change_type(&self) -> Option<WatcherChangeTypes> {
        match self {
            WatcherEvent::Created(_) => Some(WatcherChangeTypes::CREATED),
            WatcherEvent::Deleted(_) => Some(WatcherChangeTypes::DELETED),
            WatcherEvent::Changed(_) => Some(WatcherChangeTypes::CHANGED),
            WatcherEvent::Renamed(_) => Some(WatcherChangeTypes::RENAMED),
            WatcherEvent::Error(_) => None,
        }
    }
}

/// How long a blocking wait may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTimeout {
    /// Wait until a matching change arrives.
    Infinite,
    /// Give up after the duration. Zero is rejected.
    After(Duration),
}

/// Outcome of [`FsWatcher::wait_for_changed`](crate::FsWatcher::wait_for_changed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitForChangedResult {
    /// Type of the observed change; empty on timeout.
    pub change_type: WatcherChangeTypes,
    /// Relative name of the changed entry.
    pub name: Option<String>,
    /// Previous relative name, for renames.
    pub old_name: Option<String>,
    /// `true` if the wait ended without a matching change.
    pub timed_out: bool,
}

impl WaitForChangedResult {
    pub(crate) fn timed_out() -> Self {
        Self {
            change_type: WatcherChangeTypes::empty(),
            name: None,
            old_name: None,
            timed_out: true,
        }
    }

    /// The result a waiter sees for `event`, if it is a change.
    pub(crate) fn from_event(event: &WatcherEvent) -> Option<Self> {
        let change_type = event.change_type()?;
        let (name, old_name) = match event {
            WatcherEvent::Created(args) | WatcherEvent::Deleted(args) | WatcherEvent::Changed(args) => {
                (args.name.clone(), None)
            }
            WatcherEvent::Renamed(args) => (args.name.clone(), Some(args.old_name.clone())),
            WatcherEvent::Error(_) => return None,
        };
        Some(Self {
            change_type,
            name: Some(name),
            old_name,
            timed_out: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str) -> FileSystemEventArgs {
        FileSystemEventArgs {
            full_path: format!(r"C:\w\{name}"),
            name: name.into(),
        }
    }

    #[test]
    fn change_types_combine() {
        let types = WatcherChangeTypes::CREATED | WatcherChangeTypes::DELETED;
        assert!(types.intersects(WatcherChangeTypes::DELETED));
        assert!(!types.intersects(WatcherChangeTypes::RENAMED));
        assert_eq!(WatcherChangeTypes::ALL.bits(), 15);
    }

    #[test]
    fn wait_result_from_rename_carries_old_name() {
        let event = WatcherEvent::Renamed(RenamedEventArgs {
            full_path: r"C:\w\new".into(),
            name: "new".into(),
            old_full_path: r"C:\w\old".into(),
            old_name: "old".into(),
        });
        let result = WaitForChangedResult::from_event(&event).unwrap();
        assert_eq!(result.change_type, WatcherChangeTypes::RENAMED);
        assert_eq!(result.old_name.as_deref(), Some("old"));
        assert!(!result.timed_out);
    }

    #[test]
    fn error_events_produce_no_wait_result() {
        let event = WatcherEvent::Error(FsError::AccessDenied);
        assert_eq!(event.change_type(), None);
        assert_eq!(WaitForChangedResult::from_event(&event), None);
        assert!(WaitForChangedResult::from_event(&WatcherEvent::Created(args("a"))).is_some());
    }

    #[test]
    fn timed_out_result_is_empty() {
        let result = WaitForChangedResult::timed_out();
        assert!(result.timed_out);
        assert!(result.change_type.is_empty());
        assert_eq!(result.name, None);
    }
}

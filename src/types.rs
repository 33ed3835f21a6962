//! Core value types shared by the emulation and its callers.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};
use std::time::{Duration, SystemTime};

/// Seconds between 1601-01-01 and 1970-01-01.
const SECONDS_FROM_WIN32_EPOCH_TO_UNIX_EPOCH: u64 = 11_644_473_600;

/// The earliest timestamp a Win32 file can carry (1601-01-01 00:00:00 UTC).
///
/// Timestamp getters return this value for entries that do not exist, and
/// setters reject anything earlier.
pub fn win32_epoch() -> SystemTime {
    SystemTime::UNIX_EPOCH
        .checked_sub(Duration::from_secs(SECONDS_FROM_WIN32_EPOCH_TO_UNIX_EPOCH))
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

/// Attribute bitmask using the platform's numeric bit assignment.
///
/// # Examples
///
/// ```rust
/// use anyfs_fakes::FileAttributes;
///
/// let attrs = FileAttributes::READ_ONLY | FileAttributes::HIDDEN;
/// assert_eq!(attrs.bits(), 0x3);
/// assert!(attrs.contains(FileAttributes::HIDDEN));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileAttributes(u32);

impl FileAttributes {
    /// No attributes.
    pub const EMPTY: Self = Self(0);
    /// Read-only.
    pub const READ_ONLY: Self = Self(0x1);
    /// Hidden.
    pub const HIDDEN: Self = Self(0x2);
    /// System.
    pub const SYSTEM: Self = Self(0x4);
    /// Directory.
    pub const DIRECTORY: Self = Self(0x10);
    /// Archive.
    pub const ARCHIVE: Self = Self(0x20);
    /// Device (never stored).
    pub const DEVICE: Self = Self(0x40);
    /// Normal: reported for files that carry no other attribute.
    pub const NORMAL: Self = Self(0x80);
    /// Temporary (files only).
    pub const TEMPORARY: Self = Self(0x100);
    /// Sparse file.
    pub const SPARSE_FILE: Self = Self(0x200);
    /// Reparse point.
    pub const REPARSE_POINT: Self = Self(0x400);
    /// Compressed.
    pub const COMPRESSED: Self = Self(0x800);
    /// Offline.
    pub const OFFLINE: Self = Self(0x1000);
    /// Not content indexed.
    pub const NOT_CONTENT_INDEXED: Self = Self(0x2000);
    /// Encrypted (derived from the entry's encryption state).
    pub const ENCRYPTED: Self = Self(0x4000);
    /// Integrity stream.
    pub const INTEGRITY_STREAM: Self = Self(0x8000);
    /// No scrub data.
    pub const NO_SCRUB_DATA: Self = Self(0x20000);

    const NAMES: [(Self, &'static str); 16] = [
        (Self::READ_ONLY, "ReadOnly"),
        (Self::HIDDEN, "Hidden"),
        (Self::SYSTEM, "System"),
        (Self::DIRECTORY, "Directory"),
        (Self::ARCHIVE, "Archive"),
        (Self::DEVICE, "Device"),
        (Self::NORMAL, "Normal"),
        (Self::TEMPORARY, "Temporary"),
        (Self::SPARSE_FILE, "SparseFile"),
        (Self::REPARSE_POINT, "ReparsePoint"),
        (Self::COMPRESSED, "Compressed"),
        (Self::OFFLINE, "Offline"),
        (Self::NOT_CONTENT_INDEXED, "NotContentIndexed"),
        (Self::ENCRYPTED, "Encrypted"),
        (Self::INTEGRITY_STREAM, "IntegrityStream"),
        (Self::NO_SCRUB_DATA, "NoScrubData"),
    ];

    /// Create from raw platform bits.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw platform bits.
    #[inline]
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Returns `true` if no bit is set.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if any bit of `other` is set.
    #[inline]
    pub const fn intersects(&self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Bits of `self` that are not in `other`.
    #[inline]
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for FileAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FileAttributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FileAttributes {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for FileAttributes {
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for FileAttributes {
    type Output = Self;

    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for FileAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("FileAttributes(0)");
        }
        let names: Vec<&str> = Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect();
        write!(f, "FileAttributes({})", names.join(" | "))
    }
}

/// Kind of an entry in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory (including volume roots).
    Directory,
}

/// Metadata for a file or directory.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntryMetadata {
    /// Full path of the entry, using the casing it was created with.
    pub full_name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Attributes as reported by the platform.
    pub attributes: FileAttributes,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Creation time (UTC).
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub creation_time_utc: SystemTime,
    /// Last write time (UTC).
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub last_write_time_utc: SystemTime,
    /// Last access time (UTC).
    #[cfg_attr(feature = "serde", serde(with = "system_time_serde"))]
    pub last_access_time_utc: SystemTime,
}

impl EntryMetadata {
    /// Returns `true` if this is a file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Which timestamp an operation reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeKind {
    /// Creation time.
    Creation,
    /// Last write time.
    LastWrite,
    /// Last access time.
    LastAccess,
}

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileMode {
    /// Create a new file; fail if it exists.
    CreateNew,
    /// Create a new file or truncate an existing one.
    Create,
    /// Open an existing file.
    Open,
    /// Open the file if it exists, otherwise create it.
    OpenOrCreate,
    /// Open an existing file and truncate it to zero bytes.
    Truncate,
    /// Open or create, positioned at the end; write-only.
    Append,
}

/// Access requested on an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAccess {
    /// Read only (shared).
    Read,
    /// Write only (exclusive).
    Write,
    /// Read and write (exclusive).
    ReadWrite,
}

impl FileAccess {
    /// Returns `true` if reading is permitted.
    #[inline]
    pub fn can_read(self) -> bool {
        matches!(self, FileAccess::Read | FileAccess::ReadWrite)
    }

    /// Returns `true` if writing is permitted.
    #[inline]
    pub fn can_write(self) -> bool {
        matches!(self, FileAccess::Write | FileAccess::ReadWrite)
    }
}

/// Whether enumeration descends into subdirectories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchOption {
    /// Only the directory the pattern lands on.
    #[default]
    TopDirectoryOnly,
    /// The landing directory and all of its descendants.
    AllDirectories,
}

/// What kind of entries an enumeration yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnumerationKind {
    /// Files only.
    Files,
    /// Directories only.
    Directories,
    /// Files and directories.
    All,
}

/// Type of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriveType {
    /// Local fixed disk.
    Fixed,
    /// Removable media.
    Removable,
    /// Network share.
    Network,
    /// Optical drive.
    CdRom,
    /// RAM disk.
    Ram,
}

/// Capacity and format metadata for a volume.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeInfo {
    /// Filesystem format, e.g. `NTFS` or `FAT32`.
    pub format: String,
    /// Volume type.
    pub drive_type: DriveType,
    /// Volume label.
    pub label: String,
    /// Total size in bytes.
    pub capacity: u64,
    /// Bytes still available for file content.
    pub free_space: u64,
}

impl VolumeInfo {
    /// A fixed NTFS disk of the given capacity, completely free.
    pub fn ntfs(capacity: u64) -> Self {
        Self {
            format: "NTFS".into(),
            drive_type: DriveType::Fixed,
            label: String::new(),
            capacity,
            free_space: capacity,
        }
    }

    /// Returns `true` if the format supports file encryption.
    pub fn supports_encryption(&self) -> bool {
        self.format.eq_ignore_ascii_case("NTFS")
    }
}

impl Default for VolumeInfo {
    fn default() -> Self {
        Self::ntfs(1 << 40)
    }
}

/// A volume as reported by drive enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DriveInfo {
    /// Root path, e.g. `C:\` or `\\server\share\`.
    pub name: String,
    /// Volume metadata.
    pub info: VolumeInfo,
}

/// Serde support for `SystemTime` values that may precede 1970.
#[cfg(feature = "serde")]
mod system_time_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(time: &SystemTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let (secs, nanos) = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => (after.as_secs() as i64, after.subsec_nanos()),
            Err(before) => {
                let before = before.duration();
                (-(before.as_secs() as i64), before.subsec_nanos())
            }
        };
        (secs, nanos).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<SystemTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (secs, nanos): (i64, u32) = Deserialize::deserialize(deserializer)?;
        let magnitude = Duration::new(secs.unsigned_abs(), nanos);
        let time = if secs < 0 {
            UNIX_EPOCH.checked_sub(magnitude)
        } else {
            UNIX_EPOCH.checked_add(magnitude)
        };
        time.ok_or_else(|| serde::de::Error::custom("timestamp out of range"))
    }
}

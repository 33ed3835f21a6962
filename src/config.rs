//! Construction-time options for [`FakeFileSystem`](crate::FakeFileSystem).

use crate::{DriveType, VolumeInfo};

/// A volume to mount when the filesystem is created.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VolumeSpec {
    /// Drive (`D:`) or share (`\\server\share`) name.
    pub name: String,
    /// Format, type, label and sizes.
    pub info: VolumeInfo,
}

impl VolumeSpec {
    /// A volume with the given name and metadata.
    pub fn new(name: impl Into<String>, info: VolumeInfo) -> Self {
        Self {
            name: name.into(),
            info,
        }
    }

    /// A network share with default capacity.
    pub fn network_share(name: impl Into<String>) -> Self {
        Self::new(
            name,
            VolumeInfo {
                drive_type: DriveType::Network,
                ..VolumeInfo::default()
            },
        )
    }
}

/// Options for building a [`FakeFileSystem`](crate::FakeFileSystem).
///
/// The default mounts a single 1 TiB NTFS fixed disk `C:` and starts in `C:\`.
///
/// ```rust
/// use anyfs_fakes::{FakeFileSystemOptions, VolumeInfo, VolumeSpec};
///
/// let mut options = FakeFileSystemOptions::default();
/// options.volumes.push(VolumeSpec::new("D:", VolumeInfo::ntfs(1024)));
/// options.current_directory = r"D:\".into();
/// assert_eq!(options.volumes.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FakeFileSystemOptions {
    /// Volumes mounted at construction.
    pub volumes: Vec<VolumeSpec>,
    /// Initial current directory; must be an existing volume root or directory.
    pub current_directory: String,
}

impl Default for FakeFileSystemOptions {
    fn default() -> Self {
        Self {
            volumes: vec![VolumeSpec::new("C:", VolumeInfo::default())],
            current_directory: r"C:\".into(),
        }
    }
}

//! The validated, normalized absolute path value type.

use std::fmt;
use std::str::FromStr;

use crate::FsError;

/// Separator used in rendered paths.
pub const SEPARATOR: char = '\\';

/// A validated, normalized absolute path.
///
/// The first component is always the volume name (`C:` or `\\server\share`);
/// the remaining components never contain `.` or `..`. Components keep the
/// casing the caller supplied, so [`get_text`](Self::get_text) round-trips it.
/// Drive letters are upper-cased during parsing.
///
/// # Examples
///
/// ```rust
/// use anyfs_fakes::AbsolutePath;
///
/// let path: AbsolutePath = r"c:\Data\.\logs\..\app.log".parse().unwrap();
/// assert_eq!(path.get_text(), r"C:\Data\app.log");
/// assert_eq!(path.volume_name(), "C:");
/// assert_eq!(path.name(), "app.log");
/// assert!(path.is_on_local_drive());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AbsolutePath {
    components: Vec<String>,
    is_extended: bool,
}

impl AbsolutePath {
    /// Assemble from already-validated parts.
    pub(crate) fn from_parts(components: Vec<String>, is_extended: bool) -> Self {
        debug_assert!(!components.is_empty(), "volume name is required");
        Self {
            components,
            is_extended,
        }
    }

    /// Parse and normalize an absolute path.
    ///
    /// # Errors
    ///
    /// See [`parse_path`](crate::parse_path) for the full list of rejected forms.
    pub fn parse(text: &str) -> Result<Self, FsError> {
        super::parse(text)
    }

    /// The volume name: `C:` or `\\server\share`.
    pub fn volume_name(&self) -> &str {
        &self.components[0]
    }

    /// All components, starting with the volume name.
    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// The last component (the volume name for a volume root).
    pub fn name(&self) -> &str {
        self.components
            .last()
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Number of components below the volume root.
    pub fn depth(&self) -> usize {
        self.components.len() - 1
    }

    /// `true` for drive-letter volumes, `false` for network shares.
    pub fn is_on_local_drive(&self) -> bool {
        let volume = self.volume_name().as_bytes();
        volume.len() == 2 && volume[1] == b':'
    }

    /// `true` if the path has no components below the volume.
    pub fn is_volume_root(&self) -> bool {
        self.components.len() == 1
    }

    /// `true` if the caller used the `\\?\` prefix.
    pub fn is_extended(&self) -> bool {
        self.is_extended
    }

    /// A new path with `name` appended as the last component.
    pub fn append(&self, name: &str) -> Self {
        let mut components = self.components.clone();
        components.push(name.to_string());
        Self {
            components,
            is_extended: self.is_extended,
        }
    }

    /// The containing directory, or `None` for a volume root.
    pub fn try_get_parent_path(&self) -> Option<Self> {
        if self.is_volume_root() {
            return None;
        }
        Some(self.get_ancestor_path(self.depth() - 1))
    }

    /// The ancestor at `depth` components below the volume (0 = volume root).
    ///
    /// A `depth` at or beyond this path's own depth returns the path itself.
    pub fn get_ancestor_path(&self, depth: usize) -> Self {
        let end = (depth + 1).min(self.components.len());
        Self {
            components: self.components[..end].to_vec(),
            is_extended: self.is_extended,
        }
    }

    /// Case-insensitive equality of all components.
    pub fn is_equivalent_to(&self, other: &AbsolutePath) -> bool {
        self.components.len() == other.components.len() && self.starts_with(other)
    }

    /// `true` if `self` lies strictly below `ancestor`.
    pub fn is_descendant_of(&self, ancestor: &AbsolutePath) -> bool {
        self.components.len() > ancestor.components.len() && self.starts_with(ancestor)
    }

    /// `true` if both paths live on the same volume.
    pub fn is_on_same_volume(&self, other: &AbsolutePath) -> bool {
        names_equal(self.volume_name(), other.volume_name())
    }

    /// Components of `self` below `ancestor`, joined with the separator.
    ///
    /// Returns `None` unless `self` equals or descends from `ancestor`.
    pub fn relative_to(&self, ancestor: &AbsolutePath) -> Option<String> {
        if !self.starts_with(ancestor) {
            return None;
        }
        let rest = &self.components[ancestor.components.len()..];
        Some(rest.join("\\"))
    }

    /// Render the path using the caller's casing and prefix style.
    pub fn get_text(&self) -> String {
        let volume = self.volume_name();
        let is_unc = !self.is_on_local_drive();
        let mut text = String::new();

        if self.is_extended {
            text.push_str(r"\\?\");
            if is_unc {
                text.push_str("UNC\\");
                text.push_str(&volume[2..]);
            } else {
                text.push_str(volume);
            }
        } else {
            text.push_str(volume);
        }

        if self.is_volume_root() {
            if !is_unc {
                text.push(SEPARATOR);
            }
            return text;
        }

        for component in &self.components[1..] {
            text.push(SEPARATOR);
            text.push_str(component);
        }
        text
    }

    fn starts_with(&self, prefix: &AbsolutePath) -> bool {
        self.components.len() >= prefix.components.len()
            && self
                .components
                .iter()
                .zip(&prefix.components)
                .all(|(a, b)| names_equal(a, b))
    }
}

impl fmt::Display for AbsolutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.get_text())
    }
}

impl FromStr for AbsolutePath {
    type Err = FsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Case-insensitive name comparison used throughout the tree.
pub(crate) fn names_equal(a: &str, b: &str) -> bool {
    a.len() == b.len() && a.eq_ignore_ascii_case(b) || name_key(a) == name_key(b)
}

/// The key under which a name is stored in case-insensitive maps.
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

//! Step-wise cursor over the components of an [`AbsolutePath`].

use super::AbsolutePath;

/// A cursor that walks an [`AbsolutePath`] one component at a time.
///
/// The cursor starts on the volume name. At any point the consumed prefix
/// ([`path_up_to_here`](Self::path_up_to_here)) and the unconsumed tail
/// ([`remaining`](Self::remaining)) can be inspected independently.
///
/// ```rust
/// use anyfs_fakes::{AbsolutePath, PathNavigator};
///
/// let path = AbsolutePath::parse(r"C:\a\b").unwrap();
/// let mut nav = PathNavigator::new(&path);
/// assert_eq!(nav.current(), "C:");
/// assert!(nav.move_next());
/// assert_eq!(nav.current(), "a");
/// assert_eq!(nav.path_up_to_here().get_text(), r"C:\a");
/// assert_eq!(nav.remaining(), ["b"]);
/// ```
#[derive(Debug, Clone)]
pub struct PathNavigator<'p> {
    path: &'p AbsolutePath,
    index: usize,
}

impl<'p> PathNavigator<'p> {
    /// A cursor positioned on the volume name.
    pub fn new(path: &'p AbsolutePath) -> Self {
        Self { path, index: 0 }
    }

    /// The path being walked.
    pub fn path(&self) -> &'p AbsolutePath {
        self.path
    }

    /// The component under the cursor.
    pub fn current(&self) -> &'p str {
        &self.path.components()[self.index]
    }

    /// Zero-based position (0 = volume name).
    pub fn index(&self) -> usize {
        self.index
    }

    /// `true` while on the volume name.
    pub fn is_at_start(&self) -> bool {
        self.index == 0
    }

    /// `true` when the cursor is on the last component.
    pub fn is_at_end(&self) -> bool {
        self.index + 1 == self.path.components().len()
    }

    /// Advance one component. Returns `false` (and stays put) at the end.
    pub fn move_next(&mut self) -> bool {
        if self.is_at_end() {
            return false;
        }
        self.index += 1;
        true
    }

    /// The path consumed so far, including the current component.
    pub fn path_up_to_here(&self) -> AbsolutePath {
        self.path.get_ancestor_path(self.index)
    }

    /// Components after the current one.
    pub fn remaining(&self) -> &'p [String] {
        &self.path.components()[self.index + 1..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigator_walks_every_component() {
        let path = AbsolutePath::parse(r"\\server\share\x\y").unwrap();
        let mut nav = PathNavigator::new(&path);
        let mut seen = vec![nav.current().to_string()];
        while nav.move_next() {
            seen.push(nav.current().to_string());
        }
        assert_eq!(seen, [r"\\server\share", "x", "y"]);
        assert!(nav.is_at_end());
        assert!(!nav.move_next());
        assert_eq!(nav.current(), "y");
    }

    #[test]
    fn navigator_tracks_consumed_and_remaining() {
        let path = AbsolutePath::parse(r"C:\one\two\three").unwrap();
        let mut nav = PathNavigator::new(&path);
        assert!(nav.is_at_start());
        assert_eq!(nav.path_up_to_here().get_text(), r"C:\");
        assert_eq!(nav.remaining(), ["one", "two", "three"]);

        nav.move_next();
        nav.move_next();
        assert_eq!(nav.index(), 2);
        assert_eq!(nav.path_up_to_here().get_text(), r"C:\one\two");
        assert_eq!(nav.remaining(), ["three"]);
    }

    #[test]
    fn navigator_on_volume_root_is_at_end() {
        let path = AbsolutePath::parse(r"C:\").unwrap();
        let nav = PathNavigator::new(&path);
        assert!(nav.is_at_start());
        assert!(nav.is_at_end());
        assert!(nav.remaining().is_empty());
    }
}

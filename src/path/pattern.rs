//! `*` / `?` wildcard patterns used by enumeration and watcher filters.

use crate::FsError;

/// A single-segment wildcard pattern, matched case-insensitively.
///
/// `*` matches any run of characters and `?` matches exactly one. The forms
/// `""`, `*` and `*.*` match every name.
///
/// ```rust
/// use anyfs_fakes::WildcardPattern;
///
/// let pattern = WildcardPattern::new("*.DOC");
/// assert!(pattern.is_match("report.doc"));
/// assert!(!pattern.is_match("report.docx"));
/// assert!(WildcardPattern::new("*.*").is_match("README"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    text: String,
    chars: Vec<char>,
    match_all: bool,
}

impl WildcardPattern {
    /// Compile a pattern.
    pub fn new(text: &str) -> Self {
        let match_all = matches!(text, "" | "*" | "*.*");
        Self {
            text: text.to_string(),
            chars: fold_case(text),
            match_all,
        }
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns `true` if `name` matches the pattern.
    pub fn is_match(&self, name: &str) -> bool {
        self.match_all || wildcard_match(&self.chars, &fold_case(name))
    }
}

impl Default for WildcardPattern {
    fn default() -> Self {
        Self::new("*")
    }
}

/// A search pattern that may span several directory levels.
///
/// `base\se*\*.doc` is split at separators: every segment but the last selects
/// directories at successive depths, the last selects the yielded entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SearchPattern {
    directories: Vec<WildcardPattern>,
    name: WildcardPattern,
}

impl SearchPattern {
    /// Parse and validate a search pattern.
    ///
    /// # Errors
    ///
    /// [`FsError::InvalidArgument`] if the pattern is rooted, contains a `..`
    /// segment, or contains characters that are never valid in names.
    pub(crate) fn parse(text: &str) -> Result<Self, FsError> {
        let canonical = text.replace('/', "\\");
        if canonical.starts_with('\\') || canonical.contains(':') {
            return Err(FsError::invalid_argument(format!(
                "Second path fragment must not be a drive or UNC name. (Parameter 'path2')\n{text}"
            )));
        }
        if canonical
            .chars()
            .any(|c| matches!(c, '"' | '<' | '>' | '|') || (c as u32) < 0x20)
        {
            return Err(FsError::IllegalCharacters { path: text.into() });
        }

        let mut segments: Vec<&str> = canonical.split('\\').collect();
        if segments.iter().any(|s| *s == "..") {
            return Err(FsError::invalid_argument(format!(
                "Search pattern '{text}' cannot contain \"..\" to move up directories and can be contained only internally in file/directory names, as in \"a..b\"."
            )));
        }

        let name = segments.pop().unwrap_or_default();
        let directories = segments
            .into_iter()
            .filter(|s| !s.is_empty() && *s != ".")
            .map(WildcardPattern::new)
            .collect();
        Ok(Self {
            directories,
            name: WildcardPattern::new(name),
        })
    }

    /// Patterns for the directory levels below the search root.
    pub(crate) fn directories(&self) -> &[WildcardPattern] {
        &self.directories
    }

    /// Pattern for the yielded entry names.
    pub(crate) fn name(&self) -> &WildcardPattern {
        &self.name
    }

    /// `true` when the final segment is empty, which never yields anything.
    pub(crate) fn is_empty(&self) -> bool {
        self.name.as_str().is_empty()
    }
}

fn fold_case(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Iterative wildcard matching with single-star backtracking.
fn wildcard_match(pattern: &[char], name: &[char]) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_n = 0;

    while n < name.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == name[n]) {
            p += 1;
            n += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            star_n = n;
            p += 1;
        } else if let Some(star_p) = star {
            p = star_p + 1;
            star_n += 1;
            n = star_n;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

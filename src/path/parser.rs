//! Turns raw path text into a validated [`AbsolutePath`].
//!
//! Rules are applied in a fixed order: emptiness, trailing whitespace,
//! separator canonicalization, prefix classification, character validation,
//! `.`/`..` resolution, then reserved device names.

use crate::FsError;

use super::absolute::{names_equal, AbsolutePath};

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

const INVALID_CHARS: [char; 6] = ['?', '*', '"', '<', '>', '|'];

/// Where the remainder of the text attaches.
enum Anchor {
    /// An explicit volume (`C:\`, `\\server\share`, `\\?\…`).
    Volume { volume: String, is_extended: bool },
    /// `C:name`: relative to the current directory when it is on that drive.
    DriveRelative { volume: String },
    /// `\name`: relative to the root of the current volume.
    RootRelative,
    /// `name`: relative to the current directory.
    Relative,
}

/// Parse a path that must be absolute.
///
/// # Errors
///
/// - [`FsError::EmptyPath`] / [`FsError::IllegalPathForm`] for empty or blank text
/// - [`FsError::UnsupportedNamespace`] for `\\.\` and non-file `\\?\` prefixes
/// - [`FsError::InvalidUncPath`] for `\\server` without a share
/// - [`FsError::IllegalCharacters`] for wildcards and control characters
/// - [`FsError::UnsupportedPathFormat`] for stray colons and relative paths
/// - [`FsError::ReservedName`] for device names such as `CON` or `lpt1.txt`
pub fn parse(text: &str) -> Result<AbsolutePath, FsError> {
    parse_with_base(text, None)
}

/// Parse a path, resolving relative forms against `base`.
pub fn parse_relative_to(text: &str, base: &AbsolutePath) -> Result<AbsolutePath, FsError> {
    parse_with_base(text, Some(base))
}

fn parse_with_base(text: &str, base: Option<&AbsolutePath>) -> Result<AbsolutePath, FsError> {
    if text.is_empty() {
        return Err(FsError::EmptyPath);
    }
    if text.trim().is_empty() {
        return Err(FsError::IllegalPathForm);
    }

    let canonical = text.trim_end().replace('/', "\\");
    if canonical.chars().any(|c| (c as u32) < 0x20) {
        return Err(FsError::IllegalCharacters { path: text.into() });
    }

    let (anchor, rest) = classify(&canonical, text)?;
    validate_characters(rest, text)?;

    let (volume, mut components, is_extended) = match anchor {
        Anchor::Volume {
            volume,
            is_extended,
        } => (volume, Vec::new(), is_extended),
        Anchor::DriveRelative { volume } => {
            match base.filter(|b| names_equal(b.volume_name(), &volume)) {
                Some(base) => (volume, below_volume(base), base.is_extended()),
                None if base.is_some() => (volume, Vec::new(), false),
                None => return Err(FsError::UnsupportedPathFormat { path: text.into() }),
            }
        }
        Anchor::RootRelative => {
            let base = base.ok_or_else(|| FsError::UnsupportedPathFormat { path: text.into() })?;
            (base.volume_name().to_string(), Vec::new(), base.is_extended())
        }
        Anchor::Relative => {
            let base = base.ok_or_else(|| FsError::UnsupportedPathFormat { path: text.into() })?;
            (
                base.volume_name().to_string(),
                below_volume(base),
                base.is_extended(),
            )
        }
    };

    for segment in rest.split('\\').filter(|s| !s.is_empty()) {
        match segment {
            "." => {}
            ".." => {
                // `..` above the volume root is ignored
                components.pop();
            }
            _ => {
                let name = if is_extended {
                    segment
                } else {
                    segment.trim_end_matches(['.', ' '])
                };
                if name.is_empty() {
                    continue;
                }
                if is_reserved_name(name) {
                    return Err(FsError::ReservedName { path: text.into() });
                }
                components.push(name.to_string());
            }
        }
    }

    let mut all = Vec::with_capacity(components.len() + 1);
    all.push(volume);
    all.extend(components);
    Ok(AbsolutePath::from_parts(all, is_extended))
}

fn below_volume(base: &AbsolutePath) -> Vec<String> {
    base.components()[1..].to_vec()
}

/// Split the text into its anchor and the component text that follows.
fn classify<'t>(canonical: &'t str, original: &str) -> Result<(Anchor, &'t str), FsError> {
    if let Some(after) = canonical.strip_prefix(r"\\?\") {
        return classify_extended(after, original);
    }
    if canonical.starts_with(r"\\.\") {
        return Err(FsError::UnsupportedNamespace {
            path: original.into(),
        });
    }
    if let Some(after) = canonical.strip_prefix(r"\\") {
        let (volume, rest) = split_unc(after, original)?;
        return Ok((
            Anchor::Volume {
                volume,
                is_extended: false,
            },
            rest,
        ));
    }
    if let Some((volume, rest)) = split_drive(canonical) {
        return match rest.strip_prefix('\\') {
            Some(rest) => Ok((
                Anchor::Volume {
                    volume,
                    is_extended: false,
                },
                rest,
            )),
            None if rest.is_empty() => Ok((
                Anchor::Volume {
                    volume,
                    is_extended: false,
                },
                rest,
            )),
            None => Ok((Anchor::DriveRelative { volume }, rest)),
        };
    }
    if canonical.len() >= 2 && canonical.as_bytes()[1] == b':' {
        // A colon after something other than a drive letter
        return Err(FsError::UnsupportedPathFormat {
            path: original.into(),
        });
    }
    if let Some(rest) = canonical.strip_prefix('\\') {
        return Ok((Anchor::RootRelative, rest));
    }
    Ok((Anchor::Relative, canonical))
}

fn classify_extended<'t>(after: &'t str, original: &str) -> Result<(Anchor, &'t str), FsError> {
    if after
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(r"UNC\"))
    {
        let (volume, rest) = split_unc(&after[4..], original)?;
        return Ok((
            Anchor::Volume {
                volume,
                is_extended: true,
            },
            rest,
        ));
    }
    if let Some((volume, rest)) = split_drive(after) {
        if rest.is_empty() || rest.starts_with('\\') {
            return Ok((
                Anchor::Volume {
                    volume,
                    is_extended: true,
                },
                rest.trim_start_matches('\\'),
            ));
        }
    }
    // GLOBALROOT, volume GUIDs and other NT namespaces
    Err(FsError::UnsupportedNamespace {
        path: original.into(),
    })
}

/// `server\share\rest` → (`\\server\share`, `rest`).
fn split_unc<'t>(after: &'t str, original: &str) -> Result<(String, &'t str), FsError> {
    let mut parts = after.splitn(3, '\\');
    let server = parts.next().unwrap_or_default();
    let share = parts.next().unwrap_or_default();
    let rest = parts.next().unwrap_or_default();

    if server.is_empty() || share.is_empty() {
        return Err(FsError::InvalidUncPath {
            path: original.into(),
        });
    }
    if server.contains(':') || share.contains(':') {
        return Err(FsError::UnsupportedPathFormat {
            path: original.into(),
        });
    }
    if server.contains(INVALID_CHARS) || share.contains(INVALID_CHARS) {
        return Err(FsError::IllegalCharacters {
            path: original.into(),
        });
    }
    Ok((format!(r"\\{server}\{share}"), rest))
}

/// `C:rest` → (`C:`, `rest`), upper-casing the drive letter.
fn split_drive(text: &str) -> Option<(String, &str)> {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        let letter = (bytes[0] as char).to_ascii_uppercase();
        return Some((format!("{letter}:"), &text[2..]));
    }
    None
}

fn validate_characters(rest: &str, original: &str) -> Result<(), FsError> {
    if rest.contains(INVALID_CHARS) {
        return Err(FsError::IllegalCharacters {
            path: original.into(),
        });
    }
    if rest.contains(':') {
        return Err(FsError::UnsupportedPathFormat {
            path: original.into(),
        });
    }
    Ok(())
}

/// `CON`, `nul.txt`, `Com1 .log` and similar device names.
pub(crate) fn is_reserved_name(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or_default().trim_end();
    RESERVED_NAMES
        .iter()
        .any(|reserved| stem.eq_ignore_ascii_case(reserved))
}

//! # Paths
//!
//! Windows-style path handling for the emulation.
//!
//! | Item | Purpose |
//! |------|---------|
//! | [`parse`] / [`parse_relative_to`] | Raw text → [`AbsolutePath`] |
//! | [`AbsolutePath`] | Immutable, normalized absolute path |
//! | [`PathNavigator`] | Component-at-a-time cursor |
//! | [`WildcardPattern`] | `*`/`?` name matching |

mod absolute;
mod navigator;
mod parser;
mod pattern;

pub use absolute::{AbsolutePath, SEPARATOR};
pub use navigator::PathNavigator;
pub use parser::{parse, parse_relative_to};
pub use pattern::WildcardPattern;

pub(crate) use absolute::{name_key, names_equal};
pub(crate) use pattern::SearchPattern;

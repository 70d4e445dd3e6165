//! Validation of single, untrusted path segments.
//!
//! # Responsibilities
//! - Turn a client-supplied file name into a [`SanitizedSegment`]
//! - Reject traversal (`..`), nested paths and prohibited characters
//!
//! # Design Decisions
//! - Lexical cleaning runs first but is never the security boundary on its own:
//!   every check below rejects unsafe input independently
//! - At most one `.` is allowed (a single extension separator)
//! - Multi-segment request paths are NOT handled here; mounted roots enforce
//!   their own traversal safety (see `http::mount`)

use std::fmt;
use std::ops::Deref;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

/// Reasons a segment is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SafePathError {
    #[error("too many dots ({count})")]
    TooManyDots { count: usize },

    #[error("too many file separators ({count})")]
    TooManySeparators { count: usize },

    #[error("prohibited characters found")]
    BadCharacters,
}

impl SafePathError {
    /// Short label used for metrics and structured logs.
    pub fn reason(&self) -> &'static str {
        match self {
            SafePathError::TooManyDots { .. } => "too_many_dots",
            SafePathError::TooManySeparators { .. } => "too_many_separators",
            SafePathError::BadCharacters => "bad_characters",
        }
    }
}

/// A single path component that is safe to join onto a trusted directory.
///
/// Only [`clean`] can produce one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SanitizedSegment(String);

impl SanitizedSegment {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Join onto `base`. The result always names a direct child of `base`.
    pub fn join_to(&self, base: &Path) -> PathBuf {
        base.join(&self.0)
    }
}

impl Deref for SanitizedSegment {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for SanitizedSegment {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for SanitizedSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

/// Validate one path segment.
pub fn clean(input: &str) -> Result<SanitizedSegment, SafePathError> {
    let cleaned = lexical_clean(input);

    let mut dots = 0;
    let mut separators = 0;
    for c in cleaned.chars() {
        if c == '.' {
            dots += 1;
        } else if is_separator(c) {
            separators += 1;
        }
    }

    if dots > 1 {
        return Err(SafePathError::TooManyDots { count: dots });
    }
    if separators > 0 {
        return Err(SafePathError::TooManySeparators { count: separators });
    }
    if !matches_allow_list(&cleaned) {
        return Err(SafePathError::BadCharacters);
    }

    Ok(SanitizedSegment(cleaned))
}

/// Allow-list: exactly one non-empty run of non-separator, printable characters.
/// A lone `.` names the containing directory and is refused.
fn matches_allow_list(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment
            .chars()
            .all(|c| !is_separator(c) && !c.is_control())
}

/// Purely lexical path cleaning.
///
/// Collapses repeated separators, removes `.` elements, resolves `..` against
/// the preceding element and drops `..` at the root. An empty result is `.`.
pub(crate) fn lexical_clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with(is_separator);
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(is_separator) {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if *last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let sep = MAIN_SEPARATOR.to_string();
    let joined = parts.join(&sep);
    match (rooted, joined.is_empty()) {
        (true, _) => format!("{sep}{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

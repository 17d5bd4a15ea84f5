//! Syntax profiles — which file types get which highlight categories.
//!
//! A [`Syntax`] names a file type, lists the filename patterns that select
//! it, and carries [`SyntaxFlags`] enabling highlight categories for the
//! scanner. Profiles live in the static [`SYNTAXES`] registry; [`select`]
//! picks one by filename.

use bitflags::bitflags;

bitflags! {
    /// Highlight categories a profile enables.
    ///
    /// The scanner consults these per row: a profile without
    /// [`STRINGS`](Self::STRINGS) leaves quote characters NORMAL, and so on.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SyntaxFlags: u8 {
        /// Classify decimal literals as NUMBER.
        const NUMBERS = 1 << 0;
        /// Classify quoted regions as STRING.
        const STRINGS = 1 << 1;
    }
}

/// A file-type profile: display name, filename patterns, enabled categories.
///
/// Patterns starting with `.` match the filename's extension exactly;
/// any other pattern matches as a substring of the filename (so `Makefile`
/// could match `Makefile.am` too).
#[derive(Debug, PartialEq)]
pub struct Syntax {
    name: &'static str,
    patterns: &'static [&'static str],
    flags: SyntaxFlags,
}

impl Syntax {
    /// The file-type label shown in the status bar.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The highlight categories this profile enables.
    #[inline]
    #[must_use]
    pub const fn flags(&self) -> SyntaxFlags {
        self.flags
    }

    /// Does this profile apply to `filename`?
    #[must_use]
    pub fn matches(&self, filename: &str) -> bool {
        let ext = filename.rfind('.').map(|i| &filename[i..]);
        self.patterns.iter().any(|&pattern| {
            if pattern.starts_with('.') {
                ext == Some(pattern)
            } else {
                filename.contains(pattern)
            }
        })
    }
}

/// Registered syntax profiles, checked in order by [`select`].
pub static SYNTAXES: &[Syntax] = &[
    Syntax {
        name: "c",
        patterns: &[".c", ".h", ".cpp"],
        flags: SyntaxFlags::NUMBERS.union(SyntaxFlags::STRINGS),
    },
    Syntax {
        name: "rust",
        patterns: &[".rs"],
        flags: SyntaxFlags::NUMBERS.union(SyntaxFlags::STRINGS),
    },
];

/// Pick the profile for `filename`, or `None` when no pattern matches.
///
/// No match means no highlighting: the scanner classifies every byte NORMAL.
#[must_use]
pub fn select(filename: &str) -> Option<&'static Syntax> {
    SYNTAXES.iter().find(|syntax| syntax.matches(filename))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Document — the ordered row buffer.
//!
//! A `Document` owns a `Vec<Row>` (index = line number), a dirty counter,
//! the optional backing filename, and the active syntax profile. All edit
//! primitives live here: row insert/delete with shifting, byte insert,
//! the backspace-join, the Enter-split, and the rows↔bytes conversions
//! used for load and save.
//!
//! # Design choices
//!
//! - **Ops are O(rows)** in the worst case — `Vec` shifting on row
//!   insert/delete. At editor scale (thousands of rows) that is well under
//!   a frame budget, and the flat layout keeps every other operation simple.
//!
//! - **Cursor-shaped results.** The join and split operations return the
//!   cursor position they imply; the controller owns the cursor and applies
//!   them. The document never reaches into viewport state.
//!
//! - **Defensive bounds.** Out-of-range row indices are no-ops, not errors.
//!   Callers clamp before calling; the document re-validates anyway.
//!
//! - **Dirty counter**, not a flag: every mutation increments it, a
//!   successful save resets it to zero. The controller only asks
//!   [`is_dirty`](Document::is_dirty), but the count is cheap and makes
//!   "how much changed" visible in logs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use skiff_syntax::{select, Syntax};

use crate::row::Row;

/// An ordered sequence of rows with editing state.
#[derive(Default)]
pub struct Document {
    rows: Vec<Row>,
    dirty: u64,
    filename: Option<PathBuf>,
    syntax: Option<&'static Syntax>,
}

impl Document {
    // -- Construction -------------------------------------------------------

    /// Create an empty, unnamed document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a document from file contents: one row per line, trailing
    /// CR/LF stripped. Empty lines become empty rows.
    #[must_use]
    pub fn from_bytes(filename: Option<PathBuf>, bytes: &[u8]) -> Self {
        let mut doc = Self {
            filename,
            ..Self::default()
        };
        doc.select_syntax();

        let mut lines: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
        // A trailing newline terminates the last line rather than opening
        // a new one — drop the phantom empty tail.
        if bytes.last() == Some(&b'\n') {
            lines.pop();
        }
        for line in lines {
            let line = line.strip_suffix(b"\r").unwrap_or(line);
            doc.rows.push(Row::new(line.to_vec(), doc.syntax));
        }
        doc
    }

    /// Load a document from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn open(path: &Path) -> io::Result<Self> {
        let bytes = fs::read(path)?;
        Ok(Self::from_bytes(Some(path.to_path_buf()), &bytes))
    }

    // -- Access -------------------------------------------------------------

    /// Number of rows.
    #[inline]
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get a row by index.
    #[inline]
    #[must_use]
    pub fn row(&self, at: usize) -> Option<&Row> {
        self.rows.get(at)
    }

    /// Get a row mutably (search overlay needs this).
    #[inline]
    #[must_use]
    pub fn row_mut(&mut self, at: usize) -> Option<&mut Row> {
        self.rows.get_mut(at)
    }

    /// The backing filename, if any.
    #[inline]
    #[must_use]
    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    /// The active syntax profile, if any.
    #[inline]
    #[must_use]
    pub const fn syntax(&self) -> Option<&'static Syntax> {
        self.syntax
    }

    /// The edit counter since the last save.
    #[inline]
    #[must_use]
    pub const fn dirty(&self) -> u64 {
        self.dirty
    }

    /// True when there are unsaved changes.
    #[inline]
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty > 0
    }

    // -- Syntax selection ---------------------------------------------------

    /// Set the filename (save-as) and re-select the syntax profile.
    pub fn set_filename(&mut self, path: PathBuf) {
        self.filename = Some(path);
        self.select_syntax();
    }

    /// Match the filename against the profile registry and re-scan every
    /// row. With no filename or no match, highlighting reduces to NORMAL.
    pub fn select_syntax(&mut self) {
        self.syntax = self
            .filename
            .as_ref()
            .and_then(|path| select(&path.to_string_lossy()));
        for row in &mut self.rows {
            row.update(self.syntax);
        }
    }

    // -- Row operations -----------------------------------------------------

    /// Insert a new row at `at`, shifting subsequent rows down.
    /// No-op if `at` is past the row count.
    pub fn insert_row(&mut self, at: usize, bytes: Vec<u8>) {
        if at > self.rows.len() {
            return;
        }
        self.rows.insert(at, Row::new(bytes, self.syntax));
        self.dirty += 1;
    }

    /// Delete the row at `at`, shifting subsequent rows up.
    /// No-op if `at` is out of bounds.
    pub fn delete_row(&mut self, at: usize) {
        if at >= self.rows.len() {
            return;
        }
        self.rows.remove(at);
        self.dirty += 1;
    }

    // -- Character operations -----------------------------------------------

    /// Insert one byte at `(y, x)`. A cursor on the past-last-row line
    /// grows the document by an empty row first; `x` is clamped to the
    /// row length.
    pub fn insert_char(&mut self, y: usize, x: usize, byte: u8) {
        if y > self.rows.len() {
            return;
        }
        if y == self.rows.len() {
            self.insert_row(self.rows.len(), Vec::new());
        }
        let syntax = self.syntax;
        if let Some(row) = self.rows.get_mut(y) {
            row.insert_char(x, byte, syntax);
            self.dirty += 1;
        }
    }

    /// Delete the byte before `(y, x)` and return the resulting cursor
    /// position.
    ///
    /// At `x == 0` of a non-first row this joins the row onto the previous
    /// row (the cursor lands at the old end of that row) and deletes the
    /// emptied row. At the document start — or on the past-last-row line —
    /// there is nothing to delete and `None` is returned.
    pub fn delete_char(&mut self, y: usize, x: usize) -> Option<(usize, usize)> {
        if y >= self.rows.len() {
            return None;
        }
        if x == 0 && y == 0 {
            return None;
        }

        let syntax = self.syntax;
        if x > 0 {
            self.rows[y].delete_char(x - 1, syntax);
            self.dirty += 1;
            Some((y, x - 1))
        } else {
            let moved = self.rows[y].chars().to_vec();
            let join_at = self.rows[y - 1].len();
            self.rows[y - 1].append(&moved, syntax);
            self.dirty += 1;
            self.delete_row(y);
            Some((y - 1, join_at))
        }
    }

    /// Break the line at `(y, x)` and return the resulting cursor position
    /// (always the start of the following row).
    ///
    /// At column 0 an empty row is inserted above; otherwise the row splits
    /// at the cursor, keeping the prefix and moving the suffix to a new row.
    pub fn insert_newline(&mut self, y: usize, x: usize) -> (usize, usize) {
        if x == 0 {
            self.insert_row(y, Vec::new());
        } else if y < self.rows.len() {
            let syntax = self.syntax;
            let suffix = self.rows[y].split_off(x, syntax);
            self.dirty += 1;
            self.insert_row(y + 1, suffix);
        }
        (y + 1, 0)
    }

    // -- Load / save --------------------------------------------------------

    /// Serialize all rows: each row's bytes followed by `\n`, including
    /// the last row. The empty document serializes to nothing.
    #[must_use]
    pub fn rows_to_bytes(&self) -> Vec<u8> {
        let total: usize = self.rows.iter().map(|row| row.len() + 1).sum();
        let mut buf = Vec::with_capacity(total);
        for row in &self.rows {
            buf.extend_from_slice(row.chars());
            buf.push(b'\n');
        }
        buf
    }

    /// Write the document to its filename (create or truncate) and reset
    /// the dirty counter. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns an error if the document has no filename or the write
    /// fails; the dirty counter is left untouched in both cases.
    pub fn save(&mut self) -> io::Result<usize> {
        let Some(path) = self.filename.as_deref() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "document has no filename",
            ));
        };
        let buf = self.rows_to_bytes();
        fs::write(path, &buf)?;
        self.dirty = 0;
        Ok(buf.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

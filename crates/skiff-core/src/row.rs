//! Row — one line of the document.
//!
//! A `Row` owns three parallel views of a line:
//!
//! - `chars` — the raw bytes, no trailing newline. This is what editing
//!   operations mutate and what gets written back to disk.
//! - `render` — the bytes actually drawn: tabs expanded to the next
//!   multiple of [`TAB_STOP`] columns using spaces. A pure function of
//!   `chars`, rebuilt on every mutation.
//! - `highlight` — one [`Highlight`] class per `render` byte, recomputed
//!   together with `render`.
//!
//! Columns are byte offsets. `cursor` columns (`cx`) index `chars`; render
//! columns (`rx`) index `render`. [`cx_to_rx`](Row::cx_to_rx) and
//! [`rx_to_cx`](Row::rx_to_cx) convert between the two — they only differ
//! on rows containing tabs.

use skiff_syntax::{scan, Highlight, Syntax};

/// Tab stop width in render columns.
pub const TAB_STOP: usize = 8;

/// One line of the document: raw bytes, rendered bytes, highlight classes.
#[derive(Debug, Clone, Default)]
pub struct Row {
    chars: Vec<u8>,
    render: Vec<u8>,
    highlight: Vec<Highlight>,
}

impl Row {
    // -- Construction -------------------------------------------------------

    /// Create a row from raw bytes and derive `render`/`highlight`.
    #[must_use]
    pub fn new(chars: Vec<u8>, syntax: Option<&Syntax>) -> Self {
        let mut row = Self {
            chars,
            render: Vec::new(),
            highlight: Vec::new(),
        };
        row.update(syntax);
        row
    }

    /// Rebuild `render` and `highlight` from `chars`.
    ///
    /// Called after every mutation of `chars` and whenever the document's
    /// syntax profile changes. Tabs expand to at least one space and then
    /// up to the next multiple of [`TAB_STOP`].
    pub fn update(&mut self, syntax: Option<&Syntax>) {
        self.render.clear();
        for &byte in &self.chars {
            if byte == b'\t' {
                self.render.push(b' ');
                while self.render.len() % TAB_STOP != 0 {
                    self.render.push(b' ');
                }
            } else {
                self.render.push(byte);
            }
        }
        self.highlight = scan(&self.render, syntax);
    }

    // -- Access -------------------------------------------------------------

    /// Length of the raw bytes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// True when the row holds no bytes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The raw bytes (no trailing newline).
    #[inline]
    #[must_use]
    pub fn chars(&self) -> &[u8] {
        &self.chars
    }

    /// The rendered bytes (tabs expanded).
    #[inline]
    #[must_use]
    pub fn render(&self) -> &[u8] {
        &self.render
    }

    /// Length of the rendered bytes.
    #[inline]
    #[must_use]
    pub fn render_len(&self) -> usize {
        self.render.len()
    }

    /// The highlight classes, one per rendered byte.
    #[inline]
    #[must_use]
    pub fn highlight(&self) -> &[Highlight] {
        &self.highlight
    }

    // -- Column conversion --------------------------------------------------

    /// Convert a `chars` column to its render column.
    ///
    /// Each tab before `cx` advances the render column to the next
    /// [`TAB_STOP`] multiple; every other byte advances it by one.
    #[must_use]
    pub fn cx_to_rx(&self, cx: usize) -> usize {
        let mut rx = 0;
        for &byte in self.chars.iter().take(cx) {
            if byte == b'\t' {
                rx += (TAB_STOP - 1) - (rx % TAB_STOP);
            }
            rx += 1;
        }
        rx
    }

    /// Convert a render column back to its `chars` column.
    ///
    /// Inverse of [`cx_to_rx`](Self::cx_to_rx): walks `chars` accumulating
    /// render width until it passes `rx`. A render column past the end of
    /// the row maps to the row length.
    #[must_use]
    pub fn rx_to_cx(&self, rx: usize) -> usize {
        let mut current_rx = 0;
        for (cx, &byte) in self.chars.iter().enumerate() {
            if byte == b'\t' {
                current_rx += (TAB_STOP - 1) - (current_rx % TAB_STOP);
            }
            current_rx += 1;
            if current_rx > rx {
                return cx;
            }
        }
        self.chars.len()
    }

    // -- Editing ------------------------------------------------------------

    /// Insert one byte at column `at` (clamped to the row length).
    pub fn insert_char(&mut self, at: usize, byte: u8, syntax: Option<&Syntax>) {
        let at = at.min(self.chars.len());
        self.chars.insert(at, byte);
        self.update(syntax);
    }

    /// Remove the byte at column `at`. Out-of-range is a no-op.
    pub fn delete_char(&mut self, at: usize, syntax: Option<&Syntax>) {
        if at >= self.chars.len() {
            return;
        }
        self.chars.remove(at);
        self.update(syntax);
    }

    /// Append bytes to the end of the row (the join half of backspace).
    pub fn append(&mut self, bytes: &[u8], syntax: Option<&Syntax>) {
        self.chars.extend_from_slice(bytes);
        self.update(syntax);
    }

    /// Split the row at column `at`, keeping the prefix and returning the
    /// suffix bytes (the split half of Enter). `at` is clamped.
    #[must_use]
    pub fn split_off(&mut self, at: usize, syntax: Option<&Syntax>) -> Vec<u8> {
        let at = at.min(self.chars.len());
        let suffix = self.chars.split_off(at);
        self.update(syntax);
        suffix
    }

    // -- Search overlay -----------------------------------------------------

    /// Overlay [`Highlight::Match`] over `len` rendered bytes starting at
    /// render column `rx`. The range is clipped to the row.
    pub fn overlay_match(&mut self, rx: usize, len: usize) {
        let end = rx.saturating_add(len).min(self.highlight.len());
        for class in self.highlight.get_mut(rx..end).unwrap_or_default() {
            *class = Highlight::Match;
        }
    }

    /// Replace the highlight array with a previously saved copy.
    ///
    /// Used by the search engine to undo an overlay. Ignored if the saved
    /// copy no longer matches the render length (defensive — the row text
    /// cannot change while a search prompt is active).
    pub fn restore_highlight(&mut self, saved: Vec<Highlight>) {
        if saved.len() == self.render.len() {
            self.highlight = saved;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use skiff_syntax::select;

    use super::*;

    fn row(text: &str) -> Row {
        Row::new(text.as_bytes().to_vec(), None)
    }

    // ── Render derivation ──────────────────────────────────────────

    #[test]
    fn plain_text_renders_unchanged() {
        assert_eq!(row("hello").render(), b"hello");
    }

    #[test]
    fn leading_tab_renders_to_eight_spaces() {
        assert_eq!(row("\t").render(), b"        ");
    }

    #[test]
    fn tab_advances_to_next_stop() {
        // "ab" occupies columns 0-1, the tab fills through column 7.
        assert_eq!(row("ab\tc").render(), b"ab      c");
    }

    #[test]
    fn tab_at_stop_boundary_still_emits_a_space() {
        // 8 chars, then a tab: at least one space, to the next multiple.
        assert_eq!(row("12345678\tx").render(), b"12345678        x");
    }

    #[test]
    fn highlight_length_tracks_render_length() {
        for text in ["", "a", "\t", "ab\tcd\t", "12345678\t"] {
            let r = row(text);
            assert_eq!(r.highlight().len(), r.render_len(), "text {text:?}");
        }
    }

    #[test]
    fn highlight_length_tracks_render_after_mutations() {
        let mut r = row("a\tb");
        r.insert_char(1, b'4', None);
        assert_eq!(r.highlight().len(), r.render_len());
        r.delete_char(0, None);
        assert_eq!(r.highlight().len(), r.render_len());
        r.append(b"\t9", None);
        assert_eq!(r.highlight().len(), r.render_len());
        let _ = r.split_off(2, None);
        assert_eq!(r.highlight().len(), r.render_len());
    }

    #[test]
    fn update_rescans_with_syntax() {
        let mut r = row("42");
        assert_eq!(r.highlight(), [Highlight::Normal, Highlight::Normal]);
        r.update(select("test.c"));
        assert_eq!(r.highlight(), [Highlight::Number, Highlight::Number]);
    }

    // ── Column conversion ──────────────────────────────────────────

    #[test]
    fn cx_to_rx_without_tabs_is_identity() {
        let r = row("hello");
        for cx in 0..=5 {
            assert_eq!(r.cx_to_rx(cx), cx);
        }
    }

    #[test]
    fn cx_to_rx_expands_tabs() {
        let r = row("\tx");
        assert_eq!(r.cx_to_rx(0), 0);
        assert_eq!(r.cx_to_rx(1), 8);
        assert_eq!(r.cx_to_rx(2), 9);
    }

    #[test]
    fn rx_to_cx_lands_on_the_tab() {
        let r = row("\tx");
        // Every render column inside the tab's span maps back to column 0.
        for rx in 0..8 {
            assert_eq!(r.rx_to_cx(rx), 0, "rx {rx}");
        }
        assert_eq!(r.rx_to_cx(8), 1);
    }

    #[test]
    fn rx_to_cx_past_the_end_clamps() {
        let r = row("ab");
        assert_eq!(r.rx_to_cx(100), 2);
    }

    #[test]
    fn round_trip_law() {
        // rx_to_cx(cx_to_rx(cx)) == cx for every valid cursor column.
        for text in ["", "abc", "\t", "a\tb\tc", "12345678\tx", "\t\t"] {
            let r = row(text);
            for cx in 0..=r.len() {
                assert_eq!(r.rx_to_cx(r.cx_to_rx(cx)), cx, "text {text:?} cx {cx}");
            }
        }
    }

    // ── Editing ────────────────────────────────────────────────────

    #[test]
    fn insert_char_mid_row() {
        let mut r = row("ac");
        r.insert_char(1, b'b', None);
        assert_eq!(r.chars(), b"abc");
    }

    #[test]
    fn insert_char_clamps_past_end() {
        let mut r = row("ab");
        r.insert_char(99, b'c', None);
        assert_eq!(r.chars(), b"abc");
    }

    #[test]
    fn delete_char_mid_row() {
        let mut r = row("abc");
        r.delete_char(1, None);
        assert_eq!(r.chars(), b"ac");
    }

    #[test]
    fn delete_char_out_of_range_is_noop() {
        let mut r = row("ab");
        r.delete_char(2, None);
        assert_eq!(r.chars(), b"ab");
    }

    #[test]
    fn append_joins_lines() {
        let mut r = row("ab");
        r.append(b"cd", None);
        assert_eq!(r.chars(), b"abcd");
        assert_eq!(r.render(), b"abcd");
    }

    #[test]
    fn split_off_keeps_prefix_returns_suffix() {
        let mut r = row("abcd");
        let suffix = r.split_off(2, None);
        assert_eq!(r.chars(), b"ab");
        assert_eq!(suffix, b"cd");
    }

    #[test]
    fn split_off_at_end_returns_empty() {
        let mut r = row("ab");
        let suffix = r.split_off(2, None);
        assert_eq!(r.chars(), b"ab");
        assert!(suffix.is_empty());
    }

    // ── Search overlay ─────────────────────────────────────────────

    #[test]
    fn overlay_and_restore() {
        let mut r = Row::new(b"int x = 42;".to_vec(), select("t.c"));
        let before = r.highlight().to_vec();

        r.overlay_match(4, 1);
        assert_eq!(r.highlight()[4], Highlight::Match);
        assert_ne!(r.highlight(), &before[..]);

        r.restore_highlight(before.clone());
        assert_eq!(r.highlight(), &before[..]);
    }

    #[test]
    fn overlay_clips_to_row_end() {
        let mut r = row("abc");
        r.overlay_match(1, 100);
        assert_eq!(
            r.highlight(),
            [Highlight::Normal, Highlight::Match, Highlight::Match]
        );
    }

    #[test]
    fn restore_with_stale_length_is_ignored() {
        let mut r = row("abc");
        r.restore_highlight(vec![Highlight::Match; 7]);
        assert_eq!(r.highlight(), [Highlight::Normal; 3]);
    }
}

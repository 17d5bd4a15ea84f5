//! Search — incremental substring search with match highlighting.
//!
//! The prompt layer calls [`Search::step`] after every keystroke of the
//! search prompt. Each step:
//!
//! 1. Restores the highlight of the previously matched row from the saved
//!    pre-overlay copy (so stale MATCH coloring never lingers).
//! 2. Applies the caller's direction decision — continue forward/backward,
//!    or restart from scratch because the query changed.
//! 3. Scans rows from the anchor in the chosen direction, wrapping around
//!    the row count, for the first row whose *rendered* bytes contain the
//!    query. On a hit it saves that row's highlight, overlays MATCH over
//!    the matched range, and reports where the cursor should go.
//!
//! The search is literal substring over rendered bytes — what the user
//! sees is what matches, tabs included. [`Search::finish`] ends a session
//! (confirm or cancel alike), restoring any overlay.

use skiff_syntax::Highlight;

use crate::document::Document;

// ---------------------------------------------------------------------------
// Direction / Step
// ---------------------------------------------------------------------------

/// Search direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What the caller decided from the latest prompt keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// An arrow key: keep the current anchor, move in this direction.
    Move(Direction),
    /// The query changed (or any other key): forget the anchor and scan
    /// forward from the top.
    Restart,
}

/// A match: the row index and the cursor column to land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    /// Row index of the matched row.
    pub y: usize,
    /// Cursor column (`chars` offset) of the match start.
    pub cx: usize,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// State of one interactive search session.
///
/// Holds the anchor row of the last match, the scan direction, and the
/// saved highlight of the currently overlaid row.
pub struct Search {
    last_match: Option<usize>,
    direction: Direction,
    saved: Option<(usize, Vec<Highlight>)>,
}

impl Search {
    /// Start a session: no anchor, forward direction, nothing overlaid.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            last_match: None,
            direction: Direction::Forward,
            saved: None,
        }
    }

    /// Undo the current overlay, if any.
    fn restore_overlay(&mut self, doc: &mut Document) {
        if let Some((y, saved)) = self.saved.take() {
            if let Some(row) = doc.row_mut(y) {
                row.restore_highlight(saved);
            }
        }
    }

    /// Advance the search by one prompt keystroke.
    ///
    /// Returns the hit to move the cursor to, or `None` when no row
    /// contains the query (the cursor stays put, nothing is overlaid).
    pub fn step(&mut self, doc: &mut Document, query: &[u8], step: Step) -> Option<Hit> {
        self.restore_overlay(doc);

        match step {
            Step::Move(direction) => self.direction = direction,
            Step::Restart => {
                self.last_match = None;
                self.direction = Direction::Forward;
            }
        }
        // Without an anchor there is nothing to move backward from.
        if self.last_match.is_none() {
            self.direction = Direction::Forward;
        }

        if query.is_empty() || doc.row_count() == 0 {
            return None;
        }

        let count = doc.row_count();
        let mut current = self.last_match;
        for _ in 0..count {
            let y = match (self.direction, current) {
                (Direction::Forward, None) => 0,
                (Direction::Forward, Some(prev)) => (prev + 1) % count,
                (Direction::Backward, None) => count - 1,
                (Direction::Backward, Some(prev)) => prev.checked_sub(1).unwrap_or(count - 1),
            };
            current = Some(y);

            let row = doc.row(y)?;
            if let Some(rx) = find(row.render(), query) {
                self.last_match = Some(y);
                let cx = row.rx_to_cx(rx);
                self.saved = Some((y, row.highlight().to_vec()));
                if let Some(row) = doc.row_mut(y) {
                    row.overlay_match(rx, query.len());
                }
                return Some(Hit { y, cx });
            }
        }

        None
    }

    /// End the session (Enter or Escape): restore any overlay and reset.
    pub fn finish(&mut self, doc: &mut Document) {
        self.restore_overlay(doc);
        self.last_match = None;
        self.direction = Direction::Forward;
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

/// First occurrence of `needle` in `haystack`, as a byte offset.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use skiff_syntax::Highlight;

    use super::*;

    fn doc(lines: &[&str]) -> Document {
        let mut doc = Document::new();
        for (i, line) in lines.iter().enumerate() {
            doc.insert_row(i, line.as_bytes().to_vec());
        }
        doc
    }

    // ── Substring find ─────────────────────────────────────────────

    #[test]
    fn find_locates_first_occurrence() {
        assert_eq!(find(b"abcabc", b"bc"), Some(1));
    }

    #[test]
    fn find_misses() {
        assert_eq!(find(b"abc", b"x"), None);
    }

    #[test]
    fn find_needle_longer_than_haystack() {
        assert_eq!(find(b"ab", b"abc"), None);
    }

    #[test]
    fn find_empty_needle() {
        assert_eq!(find(b"abc", b""), None);
    }

    // ── Stepping ───────────────────────────────────────────────────

    #[test]
    fn first_step_scans_from_the_top() {
        let mut d = doc(&["one", "two", "three"]);
        let mut search = Search::new();
        let hit = search.step(&mut d, b"two", Step::Restart).unwrap();
        assert_eq!(hit, Hit { y: 1, cx: 0 });
    }

    #[test]
    fn reports_the_column_of_the_match() {
        let mut d = doc(&["say hello"]);
        let mut search = Search::new();
        let hit = search.step(&mut d, b"hello", Step::Restart).unwrap();
        assert_eq!(hit, Hit { y: 0, cx: 4 });
    }

    #[test]
    fn match_column_accounts_for_tabs() {
        // "\thello": the match starts at render column 8, cursor column 1.
        let mut d = doc(&["\thello"]);
        let mut search = Search::new();
        let hit = search.step(&mut d, b"hello", Step::Restart).unwrap();
        assert_eq!(hit, Hit { y: 0, cx: 1 });
    }

    #[test]
    fn no_match_returns_none() {
        let mut d = doc(&["one", "two"]);
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"zzz", Step::Restart), None);
    }

    #[test]
    fn empty_query_returns_none() {
        let mut d = doc(&["one"]);
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"", Step::Restart), None);
    }

    #[test]
    fn empty_document_returns_none() {
        let mut d = Document::new();
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"x", Step::Restart), None);
    }

    #[test]
    fn forward_moves_to_the_next_matching_row() {
        let mut d = doc(&["hit", "miss", "hit"]);
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"hit", Step::Restart).unwrap().y, 0);
        assert_eq!(
            search
                .step(&mut d, b"hit", Step::Move(Direction::Forward))
                .unwrap()
                .y,
            2
        );
    }

    #[test]
    fn backward_moves_to_the_previous_matching_row() {
        let mut d = doc(&["hit", "miss", "hit"]);
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"hit", Step::Restart).unwrap().y, 0);
        assert_eq!(
            search
                .step(&mut d, b"hit", Step::Move(Direction::Backward))
                .unwrap()
                .y,
            2,
            "backward from the first row wraps to the last match"
        );
    }

    #[test]
    fn forward_wraps_around_the_row_count() {
        // Query present only in the first row; anchor on the last row.
        let mut d = doc(&["needle", "a", "b"]);
        let mut search = Search::new();
        search.last_match = Some(2);
        let hit = search
            .step(&mut d, b"needle", Step::Move(Direction::Forward))
            .unwrap();
        assert_eq!(hit.y, 0);
    }

    #[test]
    fn restart_forgets_the_anchor() {
        let mut d = doc(&["hit", "hit"]);
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"hit", Step::Restart).unwrap().y, 0);
        assert_eq!(
            search
                .step(&mut d, b"hit", Step::Move(Direction::Forward))
                .unwrap()
                .y,
            1
        );
        // A changed query restarts from the top.
        assert_eq!(search.step(&mut d, b"hit", Step::Restart).unwrap().y, 0);
    }

    // ── Overlay ────────────────────────────────────────────────────

    #[test]
    fn match_is_overlaid_on_the_matched_row() {
        let mut d = doc(&["say hello"]);
        let mut search = Search::new();
        search.step(&mut d, b"hello", Step::Restart).unwrap();

        let hl = d.row(0).unwrap().highlight();
        assert_eq!(&hl[4..9], [Highlight::Match; 5]);
        assert_eq!(&hl[..4], [Highlight::Normal; 4]);
    }

    #[test]
    fn moving_between_matches_restores_the_previous_row_exactly() {
        let mut d = doc(&["hit one", "hit two"]);
        let before = d.row(0).unwrap().highlight().to_vec();

        let mut search = Search::new();
        search.step(&mut d, b"hit", Step::Restart).unwrap();
        search
            .step(&mut d, b"hit", Step::Move(Direction::Forward))
            .unwrap();

        assert_eq!(d.row(0).unwrap().highlight(), &before[..]);
        assert_eq!(&d.row(1).unwrap().highlight()[..3], [Highlight::Match; 3]);
    }

    #[test]
    fn finish_restores_the_overlay() {
        let mut d = doc(&["say hello"]);
        let before = d.row(0).unwrap().highlight().to_vec();

        let mut search = Search::new();
        search.step(&mut d, b"hello", Step::Restart).unwrap();
        search.finish(&mut d);

        assert_eq!(d.row(0).unwrap().highlight(), &before[..]);
    }

    #[test]
    fn finish_resets_for_a_new_session() {
        let mut d = doc(&["hit", "hit"]);
        let mut search = Search::new();
        search.step(&mut d, b"hit", Step::Restart).unwrap();
        search
            .step(&mut d, b"hit", Step::Move(Direction::Forward))
            .unwrap();
        search.finish(&mut d);

        // A fresh scan starts from the top again.
        assert_eq!(search.step(&mut d, b"hit", Step::Restart).unwrap().y, 0);
    }

    #[test]
    fn no_match_leaves_no_overlay() {
        let mut d = doc(&["plain"]);
        let before = d.row(0).unwrap().highlight().to_vec();
        let mut search = Search::new();
        assert_eq!(search.step(&mut d, b"zzz", Step::Restart), None);
        assert_eq!(d.row(0).unwrap().highlight(), &before[..]);
    }
}

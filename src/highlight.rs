use crate::document::Document;
use crate::syntax::{HighlightGroup, LexState};
use std::collections::HashMap;
use std::ops::Range;

impl Document {
    /// Revalidate highlighting after an edit touching rows
    /// `[from_row, edited_end)`.
    ///
    /// State pass: starting at the first changed row, recompute each row's
    /// end-of-line state seeded with the previous row's state. Past the
    /// edited range, a freshly computed state equal to the cached one means
    /// every following row is already consistent, so the pass stops there
    /// (fixed point); otherwise it runs to end of document. Rows before
    /// `from_row` are never revisited.
    ///
    /// Match pass: rebuild the change-point maps for every row the state
    /// pass visited (matches themselves never propagate across lines, but a
    /// row whose incoming state changed needs fresh matches).
    pub fn rehighlight(&mut self, from_row: usize, edited_end: usize) {
        let Some(tokenizer) = self.highlighter.clone() else {
            return;
        };
        let len = self.rows.len();
        let from = from_row.min(len);
        let mut extent = from;
        let mut row = from;
        while row < len {
            let incoming = if row == 0 {
                LexState::default()
            } else {
                self.rows[row - 1].hl_state
            };
            let (state, _) = tokenizer.tokenize_line(self.rows[row].render(), incoming);
            let settled = row >= edited_end && state == self.rows[row].hl_state;
            self.rows[row].hl_state = state;
            row += 1;
            extent = row;
            if settled {
                break;
            }
        }

        for row in from..extent {
            let incoming = if row == 0 {
                LexState::default()
            } else {
                self.rows[row - 1].hl_state
            };
            let (_, spans) = tokenizer.tokenize_line(self.rows[row].render(), incoming);
            self.rows[row].hl_matches = spans_to_matches(&spans);
        }
    }

    pub fn rehighlight_all(&mut self) {
        let len = self.rows.len();
        self.rehighlight(0, len);
    }

    /// Resolved group for a render column. A direct change point wins;
    /// otherwise scan strictly backward toward column 0 until a covering
    /// change point is found. The backward scan is what keeps colors correct
    /// when the viewport is scrolled into the middle of a span.
    pub fn group_at(&self, row: usize, col: usize) -> HighlightGroup {
        if row >= self.rows.len() {
            return HighlightGroup::Normal;
        }
        let matches = &self.rows[row].hl_matches;
        if let Some(group) = matches.get(&col) {
            return *group;
        }
        let mut back = col;
        while back > 0 {
            back -= 1;
            if let Some(group) = matches.get(&back) {
                return *group;
            }
        }
        HighlightGroup::Normal
    }

    /// Overlay the search-emphasis group over `[start, end)` of a row's
    /// render text. Grammar change points inside the range are dropped so
    /// the override wins; the group covering `end` is restored there. The
    /// overlay is transient: any rehighlight of the row clears it.
    pub fn overlay_search(&mut self, row: usize, start: usize, end: usize) {
        if row >= self.rows.len() || start >= end {
            return;
        }
        let after = self.group_at(row, end);
        let matches = &mut self.rows[row].hl_matches;
        matches.retain(|&col, _| col <= start || col >= end);
        matches.insert(start, HighlightGroup::Search);
        matches.insert(end, after);
    }

    /// Recompute one row's matches from grammar state, dropping any overlay.
    pub fn clear_search_overlay(&mut self, row: usize) {
        if row >= self.rows.len() {
            return;
        }
        match self.highlighter.clone() {
            Some(tokenizer) => {
                let incoming = if row == 0 {
                    LexState::default()
                } else {
                    self.rows[row - 1].hl_state
                };
                let (_, spans) = tokenizer.tokenize_line(self.rows[row].render(), incoming);
                self.rows[row].hl_matches = spans_to_matches(&spans);
            }
            None => self.rows[row].hl_matches.clear(),
        }
    }
}

/// Convert disjoint spans into a change-point map: the group opens at the
/// span start and `Normal` reasserts at the span end unless another span
/// starts exactly there.
fn spans_to_matches(spans: &[(Range<usize>, HighlightGroup)]) -> HashMap<usize, HighlightGroup> {
    let mut matches = HashMap::new();
    for (range, group) in spans {
        if range.start < range.end {
            matches.insert(range.start, *group);
        }
    }
    for (range, _) in spans {
        if range.start < range.end && !matches.contains_key(&range.end) {
            matches.insert(range.end, HighlightGroup::Normal);
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{Tokenizer, rust_grammar};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn rust_doc(content: &str) -> Document {
        let mut doc = Document::from_str(None, content);
        doc.highlighter = Some(Rc::new(rust_grammar()) as Rc<dyn Tokenizer>);
        doc.rehighlight_all();
        doc
    }

    #[test]
    fn test_group_at_backward_scan() {
        let mut doc = Document::from_str(None, "whatever line");
        doc.rows[0].hl_matches.insert(0, HighlightGroup::Keyword);
        doc.rows[0].hl_matches.insert(3, HighlightGroup::Normal);
        doc.rows[0].hl_matches.insert(10, HighlightGroup::String);
        assert_eq!(doc.group_at(0, 0), HighlightGroup::Keyword);
        assert_eq!(doc.group_at(0, 2), HighlightGroup::Keyword);
        assert_eq!(doc.group_at(0, 7), HighlightGroup::Normal);
        assert_eq!(doc.group_at(0, 12), HighlightGroup::String);
    }

    #[test]
    fn test_open_block_comment_propagates_down() {
        let mut doc = rust_doc("let a = 1;\nlet b = 2;\nlet c = 3;");
        assert_eq!(doc.group_at(1, 0), HighlightGroup::Keyword);

        doc.set_row_text(0, "/* open".to_string());
        assert_eq!(doc.group_at(1, 0), HighlightGroup::Comment);
        assert_eq!(doc.group_at(2, 0), HighlightGroup::Comment);

        doc.set_row_text(0, "/* open */".to_string());
        assert_eq!(doc.group_at(1, 0), HighlightGroup::Keyword);
        assert_eq!(doc.group_at(2, 0), HighlightGroup::Keyword);
    }

    #[test]
    fn test_edit_inside_open_comment_stops_at_fixed_point() {
        let mut doc = rust_doc("/* open\ninside\nstill inside\n*/ let x = 1;\nlet y = 2;");
        assert_eq!(doc.group_at(2, 0), HighlightGroup::Comment);
        doc.set_row_text(1, "inside edited".to_string());
        assert_eq!(doc.group_at(1, 0), HighlightGroup::Comment);
        assert_eq!(doc.group_at(4, 0), HighlightGroup::Keyword);
    }

    struct Probe {
        seen: RefCell<Vec<String>>,
        counter: Cell<usize>,
        force_change: bool,
    }

    impl Probe {
        fn new(force_change: bool) -> Self {
            Self {
                seen: RefCell::new(Vec::new()),
                counter: Cell::new(0),
                force_change,
            }
        }
    }

    impl Tokenizer for Probe {
        fn tokenize_line(
            &self,
            text: &str,
            incoming: LexState,
        ) -> (LexState, Vec<(std::ops::Range<usize>, HighlightGroup)>) {
            self.seen.borrow_mut().push(text.to_string());
            let state = if self.force_change {
                self.counter.set(self.counter.get() + 1);
                LexState(Some(self.counter.get()))
            } else {
                incoming
            };
            (state, Vec::new())
        }
    }

    #[test]
    fn test_state_pass_never_revisits_rows_above_edit() {
        let probe = Rc::new(Probe::new(false));
        let mut doc = Document::from_str(None, "r0\nr1\nr2\nr3\nr4\nr5");
        doc.highlighter = Some(probe.clone() as Rc<dyn Tokenizer>);
        doc.rehighlight_all();

        probe.seen.borrow_mut().clear();
        doc.set_row_text(3, "r3 edited".to_string());
        assert!(
            probe
                .seen
                .borrow()
                .iter()
                .all(|text| text.starts_with("r3") || text.starts_with("r4"))
        );
    }

    #[test]
    fn test_state_pass_terminates_when_every_state_changes() {
        let probe = Rc::new(Probe::new(true));
        let mut doc = Document::from_str(None, "r0\nr1\nr2\nr3\nr4\nr5");
        doc.highlighter = Some(probe.clone() as Rc<dyn Tokenizer>);
        doc.rehighlight_all();

        probe.seen.borrow_mut().clear();
        doc.set_row_text(2, "r2 edited".to_string());
        let seen = probe.seen.borrow();
        // State pass plus match pass over rows 2..6, never rows 0 or 1.
        assert!(seen.iter().all(|text| !text.starts_with("r0")));
        assert!(seen.iter().all(|text| !text.starts_with("r1")));
        assert!(seen.iter().any(|text| text.starts_with("r5")));
    }

    #[test]
    fn test_search_overlay_beats_grammar_and_clears() {
        let mut doc = rust_doc("let x = 1;");
        assert_eq!(doc.group_at(0, 0), HighlightGroup::Keyword);

        doc.overlay_search(0, 0, 3);
        assert_eq!(doc.group_at(0, 0), HighlightGroup::Search);
        assert_eq!(doc.group_at(0, 2), HighlightGroup::Search);
        assert_ne!(doc.group_at(0, 4), HighlightGroup::Search);

        doc.clear_search_overlay(0);
        assert_eq!(doc.group_at(0, 0), HighlightGroup::Keyword);
    }

    #[test]
    fn test_no_highlighter_is_a_no_op() {
        let mut doc = Document::from_str(None, "let x = 1;");
        doc.rehighlight_all();
        assert_eq!(doc.group_at(0, 0), HighlightGroup::Normal);
    }
}

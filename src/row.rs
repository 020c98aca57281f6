use crate::syntax::{HighlightGroup, LexState};
use std::collections::HashMap;
use unicode_width::UnicodeWidthChar;

/// One line of a document. The render form (tabs expanded to tab stops,
/// widths measured per Unicode rules) is always derived from the current raw
/// text, so the raw text is only reachable through `set_text`.
#[derive(Debug, Clone)]
pub struct Row {
    /// Index of this row in its document, maintained by `Document::splice`.
    pub idx: usize,
    text: String,
    render: String,
    render_width: usize,
    /// Lexer state at end of line ("state of the world" resumed by the
    /// next line's tokenization).
    pub hl_state: LexState,
    /// Render-column -> group map of color change points: a group opens at
    /// its column and runs until the next entry.
    pub hl_matches: HashMap<usize, HighlightGroup>,
}

impl Row {
    pub fn new(text: impl Into<String>, idx: usize, tab_width: usize) -> Self {
        let mut row = Self {
            idx,
            text: text.into(),
            render: String::new(),
            render_width: 0,
            hl_state: LexState::default(),
            hl_matches: HashMap::new(),
        };
        row.update_render(tab_width);
        row
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn render(&self) -> &str {
        &self.render
    }

    pub fn render_width(&self) -> usize {
        self.render_width
    }

    pub fn set_text(&mut self, text: String, tab_width: usize) {
        self.text = text;
        self.update_render(tab_width);
    }

    fn update_render(&mut self, tab_width: usize) {
        let mut render = String::with_capacity(self.text.len());
        let mut width = 0;
        for ch in self.text.chars() {
            if ch == '\t' {
                let pad = tab_width - width % tab_width;
                for _ in 0..pad {
                    render.push(' ');
                }
                width += pad;
            } else {
                render.push(ch);
                width += UnicodeWidthChar::width(ch).unwrap_or(0);
            }
        }
        self.render = render;
        self.render_width = width;
    }

    /// Display column where the raw character at `col` starts.
    pub fn render_col(&self, col: usize, tab_width: usize) -> usize {
        let mut width = 0;
        for ch in self.text.chars().take(col) {
            if ch == '\t' {
                width += tab_width - width % tab_width;
            } else {
                width += UnicodeWidthChar::width(ch).unwrap_or(0);
            }
        }
        width
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tab_expansion() {
        let row = Row::new("a\tb", 0, 8);
        assert_eq!(row.render(), "a       b");
        assert_eq!(row.render_width(), 9);
    }

    #[test]
    fn test_tab_at_stop_advances_full_width() {
        // A tab sitting exactly on a stop still advances a full tab width.
        let row = Row::new("12345678\tx", 0, 8);
        assert_eq!(row.render().len(), 17);
    }

    #[test]
    fn test_render_col() {
        let row = Row::new("a\tb", 0, 8);
        assert_eq!(row.render_col(0, 8), 0);
        assert_eq!(row.render_col(1, 8), 1);
        assert_eq!(row.render_col(2, 8), 8);
        assert_eq!(row.render_col(3, 8), 9);
    }

    #[test]
    fn test_wide_char_width() {
        let row = Row::new("a\u{4e16}b", 0, 8);
        assert_eq!(row.render_width(), 4);
        assert_eq!(row.render_col(2, 8), 3);
    }

    #[test]
    fn test_set_text_recomputes_render() {
        let mut row = Row::new("old", 0, 8);
        row.set_text("a\tnew".to_string(), 8);
        assert_eq!(row.render(), "a       new");
        assert_eq!(row.char_len(), 5);
    }
}

use crate::row::Row;
use crate::syntax::Tokenizer;
use crate::undo::UndoJournal;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

pub const DEFAULT_TAB_WIDTH: usize = 8;

/// One open document: an ordered row store plus cursor, mark, per-document
/// modes and an optionally attached highlighter.
///
/// Invariants: `cursor_row` is in `[0, rows.len()]` (equal to the row count
/// only as the end-of-buffer sentinel) and `cursor_col` never exceeds the
/// character length of its row. Violating callers corrupt the row store, so
/// out-of-range indices are treated as fatal rather than recovered.
#[derive(Clone)]
pub struct Document {
    pub rows: Vec<Row>,
    pub cursor_row: usize,
    pub cursor_col: usize,
    /// Column vertical motion aims for when passing through shorter lines.
    pub preferred_col: usize,
    /// One end of the region; may go stale as the document shrinks, so
    /// every consumer checks `mark_valid` first.
    pub mark: Option<(usize, usize)>,
    pub dirty: bool,
    pub filename: Option<PathBuf>,
    pub modes: HashSet<String>,
    pub tab_width: usize,
    pub highlighter: Option<Rc<dyn Tokenizer>>,
    pub undo: UndoJournal,
}

impl Document {
    pub fn new() -> Self {
        Self {
            rows: vec![Row::new("", 0, DEFAULT_TAB_WIDTH)],
            cursor_row: 0,
            cursor_col: 0,
            preferred_col: 0,
            mark: None,
            dirty: false,
            filename: None,
            modes: HashSet::new(),
            tab_width: DEFAULT_TAB_WIDTH,
            highlighter: None,
            undo: UndoJournal::new(),
        }
    }

    /// Build a document from a string, one row per line. A trailing
    /// newline does not produce an extra empty row: `"a\n"` and `"a"`
    /// both load as a single row, and `contents()` joins rows with
    /// `\n` without a trailing one.
    pub fn from_str(filename: Option<PathBuf>, content: &str) -> Self {
        let mut doc = Self::new();
        doc.filename = filename;
        if !content.is_empty() {
            doc.rows = content
                .lines()
                .enumerate()
                .map(|(idx, line)| Row::new(line, idx, doc.tab_width))
                .collect();
        }
        doc
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.rows[row].char_len()
    }

    /// Raw content joined back into one string.
    pub fn contents(&self) -> String {
        self.rows
            .iter()
            .map(Row::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn new_row(&self, text: String) -> Row {
        Row::new(text, 0, self.tab_width)
    }

    // ── Row store ────────────────────────────────────────────

    /// Replace rows `[start, end)` with `new_rows` and re-index the suffix.
    /// Callers revalidate highlighting for the affected range afterwards.
    pub fn splice(&mut self, start: usize, end: usize, new_rows: Vec<Row>) {
        self.rows.splice(start..end, new_rows);
        for idx in start..self.rows.len() {
            self.rows[idx].idx = idx;
        }
    }

    /// Replace one row's raw text; only that row's render is recomputed.
    pub fn set_row_text(&mut self, row: usize, text: String) {
        self.rows[row].set_text(text, self.tab_width);
        self.dirty = true;
        self.rehighlight(row, row + 1);
    }

    /// Insert `text` at (row, col), splitting on newlines: the first segment
    /// splices into the row at the column, middle segments become new rows,
    /// the last segment prefixes the remainder after the column. Returns the
    /// position just past the inserted text. Inserting at the end-of-buffer
    /// sentinel row first appends an empty row.
    pub fn insert_span(&mut self, row: usize, col: usize, text: &str) -> (usize, usize) {
        if row == self.rows.len() {
            let sentinel = self.new_row(String::new());
            self.rows.push(sentinel);
            let idx = self.rows.len() - 1;
            self.rows[idx].idx = idx;
        }
        let old = self.rows[row].text().to_string();
        let split = byte_of(&old, col);
        let segments: Vec<&str> = text.split('\n').collect();
        self.dirty = true;

        if segments.len() == 1 {
            let merged = format!("{}{}{}", &old[..split], text, &old[split..]);
            self.rows[row].set_text(merged, self.tab_width);
            self.rehighlight(row, row + 1);
            return (row, col + text.chars().count());
        }

        let first = format!("{}{}", &old[..split], segments[0]);
        self.rows[row].set_text(first, self.tab_width);

        let mut new_rows = Vec::with_capacity(segments.len() - 1);
        for segment in &segments[1..segments.len() - 1] {
            new_rows.push(self.new_row((*segment).to_string()));
        }
        let last = segments[segments.len() - 1];
        let end_col = last.chars().count();
        new_rows.push(self.new_row(format!("{}{}", last, &old[split..])));
        self.splice(row + 1, row + 1, new_rows);

        let end_row = row + segments.len() - 1;
        self.rehighlight(row, end_row + 1);
        (end_row, end_col)
    }

    /// Remove the span `[start, end)` and return exactly the removed text.
    /// Multi-row spans merge the first and last row remainders into one row
    /// and splice the interior rows out.
    pub fn delete_span(&mut self, start: (usize, usize), end: (usize, usize)) -> String {
        let (start_row, start_col) = start;
        let (end_row, end_col) = end;
        self.dirty = true;

        if start_row == end_row {
            let text = self.rows[start_row].text().to_string();
            let from = byte_of(&text, start_col);
            let to = byte_of(&text, end_col);
            let removed = text[from..to].to_string();
            self.rows[start_row]
                .set_text(format!("{}{}", &text[..from], &text[to..]), self.tab_width);
            self.rehighlight(start_row, start_row + 1);
            return removed;
        }

        let first = self.rows[start_row].text().to_string();
        let last = self.rows[end_row].text().to_string();
        let from = byte_of(&first, start_col);
        let to = byte_of(&last, end_col);

        let mut removed = String::from(&first[from..]);
        for row in start_row + 1..end_row {
            removed.push('\n');
            removed.push_str(self.rows[row].text());
        }
        removed.push('\n');
        removed.push_str(&last[..to]);

        self.rows[start_row].set_text(format!("{}{}", &first[..from], &last[to..]), self.tab_width);
        self.splice(start_row + 1, end_row + 1, Vec::new());
        self.rehighlight(start_row, start_row + 1);
        removed
    }

    /// Text of the span `[start, end)` without mutating anything; the same
    /// concatenation `delete_span` would return.
    pub fn span_text(&self, start: (usize, usize), end: (usize, usize)) -> String {
        let (start_row, start_col) = start;
        let (end_row, end_col) = end;
        if start_row == end_row {
            let text = self.rows[start_row].text();
            return text[byte_of(text, start_col)..byte_of(text, end_col)].to_string();
        }
        let first = self.rows[start_row].text();
        let last = self.rows[end_row].text();
        let mut out = String::from(&first[byte_of(first, start_col)..]);
        for row in start_row + 1..end_row {
            out.push('\n');
            out.push_str(self.rows[row].text());
        }
        out.push('\n');
        out.push_str(&last[..byte_of(last, end_col)]);
        out
    }

    // ── Mark ─────────────────────────────────────────────────

    /// A mark is only usable while both it and the cursor still point into
    /// the row store; the document may have shrunk underneath it.
    pub fn mark_valid(&self) -> bool {
        match self.mark {
            Some((row, col)) => {
                self.cursor_row < self.rows.len()
                    && row < self.rows.len()
                    && col <= self.rows[row].char_len()
            }
            None => false,
        }
    }

    // ── Modes ────────────────────────────────────────────────

    pub fn set_mode(&mut self, name: &str, enabled: bool) {
        if enabled {
            self.modes.insert(name.to_string());
        } else {
            self.modes.remove(name);
        }
    }

    pub fn toggle_mode(&mut self, name: &str) {
        if !self.modes.remove(name) {
            self.modes.insert(name.to_string());
        }
    }

    pub fn has_mode(&self, name: &str) -> bool {
        self.modes.contains(name)
    }

    pub fn enabled_modes(&self) -> Vec<String> {
        let mut modes: Vec<String> = self.modes.iter().cloned().collect();
        modes.sort();
        modes
    }

    // ── Cursor motion ────────────────────────────────────────

    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.row_len(self.cursor_row);
        }
        self.preferred_col = self.cursor_col;
    }

    pub fn move_right(&mut self) {
        if self.cursor_row == self.rows.len() {
            return;
        }
        if self.cursor_col < self.row_len(self.cursor_row) {
            self.cursor_col += 1;
        } else {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
        self.preferred_col = self.cursor_col;
    }

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.preferred_col.min(self.row_len(self.cursor_row));
        }
    }

    pub fn move_down(&mut self) {
        if self.cursor_row < self.rows.len() {
            self.cursor_row += 1;
            self.cursor_col = if self.cursor_row == self.rows.len() {
                0
            } else {
                self.preferred_col.min(self.row_len(self.cursor_row))
            };
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte offset of character index `col`, clamped to the end of the line.
pub(crate) fn byte_of(text: &str, col: usize) -> usize {
    text.char_indices()
        .nth(col)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len())
}

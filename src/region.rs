use crate::editor::Editor;
use crate::undo::{EditKind, UndoEntry};

/// The row/column-ordered span between cursor and mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub start: (usize, usize),
    pub end: (usize, usize),
}

impl Region {
    /// Order two positions lexicographically by (row, col); same-row spans
    /// tie-break on column.
    pub fn normalize(a: (usize, usize), b: (usize, usize)) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }
}

impl Editor {
    /// The normalized region between mark and cursor, or `None` when the
    /// mark is missing or has gone stale.
    fn region(&self) -> Option<Region> {
        let doc = self.doc();
        if !doc.mark_valid() {
            return None;
        }
        let mark = doc.mark?;
        Some(Region::normalize(mark, (doc.cursor_row, doc.cursor_col)))
    }

    pub fn set_mark(&mut self) {
        let doc = self.doc_mut();
        doc.mark = Some((doc.cursor_row, doc.cursor_col));
        self.set_status("Mark set.");
    }

    pub fn swap_mark_and_cursor(&mut self) {
        let doc = self.doc_mut();
        if doc.mark_valid() {
            let cursor = (doc.cursor_row, doc.cursor_col);
            let (mark_row, mark_col) = doc.mark.unwrap_or(cursor);
            doc.cursor_row = mark_row;
            doc.cursor_col = mark_col;
            doc.preferred_col = mark_col;
            doc.mark = Some(cursor);
        } else {
            self.set_status("Invalid mark position");
        }
    }

    /// Delete a span, journal it, and leave the cursor at its start.
    /// Returns the removed text; the caller decides whether it goes to the
    /// clipboard (kills do, plain deletes like line joins do not).
    fn delete_and_journal(&mut self, start: (usize, usize), end: (usize, usize)) -> String {
        let doc = self.doc_mut();
        let cursor_before = (doc.cursor_row, doc.cursor_col);
        let removed = doc.delete_span(start, end);
        doc.cursor_row = start.0;
        doc.cursor_col = start.1;
        doc.preferred_col = start.1;
        doc.undo.push(UndoEntry {
            kind: EditKind::Deletion,
            start,
            end,
            text: removed.clone(),
            cursor_before,
            cursor_after: start,
        });
        removed
    }

    /// Insert `text` at `at` `times` times in sequence, journal the whole
    /// run as one insertion, and leave the cursor at the end.
    fn insert_and_journal(&mut self, at: (usize, usize), text: &str, times: usize) -> (usize, usize) {
        let doc = self.doc_mut();
        let cursor_before = (doc.cursor_row, doc.cursor_col);
        let mut end = at;
        for _ in 0..times {
            end = doc.insert_span(end.0, end.1, text);
        }
        doc.cursor_row = end.0;
        doc.cursor_col = end.1;
        doc.preferred_col = end.1;
        doc.undo.push(UndoEntry {
            kind: EditKind::Insertion,
            start: at,
            end,
            text: text.repeat(times),
            cursor_before,
            cursor_after: end,
        });
        end
    }

    /// Kill the region: remove it, journal the deletion, and overwrite the
    /// clipboard with exactly the removed text.
    pub fn kill_region(&mut self) {
        let Some(region) = self.region() else {
            self.set_status("Invalid mark position");
            return;
        };
        let removed = self.delete_and_journal(region.start, region.end);
        self.clipboard = removed;
    }

    /// Copy the region into the clipboard without touching the row store,
    /// the cursor, or the undo journal.
    pub fn copy_region(&mut self) {
        let Some(region) = self.region() else {
            self.set_status("Invalid mark position");
            return;
        };
        self.clipboard = self.doc().span_text(region.start, region.end);
    }

    /// Re-insert the clipboard at the cursor, once per repeat count (only
    /// counts above one multiply). The clipboard is read, never consumed.
    pub fn yank(&mut self) {
        // One command, one use of the repeat count: consume it up front so
        // a soft error does not leave it armed for the next command.
        let times = match self.take_repeat() {
            Some(n) if n > 1 => n as usize,
            _ => 1,
        };
        if self.clipboard.is_empty() {
            self.set_status("Kill ring empty");
            return;
        }
        let payload = self.clipboard.clone();
        let at = {
            let doc = self.doc();
            (doc.cursor_row, doc.cursor_col)
        };
        self.insert_and_journal(at, &payload, times);
    }

    /// Kill to end of line, with the conventional numeric-prefix meanings:
    /// no prefix kills cursor to end of line (or joins at end of line);
    /// 0 kills line start to cursor; n > 1 kills n lines forward (clamped
    /// one row short of the true end); n < 0 kills |n| lines backward
    /// (clamped at the document start).
    pub fn kill_to_eol(&mut self) {
        // Consume the repeat count before any early return; soft errors
        // must not leave it armed for the next command.
        let prefix = self.take_repeat();
        let (row, col, rows) = {
            let doc = self.doc();
            (doc.cursor_row, doc.cursor_col, doc.row_count())
        };
        if row == rows {
            self.set_status("End of buffer");
            return;
        }
        match prefix {
            Some(0) => {
                if col > 0 {
                    let removed = self.delete_and_journal((row, 0), (row, col));
                    self.clipboard = removed;
                }
            }
            Some(n) if n > 1 => {
                let end_row = (row + n as usize).min(rows - 1);
                if end_row <= row {
                    // The forward clamp collapsed onto the cursor row; the
                    // last line cannot be killed by a forward line kill.
                    self.set_status("End of buffer");
                    return;
                }
                let removed = self.delete_and_journal((row, col), (end_row, 0));
                self.clipboard = removed;
            }
            Some(n) if n < 0 => {
                let start_row = row.saturating_sub(n.unsigned_abs() as usize);
                let removed = self.delete_and_journal((start_row, 0), (row, col));
                self.clipboard = removed;
            }
            _ => {
                let len = self.doc().row_len(row);
                if col >= len {
                    // At end of line: join with the following row. A plain
                    // delete, not a kill; the clipboard is untouched.
                    if row + 1 < rows {
                        self.delete_and_journal((row, col), (row + 1, 0));
                    } else {
                        self.set_status("End of buffer");
                    }
                } else {
                    let removed = self.delete_and_journal((row, col), (row, len));
                    self.clipboard = removed;
                }
            }
        }
    }

    /// Kill the region, reinsert `trans` of the killed text at the same
    /// location, and restore the pre-call clipboard. Case transforms must
    /// not clobber the kill ring.
    pub fn transpose_region(&mut self, trans: fn(&str) -> String) {
        let Some(region) = self.region() else {
            self.set_status("Invalid mark position");
            return;
        };
        let saved = self.clipboard.clone();
        let removed = self.delete_and_journal(region.start, region.end);
        self.insert_and_journal(region.start, &trans(&removed), 1);
        self.clipboard = saved;
    }

    pub fn upcase_region(&mut self) {
        self.transpose_region(|text| text.to_uppercase());
    }

    pub fn downcase_region(&mut self) {
        self.transpose_region(|text| text.to_lowercase());
    }
}

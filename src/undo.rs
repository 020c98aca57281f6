use crate::document::Document;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Insertion,
    Deletion,
}

/// One invertible edit: the kind, the (row, col) span it covered, and the
/// exact text inserted or removed. Plain data, so inverting never has to
/// re-diff against current content. The cursor fields let undo/redo restore
/// where the user was, not just what the text said.
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub kind: EditKind,
    pub start: (usize, usize),
    pub end: (usize, usize),
    pub text: String,
    pub cursor_before: (usize, usize),
    pub cursor_after: (usize, usize),
}

impl UndoEntry {
    /// Invert this edit against the document: reinsert a deletion's payload
    /// at its recorded start, or delete an insertion's recorded span.
    pub fn apply_inverse(&self, doc: &mut Document) {
        match self.kind {
            EditKind::Deletion => {
                doc.insert_span(self.start.0, self.start.1, &self.text);
            }
            EditKind::Insertion => {
                doc.delete_span(self.start, self.end);
            }
        }
        doc.cursor_row = self.cursor_before.0;
        doc.cursor_col = self.cursor_before.1;
        doc.preferred_col = doc.cursor_col;
    }

    /// Reapply this edit forward (redo).
    pub fn apply_forward(&self, doc: &mut Document) {
        match self.kind {
            EditKind::Deletion => {
                doc.delete_span(self.start, self.end);
            }
            EditKind::Insertion => {
                doc.insert_span(self.start.0, self.start.1, &self.text);
            }
        }
        doc.cursor_row = self.cursor_after.0;
        doc.cursor_col = self.cursor_after.1;
        doc.preferred_col = doc.cursor_col;
    }
}

/// Append-only journal of invertible edits driving undo/redo as two
/// cooperating stacks. In-memory only; history does not survive the process.
#[derive(Debug, Clone)]
pub struct UndoJournal {
    undo_stack: Vec<UndoEntry>,
    redo_stack: Vec<UndoEntry>,
    max_depth: usize,
}

impl UndoJournal {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth: 1000,
        }
    }

    /// Record a fresh edit. Anything that is not itself an undo/redo
    /// invalidates the redo stack.
    pub fn push(&mut self, entry: UndoEntry) {
        self.undo_stack.push(entry);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }

    /// Pop the most recent edit onto the redo stack, returning it for the
    /// caller to invert.
    pub fn pop_undo(&mut self) -> Option<UndoEntry> {
        let entry = self.undo_stack.pop()?;
        self.redo_stack.push(entry.clone());
        Some(entry)
    }

    /// Pop the redo stack back onto the undo stack, returning the entry for
    /// the caller to reapply.
    pub fn pop_redo(&mut self) -> Option<UndoEntry> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.undo_stack.len()
    }
}

impl Default for UndoJournal {
    fn default() -> Self {
        Self::new()
    }
}

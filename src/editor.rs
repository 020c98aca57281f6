use crate::document::Document;
use crate::syntax::{SyntaxRegistry, Tokenizer};
use std::collections::HashSet;
use std::rc::Rc;

/// Session context threaded through every operation: the open documents,
/// the shared clipboard register, the pending repeat count, the single-slot
/// status sink, and the grammar registry. Everything here is owned by one
/// thread; one input event is processed to completion before the next.
pub struct Editor {
    pub documents: Vec<Document>,
    current: usize,
    /// Single shared clipboard slot: overwritten by every kill/copy, read
    /// (never consumed) by yank. Independent of the undo journal.
    pub clipboard: String,
    repeat: Option<i64>,
    status: Option<String>,
    default_modes: HashSet<String>,
    pub registry: SyntaxRegistry,
}

impl Editor {
    pub fn new() -> Self {
        Self {
            documents: vec![Document::new()],
            current: 0,
            clipboard: String::new(),
            repeat: None,
            status: None,
            default_modes: HashSet::new(),
            registry: SyntaxRegistry::builtin(),
        }
    }

    pub fn doc(&self) -> &Document {
        &self.documents[self.current]
    }

    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.documents[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn switch_to(&mut self, index: usize) {
        if index < self.documents.len() {
            self.current = index;
        }
    }

    /// Adopt a document: apply the session's default modes, make it current,
    /// and resolve its grammar. Returns its index.
    pub fn open(&mut self, mut doc: Document) -> usize {
        for mode in &self.default_modes {
            doc.modes.insert(mode.clone());
        }
        self.documents.push(doc);
        self.current = self.documents.len() - 1;
        self.reselect_syntax();
        self.current
    }

    /// Re-run grammar detection for the current document and rehighlight it
    /// from scratch. Called once at open; callers may invoke it again after
    /// a rename or an explicit request.
    pub fn reselect_syntax(&mut self) {
        let doc = &self.documents[self.current];
        let first_line = doc.rows.first().map(|r| r.text().to_string());
        let grammar = self
            .registry
            .detect(doc.filename.as_deref(), first_line.as_deref().unwrap_or(""));
        let doc = &mut self.documents[self.current];
        doc.highlighter = grammar.map(|g| g as Rc<dyn Tokenizer>);
        doc.rehighlight_all();
    }

    // ── Repeat count (universal argument) ────────────────────

    /// Arm the repeat count for the next command.
    pub fn set_repeat(&mut self, count: i64) {
        self.repeat = Some(count);
    }

    /// Consume the repeat count; it modifies exactly one command.
    pub fn take_repeat(&mut self) -> Option<i64> {
        self.repeat.take()
    }

    pub fn repeat_count(&self) -> Option<i64> {
        self.repeat
    }

    // ── Status sink ──────────────────────────────────────────

    /// Single-slot sink: each message overwrites the previous one.
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn take_status(&mut self) -> Option<String> {
        self.status.take()
    }

    // ── Default modes ────────────────────────────────────────

    pub fn add_default_mode(&mut self, name: &str) {
        self.default_modes.insert(name.to_string());
    }

    pub fn remove_default_mode(&mut self, name: &str) {
        self.default_modes.remove(name);
    }

    // ── Undo / redo ──────────────────────────────────────────

    pub fn undo(&mut self) {
        let doc = self.doc_mut();
        match doc.undo.pop_undo() {
            Some(entry) => {
                entry.apply_inverse(doc);
                self.set_status("Undo!");
            }
            None => self.set_status("Nothing to undo"),
        }
    }

    pub fn redo(&mut self) {
        let doc = self.doc_mut();
        match doc.undo.pop_redo() {
            Some(entry) => {
                entry.apply_forward(doc);
                self.set_status("Redo!");
            }
            None => self.set_status("Nothing to redo"),
        }
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

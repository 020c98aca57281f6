//! Text-editing core for an Emacs-style terminal editor: documents as
//! ordered row stores, cursor/mark regions with kill-ring semantics, a
//! plain-data undo journal, and incremental syntax highlighting that stays
//! consistent with every mutation without whole-document rescans.
//!
//! Everything runs single-threaded and synchronously; rendering, input
//! decoding, keybinding dispatch and file I/O live in adjacent layers that
//! drive this core through [`Editor`].

pub mod document;
pub mod editor;
pub mod highlight;
pub mod region;
pub mod row;
pub mod syntax;
pub mod undo;

pub use document::{DEFAULT_TAB_WIDTH, Document};
pub use editor::Editor;
pub use region::Region;
pub use row::Row;
pub use syntax::{Grammar, HighlightGroup, LexState, SyntaxRegistry, Tokenizer};
pub use undo::{EditKind, UndoEntry, UndoJournal};

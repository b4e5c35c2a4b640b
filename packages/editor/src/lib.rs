//! # Folio Editor
//!
//! Transactional editing engine on top of the Folio document model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ commands: prioritized bus                   │
//! │  Critical → High → Normal → Low, first      │
//! │  handler returning true wins                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ session: Editor                             │
//! │  - read / update / try_update               │
//! │  - nested updates share one draft           │
//! │  - read-only mode                           │
//! └─────────────────────────────────────────────┘
//!                     ↓ commit
//! ┌─────────────────────────────────────────────┐
//! │ mutations: created / updated / destroyed    │
//! │  per node type → listeners, history         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use folio_editor::{register_rich_text, Editor, EditorConfig, INSERT_TEXT};
//!
//! let editor = Editor::new(EditorConfig::default());
//! let _rich_text = register_rich_text(&editor);
//!
//! editor.dispatch(&INSERT_TEXT, "Hello".to_string());
//! assert_eq!(editor.read(|s| s.text_content(s.root())), "Hello");
//! ```

mod commands;
mod config;
mod errors;
mod mutations;
mod rich_text;
mod session;
mod transaction;
mod undo_stack;

pub use commands::{Command, CommandHandler, CommandPriority, Unregister};
pub use config::EditorConfig;
pub use errors::{EditorError, EditorResult};
pub use mutations::{
    diff_dirty, diff_snapshots, ListenerOptions, MutationKind, MutationSet, NodeMutations,
};
pub use rich_text::{
    register_rich_text, BLUR, DELETE_CHARACTER, FOCUS, INSERT_PARAGRAPH, INSERT_TEXT,
    KEY_ARROW_DOWN, KEY_ARROW_UP, KEY_BACKSPACE, KEY_DELETE, KEY_ENTER, KEY_ESCAPE, KEY_TAB,
    REMOVE_NODE, SELECTION_CHANGE,
};
pub use session::{Editor, MutationContext, UpdateInfo, UpdateTag, WeakEditor};
pub use transaction::Transaction;
pub use undo_stack::{register_history, History, UndoStack, REDO, UNDO};

// Re-export model types for convenience
pub use folio_model as model;

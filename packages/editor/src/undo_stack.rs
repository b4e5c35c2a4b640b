//! # Undo/Redo Stack
//!
//! Snapshot-based history.
//!
//! ## Design
//!
//! - Every committed update that changed nodes pushes the previous snapshot
//! - Undo restores the top entry and moves the current snapshot to redo
//! - Redo does the reverse
//! - New entries clear the redo stack
//! - Updates tagged `MergeHistory` fold into the entry before them
//! - Updates tagged `Historic` or `SkipHistory` never create entries
//!
//! Snapshots share untouched records, so an entry costs roughly the nodes
//! that changed in its update.

use crate::commands::{Command, CommandPriority, Unregister};
use crate::{Editor, UpdateInfo, UpdateTag};
use folio_model::Snapshot;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};

pub const UNDO: Command<()> = Command::new("UNDO");
pub const REDO: Command<()> = Command::new("REDO");

/// Undo/redo stack of snapshots
#[derive(Debug)]
pub struct UndoStack {
    /// Snapshots before each undoable update (most recent last)
    undo_stack: Vec<Snapshot>,

    /// Snapshots that undo moved away from (most recent last)
    redo_stack: Vec<Snapshot>,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,
}

impl UndoStack {
    /// Create new empty undo stack
    pub fn new() -> Self {
        Self::with_limit(100)
    }

    /// Create undo stack with custom limit
    pub fn with_limit(max_levels: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_levels,
        }
    }

    /// Feed one committed update into the history
    pub fn record(&mut self, info: &UpdateInfo) {
        if info.has_tag(UpdateTag::Historic) || info.has_tag(UpdateTag::SkipHistory) {
            trace!(generation = info.snapshot.generation(), "Update excluded from history");
            return;
        }
        if info.dirty.is_empty() {
            return;
        }
        if info.has_tag(UpdateTag::MergeHistory) && !self.undo_stack.is_empty() {
            self.redo_stack.clear();
            return;
        }
        self.push(info.previous.clone());
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();

        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }
    }

    /// Pop the snapshot to return to, remembering `current` for redo
    pub fn undo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let target = self.undo_stack.pop()?;
        self.redo_stack.push(current);
        Some(target)
    }

    /// Pop the snapshot to return to, remembering `current` for undo
    pub fn redo(&mut self, current: Snapshot) -> Option<Snapshot> {
        let target = self.redo_stack.pop()?;
        self.undo_stack.push(current);
        Some(target)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get number of undo levels available
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get number of redo levels available
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Clear all undo/redo history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared handle to the history attached to an editor
#[derive(Debug, Clone)]
pub struct History {
    stack: Rc<RefCell<UndoStack>>,
}

impl History {
    pub fn can_undo(&self) -> bool {
        self.stack.borrow().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.stack.borrow().can_redo()
    }

    pub fn undo_count(&self) -> usize {
        self.stack.borrow().undo_count()
    }

    pub fn clear(&self) {
        self.stack.borrow_mut().clear();
    }
}

fn step(editor: &Editor, stack: &RefCell<UndoStack>, forward: bool) -> bool {
    let current = editor.snapshot();
    let target = if forward {
        stack.borrow_mut().redo(current)
    } else {
        stack.borrow_mut().undo(current)
    };
    let Some(target) = target else {
        return false;
    };
    debug!(forward, generation = target.generation(), "Restoring history entry");
    editor
        .update_tagged(UpdateTag::Historic, |tx| tx.restore(&target))
        .is_ok()
}

/// Attach undo/redo to an editor, sized by its `history_limit`
pub fn register_history(editor: &Editor) -> (History, Unregister) {
    let stack = Rc::new(RefCell::new(UndoStack::with_limit(
        editor.config().history_limit,
    )));

    let recorder = Rc::clone(&stack);
    let undo = Rc::clone(&stack);
    let redo = Rc::clone(&stack);
    let unregister = Unregister::merge([
        editor.register_update_listener(move |_, info| recorder.borrow_mut().record(info)),
        editor.register_command(&UNDO, CommandPriority::Low, move |editor, _| {
            step(editor, &undo, false)
        }),
        editor.register_command(&REDO, CommandPriority::Low, move |editor, _| {
            step(editor, &redo, true)
        }),
    ]);
    (History { stack }, unregister)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorConfig;

    fn text(editor: &Editor) -> String {
        editor.read(|s| s.text_content(s.root()))
    }

    #[test]
    fn test_undo_redo() {
        let editor = Editor::default();
        let (history, _h) = register_history(&editor);

        editor.update(|tx| tx.insert_text("a")).unwrap().unwrap();
        editor.update(|tx| tx.insert_text("b")).unwrap().unwrap();
        assert_eq!(history.undo_count(), 2);

        assert!(editor.dispatch(&UNDO, ()));
        assert_eq!(text(&editor), "a");
        assert!(history.can_redo());

        assert!(editor.dispatch(&REDO, ()));
        assert_eq!(text(&editor), "ab");
        assert!(!history.can_redo());
    }

    #[test]
    fn test_new_update_clears_redo() {
        let editor = Editor::default();
        let (history, _h) = register_history(&editor);

        editor.update(|tx| tx.insert_text("a")).unwrap().unwrap();
        editor.dispatch(&UNDO, ());
        assert!(history.can_redo());

        editor.update(|tx| tx.insert_text("z")).unwrap().unwrap();
        assert!(!history.can_redo());
    }

    #[test]
    fn test_skip_and_merge_tags() {
        let editor = Editor::default();
        let (history, _h) = register_history(&editor);

        editor.update(|tx| tx.insert_text("a")).unwrap().unwrap();
        editor
            .update_tagged(UpdateTag::MergeHistory, |tx| tx.insert_text("b"))
            .unwrap()
            .unwrap();
        editor
            .update_tagged(UpdateTag::SkipHistory, |tx| tx.insert_text("c"))
            .unwrap()
            .unwrap();
        assert_eq!(history.undo_count(), 1);

        editor.dispatch(&UNDO, ());
        assert_eq!(text(&editor), "");
        assert!(!editor.dispatch(&UNDO, ()));
    }

    #[test]
    fn test_max_levels() {
        let editor = Editor::new(EditorConfig {
            history_limit: 2,
            ..EditorConfig::default()
        });
        let (history, _h) = register_history(&editor);

        for c in ["a", "b", "c"] {
            editor.update(|tx| tx.insert_text(c)).unwrap().unwrap();
        }
        assert_eq!(history.undo_count(), 2);
    }

    #[test]
    fn test_selection_only_change_is_not_recorded() {
        let editor = Editor::default();
        let (history, _h) = register_history(&editor);

        editor.update(|tx| tx.set_selection(None)).unwrap();
        assert_eq!(history.undo_count(), 0);
    }
}

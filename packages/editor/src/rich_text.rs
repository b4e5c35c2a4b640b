//! # Core Commands
//!
//! Command tags shared by every plugin, plus the default handlers that
//! turn them into transactions. The defaults sit at `Low` priority so any
//! plugin can intercept a command first.

use crate::commands::{Command, CommandPriority, Unregister};
use crate::{Editor, EditorResult, Transaction};
use folio_model::{NodeKey, Selection};
use tracing::debug;

pub const INSERT_TEXT: Command<String> = Command::new("INSERT_TEXT");
/// `true` deletes backward
pub const DELETE_CHARACTER: Command<bool> = Command::new("DELETE_CHARACTER");
pub const INSERT_PARAGRAPH: Command<()> = Command::new("INSERT_PARAGRAPH");
pub const REMOVE_NODE: Command<NodeKey> = Command::new("REMOVE_NODE");
pub const SELECTION_CHANGE: Command<Option<Selection>> = Command::new("SELECTION_CHANGE");

pub const KEY_ENTER: Command<()> = Command::new("KEY_ENTER");
pub const KEY_ESCAPE: Command<()> = Command::new("KEY_ESCAPE");
pub const KEY_TAB: Command<()> = Command::new("KEY_TAB");
pub const KEY_ARROW_UP: Command<()> = Command::new("KEY_ARROW_UP");
pub const KEY_ARROW_DOWN: Command<()> = Command::new("KEY_ARROW_DOWN");
pub const KEY_BACKSPACE: Command<()> = Command::new("KEY_BACKSPACE");
pub const KEY_DELETE: Command<()> = Command::new("KEY_DELETE");
pub const BLUR: Command<()> = Command::new("BLUR");
pub const FOCUS: Command<()> = Command::new("FOCUS");

fn run(command: &'static str, result: EditorResult<bool>) -> bool {
    match result {
        Ok(changed) => changed,
        Err(err) => {
            debug!(command, error = %err, "Default handler failed");
            false
        }
    }
}

/// Put the caret back at the end of the document when focus returns and
/// the selection is gone or points at removed nodes. Returns whether the
/// selection moved.
fn restore_caret(tx: &mut Transaction<'_>) -> EditorResult<bool> {
    let live = tx
        .selection()
        .is_some_and(|sel| tx.contains(sel.anchor.key) && tx.contains(sel.focus.key));
    if live {
        return Ok(false);
    }

    let view = tx.view();
    let mut target = view.root_node()?;
    while let Some(last) = target.children.last().and_then(|key| view.get(*key)) {
        target = last;
    }
    if target.key == view.root() {
        return Ok(false);
    }
    let offset = target.leaf_len();
    tx.set_caret(target.key, offset);
    Ok(true)
}

/// Register the default editing handlers
pub fn register_rich_text(editor: &Editor) -> Unregister {
    Unregister::merge([
        editor.register_command(&INSERT_TEXT, CommandPriority::Low, |editor, text| {
            run(
                INSERT_TEXT.name(),
                editor.try_update(|tx| tx.insert_text(text).map(|_| true)),
            )
        }),
        editor.register_command(&DELETE_CHARACTER, CommandPriority::Low, |editor, backward| {
            run(
                DELETE_CHARACTER.name(),
                editor.try_update(|tx| tx.delete_character(*backward)),
            )
        }),
        editor.register_command(&INSERT_PARAGRAPH, CommandPriority::Low, |editor, _| {
            run(
                INSERT_PARAGRAPH.name(),
                editor.try_update(|tx| tx.insert_paragraph().map(|_| true)),
            )
        }),
        editor.register_command(&REMOVE_NODE, CommandPriority::Low, |editor, key| {
            run(
                REMOVE_NODE.name(),
                editor.try_update(|tx| tx.remove(*key).map(|_| true)),
            )
        }),
        editor.register_command(&SELECTION_CHANGE, CommandPriority::Low, |editor, selection| {
            run(
                SELECTION_CHANGE.name(),
                editor.try_update(|tx| {
                    let valid = selection.map_or(true, |sel| {
                        tx.contains(sel.anchor.key) && tx.contains(sel.focus.key)
                    });
                    if valid {
                        tx.set_selection(*selection);
                    }
                    Ok(valid)
                }),
            )
        }),
        editor.register_command(&FOCUS, CommandPriority::Low, |editor, _| {
            run(FOCUS.name(), editor.try_update(restore_caret))
        }),
        editor.register_command(&KEY_ENTER, CommandPriority::Low, |editor, _| {
            editor.dispatch(&INSERT_PARAGRAPH, ())
        }),
        editor.register_command(&KEY_BACKSPACE, CommandPriority::Low, |editor, _| {
            editor.dispatch(&DELETE_CHARACTER, true)
        }),
        editor.register_command(&KEY_DELETE, CommandPriority::Low, |editor, _| {
            editor.dispatch(&DELETE_CHARACTER, false)
        }),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_through_commands() {
        let editor = Editor::default();
        let _rich_text = register_rich_text(&editor);

        assert!(editor.dispatch(&INSERT_TEXT, "Hi".to_string()));
        assert!(editor.dispatch(&KEY_ENTER, ()));
        assert!(editor.dispatch(&INSERT_TEXT, "there".to_string()));
        assert!(editor.dispatch(&KEY_BACKSPACE, ()));

        assert_eq!(editor.read(|s| s.text_content(s.root())), "Hi\n\nther");
    }

    #[test]
    fn test_selection_change_rejects_missing_node() {
        let editor = Editor::default();
        let _rich_text = register_rich_text(&editor);

        let bogus = Some(Selection::caret(NodeKey::new(999), 0));
        assert!(!editor.dispatch(&SELECTION_CHANGE, bogus));
        assert!(editor.dispatch(&SELECTION_CHANGE, None));
        assert!(editor.snapshot().selection().is_none());
    }

    #[test]
    fn test_focus_restores_missing_caret() {
        let editor = Editor::default();
        let _rich_text = register_rich_text(&editor);
        assert!(editor.dispatch(&INSERT_TEXT, "Hi".to_string()));

        // A live selection is left alone.
        assert!(!editor.dispatch(&FOCUS, ()));

        assert!(editor.dispatch(&SELECTION_CHANGE, None));
        assert!(!editor.dispatch(&INSERT_TEXT, "!".to_string()));

        assert!(editor.dispatch(&FOCUS, ()));
        assert!(editor.dispatch(&INSERT_TEXT, "!".to_string()));
        assert_eq!(editor.read(|s| s.text_content(s.root())), "Hi!");
    }

    #[test]
    fn test_unregistered_defaults_do_nothing() {
        let editor = Editor::default();
        register_rich_text(&editor).call();

        assert!(!editor.dispatch(&INSERT_TEXT, "x".to_string()));
        assert_eq!(editor.snapshot().generation(), 0);
    }
}

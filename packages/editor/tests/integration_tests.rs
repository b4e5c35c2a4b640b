//! Integration tests for editor crate

use folio_editor::model::{Mention, MentionKind, NodeKind, NodeType};
use folio_editor::{
    register_rich_text, Command, CommandPriority, Editor, EditorConfig, EditorError,
    ListenerOptions, MutationKind, INSERT_TEXT,
};
use std::cell::RefCell;
use std::rc::Rc;

fn text(editor: &Editor) -> String {
    editor.read(|s| s.text_content(s.root()))
}

#[test]
fn test_nested_updates_commit_once() {
    let editor = Editor::default();
    let commits = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&commits);
    let _listener = editor.register_update_listener(move |_, info| {
        sink.borrow_mut().push(info.snapshot.generation());
    });

    editor
        .update(|tx| {
            tx.insert_text("a").unwrap();
            tx.editor()
                .update(|inner| inner.insert_text("b").unwrap())
                .unwrap();
            // The committed snapshot is untouched until the outer update ends.
            assert_eq!(tx.editor().read(|s| s.text_content(s.root())), "");
            tx.insert_text("c").unwrap();
        })
        .unwrap();

    assert_eq!(text(&editor), "abc");
    assert_eq!(*commits.borrow(), vec![1]);
}

#[test]
fn test_command_dispatched_inside_update_coalesces() {
    let editor = Editor::default();
    let _rich_text = register_rich_text(&editor);
    let commits = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&commits);
    let _listener = editor.register_update_listener(move |_, _| *sink.borrow_mut() += 1);

    editor
        .update(|tx| {
            tx.editor().dispatch(&INSERT_TEXT, "x".to_string());
            tx.editor().dispatch(&INSERT_TEXT, "y".to_string());
        })
        .unwrap();

    assert_eq!(text(&editor), "xy");
    assert_eq!(*commits.borrow(), 1);
}

#[test]
fn test_failed_nested_update_rolls_back_only_itself() {
    let editor = Editor::default();

    editor
        .update(|tx| {
            tx.insert_text("keep").unwrap();
            let nested: Result<(), EditorError> = tx.editor().try_update(|inner| {
                inner.insert_text(" drop")?;
                Err(EditorError::Aborted("nope".to_string()))
            });
            assert!(nested.is_err());
        })
        .unwrap();

    assert_eq!(text(&editor), "keep");
}

#[test]
fn test_failed_outer_update_discards_everything() {
    let editor = Editor::default();
    let before = editor.snapshot();

    let result: Result<(), EditorError> = editor.try_update(|tx| {
        tx.insert_text("gone")?;
        Err(EditorError::Aborted("abort".to_string()))
    });

    assert!(result.is_err());
    assert_eq!(editor.snapshot().generation(), before.generation());
    assert_eq!(text(&editor), "");

    // The next update starts from the committed state, not the aborted draft.
    editor.update(|tx| tx.insert_text("fresh")).unwrap().unwrap();
    assert_eq!(text(&editor), "fresh");
}

#[test]
fn test_read_only_blocks_commands_that_update() {
    let editor = Editor::new(EditorConfig {
        editable: false,
        ..EditorConfig::default()
    });
    let _rich_text = register_rich_text(&editor);

    assert!(!editor.dispatch(&INSERT_TEXT, "x".to_string()));
    assert_eq!(
        editor.update(|_| ()).unwrap_err(),
        EditorError::ReadOnly
    );
    assert_eq!(text(&editor), "");
}

#[test]
fn test_destroying_block_reports_every_descendant() {
    let editor = Editor::default();
    let (paragraph, mention) = editor
        .update(|tx| {
            tx.insert_text("Hi ").unwrap();
            let mention = tx
                .insert_inline(NodeKind::Mention(Mention::new(
                    "doc-1",
                    "Roadmap",
                    MentionKind::Document { block_id: None },
                )))
                .unwrap();
            let paragraph = tx.view().parent(mention).unwrap().key;
            (paragraph, mention)
        })
        .unwrap();

    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let mut handles = Vec::new();
    for ty in [NodeType::Paragraph, NodeType::Text, NodeType::Mention] {
        let sink = Rc::clone(&destroyed);
        handles.push(editor.register_mutation_listener(
            ty,
            ListenerOptions::default(),
            move |_, records, _| {
                for (key, kind) in records {
                    if *kind == MutationKind::Destroyed {
                        sink.borrow_mut().push((ty, *key));
                    }
                }
            },
        ));
    }

    editor.update(|tx| tx.remove(paragraph)).unwrap().unwrap();

    let destroyed = destroyed.borrow();
    assert!(destroyed.contains(&(NodeType::Paragraph, paragraph)));
    assert!(destroyed.contains(&(NodeType::Mention, mention)));
    assert!(destroyed.iter().any(|(ty, _)| *ty == NodeType::Text));
}

#[test]
fn test_mutation_listener_context_sees_both_snapshots() {
    let editor = Editor::default();
    let seen = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&seen);
    let _h = editor.register_mutation_listener(
        NodeType::Mention,
        ListenerOptions::default(),
        move |_, records, context| {
            let key = *records.keys().next().unwrap();
            *sink.borrow_mut() = Some((
                context.previous.contains(key),
                context.snapshot.contains(key),
            ));
        },
    );

    editor
        .update(|tx| {
            tx.insert_inline(NodeKind::Mention(Mention::new("u", "Ann", MentionKind::User)))
        })
        .unwrap()
        .unwrap();

    assert_eq!(*seen.borrow(), Some((false, true)));
}

#[test]
fn test_listener_may_update_after_commit() {
    let editor = Editor::default();
    let _h = editor.register_mutation_listener(
        NodeType::Text,
        ListenerOptions::default(),
        |editor, records, _| {
            if records.values().any(|k| *k == MutationKind::Created) {
                editor
                    .update(|tx| {
                        let caret = tx.caret().unwrap();
                        tx.set_caret(caret.key, 0);
                    })
                    .unwrap();
            }
        },
    );

    editor.update(|tx| tx.insert_text("abc")).unwrap().unwrap();

    let snapshot = editor.snapshot();
    assert_eq!(snapshot.generation(), 2);
    assert_eq!(snapshot.selection().unwrap().focus.offset, 0);
}

#[test]
fn test_custom_command_wraps_update() {
    const SHOUT: Command<String> = Command::new("SHOUT");
    let editor = Editor::default();
    let _h = editor.register_command(&SHOUT, CommandPriority::Normal, |editor, word| {
        editor
            .update(|tx| tx.insert_text(&word.to_uppercase()))
            .is_ok()
    });

    assert!(editor.dispatch(&SHOUT, "hey".to_string()));
    assert_eq!(text(&editor), "HEY");
}

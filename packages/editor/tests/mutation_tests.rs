//! Mutation records against full snapshot diffs

use folio_editor::model::{Mention, MentionKind, NodeKind, NodeType};
use folio_editor::{diff_snapshots, Editor, ListenerOptions, MutationKind, UpdateInfo};
use std::cell::RefCell;
use std::rc::Rc;

/// Collects every commit so its dirty diff can be checked against a full diff
fn recording_editor() -> (Editor, Rc<RefCell<Vec<UpdateInfo>>>) {
    let editor = Editor::default();
    let infos = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&infos);
    // Registrations stay until their `Unregister` is called.
    let _ = editor.register_update_listener(move |_, info| sink.borrow_mut().push(info.clone()));
    (editor, infos)
}

#[test]
fn test_dirty_diff_matches_full_diff() {
    let (editor, infos) = recording_editor();

    editor.update(|tx| tx.insert_text("Hello world")).unwrap().unwrap();
    editor
        .update(|tx| {
            let caret = tx.caret().unwrap();
            tx.set_caret(caret.key, 6);
            tx.insert_inline(NodeKind::Mention(Mention::new("u1", "Ann", MentionKind::User)))
        })
        .unwrap()
        .unwrap();
    editor.update(|tx| tx.insert_paragraph()).unwrap().unwrap();
    editor.update(|tx| tx.insert_text("second")).unwrap().unwrap();
    editor.update(|tx| tx.delete_character(true)).unwrap().unwrap();
    editor
        .update(|tx| {
            let block = tx.view().root_node().unwrap().children[0];
            tx.remove(block)
        })
        .unwrap()
        .unwrap();

    let infos = infos.borrow();
    assert_eq!(infos.len(), 6);
    for info in infos.iter() {
        assert_eq!(
            info.mutations,
            diff_snapshots(&info.previous, &info.snapshot),
            "generation {}",
            info.snapshot.generation()
        );
    }
}

#[test]
fn test_untouched_records_are_shared() -> anyhow::Result<()> {
    let editor = Editor::default();
    editor.update(|tx| tx.insert_text("one"))??;
    editor.update(|tx| tx.insert_paragraph())??;
    let before = editor.snapshot();

    editor.update(|tx| tx.insert_text("two"))??;
    let after = editor.snapshot();

    let first_block = before.root_node()?.children[0];
    assert!(std::sync::Arc::ptr_eq(
        before.get_shared(first_block).unwrap(),
        after.get_shared(first_block).unwrap()
    ));
    Ok(())
}

#[test]
fn test_updates_only_with_opt_in() {
    let editor = Editor::default();
    editor.update(|tx| tx.insert_text("a")).unwrap().unwrap();

    let plain = Rc::new(RefCell::new(0));
    let with_updates = Rc::new(RefCell::new(0));
    let (p, w) = (Rc::clone(&plain), Rc::clone(&with_updates));
    let _a = editor.register_mutation_listener(
        NodeType::Text,
        ListenerOptions::default(),
        move |_, _, _| *p.borrow_mut() += 1,
    );
    let _b = editor.register_mutation_listener(
        NodeType::Text,
        ListenerOptions::with_updates(),
        move |_, records, _| {
            assert!(records.values().all(|k| *k == MutationKind::Updated));
            *w.borrow_mut() += 1
        },
    );

    editor.update(|tx| tx.insert_text("b")).unwrap().unwrap();
    assert_eq!(*plain.borrow(), 0);
    assert_eq!(*with_updates.borrow(), 1);
}

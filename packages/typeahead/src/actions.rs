//! Applying menu items inside a transaction.

use crate::menu::{MenuAction, SlashAction};
use crate::mentions::{
    ContactMentionPayload, DateMentionPayload, DocumentMentionPayload, UserMentionPayload,
    INSERT_CONTACT_MENTION, INSERT_DATE_MENTION, INSERT_DOCUMENT_MENTION, INSERT_USER_MENTION,
};
use folio_editor::{EditorResult, Transaction};
use folio_model::{Mention, MentionKind, NodeKey, NodeKind, NodeType};
use tracing::debug;

/// Insert a mention through its kind's command, falling back to a plain insert
fn insert_mention(tx: &mut Transaction<'_>, mention: Mention) -> EditorResult<()> {
    let editor = tx.editor();
    let handled = match mention.kind.clone() {
        MentionKind::Document { block_id } => editor.dispatch(
            &INSERT_DOCUMENT_MENTION,
            DocumentMentionPayload {
                id: mention.id.clone(),
                name: mention.name.clone(),
                block_id,
            },
        ),
        MentionKind::User => editor.dispatch(
            &INSERT_USER_MENTION,
            UserMentionPayload {
                id: mention.id.clone(),
                name: mention.name.clone(),
            },
        ),
        MentionKind::Contact { email } => editor.dispatch(
            &INSERT_CONTACT_MENTION,
            ContactMentionPayload {
                id: mention.id.clone(),
                name: mention.name.clone(),
                email,
            },
        ),
        MentionKind::Date { date } => {
            editor.dispatch(&INSERT_DATE_MENTION, DateMentionPayload { date })
        }
        MentionKind::Channel | MentionKind::Chat | MentionKind::Project => false,
    };
    if !handled {
        tx.insert_inline(NodeKind::Mention(mention))?;
    }
    Ok(())
}

/// Run a selected item at the caret
pub(crate) fn apply_item(tx: &mut Transaction<'_>, action: MenuAction) -> EditorResult<()> {
    match action {
        MenuAction::Mention(mention) => {
            insert_mention(tx, mention)?;
            tx.insert_text(" ")
        }
        MenuAction::Emoji(emoji) => tx.insert_text(&emoji),
        MenuAction::Slash(action) => apply_slash_action(tx, action),
    }
}

/// Nearest block around the caret that slash actions operate on
fn caret_block(tx: &Transaction<'_>) -> Option<NodeKey> {
    let caret = tx.selection()?.focus;
    let view = tx.view();
    let node = view.get(caret.key)?;
    std::iter::once(node)
        .chain(view.ancestors(caret.key))
        .find(|n| {
            matches!(
                n.node_type(),
                NodeType::Paragraph
                    | NodeType::Heading
                    | NodeType::Quote
                    | NodeType::Code
                    | NodeType::ListItem
            )
        })
        .map(|n| n.key)
}

/// Swap a text block for another kind when its children fit
fn retype_block(tx: &mut Transaction<'_>, block: NodeKey, kind: NodeKind) -> EditorResult<()> {
    let view = tx.view();
    let target = kind.node_type();
    let fits = view
        .children(block)
        .all(|child| target.accepts_child(child.node_type()));
    let parent_fits = view
        .parent(block)
        .map_or(false, |p| p.node_type().accepts_child(target));
    if !fits || !parent_fits {
        debug!(block = %block, ?target, "Slash action does not apply here");
        return Ok(());
    }
    tx.replace(block, kind)?;
    Ok(())
}

pub(crate) fn apply_slash_action(
    tx: &mut Transaction<'_>,
    action: SlashAction,
) -> EditorResult<()> {
    if action == SlashAction::Date {
        let today = chrono::Local::now().date_naive();
        let mention = Mention::new(
            today.format("%Y-%m-%d").to_string(),
            today.format("%B %-d, %Y").to_string(),
            MentionKind::Date { date: today },
        );
        return apply_item(tx, MenuAction::Mention(mention));
    }

    let Some(block) = caret_block(tx) else {
        return Ok(());
    };
    let caret = tx.selection().map(|s| s.focus);

    match action {
        SlashAction::Heading(level) => retype_block(tx, block, NodeKind::Heading { level }),
        SlashAction::Quote => retype_block(tx, block, NodeKind::Quote),
        SlashAction::Code => retype_block(tx, block, NodeKind::Code { language: None }),
        SlashAction::BulletList | SlashAction::NumberedList => {
            let ordered = action == SlashAction::NumberedList;
            let nestable = tx
                .view()
                .parent(block)
                .map_or(false, |p| p.node_type().accepts_child(NodeType::List));
            if !nestable {
                debug!(block = %block, "List cannot be placed here");
                return Ok(());
            }
            let list = tx.insert_before(block, NodeKind::List { ordered, start: 1 })?;
            let item = tx.append(list, NodeKind::ListItem { checked: None })?;
            tx.move_children(block, item, 0)?;
            tx.remove(block)?;
            match caret {
                Some(point) if point.key == block => tx.set_caret(item, point.offset),
                Some(point) if tx.contains(point.key) => tx.set_caret(point.key, point.offset),
                _ => tx.set_caret(item, 0),
            }
            Ok(())
        }
        SlashAction::Divider => {
            let rule = tx.insert_after(block, NodeKind::HorizontalRule)?;
            let paragraph = tx.insert_after(rule, NodeKind::Paragraph)?;
            tx.set_caret(paragraph, 0);
            Ok(())
        }
        SlashAction::Table { rows, columns } => {
            let table = tx.insert_after(block, NodeKind::Table)?;
            let mut first = None;
            for _ in 0..rows {
                let row = tx.append(table, NodeKind::TableRow)?;
                for _ in 0..columns {
                    let cell = tx.append(row, NodeKind::cell())?;
                    let paragraph = tx.append(cell, NodeKind::Paragraph)?;
                    first.get_or_insert(paragraph);
                }
            }
            if let Some(paragraph) = first {
                tx.set_caret(paragraph, 0);
            }
            Ok(())
        }
        SlashAction::Date => Ok(()),
    }
}

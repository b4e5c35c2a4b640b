//! # Mention Commands
//!
//! Insertion commands per mention kind, name/access refresh commands and
//! the tracking hook that reports mentions entering and leaving the
//! document.
//!
//! Refreshing names is asynchronous: ids are collected from the committed
//! snapshot, resolved without holding any transaction open, and written
//! back in a follow-up update tagged to stay out of the undo history.

use chrono::NaiveDate;
use folio_editor::{
    Command, CommandPriority, Editor, ListenerOptions, MutationKind, Unregister, UpdateTag,
};
use folio_model::{Access, Mention, MentionKind, NodeKind, NodeType};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMentionPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub block_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMentionPayload {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMentionPayload {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateMentionPayload {
    pub date: NaiveDate,
}

impl From<DocumentMentionPayload> for Mention {
    fn from(p: DocumentMentionPayload) -> Self {
        Mention::new(p.id, p.name, MentionKind::Document { block_id: p.block_id })
    }
}

impl From<UserMentionPayload> for Mention {
    fn from(p: UserMentionPayload) -> Self {
        Mention::new(p.id, p.name, MentionKind::User)
    }
}

impl From<ContactMentionPayload> for Mention {
    fn from(p: ContactMentionPayload) -> Self {
        Mention::new(p.id, p.name, MentionKind::Contact { email: p.email })
    }
}

impl From<DateMentionPayload> for Mention {
    fn from(p: DateMentionPayload) -> Self {
        Mention::new(
            p.date.format("%Y-%m-%d").to_string(),
            p.date.format("%B %-d, %Y").to_string(),
            MentionKind::Date { date: p.date },
        )
    }
}

pub const INSERT_DOCUMENT_MENTION: Command<DocumentMentionPayload> =
    Command::new("INSERT_DOCUMENT_MENTION");
pub const INSERT_USER_MENTION: Command<UserMentionPayload> = Command::new("INSERT_USER_MENTION");
pub const INSERT_CONTACT_MENTION: Command<ContactMentionPayload> =
    Command::new("INSERT_CONTACT_MENTION");
pub const INSERT_DATE_MENTION: Command<DateMentionPayload> = Command::new("INSERT_DATE_MENTION");

/// Rewrite mention names by id
pub const UPDATE_DOCUMENT_NAME: Command<BTreeMap<String, String>> =
    Command::new("UPDATE_DOCUMENT_NAME");
/// Mark mentions by id as inaccessible or deleted
pub const UPDATE_MENTION_ACCESS: Command<BTreeMap<String, Access>> =
    Command::new("UPDATE_MENTION_ACCESS");

fn insert_mention(editor: &Editor, mention: Mention) -> bool {
    let id = mention.id.clone();
    match editor.try_update(|tx| tx.insert_inline(NodeKind::Mention(mention))) {
        Ok(key) => {
            debug!(key = %key, id = %id, "Inserted mention");
            true
        }
        Err(err) => {
            debug!(id = %id, error = %err, "Mention insertion failed");
            false
        }
    }
}

/// Apply `change` to every mention node, keeping those it modified. Returns the count.
fn rewrite_mentions(editor: &Editor, change: impl Fn(&mut Mention) -> bool) -> usize {
    let result = editor.update_tagged(UpdateTag::SkipHistory, |tx| {
        let view = tx.view();
        let mut changed = 0;
        for node in view.nodes_of_type(NodeType::Mention) {
            let Some(mention) = node.as_mention() else {
                continue;
            };
            let mut next = mention.clone();
            if change(&mut next) && tx.set_kind(node.key, NodeKind::Mention(next)).is_ok() {
                changed += 1;
            }
        }
        changed
    });
    match result {
        Ok(changed) => changed,
        Err(err) => {
            debug!(error = %err, "Mention rewrite rejected");
            0
        }
    }
}

/// Register the mention insertion and refresh commands
pub fn register_mention_commands(editor: &Editor) -> Unregister {
    Unregister::merge([
        editor.register_command(&INSERT_DOCUMENT_MENTION, CommandPriority::Low, |editor, p| {
            insert_mention(editor, p.clone().into())
        }),
        editor.register_command(&INSERT_USER_MENTION, CommandPriority::Low, |editor, p| {
            insert_mention(editor, p.clone().into())
        }),
        editor.register_command(&INSERT_CONTACT_MENTION, CommandPriority::Low, |editor, p| {
            insert_mention(editor, p.clone().into())
        }),
        editor.register_command(&INSERT_DATE_MENTION, CommandPriority::Low, |editor, p| {
            insert_mention(editor, p.clone().into())
        }),
        editor.register_command(&UPDATE_DOCUMENT_NAME, CommandPriority::Low, |editor, names| {
            let changed = rewrite_mentions(editor, |mention| match names.get(&mention.id) {
                Some(name) if *name != mention.name || mention.access != Access::Granted => {
                    mention.name = name.clone();
                    mention.access = Access::Granted;
                    true
                }
                _ => false,
            });
            debug!(ids = names.len(), changed, "Updated mention names");
            changed > 0
        }),
        editor.register_command(&UPDATE_MENTION_ACCESS, CommandPriority::Low, |editor, access| {
            let changed = rewrite_mentions(editor, |mention| match access.get(&mention.id) {
                Some(state) if *state != mention.access => {
                    mention.access = *state;
                    true
                }
                _ => false,
            });
            changed > 0
        }),
    ])
}

/// Receives mentions entering and leaving the document
pub trait MentionTracker {
    fn mention_added(&self, _mention: &Mention) {}

    fn mention_removed(&self, mention: &Mention);
}

/// Report created and destroyed mention nodes to `tracker`
pub fn register_mention_tracking(
    editor: &Editor,
    tracker: Rc<dyn MentionTracker>,
) -> Unregister {
    editor.register_mutation_listener(
        NodeType::Mention,
        ListenerOptions::default(),
        move |_, records, context| {
            for (key, kind) in records {
                match kind {
                    MutationKind::Created => {
                        if let Some(mention) = context.snapshot.get(*key).and_then(|n| n.as_mention()) {
                            tracker.mention_added(mention);
                        }
                    }
                    MutationKind::Destroyed => {
                        if let Some(mention) = context.previous.get(*key).and_then(|n| n.as_mention()) {
                            tracker.mention_removed(mention);
                        }
                    }
                    MutationKind::Updated => {}
                }
            }
        },
    )
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("No access to {0}")]
    NoAccess(String),

    #[error("{0} was deleted")]
    Deleted(String),

    #[error("Lookup failed: {0}")]
    Failed(String),
}

/// Looks up current display names for mentioned entities
pub trait NameResolver {
    fn resolve<'a>(
        &'a self,
        ids: &'a [String],
    ) -> LocalBoxFuture<'a, BTreeMap<String, Result<String, ResolveError>>>;
}

/// Outcome of one refresh round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub requested: usize,
    pub renamed: usize,
    pub degraded: usize,
}

/// Resolve document mention names and write them back in a follow-up update
pub async fn refresh_mention_names(
    editor: &Editor,
    resolver: &dyn NameResolver,
) -> RefreshSummary {
    let ids: Vec<String> = editor.read(|snapshot| {
        let mut ids: Vec<String> = snapshot
            .nodes_of_type(NodeType::Mention)
            .filter_map(|n| n.as_mention())
            .filter(|m| matches!(m.kind, MentionKind::Document { .. }))
            .map(|m| m.id.clone())
            .collect();
        ids.sort();
        ids.dedup();
        ids
    });
    if ids.is_empty() {
        return RefreshSummary::default();
    }

    let resolved = resolver.resolve(&ids).await;

    let mut names = BTreeMap::new();
    let mut access = BTreeMap::new();
    for (id, outcome) in resolved {
        match outcome {
            Ok(name) => {
                names.insert(id, name);
            }
            Err(ResolveError::NoAccess(_)) => {
                access.insert(id, Access::NoAccess);
            }
            Err(ResolveError::Deleted(_)) => {
                access.insert(id, Access::Deleted);
            }
            Err(err @ ResolveError::Failed(_)) => {
                debug!(id = %id, error = %err, "Keeping stale mention name");
            }
        }
    }

    let summary = RefreshSummary {
        requested: ids.len(),
        renamed: names.len(),
        degraded: access.len(),
    };
    if !names.is_empty() {
        editor.dispatch(&UPDATE_DOCUMENT_NAME, names);
    }
    if !access.is_empty() {
        editor.dispatch(&UPDATE_MENTION_ACCESS, access);
    }
    info!(
        requested = summary.requested,
        renamed = summary.renamed,
        degraded = summary.degraded,
        "Refreshed mention names"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_payload_formats_name() {
        let mention: Mention = DateMentionPayload {
            date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
        }
        .into();
        assert_eq!(mention.id, "2024-03-05");
        assert_eq!(mention.name, "March 5, 2024");
    }

    #[test]
    fn test_insert_creates_one_node_with_caret_after() {
        let editor = Editor::default();
        let _h = register_mention_commands(&editor);

        assert!(editor.dispatch(
            &INSERT_USER_MENTION,
            UserMentionPayload {
                id: "u1".into(),
                name: "Ann".into(),
            }
        ));

        let snapshot = editor.snapshot();
        let mentions: Vec<_> = snapshot.nodes_of_type(NodeType::Mention).collect();
        assert_eq!(mentions.len(), 1);
        let paragraph = snapshot.parent(mentions[0].key).unwrap();
        assert_eq!(
            snapshot.selection().unwrap().focus,
            folio_model::Point::new(paragraph.key, 1)
        );
    }

    #[test]
    fn test_read_only_rejects_insert() {
        let editor = Editor::default();
        let _h = register_mention_commands(&editor);
        editor.set_editable(false);

        assert!(!editor.dispatch(
            &INSERT_DATE_MENTION,
            DateMentionPayload {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            }
        ));
    }
}

//! # Remote Resolution
//!
//! Bare-uuid citations need a lookup before they can be shown. Lookups
//! are batched: every distinct id across all inputs goes out in one call
//! to the [`CitationResolver`], and the answers are spliced back in
//! input order. Nothing here fails: a denied or deleted document becomes
//! a placeholder mention and any other failure drops the citation.

use crate::{segments, CitationError, CitationPayload, CitationResult, Segment};
use folio_model::{Access, Mention, MentionKind};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};
use uuid::Uuid;

/// What a remote lookup returns for one id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCitation {
    pub document_id: Uuid,
    #[serde(default)]
    pub node_id: Option<String>,
    pub title: String,
}

pub trait CitationResolver {
    fn resolve<'a>(
        &'a self,
        ids: &'a [Uuid],
    ) -> LocalBoxFuture<'a, BTreeMap<Uuid, CitationResult<ResolvedCitation>>>;
}

/// Fully resolved piece of an input
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSegment {
    Text(String),
    Mention(Mention),
}

fn placeholder(id: Uuid, access: Access) -> Mention {
    let mut mention = Mention::new(id.to_string(), "", MentionKind::Document { block_id: None });
    mention.access = access;
    mention
}

fn remote_mention(id: Uuid, outcome: Option<&CitationResult<ResolvedCitation>>) -> Option<Mention> {
    match outcome {
        Some(Ok(found)) => Some(Mention::new(
            found.document_id.to_string(),
            found.title.clone(),
            MentionKind::Document {
                block_id: found.node_id.clone(),
            },
        )),
        Some(Err(CitationError::NoAccess(_))) => Some(placeholder(id, Access::NoAccess)),
        Some(Err(CitationError::Deleted(_))) => Some(placeholder(id, Access::Deleted)),
        Some(Err(err)) => {
            debug!(id = %id, error = %err, "Dropping unresolved citation");
            None
        }
        None => {
            debug!(id = %id, "Resolver returned nothing for citation");
            None
        }
    }
}

/// Resolve several inputs with one batched lookup
pub async fn resolve_all(
    inputs: &[&str],
    resolver: &dyn CitationResolver,
) -> Vec<Vec<ResolvedSegment>> {
    let split: Vec<Vec<Segment>> = inputs.iter().map(|input| segments(input)).collect();

    let ids: Vec<Uuid> = split
        .iter()
        .flatten()
        .filter_map(|segment| match segment {
            Segment::Citation(CitationPayload::Remote { id }) => Some(*id),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let answers = if ids.is_empty() {
        BTreeMap::new()
    } else {
        resolver.resolve(&ids).await
    };
    info!(inputs = inputs.len(), lookups = ids.len(), "Resolved citations");

    split
        .into_iter()
        .map(|segments| {
            let mut out: Vec<ResolvedSegment> = Vec::with_capacity(segments.len());
            for segment in segments {
                let next = match segment {
                    Segment::Text(text) => Some(ResolvedSegment::Text(text)),
                    Segment::Citation(CitationPayload::Remote { id }) => {
                        remote_mention(id, answers.get(&id)).map(ResolvedSegment::Mention)
                    }
                    Segment::Citation(payload) => payload.to_mention().map(ResolvedSegment::Mention),
                };
                // A dropped citation leaves two text runs side by side.
                match next {
                    Some(ResolvedSegment::Text(text)) => {
                        if let Some(ResolvedSegment::Text(prev)) = out.last_mut() {
                            prev.push_str(&text);
                        } else {
                            out.push(ResolvedSegment::Text(text));
                        }
                    }
                    Some(segment) => out.push(segment),
                    None => {}
                }
            }
            out
        })
        .collect()
}

/// Resolve a single input
pub async fn resolve_segments(
    input: &str,
    resolver: &dyn CitationResolver,
) -> Vec<ResolvedSegment> {
    resolve_all(&[input], resolver)
        .await
        .into_iter()
        .next()
        .unwrap_or_default()
}

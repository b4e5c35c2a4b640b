//! Payload grammar inside `[[…]]`
//!
//! ```text
//! md;<document uuid>;<node id>      node-level citation, node id is 8 alphanumerics
//! <uuid>                            remote citation, resolved asynchronously
//! document-mention;<uuid>
//! channel-mention;<uuid>
//! chat-mention;<uuid>
//! project-mention;<uuid>
//! ```

use crate::{CitationError, CitationResult};
use folio_model::{Mention, MentionKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

const NODE_ID_LEN: usize = 8;

/// Entity a `*-mention;` payload points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MentionTarget {
    Document,
    Channel,
    Chat,
    Project,
}

impl MentionTarget {
    pub fn prefix(self) -> &'static str {
        match self {
            MentionTarget::Document => "document-mention",
            MentionTarget::Channel => "channel-mention",
            MentionTarget::Chat => "chat-mention",
            MentionTarget::Project => "project-mention",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "document-mention" => Some(MentionTarget::Document),
            "channel-mention" => Some(MentionTarget::Channel),
            "chat-mention" => Some(MentionTarget::Chat),
            "project-mention" => Some(MentionTarget::Project),
            _ => None,
        }
    }

    fn mention_kind(self) -> MentionKind {
        match self {
            MentionTarget::Document => MentionKind::Document { block_id: None },
            MentionTarget::Channel => MentionKind::Channel,
            MentionTarget::Chat => MentionKind::Chat,
            MentionTarget::Project => MentionKind::Project,
        }
    }
}

/// A parsed citation payload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CitationPayload {
    /// A node inside a document
    Node { document_id: Uuid, node_id: String },
    /// Needs a remote lookup before it can be shown
    Remote { id: Uuid },
    Mention { target: MentionTarget, id: Uuid },
}

fn parse_uuid(id: &str) -> CitationResult<Uuid> {
    Uuid::parse_str(id).map_err(|err| CitationError::InvalidId {
        id: id.to_string(),
        reason: err.to_string(),
    })
}

fn is_node_id(id: &str) -> bool {
    id.len() == NODE_ID_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())
}

impl FromStr for CitationPayload {
    type Err = CitationError;

    fn from_str(payload: &str) -> CitationResult<Self> {
        let parts: Vec<&str> = payload.split(';').collect();
        match parts.as_slice() {
            ["md", document_id, node_id] => {
                let document_id = parse_uuid(document_id)?;
                if !is_node_id(node_id) {
                    return Err(CitationError::InvalidNodeId(node_id.to_string()));
                }
                Ok(CitationPayload::Node {
                    document_id,
                    node_id: node_id.to_string(),
                })
            }
            [prefix, id] => match MentionTarget::from_prefix(prefix) {
                Some(target) => Ok(CitationPayload::Mention {
                    target,
                    id: parse_uuid(id)?,
                }),
                None => Err(CitationError::Unrecognized(payload.to_string())),
            },
            [id] => Uuid::parse_str(id)
                .map(|id| CitationPayload::Remote { id })
                .map_err(|_| CitationError::Unrecognized(payload.to_string())),
            _ => Err(CitationError::Unrecognized(payload.to_string())),
        }
    }
}

impl CitationPayload {
    /// Mention node for payloads that need no lookup. Names start empty and
    /// are filled in by a later refresh.
    pub fn to_mention(&self) -> Option<Mention> {
        match self {
            CitationPayload::Node {
                document_id,
                node_id,
            } => Some(Mention::new(
                document_id.to_string(),
                "",
                MentionKind::Document {
                    block_id: Some(node_id.clone()),
                },
            )),
            CitationPayload::Mention { target, id } => {
                Some(Mention::new(id.to_string(), "", target.mention_kind()))
            }
            CitationPayload::Remote { .. } => None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, CitationPayload::Remote { .. })
    }
}

impl fmt::Display for CitationPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CitationPayload::Node {
                document_id,
                node_id,
            } => write!(f, "md;{};{}", document_id, node_id),
            CitationPayload::Remote { id } => write!(f, "{}", id),
            CitationPayload::Mention { target, id } => write!(f, "{};{}", target.prefix(), id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "3f9c2b7a-1111-4444-8888-aaaaaaaaaaaa";

    #[test]
    fn test_node_citation() {
        let payload: CitationPayload = format!("md;{};ab3dE2F9", DOC).parse().unwrap();
        assert_eq!(
            payload,
            CitationPayload::Node {
                document_id: Uuid::parse_str(DOC).unwrap(),
                node_id: "ab3dE2F9".to_string(),
            }
        );
        assert_eq!(payload.to_string(), format!("md;{};ab3dE2F9", DOC));
    }

    #[test]
    fn test_node_id_must_be_eight_alphanumerics() {
        let short = format!("md;{};ab3d", DOC).parse::<CitationPayload>();
        assert_eq!(short, Err(CitationError::InvalidNodeId("ab3d".to_string())));

        let symbol = format!("md;{};ab3d-2F9", DOC).parse::<CitationPayload>();
        assert!(matches!(symbol, Err(CitationError::InvalidNodeId(_))));
    }

    #[test]
    fn test_mention_prefixes() {
        for target in [
            MentionTarget::Document,
            MentionTarget::Channel,
            MentionTarget::Chat,
            MentionTarget::Project,
        ] {
            let payload: CitationPayload = format!("{};{}", target.prefix(), DOC).parse().unwrap();
            assert_eq!(
                payload,
                CitationPayload::Mention {
                    target,
                    id: Uuid::parse_str(DOC).unwrap(),
                }
            );
        }
    }

    #[test]
    fn test_bare_uuid_is_remote() {
        let payload: CitationPayload = DOC.parse().unwrap();
        assert!(payload.is_remote());
        assert_eq!(payload.to_mention(), None);
    }

    #[test]
    fn test_unknown_payloads() {
        assert!(matches!("bogus".parse::<CitationPayload>(), Err(CitationError::Unrecognized(_))));
        assert!(matches!(
            format!("user-mention;{}", DOC).parse::<CitationPayload>(),
            Err(CitationError::Unrecognized(_))
        ));
        assert!(matches!(
            "chat-mention;not-a-uuid".parse::<CitationPayload>(),
            Err(CitationError::InvalidId { .. })
        ));
        assert!(matches!("".parse::<CitationPayload>(), Err(CitationError::Unrecognized(_))));
    }

    #[test]
    fn test_payload_json_shape() {
        let payload: CitationPayload = format!("channel-mention;{}", DOC).parse().unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "mention", "target": "channel", "id": DOC })
        );
    }
}

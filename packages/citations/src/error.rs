//! Error types for citation parsing and resolution

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CitationError {
    #[error("Unrecognized citation payload: {0}")]
    Unrecognized(String),

    #[error("Invalid id '{id}' in citation: {reason}")]
    InvalidId { id: String, reason: String },

    #[error("Invalid node id '{0}', expected 8 alphanumeric characters")]
    InvalidNodeId(String),

    #[error("No access to cited document {0}")]
    NoAccess(Uuid),

    #[error("Cited document {0} was deleted")]
    Deleted(Uuid),

    #[error("Citation lookup failed: {0}")]
    Lookup(String),
}

pub type CitationResult<T> = Result<T, CitationError>;

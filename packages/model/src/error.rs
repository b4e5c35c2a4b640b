//! Error types for the document model

use crate::{NodeKey, NodeType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeKey),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeKey),

    #[error("Node {0} is not a text node")]
    NotText(NodeKey),

    #[error("{child:?} cannot be a child of {parent:?}")]
    InvalidChild { parent: NodeType, child: NodeType },

    #[error("Node {key} cannot change type from {from:?} to {to:?}")]
    TypeChange {
        key: NodeKey,
        from: NodeType,
        to: NodeType,
    },

    #[error("Root node cannot be removed")]
    RootRemoval,

    #[error("Offset {offset} out of bounds for node {key}")]
    OffsetOutOfBounds { key: NodeKey, offset: usize },
}

pub type ModelResult<T> = Result<T, ModelError>;

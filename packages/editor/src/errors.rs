//! Error types for the editor

use folio_model::{ModelError, NodeKey};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Editor is read-only")]
    ReadOnly,

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("No selection")]
    NoSelection,

    #[error("Selection points at missing node {0}")]
    StaleSelection(NodeKey),

    #[error("Update aborted: {0}")]
    Aborted(String),
}

pub type EditorResult<T> = Result<T, EditorError>;

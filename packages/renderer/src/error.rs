use folio_model::ModelError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to build document: {0}")]
    Model(#[from] ModelError),

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;

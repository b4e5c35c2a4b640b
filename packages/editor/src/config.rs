use serde::{Deserialize, Serialize};

/// Editor session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Namespace used in log fields to tell editors apart
    pub namespace: String,

    /// Whether updates are accepted
    pub editable: bool,

    /// Maximum number of undo levels (0 = unlimited)
    pub history_limit: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            namespace: "folio".to_string(),
            editable: true,
            history_limit: 100,
        }
    }
}

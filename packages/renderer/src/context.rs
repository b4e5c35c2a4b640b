use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Who the rendered output is for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Audience {
    /// Workspace members; mentions link into the workspace
    #[default]
    Internal,
    /// Outside viewers; mentions render as plain labels and user
    /// identities are not exposed
    External,
}

impl FromStr for Audience {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "internal" => Ok(Audience::Internal),
            "external" => Ok(Audience::External),
            other => Err(format!("unknown audience '{}'", other)),
        }
    }
}

/// Inputs to a render besides the snapshot and theme
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderContext {
    pub audience: Audience,
    /// Prefix for links to mentioned documents
    pub link_base: String,
}

impl RenderContext {
    pub fn new(audience: Audience) -> Self {
        Self {
            audience,
            link_base: String::new(),
        }
    }

    pub fn with_link_base(mut self, base: impl Into<String>) -> Self {
        self.link_base = base.into();
        self
    }
}

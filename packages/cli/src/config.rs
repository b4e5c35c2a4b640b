use anyhow::anyhow;
use folio_renderer::{Audience, RenderContext, Theme};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_NAME: &str = "folio.config.json";

/// Folio configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Theme name (light, dark)
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Who the output is for (internal, external)
    #[serde(default)]
    pub audience: Audience,

    /// Render only the first logical line of each source
    #[serde(default)]
    pub single_line: bool,

    /// Output format (html, text, json)
    #[serde(default = "default_format")]
    pub format: String,

    /// Prefix for links to mentioned documents
    #[serde(default)]
    pub link_base: String,

    /// Output directory when rendering a directory
    #[serde(default = "default_out_dir")]
    pub out_dir: String,
}

fn default_theme() -> String {
    "light".to_string()
}

fn default_format() -> String {
    "html".to_string()
}

fn default_out_dir() -> String {
    "dist".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn theme(&self) -> anyhow::Result<Theme> {
        self.theme.parse().map_err(|err: String| anyhow!(err))
    }

    pub fn render_context(&self) -> RenderContext {
        RenderContext::new(self.audience).with_link_base(self.link_base.as_str())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            audience: Audience::default(),
            single_line: false,
            format: default_format(),
            link_base: String::new(),
            out_dir: default_out_dir(),
        }
    }
}

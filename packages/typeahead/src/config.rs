use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds for the search-term debounce
pub const MIN_DEBOUNCE_MS: u64 = 60;
pub const MAX_DEBOUNCE_MS: u64 = 200;

/// Inline search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeaheadConfig {
    /// Delay before a typed search term is used for filtering
    pub debounce_ms: u64,

    /// Maximum number of menu results
    pub max_results: usize,

    /// Open a mention search on `@`
    pub mentions: bool,

    /// Open an action search on `/`
    pub slash: bool,

    /// Open an emoji search on `:`
    pub emoji: bool,
}

impl Default for TypeaheadConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            max_results: 10,
            mentions: true,
            slash: true,
            emoji: true,
        }
    }
}

impl TypeaheadConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms.clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS))
    }

    pub fn is_enabled(&self, trigger: folio_model::Trigger) -> bool {
        match trigger {
            folio_model::Trigger::Mention => self.mentions,
            folio_model::Trigger::Slash => self.slash,
            folio_model::Trigger::Emoji => self.emoji,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_is_clamped() {
        let config: TypeaheadConfig = serde_json::from_str(r#"{ "debounceMs": 5 }"#).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(60));

        let config = TypeaheadConfig {
            debounce_ms: 1000,
            ..TypeaheadConfig::default()
        };
        assert_eq!(config.debounce(), Duration::from_millis(200));
        assert_eq!(config.max_results, 10);
    }
}

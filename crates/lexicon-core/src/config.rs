use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{LexiconError, Result};

/// Top-level configuration for Lexicon.
///
/// Loaded once at startup from `~/.lexicon/config.toml` by default, then
/// treated as read-only for the life of the process. Clients receive it by
/// reference at construction time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

impl LexiconConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LexiconConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| LexiconError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Apply credentials and endpoints from the process environment.
    ///
    /// `LEXICON_*` names take priority; the Atlan/OpenAI names are accepted
    /// as secondary sources. Empty variables are ignored.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Same as [`with_env_overrides`](Self::with_env_overrides) with an
    /// injectable lookup, so overrides can be tested without touching the
    /// real environment.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| -> Option<String> {
            keys.iter()
                .filter_map(|k| lookup(*k))
                .find(|v| !v.trim().is_empty())
        };

        if let Some(v) = first(&["LEXICON_CATALOG_URL", "ATLAN_BASE_URL"]) {
            self.catalog.base_url = v;
        }
        if let Some(v) = first(&["LEXICON_CATALOG_TOKEN", "ATLAN_API_TOKEN"]) {
            self.catalog.api_token = v;
        }
        if let Some(v) = first(&["LEXICON_LLM_URL", "OPENAI_BASE_URL"]) {
            self.llm.base_url = v;
        }
        if let Some(v) = first(&["LEXICON_LLM_KEY", "OPENAI_API_KEY"]) {
            self.llm.api_key = v;
        }
        if let Some(v) = first(&["LEXICON_LLM_MODEL"]) {
            self.llm.model = v;
        }
        self
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Data-catalog service connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Tenant base URL, e.g. `https://tenant.atlan.com`.
    pub base_url: String,
    /// Bearer token.
    pub api_token: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum assets returned for a single term.
    pub asset_limit: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            timeout_secs: 5,
            asset_limit: 40,
        }
    }
}

impl CatalogConfig {
    /// Both endpoint and token are required for live catalog calls.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.api_token.trim().is_empty()
    }
}

/// Language-model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Minimum confidence for an LLM classification to be used.
    pub confidence_threshold: f32,
    /// Number of prior turns sent along with a classification request.
    pub history_window: usize,
    /// Rephrase answers through the LLM on turns that did not need it for
    /// classification.
    pub enhance_responses: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 5,
            confidence_threshold: 0.7,
            history_window: 3,
            enhance_responses: false,
        }
    }
}

impl LlmConfig {
    /// Both base URL and key are required for the LLM to be active.
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

/// Conversational shell settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Whether the chat interface accepts messages.
    pub enabled: bool,
    /// Number of recent turns kept in a session's context window.
    pub context_turns: usize,
    /// Idle minutes before a session expires.
    pub session_timeout_minutes: u32,
    /// Maximum candidates listed in a clarification.
    pub max_clarify_candidates: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            context_turns: 5,
            session_timeout_minutes: 30,
            max_clarify_candidates: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ---- Defaults ----

    #[test]
    fn test_default_config() {
        let config = LexiconConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.catalog.timeout_secs, 5);
        assert_eq!(config.catalog.asset_limit, 40);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.confidence_threshold, 0.7);
        assert!(!config.llm.enhance_responses);
        assert!(config.chat.enabled);
        assert_eq!(config.chat.context_turns, 5);
        assert_eq!(config.chat.max_clarify_candidates, 5);
    }

    #[test]
    fn test_default_is_unconfigured() {
        let config = LexiconConfig::default();
        assert!(!config.catalog.is_configured());
        assert!(!config.llm.is_configured());
    }

    #[test]
    fn test_llm_requires_both_url_and_key() {
        let mut llm = LlmConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            ..LlmConfig::default()
        };
        assert!(!llm.is_configured());
        llm.api_key = "sk-test".to_string();
        assert!(llm.is_configured());
        llm.base_url = "   ".to_string();
        assert!(!llm.is_configured());
    }

    // ---- Loading ----

    #[test]
    fn test_load_valid_config() {
        let content = r#"
[general]
log_level = "debug"

[catalog]
base_url = "https://tenant.atlan.com"
api_token = "tok"
timeout_secs = 3

[llm]
base_url = "https://llm.example.com/v1"
api_key = "key"
confidence_threshold = 0.8

[chat]
context_turns = 10
"#;
        let file = create_temp_config(content);
        let config = LexiconConfig::load(file.path()).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.catalog.base_url, "https://tenant.atlan.com");
        assert_eq!(config.catalog.timeout_secs, 3);
        assert!(config.catalog.is_configured());
        assert_eq!(config.llm.confidence_threshold, 0.8);
        assert_eq!(config.chat.context_turns, 10);
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let file = create_temp_config("[llm]\nmodel = \"gpt-4o\"\n");
        let config = LexiconConfig::load(file.path()).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        // Remaining fields use defaults
        assert_eq!(config.llm.timeout_secs, 5);
        assert_eq!(config.catalog.asset_limit, 40);
        assert_eq!(config.chat.session_timeout_minutes, 30);
    }

    #[test]
    fn test_load_invalid_toml() {
        let file = create_temp_config("[catalog\nbase_url = ");
        let result = LexiconConfig::load(file.path());
        assert!(matches!(result, Err(LexiconError::Config(_))));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = LexiconConfig::load_or_default(Path::new("/nonexistent/config.toml"));
        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_empty_toml_uses_all_defaults() {
        let file = create_temp_config("");
        let config = LexiconConfig::load(file.path()).unwrap();
        assert_eq!(config.catalog.timeout_secs, 5);
        assert!(config.chat.enabled);
    }

    // ---- Saving ----

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = LexiconConfig::default();
        config.catalog.base_url = "https://tenant.atlan.com".to_string();
        config.llm.history_window = 7;
        config.save(&path).unwrap();

        let reloaded = LexiconConfig::load(&path).unwrap();
        assert_eq!(reloaded.catalog.base_url, "https://tenant.atlan.com");
        assert_eq!(reloaded.llm.history_window, 7);
    }

    // ---- Environment overrides ----

    #[test]
    fn test_overrides_prefer_lexicon_names() {
        let env = env_of(&[
            ("LEXICON_CATALOG_URL", "https://primary.example.com"),
            ("ATLAN_BASE_URL", "https://secondary.example.com"),
            ("ATLAN_API_TOKEN", "atlan-token"),
        ]);
        let config = LexiconConfig::default().with_overrides(|k| env.get(k).cloned());
        assert_eq!(config.catalog.base_url, "https://primary.example.com");
        assert_eq!(config.catalog.api_token, "atlan-token");
        assert!(config.catalog.is_configured());
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let env = env_of(&[("LEXICON_LLM_KEY", "  "), ("OPENAI_API_KEY", "sk-real")]);
        let mut config = LexiconConfig::default();
        config.llm.api_key = "from-file".to_string();
        let config = config.with_overrides(|k| env.get(k).cloned());
        assert_eq!(config.llm.api_key, "sk-real");
    }

    #[test]
    fn test_overrides_keep_file_values_when_unset() {
        let mut config = LexiconConfig::default();
        config.llm.model = "local-model".to_string();
        let config = config.with_overrides(|_| None);
        assert_eq!(config.llm.model, "local-model");
        assert!(config.llm.base_url.is_empty());
    }
}

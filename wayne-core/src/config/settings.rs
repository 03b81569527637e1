//! Settings configuration loaded from TOML files.
//!
//! This module handles non-sensitive configuration stored in TOML format
//! in the XDG config directory (~/.config/wayne-ai/config.toml).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default TOML configuration file content
const DEFAULT_CONFIG_TOML: &str = r#"# wayne-ai configuration file
# Located at: ~/.config/wayne-ai/config.toml
#
# This file contains non-sensitive configuration.
# Secrets are loaded from environment variables:
#   - WAYNE_KNOWLEDGE_TOKEN (optional, bearer token for the http knowledge source)

[knowledge]
# "fs" reads markdown files from `root`, "http" fetches them from `base_url`
source = "fs"
# root = "/home/me/.local/share/wayne-ai/knowledge"
# base_url = "https://your-worker-url.workers.dev/knowledge/"
timeout_seconds = 15
cache_ttl_seconds = 3600
watch = false

[knowledge.files]
text = "text-knowledge.md"
image = "image-knowledge.md"
code = "coder-knowledge.md"

[knowledge.search]
threshold = 0.3
tag_weight = 2.0
field_weight = 1.0
max_results = 5
include_secondary = true
summary_chars = 120

[conversation]
max_messages = 10

[logging]
level = "info"
"#;

/// Settings loaded from TOML configuration file.
///
/// These are non-sensitive configuration values that can be safely
/// stored in files and version controlled.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Knowledge source and search tuning
    #[serde(default)]
    pub knowledge: KnowledgeToolsSettings,

    /// Conversation window configuration
    #[serde(default)]
    pub conversation: ConversationSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// User-facing knowledge configuration. Every field is optional and
/// resolved into `KnowledgeSettings` with defaults filled in.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeToolsSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_ttl_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch: Option<bool>,
    #[serde(default)]
    pub files: KnowledgeFilesSettings,
    #[serde(default)]
    pub search: KnowledgeSearchSettings,
}

/// Per-partition document names, relative to the source root.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeFilesSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct KnowledgeSearchSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_weight: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_weight: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_secondary: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary_chars: Option<usize>,
}

/// Conversation window configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversationSettings {
    /// Number of most recent messages retained as context
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_max_messages() -> usize {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,
}

impl Settings {
    /// Load settings from the TOML configuration file.
    ///
    /// If the config file doesn't exist, creates it with default values.
    /// The file is located at `~/.config/wayne-ai/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            tracing::info!("Creating default configuration at {:?}", config_path);
            Self::create_default_config(&config_path)?;
        }

        let content = fs::read_to_string(&config_path)?;
        Self::from_toml(&content)
    }

    /// Parse settings from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(content)?;
        Ok(settings)
    }

    /// Serialize settings to TOML content.
    pub fn to_toml(&self) -> Result<String, SettingsError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the configuration file path.
    ///
    /// Uses XDG config directory: `~/.config/wayne-ai/config.toml`
    pub fn config_path() -> Result<PathBuf, SettingsError> {
        if let Ok(override_dir) = std::env::var("WAYNE_CONFIG_DIR") {
            let dir = PathBuf::from(override_dir);
            return Ok(dir.join("config.toml"));
        }

        let config_dir = dirs::config_dir()
            .ok_or(SettingsError::ConfigDirNotFound)?
            .join("wayne-ai");

        Ok(config_dir.join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }

    /// Save settings to a specific file path.
    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = self.to_toml()?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert!(settings.knowledge.source.is_none());
        assert!(settings.knowledge.search.threshold.is_none());
        assert_eq!(settings.conversation.max_messages, 10);
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_default_config_toml_parses() {
        let settings = Settings::from_toml(DEFAULT_CONFIG_TOML).unwrap();

        assert_eq!(settings.knowledge.source.as_deref(), Some("fs"));
        assert_eq!(settings.knowledge.timeout_seconds, Some(15));
        assert_eq!(settings.knowledge.watch, Some(false));
        assert_eq!(
            settings.knowledge.files.code.as_deref(),
            Some("coder-knowledge.md")
        );
        assert_eq!(settings.knowledge.search.threshold, Some(0.3));
        assert_eq!(settings.knowledge.search.tag_weight, Some(2.0));
        assert_eq!(settings.knowledge.search.include_secondary, Some(true));
        assert_eq!(settings.conversation.max_messages, 10);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
[knowledge]
source = "http"
base_url = "https://example.com/kb/"
cache_ttl_seconds = 60

[knowledge.files]
code = "code.md"

[knowledge.search]
threshold = 0.5
max_results = 3
include_secondary = false

[conversation]
max_messages = 6

[logging]
level = "debug"
"#;

        let settings = Settings::from_toml(toml).unwrap();

        assert_eq!(settings.knowledge.source.as_deref(), Some("http"));
        assert_eq!(
            settings.knowledge.base_url.as_deref(),
            Some("https://example.com/kb/")
        );
        assert_eq!(settings.knowledge.cache_ttl_seconds, Some(60));
        assert_eq!(settings.knowledge.files.code.as_deref(), Some("code.md"));
        assert!(settings.knowledge.files.text.is_none());
        assert_eq!(settings.knowledge.search.threshold, Some(0.5));
        assert_eq!(settings.knowledge.search.max_results, Some(3));
        assert_eq!(settings.knowledge.search.include_secondary, Some(false));
        assert_eq!(settings.conversation.max_messages, 6);
        assert_eq!(settings.logging.level, "debug");
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[logging]
level = "warn"
"#;

        let settings = Settings::from_toml(toml).unwrap();

        assert!(settings.knowledge.root.is_none());
        assert_eq!(settings.conversation.max_messages, 10);
        assert_eq!(settings.logging.level, "warn");
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let mut settings = Settings::default();
        settings.knowledge.source = Some("fs".to_string());
        settings.knowledge.root = Some("/tmp/wayne-kb".to_string());
        settings.knowledge.search.max_results = Some(2);
        settings.conversation.max_messages = 4;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        settings.save_to_path(&path).expect("save failed");

        let content = fs::read_to_string(&path).expect("read failed");
        let loaded = Settings::from_toml(&content).expect("parse failed");

        assert_eq!(loaded.knowledge.root.as_deref(), Some("/tmp/wayne-kb"));
        assert_eq!(loaded.knowledge.search.max_results, Some(2));
        assert_eq!(loaded.conversation.max_messages, 4);
    }

    #[test]
    fn test_config_path_uses_env_override() {
        let dir = tempfile::tempdir().unwrap();
        let value = dir.path().to_string_lossy().to_string();

        // SAFETY: test-scoped env mutation.
        unsafe { std::env::set_var("WAYNE_CONFIG_DIR", &value) };
        let path = Settings::config_path().unwrap();
        // SAFETY: test-scoped env mutation cleanup.
        unsafe { std::env::remove_var("WAYNE_CONFIG_DIR") };

        assert_eq!(path, dir.path().join("config.toml"));
    }
}

//! Configuration management for wayne-ai.
//!
//! This module provides a unified configuration system that separates
//! secrets (from environment variables) from settings (from TOML files).
//!
//! # Configuration Sources
//!
//! ## Secrets (Environment Variables)
//! - `WAYNE_KNOWLEDGE_TOKEN` - bearer token for the http knowledge source
//!
//! ## Settings (TOML File)
//! Located at `~/.config/wayne-ai/config.toml`:
//! ```toml
//! [knowledge]
//! source = "fs"
//!
//! [knowledge.search]
//! threshold = 0.3
//!
//! [conversation]
//! max_messages = 10
//!
//! [logging]
//! level = "info"
//! ```

pub mod knowledge;
mod secrets;
mod settings;

pub use knowledge::{KnowledgeSettings, PartitionFiles, SearchDefaults, SourceKind};
pub use secrets::Secrets;
pub use settings::{
    ConversationSettings, KnowledgeFilesSettings, KnowledgeSearchSettings,
    KnowledgeToolsSettings, LoggingSettings, Settings, SettingsError,
};

/// Combined configuration containing both secrets and settings.
///
/// This is the main configuration type used throughout the application.
/// It separates sensitive secrets (from env) from non-sensitive settings (from TOML).
#[derive(Debug, Clone)]
pub struct Config {
    /// Secrets loaded from environment variables
    pub secrets: Secrets,
    /// Settings loaded from TOML configuration file
    pub settings: Settings,
}

/// Errors that can occur when loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Knowledge source is 'http' but no base_url is configured")]
    MissingBaseUrl,

    #[error("conversation.max_messages must be at least 1")]
    EmptyConversationWindow,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// This loads:
    /// 1. Secrets from environment variables
    /// 2. Settings from TOML file (creating defaults if needed)
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML file cannot be read or parsed
    /// - The http source is selected without a base URL
    /// - The conversation window is configured as empty
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env();
        let settings = Settings::load()?;
        Self::from_parts(secrets, settings)
    }

    /// Validate already-loaded parts.
    pub fn from_parts(secrets: Secrets, settings: Settings) -> Result<Self, ConfigError> {
        let config = Self { secrets, settings };

        let knowledge = config.knowledge_settings();
        if knowledge.source == SourceKind::Http
            && knowledge
                .base_url
                .as_deref()
                .map(str::trim)
                .is_none_or(str::is_empty)
        {
            return Err(ConfigError::MissingBaseUrl);
        }

        if config.settings.conversation.max_messages == 0 {
            return Err(ConfigError::EmptyConversationWindow);
        }

        Ok(config)
    }

    /// Resolved knowledge settings with defaults filled in.
    pub fn knowledge_settings(&self) -> KnowledgeSettings {
        KnowledgeSettings::from(&self.settings.knowledge)
    }

    /// Number of messages kept in the conversation window.
    pub fn max_messages(&self) -> usize {
        self.settings.conversation.max_messages
    }

    /// Configured log level.
    pub fn log_level(&self) -> &str {
        &self.settings.logging.level
    }

    /// Get the knowledge source bearer token (if configured).
    pub fn knowledge_token(&self) -> Option<&str> {
        self.secrets.knowledge_token.as_deref()
    }
}

/// Load .env file if it exists (for development convenience).
///
/// `Secrets::from_env` calls this, so `Config::load()` picks up `.env`
/// before reading secrets. Also exported for use in other contexts.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

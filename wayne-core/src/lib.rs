pub mod config;
pub mod message;

// Config re-exports
pub use config::{
    Config,
    ConfigError,
    ConversationSettings,
    KnowledgeSettings,
    SearchDefaults,
    Secrets,
    Settings,
    SettingsError,
    SourceKind,
    load_dotenv,
};

// Message re-exports
pub use message::{CodeBlock, ConversationMessage, MessageRole};

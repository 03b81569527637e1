//! Secrets configuration loaded from environment variables only.
//!
//! This module handles sensitive values that should never be stored in
//! files. All secrets are read from environment variables.

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// Bearer token for the http knowledge source (env: WAYNE_KNOWLEDGE_TOKEN)
    pub knowledge_token: Option<String>,
}

impl Secrets {
    /// Load secrets from environment variables.
    ///
    /// This function also loads .env file if present (for development),
    /// but production should rely on actual environment variables.
    pub fn from_env() -> Self {
        super::load_dotenv();

        Self::from_env_inner()
    }

    pub(crate) fn from_env_inner() -> Self {
        Self {
            knowledge_token: env::var("WAYNE_KNOWLEDGE_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
        }
    }
}

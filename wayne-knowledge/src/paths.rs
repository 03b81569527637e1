use std::path::PathBuf;

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};

pub const KNOWLEDGE_DIR: &str = "knowledge";

pub fn data_root() -> KnowledgeResult<PathBuf> {
    if let Ok(override_dir) = std::env::var("WAYNE_DATA_DIR") {
        return Ok(PathBuf::from(override_dir));
    }

    let dir = dirs::data_dir().ok_or(KnowledgeError::MissingDataDir)?;
    Ok(dir.join("wayne-ai"))
}

/// Directory holding the partition documents for the fs source.
pub fn knowledge_root(settings: &KnowledgeSettings) -> KnowledgeResult<PathBuf> {
    if let Some(path) = &settings.root_override {
        return Ok(path.clone());
    }
    Ok(data_root()?.join(KNOWLEDGE_DIR))
}

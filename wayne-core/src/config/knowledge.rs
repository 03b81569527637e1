//! Knowledge system configuration types.
//!
//! These types define the resolved (non-optional) settings used by
//! `wayne-knowledge`. They are created from the user-facing
//! `KnowledgeToolsSettings` TOML structs via `From`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::settings::{KnowledgeFilesSettings, KnowledgeSearchSettings, KnowledgeToolsSettings};

/// Where partition documents are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Markdown files under a local root directory.
    #[default]
    Fs,
    /// Markdown documents fetched relative to a base URL.
    Http,
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fs" | "file" | "files" => Ok(SourceKind::Fs),
            "http" | "https" => Ok(SourceKind::Http),
            _ => Err(format!("Unknown knowledge source: {}", s)),
        }
    }
}

/// Resolved knowledge engine settings (all values filled with defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSettings {
    #[serde(default)]
    pub source: SourceKind,
    /// Override the root directory for the fs source.
    /// When unset, `WAYNE_DATA_DIR` / XDG data dir is used.
    #[serde(default)]
    pub root_override: Option<PathBuf>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_cache_ttl_seconds")]
    pub cache_ttl_seconds: u64,
    #[serde(default)]
    pub watch: bool,
    #[serde(default)]
    pub files: PartitionFiles,
    #[serde(default)]
    pub search: SearchDefaults,
}

impl Default for KnowledgeSettings {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            root_override: None,
            base_url: None,
            timeout_seconds: default_timeout_seconds(),
            cache_ttl_seconds: default_cache_ttl_seconds(),
            watch: false,
            files: PartitionFiles::default(),
            search: SearchDefaults::default(),
        }
    }
}

/// Document name for each knowledge partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartitionFiles {
    #[serde(default = "default_text_file")]
    pub text: String,
    #[serde(default = "default_image_file")]
    pub image: String,
    #[serde(default = "default_code_file")]
    pub code: String,
}

impl Default for PartitionFiles {
    fn default() -> Self {
        Self {
            text: default_text_file(),
            image: default_image_file(),
            code: default_code_file(),
        }
    }
}

/// Resolved search and rendering knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    /// Minimum relevance score for a candidate to be kept.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    #[serde(default = "default_tag_weight")]
    pub tag_weight: f32,
    #[serde(default = "default_field_weight")]
    pub field_weight: f32,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Search secondary partitions when a query matches several intents.
    #[serde(default = "default_include_secondary")]
    pub include_secondary: bool,
    /// Description characters shown per entry in multi-match summaries.
    #[serde(default = "default_summary_chars")]
    pub summary_chars: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            tag_weight: default_tag_weight(),
            field_weight: default_field_weight(),
            max_results: default_max_results(),
            include_secondary: default_include_secondary(),
            summary_chars: default_summary_chars(),
        }
    }
}

fn default_timeout_seconds() -> u64 {
    15
}

fn default_cache_ttl_seconds() -> u64 {
    60 * 60
}

fn default_text_file() -> String {
    "text-knowledge.md".to_string()
}

fn default_image_file() -> String {
    "image-knowledge.md".to_string()
}

fn default_code_file() -> String {
    "coder-knowledge.md".to_string()
}

fn default_threshold() -> f32 {
    0.3
}

fn default_tag_weight() -> f32 {
    2.0
}

fn default_field_weight() -> f32 {
    1.0
}

fn default_max_results() -> usize {
    5
}

fn default_include_secondary() -> bool {
    true
}

fn default_summary_chars() -> usize {
    120
}

impl From<&KnowledgeToolsSettings> for KnowledgeSettings {
    fn from(value: &KnowledgeToolsSettings) -> Self {
        let mut settings = KnowledgeSettings::default();
        if let Some(source) = &value.source {
            match source.parse() {
                Ok(kind) => settings.source = kind,
                Err(err) => tracing::warn!("{}; falling back to fs", err),
            }
        }
        if let Some(root) = &value.root {
            settings.root_override = Some(PathBuf::from(root));
        }
        if let Some(url) = &value.base_url {
            settings.base_url = Some(url.clone());
        }
        if let Some(seconds) = value.timeout_seconds {
            settings.timeout_seconds = seconds;
        }
        if let Some(seconds) = value.cache_ttl_seconds {
            settings.cache_ttl_seconds = seconds;
        }
        if let Some(watch) = value.watch {
            settings.watch = watch;
        }
        apply_file_overrides(&mut settings.files, &value.files);
        apply_search_overrides(&mut settings.search, &value.search);
        settings
    }
}

fn apply_file_overrides(files: &mut PartitionFiles, overrides: &KnowledgeFilesSettings) {
    if let Some(text) = &overrides.text {
        files.text = text.clone();
    }
    if let Some(image) = &overrides.image {
        files.image = image.clone();
    }
    if let Some(code) = &overrides.code {
        files.code = code.clone();
    }
}

fn apply_search_overrides(search: &mut SearchDefaults, overrides: &KnowledgeSearchSettings) {
    if let Some(threshold) = overrides.threshold {
        search.threshold = threshold.max(0.0);
    }
    if let Some(weight) = overrides.tag_weight {
        search.tag_weight = weight.max(0.0);
    }
    if let Some(weight) = overrides.field_weight {
        search.field_weight = weight.max(0.0);
    }
    if let Some(max_results) = overrides.max_results {
        search.max_results = max_results.max(1);
    }
    if let Some(include) = overrides.include_secondary {
        search.include_secondary = include;
    }
    if let Some(chars) = overrides.summary_chars {
        search.summary_chars = chars;
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wayne_core::{CodeBlock, ConversationMessage};

/// Knowledge category. Entries of different partitions never mix.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Text,
    Image,
    Code,
}

impl Partition {
    /// All partitions in load order.
    pub const ALL: [Partition; 3] = [Partition::Text, Partition::Image, Partition::Code];

    /// Routing precedence when a query matches several partitions.
    pub const PRECEDENCE: [Partition; 3] = [Partition::Code, Partition::Image, Partition::Text];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Code => "code",
        }
    }
}

impl FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "image" => Ok(Self::Image),
            "code" | "coder" => Ok(Self::Code),
            _ => Err(format!("unknown partition: {}", s)),
        }
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed knowledge record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub partition: Partition,
    pub url: String,
    /// Free-text description accumulated under the entry heading.
    pub content: String,
    pub tags: BTreeSet<String>,
    pub metadata: BTreeMap<String, String>,
    pub code_blocks: Vec<CodeBlock>,
    pub priority: i64,
}

impl KnowledgeEntry {
    pub fn new(partition: Partition, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            partition,
            url: String::new(),
            content: String::new(),
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
            code_blocks: Vec::new(),
            priority: 0,
        }
    }

    pub fn first_code_block(&self) -> Option<&CodeBlock> {
        self.code_blocks.first()
    }
}

/// Score of one entry against one query. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredMatch {
    pub entry: KnowledgeEntry,
    pub score: f32,
}

/// Entry fields the scorer can look at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SearchField {
    Title,
    Url,
    Description,
    Metadata,
    Tags,
}

impl SearchField {
    /// Fields searched when the caller does not pick any.
    pub fn defaults() -> Vec<Self> {
        vec![Self::Title, Self::Description, Self::Metadata, Self::Tags]
    }
}

/// Per-field score multipliers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldWeights {
    pub tags: f32,
    pub other: f32,
}

impl FieldWeights {
    pub fn weight(&self, field: SearchField) -> f32 {
        match field {
            SearchField::Tags => self.tags,
            _ => self.other,
        }
    }
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            tags: 2.0,
            other: 1.0,
        }
    }
}

/// Per-query overrides for search. Unset fields fall back to `SearchDefaults`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SearchOptions {
    pub threshold: Option<f32>,
    pub limit: Option<usize>,
    pub fields: Option<Vec<SearchField>>,
    pub weights: Option<FieldWeights>,
    /// Only accept fields equal to the whole query.
    #[serde(default)]
    pub exact_match: bool,
}

/// Output of the query router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRoute {
    pub primary: Partition,
    pub secondary: Vec<Partition>,
    /// No keyword matched; `primary` is the text fallback.
    pub general: bool,
}

impl QueryRoute {
    /// Partitions to search, primary first.
    pub fn searched_partitions(&self, include_secondary: bool) -> Vec<Partition> {
        let mut partitions = vec![self.primary];
        if include_secondary {
            partitions.extend(self.secondary.iter().copied());
        }
        partitions
    }
}

/// What the assembler needs to know about the query it answers.
#[derive(Debug, Clone)]
pub struct Intent<'a> {
    pub route: &'a QueryRoute,
    pub query: &'a str,
    /// Most recent earlier user question, if any.
    pub previous_query: Option<&'a str>,
}

/// Image attachment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub title: String,
    pub url: String,
}

/// Non-text payload carried next to the markdown reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResponseContent {
    #[default]
    TextOnly,
    WithCode(CodeBlock),
    WithImage(ImageRef),
}

impl ResponseContent {
    pub fn code(&self) -> Option<&CodeBlock> {
        match self {
            Self::WithCode(block) => Some(block),
            Self::TextOnly | Self::WithImage(_) => None,
        }
    }

    pub fn image(&self) -> Option<&ImageRef> {
        match self {
            Self::WithImage(image) => Some(image),
            Self::TextOnly | Self::WithCode(_) => None,
        }
    }
}

/// Markdown reply plus its attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledResponse {
    pub content: String,
    pub attachment: ResponseContent,
}

/// Input to the conversation core.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CoreRequest {
    pub text: String,
    #[serde(default)]
    pub context: Vec<ConversationMessage>,
    #[serde(default)]
    pub partition_hint: Option<Partition>,
    /// `Some(false)` restricts the search to the primary partition.
    #[serde(default)]
    pub include_secondary: Option<bool>,
}

impl CoreRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }
}

/// Entry that contributed to a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntry {
    pub partition: Partition,
    pub title: String,
    pub score: f32,
}

impl From<&ScoredMatch> for MatchedEntry {
    fn from(value: &ScoredMatch) -> Self {
        Self {
            partition: value.entry.partition,
            title: value.entry.title.clone(),
            score: value.score,
        }
    }
}

/// Output of the conversation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreResponse {
    pub content: String,
    pub attachment: ResponseContent,
    pub matched_entries: Vec<MatchedEntry>,
    pub route: Option<QueryRoute>,
}

impl CoreResponse {
    pub fn attached_code(&self) -> Option<&CodeBlock> {
        self.attachment.code()
    }
}

/// Entry counts and cache state of a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeStats {
    pub text: usize,
    pub image: usize,
    pub code: usize,
    pub last_updated: Option<DateTime<Utc>>,
    pub cache_size: usize,
}

/// Result of loading every partition.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: Vec<(Partition, usize)>,
    pub failed: Vec<(Partition, crate::errors::KnowledgeError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_entries(&self) -> usize {
        self.loaded.iter().map(|(_, count)| count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_round_trips_through_strings() {
        for partition in Partition::ALL {
            assert_eq!(partition.as_str().parse::<Partition>(), Ok(partition));
        }
        assert_eq!("coder".parse::<Partition>(), Ok(Partition::Code));
        assert!("audio".parse::<Partition>().is_err());
    }

    #[test]
    fn searched_partitions_respects_secondary_flag() {
        let route = QueryRoute {
            primary: Partition::Code,
            secondary: vec![Partition::Text],
            general: false,
        };
        assert_eq!(
            route.searched_partitions(true),
            vec![Partition::Code, Partition::Text]
        );
        assert_eq!(route.searched_partitions(false), vec![Partition::Code]);
    }

    #[test]
    fn response_content_is_tagged() {
        let content = ResponseContent::WithCode(CodeBlock::new("rust", "fn main() {}"));
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["kind"], "with_code");
        assert_eq!(json["language"], "rust");
        assert!(content.image().is_none());
        assert_eq!(content.code().map(|c| c.language.as_str()), Some("rust"));
    }
}

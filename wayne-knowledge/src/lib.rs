//! Knowledge lookup and conversation core for Wayne AI.

pub mod assemble;
pub mod cache;
pub mod context;
pub mod engine;
pub mod errors;
pub mod models;
pub mod parser;
pub mod paths;
pub mod router;
pub mod search;
pub mod sources;
pub mod storage;
pub mod watcher;

pub use assemble::ResponseAssembler;
pub use context::ConversationContext;
pub use engine::{Conversation, WayneEngine};
pub use errors::{KnowledgeError, KnowledgeResult};
pub use models::{
    AssembledResponse, CoreRequest, CoreResponse, ImageRef, Intent, KnowledgeEntry,
    KnowledgeStats, LoadReport, MatchedEntry, Partition, QueryRoute, ResponseContent,
    ScoredMatch, SearchField, SearchOptions,
};
pub use router::QueryRouter;
pub use sources::{FsSource, HttpSource, KnowledgeSource, StaticSource, source_from_settings};
pub use storage::{KnowledgeStore, PartitionSnapshot};
pub use watcher::run_knowledge_watcher;
pub use wayne_core::config::{KnowledgeSettings, SearchDefaults};

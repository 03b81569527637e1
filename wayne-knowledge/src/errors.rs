use crate::models::Partition;

#[derive(Debug, thiserror::Error)]
pub enum KnowledgeError {
    #[error("missing data directory")]
    MissingDataDir,
    #[error("knowledge source for {partition} unavailable: {reason}")]
    SourceUnavailable { partition: Partition, reason: String },
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("invalid source url: {0}")]
    InvalidSourceUrl(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

impl KnowledgeError {
    pub(crate) fn unavailable(partition: Partition, reason: impl std::fmt::Display) -> Self {
        Self::SourceUnavailable {
            partition,
            reason: reason.to_string(),
        }
    }
}

pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

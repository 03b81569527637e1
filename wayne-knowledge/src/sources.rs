//! Knowledge document sources.
//!
//! A source turns a partition name into the raw markdown document for that
//! partition. The store never retries: a failed read surfaces as
//! `SourceUnavailable` and the caller decides what to do.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use url::Url;

use crate::KnowledgeSettings;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::Partition;
use crate::paths::knowledge_root;
use wayne_core::SourceKind;
use wayne_core::config::PartitionFiles;

/// Reads the markdown document backing a partition.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    async fn read_partition(&self, partition: Partition) -> KnowledgeResult<String>;

    /// Human-readable location, for logs.
    fn describe(&self, partition: Partition) -> String;
}

pub(crate) fn file_name(files: &PartitionFiles, partition: Partition) -> &str {
    match partition {
        Partition::Text => &files.text,
        Partition::Image => &files.image,
        Partition::Code => &files.code,
    }
}

/// Partition documents stored as files under one directory.
#[derive(Debug, Clone)]
pub struct FsSource {
    root: PathBuf,
    files: PartitionFiles,
}

impl FsSource {
    pub fn new(root: impl Into<PathBuf>, files: PartitionFiles) -> Self {
        Self {
            root: root.into(),
            files,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, partition: Partition) -> PathBuf {
        self.root.join(file_name(&self.files, partition))
    }
}

#[async_trait]
impl KnowledgeSource for FsSource {
    async fn read_partition(&self, partition: Partition) -> KnowledgeResult<String> {
        let path = self.path_for(partition);
        debug!("reading {} knowledge from {}", partition, path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| KnowledgeError::unavailable(partition, format!("{}: {}", path.display(), e)))
    }

    fn describe(&self, partition: Partition) -> String {
        self.path_for(partition).display().to_string()
    }
}

/// Partition documents fetched over HTTP relative to a base URL.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    base: Url,
    files: PartitionFiles,
    token: Option<String>,
}

impl HttpSource {
    pub fn new(
        base_url: &str,
        files: PartitionFiles,
        timeout: Duration,
        token: Option<String>,
    ) -> KnowledgeResult<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base = Url::parse(&normalized)
            .map_err(|e| KnowledgeError::InvalidSourceUrl(format!("{}: {}", base_url, e)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(KnowledgeError::InvalidSourceUrl(format!(
                "unsupported scheme '{}' in {}",
                base.scheme(),
                base_url
            )));
        }

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base,
            files,
            token,
        })
    }

    pub fn url_for(&self, partition: Partition) -> KnowledgeResult<Url> {
        let name = file_name(&self.files, partition);
        self.base
            .join(name)
            .map_err(|e| KnowledgeError::InvalidSourceUrl(format!("{}: {}", name, e)))
    }
}

#[async_trait]
impl KnowledgeSource for HttpSource {
    async fn read_partition(&self, partition: Partition) -> KnowledgeResult<String> {
        let url = self.url_for(partition)?;
        debug!("fetching {} knowledge from {}", partition, url);

        let mut request = self
            .client
            .get(url.clone())
            .header("User-Agent", "wayne-knowledge/0.1");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| KnowledgeError::unavailable(partition, format!("GET {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(KnowledgeError::unavailable(
                partition,
                format!("HTTP {} for {}", response.status(), url),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| KnowledgeError::unavailable(partition, format!("read body: {}", e)))
    }

    fn describe(&self, partition: Partition) -> String {
        self.url_for(partition)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| self.base.to_string())
    }
}

/// In-memory documents, replaceable at runtime.
#[derive(Debug, Default)]
pub struct StaticSource {
    documents: RwLock<HashMap<Partition, String>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, partition: Partition, markdown: impl Into<String>) -> Self {
        self.set_document(partition, markdown);
        self
    }

    pub fn set_document(&self, partition: Partition, markdown: impl Into<String>) {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.insert(partition, markdown.into());
    }

    pub fn remove_document(&self, partition: Partition) {
        let mut documents = self.documents.write().unwrap_or_else(|e| e.into_inner());
        documents.remove(&partition);
    }
}

#[async_trait]
impl KnowledgeSource for StaticSource {
    async fn read_partition(&self, partition: Partition) -> KnowledgeResult<String> {
        let documents = self.documents.read().unwrap_or_else(|e| e.into_inner());
        documents
            .get(&partition)
            .cloned()
            .ok_or_else(|| KnowledgeError::unavailable(partition, "no document registered"))
    }

    fn describe(&self, partition: Partition) -> String {
        format!("memory:{}", partition)
    }
}

/// Build the source selected in settings.
pub fn source_from_settings(
    settings: &KnowledgeSettings,
    token: Option<String>,
) -> KnowledgeResult<Arc<dyn KnowledgeSource>> {
    match settings.source {
        SourceKind::Fs => {
            let root = knowledge_root(settings)?;
            Ok(Arc::new(FsSource::new(root, settings.files.clone())))
        }
        SourceKind::Http => {
            let base_url = settings
                .base_url
                .as_deref()
                .ok_or_else(|| KnowledgeError::InvalidSourceUrl("no base_url configured".into()))?;
            Ok(Arc::new(HttpSource::new(
                base_url,
                settings.files.clone(),
                Duration::from_secs(settings.timeout_seconds),
                token,
            )?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_source_reads_configured_files() {
        let temp = tempfile::tempdir().unwrap();
        tokio::fs::write(temp.path().join("coder-knowledge.md"), "1. [A](u)")
            .await
            .unwrap();

        let source = FsSource::new(temp.path(), PartitionFiles::default());
        let doc = source.read_partition(Partition::Code).await.unwrap();
        assert_eq!(doc, "1. [A](u)");

        let err = source.read_partition(Partition::Image).await.unwrap_err();
        assert!(matches!(
            err,
            KnowledgeError::SourceUnavailable {
                partition: Partition::Image,
                ..
            }
        ));
    }

    #[test]
    fn http_source_joins_partition_files() {
        let source = HttpSource::new(
            "https://kb.example.com/docs/knowledge",
            PartitionFiles::default(),
            Duration::from_secs(1),
            None,
        )
        .unwrap();

        assert_eq!(
            source.url_for(Partition::Code).unwrap().as_str(),
            "https://kb.example.com/docs/knowledge/coder-knowledge.md"
        );
        assert_eq!(
            source.describe(Partition::Text),
            "https://kb.example.com/docs/knowledge/text-knowledge.md"
        );
    }

    #[test]
    fn http_source_rejects_bad_urls() {
        let files = PartitionFiles::default();
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            HttpSource::new("not a url", files.clone(), timeout, None),
            Err(KnowledgeError::InvalidSourceUrl(_))
        ));
        assert!(matches!(
            HttpSource::new("ftp://kb.example.com/", files, timeout, None),
            Err(KnowledgeError::InvalidSourceUrl(_))
        ));
    }

    #[tokio::test]
    async fn static_source_serves_registered_documents() {
        let source = StaticSource::new().with_document(Partition::Text, "1. [Word](u)");
        assert_eq!(
            source.read_partition(Partition::Text).await.unwrap(),
            "1. [Word](u)"
        );
        source.remove_document(Partition::Text);
        assert!(source.read_partition(Partition::Text).await.is_err());
    }

    #[test]
    fn settings_select_source_kind() {
        let settings = KnowledgeSettings {
            root_override: Some(PathBuf::from("/srv/kb")),
            ..Default::default()
        };
        let source = source_from_settings(&settings, None).unwrap();
        assert_eq!(source.describe(Partition::Image), "/srv/kb/image-knowledge.md");

        let settings = KnowledgeSettings {
            source: SourceKind::Http,
            base_url: None,
            ..Default::default()
        };
        assert!(source_from_settings(&settings, None).is_err());
    }
}

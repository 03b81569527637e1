use std::sync::Arc;

use tracing::{error, info, warn};

mod repl;

use repl::Repl;
use wayne_core::{Config, SourceKind};
use wayne_knowledge::paths::knowledge_root;
use wayne_knowledge::{
    Conversation, KnowledgeStore, WayneEngine, run_knowledge_watcher, source_from_settings,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    // Initialize tracing, RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = config.knowledge_settings();
    let source = source_from_settings(&settings, config.knowledge_token().map(str::to_string))?;
    let store = KnowledgeStore::new(source, settings.clone());

    let report = store.load_all().await;
    for (partition, err) in &report.failed {
        warn!("{} knowledge unavailable: {}", partition, err);
    }
    info!(
        "Knowledge loaded: {} entries across {} partitions",
        report.total_entries(),
        report.loaded.len()
    );

    if settings.watch && settings.source == SourceKind::Fs {
        let root = knowledge_root(&settings)?;
        let watched = store.clone();
        tokio::spawn(async move {
            if let Err(err) = run_knowledge_watcher(watched, root).await {
                error!("Knowledge watcher stopped: {}", err);
            }
        });
    }

    let engine = Arc::new(WayneEngine::from_store(store.clone()));
    let conversation = Conversation::new(engine, config.max_messages());
    Repl::new(conversation, store).run().await
}

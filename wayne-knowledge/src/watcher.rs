use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::Partition;
use crate::sources::file_name;
use crate::storage::KnowledgeStore;

const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Reload partitions whose files change under `root`. Runs until the task
/// is dropped.
pub async fn run_knowledge_watcher(store: KnowledgeStore, root: PathBuf) -> KnowledgeResult<()> {
    watch_knowledge(store, root, DEFAULT_DEBOUNCE).await
}

pub async fn watch_knowledge(
    store: KnowledgeStore,
    root: PathBuf,
    debounce: Duration,
) -> KnowledgeResult<()> {
    if !root.is_dir() {
        return Err(KnowledgeError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("knowledge root {} does not exist", root.display()),
        )));
    }

    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<PathBuf>>();
    let mut watcher: RecommendedWatcher =
        notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event.paths);
            }
        })?;
    watcher.watch(&root, RecursiveMode::NonRecursive)?;
    info!("Watching {} for knowledge changes", root.display());

    let mut pending = BTreeSet::new();
    loop {
        tokio::select! {
            Some(paths) = rx.recv() => {
                pending.extend(
                    paths
                        .iter()
                        .filter_map(|path| partition_for_path(&store, path)),
                );
            }
            _ = tokio::time::sleep(debounce) => {
                for partition in std::mem::take(&mut pending) {
                    if let Err(err) = store.reload(partition).await {
                        warn!("knowledge watcher reload of {partition} failed: {err}");
                    }
                }
            }
        }
    }
}

fn partition_for_path(store: &KnowledgeStore, path: &Path) -> Option<Partition> {
    let name = path.file_name()?.to_str()?;
    let files = &store.settings().files;
    Partition::ALL
        .into_iter()
        .find(|partition| file_name(files, *partition) == name)
}

//! Readers racing a reload must always see one whole snapshot.

use std::sync::Arc;

use wayne_knowledge::{KnowledgeSettings, KnowledgeStore, Partition, SearchOptions, StaticSource};

const ENTRIES: usize = 25;
const RELOADS: usize = 40;
const READERS: usize = 4;

fn document(version: &str) -> String {
    (1..=ENTRIES)
        .map(|i| format!("{i}. [{version} entry {i:02}](https://example.org/{version}/{i})\nshared topic body\ntags: shared\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn single_version<'a>(titles: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut versions = titles.map(|title| title.split(' ').next().unwrap_or_default().to_string());
    let first = versions.next()?;
    versions.all(|v| v == first).then_some(first)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_observe_mixed_snapshots() {
    let v1 = document("v1");
    let v2 = document("v2");
    let source = Arc::new(StaticSource::new().with_document(Partition::Code, v1.clone()));
    let store = KnowledgeStore::new(source.clone(), KnowledgeSettings::default());
    store.load(Partition::Code).await.unwrap();

    let writer = {
        let store = store.clone();
        tokio::spawn(async move {
            for round in 0..RELOADS {
                let next = if round % 2 == 0 { &v2 } else { &v1 };
                source.set_document(Partition::Code, next.clone());
                store.reload(Partition::Code).await.unwrap();
                tokio::task::yield_now().await;
            }
        })
    };

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..200 {
                    let snapshot = store.all(Partition::Code);
                    assert_eq!(snapshot.len(), ENTRIES);
                    assert!(
                        single_version(snapshot.entries.iter().map(|e| e.title.as_str())).is_some(),
                        "snapshot mixed two versions"
                    );

                    let matches = store.search(Partition::Code, "shared", &SearchOptions::default());
                    assert_eq!(matches.len(), ENTRIES);
                    assert!(
                        single_version(matches.iter().map(|m| m.entry.title.as_str())).is_some(),
                        "search mixed two versions"
                    );
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    writer.await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    let generation = store.all(Partition::Code).generation;
    assert_eq!(generation as usize, RELOADS + 1);
}

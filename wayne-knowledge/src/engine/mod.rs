use tracing::debug;
use wayne_core::MessageRole;

use crate::SearchDefaults;
use crate::assemble::ResponseAssembler;
use crate::errors::{KnowledgeError, KnowledgeResult};
use crate::models::{CoreRequest, CoreResponse, Intent, QueryRoute, ScoredMatch, SearchOptions};
use crate::router::QueryRouter;
use crate::search::compare_matches;
use crate::storage::KnowledgeStore;

mod conversation;

pub use conversation::Conversation;

/// Route, search and render pipeline over a shared store.
#[derive(Debug, Clone)]
pub struct WayneEngine {
    store: KnowledgeStore,
    router: QueryRouter,
    assembler: ResponseAssembler,
    search: SearchDefaults,
}

impl WayneEngine {
    pub fn new(store: KnowledgeStore, search: SearchDefaults) -> Self {
        Self {
            store,
            router: QueryRouter::new(),
            assembler: ResponseAssembler::new(search.summary_chars),
            search,
        }
    }

    /// Build an engine from the store's own search settings.
    pub fn from_store(store: KnowledgeStore) -> Self {
        let search = store.settings().search.clone();
        Self::new(store, search)
    }

    pub fn store(&self) -> &KnowledgeStore {
        &self.store
    }

    pub fn assembler(&self) -> &ResponseAssembler {
        &self.assembler
    }

    /// Answer one request against the current snapshots.
    pub fn process(&self, request: &CoreRequest) -> KnowledgeResult<CoreResponse> {
        let query = request.text.trim();
        if query.is_empty() {
            return Err(KnowledgeError::InvalidQuery("query is empty".to_string()));
        }

        if self.router.is_greeting(query) {
            let greeting = self.assembler.greeting();
            return Ok(CoreResponse {
                content: greeting.content,
                attachment: greeting.attachment,
                matched_entries: Vec::new(),
                route: None,
            });
        }

        let route = self.router.classify_with_hint(query, request.partition_hint);
        let matches = self.search_route(&route, query, request.include_secondary);
        debug!(
            "Routed query to {} (secondary {:?}), {} matches",
            route.primary,
            route.secondary,
            matches.len()
        );

        let previous_query = request
            .context
            .iter()
            .rev()
            .find(|message| message.role == MessageRole::User)
            .map(|message| message.text.as_str());
        let intent = Intent {
            route: &route,
            query,
            previous_query,
        };
        let assembled = self.assembler.assemble(&matches, &intent);

        Ok(CoreResponse {
            content: assembled.content,
            attachment: assembled.attachment,
            matched_entries: matches.iter().map(Into::into).collect(),
            route: Some(route),
        })
    }

    fn search_route(
        &self,
        route: &QueryRoute,
        query: &str,
        include_secondary: Option<bool>,
    ) -> Vec<ScoredMatch> {
        let include_secondary = include_secondary.unwrap_or(self.search.include_secondary);
        let options = SearchOptions::default();

        let mut results = Vec::new();
        for partition in route.searched_partitions(include_secondary) {
            let partial = self.store.search(partition, query, &options);
            results.extend(partial.iter().cloned());
        }

        results.sort_by(compare_matches);
        results.truncate(self.search.max_results.max(1));
        results
    }
}

//! Keyword relevance scoring.
//!
//! Each searched field contributes its full weight when it contains the whole
//! query, otherwise `matched / total * 0.7 * weight` over the query terms of
//! at least three characters.

use std::cmp::Ordering;

use crate::SearchDefaults;
use crate::models::{FieldWeights, KnowledgeEntry, ScoredMatch, SearchField, SearchOptions};

/// Share of a field's weight a full term match earns without a phrase match.
pub const PARTIAL_MATCH_FACTOR: f32 = 0.7;

/// Terms shorter than this only count through the whole-query check.
pub const MIN_TERM_CHARS: usize = 3;

/// Fully resolved scoring parameters for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringParams {
    pub threshold: f32,
    pub limit: Option<usize>,
    pub fields: Vec<SearchField>,
    pub weights: FieldWeights,
    pub exact_match: bool,
}

impl ScoringParams {
    pub fn resolve(defaults: &SearchDefaults, options: &SearchOptions) -> Self {
        Self {
            threshold: options.threshold.unwrap_or(defaults.threshold).max(0.0),
            limit: options.limit,
            fields: options.fields.clone().unwrap_or_else(SearchField::defaults),
            weights: options.weights.unwrap_or(FieldWeights {
                tags: defaults.tag_weight,
                other: defaults.field_weight,
            }),
            exact_match: options.exact_match,
        }
    }
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self::resolve(&SearchDefaults::default(), &SearchOptions::default())
    }
}

fn field_values(entry: &KnowledgeEntry, field: SearchField) -> Vec<String> {
    match field {
        SearchField::Title => vec![entry.title.clone()],
        SearchField::Url => vec![entry.url.clone()],
        SearchField::Description => vec![entry.content.clone()],
        SearchField::Metadata => entry.metadata.values().cloned().collect(),
        SearchField::Tags => {
            if entry.tags.is_empty() {
                Vec::new()
            } else {
                vec![entry.tags.iter().map(String::as_str).collect::<Vec<_>>().join(" ")]
            }
        }
    }
}

/// Score one field value against a lower-cased query.
fn match_score(value: &str, query: &str, terms: &[&str], weight: f32) -> f32 {
    let value = value.to_lowercase();
    if value.contains(query) {
        return weight;
    }
    if terms.is_empty() {
        return 0.0;
    }

    let words: Vec<&str> = value.split_whitespace().collect();
    let matched = terms
        .iter()
        .filter(|term| words.iter().any(|word| word.contains(*term)))
        .count();
    (matched as f32 / terms.len() as f32) * PARTIAL_MATCH_FACTOR * weight
}

/// Relevance of `entry` for `query` using the default field set.
///
/// Blank queries score zero.
pub fn score(entry: &KnowledgeEntry, query: &str, weights: &FieldWeights) -> f32 {
    score_fields(entry, query, &SearchField::defaults(), weights)
}

/// Relevance of `entry` for `query` over an explicit field set.
pub fn score_fields(
    entry: &KnowledgeEntry,
    query: &str,
    fields: &[SearchField],
    weights: &FieldWeights,
) -> f32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    let terms: Vec<&str> = query
        .split_whitespace()
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .collect();

    let mut total = 0.0_f32;
    for field in fields {
        let weight = weights.weight(*field);
        for value in field_values(entry, *field) {
            if !value.trim().is_empty() {
                total += match_score(&value, &query, &terms, weight);
            }
        }
    }
    total.max(0.0)
}

/// Exact mode: a field equal to the whole query earns its weight.
fn exact_score(
    entry: &KnowledgeEntry,
    query: &str,
    fields: &[SearchField],
    weights: &FieldWeights,
) -> f32 {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return 0.0;
    }
    fields
        .iter()
        .filter(|field| {
            let candidates: Vec<String> = match field {
                SearchField::Tags => entry.tags.iter().cloned().collect(),
                other => field_values(entry, **other),
            };
            candidates
                .iter()
                .any(|value| value.trim().to_lowercase() == query)
        })
        .map(|field| weights.weight(*field))
        .sum()
}

/// Ordering for ranked results: score desc, priority desc, title asc.
pub fn compare_matches(a: &ScoredMatch, b: &ScoredMatch) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.entry.priority.cmp(&a.entry.priority))
        .then_with(|| {
            a.entry
                .title
                .to_lowercase()
                .cmp(&b.entry.title.to_lowercase())
        })
}

/// Score, filter by threshold and rank a set of entries.
pub fn rank(entries: &[KnowledgeEntry], query: &str, params: &ScoringParams) -> Vec<ScoredMatch> {
    let mut ranked: Vec<ScoredMatch> = entries
        .iter()
        .filter_map(|entry| {
            let score = if params.exact_match {
                exact_score(entry, query, &params.fields, &params.weights)
            } else {
                score_fields(entry, query, &params.fields, &params.weights)
            };
            (score > 0.0 && score >= params.threshold).then(|| ScoredMatch {
                entry: entry.clone(),
                score,
            })
        })
        .collect();

    ranked.sort_by(compare_matches);
    if let Some(limit) = params.limit {
        ranked.truncate(limit);
    }
    ranked
}

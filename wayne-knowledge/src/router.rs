//! Keyword intent routing.
//!
//! Deliberately shallow: a query is routed to every partition whose keyword
//! list it mentions, with precedence code > image > text.

use crate::models::{Partition, QueryRoute};

const CODE_KEYWORDS: &[&str] = &["code", "program", "script", "algorithm", "function", "debug"];
const IMAGE_KEYWORDS: &[&str] = &["image", "photo", "picture", "visual", "graphic"];
const TEXT_KEYWORDS: &[&str] = &["text", "word", "language", "meaning", "define"];

const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "mingalaba",
];

pub fn keywords(partition: Partition) -> &'static [&'static str] {
    match partition {
        Partition::Code => CODE_KEYWORDS,
        Partition::Image => IMAGE_KEYWORDS,
        Partition::Text => TEXT_KEYWORDS,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRouter;

impl QueryRouter {
    pub fn new() -> Self {
        Self
    }

    /// Partitions whose keywords appear in `text`, in precedence order.
    pub fn matching_partitions(&self, text: &str) -> Vec<Partition> {
        let lowered = text.to_lowercase();
        Partition::PRECEDENCE
            .into_iter()
            .filter(|partition| keywords(*partition).iter().any(|kw| lowered.contains(kw)))
            .collect()
    }

    pub fn classify(&self, text: &str) -> QueryRoute {
        let mut matched = self.matching_partitions(text).into_iter();
        match matched.next() {
            Some(primary) => QueryRoute {
                primary,
                secondary: matched.collect(),
                general: false,
            },
            None => QueryRoute {
                primary: Partition::Text,
                secondary: Vec::new(),
                general: true,
            },
        }
    }

    /// Route with a caller-chosen primary partition. Keyword matches other
    /// than the hint stay as secondaries.
    pub fn classify_with_hint(&self, text: &str, hint: Option<Partition>) -> QueryRoute {
        let Some(hint) = hint else {
            return self.classify(text);
        };
        QueryRoute {
            primary: hint,
            secondary: self
                .matching_partitions(text)
                .into_iter()
                .filter(|partition| *partition != hint)
                .collect(),
            general: false,
        }
    }

    /// Whole message is a salutation ("hi", "hello there!").
    pub fn is_greeting(&self, text: &str) -> bool {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric() || c.is_whitespace())
            .collect();
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        GREETINGS.iter().any(|greeting| {
            cleaned == *greeting
                || cleaned
                    .strip_prefix(greeting)
                    .is_some_and(|rest| matches!(rest.trim(), "there" | "wayne" | "wayne ai"))
        })
    }
}

//! Markdown knowledge document parser.
//!
//! One document holds every entry of a partition:
//!
//! ````markdown
//! 1. [Quick sort](https://example.com/qs) {priority: 3}
//! In-place divide and conquer sort.
//! ```metadata
//! - level: intermediate
//! ```
//! ```python
//! def quicksort(xs): ...
//! ```
//! tags: python, sorting
//! ````

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use wayne_core::CodeBlock;

use crate::models::{KnowledgeEntry, Partition};

static ENTRY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+\.\s+\[(.+?)\]\((.*?)\)(?:\s*\{\s*priority:\s*(-?\d+)\s*\})?")
        .expect("regex")
});
static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*\d+\.(\s|$)").expect("regex"));
static TAGS_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^tags:\s*(.*)$").expect("regex"));
static METADATA_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:-\s*)?([^:]+?)\s*:\s*(.+)$").expect("regex"));

enum Fence {
    Closed,
    Metadata,
    Code { language: String, lines: Vec<String> },
}

struct OpenEntry {
    entry: KnowledgeEntry,
    description: Vec<String>,
    description_open: bool,
}

impl OpenEntry {
    fn finish(self) -> KnowledgeEntry {
        let mut entry = self.entry;
        entry.content = self.description.join("\n").trim().to_string();
        entry
    }
}

/// Parse a partition document into entries sorted by priority (desc) then
/// title (case-insensitive). Lines that don't fit the format are skipped.
pub fn parse_partition(raw: &str, partition: Partition) -> Vec<KnowledgeEntry> {
    let mut entries = Vec::new();
    let mut current: Option<OpenEntry> = None;
    let mut fence = Fence::Closed;

    for (index, line) in raw.lines().enumerate() {
        let trimmed = line.trim();

        match &mut fence {
            Fence::Metadata => {
                if is_fence(trimmed) {
                    fence = Fence::Closed;
                } else if let Some(open) = current.as_mut()
                    && let Some(caps) = METADATA_LINE.captures(trimmed)
                {
                    open.entry
                        .metadata
                        .insert(caps[1].trim().to_string(), caps[2].trim().to_string());
                }
                continue;
            }
            Fence::Code { language, lines } => {
                if is_fence(trimmed) {
                    if let Some(open) = current.as_mut() {
                        open.entry
                            .code_blocks
                            .push(CodeBlock::new(language.clone(), lines.join("\n")));
                    }
                    fence = Fence::Closed;
                } else {
                    lines.push(line.to_string());
                }
                continue;
            }
            Fence::Closed => {}
        }

        if let Some(caps) = ENTRY_LINE.captures(line) {
            if let Some(open) = current.take() {
                entries.push(open.finish());
            }
            let mut entry = KnowledgeEntry::new(partition, caps[1].trim());
            entry.url = caps[2].trim().to_string();
            entry.priority = caps
                .get(3)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            current = Some(OpenEntry {
                entry,
                description: Vec::new(),
                description_open: true,
            });
            continue;
        }

        if let Some(label) = trimmed.strip_prefix("```") {
            let label = label.trim();
            fence = if label.eq_ignore_ascii_case("metadata") {
                Fence::Metadata
            } else {
                Fence::Code {
                    language: if label.is_empty() {
                        "text".to_string()
                    } else {
                        label.to_string()
                    },
                    lines: Vec::new(),
                }
            };
            continue;
        }

        if let Some(open) = current.as_mut()
            && let Some(caps) = TAGS_LINE.captures(trimmed)
        {
            open.entry.tags = caps[1]
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
            continue;
        }

        if NUMBERED_LINE.is_match(line) {
            // A numbered item without a link is dropped; it only ends the description.
            debug!(
                "{}: skipping malformed entry on line {}: {}",
                partition,
                index + 1,
                trimmed
            );
            if let Some(open) = current.as_mut() {
                open.description_open = false;
            }
            continue;
        }

        if trimmed.is_empty() {
            if let Some(open) = current.as_mut() {
                open.description_open = false;
            }
            continue;
        }

        match current.as_mut() {
            Some(open) if open.description_open => open.description.push(trimmed.to_string()),
            _ => debug!("{}: ignoring line {}", partition, index + 1),
        }
    }

    if let Fence::Code { language, lines } = fence
        && let Some(open) = current.as_mut()
    {
        warn!("{}: unterminated code fence in entry '{}'", partition, open.entry.title);
        open.entry
            .code_blocks
            .push(CodeBlock::new(language, lines.join("\n")));
    }
    if let Some(open) = current.take() {
        entries.push(open.finish());
    }

    sort_entries(&mut entries);
    dedupe_titles(&mut entries, partition);
    entries
}

fn is_fence(trimmed: &str) -> bool {
    trimmed.starts_with("```") && trimmed.trim_start_matches('`').trim().is_empty()
}

/// Priority descending, then title ascending ignoring case.
fn sort_entries(entries: &mut [KnowledgeEntry]) {
    entries.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            .then_with(|| a.title.cmp(&b.title))
    });
}

fn dedupe_titles(entries: &mut Vec<KnowledgeEntry>, partition: Partition) {
    let mut seen = HashSet::new();
    entries.retain(|entry| {
        let fresh = seen.insert(entry.title.clone());
        if !fresh {
            warn!("{}: dropping duplicate entry '{}'", partition, entry.title);
        }
        fresh
    });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    const CODE_DOC: &str = r#"# Coder knowledge

Intro paragraph that belongs to no entry.

1. [Zip files in Rust](https://example.com/zip)
Use the zip crate.

2. [Quick sort](https://example.com/qs) {priority: 5}
In-place divide and conquer
sorting algorithm.
```metadata
- level: intermediate
- language: python
```
```python
def quicksort(xs):
    return xs
```
tags: python, sorting, algorithm

3. [apply patches](https://example.com/patch) {priority: 5}
Applying diffs.
"#;

    #[test]
    fn parses_entries_with_metadata_code_and_tags() {
        let entries = parse_partition(CODE_DOC, Partition::Code);
        assert_eq!(entries.len(), 3);

        let quick = entries.iter().find(|e| e.title == "Quick sort").unwrap();
        assert_eq!(quick.partition, Partition::Code);
        assert_eq!(quick.url, "https://example.com/qs");
        assert_eq!(quick.priority, 5);
        assert_eq!(quick.content, "In-place divide and conquer\nsorting algorithm.");
        assert_eq!(quick.metadata.get("level").map(String::as_str), Some("intermediate"));
        assert_eq!(quick.metadata.get("language").map(String::as_str), Some("python"));
        assert_eq!(quick.code_blocks.len(), 1);
        assert_eq!(quick.code_blocks[0].language, "python");
        assert_eq!(
            quick.code_blocks[0].code,
            "def quicksort(xs):\n    return xs"
        );
        let tags: Vec<&str> = quick.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["algorithm", "python", "sorting"]);
    }

    #[test]
    fn sorts_by_priority_then_title_ignoring_case() {
        let entries = parse_partition(CODE_DOC, Partition::Code);
        let titles: Vec<&str> = entries.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["apply patches", "Quick sort", "Zip files in Rust"]);
    }

    #[test]
    fn tags_and_priority_parse_exactly() {
        let doc = "1. [Entry](https://example.com) {priority: 5}\ntags: a, b\n";
        let entries = parse_partition(doc, Partition::Text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].priority, 5);
        assert_eq!(
            entries[0].tags,
            BTreeSet::from(["a".to_string(), "b".to_string()])
        );
        assert!(entries[0].content.is_empty());
    }

    #[test]
    fn missing_tags_yield_empty_set() {
        let entries = parse_partition("1. [Lonely](u)\nJust text.", Partition::Text);
        assert!(entries[0].tags.is_empty());
        assert!(entries[0].metadata.is_empty());
        assert!(entries[0].code_blocks.is_empty());
        assert_eq!(entries[0].priority, 0);
    }

    #[test]
    fn description_stops_at_blank_line() {
        let doc = "1. [Words](u)\nfirst line\n\nstray paragraph\ntags: lexicon\n";
        let entries = parse_partition(doc, Partition::Text);
        assert_eq!(entries[0].content, "first line");
        assert!(entries[0].tags.contains("lexicon"));
    }

    #[test]
    fn malformed_numbered_lines_are_skipped() {
        let doc = "1. not a link\norphan text\n2. [Valid](u) {priority: x}\nbody\n3.\n";
        let entries = parse_partition(doc, Partition::Image);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Valid");
        assert_eq!(entries[0].priority, 0);
        assert_eq!(entries[0].content, "body");
    }

    #[test]
    fn malformed_numbered_line_keeps_entry_open_for_tags_and_metadata() {
        let doc = "1. [Sorting](u)\nSteps:\n2. Pick a pivot\ntrailing prose\ntags: sort, pivot\n```metadata\n- level: easy\n```\n```python\nsorted(xs)\n```\n";
        let entries = parse_partition(doc, Partition::Code);
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.title, "Sorting");
        assert_eq!(entry.content, "Steps:");
        assert_eq!(entry.tags, BTreeSet::from(["pivot".to_string(), "sort".to_string()]));
        assert_eq!(entry.metadata.get("level").map(String::as_str), Some("easy"));
        assert_eq!(entry.code_blocks.len(), 1);
        assert_eq!(entry.code_blocks[0].code, "sorted(xs)");
    }

    #[test]
    fn unlabeled_and_unterminated_fences_become_code_blocks() {
        let doc = "1. [Snippets](u)\n```\nplain\n```\n```rust\nfn main() {}\n";
        let entries = parse_partition(doc, Partition::Code);
        let blocks = &entries[0].code_blocks;
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].language, "text");
        assert_eq!(blocks[0].code, "plain");
        assert_eq!(blocks[1].language, "rust");
        assert_eq!(blocks[1].code, "fn main() {}");
    }

    #[test]
    fn duplicate_titles_keep_highest_priority() {
        let doc = "1. [Same](a)\nlow\n\n2. [Same](b) {priority: 2}\nhigh\n";
        let entries = parse_partition(doc, Partition::Text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].url, "b");
        assert_eq!(entries[0].content, "high");
    }

    #[test]
    fn empty_document_has_no_entries() {
        assert!(parse_partition("", Partition::Code).is_empty());
        assert!(parse_partition("# Only a heading\n\nprose", Partition::Code).is_empty());
    }
}

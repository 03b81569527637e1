//! Markdown rendering of ranked matches.

use crate::models::{AssembledResponse, ImageRef, Intent, Partition, ResponseContent, ScoredMatch};

pub const GREETING_TEMPLATE: &str = "Hello! I'm Wayne-AI. How can I assist you today?";
pub const ERROR_TEMPLATE: &str = "An error occurred while processing your request.";
pub const NOT_FOUND_MESSAGE: &str = "I'm not sure about that. Could you rephrase?";

const SHORT_QUERY_HINT: &str = "Your question is quite short; a few more words help me find the right entry.";
const SHORT_QUERY_CHARS: usize = 5;
const SUGGESTION_COUNT: usize = 3;

pub const MIN_SUMMARY_CHARS: usize = 80;
pub const MAX_SUMMARY_CHARS: usize = 150;

const SUGGESTIONS: &[(Partition, &str)] = &[
    (
        Partition::Code,
        "Ask for a code example, like \"show me a Python function\"",
    ),
    (Partition::Code, "Mention the programming language you are using"),
    (
        Partition::Image,
        "Describe the picture or graphic you are looking for",
    ),
    (Partition::Image, "Ask for a photo by its subject"),
    (Partition::Text, "Ask what a word or phrase means"),
    (Partition::Text, "Ask me to define a specific term"),
];

/// Suggestions for a failed lookup, those of `primary` first.
pub fn suggestions(primary: Partition) -> Vec<&'static str> {
    let preferred = SUGGESTIONS.iter().filter(|(p, _)| *p == primary);
    let others = SUGGESTIONS.iter().filter(|(p, _)| *p != primary);
    preferred
        .chain(others)
        .map(|(_, text)| *text)
        .take(SUGGESTION_COUNT)
        .collect()
}

/// Turns ranked matches into a markdown reply.
#[derive(Debug, Clone, Copy)]
pub struct ResponseAssembler {
    summary_chars: usize,
}

impl ResponseAssembler {
    /// `summary_chars` is clamped to 80..=150.
    pub fn new(summary_chars: usize) -> Self {
        Self {
            summary_chars: summary_chars.clamp(MIN_SUMMARY_CHARS, MAX_SUMMARY_CHARS),
        }
    }

    pub fn summary_chars(&self) -> usize {
        self.summary_chars
    }

    pub fn assemble(&self, matches: &[ScoredMatch], intent: &Intent<'_>) -> AssembledResponse {
        match matches {
            [] => not_found(intent),
            [single] => single_match(single),
            many => self.summarize(many),
        }
    }

    pub fn greeting(&self) -> AssembledResponse {
        text_only(GREETING_TEMPLATE.to_string())
    }

    pub fn error(&self) -> AssembledResponse {
        text_only(ERROR_TEMPLATE.to_string())
    }

    fn summarize(&self, matches: &[ScoredMatch]) -> AssembledResponse {
        let mut out = format!("I found {} entries that may help:\n\n", matches.len());
        for matched in matches {
            let summary = snippet(&matched.entry.content, self.summary_chars);
            if summary.is_empty() {
                out.push_str(&format!("- **{}**\n", matched.entry.title));
            } else {
                out.push_str(&format!("- **{}**: {}\n", matched.entry.title, summary));
            }
        }
        out.push_str("\nTell me which one you mean, or ask a more specific question to narrow it down.");
        text_only(out)
    }
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new(120)
    }
}

fn text_only(content: String) -> AssembledResponse {
    AssembledResponse {
        content,
        attachment: ResponseContent::TextOnly,
    }
}

fn not_found(intent: &Intent<'_>) -> AssembledResponse {
    let mut out = String::new();
    if intent.query.chars().count() < SHORT_QUERY_CHARS {
        out.push_str(SHORT_QUERY_HINT);
        out.push_str("\n\n");
    }
    out.push_str(NOT_FOUND_MESSAGE);

    if let Some(previous) = intent.previous_query.map(str::trim)
        && !previous.is_empty()
        && !previous.eq_ignore_ascii_case(intent.query.trim())
    {
        out.push_str(&format!(
            "\n\nEarlier you asked \"{}\". You can build on that question too.",
            previous
        ));
    }

    out.push_str("\n\nYou could try:\n");
    for suggestion in suggestions(intent.route.primary) {
        out.push_str(&format!("- {}\n", suggestion));
    }
    text_only(out.trim_end().to_string())
}

fn single_match(matched: &ScoredMatch) -> AssembledResponse {
    let entry = &matched.entry;
    let mut out = format!("### {}\n", entry.title);
    if !entry.content.trim().is_empty() {
        out.push_str(&format!("\n{}\n", entry.content.trim()));
    }

    let attachment = match entry.partition {
        Partition::Code => match entry.first_code_block() {
            Some(block) => {
                out.push_str(&format!("\n{}\n", block.to_markdown()));
                ResponseContent::WithCode(block.clone())
            }
            None => ResponseContent::TextOnly,
        },
        Partition::Image if !entry.url.trim().is_empty() => ResponseContent::WithImage(ImageRef {
            title: entry.title.clone(),
            url: entry.url.clone(),
        }),
        Partition::Image | Partition::Text => ResponseContent::TextOnly,
    };

    if !entry.url.trim().is_empty() {
        out.push_str(&format!("\nSource: [{}]({})\n", entry.title, entry.url));
    }

    AssembledResponse {
        content: out.trim_end().to_string(),
        attachment,
    }
}

/// First `max_chars` characters of `text` on one line, with `…` when cut.
fn snippet(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}…", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{KnowledgeEntry, QueryRoute};
    use wayne_core::CodeBlock;

    fn route(primary: Partition) -> QueryRoute {
        QueryRoute {
            primary,
            secondary: Vec::new(),
            general: false,
        }
    }

    fn matched(partition: Partition, title: &str, content: &str) -> ScoredMatch {
        let mut entry = KnowledgeEntry::new(partition, title);
        entry.content = content.to_string();
        ScoredMatch { entry, score: 1.0 }
    }

    #[test]
    fn suggestions_put_primary_partition_first() {
        let picked = suggestions(Partition::Image);
        assert_eq!(picked.len(), 3);
        assert_eq!(picked[0], "Describe the picture or graphic you are looking for");
        assert_eq!(picked[2], "Ask for a code example, like \"show me a Python function\"");
    }

    #[test]
    fn not_found_with_short_query_and_previous_question() {
        let route = route(Partition::Text);
        let intent = Intent {
            route: &route,
            query: "yo",
            previous_query: Some("what does serendipity mean"),
        };
        let response = ResponseAssembler::default().assemble(&[], &intent);
        assert_eq!(response.attachment, ResponseContent::TextOnly);
        insta::assert_snapshot!(response.content, @r#"
        Your question is quite short; a few more words help me find the right entry.

        I'm not sure about that. Could you rephrase?

        Earlier you asked "what does serendipity mean". You can build on that question too.

        You could try:
        - Ask what a word or phrase means
        - Ask me to define a specific term
        - Ask for a code example, like "show me a Python function"
        "#);
    }

    #[test]
    fn single_code_match_attaches_first_block() {
        let mut code = matched(Partition::Code, "Python functions", "Use the def keyword.");
        code.entry.url = "https://docs.python.org/3/tutorial".into();
        code.entry.code_blocks = vec![
            CodeBlock::new("python", "def greet(name):\n    return name\n"),
            CodeBlock::new("text", "unused"),
        ];
        let route = route(Partition::Code);
        let intent = Intent {
            route: &route,
            query: "python function",
            previous_query: None,
        };

        let response = ResponseAssembler::default().assemble(&[code], &intent);
        assert_eq!(
            response.attachment.code().map(|c| c.language.as_str()),
            Some("python")
        );
        insta::assert_snapshot!(response.content, @r"
        ### Python functions

        Use the def keyword.

        ```python
        def greet(name):
            return name
        ```

        Source: [Python functions](https://docs.python.org/3/tutorial)
        ");
    }

    #[test]
    fn single_image_match_attaches_reference() {
        let mut image = matched(Partition::Image, "Sunset", "");
        image.entry.url = "https://example.org/sunset.png".into();
        let route = route(Partition::Image);
        let intent = Intent {
            route: &route,
            query: "sunset photo",
            previous_query: None,
        };

        let response = ResponseAssembler::default().assemble(&[image], &intent);
        assert_eq!(
            response.attachment.image().map(|i| i.url.as_str()),
            Some("https://example.org/sunset.png")
        );
        assert!(response.content.starts_with("### Sunset\n"));
    }

    #[test]
    fn text_match_never_attaches_code() {
        let mut text = matched(Partition::Text, "Lexicon", "A word list.");
        text.entry.code_blocks = vec![CodeBlock::new("text", "ignored")];
        let route = route(Partition::Text);
        let intent = Intent {
            route: &route,
            query: "lexicon",
            previous_query: None,
        };
        let response = ResponseAssembler::default().assemble(&[text], &intent);
        assert_eq!(response.attachment, ResponseContent::TextOnly);
        assert!(!response.content.contains("```"));
    }

    #[test]
    fn many_matches_are_summarized() {
        let long = "word ".repeat(60);
        let matches = vec![
            matched(Partition::Text, "Short", "Brief  description\nacross lines."),
            matched(Partition::Text, "Long", &long),
            matched(Partition::Text, "Empty", ""),
        ];
        let route = route(Partition::Text);
        let intent = Intent {
            route: &route,
            query: "word",
            previous_query: None,
        };

        let assembler = ResponseAssembler::new(80);
        let response = assembler.assemble(&matches, &intent);
        let long_line = response
            .content
            .lines()
            .find(|line| line.starts_with("- **Long**"))
            .unwrap();
        let summary = long_line.trim_start_matches("- **Long**: ");
        assert!(summary.ends_with('…'));
        assert!(summary.chars().count() <= 81);

        assert!(response.content.starts_with("I found 3 entries that may help:"));
        assert!(response.content.contains("- **Short**: Brief description across lines.\n"));
        assert!(response.content.contains("- **Empty**\n"));
        assert!(response.content.ends_with("narrow it down."));
    }

    #[test]
    fn summary_chars_are_clamped() {
        assert_eq!(ResponseAssembler::new(10).summary_chars(), 80);
        assert_eq!(ResponseAssembler::new(500).summary_chars(), 150);
        assert_eq!(ResponseAssembler::default().summary_chars(), 120);
    }

    #[test]
    fn snippet_respects_char_boundaries() {
        let text = "é".repeat(200);
        let cut = snippet(&text, 100);
        assert_eq!(cut.chars().count(), 101);
        assert_eq!(snippet("tiny", 100), "tiny");
    }

    #[test]
    fn templates() {
        let assembler = ResponseAssembler::default();
        assert_eq!(assembler.greeting().content, GREETING_TEMPLATE);
        assert_eq!(assembler.error().attachment, ResponseContent::TextOnly);
    }
}

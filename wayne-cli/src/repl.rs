use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use wayne_knowledge::{Conversation, CoreResponse, KnowledgeStore, ResponseContent};

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Stats,
    Reload,
    Clear,
    History,
    ToggleJson,
    Help,
    Quit,
    Unknown(String),
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(name) = line.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };
        match name.trim().to_lowercase().as_str() {
            "stats" => Self::Stats,
            "reload" => Self::Reload,
            "clear" => Self::Clear,
            "history" => Self::History,
            "json" => Self::ToggleJson,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            other => Self::Unknown(other.to_string()),
        }
    }
}

const HELP: &str = "Commands: /stats /reload /clear /history /json /help /quit";

pub struct Repl {
    conversation: Conversation,
    store: KnowledgeStore,
    json: bool,
}

impl Repl {
    pub fn new(conversation: Conversation, store: KnowledgeStore) -> Self {
        Self {
            conversation,
            store,
            json: false,
        }
    }

    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        println!("Wayne AI ready. {}", HELP);
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            if !self.handle(Command::parse(&line)).await? {
                break;
            }
        }
        info!("Chat session ended");
        Ok(())
    }

    /// Returns `false` once the session should end.
    async fn handle(&mut self, command: Command) -> Result<bool, Box<dyn std::error::Error>> {
        match command {
            Command::Empty => {}
            Command::Ask(text) => {
                let response = self.conversation.ask(&text);
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                } else {
                    println!("{}", render(&response));
                }
            }
            Command::Stats => {
                let stats = self.store.stats();
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                } else {
                    let updated = stats
                        .last_updated
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string());
                    println!(
                        "text: {}, image: {}, code: {}, cached queries: {}, last updated: {}",
                        stats.text, stats.image, stats.code, stats.cache_size, updated
                    );
                }
            }
            Command::Reload => {
                let report = self.store.load_all().await;
                for (partition, err) in &report.failed {
                    warn!("Reload of {} failed: {}", partition, err);
                }
                println!(
                    "Reloaded {} entries ({} partitions failed)",
                    report.total_entries(),
                    report.failed.len()
                );
            }
            Command::Clear => {
                self.conversation.clear();
                println!("Conversation cleared");
            }
            Command::History => {
                let history = self.conversation.history();
                if history.is_empty() {
                    println!("(no messages yet)");
                }
                for message in history {
                    println!("[{}] {}", message.role, message.text);
                }
            }
            Command::ToggleJson => {
                self.json = !self.json;
                println!("JSON output {}", if self.json { "on" } else { "off" });
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => return Ok(false),
            Command::Unknown(name) => println!("Unknown command /{}. {}", name, HELP),
        }
        Ok(true)
    }
}

fn render(response: &CoreResponse) -> String {
    match &response.attachment {
        ResponseContent::WithImage(image) => {
            format!("{}\n\n[image: {}]", response.content, image.url)
        }
        ResponseContent::TextOnly | ResponseContent::WithCode(_) => response.content.clone(),
    }
}

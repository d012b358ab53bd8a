//! Command-line interface: run the API server or chat in the terminal.

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::agent::AgentSystem;
use crate::error::AgentsError;
use crate::types::{ModelMessage, Role};

/// Celo multi-agent assistant
#[derive(Parser, Debug)]
#[command(name = "celo-agents", version, about = "Multi-agent assistant for the Celo blockchain and web search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP chat API
    Serve(ServeArgs),
    /// Chat with the agents in the terminal
    Chat(ChatArgs),
}

/// Arguments for `celo-agents serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, env = "API_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "API_PORT")]
    pub port: Option<u16>,
}

/// Arguments for `celo-agents chat`.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model to use (format: provider:model, e.g., google:gemini-2.5-flash)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Continue an existing thread id instead of generating one
    #[arg(long)]
    pub thread_id: Option<String>,
}

impl Cli {
    /// Parse CLI arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[1;32m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[1;34m";
const RESET: &str = "\x1b[0m";

/// Render one message for the terminal, or `None` when there is nothing to show.
pub fn format_message(message: &ModelMessage) -> Option<String> {
    let (color, label, content) = match message.role {
        Role::User => (BOLD, "User".to_string(), message.text()),
        Role::Assistant => {
            let text = message.text();
            if text.is_empty() {
                return None;
            }
            let label = match &message.name {
                Some(name) => format!("Assistant ({name})"),
                None => "Assistant".to_string(),
            };
            (GREEN, label, text)
        }
        Role::System => (YELLOW, "System".to_string(), message.text()),
        Role::Tool => {
            let content = message
                .tool_results()
                .iter()
                .map(|r| crate::provider::format::tool_result_to_string(&r.result))
                .collect::<Vec<_>>()
                .join("\n");
            if content.is_empty() {
                return None;
            }
            (BLUE, "Tool Output".to_string(), content)
        }
    };
    Some(format!("\n{color}> {label}:{RESET} {content}"))
}

fn system_line(text: &str) {
    println!("{YELLOW}> System:{RESET} {text}");
}

/// Interactive loop on one thread. `exit`, `quit` or `q` leaves.
pub async fn run_chat(system: Arc<dyn AgentSystem>, thread_id: String) -> Result<(), AgentsError> {
    system_line(&format!("Created conversation thread: {thread_id}"));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut messages: Vec<ModelMessage> = Vec::new();

    loop {
        print!("\n{BOLD}> Enter your question (or 'exit' to quit):{RESET} ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if matches!(input.to_lowercase().as_str(), "exit" | "quit" | "q") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        let mut request = messages.clone();
        request.push(ModelMessage::user(input));
        let seen = request.len();

        system_line("Processing your request...");
        messages = system.invoke(request, &thread_id).await?;

        for message in messages.iter().skip(seen) {
            if let Some(rendered) = format_message(message) {
                println!("{rendered}");
            }
        }
    }

    println!();
    system_line("Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_serve_with_overrides() {
        let cli = Cli::try_parse_from(["celo-agents", "serve", "--host", "0.0.0.0", "-p", "8080"])
            .unwrap();
        match cli.command {
            Commands::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
                assert_eq!(args.port, Some(8080));
            }
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn parse_chat_with_model() {
        let cli = Cli::try_parse_from(["celo-agents", "chat", "-m", "google:gemini-2.0-flash"])
            .unwrap();
        match cli.command {
            Commands::Chat(args) => {
                assert_eq!(args.model.as_deref(), Some("google:gemini-2.0-flash"));
                assert!(args.thread_id.is_none());
            }
            other => panic!("expected Chat, got {other:?}"),
        }
    }

    #[test]
    fn parse_missing_subcommand_is_error() {
        assert!(Cli::try_parse_from(["celo-agents"]).is_err());
    }

    #[test]
    fn format_message_labels_agents() {
        let msg = ModelMessage::assistant("42").with_name("blockchain_expert");
        let rendered = format_message(&msg).unwrap();
        assert!(rendered.contains("Assistant (blockchain_expert):"));
        assert!(rendered.ends_with(" 42"));
        assert!(format_message(&ModelMessage::assistant("")).is_none());
    }
}

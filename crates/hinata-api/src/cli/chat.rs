//! Interactive `hinata chat` loop.
//!
//! Reads one message per line from stdin and prints each reply. Ends on EOF,
//! `/exit`, or Ctrl+C.

use anyhow::Result;
use console::style;
use tokio::io::{AsyncBufReadExt, BufReader};

use hinata_core::chat::engine::ReplySource;
use hinata_types::conversation::ConversationId;

use crate::cli::Output;
use crate::state::AppState;

pub async fn run_chat(state: &AppState, conversation: &str, output: Output) -> Result<()> {
    let conversation_id = ConversationId::from(conversation);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let json = output.is_json();

    if output.decorated() {
        println!();
        println!(
            "  {} Chatting as conversation {}. Type {} to leave.",
            style("🌸").magenta(),
            style(conversation_id.as_str()).cyan(),
            style("/exit").yellow()
        );
        if state.engine.chain().is_empty() {
            println!(
                "  {} No provider credentials configured. Set {}.",
                style("!").yellow().bold(),
                style("GROQ_API_KEY").cyan()
            );
        }
        if !state.engine.store().is_enabled() {
            println!("  {} Conversation memory is off.", style("i").blue().bold());
        }
        println!();
    }

    loop {
        if output.decorated() {
            print_prompt();
        }

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("Chat interrupted");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text == "/exit" || text == "/quit" {
            break;
        }

        let reply = state.engine.respond(&conversation_id, text).await;

        if json {
            println!("{}", serde_json::to_string(&reply)?);
            continue;
        }

        let name = match &reply.source {
            ReplySource::Generated { .. } => style("Hinata").magenta().bold(),
            ReplySource::Fallback | ReplySource::MissingCredentials => {
                style("Hinata").yellow().bold()
            }
        };
        println!("{}: {}", name, reply.text);
        println!();
    }

    if output.decorated() {
        println!("  {} Bye-bye!", style("🌸").magenta());
    }
    Ok(())
}

fn print_prompt() {
    use std::io::Write;

    print!("{} ", style("you>").cyan().bold());
    let _ = std::io::stdout().flush();
}

//! One-shot `hinata ask` command.

use anyhow::Result;
use console::style;

use hinata_types::conversation::ConversationId;

use crate::cli::Output;
use crate::state::AppState;

/// Send one message and print the reply.
///
/// Always succeeds from the user's point of view: a failed chain still
/// yields the in-persona apology.
pub async fn ask(state: &AppState, conversation: &str, text: &str, output: Output) -> Result<()> {
    let conversation_id = ConversationId::from(conversation);
    let reply = state.engine.respond(&conversation_id, text).await;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    if reply.is_generated() {
        println!("{}", reply.text);
    } else {
        println!("{}", style(&reply.text).yellow());
    }
    Ok(())
}

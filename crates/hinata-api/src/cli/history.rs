//! `hinata history` command.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use hinata_types::conversation::{ConversationId, TurnRole};

use crate::cli::Output;
use crate::state::AppState;

/// Show the last `limit` turns of a conversation, oldest first.
pub async fn show_history(
    state: &AppState,
    conversation: &str,
    limit: usize,
    output: Output,
) -> Result<()> {
    let store = state.engine.store();
    if !store.is_enabled() {
        if output.is_json() {
            println!("[]");
        } else if output.decorated() {
            println!();
            println!(
                "  {} Conversation memory is off (store = {}).",
                style("i").blue().bold(),
                style(state.config.store).cyan()
            );
            println!();
        }
        return Ok(());
    }

    let conversation_id = ConversationId::from(conversation);
    let turns = store.recent(&conversation_id, limit).await;

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&turns)?);
        return Ok(());
    }

    if turns.is_empty() {
        if !output.decorated() {
            return Ok(());
        }
        println!();
        println!(
            "  {} No turns recorded for conversation '{}'.",
            style("i").blue().bold(),
            style(conversation_id.as_str()).cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Time").fg(Color::White),
        Cell::new("Role").fg(Color::White),
        Cell::new("Text").fg(Color::White),
    ]);

    for turn in &turns {
        let role_color = match turn.role {
            TurnRole::User => Color::Cyan,
            TurnRole::Assistant => Color::Magenta,
        };
        table.add_row(vec![
            Cell::new(turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()),
            Cell::new(turn.role.to_string()).fg(role_color),
            Cell::new(&turn.text),
        ]);
    }

    if !output.decorated() {
        println!("{table}");
        return Ok(());
    }

    let total = store
        .count(&conversation_id)
        .await
        .unwrap_or(turns.len() as u64);
    println!();
    println!("{table}");
    println!(
        "  {} of {} turn(s) in {}",
        style(turns.len()).bold(),
        style(total).bold(),
        style(state.store_location()).dim()
    );
    println!();
    Ok(())
}

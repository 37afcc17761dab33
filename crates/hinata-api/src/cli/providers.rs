//! `hinata providers` command: show the fallback order, optionally checking
//! each attempt.
//!
//! Credentials are never printed; attempts are identified by their 1-based
//! credential slot.

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use serde::Serialize;

use hinata_infra::llm::test_provider_connection;

use crate::cli::Output;
use crate::state::AppState;

#[derive(Serialize)]
struct AttemptRow {
    position: usize,
    provider: String,
    model: String,
    credential_slot: usize,
    timeout_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    check: Option<CheckResult>,
}

#[derive(Serialize)]
struct CheckResult {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn list_providers(state: &AppState, check: bool, output: Output) -> Result<()> {
    let chain = state.engine.chain();

    let mut rows = Vec::with_capacity(chain.len());
    for (i, attempt) in chain.attempts().iter().enumerate() {
        let check = if check {
            let result = test_provider_connection(attempt).await;
            Some(CheckResult {
                ok: result.is_ok(),
                error: result.err().map(|e| e.to_string()),
            })
        } else {
            None
        };
        rows.push(AttemptRow {
            position: i + 1,
            provider: attempt.provider_name.clone(),
            model: attempt.model.clone(),
            credential_slot: attempt.credential_slot,
            timeout_ms: attempt.timeout.as_millis(),
            check,
        });
    }

    if output.is_json() {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        if !output.decorated() {
            return Ok(());
        }
        println!();
        println!(
            "  {} No provider attempts configured. Set {} (and optionally {}).",
            style("i").blue().bold(),
            style("GROQ_API_KEY").cyan(),
            style("GEMINI_API_KEY").cyan()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    let mut header = vec![
        Cell::new("#").fg(Color::White),
        Cell::new("Provider").fg(Color::White),
        Cell::new("Model").fg(Color::White),
        Cell::new("Key").fg(Color::White),
        Cell::new("Timeout").fg(Color::White),
    ];
    if check {
        header.push(Cell::new("Check").fg(Color::White));
    }
    table.set_header(header);

    for row in &rows {
        let mut cells = vec![
            Cell::new(row.position),
            Cell::new(&row.provider).fg(Color::Cyan),
            Cell::new(&row.model),
            Cell::new(format!("#{}", row.credential_slot)),
            Cell::new(format!("{}ms", row.timeout_ms)),
        ];
        if let Some(result) = &row.check {
            cells.push(match &result.error {
                None => Cell::new("ok").fg(Color::Green),
                Some(e) => Cell::new(e).fg(Color::Red),
            });
        }
        table.add_row(cells);
    }

    if output.decorated() {
        println!();
    }
    println!("{table}");
    if output.decorated() {
        println!();
    }
    Ok(())
}

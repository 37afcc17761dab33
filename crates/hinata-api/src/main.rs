//! Hinata command-line entry point.
//!
//! Binary name: `hinata`
//!
//! Parses CLI arguments, loads configuration, opens the conversation store,
//! builds the provider chain, then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use hinata_observe::tracing_setup::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,hinata=debug",
        _ => "trace",
    };

    let options = TracingOptions {
        json: cli.log_json,
        enable_otel: cli.otel,
        ..TracingOptions::new(filter)
    };
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "hinata", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    let output = cli.output();
    let result = match cli.command {
        Commands::Chat { conversation } => {
            cli::chat::run_chat(&state, &conversation, output).await
        }
        Commands::Ask { conversation, text } => {
            cli::ask::ask(&state, &conversation, &text.join(" "), output).await
        }
        Commands::History {
            conversation,
            limit,
        } => cli::history::show_history(&state, &conversation, limit, output).await,
        Commands::Providers { check } => {
            cli::providers::list_providers(&state, check, output).await
        }
        Commands::Completions { .. } => Ok(()),
    };

    state.shutdown().await;
    shutdown_tracing();
    result
}

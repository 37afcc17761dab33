//! CLI command definitions for the `hinata` binary.

pub mod ask;
pub mod chat;
pub mod history;
pub mod providers;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Chat with Hinata from the terminal.
#[derive(Parser)]
#[command(name = "hinata", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Print only results and errors: no banners, hints or footers.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Write log lines as JSON.
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// How handlers render their results. `--json` wins over `--quiet`.
    pub fn output(&self) -> Output {
        if self.json {
            Output::Json
        } else if self.quiet {
            Output::Quiet
        } else {
            Output::Styled
        }
    }
}

/// Rendering mode shared by every command handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    /// Tables and replies with banners, hints and footers.
    Styled,
    /// Tables and replies only.
    Quiet,
    /// Machine-readable JSON on stdout.
    Json,
}

impl Output {
    pub fn is_json(self) -> bool {
        self == Output::Json
    }

    /// Whether decoration around the results should be printed.
    pub fn decorated(self) -> bool {
        self == Output::Styled
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat session on stdin.
    Chat {
        /// Conversation id; turns are remembered per id.
        #[arg(long, short, default_value = "local")]
        conversation: String,
    },

    /// Send a single message and print the reply.
    Ask {
        /// Conversation id; turns are remembered per id.
        #[arg(long, short, default_value = "local")]
        conversation: String,

        /// Message text.
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Show the most recent turns of a conversation.
    History {
        /// Conversation id.
        #[arg(long, short, default_value = "local")]
        conversation: String,

        /// Number of turns to show.
        #[arg(long, short, default_value = "20")]
        limit: usize,
    },

    /// List the provider attempts in fallback order.
    Providers {
        /// Send a tiny request through each attempt.
        #[arg(long)]
        check: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

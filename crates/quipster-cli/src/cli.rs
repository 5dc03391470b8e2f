//! CLI argument definitions for Quipster.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Quipster -- a roast-comedian Discord bot backed by hosted LLMs.
#[derive(Parser)]
#[command(
    name = "quipster",
    version,
    about = "Quipster -- roast-comedian Discord bot",
    long_about = "A Discord bot that answers /ask and @mentions with model-generated replies, \
                  falling back across several hosted models when one is unavailable."
)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, short, global = true, default_value = "config/default.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to Discord and serve the health endpoint.
    Bot,

    /// Serve only the health and probe endpoints.
    Serve {
        /// Address to bind the HTTP server to.
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on.
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Produce one reply through the full pipeline and print it.
    Ask {
        /// Conversation scope used for the cooldown gate.
        #[arg(long, default_value = "cli")]
        scope: String,

        /// The text to send.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Send a tiny request to the primary model and print the report.
    Probe,
}

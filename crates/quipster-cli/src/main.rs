//! CLI entry point for Quipster.
//!
//! This binary provides the `quipster` command with subcommands for running
//! the Discord bot, serving the health endpoints on their own, and exercising
//! the reply pipeline from a terminal.

mod bot;
mod cli;
mod helpers;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use quipster_agent::Scope;
use quipster_web::WebServer;

use crate::cli::{Cli, Commands};
use crate::helpers::init_tracing;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing("info");

    let settings = Settings::load(&cli.config)?;

    match cli.command {
        Commands::Bot => bot::cmd_bot(settings).await,
        Commands::Serve { bind, port } => cmd_serve(settings, bind, port).await,
        Commands::Ask { scope, text } => cmd_ask(settings, scope, text.join(" ")).await,
        Commands::Probe => cmd_probe(settings).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommand: serve
// ---------------------------------------------------------------------------

async fn cmd_serve(mut settings: Settings, bind: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(bind) = bind {
        settings.web.bind = bind;
    }
    if let Some(port) = port {
        settings.web.port = port;
    }
    settings.validate(false)?;

    let client = settings.build_client()?;
    let server = WebServer::new(settings.web_config(), client);
    info!(addr = %server.addr(), "serving health endpoints");
    server
        .start()
        .await
        .with_context(|| format!("web server failed on {}:{}", settings.web.bind, settings.web.port))
}

// ---------------------------------------------------------------------------
// Subcommand: ask
// ---------------------------------------------------------------------------

async fn cmd_ask(settings: Settings, scope: String, text: String) -> Result<()> {
    settings.validate(false)?;

    let client = settings.build_client()?;
    let orchestrator = settings.build_orchestrator(client)?;
    let reply = orchestrator.reply(&Scope::from(scope), &text).await;
    println!("{reply}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Subcommand: probe
// ---------------------------------------------------------------------------

async fn cmd_probe(settings: Settings) -> Result<()> {
    settings.validate(false)?;

    let client = settings.build_client()?;
    let report = client.probe().await.context("probe request failed")?;
    println!("{}", report.to_pretty_json()?);
    Ok(())
}

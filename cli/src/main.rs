//! Switchboard — diagnostic CLI for the MCP connection orchestrator.
//!
//! Two subcommands:
//! - `switchboard check`: fetch the server catalog, auto-connect to every
//!   server, and print per-server status, diagnostics, and tool counts
//! - `switchboard tools`: probe a single server (optionally with a token)
//!   and list its tool catalog

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use switchboard::{
    ConnectionOrchestrator, ConnectionStatus, GatewayClient, McpServer, SwitchboardConfig,
};
use tracing_subscriber::EnvFilter;

/// Switchboard — diagnostic CLI for the MCP connection orchestrator.
#[derive(Parser)]
#[command(
    name = "switchboard",
    version,
    about = "Probe MCP servers, inspect tool catalogs, and preview request payloads"
)]
struct Cli {
    /// Path to switchboard.toml [default: ./switchboard.toml or ~/.config/switchboard/switchboard.toml]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Auto-connect to every cataloged server and report statuses
    Check,
    /// Probe one server and list its tools
    Tools {
        /// Connection URL of the server to probe
        #[arg(long)]
        server: String,
        /// Bearer token to authenticate with (overrides any configured seed)
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity; diagnostics go to stderr, output to stdout
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(resolve_config(cli.config)?)?;
    config.validate()?;

    let gateway = Arc::new(GatewayClient::new(&config.gateway)?);
    let orchestrator = Arc::new(ConnectionOrchestrator::new(gateway.clone(), gateway.clone()));
    orchestrator.seed_tokens(config.resolved_tokens()).await;

    // Ctrl-C abandons in-flight probes instead of hanging the run
    let orch_for_signal = Arc::clone(&orchestrator);
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("interrupted, shutting down");
        orch_for_signal.shutdown();
    });

    match cli.command {
        Commands::Check => run_check(&gateway, &orchestrator).await,
        Commands::Tools { server, token } => {
            run_tools(&orchestrator, &server, token.as_deref()).await
        }
    }
}

/// Fetch the catalog, auto-connect everywhere, print one line per server,
/// then preview the request payload that would be submitted.
async fn run_check(gateway: &GatewayClient, orchestrator: &ConnectionOrchestrator) -> Result<()> {
    let servers = gateway.list_servers().await?;
    if servers.is_empty() {
        println!("no MCP servers in the gateway catalog");
        return Ok(());
    }

    orchestrator.auto_connect(&servers).await;

    for server in &servers {
        let snapshot = orchestrator.status(&server.id).await;
        let (status, message) = match &snapshot {
            Some(snap) => (format!("{:?}", snap.status), snap.message.clone()),
            None => ("Unknown".to_string(), "not probed".to_string()),
        };
        let (enabled, total) = orchestrator.selection_summary(&server.id).await;
        println!(
            "{:40} {:13} {} [{} of {} tools selected]",
            server.name, status, message, enabled, total
        );
    }

    let selected: Vec<String> = servers.iter().map(|s| s.id.clone()).collect();
    let report = orchestrator.build_payloads(&selected, &servers).await;
    println!(
        "\nrequest payload: {} server(s) included, {} excluded",
        report.payloads.len(),
        report.excluded
    );

    Ok(())
}

/// Probe a single server and list its tool catalog.
async fn run_tools(
    orchestrator: &ConnectionOrchestrator,
    server_url: &str,
    token: Option<&str>,
) -> Result<()> {
    let server = McpServer::new(server_url, server_url);
    let outcome = orchestrator.connect(&server, token).await;

    println!("{server_url}: {}", outcome.diagnostic);
    if outcome.status != ConnectionStatus::Connected {
        anyhow::bail!("server did not connect");
    }
    if let Some(err) = outcome.tool_fetch_error {
        anyhow::bail!("connected, but tool listing failed: {err}");
    }

    for tool in orchestrator.tools(&server.id).await {
        let marker = if tool.enabled { "x" } else { " " };
        println!("  [{marker}] {:32} {}", tool.name, tool.description);
    }
    Ok(())
}

/// Resolve config file path: explicit flag → ./switchboard.toml →
/// ~/.config/switchboard/switchboard.toml.
fn resolve_config(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    let local = Path::new("switchboard.toml");
    if local.exists() {
        return Ok(local.to_path_buf());
    }

    if let Some(config_dir) = dirs::config_dir() {
        let xdg = config_dir.join("switchboard").join("switchboard.toml");
        if xdg.exists() {
            return Ok(xdg);
        }
    }

    Err(anyhow::anyhow!(
        "No switchboard.toml found. Searched ./switchboard.toml and \
         ~/.config/switchboard/switchboard.toml. Use --config to specify a path."
    ))
}

/// Load and parse a switchboard.toml config file.
fn load_config(path: PathBuf) -> Result<SwitchboardConfig> {
    Ok(SwitchboardConfig::from_toml_file(path)?)
}

//! AirScan CLI - scan documents from eSCL (AirScan) network scanners
//!
//! This binary can:
//! - Show what a scanner supports
//! - Show the scanner state and its job list
//! - Run a flatbed scan and save the resulting document

mod scan;

use airscan_core::client::config;
use airscan_core::client::load_client_config;
use airscan_core::ScanClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "airscan")]
#[command(version)]
#[command(about = "Scan documents from eSCL (AirScan) network scanners")]
#[command(long_about = "
AirScan talks to network scanners over the eSCL protocol used by
AirPrint-capable devices.

Quick start:
  1. See what it supports:  airscan --host 192.168.1.11 capabilities
  2. Scan the platen:       airscan --host 192.168.1.11 scan -o page.jpg

The scanner address can also come from AIRSCAN_HOST or the config file,
see: airscan config
")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Scanner address (overrides AIRSCAN_HOST and the config file)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Per-request timeout in seconds (default: wait indefinitely)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show supported color modes, resolutions, formats and scan area
    #[command(alias = "caps")]
    Capabilities,

    /// Show scanner state and jobs
    Status,

    /// Scan the whole platen and save the document
    Scan(scan::ScanArgs),

    /// Show configuration paths and settings
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("airscan={},airscan_core={}", log_level, log_level).into()),
        )
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Capabilities => cmd_capabilities(&cli),
        Commands::Status => cmd_status(&cli),
        Commands::Scan(args) => scan::run_scan(&cli, args),
        Commands::Config => cmd_config(&cli),
    }
}

/// Build a client from the config layers and command line overrides
pub(crate) fn connect(cli: &Cli, validate: bool) -> Result<ScanClient> {
    let mut config = load_client_config();
    if let Some(secs) = cli.timeout {
        config.timeout = Some(Duration::from_secs(secs));
    }
    if validate {
        config.validate_settings = true;
    }

    let host = cli
        .host
        .clone()
        .or_else(|| config.host.clone())
        .context("No scanner address. Pass --host, set AIRSCAN_HOST, or add host to the config file.")?;

    ScanClient::with_config(&host, config)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Failed to connect to scanner at {}", host))
}

fn cmd_capabilities(cli: &Cli) -> Result<()> {
    let client = connect(cli, false)?;
    let caps = client.capabilities();

    match cli.format {
        OutputFormat::Text => {
            println!("Scanner:     {}", caps.make_and_model().unwrap_or("-"));
            println!("eSCL:        {}", caps.version().unwrap_or("-"));
            println!("Color modes: {}", caps.color_modes().join(", "));
            println!("Formats:     {}", caps.document_formats().join(", "));
            let resolutions: Vec<String> = caps
                .resolutions()
                .iter()
                .map(|(x, y)| if x == y { x.to_string() } else { format!("{}x{}", x, y) })
                .collect();
            println!("Resolutions: {} dpi", resolutions.join(", "));
            let (min_w, min_h) = caps.min_size();
            let (max_w, max_h) = caps.max_size();
            println!("Min size:    {} x {} (1/300 in)", min_w, min_h);
            println!("Max size:    {} x {} (1/300 in)", max_w, max_h);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(caps)?);
        }
    }

    Ok(())
}

fn cmd_status(cli: &Cli) -> Result<()> {
    let client = connect(cli, false)?;
    let status = client.status().context("Failed to read scanner status")?;

    match cli.format {
        OutputFormat::Text => {
            println!("State: {}", status.state);
            if status.jobs.is_empty() {
                println!("No jobs.");
            } else {
                println!();
                for job in &status.jobs {
                    let age = match job.age() {
                        Ok(Some(a)) => format!("{}s", a),
                        _ => "-".to_string(),
                    };
                    let images = match job.images_to_transfer() {
                        Ok(Some(n)) => n.to_string(),
                        _ => "?".to_string(),
                    };
                    println!(
                        "  {:36} {:>6}  {} ({} to transfer)",
                        job.uuid,
                        age,
                        job.job_state.as_deref().unwrap_or("-"),
                        images
                    );
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}

fn cmd_config(cli: &Cli) -> Result<()> {
    let client_config = load_client_config();
    let config_path = config::get_config_file_path_string();
    let timeout = client_config
        .timeout
        .map(|t| format!("{}s", t.as_secs()))
        .unwrap_or_else(|| "none".to_string());

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration");
            println!("=============");
            println!();
            println!("Config file:      {}", config_path);
            println!(
                "Scanner host:     {} (from {})",
                client_config.host.as_deref().unwrap_or("-"),
                client_config.source
            );
            println!("Port:             {}", client_config.port);
            println!("Base path:        {}", client_config.base_path);
            println!("Timeout:          {}", timeout);
            println!("Validate:         {}", client_config.validate_settings);
            println!();
            println!("Environment variables:");
            println!("  AIRSCAN_HOST         - Scanner address");
            println!("  AIRSCAN_PORT         - eSCL port");
            println!("  AIRSCAN_TIMEOUT_SECS - Per-request timeout");
            println!();
            println!("Example config.toml:");
            println!();
            println!("{}", config::generate_example_config());
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "config_file": config_path,
                "host": client_config.host,
                "source": format!("{}", client_config.source),
                "port": client_config.port,
                "base_path": client_config.base_path,
                "timeout_secs": client_config.timeout.map(|t| t.as_secs()),
                "validate_settings": client_config.validate_settings,
            }));
        }
    }

    Ok(())
}

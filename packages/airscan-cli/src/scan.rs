//! Flatbed scan command
//!
//! Submits a whole-platen job, polls until the scanner has an image ready,
//! then downloads and saves it.

use crate::{connect, Cli, OutputFormat};
use airscan_core::ScanSettings;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

#[derive(Args)]
pub struct ScanArgs {
    /// Where to write the document (default: scan-<timestamp>.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resolution in DPI, used for both axes
    #[arg(short, long, default_value = "200")]
    pub resolution: u32,

    /// Color mode (default: first one the scanner lists)
    #[arg(long)]
    pub color_mode: Option<String>,

    /// Document format MIME type (default: first one the scanner lists)
    #[arg(long)]
    pub document_format: Option<String>,

    /// Delay between status polls in milliseconds
    #[arg(long, default_value = "500")]
    pub poll_interval_ms: u64,

    /// Check the settings against the scanner capabilities first
    #[arg(long)]
    pub validate: bool,
}

/// File extension for a document MIME type
fn extension_for(document_format: &str) -> &'static str {
    match document_format {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/tiff" => "tiff",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}

fn default_output_path(document_format: &str) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    PathBuf::from(format!("scan-{}.{}", stamp, extension_for(document_format)))
}

pub fn run_scan(cli: &Cli, args: &ScanArgs) -> Result<()> {
    let mut client = connect(cli, args.validate)?;

    let mut settings = ScanSettings::full_platen(client.capabilities(), args.resolution)?;
    if let Some(mode) = &args.color_mode {
        settings.color_mode = mode.clone();
    }
    if let Some(format) = &args.document_format {
        settings.document_format = format.clone();
    }

    let job_id = client
        .submit_scan(&settings)
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .context("Failed to submit scan job")?
        .id()
        .to_string();

    match cli.format {
        OutputFormat::Text => println!(
            "Scanning {} at {} dpi ({})...",
            settings.document_format, settings.x_resolution, settings.color_mode
        ),
        OutputFormat::Json => {}
    }
    tracing::debug!("Polling job {} every {}ms", job_id, args.poll_interval_ms);

    let started = Instant::now();
    let poll_interval = Duration::from_millis(args.poll_interval_ms);
    while !client.job_ended()? {
        let age = client.job_age()?;
        match cli.format {
            OutputFormat::Text => println!("  Job age: {}s", age),
            OutputFormat::Json => {}
        }
        thread::sleep(poll_interval);
    }

    let document = client
        .get_file()?
        .context("Scanner reported an image ready but returned no document")?;

    let path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&settings.document_format));
    std::fs::write(&path, &document)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    let elapsed = started.elapsed().as_secs_f64();
    match cli.format {
        OutputFormat::Text => {
            println!();
            println!("Saved {} bytes to {} ({:.1}s)", document.len(), path.display(), elapsed);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::json!({
                "job_id": job_id,
                "output": path.display().to_string(),
                "bytes": document.len(),
                "document_format": settings.document_format,
                "elapsed_secs": elapsed,
            }));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("application/pdf"), "pdf");
        assert_eq!(extension_for("application/octet-stream"), "bin");
    }

    #[test]
    fn test_default_output_path() {
        let path = default_output_path("image/png");
        let name = path.to_str().unwrap();
        assert!(name.starts_with("scan-"));
        assert!(name.ends_with(".png"));
    }
}

//! Run one redaction batch against a local object store.
//!
//! The batch trigger is a JSON array of `{"store_id": ..., "key": ...}`
//! objects, read from `--input` or stdin. Each store id is a directory under
//! `--root`. The batch report is written to stdout as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use scrub_batch::{BatchOrchestrator, BatchSettings, ConfigCache, FileReference, LocalStore};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Batch document redaction
#[derive(Parser, Debug)]
#[command(name = "scrub-batch")]
#[command(about = "Redact a batch of uploaded documents")]
struct Args {
    /// Root directory of the local object store
    #[arg(short, long, default_value = "./data")]
    root: PathBuf,

    /// Batch settings (TOML); defaults apply when omitted
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Batch trigger file (JSON array); reads stdin when omitted
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Pretty-print the report
    #[arg(long)]
    pretty: bool,
}

fn read_trigger(input: Option<&PathBuf>) -> Result<Vec<FileReference>> {
    let raw = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("reading trigger file {}", path.display()))?,
        None => {
            let mut raw = String::new();
            std::io::stdin()
                .read_to_string(&mut raw)
                .context("reading trigger from stdin")?;
            raw
        }
    };
    serde_json::from_str(&raw).context("trigger must be a JSON array of {store_id, key} objects")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let settings = match &args.settings {
        Some(path) => BatchSettings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => BatchSettings::default(),
    };
    let references = read_trigger(args.input.as_ref())?;

    info!(root = %args.root.display(), files = references.len(), "Starting batch");

    let store = Arc::new(LocalStore::new(&args.root));
    let orchestrator = BatchOrchestrator::new(store, settings, Arc::new(ConfigCache::new()));
    let report = orchestrator.run(references).await;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    if let Some(reason) = &report.aborted {
        anyhow::bail!("batch aborted: {reason}");
    }
    Ok(())
}

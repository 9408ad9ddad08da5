//! Print the canonical tracklist discotag would write for a Discogs release.
//!
//! Usage:
//!     discogs_tracklist <RELEASE> [--config FILE] [--json] [--verbose]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use discotag::sync::{format_record, SyncSession};
use discotag::{parse_discogs_url, Config, DiscogsClient, LabelUsage, NameExceptions};

#[derive(Parser)]
#[command(name = "discogs_tracklist")]
#[command(version)]
#[command(about = "Show the assembled tracklist of a Discogs release")]
struct Cli {
    /// Discogs release id or release URL
    release: String,

    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the records as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "discotag=debug,info" } else { "discotag=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(false)
        .without_time()
        .init();

    let release_id = parse_discogs_url(&cli.release)
        .with_context(|| format!("not a Discogs release id or URL: {:?}", cli.release))?;

    let config = Config::load(cli.config.as_deref())?;
    if cli.verbose {
        config.print("Config");
    }
    let exceptions = match &config.exceptions_file {
        Some(path) => NameExceptions::load(path)?,
        None => NameExceptions::new(),
    };

    let client = DiscogsClient::from_config(&config);
    let session = SyncSession::new(&client, config.assembler_options(), exceptions);
    let records = session.assemble_release(release_id, &LabelUsage::default())?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    if let Some(first) = records.first() {
        println!("{} - {}", first.album_artist, first.album);
        let year = first.year.map(|y| y.to_string()).unwrap_or_else(|| "?".to_string());
        println!("{} / {}", year, first.grouping.as_deref().unwrap_or("no label"));
        println!();
    }
    for (i, record) in records.iter().enumerate() {
        println!("{}", format_record(record, &(i + 1).to_string()));
    }
    Ok(())
}

//! Tag library tracks from a Discogs release.
//!
//! Fetches the release, matches it against the selected tracks of a JSON
//! library file, shows the pairing and writes the corrected fields back after
//! confirmation.
//!
//! Usage:
//!     discotag <RELEASE> --library tracks.json [--track ID]... [--yes]
//!     discotag --rescan --library tracks.json [--track ID]...

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use discotag::sync::{apply, group_by_release, SyncSession};
use discotag::{parse_discogs_url, Config, DiscogsClient, JsonLibrary, MediaLibrary, NameExceptions};

#[derive(Parser)]
#[command(name = "discotag")]
#[command(version)]
#[command(about = "Correct track metadata from a Discogs release")]
struct Cli {
    /// Discogs release id or release URL
    #[arg(required_unless_present = "rescan")]
    release: Option<String>,

    /// JSON track list to read and update
    #[arg(short, long)]
    library: PathBuf,

    /// Only consider these track ids (default: every track in the file)
    #[arg(short, long = "track")]
    tracks: Vec<String>,

    /// Resync tracks already tagged with a release id, grouped per release
    #[arg(long, conflicts_with = "release")]
    rescan: bool,

    /// Write without asking
    #[arg(short, long)]
    yes: bool,

    /// Config file (default: ./discotag.toml, then ~/.config/discotag/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "discotag=debug,info" } else { "discotag=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with_target(false)
        .without_time()
        .init();

    let config = Config::load(cli.config.as_deref()).context("loading config")?;
    let exceptions = match &config.exceptions_file {
        Some(path) => NameExceptions::load(path)?,
        None => NameExceptions::new(),
    };

    let client = DiscogsClient::from_config(&config);
    let session = SyncSession::new(&client, config.assembler_options(), exceptions);

    let mut library = JsonLibrary::load(&cli.library)
        .with_context(|| format!("loading library {}", cli.library.display()))?;
    if !cli.tracks.is_empty() {
        library.select(&cli.tracks)?;
    }

    let mut changed = false;
    if cli.rescan {
        let groups = group_by_release(library.selected_tracks()?);
        for track in &groups.untagged {
            warn!("{} has no associated Discogs release", track.match_key());
        }
        for (release_id, tracks) in &groups.releases {
            let ids: Vec<String> = tracks.iter().map(|t| t.id.clone()).collect();
            library.select(&ids)?;
            changed |= sync_release(&session, &mut library, *release_id, cli.yes)?;
        }
    } else {
        let release = cli.release.as_deref().unwrap_or_default();
        let release_id =
            parse_discogs_url(release).with_context(|| format!("not a Discogs release id or URL: {:?}", release))?;
        changed = sync_release(&session, &mut library, release_id, cli.yes)?;
    }

    if changed {
        library.save()?;
        info!("Saved {}", cli.library.display());
    }
    println!("done");
    Ok(())
}

/// Match one release against the current selection and write it after
/// confirmation. Returns whether anything was written.
fn sync_release(
    session: &SyncSession<'_, DiscogsClient>,
    library: &mut JsonLibrary,
    release_id: u64,
    yes: bool,
) -> Result<bool> {
    let report = session.sync_release(&*library, release_id)?;

    println!();
    println!("=== Release {} ===", release_id);
    for line in report.summary_lines() {
        println!("{}", line);
    }
    if report.length_mismatch() {
        println!(
            "Warning: {} selected track(s), {} on the release",
            report.matches.len(),
            report.canonical_count
        );
    }

    if !yes && !confirm("Write? (y to confirm) ")? {
        println!("Skipped release {}", release_id);
        return Ok(false);
    }

    let summary = apply(library, &report)?;
    println!(
        "Updated {} track(s) ({} field(s)), {} unmatched",
        summary.tracks_updated, summary.fields_written, summary.skipped
    );
    Ok(summary.fields_written > 0)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

//! The sync pipeline: fetch a release, assemble canonical records, match them
//! against the library selection, report, and write the differences back.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::assembler::{AssemblerOptions, ReleaseAssembler, TrackRecord};
use crate::catalog::Catalog;
use crate::credits::{CreditResolver, NameCache};
use crate::error::Result;
use crate::exceptions::NameExceptions;
use crate::library::{LabelUsage, LocalTrack, MediaLibrary};
use crate::matcher::{match_tracks, MatchResult};

/// One run against a catalog. Contributor names resolved during the run are
/// cached for its whole lifetime, so syncing several releases by the same
/// artists only looks each contributor up once.
pub struct SyncSession<'a, C: Catalog + ?Sized> {
    catalog: &'a C,
    options: AssemblerOptions,
    exceptions: NameExceptions,
    cache: NameCache,
}

impl<'a, C: Catalog + ?Sized> SyncSession<'a, C> {
    pub fn new(catalog: &'a C, options: AssemblerOptions, exceptions: NameExceptions) -> Self {
        SyncSession {
            catalog,
            options,
            exceptions,
            cache: NameCache::new(),
        }
    }

    pub fn cached_contributors(&self) -> usize {
        self.cache.len()
    }

    /// Fetch `release_id` (and its master) and assemble canonical records.
    pub fn assemble_release(&self, release_id: u64, label_usage: &LabelUsage) -> Result<Vec<TrackRecord>> {
        info!("Fetching release {}", release_id);
        let fetched = self.catalog.fetch_release(release_id)?;
        let resolver = CreditResolver::new(self.catalog, &self.cache, &self.exceptions);
        ReleaseAssembler::new(resolver, &self.options, label_usage).assemble(&fetched)
    }

    /// Match local tracks, ordered by `(disc, track)`, against `canonical`.
    pub fn match_and_report(&self, local: &[LocalTrack], canonical: &[TrackRecord], release_id: u64) -> SyncReport {
        let mut local = local.to_vec();
        local.sort_by_key(LocalTrack::sort_key);

        let report = SyncReport {
            release_id,
            canonical_count: canonical.len(),
            matches: match_tracks(&local, canonical),
        };
        if report.length_mismatch() {
            warn!(
                "Release {} has {} track(s) but {} were selected",
                release_id,
                report.canonical_count,
                report.matches.len()
            );
        }
        for track in report.unmatched() {
            warn!("No match for {:?}", track.match_key());
        }
        report
    }

    /// Assemble `release_id` and match it against the library's selection.
    pub fn sync_release<L: MediaLibrary + ?Sized>(&self, library: &L, release_id: u64) -> Result<SyncReport> {
        let usage = library.label_usage()?;
        let canonical = self.assemble_release(release_id, &usage)?;
        let local = library.selected_tracks()?;
        Ok(self.match_and_report(&local, &canonical, release_id))
    }
}

// ── Reports ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub release_id: u64,
    pub canonical_count: usize,
    pub matches: Vec<MatchResult>,
}

impl SyncReport {
    pub fn unmatched(&self) -> Vec<&LocalTrack> {
        self.matches.iter().filter(|m| !m.is_matched()).map(|m| &m.local).collect()
    }

    pub fn length_mismatch(&self) -> bool {
        self.canonical_count != self.matches.len()
    }

    /// Two lines per local track: its current values, then the record it
    /// was matched with.
    pub fn summary_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.matches.len() * 2);
        for (i, m) in self.matches.iter().enumerate() {
            lines.push(format_local(&m.local, &i.to_string()));
            match &m.matched {
                Some((record, _)) => lines.push(format_record(record, "")),
                None => lines.push(format!("{:>3} no match", "")),
            }
        }
        lines
    }
}

/// `"  1   3/12  1/1   Title - Artist (writers: Composer)"`
pub fn format_record(record: &TrackRecord, label: &str) -> String {
    format_line(
        label,
        Some(record.track_number),
        Some(record.track_count),
        Some(record.disc_number),
        Some(record.disc_count),
        &record.title,
        &record.artist(),
        &record.composer,
    )
}

pub fn format_local(track: &LocalTrack, label: &str) -> String {
    format_line(
        label,
        track.track_number,
        track.track_count,
        track.disc_number,
        track.disc_count,
        track.title.as_deref().unwrap_or(""),
        track.artist.as_deref().unwrap_or(""),
        track.composer.as_deref().unwrap_or(""),
    )
}

#[allow(clippy::too_many_arguments)]
fn format_line(
    label: &str,
    track_number: Option<u32>,
    track_count: Option<u32>,
    disc_number: Option<u32>,
    disc_count: Option<u32>,
    title: &str,
    artist: &str,
    writers: &str,
) -> String {
    let n = |v: Option<u32>| v.map(|v| v.to_string()).unwrap_or_default();
    format!(
        "{:>3} {:>3}/{:<2} {:>2}/{:<3} {} - {} (writers: {})",
        label,
        n(track_number),
        n(track_count),
        n(disc_number),
        n(disc_count),
        title,
        artist,
        writers
    )
}

// ── Writing ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplySummary {
    pub tracks_updated: usize,
    pub fields_written: usize,
    pub skipped: usize,
}

/// Write every record field that differs from the matched local track.
/// Unmatched tracks are skipped and logged, never fatal to the batch.
pub fn apply<L: MediaLibrary + ?Sized>(library: &mut L, report: &SyncReport) -> Result<ApplySummary> {
    let mut summary = ApplySummary::default();

    for m in &report.matches {
        let record = match m.record() {
            Ok(record) => record,
            Err(e) => {
                warn!("{}", e);
                summary.skipped += 1;
                continue;
            }
        };

        let mut written = 0;
        for (field, value) in record.field_values() {
            if m.local.field_value(field).as_ref() != Some(&value) {
                library.write_field(&m.local.id, field, &value)?;
                written += 1;
            }
        }
        if written > 0 {
            summary.tracks_updated += 1;
            summary.fields_written += written;
        }
    }

    info!(
        "Updated {} track(s), {} field(s); skipped {}",
        summary.tracks_updated, summary.fields_written, summary.skipped
    );
    Ok(summary)
}

// ── Rescan ───────────────────────────────────────────────────────────────────

/// Tracks split by the release id in their `D:<id>` comment tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseGroups {
    pub releases: BTreeMap<u64, Vec<LocalTrack>>,
    pub untagged: Vec<LocalTrack>,
}

pub fn group_by_release(tracks: Vec<LocalTrack>) -> ReleaseGroups {
    let mut groups = ReleaseGroups::default();
    for track in tracks {
        match track.release_id() {
            Some(id) => groups.releases.entry(id).or_default().push(track),
            None => groups.untagged.push(track),
        }
    }
    groups
}

//! Greedy one-to-one pairing of library tracks with catalog tracks.
//!
//! Each library track, in order, takes the best-scoring catalog record still
//! in the pool. This is not a global optimum: an early track can take a
//! record a later track would have matched better.

use tracing::debug;

use crate::assembler::TrackRecord;
use crate::error::{Error, Result};
use crate::library::LocalTrack;
use crate::similarity;

#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub local: LocalTrack,
    /// The paired record and its similarity score; `None` when the pool was empty.
    pub matched: Option<(TrackRecord, f64)>,
}

impl MatchResult {
    pub fn record(&self) -> Result<&TrackRecord> {
        self.matched.as_ref().map(|(record, _)| record).ok_or_else(|| Error::NoMatchFound {
            track: self.local.match_key(),
        })
    }

    pub fn score(&self) -> Option<f64> {
        self.matched.as_ref().map(|(_, score)| *score)
    }

    pub fn is_matched(&self) -> bool {
        self.matched.is_some()
    }
}

/// Pair every local track with at most one canonical record, preserving
/// local order. Ties keep the earlier record in pool order.
pub fn match_tracks(local: &[LocalTrack], canonical: &[TrackRecord]) -> Vec<MatchResult> {
    let mut pool: Vec<(String, &TrackRecord)> = canonical
        .iter()
        .map(|record| (format!("{}{}", record.title, record.artist()), record))
        .collect();

    local
        .iter()
        .map(|track| {
            let key = track.match_key();
            let mut best: Option<(usize, f64)> = None;
            for (index, (candidate, _)) in pool.iter().enumerate() {
                let score = similarity::score(&key, candidate);
                if best.map_or(true, |(_, best_score)| score > best_score) {
                    best = Some((index, score));
                }
            }

            let matched = best.map(|(index, score)| {
                let (_, record) = pool.remove(index);
                debug!("{:?} -> {:?} ({:.3})", key, record.title, score);
                (record.clone(), score)
            });
            if matched.is_none() {
                debug!("{:?} -> no candidates left", key);
            }

            MatchResult {
                local: track.clone(),
                matched,
            }
        })
        .collect()
}

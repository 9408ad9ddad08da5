//! Typed catalog payloads and the lookup seam between the pipeline and the
//! catalog service.
//!
//! The structs mirror the subset of the Discogs API JSON the pipeline reads
//! (`/releases/{id}`, `/masters/{id}`, `/artists/{id}`). Missing fields
//! deserialize to their defaults so sparse releases still load.

use serde::{Deserialize, Serialize};

use crate::error::Result;

// ── Payloads ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    /// `0` (or absent) when the catalog does not know the year.
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub artists: Vec<Credit>,
    #[serde(default)]
    pub extraartists: Vec<Credit>,
    #[serde(default)]
    pub tracklist: Vec<TracklistEntry>,
    #[serde(default)]
    pub master_id: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    #[serde(default)]
    pub catno: String,
}

/// An artist credit as it appears on a release or a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    /// Catalog artist id; `0` for names that are not linked to an artist page.
    #[serde(default)]
    pub id: u64,
    pub name: String,
    /// Artist name variation used on this release.
    #[serde(default)]
    pub anv: String,
    /// Joining word to the next credit (`","`, `"&"`, `"Feat."`, …).
    #[serde(default)]
    pub join: String,
    #[serde(default)]
    pub role: String,
    /// Track-range restriction, e.g. `"A1 to A3, B2"`; empty for the whole release.
    #[serde(default)]
    pub tracks: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TracklistEntry {
    #[serde(default)]
    pub position: String,
    #[serde(default, rename = "type_")]
    pub entry_type: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub artists: Vec<Credit>,
    #[serde(default)]
    pub extraartists: Vec<Credit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Master {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// A release together with its master release, when it has one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedRelease {
    pub release: Release,
    #[serde(default)]
    pub master: Option<Master>,
}

// ── Lookup traits ────────────────────────────────────────────────────────────

/// Resolves a contributor id to its catalog artist record.
///
/// `Sync` because contributor lookups are fanned out across threads.
pub trait ArtistLookup: Sync {
    fn artist(&self, id: u64) -> Result<Artist>;
}

/// The catalog operations the sync pipeline needs.
pub trait Catalog: ArtistLookup {
    fn release(&self, id: u64) -> Result<Release>;

    fn master(&self, id: u64) -> Result<Master>;

    /// Fetch a release and, when it belongs to one, its master release.
    fn fetch_release(&self, id: u64) -> Result<FetchedRelease> {
        let release = self.release(id)?;
        let master = match release.master_id {
            Some(master_id) if master_id != 0 => Some(self.master(master_id)?),
            _ => None,
        };
        Ok(FetchedRelease { release, master })
    }
}

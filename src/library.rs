//! The local media library side: typed track snapshots, the adapter trait the
//! sync pipeline writes through, and a JSON-file backed implementation.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

// ── Fields ───────────────────────────────────────────────────────────────────

/// A writable metadata field of a library track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackField {
    Title,
    Artist,
    Composer,
    Genre,
    Album,
    AlbumArtist,
    Grouping,
    Comment,
    Year,
    TrackNumber,
    TrackCount,
    DiscNumber,
    DiscCount,
}

impl TrackField {
    pub fn name(&self) -> &'static str {
        match self {
            TrackField::Title => "title",
            TrackField::Artist => "artist",
            TrackField::Composer => "composer",
            TrackField::Genre => "genre",
            TrackField::Album => "album",
            TrackField::AlbumArtist => "album_artist",
            TrackField::Grouping => "grouping",
            TrackField::Comment => "comment",
            TrackField::Year => "year",
            TrackField::TrackNumber => "track_number",
            TrackField::TrackCount => "track_count",
            TrackField::DiscNumber => "disc_number",
            TrackField::DiscCount => "disc_count",
        }
    }
}

impl fmt::Display for TrackField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Number(u32),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(text) => f.write_str(text),
            FieldValue::Number(n) => write!(f, "{}", n),
        }
    }
}

// ── Tracks ───────────────────────────────────────────────────────────────────

/// Snapshot of one library track. `id` is the library's handle; every other
/// field is `None` when the library has no value for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalTrack {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disc_count: Option<u32>,
}

impl LocalTrack {
    pub fn new(id: &str) -> Self {
        LocalTrack {
            id: id.to_string(),
            ..LocalTrack::default()
        }
    }

    pub fn field_value(&self, field: TrackField) -> Option<FieldValue> {
        let text = |value: &Option<String>| value.clone().map(FieldValue::Text);
        let number = |value: Option<u32>| value.map(FieldValue::Number);
        match field {
            TrackField::Title => text(&self.title),
            TrackField::Artist => text(&self.artist),
            TrackField::Composer => text(&self.composer),
            TrackField::Genre => text(&self.genre),
            TrackField::Album => text(&self.album),
            TrackField::AlbumArtist => text(&self.album_artist),
            TrackField::Grouping => text(&self.grouping),
            TrackField::Comment => text(&self.comment),
            TrackField::Year => number(self.year),
            TrackField::TrackNumber => number(self.track_number),
            TrackField::TrackCount => number(self.track_count),
            TrackField::DiscNumber => number(self.disc_number),
            TrackField::DiscCount => number(self.disc_count),
        }
    }

    /// Set one field; text fields only take text and numeric fields numbers.
    pub fn set_field(&mut self, field: TrackField, value: FieldValue) -> Result<()> {
        let mismatch = |value: &FieldValue| Error::Library(format!("{} cannot hold {:?}", field, value));
        match (field, value) {
            (TrackField::Title, FieldValue::Text(v)) => self.title = Some(v),
            (TrackField::Artist, FieldValue::Text(v)) => self.artist = Some(v),
            (TrackField::Composer, FieldValue::Text(v)) => self.composer = Some(v),
            (TrackField::Genre, FieldValue::Text(v)) => self.genre = Some(v),
            (TrackField::Album, FieldValue::Text(v)) => self.album = Some(v),
            (TrackField::AlbumArtist, FieldValue::Text(v)) => self.album_artist = Some(v),
            (TrackField::Grouping, FieldValue::Text(v)) => self.grouping = Some(v),
            (TrackField::Comment, FieldValue::Text(v)) => self.comment = Some(v),
            (TrackField::Year, FieldValue::Number(n)) => self.year = Some(n),
            (TrackField::TrackNumber, FieldValue::Number(n)) => self.track_number = Some(n),
            (TrackField::TrackCount, FieldValue::Number(n)) => self.track_count = Some(n),
            (TrackField::DiscNumber, FieldValue::Number(n)) => self.disc_number = Some(n),
            (TrackField::DiscCount, FieldValue::Number(n)) => self.disc_count = Some(n),
            (_, value) => return Err(mismatch(&value)),
        }
        Ok(())
    }

    /// Release id from a `D:<id>` comment tag.
    pub fn release_id(&self) -> Option<u64> {
        self.comment
            .as_deref()
            .and_then(|c| c.trim().strip_prefix("D:"))
            .and_then(|id| id.trim().parse().ok())
            .filter(|id| *id != 0)
    }

    /// Title followed by artist, the string the matcher compares.
    pub fn match_key(&self) -> String {
        format!(
            "{}{}",
            self.title.as_deref().unwrap_or(""),
            self.artist.as_deref().unwrap_or("")
        )
    }

    /// `(disc, track)`, unknown values sorting first.
    pub fn sort_key(&self) -> (u32, u32) {
        (self.disc_number.unwrap_or(0), self.track_number.unwrap_or(0))
    }
}

/// How many library tracks carry each label name in their grouping field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelUsage {
    counts: HashMap<String, usize>,
}

impl LabelUsage {
    pub fn from_groupings<I, S>(groupings: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = HashMap::new();
        for grouping in groupings {
            let grouping = grouping.as_ref().trim();
            if !grouping.is_empty() {
                *counts.entry(grouping.to_string()).or_insert(0) += 1;
            }
        }
        LabelUsage { counts }
    }

    pub fn count(&self, label: &str) -> usize {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

// ── Adapter ──────────────────────────────────────────────────────────────────

/// The media library the sync pipeline reads from and writes to.
pub trait MediaLibrary {
    /// The tracks the user picked, in library order.
    fn selected_tracks(&self) -> Result<Vec<LocalTrack>>;

    fn write_field(&mut self, track_id: &str, field: TrackField, value: &FieldValue) -> Result<()>;

    fn label_usage(&self) -> Result<LabelUsage>;
}

/// A library stored as a JSON array of tracks.
///
/// Selection is by track id; with no selection every track counts as
/// selected. Writes go to memory until [`JsonLibrary::save`].
#[derive(Debug, Clone, Default)]
pub struct JsonLibrary {
    path: Option<PathBuf>,
    tracks: Vec<LocalTrack>,
    selection: Option<Vec<String>>,
}

impl JsonLibrary {
    pub fn new(tracks: Vec<LocalTrack>) -> Self {
        JsonLibrary {
            path: None,
            tracks,
            selection: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let tracks: Vec<LocalTrack> = serde_json::from_str(&content)?;
        debug!("Loaded {} track(s) from {}", tracks.len(), path.display());
        Ok(JsonLibrary {
            path: Some(path.to_path_buf()),
            tracks,
            selection: None,
        })
    }

    /// Write back to the file the library was loaded from.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.save_to(path),
            None => Err(Error::Library("library was not loaded from a file".to_string())),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.tracks)?;
        fs::write(path, json)?;
        debug!("Saved {} track(s) to {}", self.tracks.len(), path.display());
        Ok(())
    }

    /// Restrict the selection to `ids`; every id must exist.
    pub fn select(&mut self, ids: &[String]) -> Result<()> {
        if let Some(missing) = ids.iter().find(|id| self.track(id).is_none()) {
            return Err(Error::Library(format!("no track with id {:?}", missing)));
        }
        self.selection = Some(ids.to_vec());
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selection = None;
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    pub fn track(&self, id: &str) -> Option<&LocalTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }
}

impl MediaLibrary for JsonLibrary {
    fn selected_tracks(&self) -> Result<Vec<LocalTrack>> {
        let tracks = match &self.selection {
            None => self.tracks.clone(),
            Some(ids) => self
                .tracks
                .iter()
                .filter(|t| ids.contains(&t.id))
                .cloned()
                .collect(),
        };
        Ok(tracks)
    }

    fn write_field(&mut self, track_id: &str, field: TrackField, value: &FieldValue) -> Result<()> {
        let track = self
            .tracks
            .iter_mut()
            .find(|t| t.id == track_id)
            .ok_or_else(|| Error::Library(format!("no track with id {:?}", track_id)))?;
        track.set_field(field, value.clone())
    }

    fn label_usage(&self) -> Result<LabelUsage> {
        Ok(LabelUsage::from_groupings(
            self.tracks.iter().filter_map(|t| t.grouping.as_deref()),
        ))
    }
}

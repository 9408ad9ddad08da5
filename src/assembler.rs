//! Turns a catalog release into canonical per-track records.
//!
//! Assembly order matters:
//!
//! 1. drop tracklist entries without a position (headings, index tracks)
//! 2. index positions: running track number per disc, track and disc counts
//! 3. release-wide fields: album, album artist, year, label, release credits
//! 4. per track: cleaned title, artist string, composer string
//!
//! Any malformed position or unresolvable contributor aborts the whole
//! release; a partial tracklist is never returned.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{ArtistLookup, Credit, FetchedRelease, Label, Release, TracklistEntry};
use crate::credits::CreditResolver;
use crate::error::Result;
use crate::library::{FieldValue, LabelUsage, TrackField};
use crate::names::{clean_track_title, concat_names, fix_catalog_string, roles_match, split_roles, ListStyle};
use crate::position::{parse_position, position_in_ranges, Position};

/// Role keywords that make a credit count towards the composer field on
/// genres where the producer is effectively the writer.
const PRODUCER_ROLE: &str = "producer";
const PRODUCER_EXCLUDED_ROLES: &[&str] = &["producer [", "executive producer"];

// ── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct AssemblerOptions {
    /// Use a credit's name variation (ANV) instead of the artist's catalog name.
    pub prefer_anv: bool,
    /// Extra-credit roles that make an artist "featured".
    pub featuring_roles: Vec<String>,
    /// Extra-credit roles that make an artist a composer.
    pub composer_roles: Vec<String>,
    pub composer_exclude_roles: Vec<String>,
    /// Release genres on which producers are credited as composers.
    pub producer_genres: Vec<String>,
    /// Fill the genre field from the release's first genre.
    pub release_genre: bool,
}

impl Default for AssemblerOptions {
    fn default() -> Self {
        AssemblerOptions {
            prefer_anv: true,
            featuring_roles: vec!["featuring".to_string(), "vocals".to_string()],
            composer_roles: vec!["written".to_string(), "lyrics".to_string(), "music".to_string()],
            composer_exclude_roles: Vec::new(),
            producer_genres: vec!["Electronic".to_string(), "Hip Hop".to_string()],
            release_genre: false,
        }
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

/// Canonical metadata for one catalog track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackRecord {
    pub title: String,
    /// Headline performers, rendered.
    pub primary_artist: String,
    /// Guest performers, rendered; empty when there are none.
    pub featured_artist: String,
    pub composer: String,
    pub genre: Option<String>,
    pub album_artist: String,
    pub album: String,
    pub grouping: Option<String>,
    pub year: Option<u32>,
    pub release_id: u64,
    pub track_number: u32,
    pub track_count: u32,
    pub disc_number: u32,
    pub disc_count: u32,
}

impl TrackRecord {
    /// `"Primary feat. Featured"`.
    pub fn artist(&self) -> String {
        if self.featured_artist.is_empty() {
            self.primary_artist.clone()
        } else {
            format!("{} feat. {}", self.primary_artist, self.featured_artist)
        }
    }

    /// Comment tag linking a library track back to its release.
    pub fn comment(&self) -> String {
        format!("D:{}", self.release_id)
    }

    /// Every field this record has a value for, in write order.
    pub fn field_values(&self) -> Vec<(TrackField, FieldValue)> {
        let mut fields = vec![
            (TrackField::Title, FieldValue::Text(self.title.clone())),
            (TrackField::Artist, FieldValue::Text(self.artist())),
            (TrackField::AlbumArtist, FieldValue::Text(self.album_artist.clone())),
            (TrackField::Album, FieldValue::Text(self.album.clone())),
        ];
        if let Some(grouping) = &self.grouping {
            fields.push((TrackField::Grouping, FieldValue::Text(grouping.clone())));
        }
        fields.push((TrackField::Composer, FieldValue::Text(self.composer.clone())));
        fields.push((TrackField::Comment, FieldValue::Text(self.comment())));
        if let Some(genre) = &self.genre {
            fields.push((TrackField::Genre, FieldValue::Text(genre.clone())));
        }
        if let Some(year) = self.year {
            fields.push((TrackField::Year, FieldValue::Number(year)));
        }
        fields.extend([
            (TrackField::TrackNumber, FieldValue::Number(self.track_number)),
            (TrackField::TrackCount, FieldValue::Number(self.track_count)),
            (TrackField::DiscNumber, FieldValue::Number(self.disc_number)),
            (TrackField::DiscCount, FieldValue::Number(self.disc_count)),
        ]);
        fields
    }
}

/// A release or track credit with its role string split into tags.
#[derive(Debug, Clone, PartialEq)]
pub struct ContributorCredit {
    pub id: u64,
    pub name: String,
    pub anv: String,
    pub join: String,
    pub roles: Vec<String>,
    /// Track-range restriction; `None` when the credit covers every track.
    pub tracks: Option<String>,
}

impl From<&Credit> for ContributorCredit {
    fn from(credit: &Credit) -> Self {
        let tracks = credit.tracks.trim();
        ContributorCredit {
            id: credit.id,
            name: credit.name.clone(),
            anv: credit.anv.clone(),
            join: credit.join.clone(),
            roles: split_roles(&credit.role),
            tracks: (!tracks.is_empty()).then(|| tracks.to_string()),
        }
    }
}

impl ContributorCredit {
    /// Cleaned display name, name variation first when preferred.
    pub fn display_name(&self, prefer_anv: bool) -> String {
        let name = if prefer_anv && !self.anv.trim().is_empty() {
            &self.anv
        } else {
            &self.name
        };
        fix_catalog_string(name)
    }

    /// Whether the next credit in the list is a guest ("A feat. B", "A with B").
    pub fn joins_featured(&self) -> bool {
        let join = self.join.trim().trim_end_matches('.').to_lowercase();
        matches!(join.as_str(), "feat" | "featuring" | "ft" | "with")
    }

    /// Whether this credit covers the track at `position`.
    pub fn applies_to(&self, position: &str) -> Result<bool> {
        match &self.tracks {
            Some(ranges) => position_in_ranges(ranges, position),
            None => Ok(true),
        }
    }

    fn has_role(&self, filter: &RoleFilter) -> bool {
        roles_match(&self.roles, &filter.include, &filter.exclude)
    }
}

fn credits(raw: &[Credit]) -> Vec<ContributorCredit> {
    raw.iter().map(ContributorCredit::from).collect()
}

#[derive(Debug, Clone)]
struct RoleFilter {
    include: Vec<String>,
    exclude: Vec<String>,
}

// ── Position index ───────────────────────────────────────────────────────────

/// Running track numbers per disc, plus per-disc track counts.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionIndex {
    entries: Vec<Position>,
    track_counts: BTreeMap<u32, u32>,
    disc_count: u32,
}

impl PositionIndex {
    /// Number tracks from 1 on each disc, in tracklist order. Only the disc
    /// of each token is used; the counter restarts whenever the disc number
    /// goes up, so vinyl sides A and B count through as one disc.
    pub fn build<S: AsRef<str>>(positions: &[S]) -> Result<Self> {
        let mut entries = Vec::with_capacity(positions.len());
        let mut prev_disc = 0;
        let mut count = 0;

        for token in positions {
            let disc = parse_position(token.as_ref(), 1, 0)?.disc;
            count += 1;
            if disc > prev_disc {
                count = 1;
                prev_disc = disc;
            }
            entries.push(Position::new(count, disc));
        }

        let mut track_counts = BTreeMap::new();
        for entry in &entries {
            let highest = track_counts.entry(entry.disc).or_insert(0);
            *highest = (*highest).max(entry.track);
        }
        let disc_count = entries.iter().map(|e| e.disc).max().unwrap_or(0);

        Ok(PositionIndex {
            entries,
            track_counts,
            disc_count,
        })
    }

    pub fn get(&self, index: usize) -> Option<Position> {
        self.entries.get(index).copied()
    }

    pub fn track_count(&self, disc: u32) -> u32 {
        self.track_counts.get(&disc).copied().unwrap_or(0)
    }

    pub fn disc_count(&self) -> u32 {
        self.disc_count
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Artist strings ───────────────────────────────────────────────────────────

/// Credits split into headliners and guests.
#[derive(Debug, Clone, Default, PartialEq)]
struct ArtistNames {
    primary: Vec<String>,
    featured: Vec<String>,
}

impl ArtistNames {
    /// A credit following a "feat"/"with" join is a guest.
    fn from_credits(credits: &[ContributorCredit], prefer_anv: bool) -> Self {
        let mut names = ArtistNames::default();
        let mut featured_next = false;
        for credit in credits {
            let name = credit.display_name(prefer_anv);
            if featured_next {
                names.featured.push(name);
            } else {
                names.primary.push(name);
            }
            featured_next = credit.joins_featured();
        }
        names
    }

    fn primary_string(&self) -> String {
        concat_names(&self.primary, &ListStyle::default())
    }

    fn featured_string(&self) -> String {
        concat_names(&self.featured, &ListStyle::default())
    }

    fn render(&self) -> String {
        let featured = self.featured_string();
        if featured.is_empty() {
            self.primary_string()
        } else {
            format!("{} feat. {}", self.primary_string(), featured)
        }
    }
}

// ── Assembler ────────────────────────────────────────────────────────────────

/// Fields shared by every track of a release.
struct ReleaseContext<'r> {
    release: &'r Release,
    album_artist: String,
    year: Option<u32>,
    grouping: Option<String>,
    genre: Option<String>,
    artists: Vec<ContributorCredit>,
    writers: Vec<ContributorCredit>,
    featured: Vec<ContributorCredit>,
    composer_filter: RoleFilter,
}

pub struct ReleaseAssembler<'a, L: ArtistLookup + ?Sized> {
    resolver: CreditResolver<'a, L>,
    options: &'a AssemblerOptions,
    label_usage: &'a LabelUsage,
}

impl<'a, L: ArtistLookup + ?Sized> ReleaseAssembler<'a, L> {
    pub fn new(resolver: CreditResolver<'a, L>, options: &'a AssemblerOptions, label_usage: &'a LabelUsage) -> Self {
        ReleaseAssembler {
            resolver,
            options,
            label_usage,
        }
    }

    /// Canonical records for every positioned track, in tracklist order.
    pub fn assemble(&self, fetched: &FetchedRelease) -> Result<Vec<TrackRecord>> {
        let release = &fetched.release;

        let entries: Vec<&TracklistEntry> = release
            .tracklist
            .iter()
            .filter(|t| !t.position.trim().is_empty())
            .collect();
        let positions: Vec<&str> = entries.iter().map(|t| t.position.as_str()).collect();
        let index = PositionIndex::build(&positions)?;

        let context = self.release_context(fetched);
        debug!(
            "Release {}: {} track(s) on {} disc(s), album artist {:?}, label {:?}",
            release.id,
            index.len(),
            index.disc_count(),
            context.album_artist,
            context.grouping
        );

        let mut records = Vec::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            let Some(position) = index.get(i) else {
                break;
            };
            let record = self.assemble_track(&context, entry, position, &index)?;
            debug!(
                "  {:>2}/{} {} - {} ({})",
                record.track_number,
                record.disc_number,
                record.artist(),
                record.title,
                record.composer
            );
            records.push(record);
        }

        info!("Assembled {} track(s) for release {}", records.len(), release.id);
        Ok(records)
    }

    fn release_context<'r>(&self, fetched: &'r FetchedRelease) -> ReleaseContext<'r> {
        let release = &fetched.release;
        let prefer_anv = self.options.prefer_anv;

        let artists = credits(&release.artists);
        let album_artist = ArtistNames::from_credits(&artists, prefer_anv).render();

        let year = fetched
            .master
            .as_ref()
            .and_then(|m| m.year)
            .filter(|y| *y > 0)
            .or(release.year.filter(|y| *y > 0))
            .map(|y| y as u32);

        let composer_filter = self.composer_filter(&release.genres);
        let featuring_filter = RoleFilter {
            include: self.options.featuring_roles.clone(),
            exclude: Vec::new(),
        };

        let extras = credits(&release.extraartists);
        let writers = extras.iter().filter(|c| c.has_role(&composer_filter)).cloned().collect();
        let featured = extras.iter().filter(|c| c.has_role(&featuring_filter)).cloned().collect();

        let genre = if self.options.release_genre {
            release.genres.first().cloned()
        } else {
            None
        };

        ReleaseContext {
            release,
            album_artist,
            year,
            grouping: choose_label(&release.labels, self.label_usage),
            genre,
            artists,
            writers,
            featured,
            composer_filter,
        }
    }

    /// Composer roles for this release; producers count on the configured genres.
    fn composer_filter(&self, genres: &[String]) -> RoleFilter {
        let mut filter = RoleFilter {
            include: self.options.composer_roles.clone(),
            exclude: self.options.composer_exclude_roles.clone(),
        };
        let producer_genre = genres
            .iter()
            .any(|g| self.options.producer_genres.iter().any(|p| p.eq_ignore_ascii_case(g)));
        if producer_genre {
            filter.include.push(PRODUCER_ROLE.to_string());
            filter.exclude.extend(PRODUCER_EXCLUDED_ROLES.iter().map(|r| r.to_string()));
        }
        filter
    }

    fn assemble_track(
        &self,
        context: &ReleaseContext<'_>,
        entry: &TracklistEntry,
        position: Position,
        index: &PositionIndex,
    ) -> Result<TrackRecord> {
        let track_artists = credits(&entry.artists);
        let track_extras = credits(&entry.extraartists);

        let artist = self.track_artist(context, entry, &track_artists, &track_extras)?;
        let composer = self.track_composer(context, entry, &track_artists, &track_extras)?;

        Ok(TrackRecord {
            title: clean_track_title(&entry.title),
            primary_artist: artist.primary_string(),
            featured_artist: artist.featured_string(),
            composer,
            genre: context.genre.clone(),
            album_artist: context.album_artist.clone(),
            album: context.release.title.clone(),
            grouping: context.grouping.clone(),
            year: context.year,
            release_id: context.release.id,
            track_number: position.track,
            track_count: index.track_count(position.disc),
            disc_number: position.disc,
            disc_count: index.disc_count(),
        })
    }

    /// Track performers; without track-level artists the album artist stands
    /// in. Guests come from "feat" joins, featuring/vocal extra credits on the
    /// track and range-restricted featuring credits on the release.
    fn track_artist(
        &self,
        context: &ReleaseContext<'_>,
        entry: &TracklistEntry,
        track_artists: &[ContributorCredit],
        track_extras: &[ContributorCredit],
    ) -> Result<ArtistNames> {
        let prefer_anv = self.options.prefer_anv;
        let mut names = if track_artists.is_empty() {
            ArtistNames {
                primary: vec![context.album_artist.clone()],
                featured: Vec::new(),
            }
        } else {
            ArtistNames::from_credits(track_artists, prefer_anv)
        };

        let featuring_filter = RoleFilter {
            include: self.options.featuring_roles.clone(),
            exclude: Vec::new(),
        };
        for credit in track_extras.iter().filter(|c| c.has_role(&featuring_filter)) {
            names.featured.push(credit.display_name(prefer_anv));
        }
        for credit in &context.featured {
            if credit.tracks.is_some() && credit.applies_to(&entry.position)? {
                names.featured.push(credit.display_name(prefer_anv));
            }
        }

        // "DJ Mehdi feat. DJ Mehdi" happens when a headliner is also credited on vocals
        let primary = names.primary.clone();
        names.featured.retain(|name| !primary.contains(name));
        Ok(names)
    }

    /// Writers of the track, by real name, joined with "/".
    fn track_composer(
        &self,
        context: &ReleaseContext<'_>,
        entry: &TracklistEntry,
        track_artists: &[ContributorCredit],
        track_extras: &[ContributorCredit],
    ) -> Result<String> {
        let mut writers: Vec<&ContributorCredit> = track_extras
            .iter()
            .filter(|c| c.has_role(&context.composer_filter))
            .collect();
        for writer in &context.writers {
            if writer.applies_to(&entry.position)? {
                writers.push(writer);
            }
        }

        if writers.is_empty() {
            writers.extend(track_artists);
        }
        if writers.is_empty() {
            writers.extend(&context.artists);
        }

        let contributors: Vec<(u64, &str)> = writers.iter().map(|w| (w.id, w.name.as_str())).collect();
        let names = self.resolver.resolve_all(&contributors)?;
        Ok(concat_names(&names, &ListStyle::joined("/")))
    }
}

/// Pick the label to write as grouping.
///
/// With several labels, the one the library already uses most wins; ties go
/// to the alphabetically first. Without any library usage the first listed
/// label is kept.
pub fn choose_label(labels: &[Label], usage: &LabelUsage) -> Option<String> {
    let mut names: Vec<String> = Vec::new();
    for label in labels {
        let name = fix_catalog_string(&label.name);
        if !names.contains(&name) {
            names.push(name);
        }
    }

    if names.len() <= 1 || usage.is_empty() {
        return names.into_iter().next();
    }

    names
        .into_iter()
        .map(|name| (usage.count(&name), name))
        .max_by(|(count_a, name_a), (count_b, name_b)| count_a.cmp(count_b).then_with(|| name_b.cmp(name_a)))
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Artist, Master};
    use crate::credits::NameCache;
    use crate::error::Error;
    use crate::exceptions::NameExceptions;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Lookup that knows a fixed set of artists; unknown ids fail.
    #[derive(Default)]
    struct Artists(HashMap<u64, Artist>);

    impl Artists {
        fn alias(mut self, id: u64, name: &str, realname: &str) -> Self {
            self.0.insert(
                id,
                Artist {
                    id,
                    name: name.to_string(),
                    realname: Some(realname.to_string()),
                    ..Artist::default()
                },
            );
            self
        }

        fn plain(mut self, id: u64, name: &str) -> Self {
            self.0.insert(
                id,
                Artist {
                    id,
                    name: name.to_string(),
                    ..Artist::default()
                },
            );
            self
        }
    }

    impl ArtistLookup for Artists {
        fn artist(&self, id: u64) -> Result<Artist> {
            self.0.get(&id).cloned().ok_or(Error::CatalogStatus {
                url: format!("/artists/{}", id),
                status: 404,
            })
        }
    }

    fn assemble_with(
        artists: &Artists,
        options: &AssemblerOptions,
        usage: &LabelUsage,
        fetched: &FetchedRelease,
    ) -> Result<Vec<TrackRecord>> {
        let cache = NameCache::new();
        let exceptions = NameExceptions::new();
        let resolver = CreditResolver::new(artists, &cache, &exceptions);
        ReleaseAssembler::new(resolver, options, usage).assemble(fetched)
    }

    fn assemble(artists: &Artists, release: Value) -> Result<Vec<TrackRecord>> {
        let fetched = FetchedRelease {
            release: serde_json::from_value(release).unwrap(),
            master: None,
        };
        assemble_with(artists, &AssemblerOptions::default(), &LabelUsage::default(), &fetched)
    }

    fn credit(id: u64, name: &str) -> Value {
        json!({"id": id, "name": name, "anv": "", "join": "", "role": "", "tracks": ""})
    }

    fn vinyl_release() -> Value {
        let tracklist: Vec<Value> = ["A", "B", "C", "D"]
            .iter()
            .flat_map(|side| (1..=4).map(move |n| json!({"position": format!("{}{}", side, n), "title": format!("Track {}{}", side, n)})))
            .collect();
        json!({
            "id": 1000,
            "title": "Double LP",
            "year": 1997,
            "artists": [credit(1, "Band")],
            "labels": [{"name": "Label (3)"}],
            "tracklist": tracklist
        })
    }

    #[test]
    fn test_position_index_vinyl() {
        let positions: Vec<String> = ["A", "B", "C", "D"]
            .iter()
            .flat_map(|side| (1..=4).map(move |n| format!("{}{}", side, n)))
            .collect();
        let index = PositionIndex::build(&positions).unwrap();
        assert_eq!(index.disc_count(), 2);
        assert_eq!(index.track_count(1), 8);
        assert_eq!(index.track_count(2), 8);
        assert_eq!(index.get(4), Some(Position::new(5, 1))); // B1
        assert_eq!(index.get(8), Some(Position::new(1, 2))); // C1
    }

    #[test]
    fn test_position_index_uneven_discs() {
        let index = PositionIndex::build(&["1-1", "1-2", "1-3", "1-4", "2-1", "2-2", "2-3"]).unwrap();
        assert_eq!(index.disc_count(), 2);
        assert_eq!(index.track_count(1), 4);
        assert_eq!(index.track_count(2), 3);
        assert!(PositionIndex::build(&["1", "?"]).is_err());
        assert!(PositionIndex::build::<&str>(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_vinyl_release_numbering() {
        let artists = Artists::default().plain(1, "Band");
        let records = assemble(&artists, vinyl_release()).unwrap();

        assert_eq!(records.len(), 16);
        for record in &records {
            assert_eq!(record.disc_count, 2);
            assert_eq!(record.track_count, 8);
        }
        let side_a_b: Vec<u32> = records[..8].iter().map(|r| r.track_number).collect();
        assert_eq!(side_a_b, (1..=8).collect::<Vec<_>>());
        assert!(records[..8].iter().all(|r| r.disc_number == 1));
        assert!(records[8..].iter().all(|r| r.disc_number == 2));
        assert_eq!(records[8].track_number, 1);
        assert_eq!(records[15].track_number, 8);

        let first = &records[0];
        assert_eq!(first.album, "Double LP");
        assert_eq!(first.album_artist, "Band");
        assert_eq!(first.grouping.as_deref(), Some("Label"));
        assert_eq!(first.year, Some(1997));
        assert_eq!(first.comment(), "D:1000");
        assert_eq!(first.genre, None);
        // No writers credited anywhere: the release artist stands in
        assert_eq!(first.composer, "Band");
    }

    #[test]
    fn test_headings_are_skipped_and_titles_cleaned() {
        let artists = Artists::default().plain(1, "Band");
        let records = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "EP",
                "artists": [credit(1, "Band")],
                "tracklist": [
                    {"position": "", "type_": "heading", "title": "Part One"},
                    {"position": "1", "title": "Strobe (Original Mix)"},
                    {"position": "2", "title": "Strobe (Club Rmx)"}
                ]
            }),
        )
        .unwrap();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Strobe", "Strobe (Club Remix)"]);
        assert_eq!(records[1].track_number, 2);
        assert_eq!(records[1].track_count, 2);
        assert_eq!(records[0].grouping, None);
    }

    #[test]
    fn test_album_artist_feat_join_and_anv() {
        let artists = Artists::default().plain(1, "Zed").plain(2, "Abe").plain(3, "Guest");
        let records = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "Collab",
                "artists": [
                    {"id": 1, "name": "Zed", "anv": "", "join": "&"},
                    {"id": 2, "name": "Abe (2)", "anv": "", "join": "Feat."},
                    {"id": 3, "name": "Guest", "anv": "G.", "join": ""}
                ],
                "tracklist": [{"position": "1", "title": "One"}]
            }),
        )
        .unwrap();
        assert_eq!(records[0].album_artist, "Abe & Zed feat. G.");
        assert_eq!(records[0].artist(), "Abe & Zed feat. G.");

        let records = assemble(
            &artists,
            json!({
                "id": 2,
                "title": "Duet",
                "artists": [
                    {"id": 1, "name": "Zed", "anv": "", "join": "With"},
                    {"id": 3, "name": "Guest", "anv": "", "join": ""}
                ],
                "tracklist": [{"position": "1", "title": "One"}]
            }),
        )
        .unwrap();
        assert_eq!(records[0].album_artist, "Zed feat. Guest");
    }

    #[test]
    fn test_track_featured_artists() {
        let artists = Artists::default().plain(1, "DJ Mehdi").plain(5, "Fafi").plain(6, "Riton");
        let records = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "Lucky Boy",
                "artists": [credit(1, "DJ Mehdi")],
                "extraartists": [
                    {"id": 6, "name": "Riton", "anv": "", "join": "", "role": "Vocals", "tracks": "2 to 3"},
                    {"id": 7, "name": "Everyone", "anv": "", "join": "", "role": "Vocals", "tracks": ""}
                ],
                "tracklist": [
                    {
                        "position": "1",
                        "title": "Signatune",
                        "artists": [credit(1, "DJ Mehdi")],
                        "extraartists": [
                            {"id": 5, "name": "Fafi", "anv": "", "join": "", "role": "Featuring", "tracks": ""},
                            {"id": 1, "name": "DJ Mehdi", "anv": "", "join": "", "role": "Vocals", "tracks": ""}
                        ]
                    },
                    {"position": "2", "title": "Pocket Piano"},
                    {"position": "4", "title": "Lucky Boy"}
                ]
            }),
        )
        .unwrap();

        assert_eq!(records[0].artist(), "DJ Mehdi feat. Fafi");
        assert_eq!(records[1].artist(), "DJ Mehdi feat. Riton");
        assert_eq!(records[1].featured_artist, "Riton");
        // Unrestricted release-level featuring credits are not spread to every track
        assert_eq!(records[2].artist(), "DJ Mehdi");
    }

    #[test]
    fn test_composers_from_track_and_release_credits() {
        let artists = Artists::default()
            .plain(1, "Band")
            .alias(10, "Writer One", "jane doe")
            .alias(11, "Writer Two", "John Roe")
            .alias(12, "Everywhere", "Al Lways");
        let records = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "Album",
                "artists": [credit(1, "Band")],
                "extraartists": [
                    {"id": 11, "name": "Writer Two", "anv": "", "join": "", "role": "Written-By", "tracks": "A2 to A3"},
                    {"id": 12, "name": "Everywhere", "anv": "", "join": "", "role": "Lyrics By", "tracks": ""}
                ],
                "tracklist": [
                    {
                        "position": "A1",
                        "title": "One",
                        "extraartists": [
                            {"id": 10, "name": "Writer One", "anv": "", "join": "", "role": "Music By, Guitar", "tracks": ""}
                        ]
                    },
                    {"position": "A2", "title": "Two"}
                ]
            }),
        )
        .unwrap();

        assert_eq!(records[0].composer, "Jane Doe/Al Lways");
        assert_eq!(records[1].composer, "John Roe/Al Lways");
    }

    #[test]
    fn test_composer_falls_back_to_track_artists() {
        let artists = Artists::default().plain(1, "Various").alias(2, "Solo Act", "sam solo");
        let records = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "Compilation",
                "artists": [credit(1, "Various")],
                "tracklist": [
                    {"position": "1", "title": "One", "artists": [credit(2, "Solo Act")]},
                    {"position": "2", "title": "Two"}
                ]
            }),
        )
        .unwrap();
        assert_eq!(records[0].composer, "Sam Solo");
        assert_eq!(records[0].artist(), "Solo Act");
        // Release artist "Various" resolves to nobody
        assert_eq!(records[1].composer, "");
    }

    #[test]
    fn test_producers_count_on_electronic_releases() {
        let artists = Artists::default()
            .plain(1, "Band")
            .alias(20, "Beatmaker", "Pat Producer")
            .plain(21, "Boss")
            .plain(22, "Helper");
        let release = json!({
            "id": 1,
            "title": "Beats",
            "genres": ["Electronic"],
            "artists": [credit(1, "Band")],
            "extraartists": [
                {"id": 20, "name": "Beatmaker", "anv": "", "join": "", "role": "Producer", "tracks": ""},
                {"id": 21, "name": "Boss", "anv": "", "join": "", "role": "Executive Producer", "tracks": ""},
                {"id": 22, "name": "Helper", "anv": "", "join": "", "role": "Producer [Additional]", "tracks": ""}
            ],
            "tracklist": [{"position": "1", "title": "One"}]
        });
        let records = assemble(&artists, release.clone()).unwrap();
        assert_eq!(records[0].composer, "Pat Producer");

        let mut rock = release;
        rock["genres"] = json!(["Rock"]);
        let records = assemble(&artists, rock).unwrap();
        assert_eq!(records[0].composer, "Band");
    }

    #[test]
    fn test_master_year_preferred() {
        let artists = Artists::default().plain(1, "Band");
        let fetched = FetchedRelease {
            release: serde_json::from_value(json!({
                "id": 5,
                "title": "Reissue",
                "year": 2015,
                "master_id": 77,
                "artists": [credit(1, "Band")],
                "tracklist": [{"position": "1", "title": "One"}]
            }))
            .unwrap(),
            master: Some(Master {
                id: 77,
                title: "Reissue".to_string(),
                year: Some(1971),
            }),
        };
        let records =
            assemble_with(&artists, &AssemblerOptions::default(), &LabelUsage::default(), &fetched).unwrap();
        assert_eq!(records[0].year, Some(1971));

        let mut unknown_master = fetched.clone();
        unknown_master.master = Some(Master {
            id: 77,
            title: String::new(),
            year: Some(0),
        });
        let records =
            assemble_with(&artists, &AssemblerOptions::default(), &LabelUsage::default(), &unknown_master)
                .unwrap();
        assert_eq!(records[0].year, Some(2015));
    }

    #[test]
    fn test_release_genre_option() {
        let artists = Artists::default().plain(1, "Band");
        let fetched = FetchedRelease {
            release: serde_json::from_value(json!({
                "id": 5,
                "title": "Album",
                "genres": ["Jazz", "Funk / Soul"],
                "artists": [credit(1, "Band")],
                "tracklist": [{"position": "1", "title": "One"}]
            }))
            .unwrap(),
            master: None,
        };
        let options = AssemblerOptions {
            release_genre: true,
            ..AssemblerOptions::default()
        };
        let records = assemble_with(&artists, &options, &LabelUsage::default(), &fetched).unwrap();
        assert_eq!(records[0].genre.as_deref(), Some("Jazz"));
    }

    #[test]
    fn test_choose_label() {
        let labels: Vec<Label> = ["Virgin", "Soma Quality Recordings", "Virgin"]
            .iter()
            .map(|name| Label {
                name: name.to_string(),
                catno: String::new(),
            })
            .collect();

        assert_eq!(choose_label(&labels, &LabelUsage::default()).as_deref(), Some("Virgin"));

        let usage = LabelUsage::from_groupings(["Soma Quality Recordings", "Soma Quality Recordings", "Virgin"]);
        assert_eq!(choose_label(&labels, &usage).as_deref(), Some("Soma Quality Recordings"));

        let unrelated = LabelUsage::from_groupings(["Warp"]);
        assert_eq!(choose_label(&labels, &unrelated).as_deref(), Some("Soma Quality Recordings"));

        assert_eq!(choose_label(&[], &usage), None);
    }

    #[test]
    fn test_malformed_position_aborts_release() {
        let artists = Artists::default().plain(1, "Band");
        let result = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "Broken",
                "artists": [credit(1, "Band")],
                "tracklist": [{"position": "1", "title": "Fine"}, {"position": "A1.a", "title": "Sub"}]
            }),
        );
        assert!(matches!(result, Err(Error::MalformedPosition { .. })));
    }

    #[test]
    fn test_unresolved_writer_aborts_release() {
        let artists = Artists::default().plain(1, "Band");
        let result = assemble(
            &artists,
            json!({
                "id": 1,
                "title": "Album",
                "artists": [credit(1, "Band")],
                "extraartists": [
                    {"id": 404, "name": "Ghost Writer", "anv": "", "join": "", "role": "Written-By", "tracks": ""}
                ],
                "tracklist": [{"position": "1", "title": "One"}]
            }),
        );
        assert!(matches!(result, Err(Error::UnresolvedContributor { .. })));
    }

    #[test]
    fn test_field_values_skip_missing() {
        let artists = Artists::default().plain(1, "Band");
        let records = assemble(
            &artists,
            json!({"id": 9, "title": "T", "artists": [credit(1, "Band")], "tracklist": [{"position": "1", "title": "One"}]}),
        )
        .unwrap();
        let fields: Vec<TrackField> = records[0].field_values().into_iter().map(|(f, _)| f).collect();
        assert!(!fields.contains(&TrackField::Year));
        assert!(!fields.contains(&TrackField::Genre));
        assert!(!fields.contains(&TrackField::Grouping));
        assert!(fields.contains(&TrackField::Comment));
        assert!(fields.contains(&TrackField::DiscCount));
    }
}

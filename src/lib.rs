pub mod assembler;
pub mod catalog;
pub mod config;
pub mod credits;
pub mod discogs;
pub mod error;
pub mod exceptions;
pub mod library;
pub mod matcher;
pub mod names;
pub mod position;
pub mod rate_limiter;
pub mod similarity;
pub mod sync;

pub use assembler::{AssemblerOptions, ReleaseAssembler, TrackRecord};
pub use catalog::{ArtistLookup, Catalog, FetchedRelease};
pub use config::Config;
pub use credits::{CreditResolver, NameCache};
pub use discogs::{parse_discogs_url, DiscogsClient};
pub use error::{Error, Result};
pub use exceptions::NameExceptions;
pub use library::{FieldValue, JsonLibrary, LabelUsage, LocalTrack, MediaLibrary, TrackField};
pub use matcher::{match_tracks, MatchResult};
pub use sync::{apply, group_by_release, ApplySummary, SyncReport, SyncSession};

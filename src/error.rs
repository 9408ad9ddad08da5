//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A catalog position token that is neither numeric, `disc-track` nor a
    /// side letter with an optional number.
    #[error("Malformed track position: {token:?}")]
    MalformedPosition { token: String },

    /// Transport failure that outlived the retry loop.
    #[error("Catalog request to {url} failed after {attempts} attempt(s): {reason}")]
    CatalogFetch {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("Catalog returned HTTP {status} for {url}")]
    CatalogStatus { url: String, status: u16 },

    #[error("Failed to decode catalog response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not resolve contributor {name:?}: {reason}")]
    UnresolvedContributor { name: String, reason: String },

    #[error("No catalog track left to match {track:?}")]
    NoMatchFound { track: String },

    #[error("Invalid exceptions file {path}: {message}")]
    Exceptions { path: PathBuf, message: String },

    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("Library error: {0}")]
    Library(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn malformed_position(token: &str) -> Self {
        Error::MalformedPosition {
            token: token.to_string(),
        }
    }
}

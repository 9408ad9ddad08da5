use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::assembler::AssemblerOptions;
use crate::error::Result;

pub const DEFAULT_USER_AGENT: &str = "discotag/0.1 +https://www.discogs.com/developers";

/// Unauthenticated Discogs limit is 25 req/min.
pub const DEFAULT_REQUEST_INTERVAL_MS: u64 = 2500;

pub const DEFAULT_RETRY_WAIT_SECS: u64 = 10;

/// User settings, every key optional. Missing keys fall back to the defaults
/// exposed by the accessor methods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_interval_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_wait_secs: Option<u64>,

    /// Give up on a catalog request after this many attempts. Unset retries
    /// until the request goes through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fetch_attempts: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceptions_file: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefer_anv: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub featuring_roles: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer_roles: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub composer_exclude_roles: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub producer_genres: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_genre: Option<bool>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$HOME/.config/discotag/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("discotag")
                .join("config.toml")
        })
    }

    /// Load from `explicit` when given, else from the first of
    /// `./discotag.toml` and [`Config::default_path`] that exists. No file at
    /// all yields an empty config.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        let candidates = std::iter::once(PathBuf::from("discotag.toml")).chain(Self::default_path());
        for path in candidates {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::new())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(path, toml_string)?;
        Ok(())
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms.unwrap_or(DEFAULT_REQUEST_INTERVAL_MS))
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_secs.unwrap_or(DEFAULT_RETRY_WAIT_SECS))
    }

    /// Assembly options with this config's overrides applied.
    pub fn assembler_options(&self) -> AssemblerOptions {
        let mut options = AssemblerOptions::default();
        if let Some(prefer_anv) = self.prefer_anv {
            options.prefer_anv = prefer_anv;
        }
        if let Some(roles) = &self.featuring_roles {
            options.featuring_roles = roles.clone();
        }
        if let Some(roles) = &self.composer_roles {
            options.composer_roles = roles.clone();
        }
        if let Some(roles) = &self.composer_exclude_roles {
            options.composer_exclude_roles = roles.clone();
        }
        if let Some(genres) = &self.producer_genres {
            options.producer_genres = genres.clone();
        }
        if let Some(release_genre) = self.release_genre {
            options.release_genre = release_genre;
        }
        options
    }

    /// Print the settings that are set, in a human-readable format.
    pub fn print(&self, title: &str) {
        println!("{}:", title);

        if let Some(user_agent) = &self.user_agent {
            println!("  User agent:         {}", user_agent);
        }
        if let Some(interval) = self.request_interval_ms {
            println!("  Request interval:   {} ms", interval);
        }
        if let Some(wait) = self.retry_wait_secs {
            println!("  Retry wait:         {} seconds", wait);
        }
        if let Some(attempts) = self.max_fetch_attempts {
            println!("  Max fetch attempts: {}", attempts);
        }
        if let Some(path) = &self.exceptions_file {
            println!("  Exceptions file:    {}", path.display());
        }
        if let Some(prefer_anv) = self.prefer_anv {
            println!("  Name variations:    {}", if prefer_anv { "preferred" } else { "ignored" });
        }
        if let Some(roles) = &self.featuring_roles {
            println!("  Featuring roles:    {}", roles.join(", "));
        }
        if let Some(roles) = &self.composer_roles {
            println!("  Composer roles:     {}", roles.join(", "));
        }
        if let Some(roles) = &self.composer_exclude_roles {
            println!("  Excluded roles:     {}", roles.join(", "));
        }
        if let Some(genres) = &self.producer_genres {
            println!("  Producer genres:    {}", genres.join(", "));
        }
        if let Some(release_genre) = self.release_genre {
            println!("  Release genre:      {}", if release_genre { "written" } else { "left alone" });
        }
    }
}

//! Real-name override table.
//!
//! Plain text, one override per two lines: the real name as the catalog
//! spells it, then the name to use instead. Lines starting with `#` and blank
//! lines are ignored.
//!
//! ```text
//! # Daft Punk
//! Guillaume Emmanuel de Homem-Christo
//! Guy-Manuel de Homem-Christo
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct NameExceptions {
    overrides: HashMap<String, String>,
}

impl NameExceptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the table from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let table = Self::parse(&content).map_err(|message| Error::Exceptions {
            path: path.to_path_buf(),
            message,
        })?;
        debug!("Loaded {} real-name exception(s) from {}", table.len(), path.display());
        Ok(table)
    }

    /// Parse the two-lines-per-entry format.
    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let lines: Vec<&str> = content
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .collect();

        if lines.len() % 2 != 0 {
            return Err(format!(
                "expected name/override line pairs, found {} line(s)",
                lines.len()
            ));
        }

        let overrides = lines
            .chunks(2)
            .map(|pair| (pair[0].trim().to_string(), pair[1].trim().to_string()))
            .collect();
        Ok(NameExceptions { overrides })
    }

    pub fn insert(&mut self, name: &str, replacement: &str) {
        self.overrides.insert(name.to_string(), replacement.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.overrides.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}

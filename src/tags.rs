//! Coinbase Tag Dictionary
//!
//! Loads the known mining-pool tags from a JSON file of the form
//! `{"coinbase_tags": {"<tag>": {"name": "...", "link": "..."}}}`.
//! Entry order is the order of the file, which is also the order the matcher
//! tries tags in.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Top-level key holding the tag map
pub const TAGS_KEY: &str = "coinbase_tags";

/// Errors that can occur while loading the tag dictionary
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read tag file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Tag file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Tag file has no top-level \"coinbase_tags\" key")]
    MissingKey,

    #[error("\"coinbase_tags\" must be an object mapping tags to pools")]
    NotAnObject,

    #[error("Invalid entry for tag {tag:?}: {source}")]
    InvalidEntry {
        tag: String,
        #[source]
        source: serde_json::Error,
    },
}

/// One known pool signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagEntry {
    /// Substring searched for in the decoded script
    pub tag: String,
    /// Pool display name
    pub name: String,
    /// Pool website
    pub link: String,
}

#[derive(Deserialize)]
struct TagFields {
    name: String,
    #[serde(default)]
    link: String,
}

/// Immutable, ordered tag lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDictionary {
    entries: Vec<TagEntry>,
}

impl TagDictionary {
    /// Build a dictionary from entries already in match order
    pub fn from_entries(entries: Vec<TagEntry>) -> Self {
        Self { entries }
    }

    /// Load the dictionary from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let dictionary = Self::from_json(&contents)?;
        info!("Loaded {} coinbase tags from {}", dictionary.len(), path.display());
        Ok(dictionary)
    }

    /// Parse the dictionary from JSON text
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let root: Value = serde_json::from_str(json)?;
        let tags = root.get(TAGS_KEY).ok_or(ConfigError::MissingKey)?;
        let tags = tags.as_object().ok_or(ConfigError::NotAnObject)?;

        let mut entries = Vec::with_capacity(tags.len());
        for (tag, fields) in tags {
            // An empty tag is a substring of everything
            if tag.is_empty() {
                warn!("Ignoring empty coinbase tag");
                continue;
            }
            let fields: TagFields =
                serde_json::from_value(fields.clone()).map_err(|source| ConfigError::InvalidEntry {
                    tag: tag.clone(),
                    source,
                })?;
            entries.push(TagEntry {
                tag: tag.clone(),
                name: fields.name,
                link: fields.link,
            });
        }

        Ok(Self { entries })
    }

    /// Entries in match order
    pub fn iter(&self) -> impl Iterator<Item = &TagEntry> {
        self.entries.iter()
    }

    /// Look up an entry by its exact tag
    pub fn get(&self, tag: &str) -> Option<&TagEntry> {
        self.entries.iter().find(|e| e.tag == tag)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

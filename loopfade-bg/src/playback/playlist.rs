//! Cyclic playlist of media references

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Opaque handle to a playable media item (a file path for OBS media sources)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaReference(String);

impl MediaReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaReference {
    fn from(path: &str) -> Self {
        Self(path.to_string())
    }
}

impl From<String> for MediaReference {
    fn from(path: String) -> Self {
        Self(path)
    }
}

/// Immutable, non-empty, cyclically indexed sequence of media
///
/// The same reference may appear at several indices; only positions matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    items: Vec<MediaReference>,
}

impl Playlist {
    /// Build a playlist, rejecting an empty sequence
    pub fn new(items: Vec<MediaReference>) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::Config(
                "playlist must contain at least one media reference".to_string(),
            ));
        }
        Ok(Self { items })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a constructed playlist
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Resolve a cyclic index: `items[index mod len]`
    pub fn get(&self, index: usize) -> &MediaReference {
        &self.items[index % self.items.len()]
    }

    /// Next cyclic index after `current` and the media it resolves to
    pub fn next(&self, current: usize) -> (usize, &MediaReference) {
        let next_index = (current % self.items.len() + 1) % self.items.len();
        (next_index, &self.items[next_index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &MediaReference> {
        self.items.iter()
    }
}

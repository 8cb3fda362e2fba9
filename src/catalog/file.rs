// A catalog read from a local JSON file: an array of tracks in the same shape
// the app stores saved tracks in (id, title, artist, albumArt, preview).
//
// The file is re-read on every call so edits show up without a restart.

use std::fs;
use std::path::PathBuf;

use tracing::debug;

use super::Catalog;
use crate::error::{DeckError, Result};
use crate::player::Track;

const TRENDING_LIMIT: usize = 10;

pub struct FileCatalog {
    path: PathBuf,
}

impl FileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileCatalog { path: path.into() }
    }

    fn load(&self) -> Result<Vec<Track>> {
        let text = fs::read_to_string(&self.path).map_err(|e| {
            DeckError::Catalog(format!("failed to read {}: {}", self.path.display(), e))
        })?;
        let tracks: Vec<Track> = serde_json::from_str(&text)?;
        debug!(path = %self.path.display(), count = tracks.len(), "catalog loaded");
        Ok(tracks)
    }
}

impl Catalog for FileCatalog {
    fn search(&self, query: &str) -> Result<Vec<Track>> {
        Ok(filter_tracks(&self.load()?, query))
    }

    fn trending(&self) -> Result<Vec<Track>> {
        let mut tracks = self.load()?;
        tracks.truncate(TRENDING_LIMIT);
        Ok(tracks)
    }
}

// Case-insensitive match on title or artist. A blank query matches nothing.
pub(crate) fn filter_tracks(tracks: &[Track], query: &str) -> Vec<Track> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    tracks
        .iter()
        .filter(|track| {
            track.title.to_lowercase().contains(&needle)
                || track.artist.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

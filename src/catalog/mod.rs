// Catalog collaborator: where tracks come from.
//
// The app only needs two calls, search and trending. Any catalog can fail;
// the app never shows an error list for that, it falls back to a fixed demo
// set of five tracks (no previews, so they shelve fine but cannot play).

pub mod demo;
pub mod file;

use tracing::warn;

use crate::error::Result;
use crate::player::Track;

pub use demo::{demo_tracks, DemoCatalog};
pub use file::FileCatalog;

pub trait Catalog: Send + Sync {
    fn search(&self, query: &str) -> Result<Vec<Track>>;
    fn trending(&self) -> Result<Vec<Track>>;
}

/// Search results, or the demo set if the catalog errors.
pub fn search_or_demo(catalog: &dyn Catalog, query: &str) -> Vec<Track> {
    match catalog.search(query) {
        Ok(tracks) => tracks,
        Err(e) => {
            warn!(query, "catalog search failed, using demo tracks: {}", e);
            demo_tracks()
        }
    }
}

/// Trending tracks; the demo set if the catalog errors or has nothing.
pub fn trending_or_demo(catalog: &dyn Catalog) -> Vec<Track> {
    match catalog.trending() {
        Ok(tracks) if !tracks.is_empty() => tracks,
        Ok(_) => {
            warn!("catalog has no trending tracks, using demo tracks");
            demo_tracks()
        }
        Err(e) => {
            warn!("catalog trending failed, using demo tracks: {}", e);
            demo_tracks()
        }
    }
}

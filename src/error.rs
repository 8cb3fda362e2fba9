// Error types shared by the player, catalog and config modules.
//
// Transport no-ops (nothing loaded, end of the shelf) are NOT errors and never
// show up here. Playback failures travel as engine events instead of Results,
// so the only places these surface are setup, persistence and the catalog.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeckError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Audio decode failed: {0}")]
    Decode(String),

    #[error("No audio output device available")]
    NoOutputDevice,

    #[error("Track '{0}' has no preview to play")]
    UnplayableTrack(String),

    #[error("Catalog error: {0}")]
    Catalog(String),
}

pub type Result<T> = std::result::Result<T, DeckError>;

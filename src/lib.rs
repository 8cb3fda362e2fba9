// cassette-deck: a terminal player for short catalog previews.
//
// A small shelf of cassettes, a saved playlist, and a transport that plays
// ~30 second previews. The playback core lives in `player`, everything else
// is the plumbing around it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod notice;
pub mod player;
pub mod ui;

pub use error::{DeckError, Result};

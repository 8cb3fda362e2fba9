// Playback core: tracks, the cassette shelf, the saved set, the preview
// engine contract with its rodio implementation, and the controller tying
// them together.

pub mod audio;
pub mod controller;
pub mod engine;
pub mod queue;
pub mod saved;
pub mod track;

pub use audio::RodioEngine;
pub use controller::PlaybackController;
pub use engine::{EngineEvent, EngineEventKind, EngineState, Generation, PreviewEngine};
pub use queue::{Direction, Shelf, SHELF_CAPACITY};
pub use saved::SavedTracks;
pub use track::Track;

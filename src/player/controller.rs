// ==========================================
// PLAYBACK CONTROLLER
// ==========================================
// The single authority for "what is playing and what do the transport
// buttons do". It owns:
// - the shelf (the only queue the transport moves over)
// - the current track and the track bound to the player surface
// - the play/pause intent and the volume
// - the engine, which it is the only one to command
//
// Two ways of changing track, deliberately kept apart:
// - select_track(): clicking a cassette. Same cassette again is a play/pause
//   gesture, a different one is "swap and start".
// - previous()/next(): always start the neighbour, whatever the prior state.
//
// Every command sent to the engine gets a fresh Generation. Engine events
// carrying an older one are stale (a play() that resolved after the user
// paused or switched) and are dropped in handle_event().

use tracing::{debug, info, warn};

use super::engine::{
    clamp_position, clamp_volume, EngineEvent, EngineEventKind, Generation, PreviewEngine,
};
use super::queue::{Direction, Shelf};
use super::track::Track;
use crate::error::DeckError;

/// How the current track was changed, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackChange {
    Select,
    Navigate(Direction),
}

pub struct PlaybackController<E: PreviewEngine> {
    engine: E,
    shelf: Shelf,
    current: Option<Track>,
    selected: Option<Track>,
    is_playing: bool,
    volume: f32,
    generation: Generation,
    // Id of the track whose preview is bound to the engine.
    loaded: Option<String>,
    position: f64,
    duration: Option<f64>,
    failure: Option<String>,
}

impl<E: PreviewEngine> PlaybackController<E> {
    pub fn new(mut engine: E, volume: f32) -> Self {
        let volume = clamp_volume(volume);
        engine.set_volume(volume);

        PlaybackController {
            engine,
            shelf: Shelf::new(),
            current: None,
            selected: None,
            is_playing: false,
            volume,
            generation: Generation::default(),
            loaded: None,
            position: 0.0,
            duration: None,
            failure: None,
        }
    }

    // ==========================================
    // SHELF
    // ==========================================
    // Adding never changes what is playing, even if the current track is the
    // one evicted. Returns the evicted track.
    pub fn add_to_shelf(&mut self, track: Track) -> Option<Track> {
        let evicted = self.shelf.add(track);
        if let Some(evicted) = &evicted {
            debug!(id = %evicted.id, "evicted from shelf");
        }
        evicted
    }

    // ==========================================
    // TRANSPORT: select_track()
    // ==========================================
    // Same id as the current track: toggle play/pause, never restart.
    // Different id: make it current and start it from the top.
    pub fn select_track(&mut self, track: &Track) {
        let same = self
            .current
            .as_ref()
            .is_some_and(|current| current.id == track.id);

        if same {
            self.toggle_play_pause();
        } else {
            self.swap_to(track.clone(), TrackChange::Select);
        }
    }

    pub fn toggle_play_pause(&mut self) {
        if self.current.is_none() {
            return;
        }
        if self.is_playing {
            self.pause();
        } else {
            self.resume();
        }
    }

    pub fn previous(&mut self) {
        self.navigate(Direction::Previous);
    }

    pub fn next(&mut self) {
        self.navigate(Direction::Next);
    }

    // Null track or end of the shelf: nothing happens, like pressing "next"
    // at the end of a tape.
    fn navigate(&mut self, direction: Direction) {
        let Some(current) = &self.current else { return };
        let Some(target) = self.shelf.neighbor(&current.id, direction).cloned() else {
            debug!(?direction, "no neighbour on shelf");
            return;
        };
        self.swap_to(target, TrackChange::Navigate(direction));
    }

    fn swap_to(&mut self, track: Track, change: TrackChange) {
        info!(id = %track.id, title = %track.title, ?change, "switching track");
        self.current = Some(track.clone());
        self.selected = Some(track);
        self.position = 0.0;
        self.duration = None;
        self.is_playing = true;
        self.start_current(true);
    }

    fn pause(&mut self) {
        self.is_playing = false;
        let generation = self.bump_generation();
        self.engine.pause(generation);
    }

    fn resume(&mut self) {
        self.is_playing = true;
        let needs_load = match (&self.current, &self.loaded) {
            (Some(current), Some(loaded)) => &current.id != loaded,
            _ => true,
        };
        self.start_current(needs_load);
    }

    // Loads (if asked) and plays the current track's preview under a new
    // generation. Tracks without a preview fail straight away.
    fn start_current(&mut self, load: bool) {
        let Some(track) = self.current.clone() else { return };
        let generation = self.bump_generation();

        let Some(uri) = track.preview_uri() else {
            // Whatever the engine still has bound must go quiet.
            self.engine.pause(generation);
            self.fail(DeckError::UnplayableTrack(track.id.clone()).to_string());
            return;
        };

        if load {
            self.engine.load(uri, generation);
            self.loaded = Some(track.id.clone());
        }
        self.engine.play(generation);
    }

    fn bump_generation(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.generation
    }

    fn fail(&mut self, message: String) {
        warn!("playback failed: {}", message);
        self.is_playing = false;
        self.failure = Some(message);
    }

    // ==========================================
    // SETTINGS
    // ==========================================
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_volume(volume);
        self.engine.set_volume(self.volume);
    }

    pub fn seek(&mut self, seconds: f64) {
        if self.current.is_none() {
            return;
        }
        self.position = clamp_position(seconds, self.duration);
        self.engine.seek(self.position);
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.engine.set_looping(looping);
    }

    // ==========================================
    // ENGINE EVENTS: handle_event()
    // ==========================================
    // Returns false when the event was stale and ignored.
    //
    // ended stops playback. There is no auto-advance: previews are snippets,
    // moving on is the listener's call.
    pub fn handle_event(&mut self, event: EngineEvent) -> bool {
        if event.generation != self.generation {
            debug!(
                stale = event.generation.value(),
                current = self.generation.value(),
                "dropping stale engine event"
            );
            return false;
        }

        match event.kind {
            EngineEventKind::Started => self.is_playing = true,
            EngineEventKind::Paused => self.is_playing = false,
            EngineEventKind::Ended => {
                debug!("preview ended");
                self.is_playing = false;
                self.position = 0.0;
            }
            EngineEventKind::TimeUpdate(seconds) => self.position = seconds,
            EngineEventKind::DurationKnown(seconds) => self.duration = Some(seconds),
            EngineEventKind::PlaybackFailed(message) => self.fail(message),
        }
        true
    }

    /// Engine hook for the host loop, see [`PreviewEngine::tick`].
    pub fn tick(&mut self) {
        self.engine.tick();
    }

    // Hands the latest playback failure to whoever shows notices.
    pub fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }

    // ==========================================
    // INSPECTION
    // ==========================================
    pub fn current_track(&self) -> Option<&Track> {
        self.current.as_ref()
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.selected.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn shelf(&self) -> &Shelf {
        &self.shelf
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

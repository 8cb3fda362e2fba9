// Shared test helpers: tracks and a recording engine.

#![allow(dead_code)]

use cassette_deck::player::engine::{EventSender, PreviewEngine};
use cassette_deck::player::{EngineEvent, EngineEventKind, EngineState, Generation, Track};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Load(String, Generation),
    Play(Generation),
    Pause(Generation),
    Volume(f32),
    Seek(f64),
    Looping(bool),
}

// Follows the Idle/Ready/Playing machine and records every command. With an
// event sender attached it answers play/pause right away, like an engine
// whose fetches always succeed instantly.
#[derive(Default)]
pub struct FakeEngine {
    pub commands: Vec<Command>,
    pub state: Option<EngineState>,
    pub reject_play: bool,
    events: Option<EventSender>,
}

impl FakeEngine {
    pub fn new() -> Self {
        FakeEngine::default()
    }

    pub fn with_events(events: EventSender) -> Self {
        FakeEngine {
            events: Some(events),
            ..FakeEngine::default()
        }
    }

    pub fn loads(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                Command::Load(uri, _) => Some(uri.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<&Command> {
        self.commands.last()
    }

    fn emit(&self, generation: Generation, kind: EngineEventKind) {
        if let Some(events) = &self.events {
            events.send(EngineEvent::new(generation, kind)).unwrap();
        }
    }
}

impl PreviewEngine for FakeEngine {
    fn load(&mut self, uri: &str, generation: Generation) {
        if uri.is_empty() {
            return;
        }
        self.commands.push(Command::Load(uri.to_string(), generation));
        self.state = Some(EngineState::Ready);
    }

    fn play(&mut self, generation: Generation) {
        self.commands.push(Command::Play(generation));
        if self.reject_play || self.state.is_none() {
            self.emit(generation, EngineEventKind::PlaybackFailed("autoplay blocked".into()));
            return;
        }
        self.state = Some(EngineState::Playing);
        self.emit(generation, EngineEventKind::Started);
    }

    fn pause(&mut self, generation: Generation) {
        self.commands.push(Command::Pause(generation));
        if self.state.is_some() {
            self.state = Some(EngineState::Ready);
        }
        self.emit(generation, EngineEventKind::Paused);
    }

    fn set_volume(&mut self, volume: f32) {
        self.commands.push(Command::Volume(volume));
    }

    fn seek(&mut self, seconds: f64) {
        self.commands.push(Command::Seek(seconds));
    }

    fn set_looping(&mut self, looping: bool) {
        self.commands.push(Command::Looping(looping));
    }

    fn state(&self) -> EngineState {
        self.state.unwrap_or(EngineState::Idle)
    }
}

pub fn track(id: &str) -> Track {
    Track::new(id, format!("Title {}", id), "Artist").with_preview(format!("https://previews.test/{}.m4a", id))
}

pub fn silent_track(id: &str) -> Track {
    Track::new(id, format!("Title {}", id), "Artist")
}

//! Preview engine contract.
//!
//! An engine owns exactly one playable preview at a time and exposes a small
//! transport surface. Commands are fire-and-forget: whatever actually happens
//! (the preview starts, fails, ends) is reported back as an [`EngineEvent`]
//! over a channel, tagged with the [`Generation`] of the command it belongs
//! to. The controller drops events from generations it has moved past.
//!
//! Engine states:
//!
//! ```text
//! Idle --load--> Ready --play ok--> Playing --pause--> Ready
//!                  ^                    |
//!                  +------ ended -------+
//! ```
//!
//! `load` while Playing goes straight to Ready and does not emit `Ended`.

use tokio::sync::mpsc;

/// Monotonic id for one load/play/pause attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn new(value: u64) -> Self {
        Generation(value)
    }

    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No source bound.
    Idle,
    /// Source bound, not playing.
    Ready,
    Playing,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    Started,
    Paused,
    /// Reached the end of the preview. Never sent while looping.
    Ended,
    TimeUpdate(f64),
    DurationKnown(f64),
    /// `play()` was rejected: no output device, fetch or decode failure.
    PlaybackFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub generation: Generation,
    pub kind: EngineEventKind,
}

impl EngineEvent {
    pub fn new(generation: Generation, kind: EngineEventKind) -> Self {
        EngineEvent { generation, kind }
    }
}

pub type EventSender = mpsc::UnboundedSender<EngineEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Transport surface the playback controller drives.
///
/// Every command that can change what is audible carries the generation the
/// controller assigned to it. Engines must tag the events caused by a command
/// with that generation, and keep tagging later events (time updates, end of
/// stream) with the most recent generation they were given.
pub trait PreviewEngine {
    /// Binds a new source, discarding the old one. Empty `uri` is a no-op.
    fn load(&mut self, uri: &str, generation: Generation);

    /// Starts or resumes playback. Answers with `Started` or `PlaybackFailed`.
    fn play(&mut self, generation: Generation);

    /// Halts playback and keeps the position. Answers with `Paused`.
    fn pause(&mut self, generation: Generation);

    /// Takes effect immediately; never touches the play state.
    fn set_volume(&mut self, volume: f32);

    /// Moves the playhead, clamped to `[0, duration]`.
    fn seek(&mut self, seconds: f64);

    /// When on, previews restart at the end instead of emitting `Ended`.
    fn set_looping(&mut self, looping: bool);

    fn state(&self) -> EngineState;

    /// Called by the host loop on every pass; lets polling engines report
    /// time updates and end of stream.
    fn tick(&mut self) {}
}

pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

// Unknown duration only clamps from below.
pub fn clamp_position(seconds: f64, duration: Option<f64>) -> f64 {
    let seconds = if seconds.is_nan() { 0.0 } else { seconds.max(0.0) };
    match duration {
        Some(duration) if duration.is_finite() && duration > 0.0 => seconds.min(duration),
        _ => seconds,
    }
}

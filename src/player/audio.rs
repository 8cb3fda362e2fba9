// ==========================================
// PREVIEW AUDIO ENGINE (rodio)
// ==========================================
// Plays catalog previews through rodio. It handles:
// - Connecting to the default audio output device
// - Fetching the preview over HTTP and decoding it
// - Play / pause / seek / volume / looping
// - Reporting started, paused, ended, time and duration events
//
// Key Concept: Sink
// A rodio Sink is a queue of decoded sources plus the play/pause/volume
// controls for that queue. We keep exactly one preview in it at a time.
//
// Fetching happens on a tokio task so the UI loop never waits on the network.
// By the time a fetch finishes the user may have paused or switched tracks,
// so the task compares its generation with `latest` before touching the sink
// and simply gives up when it is stale.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rodio::{Decoder, OutputStream, Sink, Source};
use tracing::{debug, info, warn};

use super::engine::{
    clamp_position, clamp_volume, EngineEvent, EngineEventKind, EngineState, EventSender,
    Generation, PreviewEngine,
};
use crate::error::{DeckError, Result};

// Downloaded preview, shared between the engine and fetch tasks.
#[derive(Clone)]
struct PreviewBytes(Arc<Vec<u8>>);

impl AsRef<[u8]> for PreviewBytes {
    fn as_ref(&self) -> &[u8] {
        self.0.as_slice()
    }
}

// ==========================================
// PLAYHEAD
// ==========================================
// Everything a fetch task needs to update once the audio is in the sink.
//
// Rodio doesn't report position, so we keep it ourselves:
// - offset: seconds played before `started_at`
// - started_at: Some while audible
//
// queued is true while a decoded source sits in the sink (playing or paused).
// sink.empty() lags behind sink.stop(), so we can't ask the sink.
// looping is how the queued source was built, not the current preference.
struct Playhead {
    state: EngineState,
    queued: bool,
    looping: bool,
    uri: Option<String>,
    audio: Option<PreviewBytes>,
    duration: Option<f64>,
    offset: f64,
    started_at: Option<Instant>,
}

impl Playhead {
    fn new() -> Self {
        Playhead {
            state: EngineState::Idle,
            queued: false,
            looping: false,
            uri: None,
            audio: None,
            duration: None,
            offset: 0.0,
            started_at: None,
        }
    }

    fn position(&self) -> f64 {
        let elapsed = self
            .started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let position = self.offset + elapsed;
        match self.duration {
            Some(duration) if self.looping && duration > 0.0 => position % duration,
            _ => position,
        }
    }

    fn freeze(&mut self) {
        self.offset = self.position();
        self.started_at = None;
    }

    // Puts `audio` into the sink from the current offset and starts it.
    fn start(&mut self, sink: &Sink, audio: PreviewBytes, looping: bool) -> Result<()> {
        let duration = append_preview(sink, audio, self.offset, looping)?;
        sink.play();
        if duration.is_some() {
            self.duration = duration;
        }
        self.state = EngineState::Playing;
        self.queued = true;
        self.looping = looping;
        self.started_at = Some(Instant::now());
        Ok(())
    }

    fn rewind(&mut self) {
        self.state = EngineState::Ready;
        self.queued = false;
        self.offset = 0.0;
        self.started_at = None;
    }
}

pub struct RodioEngine {
    // Note: We don't store OutputStream, it is leaked in new() so audio keeps
    // working for the whole program.
    sink: Option<Arc<Sink>>,
    http: reqwest::Client,
    events: EventSender,
    latest: Arc<AtomicU64>,
    playhead: Arc<Mutex<Playhead>>,
    looping: Arc<AtomicBool>,
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        if let Some(sink) = &self.sink {
            sink.stop();
        }
    }
}

impl RodioEngine {
    // ==========================================
    // CONSTRUCTOR: new()
    // ==========================================
    // Opens the default output device. On a machine without one (headless
    // server, CI) the engine still works as a state machine, it just answers
    // every play() with PlaybackFailed.
    pub fn new(events: EventSender) -> Self {
        let sink = match Self::open_output() {
            Ok(sink) => Some(sink),
            Err(e) => {
                warn!("audio output unavailable: {}", e);
                None
            }
        };
        Self::with_output(sink, reqwest::Client::new(), events)
    }

    fn with_output(sink: Option<Sink>, http: reqwest::Client, events: EventSender) -> Self {
        RodioEngine {
            sink: sink.map(Arc::new),
            http,
            events,
            latest: Arc::new(AtomicU64::new(0)),
            playhead: Arc::new(Mutex::new(Playhead::new())),
            looping: Arc::new(AtomicBool::new(false)),
        }
    }

    fn open_output() -> Result<Sink> {
        let (stream, handle) = OutputStream::try_default().map_err(|_| DeckError::NoOutputDevice)?;
        let sink = Sink::try_new(&handle).map_err(|_| DeckError::NoOutputDevice)?;
        // Dropping the stream would silence the sink.
        std::mem::forget(stream);
        Ok(sink)
    }

    fn lock_playhead(&self) -> MutexGuard<'_, Playhead> {
        lock(&self.playhead)
    }

    fn current_generation(&self) -> Generation {
        Generation::new(self.latest.load(Ordering::SeqCst))
    }

    fn emit(&self, generation: Generation, kind: EngineEventKind) {
        // Receiver gone means the app is shutting down.
        let _ = self.events.send(EngineEvent::new(generation, kind));
    }

    // ==========================================
    // START: spawn_start()
    // ==========================================
    // Gets audio into the sink and starts it. Reuses the downloaded bytes when
    // we already have them for this uri (resume after seek, replay after end).
    fn spawn_start(&self, generation: Generation, sink: Arc<Sink>) {
        let (uri, cached) = {
            let playhead = self.lock_playhead();
            (playhead.uri.clone(), playhead.audio.clone())
        };
        let Some(uri) = uri else {
            self.emit(generation, EngineEventKind::PlaybackFailed("no preview loaded".into()));
            return;
        };

        let http = self.http.clone();
        let events = self.events.clone();
        let latest = Arc::clone(&self.latest);
        let playhead = Arc::clone(&self.playhead);
        let looping = Arc::clone(&self.looping);

        tokio::spawn(async move {
            let audio = match cached {
                Some(audio) => Ok(audio),
                None => fetch_preview(&http, &uri).await,
            };

            let started = {
                // Every command that changes `latest` or the sink holds this
                // lock while doing so, so the check below can't go stale
                // before the append.
                let mut playhead = lock(&playhead);
                if playhead.uri.as_deref() != Some(uri.as_str()) {
                    debug!(generation = generation.value(), "dropping preview for another track");
                    return;
                }
                // Same track: keep the bytes even if this start is stale.
                if let Ok(audio) = &audio {
                    playhead.audio = Some(audio.clone());
                }
                if latest.load(Ordering::SeqCst) != generation.value() {
                    debug!(generation = generation.value(), "dropping stale preview start");
                    return;
                }
                let looping = looping.load(Ordering::SeqCst);
                audio
                    .and_then(|audio| playhead.start(&sink, audio, looping))
                    .map(|()| playhead.duration)
            };

            let kinds = match started {
                Ok(duration) => {
                    info!(%uri, "preview started");
                    let mut kinds = Vec::new();
                    if let Some(duration) = duration {
                        kinds.push(EngineEventKind::DurationKnown(duration));
                    }
                    kinds.push(EngineEventKind::Started);
                    kinds
                }
                Err(e) => {
                    warn!(%uri, "preview failed: {}", e);
                    vec![EngineEventKind::PlaybackFailed(e.to_string())]
                }
            };
            for kind in kinds {
                let _ = events.send(EngineEvent::new(generation, kind));
            }
        });
    }

    // Replaces the sink content with a fresh decode from the stored offset.
    // Used by seek and looping changes while audible; rodio 0.17 cannot
    // seek, so we decode again and skip ahead.
    fn restart_from_offset(&self, playhead: &mut Playhead) -> Result<()> {
        let (Some(sink), Some(audio)) = (&self.sink, playhead.audio.clone()) else {
            return Ok(());
        };
        sink.stop();
        let looping = self.looping.load(Ordering::SeqCst);
        playhead.start(sink, audio, looping).map_err(|e| {
            playhead.state = EngineState::Ready;
            playhead.queued = false;
            playhead.started_at = None;
            e
        })
    }
}

impl PreviewEngine for RodioEngine {
    fn load(&mut self, uri: &str, generation: Generation) {
        let uri = uri.trim();
        if uri.is_empty() {
            return;
        }

        let mut playhead = self.lock_playhead();
        self.latest.store(generation.value(), Ordering::SeqCst);
        if let Some(sink) = &self.sink {
            sink.stop();
        }
        if playhead.uri.as_deref() != Some(uri) {
            playhead.audio = None;
            playhead.duration = None;
        }
        playhead.uri = Some(uri.to_string());
        playhead.rewind();
        debug!(%uri, generation = generation.value(), "preview loaded");
    }

    fn play(&mut self, generation: Generation) {
        let Some(sink) = self.sink.clone() else {
            self.latest.store(generation.value(), Ordering::SeqCst);
            self.emit(
                generation,
                EngineEventKind::PlaybackFailed(DeckError::NoOutputDevice.to_string()),
            );
            return;
        };

        let state = {
            let mut playhead = self.lock_playhead();
            self.latest.store(generation.value(), Ordering::SeqCst);
            if playhead.state == EngineState::Ready && playhead.queued {
                // Paused mid-preview: the source is still queued.
                sink.play();
                playhead.state = EngineState::Playing;
                playhead.started_at = Some(Instant::now());
                self.emit(generation, EngineEventKind::Started);
                return;
            }
            playhead.state
        };
        match state {
            EngineState::Idle => {
                self.emit(generation, EngineEventKind::PlaybackFailed("no preview loaded".into()));
            }
            EngineState::Playing => self.emit(generation, EngineEventKind::Started),
            EngineState::Ready => self.spawn_start(generation, sink),
        }
    }

    fn pause(&mut self, generation: Generation) {
        {
            let mut playhead = self.lock_playhead();
            self.latest.store(generation.value(), Ordering::SeqCst);
            if let Some(sink) = &self.sink {
                sink.pause();
            }
            if playhead.state == EngineState::Playing {
                playhead.freeze();
                playhead.state = EngineState::Ready;
            }
        }
        self.emit(generation, EngineEventKind::Paused);
    }

    fn set_volume(&mut self, volume: f32) {
        if let Some(sink) = &self.sink {
            sink.set_volume(clamp_volume(volume));
        }
    }

    fn seek(&mut self, seconds: f64) {
        let mut playhead = self.lock_playhead();
        if playhead.state == EngineState::Idle {
            return;
        }
        playhead.freeze();
        playhead.offset = clamp_position(seconds, playhead.duration);

        if playhead.state == EngineState::Playing {
            if let Err(e) = self.restart_from_offset(&mut playhead) {
                warn!("seek failed: {}", e);
                drop(playhead);
                self.emit(self.current_generation(), EngineEventKind::PlaybackFailed(e.to_string()));
            }
        } else {
            // Next play() re-decodes from the new offset.
            playhead.queued = false;
            if let Some(sink) = &self.sink {
                sink.stop();
            }
        }
    }

    // An audible preview is rebuilt in the new mode from where it is. A paused
    // one is dropped from the sink and rebuilt on the next play().
    fn set_looping(&mut self, looping: bool) {
        let mut playhead = self.lock_playhead();
        self.looping.store(looping, Ordering::SeqCst);
        if !playhead.queued || playhead.looping == looping {
            return;
        }
        playhead.freeze();
        if playhead.state == EngineState::Playing {
            if let Err(e) = self.restart_from_offset(&mut playhead) {
                warn!("looping change failed: {}", e);
                drop(playhead);
                self.emit(self.current_generation(), EngineEventKind::PlaybackFailed(e.to_string()));
            }
        } else {
            playhead.queued = false;
            if let Some(sink) = &self.sink {
                sink.stop();
            }
        }
    }

    fn state(&self) -> EngineState {
        self.lock_playhead().state
    }

    // ==========================================
    // POLLING: tick()
    // ==========================================
    // Rodio has no end-of-stream callback, so the host loop calls this on
    // every pass. An empty sink while we believe we're Playing a one-shot
    // source means the preview ran out.
    fn tick(&mut self) {
        let Some(sink) = &self.sink else { return };
        let generation = self.current_generation();

        let kind = {
            let mut playhead = self.lock_playhead();
            if playhead.state != EngineState::Playing {
                return;
            }
            if sink.empty() && !playhead.looping {
                playhead.rewind();
                EngineEventKind::Ended
            } else {
                EngineEventKind::TimeUpdate(playhead.position())
            }
        };
        self.emit(generation, kind);
    }
}

fn lock(playhead: &Mutex<Playhead>) -> MutexGuard<'_, Playhead> {
    playhead.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

async fn fetch_preview(http: &reqwest::Client, uri: &str) -> Result<PreviewBytes> {
    debug!(%uri, "fetching preview");
    let bytes = http.get(uri).send().await?.error_for_status()?.bytes().await?;
    Ok(PreviewBytes(Arc::new(bytes.to_vec())))
}

// Decodes the preview and queues it on the sink, skipping `offset` seconds.
// Returns the decoded duration when the format reports one.
fn append_preview(sink: &Sink, audio: PreviewBytes, offset: f64, looping: bool) -> Result<Option<f64>> {
    let decoder = Decoder::new(Cursor::new(audio))
        .map_err(|e| DeckError::Decode(e.to_string()))?;
    let duration = decoder.total_duration().map(|d| d.as_secs_f64());
    let skip = Duration::from_secs_f64(offset.max(0.0));

    if looping {
        sink.append(decoder.buffered().repeat_infinite().skip_duration(skip));
    } else {
        sink.append(decoder.skip_duration(skip));
    }
    Ok(duration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::engine::{event_channel, EventReceiver};
    use rodio::queue::SourcesQueueOutput;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::mpsc::error::TryRecvError;

    const RATE: u32 = 8000;

    type Output = SourcesQueueOutput<f32>;

    // Engine on an idle sink: nothing plays until the test pulls samples
    // from the returned output, the way a device callback would.
    fn engine() -> (RodioEngine, EventReceiver, Output) {
        let (sink, output) = Sink::new_idle();
        let (tx, rx) = event_channel();
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        (RodioEngine::with_output(Some(sink), http, tx), rx, output)
    }

    // 16-bit mono PCM
    fn wav(millis: u32) -> PreviewBytes {
        let samples = RATE * millis / 1000;
        let data_len = samples * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&RATE.to_le_bytes());
        bytes.extend_from_slice(&(RATE * 2).to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for i in 0..samples {
            let sample = ((i % 40) as i16 - 20) * 800;
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        PreviewBytes(Arc::new(bytes))
    }

    fn load_cached(engine: &mut RodioEngine, uri: &str, generation: u64, audio: PreviewBytes) {
        engine.load(uri, Generation::new(generation));
        engine.lock_playhead().audio = Some(audio);
    }

    fn drain(output: &mut Output, samples: usize) {
        for _ in 0..samples {
            output.next();
        }
    }

    // Runs `f` while another thread keeps pulling samples. Needed whenever
    // the engine replaces audio that is still in the sink.
    fn while_draining<T>(output: &mut Output, f: impl FnOnce() -> T) -> T {
        let done = AtomicBool::new(false);
        std::thread::scope(|scope| {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    output.next();
                }
            });
            let result = f();
            done.store(true, Ordering::SeqCst);
            result
        })
    }

    async fn next_kind(rx: &mut EventReceiver) -> (u64, EngineEventKind) {
        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for an engine event")
            .expect("engine channel closed");
        (event.generation.value(), event.kind)
    }

    // Waits past DurationKnown for Started.
    async fn started(rx: &mut EventReceiver) -> u64 {
        loop {
            match next_kind(rx).await {
                (generation, EngineEventKind::Started) => return generation,
                (_, EngineEventKind::DurationKnown(_)) => continue,
                (_, other) => panic!("expected Started, got {:?}", other),
            }
        }
    }

    // One-route HTTP server counting requests.
    async fn serve(body: PreviewBytes) -> (String, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut request = [0u8; 2048];
                let _ = socket.read(&mut request).await;
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: audio/wav\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.0.len()
                );
                let _ = socket.write_all(header.as_bytes()).await;
                let _ = socket.write_all(&body.0).await;
                let _ = socket.shutdown().await;
            }
        });
        (format!("http://{}/preview.wav", addr), hits)
    }

    #[tokio::test]
    async fn load_makes_engine_ready() {
        let (mut engine, mut rx, _output) = engine();
        assert_eq!(engine.state(), EngineState::Idle);

        engine.load("  ", Generation::new(1));
        assert_eq!(engine.state(), EngineState::Idle);

        engine.load("mem://a", Generation::new(1));
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn play_without_a_source_fails() {
        let (mut engine, mut rx, _output) = engine();
        engine.play(Generation::new(3));
        let (generation, kind) = next_kind(&mut rx).await;
        assert_eq!(generation, 3);
        assert!(matches!(kind, EngineEventKind::PlaybackFailed(_)));
    }

    #[tokio::test]
    async fn play_without_an_output_device_fails() {
        let (tx, mut rx) = event_channel();
        let mut engine = RodioEngine::with_output(None, reqwest::Client::new(), tx);
        engine.load("mem://a", Generation::new(1));
        engine.play(Generation::new(1));
        assert!(matches!(next_kind(&mut rx).await.1, EngineEventKind::PlaybackFailed(_)));
    }

    #[tokio::test]
    async fn play_reports_duration_then_started() {
        let (mut engine, mut rx, _output) = engine();
        load_cached(&mut engine, "mem://a", 1, wav(250));
        engine.play(Generation::new(1));

        match next_kind(&mut rx).await {
            (1, EngineEventKind::DurationKnown(duration)) => assert!((duration - 0.25).abs() < 0.01),
            other => panic!("expected DurationKnown, got {:?}", other),
        }
        assert_eq!(next_kind(&mut rx).await, (1, EngineEventKind::Started));
        assert_eq!(engine.state(), EngineState::Playing);
    }

    #[tokio::test]
    async fn undecodable_preview_fails_and_stays_ready() {
        let (mut engine, mut rx, _output) = engine();
        load_cached(&mut engine, "mem://a", 1, PreviewBytes(Arc::new(b"not audio".to_vec())));
        engine.play(Generation::new(1));

        assert!(matches!(next_kind(&mut rx).await.1, EngineEventKind::PlaybackFailed(_)));
        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[tokio::test]
    async fn pause_keeps_position_and_resume_continues() {
        let (mut engine, mut rx, _output) = engine();
        load_cached(&mut engine, "mem://a", 1, wav(2000));
        engine.play(Generation::new(1));
        started(&mut rx).await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        engine.pause(Generation::new(2));
        assert_eq!(next_kind(&mut rx).await, (2, EngineEventKind::Paused));
        assert_eq!(engine.state(), EngineState::Ready);

        let paused_at = engine.lock_playhead().position();
        assert!(paused_at >= 0.04);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(engine.lock_playhead().position(), paused_at);

        // Still queued, so resuming doesn't go back to the start.
        engine.play(Generation::new(3));
        assert_eq!(next_kind(&mut rx).await, (3, EngineEventKind::Started));
        assert!(engine.lock_playhead().position() >= paused_at);
    }

    #[tokio::test]
    async fn load_while_playing_goes_ready_without_ended() {
        let (mut engine, mut rx, mut output) = engine();
        load_cached(&mut engine, "mem://a", 1, wav(2000));
        engine.play(Generation::new(1));
        started(&mut rx).await;

        engine.load("mem://b", Generation::new(2));
        assert_eq!(engine.state(), EngineState::Ready);
        drain(&mut output, 4000);
        engine.tick();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn running_out_ends_and_rewinds() {
        let (mut engine, mut rx, mut output) = engine();
        load_cached(&mut engine, "mem://a", 1, wav(250));
        engine.play(Generation::new(1));
        started(&mut rx).await;

        drain(&mut output, 20_000);
        engine.tick();
        assert_eq!(next_kind(&mut rx).await, (1, EngineEventKind::Ended));
        assert_eq!(engine.state(), EngineState::Ready);
        assert_eq!(engine.lock_playhead().offset, 0.0);
    }

    #[tokio::test]
    async fn seek_is_clamped_to_the_preview() {
        let (mut engine, mut rx, _output) = engine();
        engine.seek(4.0);
        assert_eq!(engine.lock_playhead().offset, 0.0);

        load_cached(&mut engine, "mem://a", 1, wav(250));
        // Duration unknown yet: only the lower bound applies.
        engine.seek(7.0);
        assert_eq!(engine.lock_playhead().offset, 7.0);
        engine.seek(0.0);

        engine.play(Generation::new(1));
        started(&mut rx).await;
        engine.pause(Generation::new(2));

        engine.seek(10.0);
        assert!((engine.lock_playhead().offset - 0.25).abs() < 0.01);
        engine.seek(-3.0);
        assert_eq!(engine.lock_playhead().offset, 0.0);
    }

    #[tokio::test]
    async fn looping_turned_on_mid_preview_keeps_it_going() {
        let (mut engine, mut rx, mut output) = engine();
        load_cached(&mut engine, "mem://a", 1, wav(250));
        engine.play(Generation::new(1));
        started(&mut rx).await;

        while_draining(&mut output, || engine.set_looping(true));
        drain(&mut output, 20_000);
        engine.tick();

        assert!(matches!(next_kind(&mut rx).await.1, EngineEventKind::TimeUpdate(_)));
        assert_eq!(engine.state(), EngineState::Playing);
        assert!(engine.lock_playhead().looping);
    }

    #[tokio::test]
    async fn looping_turned_off_mid_preview_lets_it_end() {
        let (mut engine, mut rx, mut output) = engine();
        engine.set_looping(true);
        load_cached(&mut engine, "mem://a", 1, wav(250));
        engine.play(Generation::new(1));
        started(&mut rx).await;

        drain(&mut output, 20_000);
        engine.tick();
        assert!(matches!(next_kind(&mut rx).await.1, EngineEventKind::TimeUpdate(_)));

        while_draining(&mut output, || engine.set_looping(false));
        drain(&mut output, 20_000);
        engine.tick();
        assert_eq!(next_kind(&mut rx).await, (1, EngineEventKind::Ended));
    }

    #[tokio::test]
    async fn stale_fetch_is_cached_but_not_played() {
        let (uri, hits) = serve(wav(250)).await;
        let (mut engine, mut rx, _output) = engine();
        engine.load(&uri, Generation::new(1));
        engine.play(Generation::new(1));
        engine.pause(Generation::new(2));
        assert_eq!(next_kind(&mut rx).await, (2, EngineEventKind::Paused));

        tokio::time::timeout(Duration::from_secs(5), async {
            while engine.lock_playhead().audio.is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("fetch never finished");
        assert_eq!(engine.state(), EngineState::Ready);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));

        // Resuming uses the bytes we already have.
        engine.play(Generation::new(3));
        assert_eq!(started(&mut rx).await, 3);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn switching_tracks_during_a_fetch_plays_only_the_new_one() {
        let (uri, hits) = serve(wav(250)).await;
        let (mut engine, mut rx, _output) = engine();
        engine.load(&uri, Generation::new(1));
        engine.play(Generation::new(1));

        load_cached(&mut engine, "mem://b", 2, wav(2000));
        engine.play(Generation::new(2));
        assert_eq!(started(&mut rx).await, 2);

        tokio::time::timeout(Duration::from_secs(5), async {
            while hits.load(Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("first preview never requested");
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        let sink = engine.sink.clone().unwrap();
        assert_eq!(sink.len(), 1);
        assert_eq!(engine.lock_playhead().uri.as_deref(), Some("mem://b"));
    }
}

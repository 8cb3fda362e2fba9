// Main TUI application using ratatui
// Handles the terminal interface, user input, and display.
//
// This is the presentation layer: it renders the search results, the
// cassette shelf, the saved playlist and the player, and turns keys into
// controller commands. It also owns the things the controller doesn't:
// the saved set, preferences, notices and the catalog.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, List, ListItem, Paragraph},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::catalog::{search_or_demo, trending_or_demo, Catalog};
use crate::config::{ColorPreset, PersistedState, Store};
use crate::notice::{NoticeLevel, Notices};
use crate::player::engine::EventReceiver;
use crate::player::{PlaybackController, PreviewEngine, SavedTracks, Track};

const VOLUME_STEP: f32 = 0.05;
const SEEK_STEP: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AppMode {
    Normal,
    Searching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Results,
    Shelf,
    Playlist,
}

impl Panel {
    fn next(self) -> Panel {
        match self {
            Panel::Results => Panel::Shelf,
            Panel::Shelf => Panel::Playlist,
            Panel::Playlist => Panel::Results,
        }
    }
}

pub struct MusicPlayerApp<E: PreviewEngine> {
    controller: PlaybackController<E>,
    engine_rx: EventReceiver,
    catalog: Arc<dyn Catalog>,
    store: Option<Store>,
    state: PersistedState,
    notices: Notices,
    search_results: Vec<Track>,
    search_query: String,
    search_rx: mpsc::UnboundedReceiver<Vec<Track>>,
    search_tx: mpsc::UnboundedSender<Vec<Track>>,
    is_searching: bool,
    mode: AppMode,
    focus: Panel,
    selected_result: usize,
    selected_shelf: usize,
    selected_saved: usize,
    should_quit: bool,
}

impl<E: PreviewEngine> MusicPlayerApp<E> {
    // `store` is None when nothing should be written to disk (tests).
    pub fn new(
        engine: E,
        engine_rx: EventReceiver,
        catalog: Arc<dyn Catalog>,
        store: Option<Store>,
        state: PersistedState,
    ) -> Self {
        let (search_tx, search_rx) = mpsc::unbounded_channel();
        let mut controller = PlaybackController::new(engine, state.volume);
        controller.set_looping(state.loop_previews);

        MusicPlayerApp {
            controller,
            engine_rx,
            catalog,
            store,
            state,
            notices: Notices::new(),
            search_results: Vec::new(),
            search_query: String::new(),
            search_rx,
            search_tx,
            is_searching: false,
            mode: AppMode::Normal,
            focus: Panel::Results,
            selected_result: 0,
            selected_shelf: 0,
            selected_saved: 0,
            should_quit: false,
        }
    }

    pub fn controller(&self) -> &PlaybackController<E> {
        &self.controller
    }

    pub fn saved_tracks(&self) -> &SavedTracks {
        &self.state.saved_tracks
    }

    pub fn preferences(&self) -> &PersistedState {
        &self.state
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn search_results(&self) -> &[Track] {
        &self.search_results
    }

    pub async fn run(&mut self) -> io::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        self.load_trending();
        let result = self.event_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;
        result
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.draw_ui(f))?;

            if let Ok(results) = self.search_rx.try_recv() {
                self.receive_results(results);
            }

            self.controller.tick();
            self.pump_engine_events();
            self.notices.prune(Utc::now());

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_input(key.code);
                    }
                }
            }

            if self.should_quit {
                return Ok(());
            }
        }
    }

    // Engine events are applied strictly in arrival order, one at a time.
    pub fn pump_engine_events(&mut self) {
        while let Ok(event) = self.engine_rx.try_recv() {
            self.controller.handle_event(event);
        }
        if let Some(failure) = self.controller.take_failure() {
            self.notices
                .push(format!("Playback failed: {}", failure), NoticeLevel::Error);
        }
    }

    // ==========================================
    // INPUT
    // ==========================================
    pub fn handle_input(&mut self, key: KeyCode) {
        match self.mode {
            AppMode::Searching => match key {
                KeyCode::Char(c) => self.search_query.push(c),
                KeyCode::Backspace => {
                    self.search_query.pop();
                }
                KeyCode::Enter => {
                    let query = self.search_query.trim().to_string();
                    if !query.is_empty() {
                        self.perform_search(query);
                    }
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                KeyCode::Esc => {
                    self.mode = AppMode::Normal;
                    self.search_query.clear();
                }
                _ => {}
            },
            AppMode::Normal => match key {
                KeyCode::Char('q') => self.should_quit = true,
                KeyCode::Char('/') => self.mode = AppMode::Searching,
                KeyCode::Tab => self.focus = self.focus.next(),
                KeyCode::Char(' ') => self.controller.toggle_play_pause(),
                KeyCode::Char('n') => self.controller.next(),
                KeyCode::Char('p') => self.controller.previous(),
                KeyCode::Char('s') => self.toggle_save_focused(),
                KeyCode::Char('t') => self.cycle_theme(),
                KeyCode::Char('c') => self.cycle_colors(),
                KeyCode::Char('l') => self.toggle_looping(),
                KeyCode::Up => self.change_volume(VOLUME_STEP),
                KeyCode::Down => self.change_volume(-VOLUME_STEP),
                KeyCode::Right => self.controller.seek(self.controller.position() + SEEK_STEP),
                KeyCode::Left => self.controller.seek(self.controller.position() - SEEK_STEP),
                KeyCode::Char('j') => self.move_selection(1),
                KeyCode::Char('k') => self.move_selection(-1),
                KeyCode::Enter => self.activate_focused(),
                _ => {}
            },
        }
    }

    fn activate_focused(&mut self) {
        match self.focus {
            Panel::Results => {
                if let Some(track) = self.search_results.get(self.selected_result).cloned() {
                    self.add_result_to_shelf(track);
                }
            }
            Panel::Shelf => {
                if let Some(track) = self.controller.shelf().get(self.selected_shelf).cloned() {
                    self.controller.select_track(&track);
                }
            }
            Panel::Playlist => {
                if let Some(track) = self.state.saved_tracks.get(self.selected_saved).cloned() {
                    self.play_saved(&track);
                }
            }
        }
    }

    // ==========================================
    // SEARCH
    // ==========================================
    fn perform_search(&mut self, query: String) {
        self.is_searching = true;
        let catalog = Arc::clone(&self.catalog);
        let tx = self.search_tx.clone();

        tokio::task::spawn_blocking(move || {
            let results = search_or_demo(catalog.as_ref(), &query);
            let _ = tx.send(results);
        });
    }

    fn load_trending(&mut self) {
        self.is_searching = true;
        let catalog = Arc::clone(&self.catalog);
        let tx = self.search_tx.clone();

        tokio::task::spawn_blocking(move || {
            let _ = tx.send(trending_or_demo(catalog.as_ref()));
        });
    }

    pub fn receive_results(&mut self, results: Vec<Track>) {
        self.is_searching = false;
        self.selected_result = 0;
        self.notices
            .push(format!("Found {} tracks", results.len()), NoticeLevel::Info);
        self.search_results = results;
    }

    // ==========================================
    // SHELF / PLAYLIST ACTIONS
    // ==========================================
    // Already on the shelf: just select it. The shelf itself never dedupes.
    pub fn add_result_to_shelf(&mut self, track: Track) {
        if self.controller.shelf().contains(&track.id) {
            self.controller.select_track(&track);
            return;
        }
        if let Some(evicted) = self.controller.add_to_shelf(track.clone()) {
            info!(id = %evicted.id, "shelf full, oldest cassette removed");
        }
        self.notices
            .push(format!("Added '{}' to the shelf", track.title), NoticeLevel::Success);
    }

    // Clicking a playlist entry: play it from the shelf, shelving it first if
    // needed.
    pub fn play_saved(&mut self, track: &Track) {
        let shelved = self.controller.shelf().find(&track.id).cloned();
        match shelved {
            Some(shelved) => self.controller.select_track(&shelved),
            None => {
                self.controller.add_to_shelf(track.clone());
                self.controller.select_track(track);
            }
        }
    }

    pub fn toggle_save(&mut self, track: &Track) {
        let saved = self.state.saved_tracks.toggle(track);
        if self.selected_saved >= self.state.saved_tracks.len() {
            self.selected_saved = self.state.saved_tracks.len().saturating_sub(1);
        }
        let message = if saved {
            format!("Saved '{}'", track.title)
        } else {
            format!("Removed '{}' from playlist", track.title)
        };
        self.notices.push(message, NoticeLevel::Success);
        self.persist();
    }

    pub fn is_track_saved(&self, track: &Track) -> bool {
        self.state.saved_tracks.is_saved(&track.id)
    }

    fn toggle_save_focused(&mut self) {
        let track = match self.focus {
            Panel::Results => self.search_results.get(self.selected_result).cloned(),
            Panel::Shelf => self.controller.shelf().get(self.selected_shelf).cloned(),
            Panel::Playlist => self.state.saved_tracks.get(self.selected_saved).cloned(),
        };
        if let Some(track) = track.or_else(|| self.controller.current_track().cloned()) {
            self.toggle_save(&track);
        }
    }

    // ==========================================
    // PREFERENCES
    // ==========================================
    pub fn change_volume(&mut self, delta: f32) {
        self.controller.set_volume(self.controller.volume() + delta);
        self.state.volume = self.controller.volume();
        self.persist();
    }

    pub fn cycle_theme(&mut self) {
        self.state.theme = self.state.theme.next();
        self.notices.push(
            format!("Theme: {}", self.state.theme.display_name()),
            NoticeLevel::Info,
        );
        self.persist();
    }

    // Custom colors from the stored file start over at the first preset.
    pub fn cycle_colors(&mut self) {
        let preset = ColorPreset::after(&self.state.player_color, &self.state.accent_color);
        self.state.player_color = preset.player.to_string();
        self.state.accent_color = preset.accent.to_string();
        self.notices
            .push(format!("Colors: {}", preset.name), NoticeLevel::Info);
        self.persist();
    }

    pub fn toggle_looping(&mut self) {
        self.state.loop_previews = !self.state.loop_previews;
        self.controller.set_looping(self.state.loop_previews);
        let message = if self.state.loop_previews {
            "Looping previews"
        } else {
            "Previews stop at the end"
        };
        self.notices.push(message, NoticeLevel::Info);
        self.persist();
    }

    fn persist(&mut self) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.save(&self.state) {
            warn!("failed to save state: {}", e);
            self.notices
                .push(format!("Could not save settings: {}", e), NoticeLevel::Error);
        }
    }

    fn move_selection(&mut self, delta: isize) {
        let (index, len) = match self.focus {
            Panel::Results => (&mut self.selected_result, self.search_results.len()),
            Panel::Shelf => (&mut self.selected_shelf, self.controller.shelf().len()),
            Panel::Playlist => (&mut self.selected_saved, self.state.saved_tracks.len()),
        };
        if len == 0 {
            *index = 0;
            return;
        }
        *index = (*index as isize + delta).rem_euclid(len as isize) as usize;
    }

    // ==========================================
    // DRAWING
    // ==========================================
    fn draw_ui(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(10),
                Constraint::Length(6),
            ])
            .split(frame.size());

        let accent = parse_hex(&self.state.accent_color).unwrap_or(Color::White);
        let player_color = parse_hex(&self.state.player_color).unwrap_or(Color::Magenta);

        // Header
        let title = if self.mode == AppMode::Searching {
            format!("Search: {}_", self.search_query)
        } else if self.is_searching {
            "Searching... please wait".to_string()
        } else if let Some(notice) = self.notices.latest() {
            notice.message.clone()
        } else {
            "[/]Search [Tab]Panel [Enter]Shelve/Play [Space]Play/Pause [n/p]Next/Prev [s]Save [t]Theme [c]Colors [l]Loop [q]Quit".to_string()
        };
        let header_style = match self.notices.latest().map(|n| n.level) {
            Some(NoticeLevel::Error) if self.mode == AppMode::Normal => Style::default().fg(Color::Red),
            _ => Style::default(),
        };
        let header = Paragraph::new(title)
            .style(header_style)
            .block(Block::default().borders(Borders::ALL).title("Cassette Deck"));
        frame.render_widget(header, chunks[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(40),
                Constraint::Percentage(30),
                Constraint::Percentage(30),
            ])
            .split(chunks[1]);

        let current_id = self.controller.current_track().map(|t| t.id.as_str());

        self.draw_list(
            frame,
            columns[0],
            "Search Results",
            Panel::Results,
            self.search_results.iter(),
            self.selected_result,
            current_id,
            accent,
        );
        self.draw_list(
            frame,
            columns[1],
            "Shelf",
            Panel::Shelf,
            self.controller.shelf().iter(),
            self.selected_shelf,
            current_id,
            accent,
        );
        self.draw_list(
            frame,
            columns[2],
            "Playlist",
            Panel::Playlist,
            self.state.saved_tracks.iter(),
            self.selected_saved,
            current_id,
            accent,
        );

        self.draw_player(frame, chunks[2], player_color);
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_list<'a>(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        panel: Panel,
        tracks: impl Iterator<Item = &'a Track>,
        selected: usize,
        current_id: Option<&str>,
        accent: Color,
    ) {
        let items: Vec<ListItem> = tracks
            .enumerate()
            .map(|(i, track)| {
                let marker = if Some(track.id.as_str()) == current_id { "▶ " } else { "  " };
                let heart = if self.is_track_saved(track) { " ♥" } else { "" };
                let content = format!("{}{} - {}{}", marker, track.title, track.artist, heart);
                let style = if self.focus == panel && i == selected {
                    Style::default().fg(accent).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(content).style(style)
            })
            .collect();

        let border = if self.focus == panel {
            Style::default().fg(accent)
        } else {
            Style::default()
        };
        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title.to_string()),
        );
        frame.render_widget(list, area);
    }

    fn draw_player(&self, frame: &mut Frame, area: Rect, player_color: Color) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Length(2)])
            .split(area);

        let now_playing = match self.controller.selected_track() {
            Some(track) => format!("{} - {}", track.title, track.artist),
            None => "Insert a cassette".to_string(),
        };
        let state = if self.controller.is_playing() { "▶ Playing" } else { "⏸ Paused" };
        let looping = if self.state.loop_previews { " | Loop" } else { "" };
        let info = format!(
            "{}\n{} | Volume: {:.0}%{}",
            now_playing,
            state,
            self.controller.volume() * 100.0,
            looping
        );
        let player = Paragraph::new(info).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(player_color))
                .title(self.state.theme.display_name()),
        );
        frame.render_widget(player, rows[0]);

        let position = self.controller.position();
        let (ratio, label) = match self.controller.duration() {
            Some(duration) if duration > 0.0 => (
                (position / duration).clamp(0.0, 1.0),
                format!("{} / {}", format_time(position), format_time(duration)),
            ),
            _ => (0.0, format_time(position)),
        };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(player_color))
            .ratio(ratio)
            .label(label);
        frame.render_widget(gauge, rows[1]);
    }
}

fn format_time(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u64;
    let secs = (seconds % 60.0) as u64;
    format!("{:02}:{:02}", mins, secs)
}

fn parse_hex(color: &str) -> Option<Color> {
    let digits = color.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(digits.get(range)?, 16).ok();
    Some(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(29.9), "00:29");
        assert_eq!(format_time(125.0), "02:05");
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(parse_hex("#6366f1"), Some(Color::Rgb(0x63, 0x66, 0xf1)));
        assert_eq!(parse_hex("6366f1"), None);
        assert_eq!(parse_hex("#zzzzzz"), None);
    }
}

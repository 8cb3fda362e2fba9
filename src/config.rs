// Persisted preferences and saved tracks.
//
// Everything the app remembers between runs lives in one PersistedState and
// one JSON file (state.json) under fixed keys. Loading never fails on bad
// data: each key that is missing or malformed falls back to its own default
// and the rest of the file is still used.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{DeckError, Result};
use crate::player::engine::clamp_volume;
use crate::player::{SavedTracks, Track};

const APP_DIR: &str = "cassette-deck";
const STATE_FILE: &str = "state.json";
pub const HOME_ENV: &str = "CASSETTE_DECK_HOME";

// Fixed storage keys.
pub const KEY_SAVED_TRACKS: &str = "savedTracks";
pub const KEY_THEME: &str = "playerTheme";
pub const KEY_PLAYER_COLOR: &str = "playerColor";
pub const KEY_ACCENT_COLOR: &str = "accentColor";
pub const KEY_VOLUME: &str = "volume";
pub const KEY_LOOP_PREVIEWS: &str = "loopPreviews";
pub const KEY_CATALOG_PATH: &str = "catalogPath";

pub const DEFAULT_PLAYER_COLOR: &str = COLOR_PRESETS[0].player;
pub const DEFAULT_ACCENT_COLOR: &str = COLOR_PRESETS[0].accent;
pub const DEFAULT_VOLUME: f32 = 0.5;

// ==========================================
// THEME
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Cassette,
    Walkman,
    Radio,
    Speaker,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Cassette, Theme::Walkman, Theme::Radio, Theme::Speaker];

    pub fn id(self) -> &'static str {
        match self {
            Theme::Cassette => "cassette",
            Theme::Walkman => "walkman",
            Theme::Radio => "radio",
            Theme::Speaker => "speaker",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Theme::Cassette => "Cassette Player",
            Theme::Walkman => "Walkman",
            Theme::Radio => "Retro Radio",
            Theme::Speaker => "Modern Speaker",
        }
    }

    pub fn from_id(id: &str) -> Option<Theme> {
        Theme::ALL.into_iter().find(|theme| theme.id() == id)
    }

    // Cycles through the selector order.
    pub fn next(self) -> Theme {
        let index = Theme::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Theme::ALL[(index + 1) % Theme::ALL.len()]
    }
}

// ==========================================
// COLOR PRESETS
// ==========================================
// Named player/accent pairs the colors cycle through. The first one is the
// default pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorPreset {
    pub name: &'static str,
    pub player: &'static str,
    pub accent: &'static str,
}

impl ColorPreset {
    const fn new(name: &'static str, player: &'static str, accent: &'static str) -> Self {
        ColorPreset { name, player, accent }
    }

    /// Preset following the one these colors belong to. Colors that match no
    /// preset start over at the first.
    pub fn after(player: &str, accent: &str) -> &'static ColorPreset {
        let next = COLOR_PRESETS
            .iter()
            .position(|preset| preset.player == player && preset.accent == accent)
            .map_or(0, |index| (index + 1) % COLOR_PRESETS.len());
        &COLOR_PRESETS[next]
    }
}

pub const COLOR_PRESETS: &[ColorPreset] = &[
    ColorPreset::new("Classic Purple", "#6366f1", "#ffffff"),
    ColorPreset::new("Midnight Blue", "#1e3a8a", "#60a5fa"),
    ColorPreset::new("Forest Green", "#064e3b", "#34d399"),
    ColorPreset::new("Dark Rose", "#9f1239", "#fb7185"),
    ColorPreset::new("Ocean", "#0c4a6e", "#38bdf8"),
    ColorPreset::new("Sunset", "#7c2d12", "#fb923c"),
    ColorPreset::new("Autumn", "#92400e", "#f97316"),
    ColorPreset::new("Coffee", "#3f2917", "#a16207"),
    ColorPreset::new("Golden Hour", "#92400e", "#fde68a"),
    ColorPreset::new("Desert Sand", "#78350f", "#fcd34d"),
    ColorPreset::new("Neon", "#4c1d95", "#a78bfa"),
    ColorPreset::new("Electric", "#312e81", "#4ade80"),
    ColorPreset::new("Ice Blue", "#0c4a6e", "#7dd3fc"),
    ColorPreset::new("Northern Lights", "#064e3b", "#67e8f9"),
    ColorPreset::new("Deep Ocean", "#1e3a8a", "#38bdf8"),
    ColorPreset::new("Retro Gold", "#854d0e", "#fbbf24"),
    ColorPreset::new("Vapor Wave", "#86198f", "#22d3ee"),
    ColorPreset::new("Vinyl", "#1f2937", "#9ca3af"),
    ColorPreset::new("Sepia", "#78350f", "#d6d3d1"),
    ColorPreset::new("Old Radio", "#44403c", "#a8a29e"),
    ColorPreset::new("Forest Mist", "#064e3b", "#6ee7b7"),
    ColorPreset::new("Mountain Dawn", "#374151", "#93c5fd"),
    ColorPreset::new("Spring Bloom", "#065f46", "#fcd34d"),
    ColorPreset::new("Ocean Breeze", "#0e7490", "#67e8f9"),
    ColorPreset::new("Twilight", "#312e81", "#818cf8"),
    ColorPreset::new("Matrix", "#064e3b", "#4ade80"),
    ColorPreset::new("Cyberpunk", "#581c87", "#fbbf24"),
    ColorPreset::new("Minimal", "#18181b", "#e4e4e7"),
    ColorPreset::new("Tech Blue", "#1e40af", "#3b82f6"),
    ColorPreset::new("Dark Mode", "#18181b", "#6b7280"),
    ColorPreset::new("Cherry Blossom", "#831843", "#f9a8d4"),
    ColorPreset::new("Lavender", "#5b21b6", "#ddd6fe"),
    ColorPreset::new("Mint", "#065f46", "#a7f3d0"),
    ColorPreset::new("Peach", "#9a3412", "#fed7aa"),
    ColorPreset::new("Baby Blue", "#1e40af", "#bfdbfe"),
    ColorPreset::new("Blood Moon", "#7f1d1d", "#fca5a5"),
    ColorPreset::new("Deep Space", "#020617", "#818cf8"),
    ColorPreset::new("Dark Forest", "#052e16", "#4ade80"),
    ColorPreset::new("Midnight", "#020617", "#6366f1"),
    ColorPreset::new("Shadow", "#18181b", "#52525b"),
    ColorPreset::new("Rose Gold", "#9f1239", "#fda4af"),
    ColorPreset::new("Silver", "#334155", "#cbd5e1"),
    ColorPreset::new("Bronze", "#783f04", "#fbbf24"),
    ColorPreset::new("Chrome", "#1f2937", "#e5e7eb"),
    ColorPreset::new("Platinum", "#0f172a", "#94a3b8"),
];

// ==========================================
// PERSISTED STATE
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct PersistedState {
    pub saved_tracks: SavedTracks,
    pub theme: Theme,
    pub player_color: String,
    pub accent_color: String,
    pub volume: f32,
    pub loop_previews: bool,
    pub catalog_path: Option<PathBuf>,
}

impl Default for PersistedState {
    fn default() -> Self {
        PersistedState {
            saved_tracks: SavedTracks::new(),
            theme: Theme::Cassette,
            player_color: DEFAULT_PLAYER_COLOR.to_string(),
            accent_color: DEFAULT_ACCENT_COLOR.to_string(),
            volume: DEFAULT_VOLUME,
            loop_previews: false,
            catalog_path: None,
        }
    }
}

impl PersistedState {
    // ==========================================
    // REHYDRATE: rehydrate()
    // ==========================================
    // Builds state from the stored document, key by key.
    //
    // - not JSON / not an object: everything is default
    // - a key missing: that key is default
    // - a key present but unusable: that key is default, with a warning
    pub fn rehydrate(text: &str) -> Self {
        let defaults = PersistedState::default();

        let map = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("stored state is not an object, using defaults");
                return defaults;
            }
            Err(e) => {
                warn!("stored state is not valid JSON ({}), using defaults", e);
                return defaults;
            }
        };

        let saved_tracks = field(&map, KEY_SAVED_TRACKS, |value| {
            serde_json::from_value::<Vec<Track>>(value.clone())
                .ok()
                .map(SavedTracks::from_tracks)
        })
        .unwrap_or(defaults.saved_tracks);

        let theme = field(&map, KEY_THEME, |value| value.as_str().and_then(Theme::from_id))
            .unwrap_or(defaults.theme);

        let player_color = field(&map, KEY_PLAYER_COLOR, hex_color).unwrap_or(defaults.player_color);
        let accent_color = field(&map, KEY_ACCENT_COLOR, hex_color).unwrap_or(defaults.accent_color);

        let volume = field(&map, KEY_VOLUME, |value| {
            value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(|v| clamp_volume(v as f32))
        })
        .unwrap_or(defaults.volume);

        let loop_previews =
            field(&map, KEY_LOOP_PREVIEWS, Value::as_bool).unwrap_or(defaults.loop_previews);

        let catalog_path = field(&map, KEY_CATALOG_PATH, |value| {
            value
                .as_str()
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from)
        });

        PersistedState {
            saved_tracks,
            theme,
            player_color,
            accent_color,
            volume,
            loop_previews,
            catalog_path,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        let mut map = Map::new();
        map.insert(KEY_SAVED_TRACKS.into(), serde_json::to_value(&self.saved_tracks)?);
        map.insert(KEY_THEME.into(), Value::from(self.theme.id()));
        map.insert(KEY_PLAYER_COLOR.into(), Value::from(self.player_color.clone()));
        map.insert(KEY_ACCENT_COLOR.into(), Value::from(self.accent_color.clone()));
        map.insert(KEY_VOLUME.into(), Value::from(f64::from(self.volume)));
        map.insert(KEY_LOOP_PREVIEWS.into(), Value::from(self.loop_previews));
        if let Some(path) = &self.catalog_path {
            map.insert(KEY_CATALOG_PATH.into(), Value::from(path.to_string_lossy().into_owned()));
        }
        Ok(serde_json::to_string_pretty(&Value::Object(map))?)
    }
}

// Reads one key. None when the key is absent or `parse` rejects it.
fn field<T>(map: &Map<String, Value>, key: &str, parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let value = map.get(key)?;
    let parsed = parse(value);
    if parsed.is_none() {
        warn!(key, "ignoring malformed stored value");
    }
    parsed
}

// Accepts "#rrggbb" only.
fn hex_color(value: &Value) -> Option<String> {
    let color = value.as_str()?;
    let digits = color.strip_prefix('#')?;
    if digits.len() == 6 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
        Some(color.to_ascii_lowercase())
    } else {
        None
    }
}

// ==========================================
// STORE
// ==========================================
// Owns the location of state.json.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    /// Uses `$CASSETTE_DECK_HOME` if set, else `<config dir>/cassette-deck`.
    pub fn open_default() -> Result<Self> {
        let dir = match std::env::var_os(HOME_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| {
                    DeckError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "could not find config directory",
                    ))
                })?
                .join(APP_DIR),
        };
        Store::open(dir)
    }

    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Store { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    // Missing file is a fresh install, not an error.
    pub fn load(&self) -> PersistedState {
        let path = self.state_path();
        match fs::read_to_string(&path) {
            Ok(text) => PersistedState::rehydrate(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored state yet");
                PersistedState::default()
            }
            Err(e) => {
                warn!(path = %path.display(), "failed to read stored state: {}", e);
                PersistedState::default()
            }
        }
    }

    pub fn save(&self, state: &PersistedState) -> Result<()> {
        let json = state.to_json()?;
        // Write then rename so a crash mid-write keeps the old file.
        let tmp = self.dir.join(format!("{}.tmp", STATE_FILE));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.state_path())?;
        Ok(())
    }
}

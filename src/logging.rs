// Logging setup.
//
// The terminal belongs to the TUI, so log lines go to cassette-deck.log in
// the data directory. Filter with CASSETTE_DECK_LOG (EnvFilter syntax),
// default "info".

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CASSETTE_DECK_LOG";
pub const LOG_FILE: &str = "cassette-deck.log";

// Returns false when the log file can't be opened; the app runs without logs.
pub fn init(dir: &Path) -> bool {
    let file = match OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE))
    {
        Ok(file) => file,
        Err(_) => return false,
    };

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_ok()
}

// Main entry point for the cassette deck
// Loads stored preferences, sets up logging, and hands over to the TUI.

use std::sync::Arc;

use anyhow::Context;
use cassette_deck::catalog::{Catalog, DemoCatalog, FileCatalog};
use cassette_deck::config::Store;
use cassette_deck::logging;
use cassette_deck::player::engine::event_channel;
use cassette_deck::player::RodioEngine;
use cassette_deck::ui::app::MusicPlayerApp;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Suppress ALSA error messages that pollute TUI
    std::env::set_var("ALSA_PCM_NO_MMAP", "1");

    let store = Store::open_default().context("failed to prepare data directory")?;
    logging::init(store.dir());

    let state = store.load();
    info!(theme = state.theme.id(), saved = state.saved_tracks.len(), "starting");

    let catalog: Arc<dyn Catalog> = match &state.catalog_path {
        Some(path) => Arc::new(FileCatalog::new(path)),
        None => Arc::new(DemoCatalog),
    };

    let (events_tx, events_rx) = event_channel();
    let engine = RodioEngine::new(events_tx);

    let mut app = MusicPlayerApp::new(engine, events_rx, catalog, Some(store), state);
    app.run().await.context("terminal UI failed")?;

    Ok(())
}

// Main entry point for the terminal music player
// Wires config, logging, audio output and the remote service together,
// then hands control to the TUI

use std::fs::{self, OpenOptions};
use std::sync::{Arc, Mutex};

use tracing::info;
use tracing_subscriber::EnvFilter;

use tubequeue::catalog::HttpCatalog;
use tubequeue::notify::ChannelNotifier;
use tubequeue::player::{media_channel, Collaborators, RodioBackend, TrackOrchestrator};
use tubequeue::ui::app::MusicPlayerApp;
use tubequeue::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Suppress ALSA error messages that pollute TUI
    // These are non-critical audio buffer warnings from the audio system
    std::env::set_var("ALSA_PCM_NO_MMAP", "1");

    let config = Config::load()?;
    init_logging(&config)?;
    info!(api = %config.api_base_url, "starting");

    // Audio output reports back through this channel
    let (media_tx, media_rx) = media_channel();
    let backend = RodioBackend::new(media_tx)?;

    // One HTTP client serves both search and download
    let service = Arc::new(HttpCatalog::new(&config)?);
    let (notifier, notices) = ChannelNotifier::new();
    let collaborators = Collaborators {
        catalog: service.clone(),
        acquirer: service,
        notifier: Arc::new(notifier),
    };

    let engine = TrackOrchestrator::new(
        Box::new(backend),
        media_rx,
        collaborators,
        config.initial_volume,
    );

    let mut app = MusicPlayerApp::new(engine, notices, &config);
    app.run().await?;

    info!("bye");
    Ok(())
}

// The TUI owns stdout, so logs go to a file. RUST_LOG overrides the
// configured level.
fn init_logging(config: &Config) -> anyhow::Result<()> {
    let Some(path) = config.log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {}", e))?;

    Ok(())
}

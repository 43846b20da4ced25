// Search-and-stream music player engine.
//
// A search fills the queue with catalog entries; picking one downloads
// its audio, binds it to the single audio output and moves the queue
// cursor to it. Next/previous walk the queue, and a track that ends by
// itself advances to the next one.
//
// Layout:
// - player:  queue cursor, payload lifetime, playback state machine,
//            rodio output, and the orchestrator tying them together
// - catalog: search/download collaborators and their HTTP client
// - notify:  user-facing notices
// - ui:      terminal front end

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod player;
pub mod ui;

pub use config::Config;
pub use error::{PlayerError, Result};
pub use notify::{Notice, Notifier};
pub use player::{
    Collaborators, PlaybackStatus, QueueEntry, QueueNavigator, TrackOrchestrator,
};

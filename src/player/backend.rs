// Seam between the playback state machine and the physical audio output.
//
// The backend never changes PlaybackState itself. It reports what the
// output is doing through MediaEvents on a channel, and every event is
// tagged with the handle it is about so events from a track that has
// since been replaced can be told apart and dropped.

use tokio::sync::mpsc;

use crate::error::Result;
use crate::player::resource::{HandleId, ResourceHandle};

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEventKind {
    // The payload is decoded and output can start. Duration is None
    // when the container doesn't say how long it is.
    Ready { duration: Option<f64> },
    // Periodic position report while playing, in seconds
    Position(f64),
    // End of stream reached with no more data
    Ended,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub handle: HandleId,
    pub kind: MediaEventKind,
}

impl MediaEvent {
    pub fn ready(handle: HandleId, duration: Option<f64>) -> Self {
        MediaEvent {
            handle,
            kind: MediaEventKind::Ready { duration },
        }
    }

    pub fn position(handle: HandleId, seconds: f64) -> Self {
        MediaEvent {
            handle,
            kind: MediaEventKind::Position(seconds),
        }
    }

    pub fn ended(handle: HandleId) -> Self {
        MediaEvent {
            handle,
            kind: MediaEventKind::Ended,
        }
    }
}

pub type MediaEventSender = mpsc::UnboundedSender<MediaEvent>;
pub type MediaEventReceiver = mpsc::UnboundedReceiver<MediaEvent>;

pub fn media_channel() -> (MediaEventSender, MediaEventReceiver) {
    mpsc::unbounded_channel()
}

// One physical output. Implementations:
// - RodioBackend (player::audio) for real speakers
// - scripted backends in tests
pub trait AudioBackend {
    // Prepare `handle` for playback, replacing whatever was loaded.
    // Must decode/validate BEFORE touching current output, so an Err
    // leaves the old track audible. Output starts paused; readiness is
    // reported as MediaEventKind::Ready.
    fn load(&mut self, handle: &ResourceHandle) -> Result<()>;

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, handle: &ResourceHandle, seconds: f64);

    // Effective volume, 0.0..=1.0 (already accounts for mute)
    fn set_volume(&mut self, volume: f32);

    // Stop output and drop anything loaded
    fn stop(&mut self);

    // Called regularly by the event loop; backends that have to poll
    // their output for progress/end-of-stream do it here.
    fn tick(&mut self) {}
}

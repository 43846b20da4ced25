pub mod audio;
pub mod backend;
pub mod orchestrator;
pub mod queue;
pub mod resource;
pub mod state;

pub use audio::RodioBackend;
pub use backend::{media_channel, AudioBackend, MediaEvent, MediaEventKind};
pub use orchestrator::{Collaborators, EngineEvent, SelectionId, TrackOrchestrator};
pub use queue::{QueueEntry, QueueNavigator};
pub use resource::{HandleId, ResourceBinding, ResourceHandle, ResourceStats};
pub use state::{PlaybackSignal, PlaybackState, PlaybackStatus};

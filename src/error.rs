// Error types shared by the playback engine and its collaborators.
//
// AcquisitionFailure and SearchFailure are caught by the orchestrator and
// turned into a single user-visible notice. OutOfRange is a caller bug in
// the navigator contract and is only ever logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PlayerError {
    // Fetching the audio payload for a queue entry failed (network, HTTP
    // status, oversized or empty body).
    #[error("could not load '{identifier}': {reason}")]
    Acquisition { identifier: String, reason: String },

    // The catalog search collaborator failed.
    #[error("search failed: {0}")]
    Search(String),

    // Navigator index contract violation.
    #[error("index {index} out of range for queue of {len} entries")]
    OutOfRange { index: usize, len: usize },

    // The payload is not a playable audio stream.
    #[error("audio decode failed: {0}")]
    Decode(String),

    // No audio output device could be opened.
    #[error("audio output unavailable: {0}")]
    Output(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PlayerError {
    pub fn acquisition(identifier: &str, reason: impl Into<String>) -> Self {
        PlayerError::Acquisition {
            identifier: identifier.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlayerError>;

// Presentation sink: fire-and-forget notices for the user.
//
// The engine never waits on, or reads anything back from, a notifier.

use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NowPlaying { title: String },
    PlaybackFailed { reason: String },
    SearchFailed { reason: String },
    NoResults { query: String },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Notice::NowPlaying { title } => write!(f, "Now playing: {}", title),
            Notice::PlaybackFailed { reason } => write!(f, "Playback failed: {}", reason),
            Notice::SearchFailed { reason } => write!(f, "Search failed: {}", reason),
            Notice::NoResults { query } => {
                write!(f, "No results for '{}'. Try different keywords", query)
            }
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

// Writes notices to the log only
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match &notice {
            Notice::NowPlaying { .. } | Notice::NoResults { .. } => info!("{}", notice),
            Notice::PlaybackFailed { .. } | Notice::SearchFailed { .. } => warn!("{}", notice),
        }
    }
}

// Forwards notices to the UI loop (status line)
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelNotifier { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        LogNotifier.notify(notice.clone());
        let _ = self.tx.send(notice);
    }
}

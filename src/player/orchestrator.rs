// ==========================================
// TRACK ORCHESTRATOR
// ==========================================
// Ties everything together:
//
//   user picks entry ─▶ download (async) ─▶ wrap payload ─▶ bind ─▶ move cursor
//
// It handles:
// - Searching, and swapping the queue when results arrive
// - Selecting a track: download, bind, "Now playing"
// - Next / previous, and auto-advance when a track ends
// - Throwing away results nobody is waiting for any more
//
// Key Concept: last selection wins
// - Every selection gets a number from an increasing counter
// - Downloads run in the background and may finish in ANY order
// - When one finishes we compare its number with the newest pending
//   selection. Older? Drop the bytes, touch nothing.
// - Same idea for searches, and for the queue itself: a result that
//   was requested against an older queue generation is stale too.
//
// Nothing here runs in parallel with itself. Background tasks only do
// the network I/O and send their outcome back over a channel; all state
// changes happen in handle_event(), one event at a time.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::catalog::{Acquire, Catalog};
use crate::error::{PlayerError, Result};
use crate::notify::{Notice, Notifier};
use crate::player::backend::{AudioBackend, MediaEvent, MediaEventReceiver};
use crate::player::queue::{QueueEntry, QueueNavigator};
use crate::player::resource::{ResourceBinding, ResourceStats};
use crate::player::state::{PlaybackSignal, PlaybackState};

// Number given to each select_and_play call
pub type SelectionId = u64;

// The remote/presentation pieces the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub catalog: Arc<dyn Catalog>,
    pub acquirer: Arc<dyn Acquire>,
    pub notifier: Arc<dyn Notifier>,
}

// Outcome of a background download
#[derive(Debug)]
pub struct Acquired {
    pub selection: SelectionId,
    pub generation: u64,
    pub entry: QueueEntry,
    pub result: Result<Vec<u8>>,
}

// Outcome of a background search
#[derive(Debug)]
pub struct Searched {
    pub search: u64,
    pub query: String,
    pub result: Result<Vec<QueueEntry>>,
}

#[derive(Debug)]
pub enum EngineEvent {
    Media(MediaEvent),
    Acquired(Acquired),
    Searched(Searched),
}

#[derive(Debug, Clone)]
struct PendingSelection {
    id: SelectionId,
    entry: QueueEntry,
}

pub struct TrackOrchestrator {
    queue: QueueNavigator,
    playback: PlaybackState,
    binding: ResourceBinding,
    collaborators: Collaborators,

    selection_counter: SelectionId,
    pending: Option<PendingSelection>,
    search_counter: u64,
    search_in_flight: bool,
    now_playing: Option<QueueEntry>,
    discarded: u64,

    completions_tx: mpsc::UnboundedSender<EngineEvent>,
    completions_rx: mpsc::UnboundedReceiver<EngineEvent>,
    media_rx: MediaEventReceiver,
}

impl TrackOrchestrator {
    // `media_events` must be the receiving end of the channel the
    // backend was built with.
    pub fn new(
        backend: Box<dyn AudioBackend>,
        media_events: MediaEventReceiver,
        collaborators: Collaborators,
        initial_volume: f32,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        TrackOrchestrator {
            queue: QueueNavigator::new(),
            playback: PlaybackState::new(backend, initial_volume),
            binding: ResourceBinding::new(),
            collaborators,
            selection_counter: 0,
            pending: None,
            search_counter: 0,
            search_in_flight: false,
            now_playing: None,
            discarded: 0,
            completions_tx,
            completions_rx,
            media_rx: media_events,
        }
    }

    // ==========================================
    // SEARCH
    // ==========================================
    // Starts a catalog search in the background. Only the newest
    // search's results are ever installed.
    pub fn search(&mut self, query: &str) -> u64 {
        self.search_counter += 1;
        let search = self.search_counter;
        self.search_in_flight = true;
        let query = query.trim().to_string();
        debug!(search, query = %query, "search issued");

        let catalog = Arc::clone(&self.collaborators.catalog);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = catalog.search(&query).await;
            let _ = tx.send(EngineEvent::Searched(Searched {
                search,
                query,
                result,
            }));
        });

        search
    }

    // Installs a new result set. Audio keeps going, but the cursor is
    // gone: the user has to pick something from the new list. Any
    // pending selection was made against the old list and is dropped.
    pub fn replace_queue(&mut self, entries: Vec<QueueEntry>) {
        self.queue.replace(entries);
        if let Some(pending) = self.pending.take() {
            debug!(selection = pending.id, "pending selection dropped by new results");
        }
    }

    fn on_searched(&mut self, searched: Searched) {
        if searched.search != self.search_counter {
            debug!(search = searched.search, "stale search result discarded");
            return;
        }
        self.search_in_flight = false;

        match searched.result {
            Ok(entries) => {
                if entries.is_empty() {
                    self.notify(Notice::NoResults {
                        query: searched.query.clone(),
                    });
                }
                self.replace_queue(entries);
            }
            Err(e) => {
                warn!(query = %searched.query, error = %e, "search failed");
                self.notify(Notice::SearchFailed {
                    reason: e.to_string(),
                });
            }
        }
    }

    // ==========================================
    // SELECTION: select_and_play()
    // ==========================================
    // 1. Number this selection and remember it as THE pending one
    // 2. Download in the background (see on_acquired for the rest)
    //
    // Returns immediately. Current playback is untouched until the
    // download succeeds.
    pub fn select_and_play(&mut self, entry: QueueEntry) -> SelectionId {
        self.selection_counter += 1;
        let selection = self.selection_counter;
        let generation = self.queue.generation();
        debug!(selection, title = %entry.title, "selection issued");

        self.pending = Some(PendingSelection {
            id: selection,
            entry: entry.clone(),
        });

        let acquirer = Arc::clone(&self.collaborators.acquirer);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = acquirer.fetch(&entry.identifier).await;
            let _ = tx.send(EngineEvent::Acquired(Acquired {
                selection,
                generation,
                entry,
                result,
            }));
        });

        selection
    }

    pub fn select_index(&mut self, index: usize) -> Result<SelectionId> {
        let entry = self.queue.get(index).cloned().ok_or(PlayerError::OutOfRange {
            index,
            len: self.queue.len(),
        })?;
        Ok(self.select_and_play(entry))
    }

    // ==========================================
    // SELECTION: on_acquired()
    // ==========================================
    // A download finished.
    //
    // - Superseded (newer selection, or the queue changed since)?
    //   Drop the bytes. Nothing else changes, nothing is reported.
    // - Failed? Leave playback and cursor as they are, tell the user once.
    // - Succeeded? acquire → bind → move cursor → "Now playing".
    fn on_acquired(&mut self, acquired: Acquired) {
        let is_current = self.pending.as_ref().map(|p| p.id) == Some(acquired.selection)
            && acquired.generation == self.queue.generation();

        if !is_current {
            self.discarded += 1;
            match &acquired.result {
                Ok(payload) => debug!(
                    selection = acquired.selection,
                    bytes = payload.len(),
                    "superseded download discarded"
                ),
                Err(e) => debug!(
                    selection = acquired.selection,
                    error = %e,
                    "superseded download failed"
                ),
            }
            return;
        }
        self.pending = None;

        let payload = match acquired.result {
            Ok(payload) => payload,
            Err(e) => {
                warn!(title = %acquired.entry.title, error = %e, "acquisition failed");
                self.notify(Notice::PlaybackFailed {
                    reason: e.to_string(),
                });
                return;
            }
        };

        let Some(index) = self.queue.index_of(&acquired.entry.identifier) else {
            warn!(title = %acquired.entry.title, "selected entry is not in the queue");
            self.notify(Notice::PlaybackFailed {
                reason: format!("'{}' is no longer in the list", acquired.entry.title),
            });
            return;
        };

        let handle = self.binding.acquire(payload);
        if let Err(e) = self.playback.bind(handle) {
            warn!(title = %acquired.entry.title, error = %e, "payload could not be bound");
            self.notify(Notice::PlaybackFailed {
                reason: e.to_string(),
            });
            return;
        }

        if let Err(e) = self.queue.set_cursor(index) {
            // index_of ran against this very list a moment ago
            error!(error = %e, "cursor out of sync with queue");
        }

        info!(title = %acquired.entry.title, index, "now playing");
        self.notify(Notice::NowPlaying {
            title: acquired.entry.title.clone(),
        });
        self.now_playing = Some(acquired.entry);
    }

    // ==========================================
    // NAVIGATION
    // ==========================================
    // Next/previous are just selections of the neighbouring entry.
    // At either end of the queue they do nothing at all.
    pub fn advance_next(&mut self) -> Option<SelectionId> {
        let index = self.queue.next()?;
        let entry = self.queue.get(index)?.clone();
        Some(self.select_and_play(entry))
    }

    pub fn advance_previous(&mut self) -> Option<SelectionId> {
        let index = self.queue.previous()?;
        let entry = self.queue.get(index)?.clone();
        Some(self.select_and_play(entry))
    }

    // A finished track advances to the next entry, unless the user has
    // already picked something else that is still downloading.
    fn on_media_event(&mut self, event: MediaEvent) {
        let signal = self.playback.handle_media_event(&event);
        if let Some(PlaybackSignal::TrackFinished(handle)) = signal {
            if let Some(pending) = &self.pending {
                debug!(
                    handle = %handle,
                    selection = pending.id,
                    "track finished, selection pending"
                );
            } else if self.queue.has_next() {
                debug!(handle = %handle, "track finished, advancing");
                self.advance_next();
            } else {
                info!(handle = %handle, "end of queue reached");
            }
        }
    }

    // ==========================================
    // EVENT LOOP PLUMBING
    // ==========================================
    // Waits for the next download/search outcome or media report
    pub async fn next_event(&mut self) -> Option<EngineEvent> {
        tokio::select! {
            Some(event) = self.media_rx.recv() => Some(EngineEvent::Media(event)),
            Some(event) = self.completions_rx.recv() => Some(event),
            else => None,
        }
    }

    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Media(event) => self.on_media_event(event),
            EngineEvent::Acquired(acquired) => self.on_acquired(acquired),
            EngineEvent::Searched(searched) => self.on_searched(searched),
        }
    }

    // Waits for and applies exactly one event
    pub async fn step(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => {
                self.handle_event(event);
                true
            }
            None => false,
        }
    }

    // Applies everything that is already waiting, without blocking.
    // Used by the UI loop between redraws.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        loop {
            if let Ok(event) = self.media_rx.try_recv() {
                self.on_media_event(event);
            } else if let Ok(event) = self.completions_rx.try_recv() {
                self.handle_event(event);
            } else {
                return handled;
            }
            handled += 1;
        }
    }

    // Lets the backend poll its output (position, end of stream)
    pub fn tick(&mut self) {
        self.playback.tick();
    }

    // ==========================================
    // PLAYBACK CONTROLS (pass-through)
    // ==========================================
    pub fn toggle_play_pause(&mut self) {
        self.playback.toggle_play_pause();
    }

    pub fn seek(&mut self, seconds: f64) {
        self.playback.seek(seconds);
    }

    pub fn seek_relative(&mut self, delta_seconds: f64) {
        self.playback.seek_relative(delta_seconds);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.playback.set_volume(volume);
    }

    pub fn toggle_mute(&mut self) {
        self.playback.toggle_mute();
    }

    // Stops and releases the current track; a pending download is
    // abandoned (its result will be discarded when it arrives).
    pub fn clear(&mut self) {
        self.pending = None;
        self.now_playing = None;
        self.playback.clear();
    }

    fn notify(&self, notice: Notice) {
        self.collaborators.notifier.notify(notice);
    }

    // ==========================================
    // INSPECTION
    // ==========================================
    pub fn queue(&self) -> &QueueNavigator {
        &self.queue
    }

    pub fn playback(&self) -> &PlaybackState {
        &self.playback
    }

    // Entry whose audio is bound (may no longer be in the queue after
    // a new search)
    pub fn now_playing(&self) -> Option<&QueueEntry> {
        self.now_playing.as_ref()
    }

    pub fn is_searching(&self) -> bool {
        self.search_in_flight
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending_selection(&self) -> Option<&QueueEntry> {
        self.pending.as_ref().map(|p| &p.entry)
    }

    // Downloads that finished after being superseded
    pub fn discarded_count(&self) -> u64 {
        self.discarded
    }

    pub fn resource_stats(&self) -> Arc<ResourceStats> {
        self.binding.stats()
    }
}

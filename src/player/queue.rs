// ==========================================
// QUEUE NAVIGATION MODULE
// ==========================================
// This module owns the list of tracks the user can play and the
// "cursor" that says which one is current.
//
// It handles:
// - Replacing the whole list when a new search comes back
// - Finding an entry by its catalog identifier
// - Answering "is there a next / previous track?"
//
// Key Concept: the queue IS the search result list.
// - Order = search relevance order, never reshuffled
// - Next/previous are just cursor +1 / -1
// - A new search throws the old list away wholesale
//
// Everything here is plain index arithmetic: no I/O, no audio.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PlayerError, Result};

// ==========================================
// QUEUE ENTRY STRUCT
// ==========================================
// One search result that can be played.
//
// Fields explained:
//
// identifier: String
//   - Stable catalog identifier, e.g. "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
//   - This is what we hand to the download service
//   - Also how we find the entry again (index_of)
//
// title: String
//   - Shown in the result list and in "Now playing"
//
// thumbnail: Option<String>
//   - URL of a preview image; the terminal UI doesn't draw it
//     but we keep it so nothing from the catalog is lost
//
// Entries are immutable once the search produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    pub identifier: String,
    pub title: String,
    pub thumbnail: Option<String>,
}

impl QueueEntry {
    pub fn new(identifier: impl Into<String>, title: impl Into<String>) -> Self {
        QueueEntry {
            identifier: identifier.into(),
            title: title.into(),
            thumbnail: None,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }
}

// ==========================================
// QUEUE NAVIGATOR STRUCT
// ==========================================
// Fields explained:
//
// entries: Vec<QueueEntry>
//   - The current result set, in relevance order
//   - Vec is enough: we never push/pop at either end, we only
//     index into it and replace it entirely
//
// cursor: Option<usize>
//   - Index of the current entry, or None when nothing is selected
//   - Invariant: if Some(i), then i < entries.len()
//
// generation: u64
//   - Bumped on every replace()
//   - Anything that captured a cursor or index before a replace can
//     compare generations and know its index is meaningless now
#[derive(Debug, Default)]
pub struct QueueNavigator {
    entries: Vec<QueueEntry>,
    cursor: Option<usize>,
    generation: u64,
}

impl QueueNavigator {
    pub fn new() -> Self {
        QueueNavigator::default()
    }

    // ==========================================
    // REPLACING: replace()
    // ==========================================
    // Installs a brand new list and forgets the cursor.
    //
    // Example:
    // - Before: entries=[A, B, C], cursor=Some(1), generation=3
    // - replace(vec![X, Y])
    // - After:  entries=[X, Y], cursor=None, generation=4
    pub fn replace(&mut self, entries: Vec<QueueEntry>) {
        self.entries = entries;
        self.cursor = None;
        self.generation += 1;
        debug!(
            len = self.entries.len(),
            generation = self.generation,
            "queue replaced"
        );
    }

    // Position of the entry with this identifier, if it is in the list
    pub fn index_of(&self, identifier: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.identifier == identifier)
    }

    // ==========================================
    // CURSOR: set_cursor()
    // ==========================================
    // Points the cursor at `index`.
    //
    // Fails with OutOfRange if the index is past the end. That only
    // happens when a caller holds an index from an older list, so the
    // cursor is left untouched and the caller gets told.
    pub fn set_cursor(&mut self, index: usize) -> Result<()> {
        if index >= self.entries.len() {
            return Err(PlayerError::OutOfRange {
                index,
                len: self.entries.len(),
            });
        }
        self.cursor = Some(index);
        Ok(())
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn has_next(&self) -> bool {
        matches!(self.cursor, Some(i) if i + 1 < self.entries.len())
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.cursor, Some(i) if i > 0)
    }

    // ==========================================
    // NAVIGATION: next() / previous()
    // ==========================================
    // These only COMPUTE the neighbouring index. They do not move the
    // cursor: the cursor moves when the neighbour has actually loaded
    // and started playing (see the orchestrator).
    //
    // Example:
    // - entries=[A, B, C], cursor=Some(1)
    // - next() → Some(2), previous() → Some(0)
    // - entries=[A, B, C], cursor=Some(2)
    // - next() → None
    pub fn next(&self) -> Option<usize> {
        if self.has_next() {
            self.cursor.map(|i| i + 1)
        } else {
            None
        }
    }

    pub fn previous(&self) -> Option<usize> {
        if self.has_previous() {
            self.cursor.map(|i| i - 1)
        } else {
            None
        }
    }

    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|i| self.entries.get(i))
    }

    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

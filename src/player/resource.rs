// ==========================================
// RESOURCE BINDING MODULE
// ==========================================
// Turns a downloaded audio file (raw bytes) into a handle the audio
// backend can play, and makes sure old downloads don't pile up.
//
// Key Concept: one live payload at a time
// - Every track we play is a whole file held in memory
// - Skipping quickly through ten tracks must NOT leave ten files in RAM
// - So each handle is released as soon as its successor is installed
//
// ResourceStats counts acquisitions and releases so that rule can be
// checked (tests look at `live()`; the UI could show it too).

use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

// Identity of one acquired payload. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandleId(u64);

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct ResourceStats {
    acquired: AtomicU64,
    released: AtomicU64,
}

impl ResourceStats {
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    // Payloads acquired and not yet released
    pub fn live(&self) -> u64 {
        self.acquired().saturating_sub(self.released())
    }
}

// ==========================================
// RESOURCE HANDLE STRUCT
// ==========================================
// A playable reference to one payload.
//
// payload: Option<Arc<[u8]>>
//   - Some(bytes) while live, None once released
//   - Arc so the decoder can read from it without copying the file
//
// Releasing twice is fine (second call is a no-op), and dropping a
// handle that was never released releases it.
#[derive(Debug)]
pub struct ResourceHandle {
    id: HandleId,
    payload: Option<Arc<[u8]>>,
    stats: Arc<ResourceStats>,
}

impl ResourceHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    pub fn is_released(&self) -> bool {
        self.payload.is_none()
    }

    pub fn len(&self) -> usize {
        self.payload.as_ref().map_or(0, |p| p.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A fresh seekable reader over the payload, for the decoder.
    // None once the handle has been released.
    pub fn reader(&self) -> Option<Cursor<Arc<[u8]>>> {
        self.payload.as_ref().map(|p| Cursor::new(Arc::clone(p)))
    }

    // Returns true only for the call that actually released the storage
    pub fn release(&mut self) -> bool {
        if self.payload.take().is_some() {
            self.stats.released.fetch_add(1, Ordering::SeqCst);
            trace!(handle = %self.id, "payload released");
            true
        } else {
            false
        }
    }
}

impl Drop for ResourceHandle {
    fn drop(&mut self) {
        self.release();
    }
}

// ==========================================
// RESOURCE BINDING STRUCT
// ==========================================
// Hands out handles with increasing ids and shares one ResourceStats
// between all of them.
#[derive(Debug, Default)]
pub struct ResourceBinding {
    next_id: u64,
    stats: Arc<ResourceStats>,
}

impl ResourceBinding {
    pub fn new() -> Self {
        ResourceBinding::default()
    }

    // Wraps the payload; does not start or decide playback
    pub fn acquire(&mut self, payload: Vec<u8>) -> ResourceHandle {
        self.next_id += 1;
        let id = HandleId(self.next_id);
        self.stats.acquired.fetch_add(1, Ordering::SeqCst);
        trace!(handle = %id, bytes = payload.len(), "payload acquired");

        ResourceHandle {
            id,
            payload: Some(Arc::from(payload)),
            stats: Arc::clone(&self.stats),
        }
    }

    pub fn stats(&self) -> Arc<ResourceStats> {
        Arc::clone(&self.stats)
    }
}

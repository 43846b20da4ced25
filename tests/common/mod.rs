//! Shared test doubles for the engine integration tests
//!
//! - `ScriptedBackend`: records backend calls, reports `Ready` on load
//!   (optionally), rejects payloads starting with 0xFF as undecodable
//! - `GatedAcquirer`: downloads resolve immediately, fail on demand, or
//!   wait on a per-identifier gate so tests control completion order
//! - `StaticCatalog`: canned search results, with optional gates
//! - `RecordingNotifier`: keeps every notice

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

use tubequeue::catalog::{Acquire, Catalog};
use tubequeue::notify::{Notice, Notifier};
use tubequeue::player::backend::MediaEventSender;
use tubequeue::player::{
    media_channel, AudioBackend, Collaborators, HandleId, MediaEvent, QueueEntry,
    ResourceHandle, TrackOrchestrator,
};
use tubequeue::{PlayerError, Result};

pub const TRACK_SECONDS: f64 = 180.0;

// ===== Backend =====

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Load(HandleId),
    Play,
    Pause,
    Seek(HandleId, f64),
    Volume(f32),
    Stop,
}

#[derive(Clone)]
pub struct BackendProbe {
    calls: Arc<Mutex<Vec<BackendCall>>>,
    events: MediaEventSender,
}

impl BackendProbe {
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Load(_)))
            .count()
    }

    pub fn emit(&self, event: MediaEvent) {
        self.events.send(event).unwrap();
    }
}

pub struct ScriptedBackend {
    probe: BackendProbe,
    auto_ready: Option<f64>,
}

impl AudioBackend for ScriptedBackend {
    fn load(&mut self, handle: &ResourceHandle) -> Result<()> {
        use std::io::Read;
        let mut first = [0u8; 1];
        let _ = handle.reader().expect("live handle").read(&mut first);
        if first[0] == 0xFF {
            return Err(PlayerError::Decode("unrecognized format".to_string()));
        }

        self.probe.calls.lock().unwrap().push(BackendCall::Load(handle.id()));
        if let Some(duration) = self.auto_ready {
            self.probe.emit(MediaEvent::ready(handle.id(), Some(duration)));
        }
        Ok(())
    }

    fn play(&mut self) {
        self.probe.calls.lock().unwrap().push(BackendCall::Play);
    }

    fn pause(&mut self) {
        self.probe.calls.lock().unwrap().push(BackendCall::Pause);
    }

    fn seek(&mut self, handle: &ResourceHandle, seconds: f64) {
        self.probe
            .calls
            .lock()
            .unwrap()
            .push(BackendCall::Seek(handle.id(), seconds));
    }

    fn set_volume(&mut self, volume: f32) {
        self.probe.calls.lock().unwrap().push(BackendCall::Volume(volume));
    }

    fn stop(&mut self) {
        self.probe.calls.lock().unwrap().push(BackendCall::Stop);
    }
}

// ===== Acquirer =====

type Gate = oneshot::Receiver<Result<Vec<u8>>>;

#[derive(Default)]
pub struct GatedAcquirer {
    gates: Mutex<HashMap<String, Gate>>,
    failures: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<String>>,
}

impl GatedAcquirer {
    // The next fetch of `identifier` waits until the returned sender fires
    pub fn gate(&self, identifier: &str) -> oneshot::Sender<Result<Vec<u8>>> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(identifier.to_string(), rx);
        tx
    }

    // Every fetch of `identifier` fails (e.g. "service returned 500")
    pub fn fail(&self, identifier: &str, reason: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(identifier.to_string(), reason.to_string());
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, identifier: &str) -> usize {
        self.requests().iter().filter(|r| *r == identifier).count()
    }
}

#[async_trait]
impl Acquire for GatedAcquirer {
    async fn fetch(&self, identifier: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(identifier.to_string());

        let failure = self.failures.lock().unwrap().get(identifier).cloned();
        if let Some(reason) = failure {
            return Err(PlayerError::acquisition(identifier, reason));
        }

        let gate = self.gates.lock().unwrap().remove(identifier);
        match gate {
            Some(gate) => gate
                .await
                .unwrap_or_else(|_| Err(PlayerError::acquisition(identifier, "gate dropped"))),
            None => Ok(payload_for(identifier)),
        }
    }
}

pub fn payload_for(identifier: &str) -> Vec<u8> {
    let mut bytes = b"ID3".to_vec();
    bytes.extend_from_slice(identifier.as_bytes());
    bytes
}

pub fn malformed_payload() -> Vec<u8> {
    vec![0xFF, 0x00, 0x13, 0x37]
}

// ===== Catalog =====

#[derive(Default)]
pub struct StaticCatalog {
    results: Mutex<HashMap<String, Result<Vec<QueueEntry>>>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl StaticCatalog {
    pub fn answer(&self, query: &str, entries: Vec<QueueEntry>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), Ok(entries));
    }

    pub fn fail(&self, query: &str, reason: &str) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), Err(PlayerError::Search(reason.to_string())));
    }

    pub fn gate(&self, query: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(query.to_string(), rx);
        tx
    }
}

#[async_trait]
impl Catalog for StaticCatalog {
    async fn search(&self, query: &str) -> Result<Vec<QueueEntry>> {
        let gate = self.gates.lock().unwrap().remove(query);
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        self.results
            .lock()
            .unwrap()
            .remove(query)
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

// ===== Notifier =====

#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn failures(&self) -> usize {
        self.notices()
            .iter()
            .filter(|n| matches!(n, Notice::PlaybackFailed { .. }))
            .count()
    }

    pub fn now_playing_titles(&self) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter_map(|n| match n {
                Notice::NowPlaying { title } => Some(title),
                _ => None,
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

// ===== Harness =====

pub struct Harness {
    pub engine: TrackOrchestrator,
    pub backend: BackendProbe,
    pub acquirer: Arc<GatedAcquirer>,
    pub catalog: Arc<StaticCatalog>,
    pub notifier: Arc<RecordingNotifier>,
}

// Backend reports Ready with a known duration as soon as it loads
pub fn harness() -> Harness {
    build(Some(TRACK_SECONDS))
}

// Backend never reports Ready by itself; tests emit it
pub fn manual_harness() -> Harness {
    build(None)
}

fn build(auto_ready: Option<f64>) -> Harness {
    let (tx, rx) = media_channel();
    let probe = BackendProbe {
        calls: Arc::new(Mutex::new(Vec::new())),
        events: tx,
    };
    let backend = ScriptedBackend {
        probe: probe.clone(),
        auto_ready,
    };

    let acquirer = Arc::new(GatedAcquirer::default());
    let catalog = Arc::new(StaticCatalog::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let collaborators = Collaborators {
        catalog: catalog.clone(),
        acquirer: acquirer.clone(),
        notifier: notifier.clone(),
    };

    Harness {
        engine: TrackOrchestrator::new(Box::new(backend), rx, collaborators, 1.0),
        backend: probe,
        acquirer,
        catalog,
        notifier,
    }
}

impl Harness {
    // Applies events until nothing arrives for a short while
    pub async fn settle(&mut self) {
        while let Ok(Some(event)) =
            tokio::time::timeout(Duration::from_millis(50), self.engine.next_event()).await
        {
            self.engine.handle_event(event);
        }
    }

    // Selects entry `index` and lets the download and readiness land
    pub async fn play_index(&mut self, index: usize) {
        self.engine.select_index(index).unwrap();
        self.settle().await;
    }

    pub fn bound(&self) -> HandleId {
        self.engine
            .playback()
            .bound_handle()
            .expect("a track should be bound")
    }
}

pub fn entries(n: usize) -> Vec<QueueEntry> {
    (0..n)
        .map(|i| {
            QueueEntry::new(format!("https://www.youtube.com/watch?v=T{}", i), format!("T{}", i))
                .with_thumbnail(format!("https://i.ytimg.com/vi/T{}/hqdefault.jpg", i))
        })
        .collect()
}

pub fn id(i: usize) -> String {
    format!("https://www.youtube.com/watch?v=T{}", i)
}

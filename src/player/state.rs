// ==========================================
// PLAYBACK STATE MACHINE
// ==========================================
// Tracks what the single active track is doing: loading, playing,
// paused; where it is; how loud it is.
//
//   Empty ──bind──▶ Loading ──Ready──▶ Playing ⇄ Paused
//                                         │
//                                       Ended ──▶ Paused (at the end)
//
//   bind() from any state → Loading
//   clear() from any state → Empty
//
// The audio backend does the actual work; this struct decides WHEN
// to ask it, and keeps the numbers the UI shows. The backend talks
// back through MediaEvents, which arrive here via handle_media_event().
// Events for a handle that is no longer bound are ignored.

use tracing::{debug, trace};

use crate::error::Result;
use crate::player::backend::{AudioBackend, MediaEvent, MediaEventKind};
use crate::player::resource::{HandleId, ResourceHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Empty,   // Nothing bound
    Loading, // Bound, waiting for the backend to say it's ready
    Playing,
    Paused,
}

// Things the orchestrator needs to react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackSignal {
    // The bound track reached its natural end
    TrackFinished(HandleId),
}

// ==========================================
// PLAYBACK STATE STRUCT
// ==========================================
// Fields explained:
//
// bound: Option<ResourceHandle>
//   - The one live payload. PlaybackState is its only owner.
//
// position / duration: seconds
//   - duration is None until the backend reports it (or forever, for
//     containers that don't carry a length)
//
// volume / muted
//   - volume is remembered while muted; what the backend gets is
//     effective_volume() = if muted { 0 } else { volume }
//
// play_on_ready: bool
//   - What the user wants once loading finishes. Toggling play/pause
//     during Loading flips this instead of the status.
//
// finished: bool
//   - Set by natural completion; pressing play afterwards restarts
//     the track from the beginning
pub struct PlaybackState {
    backend: Box<dyn AudioBackend>,
    status: PlaybackStatus,
    position: f64,
    duration: Option<f64>,
    volume: f32,
    muted: bool,
    bound: Option<ResourceHandle>,
    play_on_ready: bool,
    finished: bool,
}

impl PlaybackState {
    pub fn new(backend: Box<dyn AudioBackend>, initial_volume: f32) -> Self {
        let mut state = PlaybackState {
            backend,
            status: PlaybackStatus::Empty,
            position: 0.0,
            duration: None,
            volume: clamp_volume(initial_volume),
            muted: false,
            bound: None,
            play_on_ready: true,
            finished: false,
        };
        state.push_volume();
        state
    }

    // ==========================================
    // BINDING: bind()
    // ==========================================
    // Installs a new payload and starts loading it.
    //
    // Order matters:
    // 1. backend.load(new) — if the payload doesn't decode we bail out
    //    here, the old track keeps playing and the new handle is
    //    released (dropped) on the way out
    // 2. swap new in, THEN release the old one — never a moment with
    //    nothing bound, never two payloads left behind
    // 3. status = Loading until the backend's Ready event arrives
    pub fn bind(&mut self, handle: ResourceHandle) -> Result<()> {
        self.backend.load(&handle)?;

        let id = handle.id();
        if let Some(mut previous) = self.bound.replace(handle) {
            previous.release();
            trace!(previous = %previous.id(), "previous payload retired");
        }

        self.status = PlaybackStatus::Loading;
        self.position = 0.0;
        self.duration = None;
        self.play_on_ready = true;
        self.finished = false;
        self.push_volume();

        debug!(handle = %id, "bound, loading");
        Ok(())
    }

    // ==========================================
    // EVENTS: handle_media_event()
    // ==========================================
    // Applies one report from the backend.
    //
    // Ready    → Loading becomes Playing (or Paused if the user
    //            toggled while loading), duration gets filled in
    // Position → position update, only while Playing
    // Ended    → natural completion
    pub fn handle_media_event(&mut self, event: &MediaEvent) -> Option<PlaybackSignal> {
        if self.bound_handle() != Some(event.handle) {
            trace!(handle = %event.handle, "stale media event ignored");
            return None;
        }

        match event.kind {
            MediaEventKind::Ready { duration } => {
                self.duration = duration.filter(|d| d.is_finite() && *d >= 0.0);
                if self.status == PlaybackStatus::Loading {
                    if self.play_on_ready {
                        self.backend.play();
                        self.status = PlaybackStatus::Playing;
                    } else {
                        self.status = PlaybackStatus::Paused;
                    }
                    debug!(
                        handle = %event.handle,
                        duration = ?self.duration,
                        status = ?self.status,
                        "ready"
                    );
                }
                None
            }
            MediaEventKind::Position(seconds) => {
                if self.status == PlaybackStatus::Playing && seconds.is_finite() {
                    self.position = self.clamp_position(seconds);
                }
                None
            }
            MediaEventKind::Ended => self.on_natural_completion(),
        }
    }

    // ==========================================
    // COMPLETION: on_natural_completion()
    // ==========================================
    // The track ran out of data by itself (not a user stop).
    // Status goes to Paused, position parks at the end and the
    // orchestrator gets TrackFinished so it can auto-advance.
    //
    // Only counts while Playing: an end-of-stream during Loading or
    // after the user paused is not a real completion.
    pub fn on_natural_completion(&mut self) -> Option<PlaybackSignal> {
        if self.status != PlaybackStatus::Playing {
            return None;
        }
        let handle = self.bound_handle()?;

        // Unknown-length streams: now we know how long they were
        let end = self.duration.unwrap_or(self.position);
        self.duration = Some(end);
        self.position = end;
        self.status = PlaybackStatus::Paused;
        self.finished = true;

        debug!(handle = %handle, "track finished");
        Some(PlaybackSignal::TrackFinished(handle))
    }

    // ==========================================
    // PLAYBACK CONTROL: toggle_play_pause()
    // ==========================================
    // - Empty   → nothing to do
    // - Loading → remember the opposite intent for when loading ends
    // - Playing → pause, keep position
    // - Paused  → resume from position (from 0 if the track had ended)
    pub fn toggle_play_pause(&mut self) {
        match self.status {
            PlaybackStatus::Empty => {}
            PlaybackStatus::Loading => {
                self.play_on_ready = !self.play_on_ready;
            }
            PlaybackStatus::Playing => {
                self.backend.pause();
                self.status = PlaybackStatus::Paused;
            }
            PlaybackStatus::Paused => {
                if self.finished {
                    self.restart();
                }
                self.backend.play();
                self.status = PlaybackStatus::Playing;
            }
        }
    }

    fn restart(&mut self) {
        self.finished = false;
        self.position = 0.0;
        if let Some(handle) = &self.bound {
            self.backend.seek(handle, 0.0);
        }
    }

    // ==========================================
    // SEEKING: seek()
    // ==========================================
    // Optimistic: position changes immediately, the backend catches up.
    // Target is clamped to [0, duration] (or just >= 0 while the
    // duration is unknown).
    pub fn seek(&mut self, target_seconds: f64) {
        if self.status == PlaybackStatus::Empty || !target_seconds.is_finite() {
            return;
        }

        let target = self.clamp_position(target_seconds);
        self.position = target;
        if self.finished && self.duration.map_or(true, |d| target < d) {
            self.finished = false;
        }
        if let Some(handle) = &self.bound {
            self.backend.seek(handle, target);
        }
    }

    pub fn seek_relative(&mut self, delta_seconds: f64) {
        self.seek(self.position + delta_seconds);
    }

    // ==========================================
    // VOLUME CONTROL
    // ==========================================
    // Any explicit volume change unmutes: if the user drags the volume
    // up they expect to hear something.
    pub fn set_volume(&mut self, volume: f32) {
        if volume.is_nan() {
            return;
        }
        self.volume = clamp_volume(volume);
        self.muted = false;
        self.push_volume();
    }

    // Flips mute; the stored volume is kept for unmuting
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
        self.push_volume();
    }

    // Stops output and releases the bound payload. Volume and mute survive.
    pub fn clear(&mut self) {
        self.backend.stop();
        if let Some(mut handle) = self.bound.take() {
            handle.release();
        }
        self.status = PlaybackStatus::Empty;
        self.position = 0.0;
        self.duration = None;
        self.play_on_ready = true;
        self.finished = false;
        debug!("playback cleared");
    }

    pub fn tick(&mut self) {
        self.backend.tick();
    }

    fn push_volume(&mut self) {
        let effective = self.effective_volume();
        self.backend.set_volume(effective);
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        match self.duration {
            Some(duration) => seconds.clamp(0.0, duration),
            None => seconds.max(0.0),
        }
    }

    // ==========================================
    // PLAYBACK INFO
    // ==========================================
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    pub fn bound_handle(&self) -> Option<HandleId> {
        self.bound.as_ref().map(|h| h.id())
    }

    // Whether playback will start once the current load finishes
    pub fn play_on_ready(&self) -> bool {
        self.play_on_ready
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl Drop for PlaybackState {
    fn drop(&mut self) {
        self.clear();
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_finite() {
        volume.clamp(0.0, 1.0)
    } else {
        1.0
    }
}

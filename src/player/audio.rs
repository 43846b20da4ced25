// ==========================================
// RODIO AUDIO BACKEND
// ==========================================
// The real speakers. Implements AudioBackend on top of rodio.
//
// It handles:
// - Connecting to the default audio output device
// - Decoding an in-memory payload (MP3, M4A/AAC, FLAC, Vorbis, WAV)
// - Play / pause / seek / volume on the Sink
// - Tracking playback position (rodio doesn't tell us)
// - Noticing when a track has run out of samples
//
// Key Concept: Rodio's "Sink" is a queue of audio sources feeding
// one output. We only ever put ONE source in it: the current track.

use rodio::{Decoder, OutputStream, Sink, Source};
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{PlayerError, Result};
use crate::player::backend::{AudioBackend, MediaEvent, MediaEventSender};
use crate::player::resource::{HandleId, ResourceHandle};

type PayloadDecoder = Decoder<Cursor<Arc<[u8]>>>;

// ==========================================
// PLAYBACK CLOCK
// ==========================================
// Rodio's Sink doesn't expose the current position, so we measure it:
//
//   position = offset + (now - started_at) - time spent paused
//
// offset: where playback started from (0 normally, the target after a seek)
// started_at: wall clock when output (re)started
// paused_at: Some(..) while paused, so paused time isn't counted
// paused_total: paused time accumulated since started_at
#[derive(Debug, Default)]
struct PlaybackClock {
    offset: f64,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
    paused_total: Duration,
}

impl PlaybackClock {
    // Restart measuring from `offset` seconds, paused
    fn reset_to(&mut self, offset: f64) {
        let now = Instant::now();
        self.offset = offset;
        self.started_at = Some(now);
        self.paused_at = Some(now);
        self.paused_total = Duration::ZERO;
    }

    fn pause(&mut self) {
        if self.paused_at.is_none() {
            self.paused_at = Some(Instant::now());
        }
    }

    fn resume(&mut self) {
        if let Some(paused_at) = self.paused_at.take() {
            self.paused_total += Instant::now().duration_since(paused_at);
        }
    }

    fn position(&self) -> f64 {
        let Some(start) = self.started_at else {
            return 0.0;
        };

        // While paused, time stopped at paused_at
        let until = self.paused_at.unwrap_or_else(Instant::now);
        let elapsed = until.duration_since(start).saturating_sub(self.paused_total);
        self.offset + elapsed.as_secs_f64()
    }
}

// ==========================================
// RODIO BACKEND STRUCT
// ==========================================
// _stream: OutputStream
//   - MUST stay alive: dropping it closes the audio device
//
// sink: Sink
//   - Play/pause/volume controls for whatever source is appended
//
// loaded: Option<HandleId>
//   - Which payload is in the sink; events are tagged with it
//
// playing: bool
//   - We keep our own flag: an empty, un-paused sink means "finished"
//     only if we actually asked it to play
//
// ended_reported: bool
//   - End of stream is reported once per load/seek
pub struct RodioBackend {
    _stream: OutputStream,
    sink: Sink,
    events: MediaEventSender,
    loaded: Option<HandleId>,
    clock: PlaybackClock,
    playing: bool,
    ended_reported: bool,
}

impl RodioBackend {
    // Opens the default output device. Fails with Output on a machine
    // without sound (headless server, CI...).
    pub fn new(events: MediaEventSender) -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|e| PlayerError::Output(e.to_string()))?;
        let sink = Sink::try_new(&handle).map_err(|e| PlayerError::Output(e.to_string()))?;

        Ok(RodioBackend {
            _stream: stream,
            sink,
            events,
            loaded: None,
            clock: PlaybackClock::default(),
            playing: false,
            ended_reported: false,
        })
    }

    // Decode the payload and report its length (if the container knows it)
    fn decode(handle: &ResourceHandle) -> Result<(PayloadDecoder, Option<f64>)> {
        let reader = handle
            .reader()
            .ok_or_else(|| {
                PlayerError::Decode(format!("payload {} already released", handle.id()))
            })?;

        let decoder = Decoder::new(reader).map_err(|e| {
            PlayerError::Decode(format!("{}. File may be corrupted or an unsupported format", e))
        })?;
        let duration = decoder.total_duration().map(|d| d.as_secs_f64());

        Ok((decoder, duration))
    }

    // Swap the sink's contents for `source`, keeping it paused.
    // Pause first so not even a few milliseconds leak out before
    // play() is called.
    fn install(&mut self, source: Box<dyn Source<Item = i16> + Send>) {
        self.sink.stop();
        self.sink.pause();
        self.sink.append(source);
        self.ended_reported = false;
    }

    fn emit(&self, event: MediaEvent) {
        // Receiver gone means the engine is shutting down
        let _ = self.events.send(event);
    }
}

impl AudioBackend for RodioBackend {
    fn load(&mut self, handle: &ResourceHandle) -> Result<()> {
        // Decode BEFORE stopping current audio: a bad file must not
        // silence the track that's playing now
        let (decoder, duration) = Self::decode(handle)?;

        self.install(Box::new(decoder));
        self.loaded = Some(handle.id());
        self.playing = false;
        self.clock.reset_to(0.0);

        debug!(handle = %handle.id(), ?duration, "payload loaded into sink");
        self.emit(MediaEvent::ready(handle.id(), duration));
        Ok(())
    }

    fn play(&mut self) {
        if self.loaded.is_none() {
            return;
        }
        self.sink.play();
        self.clock.resume();
        self.playing = true;
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.clock.pause();
        self.playing = false;
    }

    // ==========================================
    // SEEKING: seek()
    // ==========================================
    // Rodio 0.17 sources can't seek, so we rebuild the decoder from the
    // in-memory payload and skip ahead. Since the whole file is in RAM
    // this is quick, and it also lets us seek BACKWARDS after the track
    // already ended.
    fn seek(&mut self, handle: &ResourceHandle, seconds: f64) {
        if self.loaded != Some(handle.id()) {
            return;
        }
        let Some(skip) = skip_target(seconds) else {
            warn!(handle = %handle.id(), seconds, "seek target out of range");
            return;
        };

        let decoder = match Self::decode(handle) {
            Ok((decoder, _)) => decoder,
            Err(e) => {
                warn!(handle = %handle.id(), error = %e, "seek failed");
                return;
            }
        };

        let was_playing = self.playing;
        self.install(Box::new(decoder.skip_duration(skip)));
        self.clock.reset_to(skip.as_secs_f64());

        if was_playing {
            self.sink.play();
            self.clock.resume();
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.sink.set_volume(volume.clamp(0.0, 1.0));
    }

    fn stop(&mut self) {
        self.sink.stop();
        self.loaded = None;
        self.playing = false;
        self.clock = PlaybackClock::default();
    }

    // ==========================================
    // POLLING: tick()
    // ==========================================
    // Called every UI loop iteration.
    // - Still has samples → report the position
    // - Sink empty while we think we're playing → the track ran out,
    //   report Ended exactly once
    fn tick(&mut self) {
        let Some(handle) = self.loaded else {
            return;
        };
        if !self.playing {
            return;
        }

        if self.sink.empty() {
            if !self.ended_reported {
                self.ended_reported = true;
                self.playing = false;
                self.clock.pause();
                debug!(handle = %handle, "end of stream");
                self.emit(MediaEvent::ended(handle));
            }
        } else {
            self.emit(MediaEvent::position(handle, self.clock.position()));
        }
    }
}

// How far to skip into the decoded stream. None for targets a Duration
// can't hold (NaN, or far past any real track when the length is unknown).
fn skip_target(seconds: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(seconds.max(0.0)).ok()
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.sink.stop();
    }
}

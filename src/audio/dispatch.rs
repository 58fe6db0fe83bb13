//! Multi-device playback dispatcher
//!
//! Starts one output stream per selected device back-to-back, then blocks
//! the calling worker until every stream drains or playback is stopped. A
//! single logical playback generation is active at any time: starting a new
//! one clears the previous generation's token before its own streams are
//! opened, so a hotkey clip or a fresh play click always preempts whatever
//! is sounding.
//!
//! Progress is advisory: a fixed 50-step timer derived from
//! frames / sample_rate, checked against the generation token at every step
//! so a stop lands within one step. It never drives actual audio timing.

use super::backend::AudioBackend;
use super::transform;
use super::{DecodedAudio, OutputDeviceRef};
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Number of advisory progress steps per playback
pub const PROGRESS_STEPS: u32 = 50;

/// Event capacity; events are dropped, never blocked on, when the observer
/// falls behind
const EVENT_BUFFER: usize = 256;

/// Events emitted toward the external UI
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// Playback streams were issued; duration is frames / sample_rate
    Started { duration_secs: f32 },

    /// Advisory progress, 0-100
    Progress(u8),

    /// A device was skipped; playback continues on the others
    DeviceSkipped { index: usize, reason: String },

    /// The generation played out completely
    Finished,

    /// The generation was stopped or preempted before completion
    Stopped,

    /// A play action failed before any stream started
    Error(String),
}

/// Coordinates concurrent playback across one or two output devices.
pub struct Dispatcher {
    backend: Arc<dyn AudioBackend>,

    /// Token of the currently active generation; true while it is playing
    current: Mutex<Arc<AtomicBool>>,

    events: Sender<PlaybackEvent>,
    event_rx: Receiver<PlaybackEvent>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn AudioBackend>) -> Self {
        let (events, event_rx) = bounded(EVENT_BUFFER);
        Self {
            backend,
            current: Mutex::new(Arc::new(AtomicBool::new(false))),
            events,
            event_rx,
        }
    }

    /// Receiver for progress/state events; clones share one stream.
    pub fn subscribe(&self) -> Receiver<PlaybackEvent> {
        self.event_rx.clone()
    }

    /// Whether a playback generation is currently active.
    pub fn is_playing(&self) -> bool {
        self.current.lock().load(Ordering::SeqCst)
    }

    /// Halt all device output and reset progress. Idempotent.
    pub fn stop(&self) {
        let was_playing = self.current.lock().swap(false, Ordering::SeqCst);
        if was_playing {
            info!("Playback stop requested");
            self.emit(PlaybackEvent::Progress(0));
        }
    }

    /// Report a failure that aborted a play action before streams started.
    pub fn report_failure(&self, message: impl Into<String>) {
        self.emit(PlaybackEvent::Error(message.into()));
    }

    /// Play `audio` on every target device, blocking until done or stopped.
    ///
    /// Preempts any generation already in flight. Per-device start failures
    /// are warnings; the remaining devices still play. Returns after the
    /// generation resolves, with the playback flag cleared either way.
    pub fn play(
        &self,
        audio: &DecodedAudio,
        devices: &[OutputDeviceRef],
        gain: f32,
    ) -> Result<()> {
        if devices.is_empty() {
            debug!("No target devices selected, nothing to play");
            return Ok(());
        }

        let mono = transform::prepare(audio, gain);
        if mono.is_empty() {
            debug!("Empty sample buffer, nothing to play");
            return Ok(());
        }

        let token = self.begin_generation();

        let mut streams = Vec::new();
        for device in devices {
            let Some((frames, channels)) =
                transform::expand_for_device(&mono, device.max_output_channels)
            else {
                warn!(
                    "Skipping device {} ('{}'): unsupported channel count {}",
                    device.index, device.name, device.max_output_channels
                );
                self.emit(PlaybackEvent::DeviceSkipped {
                    index: device.index,
                    reason: format!("unsupported channel count {}", device.max_output_channels),
                });
                continue;
            };

            match self.backend.begin(
                device,
                frames,
                channels,
                audio.sample_rate,
                Arc::clone(&token),
            ) {
                Ok(stream) => streams.push(stream),
                Err(e) => {
                    warn!("Failed to start device {} ('{}'): {}", device.index, device.name, e);
                    self.emit(PlaybackEvent::DeviceSkipped {
                        index: device.index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let duration = mono.len() as f32 / audio.sample_rate as f32;
        self.emit(PlaybackEvent::Started {
            duration_secs: duration,
        });

        if streams.is_empty() {
            warn!("No device accepted the stream");
            token.store(false, Ordering::SeqCst);
            self.emit(PlaybackEvent::Progress(0));
            self.emit(PlaybackEvent::Finished);
            return Ok(());
        }

        info!(
            "Playback started on {} device(s), {:.2}s",
            streams.len(),
            duration
        );

        // Advisory progress loop, interruptible at every step.
        let step = Duration::from_secs_f32(duration / PROGRESS_STEPS as f32);
        for i in 0..=PROGRESS_STEPS {
            if !token.load(Ordering::SeqCst) {
                break;
            }
            self.emit(PlaybackEvent::Progress((i * 100 / PROGRESS_STEPS) as u8));
            if i < PROGRESS_STEPS {
                thread::sleep(step);
            }
        }

        // The timer and the device clocks drift slightly; let the streams
        // finish draining unless the generation was cancelled.
        while token.load(Ordering::SeqCst) && streams.iter().any(|s| !s.is_done()) {
            thread::sleep(Duration::from_millis(10));
        }

        let completed = token.swap(false, Ordering::SeqCst);
        drop(streams);

        self.emit(PlaybackEvent::Progress(0));
        if completed {
            debug!("Playback finished");
            self.emit(PlaybackEvent::Finished);
        } else {
            debug!("Playback stopped before completion");
            self.emit(PlaybackEvent::Stopped);
        }

        Ok(())
    }

    /// Cancel the active generation and install a fresh one.
    fn begin_generation(&self) -> Arc<AtomicBool> {
        let mut current = self.current.lock();
        current.store(false, Ordering::SeqCst);
        let token = Arc::new(AtomicBool::new(true));
        *current = Arc::clone(&token);
        token
    }

    fn emit(&self, event: PlaybackEvent) {
        // Advisory stream: drop rather than block when nobody is draining
        let _ = self.events.try_send(event);
    }
}

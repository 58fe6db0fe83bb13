//! Host audio backend abstraction
//!
//! The dispatcher talks to the host audio subsystem through `AudioBackend`:
//! enumerate devices, start a one-shot stream per device, observe drain.
//! Production uses the cpal implementation; tests substitute mocks.

use super::OutputDeviceRef;
use crate::Result;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// A running one-shot output stream.
///
/// Handles are not required to be `Send`: they are created, polled, and
/// dropped on the worker thread that started the playback generation.
pub trait PlaybackStream {
    /// True once the stream has played out its buffer or observed a cleared
    /// generation token.
    fn is_done(&self) -> bool;
}

/// External audio subsystem seam.
pub trait AudioBackend: Send + Sync {
    /// Enumerate output devices in stable index order.
    fn devices(&self) -> Result<Vec<OutputDeviceRef>>;

    /// Index of the host's default output device, if any.
    fn default_output(&self) -> Option<usize>;

    /// Start playing `frames` (interleaved, `channels` wide) on `device`.
    ///
    /// The stream must observe `active`: when the generation token clears,
    /// output falls silent immediately and the stream reports done.
    fn begin(
        &self,
        device: &OutputDeviceRef,
        frames: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        active: Arc<AtomicBool>,
    ) -> Result<Box<dyn PlaybackStream>>;
}

#[cfg(feature = "audio-io")]
pub use cpal_backend::CpalBackend;

#[cfg(feature = "audio-io")]
mod cpal_backend {
    use super::*;
    use crate::VoxError;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use cpal::{BufferSize, SampleRate, Stream, StreamConfig};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::{error, warn};

    /// cpal-backed implementation of [`AudioBackend`].
    ///
    /// Holds no state; devices are re-enumerated per call so a stale handle
    /// never outlives a device change.
    pub struct CpalBackend;

    impl CpalBackend {
        pub fn new() -> Self {
            Self
        }

        fn output_device(index: usize) -> Result<cpal::Device> {
            let host = cpal::default_host();
            host.output_devices()
                .map_err(|e| VoxError::Device(format!("Failed to enumerate devices: {}", e)))?
                .nth(index)
                .ok_or_else(|| VoxError::Device(format!("No output device at index {}", index)))
        }

        fn max_channels(device: &cpal::Device) -> u16 {
            let from_supported = device
                .supported_output_configs()
                .ok()
                .and_then(|configs| configs.map(|c| c.channels()).max());

            from_supported
                .or_else(|| device.default_output_config().ok().map(|c| c.channels()))
                .unwrap_or(0)
        }
    }

    impl Default for CpalBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl AudioBackend for CpalBackend {
        fn devices(&self) -> Result<Vec<OutputDeviceRef>> {
            let host = cpal::default_host();
            let devices = host
                .output_devices()
                .map_err(|e| VoxError::Device(format!("Failed to enumerate devices: {}", e)))?;

            Ok(devices
                .enumerate()
                .map(|(index, device)| OutputDeviceRef {
                    index,
                    name: device.name().unwrap_or_else(|_| "Unknown".to_string()),
                    max_output_channels: Self::max_channels(&device),
                })
                .collect())
        }

        fn default_output(&self) -> Option<usize> {
            let host = cpal::default_host();
            let default_name = host.default_output_device()?.name().ok()?;
            host.output_devices()
                .ok()?
                .position(|d| d.name().map(|n| n == default_name).unwrap_or(false))
        }

        fn begin(
            &self,
            device_ref: &OutputDeviceRef,
            frames: Vec<f32>,
            channels: u16,
            sample_rate: u32,
            active: Arc<AtomicBool>,
        ) -> Result<Box<dyn PlaybackStream>> {
            let device = Self::output_device(device_ref.index)?;

            let config = StreamConfig {
                channels,
                sample_rate: SampleRate(sample_rate),
                buffer_size: BufferSize::Default,
            };

            let data = Arc::new(frames);
            let total = data.len();
            let position = Arc::new(AtomicUsize::new(0));
            let done = Arc::new(AtomicBool::new(false));

            let cb_data = Arc::clone(&data);
            let cb_position = Arc::clone(&position);
            let cb_done = Arc::clone(&done);

            let err_fn = |err| {
                error!("Audio output stream error: {}", err);
            };

            let stream = device
                .build_output_stream(
                    &config,
                    move |out: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        if !active.load(Ordering::SeqCst) {
                            cb_done.store(true, Ordering::SeqCst);
                            out.fill(0.0);
                            return;
                        }

                        let start = cb_position.load(Ordering::SeqCst);
                        let count = (total - start).min(out.len());
                        out[..count].copy_from_slice(&cb_data[start..start + count]);
                        out[count..].fill(0.0);
                        cb_position.store(start + count, Ordering::SeqCst);

                        if start + count >= total {
                            cb_done.store(true, Ordering::SeqCst);
                        }
                    },
                    err_fn,
                    None,
                )
                .map_err(|e| {
                    VoxError::Device(format!(
                        "Failed to open stream on '{}': {}",
                        device_ref.name, e
                    ))
                })?;

            stream.play().map_err(|e| {
                VoxError::Device(format!(
                    "Failed to start stream on '{}': {}",
                    device_ref.name, e
                ))
            })?;

            Ok(Box::new(CpalStream {
                _stream: stream,
                done,
            }))
        }
    }

    struct CpalStream {
        _stream: Stream,
        done: Arc<AtomicBool>,
    }

    impl PlaybackStream for CpalStream {
        fn is_done(&self) -> bool {
            self.done.load(Ordering::SeqCst)
        }
    }

}

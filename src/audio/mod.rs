pub mod backend;
pub mod decoder;
pub mod dispatch;
pub mod transform;

#[cfg(feature = "audio-io")]
pub use backend::CpalBackend;
pub use backend::{AudioBackend, PlaybackStream};
pub use decoder::decode_file;
pub use dispatch::{Dispatcher, PlaybackEvent, PROGRESS_STEPS};

/// Decoded audio ready for transformation and playback
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    /// Interleaved f32 samples in [-1.0, 1.0]
    pub samples: Vec<f32>,

    /// Sample rate of the audio
    pub sample_rate: u32,

    /// Channel count of the interleaved data (>= 1)
    pub channels: u16,
}

impl DecodedAudio {
    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Duration of this audio in seconds
    pub fn duration_secs(&self) -> f32 {
        self.frames() as f32 / self.sample_rate as f32
    }
}

/// An output device as enumerated from the host audio subsystem.
///
/// Treated as read-only external state; the set may go stale if devices are
/// added or removed at runtime, in which case playback on a vanished device
/// fails as a per-device warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDeviceRef {
    /// Position in the enumeration order
    pub index: usize,

    /// Device name reported by the host
    pub name: String,

    /// Maximum output channels the device supports
    pub max_output_channels: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoded_audio_duration() {
        let audio = DecodedAudio {
            samples: vec![0.0; 44100],
            sample_rate: 22050,
            channels: 2,
        };
        assert_eq!(audio.frames(), 22050);
        assert!((audio.duration_secs() - 1.0).abs() < 0.001);
    }
}

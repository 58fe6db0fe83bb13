//! Volume and channel-layout transforms
//!
//! Gain is applied as a linear multiply followed by a hard clip to
//! [-1.0, 1.0]; saturation above unity gain is the accepted trade-off for
//! the 0-200% volume control. Multi-channel audio is collapsed to mono by
//! averaging before per-device expansion, so mono and stereo devices hear
//! the same signal. True stereo content is intentionally discarded.

use super::DecodedAudio;

/// Scale every sample by `gain` and hard-clip the result.
pub fn apply_gain(samples: &mut [f32], gain: f32) {
    for sample in samples.iter_mut() {
        *sample = (*sample * gain).clamp(-1.0, 1.0);
    }
}

/// Average interleaved frames down to a single channel.
pub fn collapse_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels = channels as usize;
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Apply gain then collapse to mono: the shared front half of every
/// playback request.
pub fn prepare(audio: &DecodedAudio, gain: f32) -> Vec<f32> {
    let mut samples = audio.samples.clone();
    apply_gain(&mut samples, gain);
    collapse_to_mono(&samples, audio.channels)
}

/// Reshape a mono signal for a device's channel count.
///
/// One channel passes through unchanged; two or more get the mono signal
/// duplicated across exactly two interleaved channels. Returns `None` for
/// devices with no output channels, which the dispatcher skips with a
/// warning while playback continues elsewhere.
pub fn expand_for_device(mono: &[f32], device_channels: u16) -> Option<(Vec<f32>, u16)> {
    match device_channels {
        0 => None,
        1 => Some((mono.to_vec(), 1)),
        _ => {
            let mut interleaved = Vec::with_capacity(mono.len() * 2);
            for &sample in mono {
                interleaved.push(sample);
                interleaved.push(sample);
            }
            Some((interleaved, 2))
        }
    }
}

//! Audio decoder adapter
//!
//! Loads a cached asset into normalized f32 samples via symphonia. Newly
//! synthesized and pre-existing cache files go through the same path. A
//! missing file and a corrupt file surface as distinct error variants so
//! callers can tell a stale binding from a bad asset.

use super::DecodedAudio;
use crate::{Result, VoxError};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Decode an encoded audio file into interleaved f32 samples.
pub fn decode_file(path: &Path) -> Result<DecodedAudio> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(VoxError::AssetMissing(path.display().to_string()));
        }
        Err(e) => {
            return Err(VoxError::Decode(format!(
                "Failed to open {}: {}",
                path.display(),
                e
            )));
        }
    };

    let stream = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| VoxError::Decode(format!("Unrecognized audio format: {}", e)))?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| VoxError::Decode("No decodable audio track".into()))?;
    let track_id = track.id;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| VoxError::Decode(format!("Unsupported codec: {}", e)))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16)
        .unwrap_or(0);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(VoxError::Decode(format!("Demux error: {}", e))),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate = spec.rate;
                channels = spec.channels.count() as u16;

                let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buffer.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buffer.samples());
            }
            // A damaged packet is skipped; the rest of the file may be fine
            Err(SymphoniaError::DecodeError(e)) => {
                warn!("Skipping damaged packet in {}: {}", path.display(), e);
            }
            Err(e) => return Err(VoxError::Decode(format!("Decode failed: {}", e))),
        }
    }

    if samples.is_empty() || sample_rate == 0 {
        return Err(VoxError::Decode(format!(
            "No audio frames decoded from {}",
            path.display()
        )));
    }

    debug!(
        "Decoded {}: {} samples, {} Hz, {} channel(s)",
        path.display(),
        samples.len(),
        sample_rate,
        channels
    );

    Ok(DecodedAudio {
        samples,
        sample_rate,
        channels: channels.max(1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_test_wav(path: &Path, samples: &[f32], sample_rate: u32, channels: u16) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &sample in samples {
            writer
                .write_sample((sample * i16::MAX as f32) as i16)
                .unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_mono_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..2205)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 22050.0).sin() * 0.5)
            .collect();
        write_test_wav(&path, &samples, 22050, 1);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.sample_rate, 22050);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.samples.len(), samples.len());
        // 16-bit quantization tolerance
        for (decoded, original) in audio.samples.iter().zip(&samples) {
            assert!((decoded - original).abs() < 0.001);
        }
    }

    #[test]
    fn test_decode_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let samples = vec![0.25, -0.25, 0.5, -0.5];
        write_test_wav(&path, &samples, 44100, 2);

        let audio = decode_file(&path).unwrap();
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frames(), 2);
    }

    #[test]
    fn test_missing_file_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_file(&dir.path().join("gone.mp3"));
        assert!(matches!(result, Err(VoxError::AssetMissing(_))));
    }

    #[test]
    fn test_corrupt_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("corrupt.mp3");
        std::fs::write(&path, b"this is not audio data at all").unwrap();
        let result = decode_file(&path);
        assert!(matches!(result, Err(VoxError::Decode(_))));
    }
}

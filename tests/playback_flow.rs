//! End-to-end playback flow over mocked provider and audio backend:
//! text in, synthesized asset cached, decoded samples transformed and
//! handed to the output device.

use parking_lot::Mutex;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use voxboard::audio::{AudioBackend, OutputDeviceRef, PlaybackEvent, PlaybackStream};
use voxboard::engine::{Engine, EnginePaths};
use voxboard::hotkey::{KeyHook, KeySource};
use voxboard::synth::SpeechProvider;
use voxboard::Result;

const SAMPLE_RATE: u32 = 22050;

/// Known source amplitudes; 0.8 clips at 150% volume.
const SOURCE: [f32; 4] = [0.0, 0.4, -0.4, 0.8];

/// Provider that serves a small WAV asset and counts invocations.
struct WavProvider {
    calls: AtomicUsize,
}

impl WavProvider {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

impl SpeechProvider for WavProvider {
    fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for s in SOURCE {
                writer.write_sample((s * i16::MAX as f32) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        Ok(cursor.into_inner())
    }
}

/// Backend exposing one stereo device and recording what it is given.
struct RecordingBackend {
    starts: Mutex<Vec<(Vec<f32>, u16, u32)>>,
}

struct InstantStream;

impl PlaybackStream for InstantStream {
    fn is_done(&self) -> bool {
        true
    }
}

impl RecordingBackend {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            starts: Mutex::new(Vec::new()),
        })
    }
}

impl AudioBackend for RecordingBackend {
    fn devices(&self) -> Result<Vec<OutputDeviceRef>> {
        Ok(vec![OutputDeviceRef {
            index: 0,
            name: "Recorder".into(),
            max_output_channels: 2,
        }])
    }

    fn default_output(&self) -> Option<usize> {
        Some(0)
    }

    fn begin(
        &self,
        _device: &OutputDeviceRef,
        frames: Vec<f32>,
        channels: u16,
        sample_rate: u32,
        _active: Arc<AtomicBool>,
    ) -> Result<Box<dyn PlaybackStream>> {
        self.starts.lock().push((frames, channels, sample_rate));
        Ok(Box::new(InstantStream))
    }
}

/// Key source that never delivers anything.
struct IdleSource;

impl KeySource for IdleSource {
    fn listen(&self, _on_key: Box<dyn Fn(&str) + Send + 'static>) -> Result<KeyHook> {
        Ok(KeyHook::new(|| {}))
    }
}

fn wait_for_finish(events: &crossbeam_channel::Receiver<PlaybackEvent>) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while std::time::Instant::now() < deadline {
        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(PlaybackEvent::Finished) => return,
            Ok(PlaybackEvent::Error(message)) => panic!("playback failed: {}", message),
            Ok(_) => {}
            Err(_) => {}
        }
    }
    panic!("playback did not finish in time");
}

#[test]
fn test_speak_synthesizes_caches_and_plays() {
    let dir = tempfile::tempdir().unwrap();
    let provider = WavProvider::new();
    let backend = RecordingBackend::new();
    let engine = Engine::new(
        EnginePaths::under(dir.path()),
        provider.clone(),
        backend.clone(),
        Arc::new(IdleSource),
    )
    .unwrap();

    engine.update_settings(|s| s.set_volume_percent(150));
    let events = engine.events();

    engine.speak("Hello world");
    wait_for_finish(&events);

    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    // One cached clip, named after the text and the default voice
    let clips = engine.clips();
    assert_eq!(clips.len(), 1);
    assert!(clips[0]
        .0
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("Hello world"));

    // The stereo device received gain-scaled, clipped, duplicated samples
    let starts = backend.starts.lock();
    assert_eq!(starts.len(), 1);
    let (frames, channels, sample_rate) = &starts[0];
    assert_eq!(*channels, 2);
    assert_eq!(*sample_rate, SAMPLE_RATE);
    assert_eq!(frames.len(), SOURCE.len() * 2);

    let expected = [0.0, 0.6, -0.6, 1.0];
    for (i, want) in expected.iter().enumerate() {
        let left = frames[i * 2];
        let right = frames[i * 2 + 1];
        assert!(
            (left - want).abs() < 1e-3,
            "frame {}: got {}, want {}",
            i,
            left,
            want
        );
        assert_eq!(left, right);
    }
}

#[test]
fn test_repeat_speak_reuses_cached_asset() {
    let dir = tempfile::tempdir().unwrap();
    let provider = WavProvider::new();
    let backend = RecordingBackend::new();
    let engine = Engine::new(
        EnginePaths::under(dir.path()),
        provider.clone(),
        backend.clone(),
        Arc::new(IdleSource),
    )
    .unwrap();

    let events = engine.events();

    engine.speak("Hello world");
    wait_for_finish(&events);
    engine.speak("Hello world");
    wait_for_finish(&events);

    // Second play was a cache hit but still reached the device
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.starts.lock().len(), 2);
}

#[test]
fn test_play_clip_decodes_cached_file() {
    let dir = tempfile::tempdir().unwrap();
    let provider = WavProvider::new();
    let backend = RecordingBackend::new();
    let engine = Engine::new(
        EnginePaths::under(dir.path()),
        provider.clone(),
        backend.clone(),
        Arc::new(IdleSource),
    )
    .unwrap();

    let events = engine.events();
    engine.speak("clip me");
    wait_for_finish(&events);

    let clips = engine.clips();
    let clip = clips[0].0.clone();

    engine.play_clip(&clip);
    wait_for_finish(&events);

    // Clip replay touches the device, not the provider
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    assert_eq!(backend.starts.lock().len(), 2);
}

#[test]
fn test_missing_clip_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(
        EnginePaths::under(dir.path()),
        WavProvider::new(),
        RecordingBackend::new(),
        Arc::new(IdleSource),
    )
    .unwrap();

    let events = engine.events();
    engine.play_clip(Path::new("no_such_clip.mp3"));

    let deadline = std::time::Instant::now() + Duration::from_secs(2);
    let mut saw_error = false;
    while std::time::Instant::now() < deadline {
        if let Ok(PlaybackEvent::Error(_)) = events.recv_timeout(Duration::from_millis(100)) {
            saw_error = true;
            break;
        }
    }
    assert!(saw_error);
}

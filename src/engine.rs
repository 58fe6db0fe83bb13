//! Engine: wiring between the external UI and the playback core
//!
//! Owns the speech cache, the playback dispatcher, the soundboard store and
//! the hotkey listener. Each play action runs on its own short-lived,
//! detached worker thread; the foreground (UI) thread is never blocked.
//! Failures are caught at the worker boundary, logged, and surfaced as
//! events — they never escape to crash the process.

use crate::audio::backend::AudioBackend;
use crate::audio::{decoder, Dispatcher, OutputDeviceRef, PlaybackEvent};
use crate::config::AppSettings;
use crate::hotkey::{capture_key, HotkeyListener, KeySource, KEY_ESCAPE};
use crate::soundboard::SoundboardStore;
use crate::synth::provider::SpeechProvider;
use crate::synth::voices::{voice_by_index, VoiceProfile, VOICES};
use crate::synth::SpeechCache;
use crate::Result;
use crossbeam_channel::Receiver;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// How long a modal key capture waits before giving up
pub const CAPTURE_TIMEOUT: Duration = Duration::from_secs(10);

/// File and directory locations for one engine instance
#[derive(Debug, Clone)]
pub struct EnginePaths {
    pub cache_dir: PathBuf,
    pub settings_file: PathBuf,
    pub soundboard_file: PathBuf,
}

impl Default for EnginePaths {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("tts_cache"),
            settings_file: PathBuf::from("tts_settings.json"),
            soundboard_file: PathBuf::from("soundboard.json"),
        }
    }
}

impl EnginePaths {
    /// Root every path under `dir`; used by tests and portable installs.
    pub fn under(dir: &Path) -> Self {
        Self {
            cache_dir: dir.join("tts_cache"),
            settings_file: dir.join("tts_settings.json"),
            soundboard_file: dir.join("soundboard.json"),
        }
    }
}

/// Everything a detached play worker needs, cheap to clone per action.
#[derive(Clone)]
struct PlayContext {
    cache: Arc<SpeechCache>,
    backend: Arc<dyn AudioBackend>,
    dispatcher: Arc<Dispatcher>,
    settings: Arc<RwLock<AppSettings>>,
}

impl PlayContext {
    /// Snapshot the selected output devices, ignoring out-of-range indices.
    fn selected_devices(&self) -> Vec<OutputDeviceRef> {
        let devices = match self.backend.devices() {
            Ok(devices) => devices,
            Err(e) => {
                warn!("Device enumeration failed: {}", e);
                return Vec::new();
            }
        };
        if devices.is_empty() {
            warn!("No output devices available");
            return Vec::new();
        }

        let (primary, secondary) = {
            let settings = self.settings.read();
            (settings.output1_index, settings.output2_index)
        };

        let mut selected = Vec::new();

        // Out-of-range primary falls back to the host default
        if let Some(device) = devices.get(primary) {
            selected.push(device.clone());
        } else {
            let fallback = self.backend.default_output().unwrap_or(0);
            if let Some(device) = devices.get(fallback) {
                warn!(
                    "Selected device {} is out of range, using '{}'",
                    primary, device.name
                );
                selected.push(device.clone());
            }
        }

        if let Some(index) = secondary {
            match devices.get(index) {
                Some(device) if selected.first().map(|d| d.index) != Some(device.index) => {
                    selected.push(device.clone());
                }
                Some(_) => {}
                None => warn!("Secondary device {} is out of range, ignoring", index),
            }
        }

        selected
    }

    /// Decode a cached asset and dispatch it. Runs on a worker thread.
    fn play_file(&self, path: &Path) {
        let gain = self.settings.read().gain();
        let devices = self.selected_devices();
        if devices.is_empty() {
            self.dispatcher
                .report_failure("No usable output device. Check your audio setup.");
            return;
        }

        let audio = match decoder::decode_file(path) {
            Ok(audio) => audio,
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                self.dispatcher.report_failure(e.user_message());
                return;
            }
        };

        if let Err(e) = self.dispatcher.play(&audio, &devices, gain) {
            error!("Playback failed for {}: {}", path.display(), e);
            self.dispatcher.report_failure(e.user_message());
        }
    }

    /// Fire-and-forget playback of an existing clip.
    fn spawn_clip(&self, path: PathBuf) {
        let ctx = self.clone();
        thread::spawn(move || ctx.play_file(&path));
    }

    /// Fire-and-forget synthesize-then-play for typed text.
    fn spawn_speak(&self, text: String, voice: &'static VoiceProfile) {
        let ctx = self.clone();
        thread::spawn(move || {
            // Blocks this worker (only) through the network call on a miss
            let path = match ctx.cache.resolve(&text, voice.voice_id) {
                Ok(path) => path,
                Err(e) => {
                    error!("Synthesis failed: {}", e);
                    ctx.dispatcher.report_failure(e.user_message());
                    return;
                }
            };
            ctx.play_file(&path);
        });
    }
}

pub struct Engine {
    ctx: PlayContext,
    store: SoundboardStore,
    listener: HotkeyListener,
    key_source: Arc<dyn KeySource>,
    events: Receiver<PlaybackEvent>,
    paths: EnginePaths,
}

impl Engine {
    pub fn new(
        paths: EnginePaths,
        provider: Arc<dyn SpeechProvider>,
        backend: Arc<dyn AudioBackend>,
        key_source: Arc<dyn KeySource>,
    ) -> Result<Self> {
        let settings = Arc::new(RwLock::new(AppSettings::load(&paths.settings_file)));
        let cache = Arc::new(SpeechCache::new(&paths.cache_dir, provider)?);
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&backend)));
        let events = dispatcher.subscribe();

        let ctx = PlayContext {
            cache,
            backend,
            dispatcher,
            settings,
        };

        let store = SoundboardStore::load(&paths.soundboard_file);
        let trigger_ctx = ctx.clone();
        let listener = HotkeyListener::new(
            Arc::clone(&key_source),
            store.bindings(),
            move |path| trigger_ctx.spawn_clip(path),
        );

        info!("Engine initialized (cache: {})", paths.cache_dir.display());

        Ok(Self {
            ctx,
            store,
            listener,
            key_source,
            events,
            paths,
        })
    }

    /// Speak typed text on the selected devices. Blank input is a silent
    /// no-op; everything else runs detached and preempts current playback.
    pub fn speak(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty text");
            return;
        }

        let voice_index = self.ctx.settings.read().voice_index;
        let Some(voice) = voice_by_index(voice_index) else {
            warn!("Voice index {} is out of range, using default", voice_index);
            self.ctx.spawn_speak(text.to_string(), &VOICES[0]);
            return;
        };

        self.ctx.spawn_speak(text.to_string(), voice);
    }

    /// Play a cached soundboard clip (UI click path; hotkeys go through the
    /// listener's trigger and end up in the same place).
    pub fn play_clip(&self, path: &Path) {
        self.ctx.spawn_clip(path.to_path_buf());
    }

    /// Stop whatever is playing. Idempotent.
    pub fn stop(&self) {
        self.ctx.dispatcher.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.ctx.dispatcher.is_playing()
    }

    /// Progress/state events for the external UI.
    pub fn events(&self) -> Receiver<PlaybackEvent> {
        self.events.clone()
    }

    /// Start the background hotkey listener.
    pub fn start_hotkeys(&mut self) -> Result<()> {
        self.listener.start()
    }

    /// Capture one key and bind it to `clip`.
    ///
    /// The background listener is paused for the capture window so the two
    /// never share the key source, and restarted afterwards regardless of
    /// outcome. Escape removes the clip's existing binding; a timeout
    /// leaves bindings unchanged. Returns the captured identifier.
    pub fn assign_key(&mut self, clip: &Path) -> Result<Option<String>> {
        let was_running = self.listener.is_running();
        self.listener.stop();

        let captured = capture_key(&*self.key_source, CAPTURE_TIMEOUT);

        let outcome = captured.and_then(|key| {
            match key.as_deref() {
                Some(KEY_ESCAPE) => {
                    self.store.unbind_clip(clip)?;
                }
                Some(k) => {
                    self.store.bind(k, clip)?;
                }
                None => {}
            }
            Ok(key)
        });

        if was_running {
            if let Err(e) = self.listener.start() {
                error!("Failed to restart hotkey listener: {}", e);
            }
        }

        outcome
    }

    /// Current settings snapshot.
    pub fn settings(&self) -> AppSettings {
        self.ctx.settings.read().clone()
    }

    /// Mutate settings and persist them; save failure is non-fatal.
    pub fn update_settings(&self, update: impl FnOnce(&mut AppSettings)) {
        let snapshot = {
            let mut settings = self.ctx.settings.write();
            update(&mut settings);
            settings.clone()
        };
        if let Err(e) = snapshot.save(&self.paths.settings_file) {
            warn!("Failed to save settings: {}", e);
        }
    }

    /// Output devices for the UI dropdowns.
    pub fn devices(&self) -> Result<Vec<OutputDeviceRef>> {
        self.ctx.backend.devices()
    }

    /// Cached clips with their bound keys, for the soundboard list.
    pub fn clips(&self) -> Vec<(PathBuf, Option<String>)> {
        self.ctx
            .cache
            .list_clips()
            .into_iter()
            .map(|path| {
                let key = self.store.key_for(&path);
                (path, key)
            })
            .collect()
    }

    pub fn soundboard(&self) -> &SoundboardStore {
        &self.store
    }

    /// Stop playback, persist settings, and tear down the listener.
    pub fn shutdown(&mut self) {
        info!("Engine shutting down");
        self.stop();
        let snapshot = self.ctx.settings.read().clone();
        if let Err(e) = snapshot.save(&self.paths.settings_file) {
            warn!("Failed to save settings on shutdown: {}", e);
        }
        self.listener.stop();
    }
}

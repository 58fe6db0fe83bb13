//! Speech cache resolver
//!
//! Maps (text, voice_id) to a stable cache filename and only invokes the
//! synthesis gateway on a miss. Filenames are human-readable: sanitized text
//! truncated to 50 characters plus a voice tag. Texts that differ only past
//! the truncation limit therefore share a cache entry; this is a known,
//! accepted limitation of the readable-filename scheme.
//!
//! Assets are written to a temporary path and renamed into place so a failed
//! synthesis never leaves a partial file behind.

use crate::synth::provider::SpeechProvider;
use crate::synth::voices::voice_short_name;
use crate::{Result, VoxError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Maximum number of text characters encoded into a cache filename
pub const FILENAME_TEXT_LIMIT: usize = 50;

/// Extension of cached assets, matching the provider's output encoding
pub const CACHE_EXTENSION: &str = "mp3";

/// Identifier used when sanitization strips the text down to nothing
const FALLBACK_STEM: &str = "speech";

/// Strip filesystem-hostile characters and truncate.
fn sanitize_text(text: &str) -> String {
    const INVALID: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    text.chars()
        .filter(|c| !INVALID.contains(c) && !c.is_control())
        .take(FILENAME_TEXT_LIMIT)
        .collect::<String>()
        .trim()
        .to_string()
}

/// Derive the cache filename for a (text, voice_id) pair.
///
/// Pure function: identical inputs always produce identical names, and the
/// result is never empty even for fully-sanitized-away text.
pub fn cache_filename(text: &str, voice_id: &str) -> String {
    let stem = sanitize_text(text);
    let stem = if stem.is_empty() {
        FALLBACK_STEM.to_string()
    } else {
        stem
    };

    format!("{}-{}.{}", stem, voice_short_name(voice_id), CACHE_EXTENSION)
}

/// Cache of synthesized audio assets on disk.
///
/// Entries are created once and never mutated or evicted; the cache grows
/// without bound, trading disk for replay speed.
pub struct SpeechCache {
    dir: PathBuf,
    provider: Arc<dyn SpeechProvider>,
}

impl SpeechCache {
    /// Open (and create if needed) the cache directory.
    pub fn new(dir: impl Into<PathBuf>, provider: Arc<dyn SpeechProvider>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| VoxError::Persistence(format!("Failed to create cache dir: {}", e)))?;
        Ok(Self { dir, provider })
    }

    /// Path a given (text, voice_id) pair resolves to, whether or not the
    /// asset exists yet.
    pub fn path_for(&self, text: &str, voice_id: &str) -> PathBuf {
        self.dir.join(cache_filename(text, voice_id))
    }

    /// Resolve text to a decodable audio asset, synthesizing on a miss.
    ///
    /// Blocks the calling worker for the duration of the network call on a
    /// miss; a hit returns immediately.
    pub fn resolve(&self, text: &str, voice_id: &str) -> Result<PathBuf> {
        let path = self.path_for(text, voice_id);

        if path.exists() {
            debug!("Cache hit: {}", path.display());
            return Ok(path);
        }

        info!("Cache miss, synthesizing: {}", path.display());
        let bytes = self.provider.synthesize(text, voice_id)?;
        if bytes.is_empty() {
            return Err(VoxError::Synthesis("Provider returned empty audio".into()));
        }

        let tmp = path.with_extension(format!("{}.part", CACHE_EXTENSION));
        fs::write(&tmp, &bytes)
            .map_err(|e| VoxError::Persistence(format!("Failed to write audio: {}", e)))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(VoxError::Persistence(format!(
                "Failed to place cached audio: {}",
                e
            )));
        }

        Ok(path)
    }

    /// All cached clips, sorted by filename. Used by the soundboard.
    pub fn list_clips(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read cache dir: {}", e);
                return Vec::new();
            }
        };

        let mut clips: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| ext.eq_ignore_ascii_case(CACHE_EXTENSION))
                    .unwrap_or(false)
            })
            .collect();
        clips.sort();
        clips
    }

    /// Cache directory root
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider stub that counts invocations and serves canned bytes.
    struct CountingProvider {
        calls: AtomicUsize,
        response: Mutex<Result<Vec<u8>>>,
    }

    impl CountingProvider {
        fn returning(bytes: Vec<u8>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Mutex::new(Ok(bytes)),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Mutex::new(Err(VoxError::Synthesis(message.to_string()))),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl SpeechProvider for CountingProvider {
        fn synthesize(&self, _text: &str, _voice_id: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.lock().clone()
        }
    }

    #[test]
    fn test_filename_is_deterministic() {
        let a = cache_filename("Hello world", "en-US-JennyNeural");
        let b = cache_filename("Hello world", "en-US-JennyNeural");
        assert_eq!(a, b);
        assert_eq!(a, "Hello world-JennyFemaleUS.mp3");
    }

    #[test]
    fn test_distinct_voices_distinct_names() {
        let a = cache_filename("Hello", "en-US-JennyNeural");
        let b = cache_filename("Hello", "en-US-GuyNeural");
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitization_strips_invalid_characters() {
        let name = cache_filename("a/b\\c:d*e?f<g>h|i\"j", "en-US-JennyNeural");
        assert_eq!(name, "abcdefghij-JennyFemaleUS.mp3");
    }

    #[test]
    fn test_truncation_limit() {
        let long = "x".repeat(200);
        let name = cache_filename(&long, "en-US-JennyNeural");
        assert_eq!(name, format!("{}-JennyFemaleUS.mp3", "x".repeat(50)));

        // Texts differing only past the limit collide: documented limitation.
        let other = format!("{}different-tail", "x".repeat(50));
        assert_eq!(name, cache_filename(&other, "en-US-JennyNeural"));
    }

    #[test]
    fn test_empty_after_sanitization_falls_back() {
        let name = cache_filename("???///", "en-US-JennyNeural");
        assert_eq!(name, "speech-JennyFemaleUS.mp3");
    }

    #[test]
    fn test_resolve_synthesizes_once() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CountingProvider::returning(vec![1, 2, 3]);
        let cache = SpeechCache::new(dir.path(), provider.clone()).unwrap();

        let first = cache.resolve("Hello world", "en-US-JennyNeural").unwrap();
        assert!(first.exists());
        assert_eq!(provider.calls(), 1);

        // Second call is a pure cache hit
        let second = cache.resolve("Hello world", "en-US-JennyNeural").unwrap();
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
    }

    #[test]
    fn test_failed_synthesis_leaves_no_asset() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CountingProvider::failing("network unreachable");
        let cache = SpeechCache::new(dir.path(), provider).unwrap();

        let result = cache.resolve("Hello", "en-US-JennyNeural");
        assert!(matches!(result, Err(VoxError::Synthesis(_))));
        assert!(!cache.path_for("Hello", "en-US-JennyNeural").exists());
        assert!(cache.list_clips().is_empty());
    }

    #[test]
    fn test_empty_audio_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CountingProvider::returning(Vec::new());
        let cache = SpeechCache::new(dir.path(), provider).unwrap();

        let result = cache.resolve("Hello", "en-US-JennyNeural");
        assert!(matches!(result, Err(VoxError::Synthesis(_))));
        assert!(cache.list_clips().is_empty());
    }

    #[test]
    fn test_list_clips_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let provider = CountingProvider::returning(vec![0]);
        let cache = SpeechCache::new(dir.path(), provider).unwrap();

        std::fs::write(dir.path().join("b.mp3"), [0u8]).unwrap();
        std::fs::write(dir.path().join("a.mp3"), [0u8]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), [0u8]).unwrap();

        let clips = cache.list_clips();
        assert_eq!(clips.len(), 2);
        assert!(clips[0].ends_with("a.mp3"));
        assert!(clips[1].ends_with("b.mp3"));
    }
}

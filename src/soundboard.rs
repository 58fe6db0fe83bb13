//! Persisted soundboard bindings
//!
//! A flat JSON map from normalized key identifier to cached-clip path.
//! Loaded once at startup (missing or corrupt file falls back to empty) and
//! saved after every mutation with a write-then-rename so the hotkey
//! listener never observes a half-written file. The map itself is shared
//! with the listener thread behind a read-write lock; all mutations happen
//! on the foreground thread.

use crate::hotkey::KEY_ESCAPE;
use crate::{Result, VoxError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SoundboardStore {
    path: PathBuf,
    bindings: Arc<RwLock<HashMap<String, PathBuf>>>,
}

impl SoundboardStore {
    /// Load bindings from `path`, tolerating a missing or malformed file.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        let bindings = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, PathBuf>>(&contents) {
                Ok(map) => {
                    info!("Loaded {} soundboard binding(s)", map.len());
                    map
                }
                Err(e) => {
                    warn!("Malformed soundboard file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!("No soundboard file at {}", path.display());
                HashMap::new()
            }
        };

        Self {
            path,
            bindings: Arc::new(RwLock::new(bindings)),
        }
    }

    /// Shared handle for the hotkey listener (read-only access path).
    pub fn bindings(&self) -> Arc<RwLock<HashMap<String, PathBuf>>> {
        Arc::clone(&self.bindings)
    }

    /// Clip bound to `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<PathBuf> {
        self.bindings.read().get(key).cloned()
    }

    /// Key currently bound to `clip`, if any. Used for list display.
    pub fn key_for(&self, clip: &Path) -> Option<String> {
        self.bindings
            .read()
            .iter()
            .find(|(_, path)| path.as_path() == clip)
            .map(|(key, _)| key.clone())
    }

    /// Bind `key` to `clip`, last writer wins on both sides: any previous
    /// clip on this key and any previous key for this clip are dropped.
    pub fn bind(&self, key: &str, clip: &Path) -> Result<()> {
        if key == KEY_ESCAPE {
            return Err(VoxError::Hotkey(
                "'esc' is reserved for removing bindings".into(),
            ));
        }

        {
            let mut bindings = self.bindings.write();
            bindings.retain(|_, path| path.as_path() != clip);
            bindings.insert(key.to_string(), clip.to_path_buf());
        }
        info!("Bound '{}' to {}", key, clip.display());
        self.save()
    }

    /// Remove whatever binding points at `clip`.
    pub fn unbind_clip(&self, clip: &Path) -> Result<()> {
        let removed = {
            let mut bindings = self.bindings.write();
            let before = bindings.len();
            bindings.retain(|_, path| path.as_path() != clip);
            before != bindings.len()
        };

        if removed {
            info!("Removed binding for {}", clip.display());
            self.save()
        } else {
            Ok(())
        }
    }

    /// Remove the binding for `key`, if present.
    pub fn unbind(&self, key: &str) -> Result<()> {
        let removed = self.bindings.write().remove(key).is_some();
        if removed {
            info!("Removed binding '{}'", key);
            self.save()
        } else {
            Ok(())
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.read().is_empty()
    }

    /// Persist the current map, replacing the backing file atomically.
    /// Failure is reported to the caller; in-memory state stays authoritative.
    fn save(&self) -> Result<()> {
        let contents = {
            let bindings = self.bindings.read();
            serde_json::to_string_pretty(&*bindings)
                .map_err(|e| VoxError::Persistence(format!("Failed to encode bindings: {}", e)))?
        };

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)
            .map_err(|e| VoxError::Persistence(format!("Failed to write bindings: {}", e)))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            VoxError::Persistence(format!("Failed to replace bindings file: {}", e))
        })?;

        Ok(())
    }
}

//! Background soundboard hotkey listener
//!
//! Alive for the process lifetime except while a modal key capture borrows
//! the key source. On every normalized key event it reads the shared
//! bindings map and fires the trigger for a match; the trigger is expected
//! to launch playback asynchronously (it runs on the key source's thread
//! and must not block).

use super::{normalize_key, KeyHook, KeySource};
use crate::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

pub struct HotkeyListener {
    source: Arc<dyn KeySource>,
    bindings: Arc<RwLock<HashMap<String, PathBuf>>>,
    trigger: Arc<dyn Fn(PathBuf) + Send + Sync>,
    hook: Option<KeyHook>,
}

impl HotkeyListener {
    /// Create a listener over a shared bindings map.
    ///
    /// `trigger` receives the bound clip path and must hand it off to a
    /// worker rather than playing inline.
    pub fn new(
        source: Arc<dyn KeySource>,
        bindings: Arc<RwLock<HashMap<String, PathBuf>>>,
        trigger: impl Fn(PathBuf) + Send + Sync + 'static,
    ) -> Self {
        Self {
            source,
            bindings,
            trigger: Arc::new(trigger),
            hook: None,
        }
    }

    /// Install the global hook. No-op if already running.
    pub fn start(&mut self) -> Result<()> {
        if self.hook.is_some() {
            return Ok(());
        }

        let bindings = Arc::clone(&self.bindings);
        let trigger = Arc::clone(&self.trigger);

        let hook = self.source.listen(Box::new(move |raw| {
            let key = normalize_key(raw);
            // Snapshot the clip path under the read lock, fire outside it
            let clip = bindings.read().get(&key).cloned();
            if let Some(path) = clip {
                debug!("Hotkey '{}' -> {}", key, path.display());
                trigger(path);
            }
        }))?;

        self.hook = Some(hook);
        info!("Hotkey listener started");
        Ok(())
    }

    /// Remove the global hook. Idempotent.
    pub fn stop(&mut self) {
        if let Some(hook) = self.hook.take() {
            hook.stop();
            info!("Hotkey listener stopped");
        }
    }

    /// Stop and start again; used after bindings change so backends that
    /// snapshot state at install time pick up the new map.
    pub fn restart(&mut self) -> Result<()> {
        self.stop();
        self.start()
    }

    pub fn is_running(&self) -> bool {
        self.hook.is_some()
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop();
    }
}

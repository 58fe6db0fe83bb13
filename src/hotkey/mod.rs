//! Global keyboard event plumbing
//!
//! The process-wide key source is an external backend behind the
//! [`KeySource`] trait: install a callback, get back a [`KeyHook`] guard
//! that removes the hook when stopped or dropped. The background soundboard
//! listener and the modal capture flow both consume this seam, but never
//! concurrently: the engine stops the listener for the duration of a
//! capture.

pub mod capture;
pub mod listener;
#[cfg(feature = "global-keys")]
pub mod poller;

pub use capture::capture_key;
pub use listener::HotkeyListener;
#[cfg(feature = "global-keys")]
pub use poller::KeyPoller;

use crate::Result;

/// Reserved identifier: interpreted as "remove binding", never assignable.
pub const KEY_ESCAPE: &str = "esc";

/// Guard for an installed key hook. Stopping (or dropping) removes the
/// system-level hook; a listener restart installs a fresh one, never
/// leaking the old.
pub struct KeyHook {
    teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl KeyHook {
    pub fn new(teardown: impl FnOnce() + Send + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// Remove the hook now.
    pub fn stop(mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for KeyHook {
    fn drop(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

/// External global-keyboard backend.
///
/// Implementations deliver raw key names (e.g. "F1", "Escape", "a") to the
/// callback; consumers normalize them with [`normalize_key`].
pub trait KeySource: Send + Sync {
    fn listen(&self, on_key: Box<dyn Fn(&str) + Send + 'static>) -> Result<KeyHook>;
}

/// Canonical lowercase identifier for a raw key name.
pub fn normalize_key(raw: &str) -> String {
    let key = raw.trim().to_ascii_lowercase();
    match key.as_str() {
        "escape" => KEY_ESCAPE.to_string(),
        "return" => "enter".to_string(),
        " " => "space".to_string(),
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("F1"), "f1");
        assert_eq!(normalize_key("A"), "a");
        assert_eq!(normalize_key("Escape"), "esc");
        assert_eq!(normalize_key("Return"), "enter");
        assert_eq!(normalize_key(" "), "space");
        assert_eq!(normalize_key("Space"), "space");
    }

    #[test]
    fn test_hook_teardown_on_stop() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&torn_down);
        let hook = KeyHook::new(move || flag.store(true, Ordering::SeqCst));
        hook.stop();
        assert!(torn_down.load(Ordering::SeqCst));
    }

    #[test]
    fn test_hook_teardown_on_drop() {
        let torn_down = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&torn_down);
        {
            let _hook = KeyHook::new(move || flag.store(true, Ordering::SeqCst));
        }
        assert!(torn_down.load(Ordering::SeqCst));
    }
}

//! Modal single-shot key capture
//!
//! Consumes exactly one global key event and returns its normalized
//! identifier. The caller must have stopped the background listener first;
//! the capture installs its own temporary hook on the shared source and
//! removes it before returning.

use super::{normalize_key, KeySource};
use crate::Result;
use crossbeam_channel::bounded;
use std::time::Duration;
use tracing::debug;

/// Wait for the next key press on `source`.
///
/// Returns `None` if no key arrives within `timeout`, which callers treat
/// as "leave the binding unchanged".
pub fn capture_key(source: &dyn KeySource, timeout: Duration) -> Result<Option<String>> {
    let (tx, rx) = bounded::<String>(1);

    let hook = source.listen(Box::new(move |raw| {
        // Only the first event matters; later ones hit a full channel.
        let _ = tx.try_send(normalize_key(raw));
    }))?;

    let captured = rx.recv_timeout(timeout).ok();
    hook.stop();

    match &captured {
        Some(key) => debug!("Captured key '{}'", key),
        None => debug!("Key capture timed out"),
    }

    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hotkey::KeyHook;
    use std::thread;

    /// Source that emits a scripted sequence of raw keys after listen().
    struct ScriptedSource {
        keys: Vec<&'static str>,
    }

    impl KeySource for ScriptedSource {
        fn listen(&self, on_key: Box<dyn Fn(&str) + Send + 'static>) -> Result<KeyHook> {
            let keys = self.keys.clone();
            let handle = thread::spawn(move || {
                for key in keys {
                    on_key(key);
                }
            });
            Ok(KeyHook::new(move || {
                let _ = handle.join();
            }))
        }
    }

    #[test]
    fn test_captures_first_key_only() {
        let source = ScriptedSource {
            keys: vec!["F1", "F2", "F3"],
        };
        let key = capture_key(&source, Duration::from_secs(1)).unwrap();
        assert_eq!(key.as_deref(), Some("f1"));
    }

    #[test]
    fn test_escape_is_normalized() {
        let source = ScriptedSource {
            keys: vec!["Escape"],
        };
        let key = capture_key(&source, Duration::from_secs(1)).unwrap();
        assert_eq!(key.as_deref(), Some("esc"));
    }

    #[test]
    fn test_timeout_returns_none() {
        let source = ScriptedSource { keys: vec![] };
        let key = capture_key(&source, Duration::from_millis(50)).unwrap();
        assert!(key.is_none());
    }
}

//! device_query-backed key source
//!
//! Polls the global keyboard state on a background thread and reports
//! newly pressed keys. Polling (rather than an OS hook) keeps the source
//! trivially stoppable and restartable, which the listener relies on when
//! bindings change.

use super::{KeyHook, KeySource};
use crate::Result;
use device_query::{DeviceQuery, DeviceState, Keycode};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Default keyboard poll interval
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(15);

pub struct KeyPoller {
    interval: Duration,
}

impl KeyPoller {
    pub fn new() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Default for KeyPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySource for KeyPoller {
    fn listen(&self, on_key: Box<dyn Fn(&str) + Send + 'static>) -> Result<KeyHook> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let interval = self.interval;

        let handle = thread::spawn(move || {
            let device_state = DeviceState::new();
            let mut held: Vec<Keycode> = Vec::new();

            debug!("Keyboard poller running");
            while !stop_flag.load(Ordering::SeqCst) {
                let keys = device_state.get_keys();
                for key in &keys {
                    // Edge-trigger: report a key once per press, not per poll
                    if !held.contains(key) {
                        on_key(&key.to_string());
                    }
                }
                held = keys;
                thread::sleep(interval);
            }
            debug!("Keyboard poller exited");
        });

        Ok(KeyHook::new(move || {
            stop.store(true, Ordering::SeqCst);
            let _ = handle.join();
        }))
    }
}

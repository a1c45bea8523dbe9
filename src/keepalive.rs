//! The background idle keep-alive scheduler.
//!
//! Grounded on `Kwp2000DiagnosticServer`'s run loop
//! (`src/kwp2000/mod.rs`), which parks a `JoinHandle` behind an
//! `AtomicBool` "is running" flag; simplified here, dropping its `mpsc`
//! command queue, since this crate's driver already serializes every
//! command through one `Mutex` and has no need for a second channel
//! into the same thread.
//!
//! Wakes every
//! [`crate::timing::KEEPALIVE_INTERVAL`], skips its cycle entirely if a
//! command is in flight (the command-active flag, not the mutex, is what
//! lets it opt out cheaply rather than blocking behind a long command),
//! and otherwise takes the session lock for a single ACK/response
//! exchange. Holds only a [`Weak`] reference to the driver's shared
//! state, so it never keeps the driver alive on its own — observing the
//! state disappear is itself a shutdown signal, same as the explicit
//! stop flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::client::{LogSink, SessionState, StateObserver};
use crate::driver::{self, DriverState};
use crate::timing::KEEPALIVE_INTERVAL;

/// Handle to the background keep-alive thread. Dropping it (or calling
/// [`Self::stop`] explicitly, which `disconnect` does) signals the
/// thread to exit and joins it.
pub(crate) struct KeepAlive {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeepAlive {
    pub(crate) fn spawn(
        state: Weak<Mutex<DriverState>>,
        command_active: Arc<AtomicBool>,
        on_log: LogSink,
        on_state_change: StateObserver,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_for_thread = stop.clone();
        let handle = std::thread::Builder::new()
            .name("kwp1281-keepalive".into())
            .spawn(move || run(state, command_active, stop_for_thread, on_log, on_state_change))
            .expect("failed to spawn keep-alive thread");
        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub(crate) fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    state: Weak<Mutex<DriverState>>,
    command_active: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    on_log: LogSink,
    on_state_change: StateObserver,
) {
    while wait_interval(KEEPALIVE_INTERVAL, &stop) {
        if command_active.load(Ordering::SeqCst) {
            continue;
        }

        let Some(shared) = state.upgrade() else {
            break;
        };
        // `on_log`/`on_state_change` fire only after `guard` is dropped
        // below: holding the driver's mutex across a user callback risks
        // a deadlock if the callback re-enters the driver.
        let mut guard = shared.lock().unwrap();
        let outcome = driver::keepalive_exchange(&mut guard);
        if outcome.is_err() {
            driver::mark_disconnected(&mut guard);
        }
        drop(guard);

        match outcome {
            Ok(true) => log::trace!("keep-alive: ACK exchanged"),
            Ok(false) => {
                log::warn!("keep-alive: ECU replied with an unexpected title");
                (*on_log)("keep-alive: ECU replied with an unexpected title");
            }
            Err(err) => {
                log::warn!("keep-alive failed, session lost: {err}");
                (*on_log)(&format!("keep-alive failed: {err}"));
                (*on_state_change)(SessionState::Disconnected);
                break;
            }
        }
    }
}

/// Sleeps up to `interval`, polling `stop` every 50ms so `KeepAlive::stop`
/// doesn't have to wait out a full idle cycle. Returns `false` if a stop
/// was requested before the interval elapsed.
fn wait_interval(interval: Duration, stop: &AtomicBool) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stop.load(Ordering::SeqCst) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50).min(deadline - now));
    }
}

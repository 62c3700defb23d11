//! Cooperative worker lifecycle signals (spec.md §4.5).
//!
//! Grounded on the source's `Worker` base class in `grab/spider/base.py`,
//! which checks a `Event`-backed `pause_event`/`stop_event` pair at the top
//! of every loop iteration. The original loop primitives (`run_worker`'s
//! `tokio::time::sleep_until` staggered-fire loop) are kept as the shape for
//! [`network_pool`](crate::service::network_pool) and
//! [`parser_pool`](crate::service::parser_pool)'s own loops; this module only
//! carries over the atomic-signal idiom, since the load-generation
//! scheduling those workers did has no counterpart here.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

/// Shared stop/pause signal a service loop polls between units of work.
///
/// `stop` is sticky and one-way: once set it is never cleared, matching the
/// source's `stop_event.set()` (a spider never un-stops). `pause` is
/// re-entrant: `pause()`/`resume()` can toggle any number of times across a
/// run, matching `Spider.pause()`/`Spider.resume()`.
///
/// Pause state is carried on a `watch` channel rather than an `AtomicBool` +
/// `Notify`: `Notify::notify_waiters` only wakes waiters already registered
/// at the moment it's called, so a `resume()`/`stop()` landing between a
/// waiter's flag check and its `notified().await` is silently dropped,
/// leaving the waiter parked until the next signal. `watch`'s receiver
/// tracks a version counter rather than a waiter list, so a change is never
/// missed regardless of when it lands relative to the receiver's poll.
#[derive(Debug)]
pub struct WorkerControl {
    stop: AtomicBool,
    paused: watch::Sender<bool>,
}

impl Default for WorkerControl {
    fn default() -> Self {
        let (paused, _rx) = watch::channel(false);
        Self {
            stop: AtomicBool::new(false),
            paused,
        }
    }
}

impl WorkerControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals every worker sharing this control to stop. Idempotent.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
        // Force a version bump even if the paused flag's value is
        // unchanged, so any checkpoint() blocked on `changed()` wakes up
        // and re-checks `is_stopped()`.
        self.paused.send_modify(|_| {});
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn pause(&self) {
        let _ = self.paused.send(true);
    }

    pub fn resume(&self) {
        let _ = self.paused.send(false);
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// The check-in point a worker loop calls between units of work
    /// (the source's `process_pause_signal`). Blocks while paused, wakes
    /// immediately on `resume()` or `stop()`. Returns `false` once stopped —
    /// the loop's cue to exit.
    pub async fn checkpoint(&self) -> bool {
        let mut rx = self.paused.subscribe();
        loop {
            if !*rx.borrow() || self.is_stopped() {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
        !self.is_stopped()
    }
}

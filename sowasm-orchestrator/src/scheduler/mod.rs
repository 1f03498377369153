//! Keyed debounce scheduler
//!
//! Each key owns at most one armed deadline. Re-arming a key replaces its
//! deadline, so a burst of triggers closer together than the delay collapses
//! into a single expiry. The key itself names the action to run: the owner
//! reacts to an expired key by reading its live state, so nothing from the
//! trigger time is carried to the firing time.
//!
//! Deadlines use [`tokio::time::Instant`], so tests can drive the scheduler
//! with a paused clock.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

/// An armed deadline
#[derive(Debug, Clone, Copy)]
struct Armed {
    deadline: Instant,
    /// Arming order, breaks ties between equal deadlines
    seq: u64,
}

/// Keyed debounce timers
#[derive(Debug)]
pub struct Scheduler<K> {
    armed: HashMap<K, Armed>,
    next_seq: u64,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            armed: HashMap::new(),
            next_seq: 0,
        }
    }
}

impl<K> Scheduler<K>
where
    K: Copy + Eq + Hash + Debug,
{
    /// Create a scheduler with no armed keys
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `key` to expire after `delay`, replacing any pending deadline for it
    pub fn schedule(&mut self, key: K, delay: Duration) {
        let deadline = Instant::now() + delay;
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.armed.insert(key, Armed { deadline, seq }).is_some() {
            debug!(key = ?key, delay_ms = delay.as_millis() as u64, "Re-armed debounce timer");
        } else {
            debug!(key = ?key, delay_ms = delay.as_millis() as u64, "Armed debounce timer");
        }
    }

    /// Disarm `key`; returns whether it was pending
    pub fn cancel(&mut self, key: K) -> bool {
        self.armed.remove(&key).is_some()
    }

    /// Disarm every key
    pub fn cancel_all(&mut self) {
        if !self.armed.is_empty() {
            debug!(pending = self.armed.len(), "Cancelling all debounce timers");
        }
        self.armed.clear();
    }

    pub fn is_pending(&self, key: K) -> bool {
        self.armed.contains_key(&key)
    }

    pub fn is_idle(&self) -> bool {
        self.armed.is_empty()
    }

    /// Earliest armed deadline, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.values().map(|a| a.deadline).min()
    }

    /// Remove and return every key whose deadline is at or before `now`.
    ///
    /// Keys come back ordered by deadline, then by arming order.
    pub fn take_due(&mut self, now: Instant) -> Vec<K> {
        let mut due: Vec<(K, Armed)> = self
            .armed
            .iter()
            .filter(|(_, armed)| armed.deadline <= now)
            .map(|(key, armed)| (*key, *armed))
            .collect();

        due.sort_by_key(|(_, armed)| (armed.deadline, armed.seq));

        for (key, _) in &due {
            self.armed.remove(key);
        }

        due.into_iter().map(|(key, _)| key).collect()
    }

    /// Wait for the earliest deadline and return the keys that expired.
    ///
    /// Never resolves while nothing is armed. Dropping the future before it
    /// resolves leaves every timer armed, so it can be raced in `select!`.
    pub async fn expired(&mut self) -> Vec<K> {
        match self.next_deadline() {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.take_due(Instant::now())
            }
            None => std::future::pending().await,
        }
    }
}

//! Submission cooldown.
//!
//! # Responsibility
//! - Gate note submission behind a fixed cooldown.
//!
//! # Invariants
//! - The last submit time moves only on an accepted submission.

use std::cell::Cell;
use std::time::Instant;

/// Monotonic clock in seconds.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Seconds since construction, backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    started_at: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.started_at.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<f64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        self.now.set(now);
    }

    pub fn advance(&self, seconds: f64) {
        self.now.set(self.now.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

/// Pure cooldown check.
pub fn can_submit(now: f64, last_submit: f64, cooldown_secs: f64) -> bool {
    now - last_submit >= cooldown_secs
}

/// Cooldown gate remembering the last accepted submission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubmissionThrottler {
    cooldown_secs: f64,
    last_submit: Option<f64>,
}

impl SubmissionThrottler {
    pub fn new(cooldown_secs: f64) -> Self {
        Self {
            cooldown_secs: cooldown_secs.max(0.0),
            last_submit: None,
        }
    }

    pub fn can_submit(&self, now: f64) -> bool {
        self.last_submit
            .map_or(true, |last| can_submit(now, last, self.cooldown_secs))
    }

    /// Seconds left until the next submission is allowed.
    pub fn remaining(&self, now: f64) -> f64 {
        self.last_submit
            .map_or(0.0, |last| (self.cooldown_secs - (now - last)).max(0.0))
    }

    pub fn record(&mut self, now: f64) {
        self.last_submit = Some(now);
    }
}

// src/engine/scheduler.rs
//! Cycle scheduling
//!
//! One [`CycleScheduler`] per periodic channel (beats, breaths, compressions)
//! tracks the last and next event times on the simulation clock. A rate of
//! zero maps to an infinite interval: the schedule simply never fires again
//! until the rate becomes positive, with no arithmetic exceptions.

use crate::config::timing::MIN_CYCLE_SECS;

/// `interval = 60 / clamp(rate, 0, inf)`, clamped below so runaway-fast rates
/// cannot produce degenerate cycles. Zero, negative, and non-finite rates all
/// yield an infinite interval.
pub fn interval_from_rate(rate: f32) -> f64 {
    if !rate.is_finite() || rate <= 0.0 {
        return f64::INFINITY;
    }
    (60.0 / rate as f64).max(MIN_CYCLE_SECS)
}

/// Next-event bookkeeping for one periodic channel
#[derive(Debug, Clone)]
pub struct CycleScheduler {
    last_event: f64,
    next_event: f64,
}

impl CycleScheduler {
    /// A scheduler that fires immediately once restarted.
    pub fn new() -> Self {
        Self {
            last_event: 0.0,
            next_event: f64::INFINITY,
        }
    }

    /// Arm the schedule to fire at `now`.
    pub fn restart(&mut self, now: f64) {
        self.last_event = now;
        self.next_event = now;
    }

    /// Disarm the schedule and forget event history.
    pub fn clear(&mut self) {
        self.last_event = 0.0;
        self.next_event = f64::INFINITY;
    }

    /// Whether the schedule has no upcoming event.
    pub fn idle(&self) -> bool {
        !self.next_event.is_finite()
    }

    /// Whether the next event is due at `now`.
    pub fn due(&self, now: f64) -> bool {
        self.next_event.is_finite() && now >= self.next_event
    }

    /// Consume the due event and schedule the next one `interval` later.
    ///
    /// The scheduled time, not `now`, becomes the new last-event time, so
    /// catch-up replays do not accumulate drift.
    pub fn fire(&mut self, now: f64, interval: f64) {
        self.last_event = if self.next_event.is_finite() {
            self.next_event
        } else {
            now
        };
        self.next_event = if interval.is_finite() && interval > 0.0 {
            self.last_event + interval
        } else {
            f64::INFINITY
        };
    }

    /// Time since the last event.
    pub fn elapsed_since_last(&self, now: f64) -> f64 {
        now - self.last_event
    }

    /// Interval between the last and next events; infinite when disarmed.
    pub fn current_interval(&self) -> f64 {
        self.next_event - self.last_event
    }

    /// The absolute next-event time.
    pub fn next_event(&self) -> f64 {
        self.next_event
    }

    /// The absolute last-event time.
    pub fn last_event(&self) -> f64 {
        self.last_event
    }
}

impl Default for CycleScheduler {
    fn default() -> Self {
        Self::new()
    }
}

//! Deadline-polled timing primitives.
//!
//! The engine is single-threaded and cooperative: the host calls into it once
//! per rendering tick with the current [`Instant`].  Anything time-driven is
//! therefore expressed as a deadline that the owning state machine checks at
//! tick start, never as a spawned timer task.  Rescheduling replaces the
//! pending deadline, which structurally rules out double-fire.

use std::time::{Duration, Instant};

/// One-shot deadline with cancel-and-reschedule semantics.
///
/// At most one deadline is pending per handle; [`Deadline::schedule`] replaces
/// any previous one and [`Deadline::fire`] reports a due deadline exactly once.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    /// Creates an unarmed handle.
    pub fn new() -> Self {
        Self { at: None }
    }

    /// Arms (or re-arms) the handle to fire at `at`, replacing any pending deadline.
    pub fn schedule(&mut self, at: Instant) {
        self.at = Some(at);
    }

    /// Disarms the handle.
    pub fn cancel(&mut self) {
        self.at = None;
    }

    /// Returns whether a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.at.is_some()
    }

    /// Returns `true` exactly once when the pending deadline has been reached.
    ///
    /// Firing disarms the handle; an unarmed handle never fires.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.at {
            Some(at) if now >= at => {
                self.at = None;
                true
            }
            _ => false,
        }
    }
}

/// A boolean gate that switches on immediately but off only after a delay.
///
/// Used for the overlay hover gate: the panel must accept mouse input the
/// moment a controller ray touches it, but brief ray dropouts (hand jitter,
/// occlusion) must not toggle the input mode off and on again.
///
/// Sequence with a 1 s delay:
/// - `request(true)` at t=0.0 switches on immediately;
/// - `request(false)` at t=2.0 schedules off for t=3.0;
/// - `request(false)` at t=2.5 changes nothing (the first request wins);
/// - `request(true)` at t=2.9 would cancel the pending off;
/// - otherwise `poll` at t=3.1 applies the off.
#[derive(Debug)]
pub struct DelayedOff {
    on: bool,
    delay: Duration,
    off_at: Deadline,
}

impl DelayedOff {
    /// Creates a gate that is initially off.
    pub fn new(delay: Duration) -> Self {
        Self {
            on: false,
            delay,
            off_at: Deadline::new(),
        }
    }

    /// Requests a state: on applies immediately and cancels any pending off;
    /// off schedules the switch for `now + delay` unless one is already pending.
    pub fn request(&mut self, on: bool, now: Instant) {
        if on {
            self.off_at.cancel();
            self.on = true;
        } else if self.on && !self.off_at.is_armed() {
            self.off_at.schedule(now + self.delay);
        }
    }

    /// Applies a due off-switch and returns the current state.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.off_at.fire(now) {
            self.on = false;
        }
        self.on
    }

    /// Returns the current state without advancing time.
    pub fn is_on(&self) -> bool {
        self.on
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

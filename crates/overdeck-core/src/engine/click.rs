//! Click-count classification.
//!
//! A click is a Down and a matching Up on the same element within the arm
//! window. Confirmed clicks accumulate until the multi-click window passes
//! without a new one, then the whole burst is reported at once with its
//! count, so a triple click reaches the UI as one `Click { count: 3 }`
//! rather than three single clicks.

use std::time::{Duration, Instant};

use tracing::trace;

use crate::event::raw::Hand;
use crate::event::ui::{PointerButton, PressedButtons};
use crate::panel::{ElementId, PanelPoint};
use crate::timing::Deadline;

/// How long a Down stays armed waiting for its matching Up.
pub const CLICK_ARM_WINDOW: Duration = Duration::from_millis(200);

/// Default quiet period that finalizes an accumulated click burst.
pub const DEFAULT_MULTI_CLICK_WINDOW: Duration = Duration::from_millis(500);

/// Where and how the confirming Up happened; replayed into the Click event
/// when the burst finalizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickContext {
    pub target: ElementId,
    pub hand: Hand,
    pub position: PanelPoint,
    pub button: PointerButton,
    pub held: PressedButtons,
}

/// A finalized run of clicks on one element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickBurst {
    pub context: ClickContext,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ArmState {
    Idle,
    Armed { target: ElementId, until: Instant },
}

/// Click-count state machine. One per bridge.
#[derive(Debug)]
pub struct ClickClassifier {
    arm: ArmState,
    confirmed: Vec<Instant>,
    last_context: Option<ClickContext>,
    flush_at: Deadline,
    window: Duration,
}

impl Default for ClickClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ClickClassifier {
    pub fn new() -> Self {
        ClickClassifier {
            arm: ArmState::Idle,
            confirmed: Vec::new(),
            last_context: None,
            flush_at: Deadline::new(),
            window: DEFAULT_MULTI_CLICK_WINDOW,
        }
    }

    /// Sets the quiet period after which an accumulated burst finalizes.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Arms a click candidate for `target`. A new Down always re-arms, even
    /// when an earlier arm for a different element is still pending.
    pub fn arm(&mut self, target: ElementId, now: Instant) {
        self.arm = ArmState::Armed {
            target,
            until: now + CLICK_ARM_WINDOW,
        };
    }

    /// Feeds an Up. Returns true when it confirmed a click.
    ///
    /// An Up on a different element than the armed one records nothing and
    /// leaves the arm in place until its window lapses, so a still-timely Up
    /// on the armed element can follow it.
    pub fn confirm(&mut self, target: ElementId, now: Instant, context: ClickContext) -> bool {
        let ArmState::Armed { target: armed, until } = self.arm else {
            return false;
        };
        if now > until {
            trace!(element = armed.0, "click arm lapsed before the up arrived");
            self.arm = ArmState::Idle;
            return false;
        }
        if armed != target {
            return false;
        }
        self.arm = ArmState::Idle;
        self.confirmed.push(now);
        self.last_context = Some(context);
        // Every confirmed click restarts the quiet period.
        self.flush_at.schedule(now + self.window);
        true
    }

    /// Services the classifier's timers. Returns the finalized burst when the
    /// quiet period has passed, at most once per burst.
    pub fn poll(&mut self, now: Instant) -> Option<ClickBurst> {
        if let ArmState::Armed { until, .. } = self.arm {
            if now > until {
                self.arm = ArmState::Idle;
            }
        }
        if !self.flush_at.fire(now) {
            return None;
        }
        self.take_burst()
    }

    /// Forces the pending burst out immediately, for event-source
    /// discontinuities. Also discards any pending arm.
    pub fn flush(&mut self) -> Option<ClickBurst> {
        self.arm = ArmState::Idle;
        self.flush_at.cancel();
        self.take_burst()
    }

    /// Number of clicks accumulated in the burst so far.
    pub fn pending(&self) -> usize {
        self.confirmed.len()
    }

    fn take_burst(&mut self) -> Option<ClickBurst> {
        let count = self.confirmed.len() as u32;
        self.confirmed.clear();
        let context = self.last_context.take()?;
        if count == 0 {
            return None;
        }
        Some(ClickBurst { context, count })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_context(target: ElementId) -> ClickContext {
        ClickContext {
            target,
            hand: Hand::Primary,
            position: PanelPoint::new(10.0, 10.0),
            button: PointerButton::Left,
            held: PressedButtons::NONE,
        }
    }

    fn secs(s: f32) -> Duration {
        Duration::from_secs_f32(s)
    }

    #[test]
    fn test_down_then_timely_up_confirms_one_click() {
        // Arrange
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();
        let target = ElementId(1);

        // Act
        classifier.arm(target, t0);
        let confirmed = classifier.confirm(target, t0 + secs(0.1), make_context(target));

        // Assert
        assert!(confirmed);
        assert_eq!(classifier.pending(), 1);
    }

    #[test]
    fn test_two_clicks_inside_the_window_finalize_once_with_count_two() {
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();
        let target = ElementId(1);

        // First click.
        classifier.arm(target, t0);
        classifier.confirm(target, t0 + secs(0.05), make_context(target));
        // Second click 0.1s later, well inside the 0.5s window.
        classifier.arm(target, t0 + secs(0.15));
        classifier.confirm(target, t0 + secs(0.2), make_context(target));

        // The quiet period restarts from the second confirmation.
        assert_eq!(classifier.poll(t0 + secs(0.6)), None);
        let burst = classifier.poll(t0 + secs(0.71)).unwrap();
        assert_eq!(burst.count, 2);
        assert_eq!(burst.context.target, target);

        // The burst comes out exactly once.
        assert_eq!(classifier.poll(t0 + secs(5.0)), None);
    }

    #[test]
    fn test_up_on_a_different_element_records_nothing() {
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();

        classifier.arm(ElementId(1), t0);
        let confirmed = classifier.confirm(ElementId(2), t0 + secs(0.1), make_context(ElementId(2)));

        assert!(!confirmed);
        assert_eq!(classifier.pending(), 0);
        // The arm lapses silently with no further effect.
        assert_eq!(classifier.poll(t0 + secs(0.21)), None);
        assert_eq!(classifier.poll(t0 + secs(10.0)), None);
    }

    #[test]
    fn test_mismatched_up_leaves_the_arm_available_for_a_timely_match() {
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();
        let target = ElementId(1);

        classifier.arm(target, t0);
        assert!(!classifier.confirm(ElementId(2), t0 + secs(0.05), make_context(ElementId(2))));
        assert!(classifier.confirm(target, t0 + secs(0.1), make_context(target)));
    }

    #[test]
    fn test_up_after_the_arm_window_confirms_nothing() {
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();
        let target = ElementId(1);

        classifier.arm(target, t0);
        let confirmed = classifier.confirm(target, t0 + secs(0.3), make_context(target));

        assert!(!confirmed);
        assert_eq!(classifier.pending(), 0);
    }

    #[test]
    fn test_a_new_down_rearms_even_for_a_different_element() {
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();

        classifier.arm(ElementId(1), t0);
        classifier.arm(ElementId(2), t0 + secs(0.05));

        // The first arm is gone; only the second can confirm.
        assert!(!classifier.confirm(ElementId(1), t0 + secs(0.1), make_context(ElementId(1))));
        assert!(classifier.confirm(ElementId(2), t0 + secs(0.1), make_context(ElementId(2))));
    }

    #[test]
    fn test_configured_window_stretches_the_burst() {
        let mut classifier = ClickClassifier::new();
        classifier.set_window(secs(1.0));
        let t0 = Instant::now();
        let target = ElementId(1);

        classifier.arm(target, t0);
        classifier.confirm(target, t0 + secs(0.1), make_context(target));

        assert_eq!(classifier.poll(t0 + secs(0.9)), None);
        let burst = classifier.poll(t0 + secs(1.2)).unwrap();
        assert_eq!(burst.count, 1);
    }

    #[test]
    fn test_flush_forces_the_burst_out_and_disarms() {
        let mut classifier = ClickClassifier::new();
        let t0 = Instant::now();
        let target = ElementId(1);

        classifier.arm(target, t0);
        classifier.confirm(target, t0 + secs(0.1), make_context(target));
        classifier.arm(target, t0 + secs(0.15));

        let burst = classifier.flush().unwrap();
        assert_eq!(burst.count, 1);
        // The pending arm was discarded with it.
        assert!(!classifier.confirm(target, t0 + secs(0.2), make_context(target)));
        assert_eq!(classifier.flush(), None);
    }
}

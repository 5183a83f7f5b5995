//! Drag lifecycle with timeout recovery.
//!
//! One drag at most is live system-wide. The owning hand's Move stream keeps
//! it alive by extending the expiry deadline; if the stream stalls past the
//! expiry window the drag dies on its own. Only [`DragTracker::stop`] hands
//! back the release record, so a silent timeout can never be confused with a
//! real release by the caller.

use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::event::raw::{CursorSlot, Hand};
use crate::event::ui::PointerButton;
use crate::panel::ElementId;

/// How long a drag survives without an extend from its owner.
pub const DRAG_EXPIRY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy)]
struct ActiveDrag {
    target: ElementId,
    hand: Hand,
    cursor: CursorSlot,
    button: PointerButton,
    expires_at: Instant,
}

/// Record of a drag ended by an explicit stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragRelease {
    pub target: ElementId,
    pub hand: Hand,
    pub cursor: CursorSlot,
    pub button: PointerButton,
}

/// Record of a drag that timed out with no stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiredDrag {
    pub target: ElementId,
    pub hand: Hand,
    pub button: PointerButton,
}

/// The single system-wide drag slot.
#[derive(Debug, Default)]
pub struct DragTracker {
    active: Option<ActiveDrag>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begins a drag owned by `hand`. Ignored while another drag is live.
    pub fn start(
        &mut self,
        target: ElementId,
        hand: Hand,
        cursor: CursorSlot,
        button: PointerButton,
        now: Instant,
    ) {
        if let Some(active) = &self.active {
            warn!(
                owner = ?active.hand,
                contender = ?hand,
                "drag start ignored while another drag is active"
            );
            return;
        }
        trace!(element = target.0, hand = ?hand, "drag started");
        self.active = Some(ActiveDrag {
            target,
            hand,
            cursor,
            button,
            expires_at: now + DRAG_EXPIRY,
        });
    }

    /// Pushes the expiry deadline out to `now` plus the expiry window.
    /// No-op when no drag is live.
    pub fn extend(&mut self, now: Instant) {
        if let Some(active) = &mut self.active {
            active.expires_at = now + DRAG_EXPIRY;
        }
    }

    /// Ends the drag and returns its release record exactly once.
    pub fn stop(&mut self) -> Option<DragRelease> {
        let active = self.active.take()?;
        trace!(element = active.target.0, "drag stopped");
        Some(DragRelease {
            target: active.target,
            hand: active.hand,
            cursor: active.cursor,
            button: active.button,
        })
    }

    /// Expires the drag when its deadline has passed. The release record is
    /// intentionally withheld here; the caller decides how to recover.
    pub fn poll(&mut self, now: Instant) -> Option<ExpiredDrag> {
        let due = matches!(&self.active, Some(active) if now >= active.expires_at);
        if !due {
            return None;
        }
        let expired = self.active.take()?;
        warn!(
            element = expired.target.0,
            hand = ?expired.hand,
            "drag expired without a release"
        );
        Some(ExpiredDrag {
            target: expired.target,
            hand: expired.hand,
            button: expired.button,
        })
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Hand owning the live drag, if any.
    pub fn owner(&self) -> Option<Hand> {
        self.active.map(|a| a.hand)
    }

    /// Element the live drag started on, if any.
    pub fn target(&self) -> Option<ElementId> {
        self.active.map(|a| a.target)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

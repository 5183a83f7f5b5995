//! Per-hand, per-tick event buffer.
//!
//! The runtime can report several events of the same kind for one hand within
//! a single poll; only the newest is meaningful, so each kind gets exactly one
//! slot and later records overwrite earlier ones. The snapshot also carries
//! the two pieces of state that outlive a tick: whether the hand's pointer is
//! on the overlay, and which elements it hovers.

use std::collections::HashSet;

use crate::event::raw::{
    ButtonPressEvent, ButtonUnpressEvent, FocusLeaveEvent, MouseDownEvent, MouseMoveEvent,
    MouseUpEvent, RawOverlayEvent, ScrollEvent,
};
use crate::panel::ElementId;

/// One hand's view of the current tick.
#[derive(Debug, Default)]
pub struct FrameSnapshot {
    focus_leave: Option<FocusLeaveEvent>,
    mouse_down: Option<MouseDownEvent>,
    mouse_move: Option<MouseMoveEvent>,
    mouse_up: Option<MouseUpEvent>,
    scroll: Option<ScrollEvent>,
    button_press: Option<ButtonPressEvent>,
    button_unpress: Option<ButtonUnpressEvent>,
    is_inside: bool,
    hover_prev: HashSet<ElementId>,
    hover_curr: HashSet<ElementId>,
}

impl FrameSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears every per-kind slot. Insideness and hover history persist.
    pub fn reset(&mut self) {
        self.focus_leave = None;
        self.mouse_down = None;
        self.mouse_move = None;
        self.mouse_up = None;
        self.scroll = None;
        self.button_press = None;
        self.button_unpress = None;
    }

    /// Stores `event` into the slot for its kind, overwriting any earlier
    /// event of the same kind from this tick.
    pub fn record(&mut self, event: RawOverlayEvent) {
        match event {
            RawOverlayEvent::FocusLeave(e) => self.focus_leave = Some(e),
            RawOverlayEvent::MouseDown(e) => self.mouse_down = Some(e),
            RawOverlayEvent::MouseMove(e) => self.mouse_move = Some(e),
            RawOverlayEvent::MouseUp(e) => self.mouse_up = Some(e),
            RawOverlayEvent::Scroll(e) => self.scroll = Some(e),
            RawOverlayEvent::ButtonPress(e) => self.button_press = Some(e),
            RawOverlayEvent::ButtonUnpress(e) => self.button_unpress = Some(e),
        }
    }

    /// Settles derived state once the tick's drain is complete.
    ///
    /// A Move proves the pointer is on the overlay, so it wins over a
    /// FocusLeave collected in the same tick; the stale FocusLeave is
    /// discarded. Without a Move, a FocusLeave marks the hand outside.
    pub fn post_collect(&mut self) {
        if self.mouse_move.is_some() {
            self.is_inside = true;
            self.focus_leave = None;
        } else if self.focus_leave.is_some() {
            self.is_inside = false;
        }
    }

    /// True when any slot was filled this tick.
    pub fn has_changed(&self) -> bool {
        self.focus_leave.is_some()
            || self.mouse_down.is_some()
            || self.mouse_move.is_some()
            || self.mouse_up.is_some()
            || self.scroll.is_some()
            || self.button_press.is_some()
            || self.button_unpress.is_some()
    }

    /// Whether the hand's pointer is currently on the overlay.
    pub fn is_inside(&self) -> bool {
        self.is_inside
    }

    pub fn focus_leave(&self) -> Option<FocusLeaveEvent> {
        self.focus_leave
    }

    pub fn mouse_down(&self) -> Option<MouseDownEvent> {
        self.mouse_down
    }

    pub fn mouse_move(&self) -> Option<MouseMoveEvent> {
        self.mouse_move
    }

    pub fn mouse_up(&self) -> Option<MouseUpEvent> {
        self.mouse_up
    }

    pub fn scroll(&self) -> Option<ScrollEvent> {
        self.scroll
    }

    pub fn button_press(&self) -> Option<ButtonPressEvent> {
        self.button_press
    }

    pub fn button_unpress(&self) -> Option<ButtonUnpressEvent> {
        self.button_unpress
    }

    /// The hand's hover set as of the last resolved tick.
    pub fn hover_previous(&self) -> &HashSet<ElementId> {
        &self.hover_prev
    }

    /// Elements picked by this tick's Move. Meaningful only while the tick's
    /// hover resolution is in flight.
    pub fn hover_current(&self) -> &HashSet<ElementId> {
        &self.hover_curr
    }

    pub(crate) fn hover_current_mut(&mut self) -> &mut HashSet<ElementId> {
        &mut self.hover_curr
    }

    pub(crate) fn clear_hover(&mut self) {
        self.hover_prev.clear();
        self.hover_curr.clear();
    }

    /// Promotes this tick's picks to the resolved hover set.
    ///
    /// Called only for hands whose hover was refreshed this tick, after the
    /// cross-hand diff has been emitted.
    pub fn shift_hover_history(&mut self) {
        std::mem::swap(&mut self.hover_prev, &mut self.hover_curr);
        self.hover_curr.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::raw::{CursorSlot, DeviceButton, DeviceIndex};

    fn make_move(x: f32, y: f32) -> RawOverlayEvent {
        RawOverlayEvent::MouseMove(MouseMoveEvent {
            cursor: CursorSlot(0),
            device: DeviceIndex(3),
            x,
            y,
        })
    }

    #[test]
    fn test_record_keeps_only_the_newest_event_per_kind() {
        // Arrange
        let mut snapshot = FrameSnapshot::new();

        // Act
        snapshot.record(make_move(1.0, 1.0));
        snapshot.record(make_move(9.0, 9.0));

        // Assert – last write wins
        let stored = snapshot.mouse_move().unwrap();
        assert_eq!((stored.x, stored.y), (9.0, 9.0));
    }

    #[test]
    fn test_post_collect_lets_a_move_override_a_stale_focus_leave() {
        let mut snapshot = FrameSnapshot::new();
        snapshot.record(RawOverlayEvent::FocusLeave(FocusLeaveEvent {
            cursor: CursorSlot(0),
        }));
        snapshot.record(make_move(5.0, 5.0));

        snapshot.post_collect();

        assert!(snapshot.is_inside());
        assert!(snapshot.focus_leave().is_none());
    }

    #[test]
    fn test_post_collect_marks_the_hand_outside_on_a_lone_focus_leave() {
        let mut snapshot = FrameSnapshot::new();
        snapshot.record(make_move(5.0, 5.0));
        snapshot.post_collect();
        snapshot.reset();

        snapshot.record(RawOverlayEvent::FocusLeave(FocusLeaveEvent {
            cursor: CursorSlot(0),
        }));
        snapshot.post_collect();

        assert!(!snapshot.is_inside());
        assert!(snapshot.focus_leave().is_some());
    }

    #[test]
    fn test_post_collect_leaves_insideness_alone_without_move_or_focus_leave() {
        let mut snapshot = FrameSnapshot::new();
        snapshot.record(make_move(5.0, 5.0));
        snapshot.post_collect();
        snapshot.reset();

        snapshot.record(RawOverlayEvent::ButtonPress(ButtonPressEvent {
            device: DeviceIndex(3),
            button: 1,
        }));
        snapshot.post_collect();

        assert!(snapshot.is_inside());
    }

    #[test]
    fn test_reset_clears_slots_but_keeps_persistent_state() {
        let mut snapshot = FrameSnapshot::new();
        snapshot.record(make_move(5.0, 5.0));
        snapshot.record(RawOverlayEvent::MouseDown(MouseDownEvent {
            cursor: CursorSlot(0),
            button: DeviceButton::Trigger,
            x: 5.0,
            y: 5.0,
        }));
        snapshot.post_collect();
        snapshot.hover_current_mut().insert(ElementId(4));
        snapshot.shift_hover_history();

        snapshot.reset();

        assert!(!snapshot.has_changed());
        assert!(snapshot.is_inside());
        assert!(snapshot.hover_previous().contains(&ElementId(4)));
    }

    #[test]
    fn test_shift_hover_history_promotes_current_and_clears_it() {
        let mut snapshot = FrameSnapshot::new();
        snapshot.hover_current_mut().insert(ElementId(1));
        snapshot.hover_current_mut().insert(ElementId(2));

        snapshot.shift_hover_history();

        assert!(snapshot.hover_previous().contains(&ElementId(1)));
        assert!(snapshot.hover_previous().contains(&ElementId(2)));
        assert!(snapshot.hover_current().is_empty());
    }
}

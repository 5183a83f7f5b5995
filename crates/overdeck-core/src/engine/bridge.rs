//! Per-tick orchestration.
//!
//! # How a tick flows (for beginners)
//!
//! The host calls [`InputBridge::pump`] once per rendering tick. One pump:
//!
//! 1. services the two deadline-driven pieces of state (drag expiry, click
//!    burst finalization), which must run even on ticks with no events;
//! 2. resets both hands' snapshots and drains the runtime's queue once, in
//!    arrival order, classifying each raw event onto a hand;
//! 3. settles derived snapshot state, then returns early when nothing at all
//!    happened;
//! 4. runs exactly one of three branches: drag continuation (owner hand
//!    only), focus-out (no pointer on the overlay), or the normal down/move
//!    path with Primary-first down arbitration;
//! 5. forwards scroll and controller-button events for both hands
//!    unconditionally;
//! 6. resolves hover enters/leaves across both hands at once and rotates the
//!    hover history of every hand whose picks were refreshed.
//!
//! The bridge owns all mutable state (slot table, snapshots, click and drag
//! machines, held-button masks, last on-surface points) and runs strictly
//! single-threaded; time is passed in explicitly so ticks are replayable.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::engine::click::{ClickClassifier, ClickContext};
use crate::engine::cursor::CursorRegistry;
use crate::engine::dispatch;
use crate::engine::drag::DragTracker;
use crate::engine::hover;
use crate::engine::snapshot::FrameSnapshot;
use crate::event::raw::{DeviceIndex, Hand, RawOverlayEvent, MAX_POINTERS};
use crate::event::ui::{
    KeyCode, KeyEventData, PointerButton, PointerEventData, PressedButtons, WheelEventData,
};
use crate::panel::{ElementId, PanelPoint, PanelSurface, UiPanel};

/// Source of raw events for one overlay, polled once per tick.
pub trait EventFeed {
    /// Next pending event in arrival order; `None` ends this tick's drain.
    fn poll_event(&mut self) -> Option<RawOverlayEvent>;

    /// Device currently holding the dominant input role.
    fn dominant_device(&self) -> DeviceIndex;
}

/// The per-overlay input orchestrator.
pub struct InputBridge {
    snapshots: [FrameSnapshot; MAX_POINTERS],
    registry: CursorRegistry,
    clicks: ClickClassifier,
    drag: DragTracker,
    held: [PressedButtons; MAX_POINTERS],
    last_point: [Option<PanelPoint>; MAX_POINTERS],
    pick_chain: Vec<ElementId>,
}

impl Default for InputBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl InputBridge {
    pub fn new() -> Self {
        InputBridge {
            snapshots: [FrameSnapshot::new(), FrameSnapshot::new()],
            registry: CursorRegistry::new(),
            clicks: ClickClassifier::new(),
            drag: DragTracker::new(),
            held: [PressedButtons::NONE; MAX_POINTERS],
            last_point: [None; MAX_POINTERS],
            pick_chain: Vec::new(),
        }
    }

    /// Sets the quiet period that finalizes a click burst. Comes from user
    /// preferences; takes effect from the next confirmed click.
    pub fn set_multi_click_window(&mut self, window: Duration) {
        self.clicks.set_window(window);
    }

    /// True while a drag is live.
    pub fn is_dragging(&self) -> bool {
        self.drag.is_active()
    }

    /// Runs one tick.
    pub fn pump(
        &mut self,
        now: Instant,
        feed: &mut dyn EventFeed,
        panel: &dyn UiPanel,
        surface: &PanelSurface,
    ) {
        self.service_timers(now, panel);

        for snap in &mut self.snapshots {
            snap.reset();
        }

        // The dominant role is sampled once and used for every resolution in
        // this tick, so a mid-drain handover cannot split one tick's events
        // across inconsistent hand assignments.
        let dominant = feed.dominant_device();
        let mut drained = 0usize;
        while let Some(event) = feed.poll_event() {
            let hand = self.classify(&event, dominant);
            self.snapshots[hand.index()].record(event);
            drained += 1;
        }
        if drained > 0 {
            trace!(events = drained, "tick drained");
        }

        for snap in &mut self.snapshots {
            snap.post_collect();
        }
        if !self.snapshots.iter().any(FrameSnapshot::has_changed) {
            return;
        }

        let mut refreshed = [false; MAX_POINTERS];

        // A hand whose pointer left the overlay hovers nothing from here on;
        // fold that into this tick's hover resolution. A Move in the same
        // tick has already discarded the stale FocusLeave.
        for hand in Hand::BOTH {
            let idx = hand.index();
            if self.snapshots[idx].focus_leave().is_some() {
                self.snapshots[idx].hover_current_mut().clear();
                refreshed[idx] = true;
            }
        }

        if let Some(owner) = self.drag.owner() {
            self.pump_drag_owner(now, owner, panel, surface, &mut refreshed);
        } else if !self.snapshots.iter().any(FrameSnapshot::is_inside) {
            dispatch::focus_out(panel, panel.root());
        } else {
            self.pump_downs(now, panel, surface);
            self.pump_moves(panel, surface, &mut refreshed);
        }

        self.pump_auxiliary(panel);

        if refreshed.iter().any(|&r| r) {
            self.resolve_hover(panel, refreshed);
        }
    }

    /// Forcibly un-hovers everything, synthesizing PointerLeave for every
    /// element either hand was on. Call whenever the event source becomes
    /// discontinuous (overlay hidden, teleported or re-anchored).
    pub fn reset_hover(&mut self, panel: &dyn UiPanel) {
        let leaves = hover::reset(&mut self.snapshots);
        if !leaves.is_empty() {
            debug!(elements = leaves.len(), "hover reset");
        }
        for change in &leaves {
            dispatch::pointer_leave(panel, change.element, self.hover_data(change.hand));
        }
    }

    // ── Tick internals ────────────────────────────────────────────────────────

    fn service_timers(&mut self, now: Instant, panel: &dyn UiPanel) {
        if let Some(expired) = self.drag.poll(now) {
            // The owner's stream stalled; without a synthetic Up the element
            // would keep implicit capture forever. Release at the last known
            // on-surface point.
            let idx = expired.hand.index();
            self.held[idx].release(expired.button);
            let data = PointerEventData {
                hand: expired.hand,
                position: self.last_point[idx].unwrap_or(PanelPoint::ORIGIN),
                button: Some(expired.button),
                held: self.held[idx],
                dragging: false,
            };
            dispatch::pointer_up(panel, expired.target, data);
        }
        if let Some(burst) = self.clicks.poll(now) {
            let context = burst.context;
            dispatch::click(panel, context.target, Self::burst_data(context), burst.count);
        }
    }

    fn classify(&mut self, event: &RawOverlayEvent, dominant: DeviceIndex) -> Hand {
        match event {
            RawOverlayEvent::FocusLeave(e) => self.registry.resolve_slot(e.cursor, dominant),
            RawOverlayEvent::MouseDown(e) => self.registry.resolve_slot(e.cursor, dominant),
            RawOverlayEvent::MouseMove(e) => {
                // The only kind carrying both ids, and therefore the only
                // place the slot table learns anything.
                self.registry.record(e.cursor, e.device);
                CursorRegistry::resolve_device(e.device, dominant)
            }
            RawOverlayEvent::MouseUp(e) => self.registry.resolve_slot(e.cursor, dominant),
            RawOverlayEvent::Scroll(e) => self.registry.resolve_slot(e.cursor, dominant),
            RawOverlayEvent::ButtonPress(e) => CursorRegistry::resolve_device(e.device, dominant),
            RawOverlayEvent::ButtonUnpress(e) => CursorRegistry::resolve_device(e.device, dominant),
        }
    }

    /// While a drag is live only the owning hand's Move, Up and FocusLeave
    /// participate; the other hand cannot move, press or release the pointer.
    fn pump_drag_owner(
        &mut self,
        now: Instant,
        owner: Hand,
        panel: &dyn UiPanel,
        surface: &PanelSurface,
        refreshed: &mut [bool; MAX_POINTERS],
    ) {
        let idx = owner.index();

        if let Some(mv) = self.snapshots[idx].mouse_move() {
            self.drag.extend(now);
            match surface.map_position(mv.x, mv.y) {
                Some(point) => {
                    self.last_point[idx] = Some(point);
                    self.refresh_hover(idx, panel, point);
                    refreshed[idx] = true;
                    if let Some(target) = self.drag.target() {
                        let data = PointerEventData {
                            hand: owner,
                            position: point,
                            button: None,
                            held: self.held[idx],
                            dragging: true,
                        };
                        dispatch::pointer_move(panel, target, data);
                    }
                }
                None => {
                    trace!(hand = ?owner, "off-surface drag move dropped");
                    self.snapshots[idx].hover_current_mut().clear();
                    refreshed[idx] = true;
                }
            }
        }

        if let Some(up) = self.snapshots[idx].mouse_up() {
            if let Some(release) = self.drag.stop() {
                let position = surface
                    .map_position(up.x, up.y)
                    .or(self.last_point[idx])
                    .unwrap_or(PanelPoint::ORIGIN);
                self.last_point[idx] = Some(position);
                self.held[idx].release(release.button);
                let data = PointerEventData {
                    hand: owner,
                    position,
                    button: Some(release.button),
                    held: self.held[idx],
                    dragging: false,
                };
                dispatch::pointer_up(panel, release.target, data);
                let context = ClickContext {
                    target: release.target,
                    hand: owner,
                    position,
                    button: release.button,
                    held: self.held[idx],
                };
                self.clicks.confirm(release.target, now, context);
            }
        }

        if self.snapshots[idx].focus_leave().is_some() {
            // Focus loss cuts the drag short. No Up is forwarded: the press
            // never ended, the pointer vanished.
            if let Some(release) = self.drag.stop() {
                debug!(hand = ?owner, element = release.target.0, "drag cut short by focus loss");
                self.held[idx].release(release.button);
            }
        }
    }

    /// Primary-first down arbitration: at most one Down wins per tick, even
    /// under simultaneous presses. An off-surface Down is dropped and passes
    /// the chance to the other hand.
    fn pump_downs(&mut self, now: Instant, panel: &dyn UiPanel, surface: &PanelSurface) {
        for hand in Hand::BOTH {
            let idx = hand.index();
            let Some(down) = self.snapshots[idx].mouse_down() else {
                continue;
            };
            let Some(point) = surface.map_position(down.x, down.y) else {
                trace!(hand = ?hand, "off-surface down dropped");
                continue;
            };
            let button = PointerButton::from(down.button);
            let target = panel.pick(point).unwrap_or_else(|| panel.root());
            self.last_point[idx] = Some(point);
            self.held[idx].press(button);
            self.clicks.arm(target, now);
            self.drag.start(target, hand, down.cursor, button, now);
            let data = PointerEventData {
                hand,
                position: point,
                button: Some(button),
                held: self.held[idx],
                dragging: false,
            };
            dispatch::pointer_down(panel, target, data);
            break;
        }
    }

    fn pump_moves(
        &mut self,
        panel: &dyn UiPanel,
        surface: &PanelSurface,
        refreshed: &mut [bool; MAX_POINTERS],
    ) {
        for hand in Hand::BOTH {
            let idx = hand.index();
            let Some(mv) = self.snapshots[idx].mouse_move() else {
                continue;
            };
            match surface.map_position(mv.x, mv.y) {
                Some(point) => {
                    self.last_point[idx] = Some(point);
                    let topmost = self.refresh_hover(idx, panel, point);
                    refreshed[idx] = true;
                    let target = topmost.unwrap_or_else(|| panel.root());
                    let data = PointerEventData {
                        hand,
                        position: point,
                        button: None,
                        held: self.held[idx],
                        dragging: false,
                    };
                    dispatch::pointer_move(panel, target, data);
                }
                None => {
                    trace!(hand = ?hand, "off-surface move dropped");
                    self.snapshots[idx].hover_current_mut().clear();
                    refreshed[idx] = true;
                }
            }
        }
    }

    /// Scroll and controller buttons flow for both hands regardless of drag
    /// state or insideness.
    fn pump_auxiliary(&mut self, panel: &dyn UiPanel) {
        for hand in Hand::BOTH {
            let idx = hand.index();
            if let Some(scroll) = self.snapshots[idx].scroll() {
                let target = self
                    .last_point[idx]
                    .and_then(|point| panel.pick(point))
                    .unwrap_or_else(|| panel.root());
                let data = WheelEventData {
                    hand,
                    position: self.last_point[idx].unwrap_or(PanelPoint::ORIGIN),
                    delta_x: scroll.delta_x,
                    delta_y: scroll.delta_y,
                };
                dispatch::wheel(panel, target, data);
            }
            if let Some(press) = self.snapshots[idx].button_press() {
                let data = KeyEventData {
                    hand,
                    code: KeyCode::controller(hand, press.button),
                };
                dispatch::key_down(panel, panel.root(), data);
            }
            if let Some(unpress) = self.snapshots[idx].button_unpress() {
                let data = KeyEventData {
                    hand,
                    code: KeyCode::controller(hand, unpress.button),
                };
                dispatch::key_up(panel, panel.root(), data);
            }
        }
    }

    fn resolve_hover(&mut self, panel: &dyn UiPanel, refreshed: [bool; MAX_POINTERS]) {
        let diff = hover::resolve(&self.snapshots, refreshed);
        for change in &diff.leaves {
            dispatch::pointer_leave(panel, change.element, self.hover_data(change.hand));
        }
        for change in &diff.enters {
            dispatch::pointer_enter(panel, change.element, self.hover_data(change.hand));
        }
        for (idx, was_refreshed) in refreshed.iter().enumerate() {
            if *was_refreshed {
                self.snapshots[idx].shift_hover_history();
            }
        }
    }

    fn refresh_hover(
        &mut self,
        idx: usize,
        panel: &dyn UiPanel,
        point: PanelPoint,
    ) -> Option<ElementId> {
        let topmost = panel.pick_all(point, &mut self.pick_chain);
        let current = self.snapshots[idx].hover_current_mut();
        current.clear();
        current.extend(self.pick_chain.iter().copied());
        topmost
    }

    fn hover_data(&self, hand: Hand) -> PointerEventData {
        let idx = hand.index();
        PointerEventData {
            hand,
            position: self.last_point[idx].unwrap_or(PanelPoint::ORIGIN),
            button: None,
            held: self.held[idx],
            dragging: self.drag.owner() == Some(hand),
        }
    }

    fn burst_data(context: ClickContext) -> PointerEventData {
        PointerEventData {
            hand: context.hand,
            position: context.position,
            button: Some(context.button),
            held: context.held,
            dragging: false,
        }
    }
}

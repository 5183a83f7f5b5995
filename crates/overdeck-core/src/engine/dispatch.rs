//! Stateless delivery of synthetic events into the UI tree.
//!
//! Every send goes through one of these helpers so delivery is logged in one
//! place. High-frequency kinds (moves, hover transitions) log at trace level,
//! everything else at debug.

use tracing::{debug, trace};

use crate::event::ui::{KeyEventData, PointerEventData, UiEvent, WheelEventData};
use crate::panel::{ElementId, UiPanel};

pub fn pointer_down(panel: &dyn UiPanel, target: ElementId, data: PointerEventData) {
    debug!(element = target.0, hand = ?data.hand, button = ?data.button, "pointer down");
    panel.send(target, &UiEvent::PointerDown(data));
}

pub fn pointer_move(panel: &dyn UiPanel, target: ElementId, data: PointerEventData) {
    trace!(element = target.0, hand = ?data.hand, dragging = data.dragging, "pointer move");
    panel.send(target, &UiEvent::PointerMove(data));
}

pub fn pointer_up(panel: &dyn UiPanel, target: ElementId, data: PointerEventData) {
    debug!(element = target.0, hand = ?data.hand, button = ?data.button, "pointer up");
    panel.send(target, &UiEvent::PointerUp(data));
}

pub fn pointer_enter(panel: &dyn UiPanel, target: ElementId, data: PointerEventData) {
    trace!(element = target.0, hand = ?data.hand, "pointer enter");
    panel.send(target, &UiEvent::PointerEnter(data));
}

pub fn pointer_leave(panel: &dyn UiPanel, target: ElementId, data: PointerEventData) {
    trace!(element = target.0, hand = ?data.hand, "pointer leave");
    panel.send(target, &UiEvent::PointerLeave(data));
}

pub fn click(panel: &dyn UiPanel, target: ElementId, data: PointerEventData, count: u32) {
    debug!(element = target.0, hand = ?data.hand, count, "click");
    panel.send(
        target,
        &UiEvent::Click {
            pointer: data,
            count,
        },
    );
}

pub fn wheel(panel: &dyn UiPanel, target: ElementId, data: WheelEventData) {
    debug!(
        element = target.0,
        hand = ?data.hand,
        dx = data.delta_x,
        dy = data.delta_y,
        "wheel"
    );
    panel.send(target, &UiEvent::Wheel(data));
}

pub fn key_down(panel: &dyn UiPanel, root: ElementId, data: KeyEventData) {
    debug!(hand = ?data.hand, code = data.code.0, "key down");
    panel.send(root, &UiEvent::KeyDown(data));
}

pub fn key_up(panel: &dyn UiPanel, root: ElementId, data: KeyEventData) {
    debug!(hand = ?data.hand, code = data.code.0, "key up");
    panel.send(root, &UiEvent::KeyUp(data));
}

pub fn focus_out(panel: &dyn UiPanel, root: ElementId) {
    debug!("focus out");
    panel.send(root, &UiEvent::FocusOut);
}

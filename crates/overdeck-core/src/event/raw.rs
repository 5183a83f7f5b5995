//! Raw overlay events as polled from the VR compositor.
//!
//! The compositor queues events per overlay and the host drains that queue
//! once per tick.  Event identity is split across two id spaces:
//!
//! - Mouse kinds (`FocusLeave`, `MouseDown`, `MouseMove`, `MouseUp`, `Scroll`)
//!   carry a [`CursorSlot`], a small reusable index the compositor assigns to
//!   each active laser pointer.
//! - Controller kinds (`ButtonPress`, `ButtonUnpress`) carry a
//!   [`DeviceIndex`], the tracked-device id of the controller itself.
//!
//! Only `MouseMove` carries both, which is why it is the sole source of the
//! slot→device mapping maintained by [`crate::engine::cursor::CursorRegistry`].
//!
//! All payload types are plain `Copy` data and serde-serializable so replay
//! scripts can be written as JSON.

use serde::{Deserialize, Serialize};

/// Maximum number of simultaneously tracked pointers (one per hand).
pub const MAX_POINTERS: usize = 2;

/// Reusable pointer slot index assigned by the compositor.
///
/// Slots are recycled: after a pointer disappears its slot may be reassigned
/// to a different controller, so a slot is only meaningful together with the
/// mapping learned from the most recent `MouseMove` on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CursorSlot(pub u32);

/// Tracked-device index in the compositor's device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceIndex(pub u32);

impl DeviceIndex {
    /// The compositor's invalid-device sentinel.
    pub const INVALID: DeviceIndex = DeviceIndex(u32::MAX);

    /// Returns whether this index refers to a real tracked device.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

/// Logical pointer source.
///
/// `Primary` is whichever tracked device currently fulfils the compositor's
/// dominant-role query; the assignment can change at runtime (handedness
/// setting, controller swap), so it is re-evaluated every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hand {
    Primary,
    Secondary,
}

impl Hand {
    /// Both hands in fixed processing priority order, Primary first.
    pub const BOTH: [Hand; 2] = [Hand::Primary, Hand::Secondary];

    /// Stable index for per-hand arrays.
    pub fn index(self) -> usize {
        match self {
            Hand::Primary => 0,
            Hand::Secondary => 1,
        }
    }

    pub fn is_primary(self) -> bool {
        self == Hand::Primary
    }
}

/// Physical controller input that the compositor reports as a mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceButton {
    /// Index trigger.
    Trigger,
    /// Thumbstick / trackpad press.
    Stick,
    /// Grip squeeze.
    Grip,
}

// ── Per-kind payloads ─────────────────────────────────────────────────────────

/// The pointer in `cursor` left the overlay surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocusLeaveEvent {
    pub cursor: CursorSlot,
}

/// A controller button press reported as a mouse-down at a pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseDownEvent {
    pub cursor: CursorSlot,
    pub button: DeviceButton,
    /// Pixel position in the overlay's top-left-origin mouse space.
    pub x: f32,
    pub y: f32,
}

/// Laser pointer movement.  The only kind carrying both pointer ids.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseMoveEvent {
    pub cursor: CursorSlot,
    /// Tracked device that produced the movement.
    pub device: DeviceIndex,
    pub x: f32,
    pub y: f32,
}

/// A controller button release reported as a mouse-up at a pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseUpEvent {
    pub cursor: CursorSlot,
    pub button: DeviceButton,
    pub x: f32,
    pub y: f32,
}

/// Smooth-scroll deltas from the thumbstick.
///
/// Scroll events carry no trustworthy position; targeting falls back to the
/// hand's last known on-surface point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollEvent {
    pub cursor: CursorSlot,
    /// Horizontal delta, positive towards the left in compositor convention.
    pub delta_x: f32,
    /// Vertical delta, positive upwards.
    pub delta_y: f32,
}

/// A controller button went down (non-pointer buttons: A/B/menu and friends).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonPressEvent {
    pub device: DeviceIndex,
    /// Raw button ordinal as reported by the compositor.
    pub button: u32,
}

/// A controller button came back up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ButtonUnpressEvent {
    pub device: DeviceIndex,
    pub button: u32,
}

/// One raw event drained from the overlay's queue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawOverlayEvent {
    /// The pointer left the overlay surface.
    FocusLeave(FocusLeaveEvent),
    /// Pointer button pressed on the surface.
    MouseDown(MouseDownEvent),
    /// Pointer moved across the surface.
    MouseMove(MouseMoveEvent),
    /// Pointer button released.
    MouseUp(MouseUpEvent),
    /// Thumbstick smooth scroll.
    Scroll(ScrollEvent),
    /// Non-pointer controller button down.
    ButtonPress(ButtonPressEvent),
    /// Non-pointer controller button up.
    ButtonUnpress(ButtonUnpressEvent),
}

// ── Tests ─────────────────────────────────────────────────────────────────────

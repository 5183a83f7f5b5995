//! Synthetic events sent into the retained UI tree.
//!
//! These are the fully-resolved counterpart of [`crate::event::raw`]: every
//! event is attributed to a logical [`Hand`], positioned in panel coordinates,
//! and carries the pointer-button bookkeeping a retained-mode tree expects
//! (originating button, held-button mask, click multiplicity, drag flag).

use crate::event::raw::{DeviceButton, Hand};
use crate::panel::PanelPoint;

/// Logical pointer button.
///
/// The three physical controller inputs map onto these stably:
/// trigger → left, stick → right, grip → middle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

impl PointerButton {
    /// Bit used for this button in [`PressedButtons`].
    pub fn mask(self) -> u8 {
        match self {
            PointerButton::Left => 0b001,
            PointerButton::Right => 0b010,
            PointerButton::Middle => 0b100,
        }
    }
}

impl From<DeviceButton> for PointerButton {
    fn from(button: DeviceButton) -> Self {
        match button {
            DeviceButton::Trigger => PointerButton::Left,
            DeviceButton::Stick => PointerButton::Right,
            DeviceButton::Grip => PointerButton::Middle,
        }
    }
}

/// Bitmask of pointer buttons currently held down.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PressedButtons(pub u8);

impl PressedButtons {
    pub const NONE: PressedButtons = PressedButtons(0);

    pub fn press(&mut self, button: PointerButton) {
        self.0 |= button.mask();
    }

    pub fn release(&mut self, button: PointerButton) {
        self.0 &= !button.mask();
    }

    pub fn contains(self, button: PointerButton) -> bool {
        self.0 & button.mask() != 0
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Key code in the synthesized keyboard space.
///
/// Controller button ordinals are offset into one of two disjoint ranges so a
/// physical ordinal pressed on both controllers never produces the same code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

impl KeyCode {
    /// First code of the Primary hand's controller-button range.
    pub const PRIMARY_BASE: u32 = 0x100;
    /// First code of the Secondary hand's controller-button range.
    pub const SECONDARY_BASE: u32 = 0x200;

    /// Maps a controller button ordinal into the hand's key-code range.
    pub fn controller(hand: Hand, ordinal: u32) -> Self {
        let base = match hand {
            Hand::Primary => Self::PRIMARY_BASE,
            Hand::Secondary => Self::SECONDARY_BASE,
        };
        KeyCode(base + ordinal)
    }
}

/// Common payload of the synthetic pointer events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEventData {
    pub hand: Hand,
    /// Position in panel coordinates (origin per the panel surface).
    pub position: PanelPoint,
    /// Button that produced the event; `None` for moves and hover transitions.
    pub button: Option<PointerButton>,
    /// Buttons held down at dispatch time.
    pub held: PressedButtons,
    /// True when a move continues an active drag.
    pub dragging: bool,
}

/// Scroll payload.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelEventData {
    pub hand: Hand,
    /// Last known on-surface position of the scrolling hand, or the panel
    /// origin when the hand has never been on-surface.
    pub position: PanelPoint,
    pub delta_x: f32,
    pub delta_y: f32,
}

/// Synthesized keyboard payload for controller buttons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyEventData {
    pub hand: Hand,
    pub code: KeyCode,
}

/// A synthetic event delivered to one UI element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UiEvent {
    /// Pointer button pressed over the target element.
    PointerDown(PointerEventData),
    /// Pointer travelled; `dragging` is set while a drag is active.
    PointerMove(PointerEventData),
    /// Pointer button released.
    PointerUp(PointerEventData),
    /// Pointer started hovering the target element.
    PointerEnter(PointerEventData),
    /// Pointer stopped hovering the target element.
    PointerLeave(PointerEventData),
    /// Debounced click with multiplicity (1 = single, 2 = double, ...).
    Click {
        pointer: PointerEventData,
        count: u32,
    },
    /// Smooth-scroll wheel.
    Wheel(WheelEventData),
    /// Controller button down in the synthesized key space.
    KeyDown(KeyEventData),
    /// Controller button up.
    KeyUp(KeyEventData),
    /// Every pointer left the overlay; delivered to the tree root.
    FocusOut,
}

// ── Tests ─────────────────────────────────────────────────────────────────────

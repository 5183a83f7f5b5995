//! The retained UI tree seen from the engine's side of the fence.
//!
//! The engine never owns or walks the element tree. It talks to it through
//! [`UiPanel`], an injected capability with exactly three powers: hit-test a
//! point, hit-test the full element chain under a point, and deliver one
//! synthetic event to one element. [`PanelSurface`] describes the pixel space
//! the raw coordinates arrive in and converts them into panel space.

use serde::{Deserialize, Serialize};

use crate::event::ui::UiEvent;

/// Stable identifier of one element in the retained UI tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(pub u64);

/// A position in panel coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelPoint {
    pub x: f32,
    pub y: f32,
}

impl PanelPoint {
    pub const ORIGIN: PanelPoint = PanelPoint { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        PanelPoint { x, y }
    }
}

/// Vertical-axis convention of the UI tree receiving synthetic events.
///
/// Raw positions arrive in the overlay's top-left-origin mouse space (the
/// overlay is created flipped, with its mouse scale set to the panel's pixel
/// size); a bottom-left-origin tree needs the axis flipped back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YOrigin {
    TopLeft,
    BottomLeft,
}

/// Pixel dimensions and axis convention of the overlay's render surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSurface {
    pub width: f32,
    pub height: f32,
    pub y_origin: YOrigin,
}

impl PanelSurface {
    pub fn new(width: f32, height: f32, y_origin: YOrigin) -> Self {
        PanelSurface {
            width,
            height,
            y_origin,
        }
    }

    /// Converts a raw pointer position into panel coordinates.
    ///
    /// Returns `None` when the position lies outside `[0, width) × [0, height)`
    /// (including non-finite values), which callers treat as off-surface. When
    /// the tree is bottom-left-origin the vertical axis is flipped.
    pub fn map_position(&self, x: f32, y: f32) -> Option<PanelPoint> {
        let in_bounds = x >= 0.0 && x < self.width && y >= 0.0 && y < self.height;
        if !in_bounds {
            return None;
        }
        let y = match self.y_origin {
            YOrigin::TopLeft => y,
            YOrigin::BottomLeft => self.height - y,
        };
        Some(PanelPoint { x, y })
    }
}

/// Capability interface onto the retained UI tree.
///
/// Implementations receive every synthetic event through [`UiPanel::send`];
/// delivery order within a tick is part of the engine's contract, so an
/// implementation should not reorder internally.
pub trait UiPanel {
    /// Root element of the tree. Fallback target for events that hit no
    /// element, and the sole target of [`UiEvent::FocusOut`] and key events.
    fn root(&self) -> ElementId;

    /// Topmost element under `point`, or `None` when nothing is hit.
    fn pick(&self, point: PanelPoint) -> Option<ElementId> {
        let mut chain = Vec::new();
        self.pick_all(point, &mut chain)
    }

    /// Fills `chain` with every element under `point`, topmost first, and
    /// returns the topmost. `chain` is cleared first; it stays empty on a miss.
    fn pick_all(&self, point: PanelPoint, chain: &mut Vec<ElementId>) -> Option<ElementId>;

    /// Delivers one synthetic event to one element.
    fn send(&self, element: ElementId, event: &UiEvent);
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! # overdeck-core
//!
//! Input-synthesis engine for the overdeck VR overlay panel: translates the
//! polled raw event stream of a VR compositor overlay into ordered synthetic
//! pointer/keyboard events for a retained-mode UI element tree.
//!
//! This crate is pure: it has zero dependencies on OS APIs, VR runtime FFI,
//! UI frameworks, or I/O.  The host application drives it once per rendering
//! tick and supplies both collaborators through traits.
//!
//! # Architecture overview (for beginners)
//!
//! A VR overlay panel is a flat texture floating in the headset, pointed at
//! with up to two laser-pointer-style controllers.  The compositor reports
//! what the lasers do as a per-frame queue of raw events that are ambiguous in
//! two ways: mouse-kind events identify the pointer only by a small reusable
//! *cursor slot*, while controller-kind events identify it only by a
//! *tracked-device index*.  Turning that stream into the clean
//! down/up/click/drag/hover event stream a retained UI tree expects is the job
//! of this crate:
//!
//! - **`event`** – The raw event model polled from the compositor and the
//!   synthetic event model sent into the UI tree.
//!
//! - **`panel`** – The injected UI-tree capability (`pick`, `pick_all`,
//!   `send`) and the pixel-surface geometry used for hit-testing.
//!
//! - **`engine`** – The state machines: per-hand frame snapshots, cursor/hand
//!   resolution, click multiplicity, drag lifecycle, hover diffing, and the
//!   per-tick orchestrator that ties them together.
//!
//! - **`timing`** – Deadline-polled one-shot timers; the engine owns no
//!   threads, so "timers" are plain instants checked at tick start.

pub mod engine;
pub mod event;
pub mod panel;
pub mod timing;

// Re-export the most-used types at the crate root so hosts can write
// `overdeck_core::InputBridge` instead of `overdeck_core::engine::bridge::InputBridge`.
pub use engine::bridge::{EventFeed, InputBridge};
pub use engine::click::{ClickBurst, ClickClassifier};
pub use engine::cursor::CursorRegistry;
pub use engine::drag::{DragRelease, DragTracker, ExpiredDrag};
pub use engine::snapshot::FrameSnapshot;
pub use event::raw::{CursorSlot, DeviceButton, DeviceIndex, Hand, RawOverlayEvent};
pub use event::ui::{KeyCode, PointerButton, PressedButtons, UiEvent};
pub use panel::{ElementId, PanelPoint, PanelSurface, UiPanel, YOrigin};

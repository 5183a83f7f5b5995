//! Event models on both sides of the engine.
//!
//! - **`raw`** – What the VR compositor hands us: a per-frame queue of
//!   loosely-identified overlay events (mouse kinds keyed by cursor slot,
//!   controller kinds keyed by tracked-device index).
//!
//! - **`ui`** – What the retained UI tree receives: fully-resolved synthetic
//!   pointer/keyboard events attributed to a logical hand.
//!
//! The engine in [`crate::engine`] is the only code that converts between the
//! two; nothing here performs I/O.

pub mod raw;
pub mod ui;

pub use raw::{CursorSlot, DeviceButton, DeviceIndex, Hand, RawOverlayEvent, MAX_POINTERS};
pub use ui::{KeyCode, PointerButton, PressedButtons, UiEvent};

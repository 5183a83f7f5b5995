//! Input synthesis engine.
//!
//! Each tick the host drains the runtime's event queue through
//! [`bridge::InputBridge::pump`], which routes raw events through the
//! per-hand [`snapshot::FrameSnapshot`]s, the [`click::ClickClassifier`],
//! the [`drag::DragTracker`] and the hover diff, and dispatches the
//! resulting synthetic events into the UI tree.

pub mod bridge;
pub mod click;
pub mod cursor;
pub mod dispatch;
pub mod drag;
pub mod hover;
pub mod snapshot;

pub use bridge::{EventFeed, InputBridge};
pub use click::{ClickBurst, ClickClassifier, ClickContext};
pub use cursor::CursorRegistry;
pub use drag::{DragRelease, DragTracker, ExpiredDrag};
pub use hover::{HoverChange, HoverDiff};
pub use snapshot::FrameSnapshot;

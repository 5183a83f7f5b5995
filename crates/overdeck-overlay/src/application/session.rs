//! OverlaySession: the per-frame orchestration of one overlay panel.
//!
//! The session owns the overlay handle, the input bridge, and the hover
//! interactivity gate.  The host calls [`OverlaySession::tick`] once per
//! rendered frame; everything else (availability guards, gate edges, hover
//! resets after discontinuities) happens inside.
//!
//! # The hover gate (for beginners)
//!
//! A visible overlay that always accepts mouse input would steal the laser
//! pointer from every other overlay in the scene.  The runtime is therefore
//! only told to deliver mouse input while something is actually pointing at
//! the panel.  Switching *off* is delayed by one second so that a hand
//! briefly sweeping past the panel edge does not flicker interactivity;
//! switching *on* is immediate.
//!
//! # The runtime seam
//!
//! [`OverlayRuntime`] is declared here, next to its consumer, and implemented
//! by the infrastructure layer (see `infrastructure::vr`).  It extends the
//! engine's [`EventFeed`] so one object both answers overlay control calls
//! and feeds raw events into the pump.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use overdeck_core::timing::DelayedOff;
use overdeck_core::{DeviceIndex, EventFeed, InputBridge, PanelSurface, UiPanel, YOrigin};

/// Overlay key registered with the runtime; must be unique per process.
const OVERLAY_KEY: &str = "overdeck.panel";
/// Human-readable overlay name shown in runtime debug tooling.
const OVERLAY_NAME: &str = "Overdeck";

/// Delay before interactivity is withdrawn after the last pointer leaves.
const HOVER_OFF_DELAY: Duration = Duration::from_secs(1);

/// Permitted overlay width range in metres.
const MIN_WIDTH_M: f32 = 0.01;
const MAX_WIDTH_M: f32 = 1.0;

/// Where the overlay panel is attached in the tracked space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayAnchor {
    /// Follows the left controller.
    LeftHand,
    /// Follows the right controller.
    RightHand,
    /// Fixed relative to the headset.
    #[default]
    Head,
}

/// Opaque runtime identifier for a created overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlayHandle(pub u64);

/// Error type for overlay runtime operations.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The VR runtime is not running or not reachable.
    #[error("VR runtime is not available")]
    Unavailable,

    /// Overlay creation was rejected.
    #[error("failed to create overlay {key}: {reason}")]
    Create { key: String, reason: String },

    /// A control call on an existing overlay failed.
    #[error("overlay call {op} failed: {reason}")]
    Call { op: &'static str, reason: String },
}

/// Capability surface of the VR runtime, as seen by the session.
///
/// Infrastructure implementations wrap the real compositor API; the scripted
/// mock in `infrastructure::vr::mock` records calls for tests and replay.
/// The [`EventFeed`] supertrait supplies the raw event queue the bridge
/// drains each tick.
pub trait OverlayRuntime: EventFeed {
    /// Whether the runtime is currently reachable.
    fn is_available(&self) -> bool;

    /// Creates a new overlay and returns its handle.
    fn create_overlay(&mut self, key: &str, name: &str) -> Result<OverlayHandle, RuntimeError>;

    /// Destroys a previously created overlay.
    fn destroy_overlay(&mut self, handle: OverlayHandle) -> Result<(), RuntimeError>;

    /// Makes the overlay visible in the scene.
    fn show_overlay(&mut self, handle: OverlayHandle) -> Result<(), RuntimeError>;

    /// Hides the overlay without destroying it.
    fn hide_overlay(&mut self, handle: OverlayHandle) -> Result<(), RuntimeError>;

    /// Flips the overlay texture vertically.
    ///
    /// Panel textures are rendered top-left-origin while the compositor
    /// samples bottom-left-origin UVs.
    fn flip_vertical(&mut self, handle: OverlayHandle) -> Result<(), RuntimeError>;

    /// Sets the overlay width in metres.
    fn set_width_m(&mut self, handle: OverlayHandle, meters: f32) -> Result<(), RuntimeError>;

    /// Declares the pixel extent of the mouse coordinate space the runtime
    /// reports intersection events in.
    fn set_mouse_scale(
        &mut self,
        handle: OverlayHandle,
        width: f32,
        height: f32,
    ) -> Result<(), RuntimeError>;

    /// Enables or disables smooth (sub-line) scroll event generation.
    fn set_smooth_scroll(&mut self, handle: OverlayHandle, enabled: bool)
        -> Result<(), RuntimeError>;

    /// Enables or disables per-controller cursor slots.
    fn set_multi_cursor(&mut self, handle: OverlayHandle, enabled: bool)
        -> Result<(), RuntimeError>;

    /// Enables or disables mouse event delivery for this overlay.
    fn set_mouse_input(&mut self, handle: OverlayHandle, enabled: bool)
        -> Result<(), RuntimeError>;

    /// Marks the overlay as a laser-pointer target while visible.
    fn set_interactive_if_visible(
        &mut self,
        handle: OverlayHandle,
        enabled: bool,
    ) -> Result<(), RuntimeError>;

    /// Returns the panel-space intersection of a controller's pointer ray
    /// with the overlay, if the ray currently hits it.
    fn controller_intersection(
        &self,
        handle: OverlayHandle,
        device: DeviceIndex,
    ) -> Option<(f32, f32)>;

    /// Whether the runtime currently reports this overlay as the focused
    /// hover target of the system laser pointer.
    fn is_hover_target(&self, handle: OverlayHandle) -> bool;

    /// Resolves the tracked device an anchor refers to.
    ///
    /// Returns [`DeviceIndex::INVALID`] when the device is not tracked.
    fn device_for_anchor(&self, anchor: OverlayAnchor) -> DeviceIndex;
}

/// Session construction parameters, typically mapped from preferences.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub anchor: OverlayAnchor,
    /// Overlay width in metres; clamped into the permitted range on apply.
    pub size_m: f32,
    /// Multi-click merge window forwarded to the click classifier.
    pub multi_click_window: Duration,
    /// Pixel geometry of the panel the overlay displays.
    pub surface: PanelSurface,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            anchor: OverlayAnchor::Head,
            size_m: 0.17,
            multi_click_window: Duration::from_millis(500),
            surface: PanelSurface::new(1280.0, 720.0, YOrigin::TopLeft),
        }
    }
}

/// One overlay panel: handle, bridge, and interactivity gate.
pub struct OverlaySession<R: OverlayRuntime> {
    runtime: R,
    handle: Option<OverlayHandle>,
    bridge: InputBridge,
    gate: DelayedOff,
    interactive: bool,
    anchor: OverlayAnchor,
    size_m: f32,
    surface: PanelSurface,
    needs_hover_reset: bool,
    was_available: bool,
}

impl<R: OverlayRuntime> OverlaySession<R> {
    pub fn new(runtime: R, config: SessionConfig) -> Self {
        let mut bridge = InputBridge::new();
        bridge.set_multi_click_window(config.multi_click_window);
        OverlaySession {
            runtime,
            handle: None,
            bridge,
            gate: DelayedOff::new(HOVER_OFF_DELAY),
            interactive: false,
            anchor: config.anchor,
            size_m: config.size_m,
            surface: config.surface,
            needs_hover_reset: false,
            was_available: true,
        }
    }

    /// Creates and shows the overlay.
    ///
    /// The call order matters to the runtime: geometry (flip, mouse scale,
    /// width) must be configured before the first frame is shown, and the
    /// input-shaping flags are applied once the overlay exists.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeError::Unavailable`] when no runtime is reachable and
    /// propagates the first failing overlay call otherwise.
    pub fn start(&mut self) -> Result<(), RuntimeError> {
        if !self.runtime.is_available() {
            return Err(RuntimeError::Unavailable);
        }

        let handle = self.runtime.create_overlay(OVERLAY_KEY, OVERLAY_NAME)?;
        self.runtime.flip_vertical(handle)?;
        self.runtime
            .set_mouse_scale(handle, self.surface.width, self.surface.height)?;
        self.runtime
            .set_width_m(handle, self.size_m.clamp(MIN_WIDTH_M, MAX_WIDTH_M))?;
        self.runtime.show_overlay(handle)?;
        self.runtime.set_smooth_scroll(handle, true)?;
        self.runtime.set_multi_cursor(handle, true)?;

        self.handle = Some(handle);
        info!(key = OVERLAY_KEY, "overlay created and shown");
        Ok(())
    }

    /// Runs one frame: guards, hover gate, pending hover reset, pump.
    ///
    /// The pump runs even while the gate is off so that pending click and
    /// drag deadlines are still serviced.
    pub fn tick(&mut self, now: Instant, panel: &dyn UiPanel) {
        let Some(handle) = self.handle else {
            return;
        };

        if !self.runtime.is_available() {
            if self.was_available {
                debug!("runtime became unavailable; suspending ticks");
                self.was_available = false;
                self.needs_hover_reset = true;
            }
            return;
        }
        self.was_available = true;

        let anchor_device = self.runtime.device_for_anchor(self.anchor);
        if !anchor_device.is_valid() {
            return;
        }

        let hovering = self.hover_detected(handle, anchor_device);
        self.gate.request(hovering, now);
        let interactive = self.gate.poll(now);
        if interactive != self.interactive {
            self.interactive = interactive;
            debug!(interactive, "hover gate switched");
            if let Err(e) = self.runtime.set_mouse_input(handle, interactive) {
                warn!(error = %e, "failed to toggle mouse input");
            }
            if let Err(e) = self.runtime.set_interactive_if_visible(handle, interactive) {
                warn!(error = %e, "failed to toggle interactivity");
            }
        }

        if self.needs_hover_reset {
            self.bridge.reset_hover(panel);
            self.needs_hover_reset = false;
        }

        self.bridge.pump(now, &mut self.runtime, panel, &self.surface);
    }

    /// Whether any pointer is currently aimed at the overlay.
    ///
    /// When the overlay is anchored to a hand, that hand's own controller is
    /// skipped: it is rigidly attached to the panel and would otherwise hold
    /// the gate open forever.
    fn hover_detected(&self, handle: OverlayHandle, anchor_device: DeviceIndex) -> bool {
        if self.runtime.is_hover_target(handle) {
            return true;
        }
        for anchor in [OverlayAnchor::LeftHand, OverlayAnchor::RightHand] {
            let device = self.runtime.device_for_anchor(anchor);
            if !device.is_valid() || device == anchor_device {
                continue;
            }
            if self
                .runtime
                .controller_intersection(handle, device)
                .is_some()
            {
                return true;
            }
        }
        false
    }

    /// Shows or hides the overlay.  Hiding is an event-source discontinuity,
    /// so hover state is reset before the next pump.
    pub fn set_visible(&mut self, visible: bool) -> Result<(), RuntimeError> {
        let Some(handle) = self.handle else {
            return Ok(());
        };
        if visible {
            self.runtime.show_overlay(handle)?;
        } else {
            self.runtime.hide_overlay(handle)?;
            self.needs_hover_reset = true;
        }
        Ok(())
    }

    /// Moves the overlay to a different anchor.  Cursor rays land on an
    /// entirely different part of the panel afterwards, so hover state is
    /// reset before the next pump.
    pub fn set_anchor(&mut self, anchor: OverlayAnchor) {
        if anchor != self.anchor {
            info!(?anchor, "overlay anchor changed");
            self.anchor = anchor;
            self.needs_hover_reset = true;
        }
    }

    /// Applies live-editable preferences.  The multi-click window reaches the
    /// classifier before the next pump.
    pub fn apply_prefs(&mut self, config: &SessionConfig) {
        self.bridge.set_multi_click_window(config.multi_click_window);
        self.set_anchor(config.anchor);
        let width = config.size_m.clamp(MIN_WIDTH_M, MAX_WIDTH_M);
        if (width - self.size_m).abs() > f32::EPSILON {
            self.size_m = width;
            if let Some(handle) = self.handle {
                if let Err(e) = self.runtime.set_width_m(handle, width) {
                    warn!(error = %e, "failed to resize overlay");
                }
            }
        }
    }

    /// Destroys the overlay.  Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.runtime.destroy_overlay(handle) {
                warn!(error = %e, "failed to destroy overlay");
            } else {
                info!("overlay destroyed");
            }
        }
    }

    /// Whether the runtime is currently told to deliver mouse input.
    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

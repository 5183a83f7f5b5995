//! Scripted mock runtime for tests and replay.
//!
//! Feeds synthetic [`RawOverlayEvent`]s through the session without a running
//! compositor.  The script is a queue of per-tick batches: each
//! [`MockRuntime::next_tick`] call releases one batch into the live queue the
//! session drains.  Overlay control calls are recorded so tests can assert on
//! the exact sequence.

use std::collections::{HashMap, VecDeque};

use overdeck_core::{DeviceIndex, EventFeed, RawOverlayEvent};

use crate::application::session::{OverlayAnchor, OverlayHandle, OverlayRuntime, RuntimeError};

/// One recorded overlay control call.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCall {
    Create { key: String, name: String },
    Destroy,
    Show,
    Hide,
    FlipVertical,
    SetWidthM(f32),
    SetMouseScale(f32, f32),
    SetSmoothScroll(bool),
    SetMultiCursor(bool),
    SetMouseInput(bool),
    SetInteractiveIfVisible(bool),
}

/// A scripted implementation of [`OverlayRuntime`].
pub struct MockRuntime {
    available: bool,
    dominant: DeviceIndex,
    head_device: DeviceIndex,
    left_device: DeviceIndex,
    right_device: DeviceIndex,
    intersections: HashMap<u32, (f32, f32)>,
    hover_target: bool,
    ticks: VecDeque<Vec<RawOverlayEvent>>,
    live: VecDeque<RawOverlayEvent>,
    calls: Vec<RuntimeCall>,
    next_handle: u64,
}

impl MockRuntime {
    pub fn new() -> Self {
        MockRuntime {
            available: true,
            dominant: DeviceIndex::INVALID,
            head_device: DeviceIndex(0),
            left_device: DeviceIndex::INVALID,
            right_device: DeviceIndex::INVALID,
            intersections: HashMap::new(),
            hover_target: false,
            ticks: VecDeque::new(),
            live: VecDeque::new(),
            calls: Vec::new(),
            next_handle: 1,
        }
    }

    /// Queues one tick's worth of raw events.
    pub fn push_tick(&mut self, batch: Vec<RawOverlayEvent>) {
        self.ticks.push_back(batch);
    }

    /// Releases the next scripted batch into the live event queue.
    ///
    /// Returns `false` when the script is exhausted; an empty batch still
    /// counts as a tick.
    pub fn next_tick(&mut self) -> bool {
        match self.ticks.pop_front() {
            Some(batch) => {
                self.live.extend(batch);
                true
            }
            None => false,
        }
    }

    pub fn remaining_ticks(&self) -> usize {
        self.ticks.len()
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn set_dominant(&mut self, device: DeviceIndex) {
        self.dominant = device;
    }

    /// Assigns the tracked device an anchor resolves to.
    pub fn set_device(&mut self, anchor: OverlayAnchor, device: DeviceIndex) {
        match anchor {
            OverlayAnchor::Head => self.head_device = device,
            OverlayAnchor::LeftHand => self.left_device = device,
            OverlayAnchor::RightHand => self.right_device = device,
        }
    }

    /// Sets or clears a controller's ray intersection with the overlay.
    pub fn set_intersection(&mut self, device: DeviceIndex, hit: Option<(f32, f32)>) {
        match hit {
            Some(point) => {
                self.intersections.insert(device.0, point);
            }
            None => {
                self.intersections.remove(&device.0);
            }
        }
    }

    pub fn set_hover_target(&mut self, hovering: bool) {
        self.hover_target = hovering;
    }

    /// Recorded overlay control calls, oldest first.
    pub fn calls(&self) -> &[RuntimeCall] {
        &self.calls
    }

    /// Takes and clears the recorded calls.
    pub fn take_calls(&mut self) -> Vec<RuntimeCall> {
        std::mem::take(&mut self.calls)
    }
}

impl Default for MockRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl EventFeed for MockRuntime {
    fn poll_event(&mut self) -> Option<RawOverlayEvent> {
        self.live.pop_front()
    }

    fn dominant_device(&self) -> DeviceIndex {
        self.dominant
    }
}

impl OverlayRuntime for MockRuntime {
    fn is_available(&self) -> bool {
        self.available
    }

    fn create_overlay(&mut self, key: &str, name: &str) -> Result<OverlayHandle, RuntimeError> {
        self.calls.push(RuntimeCall::Create {
            key: key.to_string(),
            name: name.to_string(),
        });
        let handle = OverlayHandle(self.next_handle);
        self.next_handle += 1;
        Ok(handle)
    }

    fn destroy_overlay(&mut self, _handle: OverlayHandle) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::Destroy);
        Ok(())
    }

    fn show_overlay(&mut self, _handle: OverlayHandle) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::Show);
        Ok(())
    }

    fn hide_overlay(&mut self, _handle: OverlayHandle) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::Hide);
        Ok(())
    }

    fn flip_vertical(&mut self, _handle: OverlayHandle) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::FlipVertical);
        Ok(())
    }

    fn set_width_m(&mut self, _handle: OverlayHandle, meters: f32) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::SetWidthM(meters));
        Ok(())
    }

    fn set_mouse_scale(
        &mut self,
        _handle: OverlayHandle,
        width: f32,
        height: f32,
    ) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::SetMouseScale(width, height));
        Ok(())
    }

    fn set_smooth_scroll(
        &mut self,
        _handle: OverlayHandle,
        enabled: bool,
    ) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::SetSmoothScroll(enabled));
        Ok(())
    }

    fn set_multi_cursor(
        &mut self,
        _handle: OverlayHandle,
        enabled: bool,
    ) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::SetMultiCursor(enabled));
        Ok(())
    }

    fn set_mouse_input(
        &mut self,
        _handle: OverlayHandle,
        enabled: bool,
    ) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::SetMouseInput(enabled));
        Ok(())
    }

    fn set_interactive_if_visible(
        &mut self,
        _handle: OverlayHandle,
        enabled: bool,
    ) -> Result<(), RuntimeError> {
        self.calls.push(RuntimeCall::SetInteractiveIfVisible(enabled));
        Ok(())
    }

    fn controller_intersection(
        &self,
        _handle: OverlayHandle,
        device: DeviceIndex,
    ) -> Option<(f32, f32)> {
        self.intersections.get(&device.0).copied()
    }

    fn is_hover_target(&self, _handle: OverlayHandle) -> bool {
        self.hover_target
    }

    fn device_for_anchor(&self, anchor: OverlayAnchor) -> DeviceIndex {
        match anchor {
            OverlayAnchor::Head => self.head_device,
            OverlayAnchor::LeftHand => self.left_device,
            OverlayAnchor::RightHand => self.right_device,
        }
    }
}

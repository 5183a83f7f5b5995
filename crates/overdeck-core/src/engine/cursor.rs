//! Cursor-slot and device-id resolution.
//!
//! The runtime hands out small reusable cursor-slot ids per active pointer,
//! but only Move events carry both the slot and the tracked-device id. The
//! registry caches that pairing so the slot-only kinds (FocusLeave, MouseDown,
//! MouseUp, Scroll) can still be attributed to a hand. A hand is Primary
//! exactly when its device is the current holder of the dominant input role.

use tracing::trace;

use crate::event::raw::{CursorSlot, DeviceIndex, Hand, MAX_POINTERS};

/// Bounded slot→device table owned by one bridge instance.
#[derive(Debug)]
pub struct CursorRegistry {
    devices: [DeviceIndex; MAX_POINTERS],
}

impl Default for CursorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CursorRegistry {
    pub fn new() -> Self {
        CursorRegistry {
            devices: [DeviceIndex::INVALID; MAX_POINTERS],
        }
    }

    /// Caches the slot→device pairing observed on a Move event, overwriting
    /// any earlier pairing for that slot. Out-of-range slots are ignored.
    pub fn record(&mut self, slot: CursorSlot, device: DeviceIndex) {
        let Some(entry) = self.devices.get_mut(slot.0 as usize) else {
            trace!(slot = slot.0, "cursor slot out of range, pairing dropped");
            return;
        };
        *entry = device;
    }

    /// Device last seen driving `slot`, or [`DeviceIndex::INVALID`] when no
    /// Move has been observed for it yet.
    pub fn device_for(&self, slot: CursorSlot) -> DeviceIndex {
        self.devices
            .get(slot.0 as usize)
            .copied()
            .unwrap_or(DeviceIndex::INVALID)
    }

    /// Resolves a slot to a hand via its cached device.
    ///
    /// An unmapped or out-of-range slot yields an invalid device, which can
    /// never equal the dominant device and therefore lands on Secondary.
    pub fn resolve_slot(&self, slot: CursorSlot, dominant: DeviceIndex) -> Hand {
        Self::resolve_device(self.device_for(slot), dominant)
    }

    /// Resolves a device to a hand by comparing against the dominant-role
    /// device at this instant.
    pub fn resolve_device(device: DeviceIndex, dominant: DeviceIndex) -> Hand {
        if device.is_valid() && device == dominant {
            Hand::Primary
        } else {
            Hand::Secondary
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

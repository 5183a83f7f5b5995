//! Cross-hand hover enter/leave diffing.
//!
//! Hover is a property of the union of both hands: an element "enters" when
//! the first pointer arrives over it and "leaves" only when the last pointer
//! departs. A hand that did not move this tick contributes its last resolved
//! set to both sides of the diff, so it can neither enter nor leave anything
//! on its own.

use std::collections::{BTreeSet, HashSet};

use crate::engine::snapshot::FrameSnapshot;
use crate::event::raw::{Hand, MAX_POINTERS};
use crate::panel::ElementId;

/// One element crossing the hover boundary, attributed to a hand.
///
/// When both hands qualify, Primary wins the attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverChange {
    pub element: ElementId,
    pub hand: Hand,
}

/// Outcome of one tick's hover resolution, each list ascending by element id.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct HoverDiff {
    pub enters: Vec<HoverChange>,
    pub leaves: Vec<HoverChange>,
}

impl HoverDiff {
    pub fn is_empty(&self) -> bool {
        self.enters.is_empty() && self.leaves.is_empty()
    }
}

fn effective<'a>(
    snapshots: &'a [FrameSnapshot; MAX_POINTERS],
    refreshed: [bool; MAX_POINTERS],
    hand: Hand,
) -> &'a HashSet<ElementId> {
    let snap = &snapshots[hand.index()];
    if refreshed[hand.index()] {
        snap.hover_current()
    } else {
        snap.hover_previous()
    }
}

/// Computes the tick's enter/leave sets.
///
/// `refreshed` marks the hands whose picks were recomputed this tick; only
/// their current sets participate, every other hand is represented by its
/// previous set. Runs once per tick, after all Move processing.
pub fn resolve(
    snapshots: &[FrameSnapshot; MAX_POINTERS],
    refreshed: [bool; MAX_POINTERS],
) -> HoverDiff {
    let prev_union: BTreeSet<ElementId> = snapshots
        .iter()
        .flat_map(|snap| snap.hover_previous().iter().copied())
        .collect();
    let curr_union: BTreeSet<ElementId> = Hand::BOTH
        .iter()
        .flat_map(|&hand| effective(snapshots, refreshed, hand).iter().copied())
        .collect();

    let mut diff = HoverDiff::default();
    for &element in curr_union.difference(&prev_union) {
        let hand = if effective(snapshots, refreshed, Hand::Primary).contains(&element) {
            Hand::Primary
        } else {
            Hand::Secondary
        };
        diff.enters.push(HoverChange { element, hand });
    }
    for &element in prev_union.difference(&curr_union) {
        let hand = if snapshots[Hand::Primary.index()]
            .hover_previous()
            .contains(&element)
        {
            Hand::Primary
        } else {
            Hand::Secondary
        };
        diff.leaves.push(HoverChange { element, hand });
    }
    diff
}

/// Forcibly un-hovers everything and clears all four sets.
///
/// For event-source discontinuities (overlay hidden, teleported or
/// re-anchored); returns the Leave list, ascending by element id.
pub fn reset(snapshots: &mut [FrameSnapshot; MAX_POINTERS]) -> Vec<HoverChange> {
    let prev_union: BTreeSet<ElementId> = snapshots
        .iter()
        .flat_map(|snap| snap.hover_previous().iter().copied())
        .collect();

    let mut leaves = Vec::with_capacity(prev_union.len());
    for &element in &prev_union {
        let hand = if snapshots[Hand::Primary.index()]
            .hover_previous()
            .contains(&element)
        {
            Hand::Primary
        } else {
            Hand::Secondary
        };
        leaves.push(HoverChange { element, hand });
    }
    for snap in snapshots.iter_mut() {
        snap.clear_hover();
    }
    leaves
}

// ── Tests ─────────────────────────────────────────────────────────────────────

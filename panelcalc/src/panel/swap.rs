//! Manual slot swaps.

use serde::{Deserialize, Serialize};

use super::layout::PanelLayout;
use super::slot::{is_phase_a_boundary, span_slots};

/// What a swap request did to the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapOutcome {
    /// One side was empty; the other side's span moved there.
    Moved,
    /// Two equally sized spans traded slots.
    Exchanged,
    Unchanged(SwapRejection),
}

impl SwapOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, SwapOutcome::Unchanged(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum SwapRejection {
    #[error("slot is outside the panel")]
    SlotOutOfRange,
    #[error("both slots are empty")]
    BothEmpty,
    #[error("both slots belong to the same circuit")]
    SameSpan,
    /// A single-slot circuit and a three-slot span cannot trade places.
    #[error("circuits occupy a different number of slots")]
    SpanSizeMismatch,
    /// The moved span would run past the last slot.
    #[error("circuit would run past the last slot")]
    WouldOverrun,
    /// The moved span would land on slots held by another circuit.
    #[error("target slots are held by another circuit")]
    TargetOccupied,
    /// Three-phase spans must start on a phase-A row.
    #[error("three-phase circuits must start on a phase-A slot")]
    NotPhaseBoundary,
}

impl PanelLayout {
    /// Swap whatever occupies `slot_a` with whatever occupies `slot_b`.
    ///
    /// Whole spans move together: naming any arm of a three-phase circuit
    /// selects all three slots. The layout is left untouched unless the
    /// returned outcome reports a change.
    pub fn swap_slots(&mut self, slot_a: u32, slot_b: u32) -> SwapOutcome {
        if !self.config.contains(slot_a) || !self.config.contains(slot_b) {
            return SwapOutcome::Unchanged(SwapRejection::SlotOutOfRange);
        }

        match (self.occupant(slot_a), self.occupant(slot_b)) {
            (None, None) => SwapOutcome::Unchanged(SwapRejection::BothEmpty),
            (Some(i), Some(j)) if i == j => SwapOutcome::Unchanged(SwapRejection::SameSpan),
            (Some(i), None) => self.move_span(i, slot_b),
            (None, Some(j)) => self.move_span(j, slot_a),
            (Some(i), Some(j)) => self.exchange_spans(i, j),
        }
    }

    fn move_span(&mut self, index: usize, target: u32) -> SwapOutcome {
        let placement = &self.placements[index];
        let Some(slots) = span_slots(target, placement.span_len()) else {
            return SwapOutcome::Unchanged(SwapRejection::WouldOverrun);
        };

        if !slots.iter().all(|s| self.config.contains(*s)) {
            return SwapOutcome::Unchanged(SwapRejection::WouldOverrun);
        }
        if placement.span_len() > 1 && !is_phase_a_boundary(target) {
            return SwapOutcome::Unchanged(SwapRejection::NotPhaseBoundary);
        }
        let blocked = slots
            .iter()
            .any(|s| matches!(self.occupant(*s), Some(other) if other != index));
        if blocked {
            return SwapOutcome::Unchanged(SwapRejection::TargetOccupied);
        }

        self.placements[index].reassign(&slots);
        SwapOutcome::Moved
    }

    fn exchange_spans(&mut self, i: usize, j: usize) -> SwapOutcome {
        let slots_i = self.placements[i].slots();
        let slots_j = self.placements[j].slots();
        if slots_i.len() != slots_j.len() {
            return SwapOutcome::Unchanged(SwapRejection::SpanSizeMismatch);
        }
        self.placements[i].reassign(&slots_j);
        self.placements[j].reassign(&slots_i);
        SwapOutcome::Exchanged
    }
}

/// Value-style wrapper around [`PanelLayout::swap_slots`].
pub fn swap(mut layout: PanelLayout, slot_a: u32, slot_b: u32) -> PanelLayout {
    layout.swap_slots(slot_a, slot_b);
    layout
}

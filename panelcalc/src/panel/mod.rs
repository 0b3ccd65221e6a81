//! Distribution Panel Slot Allocation
//!
//! Assigns computed circuits to numbered panel slots and supports manual
//! rearrangement and automatic phase balancing.
//!
//! # Model
//!
//! - Slots `1..=N` (N even, 30 by default); odd slots on the left, even on
//!   the right.
//! - Each consecutive same-column pair of rows is one phase, cycling A, B, C.
//! - Single-phase circuits take one slot. Three-phase circuits take three
//!   slots in one column (`s`, `s+2`, `s+4`) starting on a phase-A row, so
//!   each arm lands on a different phase.
//!
//! Layouts are plain values. [`allocate`] builds one, [`swap`] and
//! [`balance`] transform one; nothing is cached between calls. Callers that
//! want a layout to survive a recalculation persist [`PanelLayout::hints`]
//! and pass them back to [`allocate`].

pub mod allocate;
pub mod balance;
pub mod layout;
pub mod slot;
pub mod swap;

pub use allocate::allocate;
pub use balance::{
    balance, BalanceReport, BalanceStop, BalanceSwap, BALANCE_TOLERANCE_VA,
    MAX_BALANCE_ITERATIONS,
};
pub use layout::{
    HintRejection, IgnoredHint, PanelLayout, PhaseArm, PhaseTotals, Placement, SlotEntry,
    SlotHints, Unplaced, UnplacedReason,
};
pub use slot::{PanelConfig, PanelConfigError, Phase, Side, DEFAULT_SLOT_COUNT, MAX_SLOT_COUNT};
pub use swap::{swap, SwapOutcome, SwapRejection};

use crate::calc::CircuitResult;

/// Allocator bound to one panel geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelAllocator {
    config: PanelConfig,
}

impl PanelAllocator {
    pub fn new(config: PanelConfig) -> Self {
        Self { config }
    }

    pub fn with_slots(slots: u32) -> Result<Self, PanelConfigError> {
        Ok(Self::new(PanelConfig::new(slots)?))
    }

    pub fn config(&self) -> PanelConfig {
        self.config
    }

    pub fn allocate(&self, results: &[CircuitResult], hints: &SlotHints) -> PanelLayout {
        allocate(results, hints, self.config)
    }
}

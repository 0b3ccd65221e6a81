//! Greedy phase balancing.
//!
//! Each pass trades the heaviest single-slot circuit on the heaviest phase
//! for the lightest single-slot circuit on the lightest phase. Three-phase
//! spans never move.
//!
//! Balancing stops, reported as [`BalanceStop`], when:
//!
//! - the spread is below [`BALANCE_TOLERANCE_VA`];
//! - the heaviest or lightest phase has no single-slot circuit to trade;
//! - the best trade would not strictly shrink the spread
//!   ([`BalanceStop::NoImprovement`]), which can end a run after zero swaps
//!   even though the panel is still out of tolerance;
//! - [`MAX_BALANCE_ITERATIONS`] trades have been made.
//!
//! The spread therefore never grows. This is a local heuristic and not
//! necessarily the best achievable layout.

use serde::{Deserialize, Serialize};

use super::layout::PanelLayout;
use super::slot::Phase;

/// Spread (VA) below which the panel counts as balanced.
pub const BALANCE_TOLERANCE_VA: f64 = 100.0;

pub const MAX_BALANCE_ITERATIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceStop {
    WithinTolerance,
    /// The heaviest or lightest phase has no single-slot circuit to trade.
    NoCandidate,
    /// The best available trade would not shrink the spread.
    NoImprovement,
    IterationLimit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSwap {
    pub from_slot: u32,
    pub to_slot: u32,
    pub heavy_circuit: String,
    pub light_circuit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceReport {
    pub initial_spread_va: f64,
    pub final_spread_va: f64,
    pub swaps: Vec<BalanceSwap>,
    pub stop: BalanceStop,
}

impl PanelLayout {
    /// Rebalance in place and describe what changed.
    pub fn balance_phases(&mut self) -> BalanceReport {
        let initial_spread_va = self.imbalance_va();
        let mut swaps = Vec::new();
        let mut stop = BalanceStop::IterationLimit;

        for _ in 0..MAX_BALANCE_ITERATIONS {
            let totals = self.phase_totals();
            let spread = totals.spread();
            if spread < BALANCE_TOLERANCE_VA {
                stop = BalanceStop::WithinTolerance;
                break;
            }

            let heavy = totals.heaviest();
            let light = totals.lightest();
            let (Some(hi), Some(lo)) = (
                self.single_on_phase(heavy, true),
                self.single_on_phase(light, false),
            ) else {
                stop = BalanceStop::NoCandidate;
                break;
            };

            let delta = self.placements[hi].display_va - self.placements[lo].display_va;
            let mut trial = totals;
            trial.add(heavy, -delta);
            trial.add(light, delta);
            if trial.spread() >= spread {
                stop = BalanceStop::NoImprovement;
                break;
            }

            let hi_slots = self.placements[hi].slots();
            let lo_slots = self.placements[lo].slots();
            self.placements[hi].reassign(&lo_slots);
            self.placements[lo].reassign(&hi_slots);
            swaps.push(BalanceSwap {
                from_slot: hi_slots[0],
                to_slot: lo_slots[0],
                heavy_circuit: self.placements[hi].name().to_string(),
                light_circuit: self.placements[lo].name().to_string(),
            });
        }

        if stop == BalanceStop::IterationLimit && self.imbalance_va() < BALANCE_TOLERANCE_VA {
            stop = BalanceStop::WithinTolerance;
        }

        BalanceReport {
            initial_spread_va,
            final_spread_va: self.imbalance_va(),
            swaps,
            stop,
        }
    }

    /// Heaviest (or lightest) single-slot placement on `phase`; ties go to
    /// the lower slot number.
    fn single_on_phase(&self, phase: Phase, heaviest: bool) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (index, placement) in self.placements.iter().enumerate() {
            if !placement.is_single_slot() || placement.arms[0].phase != phase {
                continue;
            }
            best = match best {
                None => Some(index),
                Some(current) => {
                    let cur = &self.placements[current];
                    let better = if heaviest {
                        placement.display_va > cur.display_va
                    } else {
                        placement.display_va < cur.display_va
                    };
                    let tie = placement.display_va == cur.display_va
                        && placement.first_slot() < cur.first_slot();
                    if better || tie {
                        Some(index)
                    } else {
                        Some(current)
                    }
                }
            };
        }
        best
    }
}

/// Value-style wrapper around [`PanelLayout::balance_phases`].
pub fn balance(mut layout: PanelLayout) -> PanelLayout {
    layout.balance_phases();
    layout
}

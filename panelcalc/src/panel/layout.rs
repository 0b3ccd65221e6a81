//! Panel layout value type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::slot::{span_label, Phase, PanelConfig};
use crate::calc::CircuitResult;

/// Saved first-slot per circuit name, persisted as `schedule_slot`.
pub type SlotHints = BTreeMap<String, u32>;

/// One phase conductor of a placement and the VA it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseArm {
    pub slot: u32,
    pub phase: Phase,
    pub va: f64,
}

/// A circuit and the slot(s) it occupies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub circuit: CircuitResult,
    pub display_va: f64,
    pub arms: Vec<PhaseArm>,
    /// Circuit name with its slot label, e.g. `Kitchen [L3]`.
    pub display_name: String,
}

impl Placement {
    pub(crate) fn new(circuit: CircuitResult, slots: &[u32]) -> Self {
        let display_va = circuit.display_va();
        let mut placement = Self {
            display_name: String::new(),
            circuit,
            display_va,
            arms: Vec::new(),
        };
        placement.reassign(slots);
        placement
    }

    /// Moves the placement onto `slots`, recomputing arm phases, arm VA and
    /// the display name.
    pub(crate) fn reassign(&mut self, slots: &[u32]) {
        let share = if slots.is_empty() {
            0.0
        } else {
            self.display_va / slots.len() as f64
        };
        self.arms = slots
            .iter()
            .map(|&slot| PhaseArm {
                slot,
                phase: Phase::of(slot),
                va: share,
            })
            .collect();
        self.display_name = format!("{} [{}]", self.circuit.name(), span_label(slots));
    }

    pub fn name(&self) -> &str {
        self.circuit.name()
    }

    pub fn slots(&self) -> Vec<u32> {
        self.arms.iter().map(|a| a.slot).collect()
    }

    pub fn first_slot(&self) -> u32 {
        self.arms.iter().map(|a| a.slot).min().unwrap_or(0)
    }

    pub fn occupies(&self, slot: u32) -> bool {
        self.arms.iter().any(|a| a.slot == slot)
    }

    pub fn span_len(&self) -> usize {
        self.arms.len()
    }

    pub fn is_single_slot(&self) -> bool {
        self.arms.len() == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnplacedReason {
    /// No free slot left on either side.
    PanelFull,
    /// No free phase-A-aligned run of three same-column slots.
    NoContiguousSpan,
}

/// A circuit the allocator could not fit into the panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unplaced {
    pub circuit: CircuitResult,
    pub reason: UnplacedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HintRejection {
    OutOfRange,
    Occupied,
    NotPhaseBoundary,
}

/// A saved slot that could not be honoured; the circuit was auto-placed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoredHint {
    pub circuit: String,
    pub slot: u32,
    pub reason: HintRejection,
}

/// What a slot holds, for schedule grids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotEntry<'a> {
    pub slot: u32,
    pub phase: Phase,
    pub circuit: &'a str,
    pub display_name: &'a str,
    pub va: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseTotals {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl PhaseTotals {
    pub fn get(&self, phase: Phase) -> f64 {
        match phase {
            Phase::A => self.a,
            Phase::B => self.b,
            Phase::C => self.c,
        }
    }

    pub(crate) fn add(&mut self, phase: Phase, va: f64) {
        match phase {
            Phase::A => self.a += va,
            Phase::B => self.b += va,
            Phase::C => self.c += va,
        }
    }

    /// Heaviest phase; ties resolve to the earlier phase.
    pub fn heaviest(&self) -> Phase {
        Phase::ALL
            .into_iter()
            .fold(Phase::A, |best, p| if self.get(p) > self.get(best) { p } else { best })
    }

    /// Lightest phase; ties resolve to the earlier phase.
    pub fn lightest(&self) -> Phase {
        Phase::ALL
            .into_iter()
            .fold(Phase::A, |best, p| if self.get(p) < self.get(best) { p } else { best })
    }

    /// Gap between the heaviest and lightest phase.
    pub fn spread(&self) -> f64 {
        self.get(self.heaviest()) - self.get(self.lightest())
    }

    pub fn total(&self) -> f64 {
        self.a + self.b + self.c
    }
}

/// Slot-annotated panel schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelLayout {
    pub config: PanelConfig,
    pub placements: Vec<Placement>,
    pub unplaced: Vec<Unplaced>,
    pub ignored_hints: Vec<IgnoredHint>,
}

impl PanelLayout {
    pub fn empty(config: PanelConfig) -> Self {
        Self {
            config,
            placements: Vec::new(),
            unplaced: Vec::new(),
            ignored_hints: Vec::new(),
        }
    }

    pub fn slot_count(&self) -> u32 {
        self.config.slots()
    }

    /// Index into `placements` of the circuit occupying `slot`.
    pub fn occupant(&self, slot: u32) -> Option<usize> {
        self.placements.iter().position(|p| p.occupies(slot))
    }

    pub fn placement(&self, name: &str) -> Option<&Placement> {
        self.placements.iter().find(|p| p.name() == name)
    }

    pub fn phase_totals(&self) -> PhaseTotals {
        let mut totals = PhaseTotals::default();
        for arm in self.placements.iter().flat_map(|p| &p.arms) {
            totals.add(arm.phase, arm.va);
        }
        totals
    }

    pub fn imbalance_va(&self) -> f64 {
        self.phase_totals().spread()
    }

    /// Occupied slots, ascending.
    pub fn slot_map(&self) -> BTreeMap<u32, SlotEntry<'_>> {
        self.placements
            .iter()
            .flat_map(|p| {
                p.arms.iter().map(move |arm| {
                    (
                        arm.slot,
                        SlotEntry {
                            slot: arm.slot,
                            phase: arm.phase,
                            circuit: p.name(),
                            display_name: &p.display_name,
                            va: arm.va,
                        },
                    )
                })
            })
            .collect()
    }

    /// First slot of every placement, keyed by circuit name. Feed this back
    /// into the allocator to reproduce the layout.
    pub fn hints(&self) -> SlotHints {
        self.placements
            .iter()
            .map(|p| (p.name().to_string(), p.first_slot()))
            .collect()
    }
}

//! Initial slot placement.

use super::layout::{
    HintRejection, IgnoredHint, PanelLayout, Placement, SlotHints, Unplaced, UnplacedReason,
};
use super::slot::{is_phase_a_boundary, span_slots, PanelConfig, Side};
use crate::calc::{CircuitResult, PhaseCount};

/// Free/used bitmap indexed by slot number (index 0 unused).
struct Occupancy {
    used: Vec<bool>,
    config: PanelConfig,
}

impl Occupancy {
    fn new(config: PanelConfig) -> Self {
        Self {
            used: vec![false; config.slots() as usize + 1],
            config,
        }
    }

    fn is_free(&self, slot: u32) -> bool {
        self.config.contains(slot) && !self.used[slot as usize]
    }

    fn mark(&mut self, slots: &[u32]) {
        for &slot in slots {
            self.used[slot as usize] = true;
        }
    }

    fn check_span(&self, start: u32, phases: PhaseCount) -> Result<Vec<u32>, HintRejection> {
        let slots =
            span_slots(start, phases.slot_count()).ok_or(HintRejection::OutOfRange)?;
        if !slots.iter().all(|s| self.config.contains(*s)) {
            return Err(HintRejection::OutOfRange);
        }
        if phases.is_three_phase() && !is_phase_a_boundary(start) {
            return Err(HintRejection::NotPhaseBoundary);
        }
        if !slots.iter().all(|s| self.is_free(*s)) {
            return Err(HintRejection::Occupied);
        }
        Ok(slots)
    }

    /// First free span on `side`, top to bottom.
    fn find_on_side(&self, side: Side, phases: PhaseCount) -> Option<Vec<u32>> {
        match phases {
            PhaseCount::Single => self
                .config
                .column(side)
                .find(|s| self.is_free(*s))
                .map(|s| vec![s]),
            PhaseCount::Three => self
                .config
                .column(side)
                .filter(|s| is_phase_a_boundary(*s))
                .find_map(|s| self.check_span(s, phases).ok()),
        }
    }
}

/// Place `results` into an empty panel.
///
/// Circuits with a saved slot in `hints` go first, at exactly that slot.
/// Everything else is sorted by name and dealt alternately to the left and
/// right columns. A hint that cannot be honoured is recorded in
/// [`PanelLayout::ignored_hints`] and the circuit is auto-placed instead.
/// Circuits that fit nowhere end up in [`PanelLayout::unplaced`].
pub fn allocate(results: &[CircuitResult], hints: &SlotHints, config: PanelConfig) -> PanelLayout {
    let mut layout = PanelLayout::empty(config);
    let mut occupancy = Occupancy::new(config);

    let mut hinted: Vec<(&CircuitResult, u32)> = Vec::new();
    let mut auto: Vec<&CircuitResult> = Vec::new();
    for result in results {
        match hints.get(result.name()) {
            Some(&slot) => hinted.push((result, slot)),
            None => auto.push(result),
        }
    }

    hinted.sort_by(|a, b| a.0.name().cmp(b.0.name()));
    for (result, slot) in hinted {
        match occupancy.check_span(slot, result.phases()) {
            Ok(slots) => {
                occupancy.mark(&slots);
                layout.placements.push(Placement::new(result.clone(), &slots));
            }
            Err(reason) => {
                layout.ignored_hints.push(IgnoredHint {
                    circuit: result.name().to_string(),
                    slot,
                    reason,
                });
                auto.push(result);
            }
        }
    }

    auto.sort_by(|a, b| a.name().cmp(b.name()));
    let mut favoured = Side::Left;
    for result in auto {
        let phases = result.phases();
        let found = occupancy
            .find_on_side(favoured, phases)
            .or_else(|| occupancy.find_on_side(favoured.other(), phases));

        match found {
            Some(slots) => {
                occupancy.mark(&slots);
                layout.placements.push(Placement::new(result.clone(), &slots));
                favoured = favoured.other();
            }
            None => {
                let reason = match phases {
                    PhaseCount::Single => UnplacedReason::PanelFull,
                    PhaseCount::Three => UnplacedReason::NoContiguousSpan,
                };
                layout.unplaced.push(Unplaced {
                    circuit: result.clone(),
                    reason,
                });
            }
        }
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{CalculationEngine, CircuitSpec};
    use crate::panel::slot::Phase;
    use std::collections::HashSet;

    fn single(name: &str, load_w: f64) -> CircuitResult {
        CalculationEngine::default()
            .calculate(&CircuitSpec::new(name, 230.0, PhaseCount::Single).with_load(load_w, 1.0))
    }

    fn three(name: &str, load_w: f64) -> CircuitResult {
        CalculationEngine::default()
            .calculate(&CircuitSpec::new(name, 400.0, PhaseCount::Three).with_load(load_w, 1.0))
    }

    fn assert_unique_slots(layout: &PanelLayout) {
        let mut seen = HashSet::new();
        for slot in layout.placements.iter().flat_map(|p| p.slots()) {
            assert!(seen.insert(slot), "slot {slot} used twice");
        }
    }

    #[test]
    fn test_singles_alternate_sides_in_name_order() {
        let results = vec![single("C", 100.0), single("A", 100.0), single("B", 100.0), single("D", 100.0)];
        let layout = allocate(&results, &SlotHints::new(), PanelConfig::default());

        let hints = layout.hints();
        assert_eq!(hints["A"], 1);
        assert_eq!(hints["B"], 2);
        assert_eq!(hints["C"], 3);
        assert_eq!(hints["D"], 4);
        assert!(layout.unplaced.is_empty());
    }

    #[test]
    fn test_three_phase_starts_on_phase_a_boundary() {
        let results = vec![single("A1", 100.0), three("M1", 9000.0), single("Z1", 100.0)];
        let layout = allocate(&results, &SlotHints::new(), PanelConfig::default());

        // A1 takes slot 1 (left), M1 is favoured right and starts at 2.
        let motor = layout.placement("M1").unwrap();
        assert_eq!(motor.slots(), vec![2, 4, 6]);
        assert_eq!(
            motor.arms.iter().map(|a| a.phase).collect::<Vec<_>>(),
            vec![Phase::A, Phase::B, Phase::C]
        );
        // Z1 is favoured left again.
        assert_eq!(layout.placement("Z1").unwrap().slots(), vec![3]);
        assert_unique_slots(&layout);
    }

    #[test]
    fn test_three_phase_skips_partially_used_block() {
        let results = vec![single("A", 1.0), single("B", 1.0), three("M", 300.0)];
        let mut hints = SlotHints::new();
        hints.insert("A".into(), 3);
        hints.insert("B".into(), 4);
        let layout = allocate(&results, &hints, PanelConfig::default());
        // Both first blocks are broken by A and B; the motor lands at 7.
        assert_eq!(layout.placement("M").unwrap().slots(), vec![7, 9, 11]);
    }

    #[test]
    fn test_hints_are_honoured_before_auto_placement() {
        let results = vec![single("A", 1.0), single("B", 1.0), three("M", 300.0)];
        let mut hints = SlotHints::new();
        hints.insert("B".into(), 1);
        hints.insert("M".into(), 8);
        let layout = allocate(&results, &hints, PanelConfig::default());

        assert_eq!(layout.placement("B").unwrap().slots(), vec![1]);
        assert_eq!(layout.placement("M").unwrap().slots(), vec![8, 10, 12]);
        assert_eq!(layout.placement("A").unwrap().slots(), vec![3]);
        assert!(layout.ignored_hints.is_empty());
    }

    #[test]
    fn test_bad_hints_fall_back_to_auto_placement() {
        let results = vec![single("A", 1.0), single("B", 1.0), three("M", 300.0), single("X", 1.0)];
        let mut hints = SlotHints::new();
        hints.insert("A".into(), 5);
        hints.insert("B".into(), 5);
        hints.insert("M".into(), 3);
        hints.insert("X".into(), 99);
        let layout = allocate(&results, &hints, PanelConfig::default());

        assert_eq!(layout.placement("A").unwrap().slots(), vec![5]);
        let reasons: Vec<_> = layout
            .ignored_hints
            .iter()
            .map(|h| (h.circuit.as_str(), h.reason))
            .collect();
        assert_eq!(
            reasons,
            vec![
                ("B", HintRejection::Occupied),
                ("M", HintRejection::NotPhaseBoundary),
                ("X", HintRejection::OutOfRange),
            ]
        );
        assert_eq!(layout.placements.len(), 4);
        assert_unique_slots(&layout);
    }

    #[test]
    fn test_three_phase_hint_running_off_the_panel() {
        let results = vec![three("M", 300.0)];
        let mut hints = SlotHints::new();
        hints.insert("M".into(), 26);
        let layout = allocate(&results, &hints, PanelConfig::new(28).unwrap());
        assert_eq!(layout.ignored_hints[0].reason, HintRejection::OutOfRange);
        assert_eq!(layout.placement("M").unwrap().slots(), vec![1, 3, 5]);
    }

    #[test]
    fn test_hint_at_u32_max_is_ignored() {
        let results = vec![three("M", 300.0), single("S", 1.0)];
        let mut hints = SlotHints::new();
        hints.insert("M".into(), u32::MAX);
        hints.insert("S".into(), u32::MAX);
        let layout = allocate(&results, &hints, PanelConfig::default());

        let reasons: Vec<_> = layout.ignored_hints.iter().map(|h| h.reason).collect();
        assert_eq!(reasons, vec![HintRejection::OutOfRange, HintRejection::OutOfRange]);
        assert_eq!(layout.placement("M").unwrap().slots(), vec![1, 3, 5]);
        assert_eq!(layout.placement("S").unwrap().slots(), vec![2]);
    }

    #[test]
    fn test_three_phase_falls_back_to_other_column() {
        // One hinted single in every left phase-A block leaves no aligned
        // run on the left; the right column is empty.
        let mut results = vec![three("M", 300.0)];
        let mut hints = SlotHints::new();
        for (i, slot) in [1, 7, 13, 19, 25].into_iter().enumerate() {
            let name = format!("H{i}");
            results.push(single(&name, 1.0));
            hints.insert(name, slot);
        }
        let layout = allocate(&results, &hints, PanelConfig::default());

        assert!(layout.ignored_hints.is_empty());
        assert!(layout.unplaced.is_empty());
        assert_eq!(layout.placement("M").unwrap().slots(), vec![2, 4, 6]);
        assert_unique_slots(&layout);
    }

    #[test]
    fn test_unplaceable_three_phase_is_reported() {
        let config = PanelConfig::new(6).unwrap();
        let results = vec![single("A", 1.0), single("B", 1.0), three("M", 300.0)];
        let mut hints = SlotHints::new();
        hints.insert("A".into(), 3);
        hints.insert("B".into(), 6);
        let layout = allocate(&results, &hints, config);

        assert!(layout.placement("M").is_none());
        assert_eq!(layout.unplaced.len(), 1);
        assert_eq!(layout.unplaced[0].circuit.name(), "M");
        assert_eq!(layout.unplaced[0].reason, UnplacedReason::NoContiguousSpan);
    }

    #[test]
    fn test_full_panel_reports_remaining_singles() {
        let config = PanelConfig::new(6).unwrap();
        let results: Vec<_> = (0..8).map(|i| single(&format!("C{i}"), 10.0)).collect();
        let layout = allocate(&results, &SlotHints::new(), config);
        assert_eq!(layout.placements.len(), 6);
        assert_eq!(layout.unplaced.len(), 2);
        assert!(layout
            .unplaced
            .iter()
            .all(|u| u.reason == UnplacedReason::PanelFull));
        assert_unique_slots(&layout);
    }

    #[test]
    fn test_many_mixed_circuits_never_share_slots() {
        let mut results = Vec::new();
        for i in 0..14 {
            results.push(single(&format!("S{i:02}"), 100.0 * f64::from(i)));
        }
        for i in 0..4 {
            results.push(three(&format!("T{i}"), 5000.0));
        }
        let layout = allocate(&results, &SlotHints::new(), PanelConfig::default());
        assert_unique_slots(&layout);
        for p in &layout.placements {
            if p.span_len() == 3 {
                let slots = p.slots();
                assert!(is_phase_a_boundary(slots[0]));
                assert_eq!(slots[1], slots[0] + 2);
                assert_eq!(slots[2], slots[0] + 4);
            }
        }
        assert_eq!(
            layout.placements.len() + layout.unplaced.len(),
            results.len()
        );
    }

    #[test]
    fn test_reallocating_with_own_hints_is_stable() {
        let results = vec![single("B", 1.0), three("M", 300.0), single("A", 2.0), single("Q", 3.0)];
        let first = allocate(&results, &SlotHints::new(), PanelConfig::default());
        let second = allocate(&results, &first.hints(), PanelConfig::default());
        assert_eq!(first.hints(), second.hints());
    }
}

//! Branch-circuit calculation engine.
//!
//! Pipeline: demand load → design current → breaker → conductor → voltage
//! drop. Intermediate values stay unrounded; rounding to 2 decimals happens
//! once, when the [`CircuitResult`] is assembled.

use super::circuit::{CircuitResult, CircuitSpec, PhaseCount};
use crate::standards::StandardsTables;

/// Continuous-load margin applied to the design current before picking a
/// breaker.
pub const CONTINUOUS_LOAD_FACTOR: f64 = 1.25;

const SQRT_3: f64 = 1.732_050_807_568_877_2;

/// Stateless calculator bound to one set of standards tables.
#[derive(Debug, Clone, Default)]
pub struct CalculationEngine {
    tables: StandardsTables,
}

impl CalculationEngine {
    pub fn new(tables: StandardsTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &StandardsTables {
        &self.tables
    }

    /// Compute every derived field for `spec`. Never fails: degenerate
    /// inputs give zero for the affected metric, and out-of-table currents
    /// clamp to the largest entry with the matching flag set.
    pub fn calculate(&self, spec: &CircuitSpec) -> CircuitResult {
        let demand_va = self.demand_load_va(spec);
        let current_a = design_current_a(demand_va, spec.voltage, spec.phases);

        let (breaker_at, breaker_ok) = self
            .tables
            .select_breaker(current_a * CONTINUOUS_LOAD_FACTOR);
        let (conductor, conductor_ok) = self.tables.select_conductor(f64::from(breaker_at));

        let drop_percent = match self.tables.wire_properties(conductor.size_mm2) {
            Some(wire) => voltage_drop_percent(
                spec,
                current_a,
                wire.resistance_ohm_per_m(),
                wire.reactance_ohm_per_m(),
            ),
            None => 0.0,
        };

        CircuitResult {
            spec: spec.clone(),
            demand_category: self.tables.demand_table(&spec.load_type).category.clone(),
            demand_load_va: round2(demand_va),
            design_current_a: round2(current_a),
            breaker_at,
            conductor_mm2: conductor.size_mm2,
            conductor_ampacity_a: conductor.ampacity_a,
            voltage_drop_percent: round2(drop_percent),
            under_protected: !breaker_ok,
            conductor_undersized: !conductor_ok,
        }
    }

    /// Demand load in VA, unrounded. Zero when the power factor is zero.
    pub fn demand_load_va(&self, spec: &CircuitSpec) -> f64 {
        if spec.power_factor <= 0.0 {
            return 0.0;
        }
        let watts = self
            .tables
            .demand_table(&spec.load_type)
            .apply(spec.connected_load_w);
        watts / spec.power_factor
    }
}

/// Line current for `demand_va`. Zero when the voltage is zero.
pub fn design_current_a(demand_va: f64, voltage: f64, phases: PhaseCount) -> f64 {
    if voltage <= 0.0 {
        return 0.0;
    }
    match phases {
        PhaseCount::Single => demand_va / voltage,
        PhaseCount::Three => demand_va / (voltage * SQRT_3),
    }
}

/// Voltage drop as a percentage of the supply voltage.
///
/// `ΔV = k · L · I · (R·cosφ + X·sinφ)` with `k = 2` for a single-phase
/// out-and-back pair and `k = √3` for a balanced three-phase run.
pub fn voltage_drop_percent(
    spec: &CircuitSpec,
    current_a: f64,
    resistance_ohm_per_m: f64,
    reactance_ohm_per_m: f64,
) -> f64 {
    if spec.voltage <= 0.0 || spec.circuit_length_m <= 0.0 {
        return 0.0;
    }
    let pf = spec.power_factor;
    let sin_phi = (1.0 - pf * pf).max(0.0).sqrt();
    let multiplier = match spec.phases {
        PhaseCount::Single => 2.0,
        PhaseCount::Three => SQRT_3,
    };
    let drop_v = multiplier
        * spec.circuit_length_m
        * current_a
        * (resistance_ohm_per_m * pf + reactance_ohm_per_m * sin_phi);
    drop_v / spec.voltage * 100.0
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

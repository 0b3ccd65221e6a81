//! Built-in reference tables.
//!
//! Breaker ratings follow the IEC 60898 preferred series. Ampacities are for
//! PVC-insulated copper, two or three loaded conductors, installed in conduit
//! at 30 °C ambient. Resistance is the AC value at 70 °C conductor
//! temperature.

use super::demand::{DemandTable, DemandTier, DEFAULT_CATEGORY};
use super::{ConductorRating, StandardsTables, WireProperties};

pub const BREAKER_RATINGS_A: [u32; 15] = [
    6, 10, 16, 20, 25, 32, 40, 50, 63, 80, 100, 125, 160, 200, 250,
];

/// (size mm², ampacity A)
pub const AMPACITY: [(f64, f64); 16] = [
    (1.5, 17.5),
    (2.5, 24.0),
    (4.0, 32.0),
    (6.0, 41.0),
    (10.0, 57.0),
    (16.0, 76.0),
    (25.0, 101.0),
    (35.0, 125.0),
    (50.0, 151.0),
    (70.0, 192.0),
    (95.0, 232.0),
    (120.0, 269.0),
    (150.0, 300.0),
    (185.0, 341.0),
    (240.0, 400.0),
    (300.0, 458.0),
];

/// (size mm², R Ω/km, X Ω/km)
pub const WIRE_PROPERTIES: [(f64, f64, f64); 16] = [
    (1.5, 14.48, 0.118),
    (2.5, 8.87, 0.109),
    (4.0, 5.52, 0.101),
    (6.0, 3.69, 0.0955),
    (10.0, 2.19, 0.0861),
    (16.0, 1.38, 0.0817),
    (25.0, 0.870, 0.0813),
    (35.0, 0.627, 0.0783),
    (50.0, 0.463, 0.0779),
    (70.0, 0.321, 0.0751),
    (95.0, 0.232, 0.0762),
    (120.0, 0.184, 0.0740),
    (150.0, 0.150, 0.0745),
    (185.0, 0.121, 0.0742),
    (240.0, 0.0922, 0.0752),
    (300.0, 0.0745, 0.0750),
];

fn up_to(limit_va: f64, factor: f64) -> DemandTier {
    DemandTier::UpTo { limit_va, factor }
}

fn over(threshold_va: f64, factor: f64) -> DemandTier {
    DemandTier::Over {
        threshold_va,
        factor,
    }
}

/// Demand-factor tables shipped with the crate.
pub fn demand_tables() -> Vec<DemandTable> {
    vec![
        DemandTable::unity("General"),
        DemandTable::new(
            "Lighting",
            vec![
                up_to(3_000.0, 1.0),
                up_to(120_000.0, 0.35),
                over(120_000.0, 0.25),
            ],
        ),
        DemandTable::new(
            "Receptacles (General)",
            vec![up_to(10_000.0, 1.0), over(10_000.0, 0.5)],
        ),
        DemandTable::new(
            "Kitchen Equipment",
            vec![up_to(5_000.0, 1.0), over(5_000.0, 0.65)],
        ),
        DemandTable::unity("HVAC"),
        DemandTable::unity("Motors"),
    ]
}

/// The tables as shipped.
pub fn default_tables() -> StandardsTables {
    StandardsTables {
        breaker_ratings_a: BREAKER_RATINGS_A.to_vec(),
        ampacity: AMPACITY
            .iter()
            .map(|&(size_mm2, ampacity_a)| ConductorRating {
                size_mm2,
                ampacity_a,
            })
            .collect(),
        wire_properties: WIRE_PROPERTIES
            .iter()
            .map(
                |&(size_mm2, resistance_ohm_per_km, reactance_ohm_per_km)| WireProperties {
                    size_mm2,
                    resistance_ohm_per_km,
                    reactance_ohm_per_km,
                },
            )
            .collect(),
        demand: demand_tables(),
        default_demand: DemandTable::unity(DEFAULT_CATEGORY),
    }
}

//! PanelCalc - electrical circuit sizing and panel schedule library
//!
//! Computes demand load, design current, breaker and conductor sizes and
//! voltage drop for each circuit, then lays the circuits out in a
//! distribution panel and balances the load across phases.
//!
//! # Quick Start
//!
//! ```
//! use panelcalc::{CircuitRecord, DesignOptions, PanelCalcCore};
//!
//! let records: Vec<CircuitRecord> = serde_json::from_str(r#"[
//!     {"circuit_name": "Lights", "voltage": 230, "phases": 1,
//!      "power_factor": 0.9, "load_type": "General", "connected_load_w": 2000,
//!      "circuit_length": 20}
//! ]"#).unwrap();
//!
//! let schedule = PanelCalcCore::design(&records, &DesignOptions::default()).unwrap();
//! let lights = schedule.result("Lights").unwrap();
//! assert_eq!(lights.breaker_at, 16);
//! assert_eq!(schedule.layout.placement("Lights").unwrap().slots(), vec![1]);
//! ```
//!
//! # Features
//!
//! - **Circuit sizing**: tiered demand factors, 125% continuous-load breaker
//!   selection, ampacity lookup, voltage drop with R and X
//! - **Panel allocation**: saved slot hints, alternating sides, three-phase
//!   spans on phase-A rows
//! - **Rearrangement**: slot swaps and greedy phase balancing
//! - **Replaceable tables**: JSON standards files override the built-in set

pub mod calc;
pub mod core;
pub mod panel;
pub mod record;
pub mod rules;
pub mod standards;

// Re-export main types
pub use calc::{CalculationEngine, CircuitResult, CircuitSpec, PhaseCount};
pub use core::{
    load_project, save_project, DesignOptions, PanelCalcCore, PanelCalcError, PanelSchedule,
    Project, ScheduleStats,
};
pub use panel::{
    BalanceReport, PanelAllocator, PanelConfig, PanelLayout, SlotHints, SwapOutcome,
};
pub use record::{CircuitRecord, RecordError};
pub use rules::{Issue, RulesEngine, Severity};
pub use standards::{StandardsError, StandardsTables};

/// Calculate one stored circuit against the tables named in `options`.
pub fn calculate_circuit(
    record: &CircuitRecord,
    options: &DesignOptions,
) -> Result<CircuitResult, PanelCalcError> {
    let engine = CalculationEngine::new(options.load_tables()?);
    Ok(engine.calculate(&record.to_spec()?))
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        CircuitRecord, CircuitResult, CircuitSpec, DesignOptions, Issue, PanelCalcCore,
        PanelCalcError, PanelSchedule, PhaseCount, Severity,
    };
}

//! Branch Circuit Calculation
//!
//! Turns a [`CircuitSpec`] into a [`CircuitResult`] using the demand-factor,
//! breaker, ampacity and impedance tables in [`crate::standards`].
//!
//! # Usage
//!
//! ```rust
//! use panelcalc::calc::{CalculationEngine, CircuitSpec, PhaseCount};
//!
//! let engine = CalculationEngine::default();
//! let spec = CircuitSpec::new("Office sockets", 230.0, PhaseCount::Single)
//!     .with_load(2000.0, 0.9)
//!     .with_length(20.0);
//!
//! let result = engine.calculate(&spec);
//! assert_eq!(result.breaker_at, 16);
//! ```

pub mod circuit;
pub mod engine;

pub use circuit::{CircuitResult, CircuitSpec, InvalidPhaseCount, PhaseCount};
pub use engine::{
    design_current_a, round2, voltage_drop_percent, CalculationEngine, CONTINUOUS_LOAD_FACTOR,
};

//! Circuit input and output records.

use serde::{Deserialize, Serialize};

/// Number of phases a circuit is fed from. Serialised as `1` or `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PhaseCount {
    Single,
    Three,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("phase count must be 1 or 3, got {0}")]
pub struct InvalidPhaseCount(pub u8);

impl TryFrom<u8> for PhaseCount {
    type Error = InvalidPhaseCount;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PhaseCount::Single),
            3 => Ok(PhaseCount::Three),
            other => Err(InvalidPhaseCount(other)),
        }
    }
}

impl From<PhaseCount> for u8 {
    fn from(value: PhaseCount) -> Self {
        match value {
            PhaseCount::Single => 1,
            PhaseCount::Three => 3,
        }
    }
}

impl PhaseCount {
    /// Panel slots consumed by one circuit.
    pub fn slot_count(self) -> usize {
        match self {
            PhaseCount::Single => 1,
            PhaseCount::Three => 3,
        }
    }

    pub fn is_three_phase(self) -> bool {
        self == PhaseCount::Three
    }
}

/// User-supplied description of one branch circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitSpec {
    pub name: String,
    pub voltage: f64,
    pub phases: PhaseCount,
    pub power_factor: f64,
    pub connected_load_w: f64,
    pub load_type: String,
    pub circuit_length_m: f64,
}

impl CircuitSpec {
    pub fn new(name: impl Into<String>, voltage: f64, phases: PhaseCount) -> Self {
        Self {
            name: name.into(),
            voltage,
            phases,
            power_factor: 1.0,
            connected_load_w: 0.0,
            load_type: "General".to_string(),
            circuit_length_m: 0.0,
        }
    }

    pub fn with_load(mut self, connected_load_w: f64, power_factor: f64) -> Self {
        self.connected_load_w = connected_load_w;
        self.power_factor = power_factor;
        self
    }

    pub fn with_load_type(mut self, load_type: impl Into<String>) -> Self {
        self.load_type = load_type.into();
        self
    }

    pub fn with_length(mut self, circuit_length_m: f64) -> Self {
        self.circuit_length_m = circuit_length_m;
        self
    }
}

/// Fully computed circuit. Numeric outputs are rounded to 2 decimals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitResult {
    #[serde(flatten)]
    pub spec: CircuitSpec,
    /// Demand category actually used (the default category when
    /// `load_type` is unknown).
    pub demand_category: String,
    pub demand_load_va: f64,
    pub design_current_a: f64,
    pub breaker_at: u32,
    pub conductor_mm2: f64,
    pub conductor_ampacity_a: f64,
    pub voltage_drop_percent: f64,
    /// No breaker rating covers 125% of the design current.
    pub under_protected: bool,
    /// No conductor ampacity covers the chosen breaker.
    pub conductor_undersized: bool,
}

impl CircuitResult {
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn phases(&self) -> PhaseCount {
        self.spec.phases
    }

    /// VA shown on the panel schedule: demand load when non-zero, otherwise
    /// the connected load, rounded to a whole VA.
    pub fn display_va(&self) -> f64 {
        let va = if self.demand_load_va > 0.0 {
            self.demand_load_va
        } else {
            self.spec.connected_load_w
        };
        va.round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_count_from_integer() {
        assert_eq!(PhaseCount::try_from(1u8), Ok(PhaseCount::Single));
        assert_eq!(PhaseCount::try_from(3u8), Ok(PhaseCount::Three));
        assert_eq!(PhaseCount::try_from(2u8), Err(InvalidPhaseCount(2)));
    }

    #[test]
    fn test_phase_count_serde() {
        let spec = CircuitSpec::new("M1", 400.0, PhaseCount::Three);
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["phases"], 3);

        let bad = r#"{"name":"X","voltage":230.0,"phases":2,"power_factor":1.0,
            "connected_load_w":0.0,"load_type":"General","circuit_length_m":0.0}"#;
        assert!(serde_json::from_str::<CircuitSpec>(bad).is_err());
    }

    #[test]
    fn test_builder_defaults() {
        let spec = CircuitSpec::new("L1", 230.0, PhaseCount::Single)
            .with_load(1500.0, 0.95)
            .with_length(12.0);
        assert_eq!(spec.load_type, "General");
        assert_eq!(spec.connected_load_w, 1500.0);
        assert_eq!(spec.power_factor, 0.95);
        assert_eq!(spec.circuit_length_m, 12.0);
    }
}

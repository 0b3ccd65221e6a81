//! Persisted circuit attributes.
//!
//! [`CircuitRecord`] is the flat key/value shape a host application stores
//! on each circuit object. It converts into a validated [`CircuitSpec`] for
//! calculation and receives the computed fields, slot and display colour
//! back afterwards.

use serde::{Deserialize, Serialize};

use crate::calc::{CircuitResult, CircuitSpec, PhaseCount};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    #[error("Circuit name is empty")]
    EmptyName,
    #[error("Circuit '{circuit}': phases must be 1 or 3, got {phases}")]
    Phases { circuit: String, phases: u8 },
    #[error("Circuit '{circuit}': {field} must be a finite, non-negative number, got {value}")]
    Negative {
        circuit: String,
        field: &'static str,
        value: f64,
    },
    #[error("Circuit '{circuit}': power_factor must be within 0..=1, got {value}")]
    PowerFactor { circuit: String, value: f64 },
}

/// Canonical form of a circuit name: surrounding whitespace removed.
/// Every name comparison and the colour pick go through this.
pub fn normalize_name(name: &str) -> &str {
    name.trim()
}

/// Text colours handed out to circuits without a stored colour.
pub const TEXT_COLOR_PALETTE: [&str; 12] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#393b79", "#637939",
];

fn default_power_factor() -> f64 {
    1.0
}

fn default_load_type() -> String {
    "General".to_string()
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CircuitRecord {
    pub circuit_name: String,
    pub voltage: f64,
    pub phases: u8,
    #[serde(default = "default_power_factor")]
    pub power_factor: f64,
    #[serde(default)]
    pub circuit_length: f64,
    #[serde(default = "default_load_type")]
    pub load_type: String,
    #[serde(default)]
    pub connected_load_w: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_slot: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_text_color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demand_load_va: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_current_a: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub breaker_at: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conductor_mm2: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage_drop_percent: Option<f64>,
}

impl CircuitRecord {
    pub fn name(&self) -> &str {
        normalize_name(&self.circuit_name)
    }

    /// Validate and convert into an engine input.
    pub fn to_spec(&self) -> Result<CircuitSpec, RecordError> {
        let name = self.name();
        if name.is_empty() {
            return Err(RecordError::EmptyName);
        }
        let phases = PhaseCount::try_from(self.phases).map_err(|e| RecordError::Phases {
            circuit: name.to_string(),
            phases: e.0,
        })?;

        for (field, value) in [
            ("voltage", self.voltage),
            ("connected_load_w", self.connected_load_w),
            ("circuit_length", self.circuit_length),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RecordError::Negative {
                    circuit: name.to_string(),
                    field,
                    value,
                });
            }
        }
        if !(0.0..=1.0).contains(&self.power_factor) {
            return Err(RecordError::PowerFactor {
                circuit: name.to_string(),
                value: self.power_factor,
            });
        }

        Ok(CircuitSpec {
            name: name.to_string(),
            voltage: self.voltage,
            phases,
            power_factor: self.power_factor,
            connected_load_w: self.connected_load_w,
            load_type: self.load_type.clone(),
            circuit_length_m: self.circuit_length,
        })
    }

    pub fn from_spec(spec: &CircuitSpec) -> Self {
        Self {
            circuit_name: spec.name.clone(),
            voltage: spec.voltage,
            phases: spec.phases.into(),
            power_factor: spec.power_factor,
            circuit_length: spec.circuit_length_m,
            load_type: spec.load_type.clone(),
            connected_load_w: spec.connected_load_w,
            ..Self::default()
        }
    }

    /// Write back the computed fields and the chosen slot. A colour is
    /// generated only when none is stored yet.
    pub fn apply_result(&mut self, result: &CircuitResult, slot: Option<u32>) {
        self.demand_load_va = Some(result.demand_load_va);
        self.design_current_a = Some(result.design_current_a);
        self.breaker_at = Some(result.breaker_at);
        self.conductor_mm2 = Some(result.conductor_mm2);
        self.voltage_drop_percent = Some(result.voltage_drop_percent);
        self.schedule_slot = slot;
        if self.schedule_text_color.is_none() {
            self.schedule_text_color = Some(text_color_for(&self.circuit_name).to_string());
        }
    }
}

/// Stable palette pick for `name` (FNV-1a over the normalized bytes).
pub fn text_color_for(name: &str) -> &'static str {
    let mut hash: u32 = 0x811c_9dc5;
    for byte in normalize_name(name).bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    TEXT_COLOR_PALETTE[hash as usize % TEXT_COLOR_PALETTE.len()]
}

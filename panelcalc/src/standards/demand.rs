//! Demand-factor tiers.
//!
//! A category's tiers are walked left to right against the connected load.
//! `UpTo` tiers carve out a cumulative slice of the load; an `Over` tier is a
//! catch-all that applies its factor to whatever load is left.

use serde::{Deserialize, Serialize};

/// Name of the catch-all category used for unrecognised load types.
pub const DEFAULT_CATEGORY: &str = "Default";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DemandTier {
    /// Load up to `limit_va` (cumulative from zero) at `factor`.
    UpTo { limit_va: f64, factor: f64 },
    /// All remaining load above `threshold_va` at `factor`.
    Over { threshold_va: f64, factor: f64 },
}

impl DemandTier {
    pub fn factor(&self) -> f64 {
        match self {
            DemandTier::UpTo { factor, .. } | DemandTier::Over { factor, .. } => *factor,
        }
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, DemandTier::Over { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandTable {
    pub category: String,
    pub tiers: Vec<DemandTier>,
}

impl DemandTable {
    pub fn new(category: impl Into<String>, tiers: Vec<DemandTier>) -> Self {
        Self {
            category: category.into(),
            tiers,
        }
    }

    /// Single 100% catch-all tier.
    pub fn unity(category: impl Into<String>) -> Self {
        Self::new(
            category,
            vec![DemandTier::Over {
                threshold_va: 0.0,
                factor: 1.0,
            }],
        )
    }

    /// Largest factor across all tiers (0 for an empty table).
    pub fn max_factor(&self) -> f64 {
        self.tiers
            .iter()
            .map(DemandTier::factor)
            .fold(0.0, f64::max)
    }

    /// True when the last tier is an `Over` catch-all.
    pub fn has_catch_all(&self) -> bool {
        self.tiers.last().map(DemandTier::is_catch_all).unwrap_or(false)
    }

    /// Applies the tiers to `connected_va` and returns the per-tier
    /// contributions, in tier order. Tiers never reached are omitted.
    pub fn contributions(&self, connected_va: f64) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.tiers.len());
        let mut remaining = connected_va;
        let mut consumed = 0.0;

        for tier in &self.tiers {
            if remaining <= 0.0 {
                break;
            }
            match *tier {
                DemandTier::UpTo { limit_va, factor } => {
                    let slice = remaining.min((limit_va - consumed).max(0.0));
                    out.push(slice * factor);
                    remaining -= slice;
                    consumed = limit_va;
                }
                DemandTier::Over { factor, .. } => {
                    out.push(remaining * factor);
                    remaining = 0.0;
                }
            }
        }

        out
    }

    /// Sum of [`contributions`](Self::contributions), i.e. demand in watts
    /// before power-factor correction.
    pub fn apply(&self, connected_va: f64) -> f64 {
        self.contributions(connected_va).iter().sum()
    }
}

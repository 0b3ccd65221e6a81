//! Standards Reference Tables
//!
//! Static lookup data used by the calculation engine:
//!
//! - ascending breaker ratings (A)
//! - conductor ampacity by size (mm², A)
//! - conductor resistance and reactance per km
//! - demand-factor tiers keyed by load category
//!
//! The built-in set lives in [`builtin`]. A project can carry its own tables
//! as a JSON file with the same shape as the serialised [`StandardsTables`];
//! see [`StandardsTables::from_json_file`].
//!
//! Lookups never fail. An unknown load category resolves to the default
//! table, a single 100% catch-all tier.

pub mod builtin;
pub mod demand;

use std::path::Path;

use serde::{Deserialize, Serialize};

pub use demand::{DemandTable, DemandTier, DEFAULT_CATEGORY};

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid standards JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Table '{0}' is empty")]
    Empty(&'static str),
    #[error("Table '{table}' is not strictly ascending at entry {index}")]
    NotAscending { table: &'static str, index: usize },
    #[error("Demand category '{0}' has a factor outside 0..=1")]
    BadFactor(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorRating {
    pub size_mm2: f64,
    pub ampacity_a: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireProperties {
    pub size_mm2: f64,
    pub resistance_ohm_per_km: f64,
    pub reactance_ohm_per_km: f64,
}

impl WireProperties {
    pub fn resistance_ohm_per_m(&self) -> f64 {
        self.resistance_ohm_per_km / 1000.0
    }

    pub fn reactance_ohm_per_m(&self) -> f64 {
        self.reactance_ohm_per_km / 1000.0
    }
}

/// Immutable reference data for one electrical standard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardsTables {
    pub(crate) breaker_ratings_a: Vec<u32>,
    pub(crate) ampacity: Vec<ConductorRating>,
    pub(crate) wire_properties: Vec<WireProperties>,
    pub(crate) demand: Vec<DemandTable>,
    #[serde(default = "default_demand_table")]
    pub(crate) default_demand: DemandTable,
}

fn default_demand_table() -> DemandTable {
    DemandTable::unity(DEFAULT_CATEGORY)
}

impl Default for StandardsTables {
    fn default() -> Self {
        builtin::default_tables()
    }
}

impl StandardsTables {
    /// Load tables from a JSON file and validate them.
    pub fn from_json_file(path: &Path) -> Result<Self, StandardsError> {
        let content = std::fs::read_to_string(path)?;
        let tables = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded standards tables from {:?} ({} categories)",
            path.file_name(),
            tables.demand.len()
        );
        Ok(tables)
    }

    pub fn from_json_str(json: &str) -> Result<Self, StandardsError> {
        let tables: StandardsTables = serde_json::from_str(json)?;
        tables.validate()?;
        tables.warn_on_gaps();
        Ok(tables)
    }

    /// Checks that every table is non-empty and ascending, and that every
    /// demand factor lies in `0..=1`.
    pub fn validate(&self) -> Result<(), StandardsError> {
        if self.breaker_ratings_a.is_empty() {
            return Err(StandardsError::Empty("breaker_ratings_a"));
        }
        if self.ampacity.is_empty() {
            return Err(StandardsError::Empty("ampacity"));
        }
        if let Some(index) = first_non_ascending(&self.breaker_ratings_a, |r| f64::from(*r)) {
            return Err(StandardsError::NotAscending {
                table: "breaker_ratings_a",
                index,
            });
        }
        if let Some(index) = first_non_ascending(&self.ampacity, |c| c.size_mm2) {
            return Err(StandardsError::NotAscending {
                table: "ampacity",
                index,
            });
        }
        for table in self.demand.iter().chain(std::iter::once(&self.default_demand)) {
            if table
                .tiers
                .iter()
                .any(|t| !(0.0..=1.0).contains(&t.factor()))
            {
                return Err(StandardsError::BadFactor(table.category.clone()));
            }
        }
        Ok(())
    }

    fn warn_on_gaps(&self) {
        for rating in &self.ampacity {
            if self.wire_properties(rating.size_mm2).is_none() {
                tracing::warn!(
                    "No resistance/reactance for {} mm²; voltage drop will read 0 for that size",
                    rating.size_mm2
                );
            }
        }
        for table in &self.demand {
            if !table.has_catch_all() {
                tracing::warn!(
                    "Demand category '{}' has no catch-all tier; load above its last limit is ignored",
                    table.category
                );
            }
        }
    }

    pub fn breaker_ratings(&self) -> &[u32] {
        &self.breaker_ratings_a
    }

    pub fn ampacity(&self) -> &[ConductorRating] {
        &self.ampacity
    }

    pub fn wire_properties(&self, size_mm2: f64) -> Option<&WireProperties> {
        self.wire_properties
            .iter()
            .find(|w| (w.size_mm2 - size_mm2).abs() < 1e-9)
    }

    /// Names of the configured demand categories, in table order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.demand.iter().map(|t| t.category.as_str())
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.find_demand(category).is_some()
    }

    /// Demand table for `category`, or the default table when unknown.
    /// Matching ignores ASCII case and surrounding whitespace.
    pub fn demand_table(&self, category: &str) -> &DemandTable {
        self.find_demand(category).unwrap_or(&self.default_demand)
    }

    pub fn default_demand_table(&self) -> &DemandTable {
        &self.default_demand
    }

    fn find_demand(&self, category: &str) -> Option<&DemandTable> {
        let wanted = category.trim();
        self.demand
            .iter()
            .find(|t| t.category == wanted)
            .or_else(|| {
                self.demand
                    .iter()
                    .find(|t| t.category.eq_ignore_ascii_case(wanted))
            })
    }

    /// Smallest rating ≥ `required_a`, else the largest. The flag is false
    /// when the fallback was used.
    pub fn select_breaker(&self, required_a: f64) -> (u32, bool) {
        first_or_last(&self.breaker_ratings_a, |r| f64::from(*r) >= required_a)
            .map(|(r, ok)| (*r, ok))
            .unwrap_or((0, false))
    }

    /// Smallest conductor whose ampacity ≥ `breaker_a`, else the largest.
    pub fn select_conductor(&self, breaker_a: f64) -> (ConductorRating, bool) {
        first_or_last(&self.ampacity, |c| c.ampacity_a >= breaker_a)
            .map(|(c, ok)| (*c, ok))
            .unwrap_or((
                ConductorRating {
                    size_mm2: 0.0,
                    ampacity_a: 0.0,
                },
                false,
            ))
    }
}

/// Linear "find first qualifying, else last" scan.
fn first_or_last<T>(items: &[T], qualifies: impl Fn(&T) -> bool) -> Option<(&T, bool)> {
    items
        .iter()
        .find(|item| qualifies(*item))
        .map(|item| (item, true))
        .or_else(|| items.last().map(|item| (item, false)))
}

fn first_non_ascending<T>(items: &[T], key: impl Fn(&T) -> f64) -> Option<usize> {
    items
        .windows(2)
        .position(|w| key(&w[1]) <= key(&w[0]))
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_breaker_smallest_qualifying() {
        let tables = StandardsTables::default();
        assert_eq!(tables.select_breaker(12.08), (16, true));
        assert_eq!(tables.select_breaker(16.0), (16, true));
        assert_eq!(tables.select_breaker(0.0), (6, true));
    }

    #[test]
    fn test_select_breaker_falls_back_to_largest() {
        let tables = StandardsTables::default();
        assert_eq!(tables.select_breaker(1_000.0), (250, false));
    }

    #[test]
    fn test_select_conductor() {
        let tables = StandardsTables::default();
        let (c, ok) = tables.select_conductor(16.0);
        assert!(ok);
        assert_eq!(c.size_mm2, 1.5);

        let (c, ok) = tables.select_conductor(20.0);
        assert!(ok);
        assert_eq!(c.size_mm2, 2.5);

        let (c, ok) = tables.select_conductor(500.0);
        assert!(!ok);
        assert_eq!(c.size_mm2, 300.0);
    }

    #[test]
    fn test_unknown_category_falls_back_to_default() {
        let tables = StandardsTables::default();
        let table = tables.demand_table("Swimming Pool Heaters");
        assert_eq!(table.category, DEFAULT_CATEGORY);
        assert_eq!(table.apply(1234.0), 1234.0);
        assert!(!tables.has_category("Swimming Pool Heaters"));
    }

    #[test]
    fn test_category_lookup_ignores_case() {
        let tables = StandardsTables::default();
        assert_eq!(tables.demand_table(" lighting ").category, "Lighting");
    }

    #[test]
    fn test_json_round_trip_of_builtin_tables() {
        let tables = StandardsTables::default();
        let json = serde_json::to_string(&tables).unwrap();
        let loaded = StandardsTables::from_json_str(&json).unwrap();
        assert_eq!(loaded, tables);
    }

    #[test]
    fn test_rejects_unsorted_breakers() {
        let mut tables = StandardsTables::default();
        tables.breaker_ratings_a = vec![10, 6, 16];
        let json = serde_json::to_string(&tables).unwrap();
        let err = StandardsTables::from_json_str(&json).unwrap_err();
        assert!(matches!(
            err,
            StandardsError::NotAscending {
                table: "breaker_ratings_a",
                index: 1
            }
        ));
    }

    #[test]
    fn test_rejects_empty_ampacity() {
        let mut tables = StandardsTables::default();
        tables.ampacity.clear();
        assert!(matches!(
            tables.validate(),
            Err(StandardsError::Empty("ampacity"))
        ));
    }

    #[test]
    fn test_rejects_factor_above_one() {
        let mut tables = StandardsTables::default();
        tables.demand.push(DemandTable::new(
            "Bogus",
            vec![DemandTier::Over {
                threshold_va: 0.0,
                factor: 1.5,
            }],
        ));
        assert!(matches!(tables.validate(), Err(StandardsError::BadFactor(c)) if c == "Bogus"));
    }

    #[test]
    fn test_default_demand_is_optional_in_json() {
        let json = r#"{
            "breaker_ratings_a": [10, 20],
            "ampacity": [{"size_mm2": 2.5, "ampacity_a": 24.0}],
            "wire_properties": [],
            "demand": []
        }"#;
        let tables = StandardsTables::from_json_str(json).unwrap();
        assert_eq!(tables.default_demand_table().category, DEFAULT_CATEGORY);
        assert_eq!(tables.categories().count(), 0);
    }
}

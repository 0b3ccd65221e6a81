//! Core design workflow shared by the CLI and any host integration.
//! Records in, schedule out; no UI or storage dependencies beyond the
//! optional JSON project file.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calc::{CalculationEngine, CircuitResult};
use crate::panel::{
    BalanceReport, PanelAllocator, PanelConfig, PanelConfigError, PanelLayout, SlotHints,
    SwapOutcome, DEFAULT_SLOT_COUNT,
};
use crate::record::{CircuitRecord, RecordError};
use crate::rules::{Issue, RuleContext, RulesEngine, Severity};
use crate::standards::{StandardsError, StandardsTables};

#[derive(Debug, thiserror::Error)]
pub enum PanelCalcError {
    #[error("Invalid circuit: {0}")]
    Record(#[from] RecordError),
    #[error("Duplicate circuit name: {0}")]
    DuplicateName(String),
    #[error("Standards tables: {0}")]
    Standards(#[from] StandardsError),
    #[error("Panel: {0}")]
    Panel(#[from] PanelConfigError),
    #[error("Project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Options for a design run, read from the project file and overridable
/// from the command line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignOptions {
    pub panel_slots: u32,
    pub auto_balance: bool,
    pub max_voltage_drop_percent: f64,
    /// JSON standards tables replacing the built-in set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standards_path: Option<PathBuf>,
}

impl Default for DesignOptions {
    fn default() -> Self {
        Self {
            panel_slots: DEFAULT_SLOT_COUNT,
            auto_balance: false,
            max_voltage_drop_percent: 3.0,
            standards_path: None,
        }
    }
}

impl DesignOptions {
    pub fn panel_config(&self) -> Result<PanelConfig, PanelCalcError> {
        Ok(PanelConfig::new(self.panel_slots)?)
    }

    /// Resolve a relative `standards_path` against `base_dir`, normally the
    /// directory holding the project file.
    pub fn with_base_dir(mut self, base_dir: &Path) -> Self {
        if let Some(path) = &self.standards_path {
            if path.is_relative() {
                self.standards_path = Some(base_dir.join(path));
            }
        }
        self
    }

    pub fn load_tables(&self) -> Result<StandardsTables, PanelCalcError> {
        match &self.standards_path {
            Some(path) => Ok(StandardsTables::from_json_file(path)?),
            None => Ok(StandardsTables::default()),
        }
    }
}

/// On-disk project: options plus the persisted circuit attributes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub options: DesignOptions,
    pub circuits: Vec<CircuitRecord>,
}

impl Project {
    /// Write results, slots and colours from `schedule` back onto the
    /// matching records. Unplaced circuits lose their stored slot.
    pub fn apply_schedule(&mut self, schedule: &PanelSchedule) {
        let hints = schedule.layout.hints();
        for record in &mut self.circuits {
            let name = record.name();
            if let Some(result) = schedule.results.iter().find(|r| r.name() == name) {
                let slot = hints.get(name).copied();
                record.apply_result(result, slot);
            }
        }
    }
}

pub fn load_project(path: &Path) -> Result<Project, PanelCalcError> {
    let content = std::fs::read_to_string(path)?;
    let project: Project = serde_json::from_str(&content)?;
    tracing::info!(
        "Loaded project {:?} with {} circuits",
        path.file_name(),
        project.circuits.len()
    );
    Ok(project)
}

pub fn save_project(path: &Path, project: &Project) -> Result<(), PanelCalcError> {
    let json = serde_json::to_string_pretty(project)?;
    std::fs::write(path, json)?;
    tracing::info!("Saved project {:?}", path.file_name());
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScheduleStats {
    pub errors: usize,
    pub warnings: usize,
    pub suggestions: usize,
    pub info: usize,
}

fn issues_to_stats(issues: &[Issue]) -> ScheduleStats {
    let mut stats = ScheduleStats::default();
    for i in issues {
        match i.severity {
            Severity::Error => stats.errors += 1,
            Severity::Warning => stats.warnings += 1,
            Severity::Suggestion => stats.suggestions += 1,
            Severity::Info => stats.info += 1,
        }
    }
    stats
}

/// Computed circuits, their panel layout and the advisories raised.
#[derive(Debug, Clone, Serialize)]
pub struct PanelSchedule {
    pub generated_at: DateTime<Utc>,
    pub results: Vec<CircuitResult>,
    pub layout: PanelLayout,
    pub issues: Vec<Issue>,
    pub stats: ScheduleStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance: Option<BalanceReport>,
    #[serde(skip)]
    tables: StandardsTables,
    #[serde(skip)]
    max_voltage_drop_percent: f64,
}

impl PanelSchedule {
    pub fn has_errors(&self) -> bool {
        self.stats.errors > 0
    }

    pub fn has_warnings_or_errors(&self) -> bool {
        self.stats.errors > 0 || self.stats.warnings > 0
    }

    pub fn total_issues(&self) -> usize {
        self.stats.errors + self.stats.warnings + self.stats.suggestions + self.stats.info
    }

    pub fn result(&self, name: &str) -> Option<&CircuitResult> {
        self.results.iter().find(|r| r.name() == name)
    }

    /// Re-run the advisory rules after the layout changed.
    fn refresh_issues(&mut self) {
        let ctx = RuleContext {
            results: &self.results,
            layout: &self.layout,
            tables: &self.tables,
            max_voltage_drop_percent: self.max_voltage_drop_percent,
        };
        self.issues = RulesEngine::with_default_rules().analyze(&ctx);
        self.stats = issues_to_stats(&self.issues);
    }
}

/// Core design API used by the CLI and host integrations.
pub struct PanelCalcCore;

impl PanelCalcCore {
    /// Calculate every circuit, place them in the panel (saved
    /// `schedule_slot`s first), optionally balance, and collect advisories.
    pub fn design(
        records: &[CircuitRecord],
        options: &DesignOptions,
    ) -> Result<PanelSchedule, PanelCalcError> {
        let tables = options.load_tables()?;
        let config = options.panel_config()?;
        let engine = CalculationEngine::new(tables);

        let mut seen = HashSet::new();
        let mut results = Vec::with_capacity(records.len());
        let mut hints = SlotHints::new();
        for record in records {
            let spec = record.to_spec()?;
            if !seen.insert(spec.name.clone()) {
                return Err(PanelCalcError::DuplicateName(spec.name));
            }
            if let Some(slot) = record.schedule_slot {
                hints.insert(spec.name.clone(), slot);
            }
            let result = engine.calculate(&spec);
            tracing::debug!(
                circuit = %result.name(),
                demand_va = result.demand_load_va,
                current_a = result.design_current_a,
                breaker_a = result.breaker_at,
                conductor_mm2 = result.conductor_mm2,
                "calculated circuit"
            );
            results.push(result);
        }

        let layout = PanelAllocator::new(config).allocate(&results, &hints);
        for unplaced in &layout.unplaced {
            tracing::warn!(
                "Circuit '{}' could not be placed ({:?})",
                unplaced.circuit.name(),
                unplaced.reason
            );
        }

        let mut schedule = PanelSchedule {
            generated_at: Utc::now(),
            results,
            layout,
            issues: Vec::new(),
            stats: ScheduleStats::default(),
            balance: None,
            tables: engine.tables().clone(),
            max_voltage_drop_percent: options.max_voltage_drop_percent,
        };

        if options.auto_balance {
            Self::balance(&mut schedule);
        } else {
            schedule.refresh_issues();
        }

        Ok(schedule)
    }

    /// Design a whole project file's circuits with its own options.
    pub fn design_project(project: &Project) -> Result<PanelSchedule, PanelCalcError> {
        Self::design(&project.circuits, &project.options)
    }

    /// Swap the occupants of two slots.
    pub fn swap(schedule: &mut PanelSchedule, slot_a: u32, slot_b: u32) -> SwapOutcome {
        let outcome = schedule.layout.swap_slots(slot_a, slot_b);
        tracing::debug!(slot_a, slot_b, ?outcome, "swap");
        if outcome.changed() {
            schedule.refresh_issues();
        }
        outcome
    }

    /// Run the phase balancer and keep its report on the schedule.
    pub fn balance(schedule: &mut PanelSchedule) -> BalanceReport {
        let report = schedule.layout.balance_phases();
        tracing::debug!(
            swaps = report.swaps.len(),
            initial = report.initial_spread_va,
            final_spread = report.final_spread_va,
            stop = ?report.stop,
            "balance"
        );
        schedule.balance = Some(report.clone());
        schedule.refresh_issues();
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, phases: u8, load_w: f64) -> CircuitRecord {
        CircuitRecord {
            circuit_name: name.to_string(),
            voltage: if phases == 3 { 400.0 } else { 230.0 },
            phases,
            power_factor: 1.0,
            load_type: "General".to_string(),
            connected_load_w: load_w,
            ..CircuitRecord::default()
        }
    }

    #[test]
    fn test_design_places_every_circuit() {
        let records = vec![record("A", 1, 1000.0), record("B", 1, 500.0), record("M", 3, 6000.0)];
        let schedule = PanelCalcCore::design(&records, &DesignOptions::default()).unwrap();
        assert_eq!(schedule.results.len(), 3);
        assert_eq!(schedule.layout.placements.len(), 3);
        assert!(!schedule.has_errors());
        assert_eq!(
            schedule.total_issues(),
            schedule.stats.errors + schedule.stats.warnings + schedule.stats.suggestions + schedule.stats.info
        );
    }

    #[test]
    fn test_saved_slots_are_used_as_hints() {
        let mut a = record("A", 1, 1000.0);
        a.schedule_slot = Some(12);
        let schedule = PanelCalcCore::design(&[a, record("B", 1, 10.0)], &DesignOptions::default()).unwrap();
        assert_eq!(schedule.layout.placement("A").unwrap().slots(), vec![12]);
        assert_eq!(schedule.layout.placement("B").unwrap().slots(), vec![1]);
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let records = vec![record("A", 1, 1.0), record(" A ", 1, 2.0)];
        let err = PanelCalcCore::design(&records, &DesignOptions::default()).unwrap_err();
        assert!(matches!(err, PanelCalcError::DuplicateName(name) if name == "A"));
    }

    #[test]
    fn test_invalid_record_is_an_error() {
        let records = vec![record("A", 2, 1.0)];
        let err = PanelCalcCore::design(&records, &DesignOptions::default()).unwrap_err();
        assert!(matches!(err, PanelCalcError::Record(RecordError::Phases { .. })));
    }

    #[test]
    fn test_odd_panel_size_is_an_error() {
        let options = DesignOptions {
            panel_slots: 25,
            ..DesignOptions::default()
        };
        let err = PanelCalcCore::design(&[record("A", 1, 1.0)], &options).unwrap_err();
        assert!(matches!(err, PanelCalcError::Panel(PanelConfigError::OddSlotCount(25))));
    }

    #[test]
    fn test_swap_refreshes_issues() {
        let records = vec![record("A", 1, 3000.0), record("B", 1, 3000.0), record("C", 1, 3000.0)];
        let mut schedule = PanelCalcCore::design(&records, &DesignOptions::default()).unwrap();
        // A@1 and B@2 share phase A; C@3 is on B.
        assert!(schedule.issues.iter().any(|i| i.rule_id == "phase_imbalance"));

        assert_eq!(PanelCalcCore::swap(&mut schedule, 2, 5), SwapOutcome::Moved);
        assert!(schedule.issues.is_empty());
    }

    #[test]
    fn test_auto_balance_records_report() {
        let mut records = vec![
            record("A1", 1, 3000.0),
            record("A2", 1, 2000.0),
            record("B1", 1, 2750.0),
            record("C1", 1, 500.0),
        ];
        for (rec, slot) in records.iter_mut().zip([1, 2, 3, 5]) {
            rec.schedule_slot = Some(slot);
        }
        let options = DesignOptions {
            auto_balance: true,
            ..DesignOptions::default()
        };
        let schedule = PanelCalcCore::design(&records, &options).unwrap();
        let report = schedule.balance.as_ref().unwrap();
        assert!(report.final_spread_va < report.initial_spread_va);
    }

    #[test]
    fn test_apply_schedule_writes_back_slots_and_results() {
        let mut project = Project {
            options: DesignOptions::default(),
            circuits: vec![record("A", 1, 2000.0), record("M", 3, 6000.0)],
        };
        let schedule = PanelCalcCore::design_project(&project).unwrap();
        project.apply_schedule(&schedule);

        let a = &project.circuits[0];
        assert_eq!(a.schedule_slot, Some(1));
        assert_eq!(a.breaker_at, Some(16));
        assert!(a.schedule_text_color.is_some());
        assert_eq!(project.circuits[1].schedule_slot, Some(2));

        // Re-running with the saved slots reproduces the layout.
        let again = PanelCalcCore::design_project(&project).unwrap();
        assert_eq!(again.layout.hints(), schedule.layout.hints());
    }

    #[test]
    fn test_project_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.json");
        let project = Project {
            options: DesignOptions {
                panel_slots: 42,
                ..DesignOptions::default()
            },
            circuits: vec![record("A", 1, 2000.0)],
        };
        save_project(&path, &project).unwrap();
        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, project);
    }

    #[test]
    fn test_relative_standards_path_resolves_against_base_dir() {
        let options = DesignOptions {
            standards_path: Some(PathBuf::from("tables.json")),
            ..DesignOptions::default()
        };
        let resolved = options.clone().with_base_dir(Path::new("/projects/a"));
        assert_eq!(
            resolved.standards_path,
            Some(PathBuf::from("/projects/a/tables.json"))
        );

        let absolute = DesignOptions {
            standards_path: Some(PathBuf::from("/etc/tables.json")),
            ..DesignOptions::default()
        };
        assert_eq!(absolute.clone().with_base_dir(Path::new("/x")), absolute);
    }

    #[test]
    fn test_missing_project_file_is_io_error() {
        let err = load_project(Path::new("does_not_exist.json")).unwrap_err();
        assert!(matches!(err, PanelCalcError::Io(_)));
    }
}

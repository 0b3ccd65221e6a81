//! Schedule advisories.
//!
//! None of the conditions checked here stop a calculation. They are the
//! things a designer should look at before issuing the schedule: clamped
//! table lookups, long runs, circuits left off the panel, saved slots that
//! were not honoured.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::calc::CircuitResult;
use crate::panel::{HintRejection, PanelLayout, UnplacedReason, BALANCE_TOLERANCE_VA};
use crate::standards::StandardsTables;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Suggestion,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
    pub circuit: Option<String>,
    pub suggestion: Option<String>,
}

impl Issue {
    fn new(rule: &dyn Rule, circuit: Option<&str>, message: String) -> Self {
        let id = match circuit {
            Some(name) => format!("{}:{}", rule.id(), name),
            None => rule.id().to_string(),
        };
        Self {
            id,
            rule_id: rule.id().to_string(),
            severity: rule.severity(),
            message,
            circuit: circuit.map(str::to_string),
            suggestion: None,
        }
    }

    fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Everything a rule may look at.
pub struct RuleContext<'a> {
    pub results: &'a [CircuitResult],
    pub layout: &'a PanelLayout,
    pub tables: &'a StandardsTables,
    pub max_voltage_drop_percent: f64,
}

pub trait Rule: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn severity(&self) -> Severity;
    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue>;
}

pub struct RulesEngine {
    rules: Vec<Arc<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Arc::new(UnderProtectedRule));
        engine.add_rule(Arc::new(ConductorUndersizedRule));
        engine.add_rule(Arc::new(VoltageDropRule));
        engine.add_rule(Arc::new(UnplacedCircuitRule));
        engine.add_rule(Arc::new(IgnoredSlotHintRule));
        engine.add_rule(Arc::new(UnknownLoadTypeRule));
        engine.add_rule(Arc::new(PhaseImbalanceRule));
        engine
    }

    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules.iter().map(|r| r.as_ref())
    }

    pub fn analyze(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        let mut issues = Vec::new();
        for rule in &self.rules {
            issues.extend(rule.check(ctx));
        }
        issues
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

pub struct UnderProtectedRule;

impl Rule for UnderProtectedRule {
    fn id(&self) -> &str {
        "under_protected"
    }

    fn name(&self) -> &str {
        "Breaker range exceeded"
    }

    fn description(&self) -> &str {
        "125% of the design current is above the largest breaker rating"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        ctx.results
            .iter()
            .filter(|r| r.under_protected)
            .map(|r| {
                Issue::new(
                    self,
                    Some(r.name()),
                    format!(
                        "Design current {:.2} A needs more than the largest breaker ({} A)",
                        r.design_current_a, r.breaker_at
                    ),
                )
                .with_suggestion("Split the load across several circuits or feed it from a sub-panel")
            })
            .collect()
    }
}

pub struct ConductorUndersizedRule;

impl Rule for ConductorUndersizedRule {
    fn id(&self) -> &str {
        "conductor_undersized"
    }

    fn name(&self) -> &str {
        "Conductor range exceeded"
    }

    fn description(&self) -> &str {
        "No conductor in the ampacity table carries the breaker rating"
    }

    fn severity(&self) -> Severity {
        Severity::Error
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        ctx.results
            .iter()
            .filter(|r| r.conductor_undersized)
            .map(|r| {
                Issue::new(
                    self,
                    Some(r.name()),
                    format!(
                        "{} mm² ({} A) is below the {} A breaker",
                        r.conductor_mm2, r.conductor_ampacity_a, r.breaker_at
                    ),
                )
                .with_suggestion("Use parallel conductors")
            })
            .collect()
    }
}

pub struct VoltageDropRule;

impl Rule for VoltageDropRule {
    fn id(&self) -> &str {
        "voltage_drop"
    }

    fn name(&self) -> &str {
        "Voltage drop limit"
    }

    fn description(&self) -> &str {
        "Voltage drop above the configured branch-circuit limit (3% by default)"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        ctx.results
            .iter()
            .filter(|r| r.voltage_drop_percent > ctx.max_voltage_drop_percent)
            .map(|r| {
                Issue::new(
                    self,
                    Some(r.name()),
                    format!(
                        "Voltage drop {:.2}% exceeds {:.2}% over {} m",
                        r.voltage_drop_percent,
                        ctx.max_voltage_drop_percent,
                        r.spec.circuit_length_m
                    ),
                )
                .with_suggestion("Increase the conductor size or shorten the run")
            })
            .collect()
    }
}

pub struct UnplacedCircuitRule;

impl Rule for UnplacedCircuitRule {
    fn id(&self) -> &str {
        "unplaced_circuit"
    }

    fn name(&self) -> &str {
        "Circuit not on panel"
    }

    fn description(&self) -> &str {
        "Circuit could not be given a slot in the panel"
    }

    fn severity(&self) -> Severity {
        Severity::Warning
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        ctx.layout
            .unplaced
            .iter()
            .map(|u| {
                let (message, suggestion) = match u.reason {
                    UnplacedReason::PanelFull => (
                        "No free slot left in the panel".to_string(),
                        "Use a panel with more slots",
                    ),
                    UnplacedReason::NoContiguousSpan => (
                        "No free phase-aligned run of three slots in either column".to_string(),
                        "Move single-phase circuits to free a full A-B-C block",
                    ),
                };
                Issue::new(self, Some(u.circuit.name()), message).with_suggestion(suggestion)
            })
            .collect()
    }
}

pub struct IgnoredSlotHintRule;

impl Rule for IgnoredSlotHintRule {
    fn id(&self) -> &str {
        "ignored_slot"
    }

    fn name(&self) -> &str {
        "Saved slot not honoured"
    }

    fn description(&self) -> &str {
        "A stored schedule slot could not be reused; the circuit was re-placed"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        ctx.layout
            .ignored_hints
            .iter()
            .map(|h| {
                let why = match h.reason {
                    HintRejection::OutOfRange => "is outside the panel",
                    HintRejection::Occupied => "is already taken",
                    HintRejection::NotPhaseBoundary => "does not start a phase-A row",
                };
                Issue::new(
                    self,
                    Some(&h.circuit),
                    format!("Saved slot {} {}", h.slot, why),
                )
            })
            .collect()
    }
}

pub struct UnknownLoadTypeRule;

impl Rule for UnknownLoadTypeRule {
    fn id(&self) -> &str {
        "unknown_load_type"
    }

    fn name(&self) -> &str {
        "Unknown load type"
    }

    fn description(&self) -> &str {
        "Load type has no demand-factor table; 100% demand was assumed"
    }

    fn severity(&self) -> Severity {
        Severity::Suggestion
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        let known: Vec<&str> = ctx.tables.categories().collect();
        ctx.results
            .iter()
            .filter(|r| !ctx.tables.has_category(&r.spec.load_type))
            .map(|r| {
                Issue::new(
                    self,
                    Some(r.name()),
                    format!("Load type '{}' is not recognised", r.spec.load_type),
                )
                .with_suggestion(format!("Use one of: {}", known.join(", ")))
            })
            .collect()
    }
}

pub struct PhaseImbalanceRule;

impl Rule for PhaseImbalanceRule {
    fn id(&self) -> &str {
        "phase_imbalance"
    }

    fn name(&self) -> &str {
        "Phase imbalance"
    }

    fn description(&self) -> &str {
        "Spread between heaviest and lightest phase is above the balancing tolerance"
    }

    fn severity(&self) -> Severity {
        Severity::Info
    }

    fn check(&self, ctx: &RuleContext<'_>) -> Vec<Issue> {
        let totals = ctx.layout.phase_totals();
        let spread = totals.spread();
        if spread < BALANCE_TOLERANCE_VA {
            return vec![];
        }
        vec![Issue::new(
            self,
            None,
            format!(
                "Phase loads A {:.0} / B {:.0} / C {:.0} VA differ by {:.0} VA",
                totals.a, totals.b, totals.c, spread
            ),
        )
        .with_suggestion("Run balance or swap single-phase circuits between phases")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calc::{CalculationEngine, CircuitSpec, PhaseCount};
    use crate::panel::{allocate, PanelConfig, SlotHints};

    fn analyze(specs: &[CircuitSpec], hints: &SlotHints, slots: u32) -> Vec<Issue> {
        let engine = CalculationEngine::default();
        let results: Vec<_> = specs.iter().map(|s| engine.calculate(s)).collect();
        let layout = allocate(&results, hints, PanelConfig::new(slots).unwrap());
        let ctx = RuleContext {
            results: &results,
            layout: &layout,
            tables: engine.tables(),
            max_voltage_drop_percent: 3.0,
        };
        RulesEngine::with_default_rules().analyze(&ctx)
    }

    fn rule_ids(issues: &[Issue]) -> Vec<&str> {
        issues.iter().map(|i| i.rule_id.as_str()).collect()
    }

    #[test]
    fn test_clean_schedule_has_no_issues() {
        let specs = vec![
            CircuitSpec::new("A", 230.0, PhaseCount::Single).with_load(1000.0, 1.0),
            CircuitSpec::new("B", 230.0, PhaseCount::Single).with_load(1000.0, 1.0),
            CircuitSpec::new("M", 400.0, PhaseCount::Three).with_load(900.0, 1.0),
            CircuitSpec::new("C", 230.0, PhaseCount::Single).with_load(1000.0, 1.0),
        ];
        let mut hints = SlotHints::new();
        hints.insert("A".into(), 1);
        hints.insert("B".into(), 3);
        hints.insert("C".into(), 5);
        let issues = analyze(&specs, &hints, 30);
        assert!(issues.is_empty(), "{:?}", rule_ids(&issues));
    }

    #[test]
    fn test_out_of_range_circuit_flags() {
        let specs = vec![CircuitSpec::new("Big", 230.0, PhaseCount::Single)
            .with_load(500_000.0, 1.0)
            .with_length(50.0)];
        let issues = analyze(&specs, &SlotHints::new(), 30);
        let ids = rule_ids(&issues);
        assert!(ids.contains(&"under_protected"));
        assert!(ids.contains(&"voltage_drop"));
        let issue = issues.iter().find(|i| i.rule_id == "under_protected").unwrap();
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.id, "under_protected:Big");
        assert!(issue.suggestion.is_some());
    }

    #[test]
    fn test_unplaced_and_ignored_hint() {
        let specs = vec![
            CircuitSpec::new("A", 230.0, PhaseCount::Single),
            CircuitSpec::new("B", 230.0, PhaseCount::Single),
            CircuitSpec::new("M", 400.0, PhaseCount::Three),
        ];
        let mut hints = SlotHints::new();
        hints.insert("A".into(), 3);
        hints.insert("B".into(), 6);
        hints.insert("M".into(), 40);
        let issues = analyze(&specs, &hints, 6);
        let ids = rule_ids(&issues);
        assert!(ids.contains(&"unplaced_circuit"));
        assert!(ids.contains(&"ignored_slot"));
    }

    #[test]
    fn test_unknown_load_type_suggests_categories() {
        let specs = vec![CircuitSpec::new("X", 230.0, PhaseCount::Single)
            .with_load(100.0, 1.0)
            .with_load_type("Sauna")];
        let issues = analyze(&specs, &SlotHints::new(), 30);
        let issue = issues
            .iter()
            .find(|i| i.rule_id == "unknown_load_type")
            .unwrap();
        assert!(issue.suggestion.as_ref().unwrap().contains("Lighting"));
    }

    #[test]
    fn test_phase_imbalance_is_reported_once() {
        let specs = vec![CircuitSpec::new("Heavy", 230.0, PhaseCount::Single).with_load(3000.0, 1.0)];
        let issues = analyze(&specs, &SlotHints::new(), 30);
        assert_eq!(rule_ids(&issues), vec!["phase_imbalance"]);
        assert!(issues[0].circuit.is_none());
    }

    #[test]
    fn test_default_rules_have_unique_ids() {
        let engine = RulesEngine::default();
        let mut ids: Vec<&str> = engine.rules().map(|r| r.id()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}

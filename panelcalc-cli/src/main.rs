//! PanelCalc CLI - branch-circuit sizing and panel schedules from the command line.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use panelcalc::panel::{BalanceReport, Phase, Side, SwapOutcome};
use panelcalc::{
    load_project, save_project, CalculationEngine, CircuitResult, DesignOptions, Issue,
    PanelCalcCore, PanelSchedule, Project, Severity,
};
use std::io;
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "panelcalc")]
#[command(about = "Branch-circuit calculator and distribution panel scheduler", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Size every circuit in a project file
    Calc {
        #[command(flatten)]
        design: DesignArgs,

        /// Only show this circuit
        #[arg(long, value_name = "NAME")]
        circuit: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Size circuits and lay them out in the panel
    Schedule {
        #[command(flatten)]
        design: DesignArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Swap the occupants of two panel slots
    Swap {
        #[command(flatten)]
        design: DesignArgs,

        /// First slot
        #[arg(value_name = "SLOT_A")]
        slot_a: u32,

        /// Second slot
        #[arg(value_name = "SLOT_B")]
        slot_b: u32,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Rebalance single-phase circuits across phases
    Balance {
        #[command(flatten)]
        design: DesignArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List demand-factor categories
    Categories {
        /// JSON standards tables replacing the built-in set
        #[arg(long, value_name = "FILE")]
        standards: Option<PathBuf>,

        /// Show the tiers of each category
        #[arg(short = 'd', long)]
        details: bool,
    },
}

#[derive(Args)]
struct DesignArgs {
    /// Project file (JSON)
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Panel size in slots (even, 6 to 240)
    #[arg(long)]
    slots: Option<u32>,

    /// Voltage drop limit in percent
    #[arg(long, value_name = "PERCENT")]
    max_voltage_drop: Option<f64>,

    /// JSON standards tables replacing the built-in set
    #[arg(long, value_name = "FILE")]
    standards: Option<PathBuf>,

    /// Balance phases after placing circuits
    #[arg(long)]
    auto_balance: bool,
}

impl DesignArgs {
    /// Load the project and the options for this run: the file's options
    /// with relative paths resolved, then command-line overrides. The
    /// project itself keeps the options exactly as stored.
    fn load(&self) -> Result<(Project, DesignOptions)> {
        let project = load_project(&self.project)
            .with_context(|| format!("Cannot read project {}", self.project.display()))?;
        let base_dir = self.project.parent().unwrap_or_else(|| Path::new("."));
        let mut options = project.options.clone().with_base_dir(base_dir);
        if let Some(slots) = self.slots {
            options.panel_slots = slots;
        }
        if let Some(limit) = self.max_voltage_drop {
            options.max_voltage_drop_percent = limit;
        }
        if let Some(path) = &self.standards {
            options.standards_path = Some(path.clone());
        }
        if self.auto_balance {
            options.auto_balance = true;
        }
        Ok((project, options))
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "human")]
    format: OutputFormat,

    /// Exit with error code if issues found at this severity or higher
    #[arg(long, value_enum)]
    fail_on: Option<FailOn>,

    /// Write results, slots and colours back to the project file
    #[arg(long)]
    save: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
    /// CSV rows
    Csv,
}

#[derive(Clone, Copy, ValueEnum)]
enum FailOn {
    Error,
    Warning,
    Any,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(command: Commands) -> Result<i32> {
    match command {
        Commands::Calc {
            design,
            circuit,
            format,
        } => {
            handle_calc(&design, circuit.as_deref(), format)?;
            Ok(0)
        }
        Commands::Schedule { design, output } => {
            let (project, options) = design.load()?;
            let schedule = PanelCalcCore::design(&project.circuits, &options)?;
            finish(&design.project, project, &schedule, &output)
        }
        Commands::Swap {
            design,
            slot_a,
            slot_b,
            output,
        } => {
            let (project, options) = design.load()?;
            let mut schedule = PanelCalcCore::design(&project.circuits, &options)?;
            match PanelCalcCore::swap(&mut schedule, slot_a, slot_b) {
                SwapOutcome::Unchanged(reason) => {
                    eprintln!("Swap {} <-> {} not applied: {}", slot_a, slot_b, reason)
                }
                outcome => tracing::info!("Swap {} <-> {}: {:?}", slot_a, slot_b, outcome),
            }
            finish(&design.project, project, &schedule, &output)
        }
        Commands::Balance { design, output } => {
            let (project, options) = design.load()?;
            let mut schedule = PanelCalcCore::design(&project.circuits, &options)?;
            if schedule.balance.is_none() {
                PanelCalcCore::balance(&mut schedule);
            }
            finish(&design.project, project, &schedule, &output)
        }
        Commands::Categories { standards, details } => {
            handle_categories(standards, details)?;
            Ok(0)
        }
    }
}

/// Print, optionally save, and turn `--fail-on` into an exit code.
fn finish(
    path: &Path,
    mut project: Project,
    schedule: &PanelSchedule,
    output: &OutputArgs,
) -> Result<i32> {
    match output.format {
        OutputFormat::Human => output_human(schedule),
        OutputFormat::Json => output_json(schedule)?,
        OutputFormat::Csv => output_schedule_csv(schedule)?,
    }

    if output.save {
        project.apply_schedule(schedule);
        save_project(path, &project)
            .with_context(|| format!("Cannot write project {}", path.display()))?;
    }

    if let Some(level) = output.fail_on {
        if should_fail(schedule, level) {
            return Ok(1);
        }
    }
    Ok(0)
}

fn should_fail(schedule: &PanelSchedule, level: FailOn) -> bool {
    match level {
        FailOn::Error => schedule.has_errors(),
        FailOn::Warning => schedule.has_warnings_or_errors(),
        FailOn::Any => schedule.total_issues() > 0,
    }
}

fn handle_calc(design: &DesignArgs, only: Option<&str>, format: OutputFormat) -> Result<()> {
    let (project, options) = design.load()?;
    let engine = CalculationEngine::new(options.load_tables()?);

    let mut results = Vec::new();
    for record in &project.circuits {
        let spec = record.to_spec()?;
        if only.map_or(true, |name| name == spec.name) {
            results.push(engine.calculate(&spec));
        }
    }
    if let Some(name) = only {
        if results.is_empty() {
            bail!("No circuit named '{}'", name);
        }
    }

    match format {
        OutputFormat::Human => print_results_table(&results),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Csv => output_results_csv(&results)?,
    }
    Ok(())
}

fn handle_categories(standards: Option<PathBuf>, details: bool) -> Result<()> {
    let options = DesignOptions {
        standards_path: standards,
        ..DesignOptions::default()
    };
    let tables = options.load_tables()?;

    println!("Demand-factor categories:\n");
    for name in tables.categories() {
        println!("  {}", name);
        if details {
            for tier in &tables.demand_table(name).tiers {
                println!("    {}", describe_tier(tier));
            }
        }
    }
    println!(
        "\nUnknown load types use '{}'.",
        tables.default_demand_table().category
    );
    Ok(())
}

fn describe_tier(tier: &panelcalc::standards::DemandTier) -> String {
    use panelcalc::standards::DemandTier;
    match tier {
        DemandTier::UpTo { limit_va, factor } => {
            format!("up to {:.0} VA at {:.0}%", limit_va, factor * 100.0)
        }
        DemandTier::Over {
            threshold_va,
            factor,
        } => format!("over {:.0} VA at {:.0}%", threshold_va, factor * 100.0),
    }
}

fn flags(result: &CircuitResult) -> String {
    let mut out = Vec::new();
    if result.under_protected {
        out.push("under-protected");
    }
    if result.conductor_undersized {
        out.push("conductor-undersized");
    }
    out.join(",")
}

fn print_results_table(results: &[CircuitResult]) {
    println!(
        "{:<24} {:>10} {:>9} {:>5} {:>7} {:>7}  {}",
        "Circuit", "Demand VA", "Current A", "CB A", "mm2", "VD %", "Category"
    );
    println!("{}", "─".repeat(80));
    for r in results {
        println!(
            "{:<24} {:>10.2} {:>9.2} {:>5} {:>7} {:>7.2}  {}{}",
            r.name(),
            r.demand_load_va,
            r.design_current_a,
            r.breaker_at,
            r.conductor_mm2,
            r.voltage_drop_percent,
            r.demand_category,
            match flags(r) {
                f if f.is_empty() => String::new(),
                f => format!(" [{}]", f),
            }
        );
    }
}

fn output_human(schedule: &PanelSchedule) {
    print_results_table(&schedule.results);

    let layout = &schedule.layout;
    let slots = layout.slot_map();
    println!("\nPanel ({} slots)", layout.slot_count());
    println!("{}", "─".repeat(80));
    for left in (1..=layout.slot_count()).step_by(2) {
        let right = left + 1;
        let label = |slot: u32| {
            slots
                .get(&slot)
                .map(|e| format!("{} ({:.0} VA)", e.display_name, e.va))
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "{:>3} {}  {:<32} | {:<32} {} {:<3}",
            left,
            Phase::of(left),
            label(left),
            label(right),
            Phase::of(right),
            right
        );
    }

    let totals = layout.phase_totals();
    println!(
        "\n  Phase A: {:.0} VA   Phase B: {:.0} VA   Phase C: {:.0} VA   (spread {:.0} VA)",
        totals.a,
        totals.b,
        totals.c,
        totals.spread()
    );
    if let Some(report) = &schedule.balance {
        print_balance(report);
    }
    if !layout.unplaced.is_empty() {
        println!("\n  Not placed:");
        for u in &layout.unplaced {
            println!("    - {} ({:?})", u.circuit.name(), u.reason);
        }
    }

    print_issues(&schedule.issues);

    println!("\n  Summary:");
    println!("    Errors:      {}", schedule.stats.errors);
    println!("    Warnings:    {}", schedule.stats.warnings);
    println!("    Suggestions: {}", schedule.stats.suggestions);
    println!("    Info:        {}", schedule.stats.info);
}

fn print_balance(report: &BalanceReport) {
    println!(
        "\n  Balance: {} swap(s), spread {:.0} -> {:.0} VA ({:?})",
        report.swaps.len(),
        report.initial_spread_va,
        report.final_spread_va,
        report.stop
    );
    for swap in &report.swaps {
        println!(
            "    - {} (slot {}) <-> {} (slot {})",
            swap.heavy_circuit, swap.from_slot, swap.light_circuit, swap.to_slot
        );
    }
}

fn print_issues(issues: &[Issue]) {
    if issues.is_empty() {
        println!("\n  No issues found");
        return;
    }
    for (severity, heading) in [
        (Severity::Error, "ERRORS"),
        (Severity::Warning, "WARNINGS"),
        (Severity::Suggestion, "SUGGESTIONS"),
        (Severity::Info, "INFO"),
    ] {
        let group: Vec<_> = issues.iter().filter(|i| i.severity == severity).collect();
        if group.is_empty() {
            continue;
        }
        println!("\n  {}:", heading);
        for issue in group {
            println!("    - {}", issue.message);
            if let Some(ref suggestion) = issue.suggestion {
                println!("      Suggestion: {}", suggestion);
            }
        }
    }
}

fn output_json(schedule: &PanelSchedule) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(schedule)?);
    Ok(())
}

fn output_results_csv(results: &[CircuitResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record([
        "circuit",
        "load_type",
        "demand_category",
        "connected_load_w",
        "demand_load_va",
        "design_current_a",
        "breaker_at",
        "conductor_mm2",
        "voltage_drop_percent",
        "flags",
    ])?;
    for r in results {
        writer.write_record([
            r.name().to_string(),
            r.spec.load_type.clone(),
            r.demand_category.clone(),
            r.spec.connected_load_w.to_string(),
            r.demand_load_va.to_string(),
            r.design_current_a.to_string(),
            r.breaker_at.to_string(),
            r.conductor_mm2.to_string(),
            r.voltage_drop_percent.to_string(),
            flags(r),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn output_schedule_csv(schedule: &PanelSchedule) -> Result<()> {
    let mut writer = csv::Writer::from_writer(io::stdout());
    writer.write_record(["slot", "side", "phase", "circuit", "display_name", "va"])?;
    for (slot, entry) in schedule.layout.slot_map() {
        writer.write_record([
            slot.to_string(),
            Side::of(slot).prefix().to_string(),
            entry.phase.to_string(),
            entry.circuit.to_string(),
            entry.display_name.to_string(),
            format!("{:.2}", entry.va),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

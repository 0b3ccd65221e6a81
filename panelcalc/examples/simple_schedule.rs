//! Simple schedule example: design a project file and print the panel.

use panelcalc::prelude::*;
use panelcalc::load_project;
use std::path::Path;

fn main() -> Result<(), PanelCalcError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/project.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example simple_schedule [path/to/project.json]");
        std::process::exit(1);
    }

    let project = load_project(path)?;
    let schedule = PanelCalcCore::design_project(&project)?;

    println!("{:<20} {:>10} {:>8} {:>6} {:>8} {:>7}", "Circuit", "VA", "I (A)", "CB", "mm2", "VD %");
    for r in &schedule.results {
        println!(
            "{:<20} {:>10.2} {:>8.2} {:>6} {:>8} {:>7.2}",
            r.name(),
            r.demand_load_va,
            r.design_current_a,
            r.breaker_at,
            r.conductor_mm2,
            r.voltage_drop_percent
        );
    }

    println!();
    for (slot, entry) in schedule.layout.slot_map() {
        println!("{:>3} {}  {}", slot, entry.phase, entry.display_name);
    }

    let totals = schedule.layout.phase_totals();
    println!(
        "\nPhase A {:.0} VA, B {:.0} VA, C {:.0} VA",
        totals.a, totals.b, totals.c
    );

    for issue in &schedule.issues {
        println!("{:?}: {}", issue.severity, issue.message);
    }

    if schedule.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

//! Output formatting and display utilities
//!
//! Provides colored, formatted output for the CLI

use colored::{ColoredString, Colorize};

use assay::composition::ComposeSummary;
use assay::result::{ControlRow, EvaluationOutcome, ObservationReport, StateChange};

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{} {}", "⚠".yellow().bold(), msg);
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", msg.bold().underline());
}

/// Print a subheader
pub fn subheader(msg: &str) {
    println!("\n{}", msg.bold());
}

fn colored_state(state_change: StateChange) -> ColoredString {
    let label = format!("{:<28}", state_change.as_str());
    match state_change {
        StateChange::NotSatisfiedToSatisfied => label.green(),
        StateChange::SatisfiedToNotSatisfied => label.red().bold(),
        StateChange::New => label.cyan(),
        StateChange::Removed => label.dimmed(),
        StateChange::Unchanged => label.normal(),
    }
}

fn colored_satisfied(satisfied: &str) -> ColoredString {
    let label = format!("{:<9}", satisfied);
    match satisfied {
        "true" => label.green(),
        "false" => label.red(),
        _ => label.dimmed(),
    }
}

/// Print the per-control comparison table
pub fn print_control_rows(rows: &[ControlRow]) {
    header("Controls");

    if rows.is_empty() {
        info("No controls to show");
        return;
    }

    println!(
        "  {:<16} {:<28} {:<9} {}",
        "CONTROL".bold(),
        "STATE CHANGE".bold(),
        "SATISFIED".bold(),
        "OBSERVATIONS".bold()
    );
    for row in rows {
        println!(
            "  {:<16} {} {} {}",
            row.target_id,
            colored_state(row.state_change),
            colored_satisfied(row.satisfied),
            row.observations
        );
    }
}

/// Print the cross-control observation table
pub fn print_observation_report(report: &ObservationReport) {
    header("Observations");

    if report.rows.is_empty() {
        info("No observations match the selected filters");
    }

    for row in &report.rows {
        println!(
            "  {} {} {}",
            colored_state(row.state_change),
            colored_satisfied(row.satisfied),
            row.name.bold()
        );
        println!("    {} {}", "controls:".dimmed(), row.control_ids.join(", "));
        if !row.observation.is_empty() {
            println!("    {} {}", "current:".dimmed(), row.observation);
        }
        if !row.compared_observation.is_empty() {
            println!("    {} {}", "compared:".dimmed(), row.compared_observation);
        }
    }

    if !report.no_observations.is_empty() {
        println!();
        warning(&format!(
            "{} control(s) have no observations: {}",
            report.no_observations.len(),
            report.no_observations.join(", ")
        ));
    }
}

/// Print an evaluation summary
pub fn print_evaluation(outcome: &EvaluationOutcome) {
    header(&format!("Evaluation: {}", outcome.result_uuid));
    println!("  {} {}", "threshold:".dimmed(), outcome.threshold_uuid);

    let sections: [(&str, Vec<&str>); 4] = [
        ("Newly failing", outcome.regressions()),
        ("Newly satisfied", outcome.improvements()),
        ("New", outcome.new_controls()),
        ("Removed", outcome.removed_controls()),
    ];
    for (title, controls) in sections {
        if controls.is_empty() {
            continue;
        }
        subheader(&format!("{} ({}):", title, controls.len()));
        for control in controls {
            println!("  {} {}", "•".dimmed(), control);
        }
    }

    println!();
}

/// Print a composition summary
pub fn print_compose_summary(summary: &ComposeSummary, output: &std::path::Path) {
    info(&format!("Resolved {} validation link(s)", summary.resolved_links));
    info(&format!(
        "Added {} resource(s) to back matter",
        summary.fetched_resources
    ));
    println!("  {} {}", "→".cyan(), output.display());
}

/// Print a progress spinner for long operations
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        let style = indicatif::ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish_success(self, msg: &str) {
        self.pb.finish_and_clear();
        success(msg);
    }

    pub fn finish_error(self, msg: &str) {
        self.pb.finish_and_clear();
        error(msg);
    }
}

/// Print a JSON report
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

//! Assay CLI - OSCAL composition and assessment comparison tool
//!
//! Composes component definitions by resolving their validation links,
//! and compares or evaluates assessment-result runs.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

mod config;
mod error;
mod output;

use assay::composition::Composer;
use assay::oscal::{AssessmentResult, OscalDocument};
use assay::result::{evaluate, select_runs, ControlRow, ReportFilter, ResultComparisonMap};
use assay::ObservabilityConfig;
use config::AssayConfig;
use error::{CliError, Result};

/// Assay - OSCAL compliance composition and comparison
#[derive(Parser)]
#[command(name = "assay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to assay.toml configuration file
    #[arg(short, long, default_value = "assay.toml", global = true)]
    config: PathBuf,

    /// Log filter, e.g. "info" or "assay=debug"
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve validation links and write a self-contained component definition
    Compose {
        /// Component definition to compose
        #[arg(short = 'f', long)]
        input_file: PathBuf,

        /// Output path (default: composed-<input> next to the input)
        #[arg(short, long)]
        output_file: Option<PathBuf>,

        /// Render templates: constants, non-sensitive, all, masked
        #[arg(short, long, default_value = "")]
        render: String,

        /// Also render fetched validations
        #[arg(long)]
        render_validations: bool,

        /// Template override, .const.KEY=VALUE or .var.KEY=VALUE
        #[arg(long = "set")]
        set: Vec<String>,
    },

    /// Compare the latest assessment run against its threshold
    Compare {
        /// Assessment-results files; runs from all files are pooled
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Hide unchanged entries
        #[arg(long)]
        changed_only: bool,

        /// Hide removed entries
        #[arg(long)]
        skip_removed: bool,

        /// Show only entries that are not satisfied
        #[arg(long)]
        failed_only: bool,

        /// Print observation uuids grouped by state change as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fail when any control went from satisfied to not satisfied
    Evaluate {
        /// Assessment-results files; runs from all files are pooled
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = AssayConfig::load(&cli.config).and_then(|config| {
        init_logging(cli.log_level.as_deref(), &config)?;
        run(cli.command, &config)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

fn init_logging(flag: Option<&str>, config: &AssayConfig) -> Result<()> {
    let mut observability = ObservabilityConfig::from_env();
    if let Some(level) = flag.or(config.log_level.as_deref()) {
        observability.log_filter = level.to_string();
        observability.respect_rust_log = false;
    }
    assay::observability::init(&observability)?;
    Ok(())
}

fn run(command: Commands, config: &AssayConfig) -> Result<()> {
    match command {
        Commands::Compose {
            input_file,
            output_file,
            render,
            render_validations,
            set,
        } => cmd_compose(config, &input_file, output_file, &render, render_validations, &set),

        Commands::Compare {
            files,
            changed_only,
            skip_removed,
            failed_only,
            json,
        } => {
            let mut filter = ReportFilter::default();
            if changed_only {
                filter = filter.changed_only();
            }
            if skip_removed {
                filter = filter.skip_removed();
            }
            if failed_only {
                filter = filter.failed_only();
            }
            cmd_compare(&files, filter, json)
        }

        Commands::Evaluate { files, json } => cmd_evaluate(&files, json),
    }
}

// =============================================================================
// Command Implementations
// =============================================================================

fn cmd_compose(
    config: &AssayConfig,
    input: &Path,
    output: Option<PathBuf>,
    render: &str,
    render_validations: bool,
    overrides: &[String],
) -> Result<()> {
    let compose_config = config.compose_config(render, render_validations, overrides)?;
    let composer = Composer::new(compose_config)?;
    let output = output.unwrap_or_else(|| default_output_path(input));

    let spinner = output::Spinner::new(&format!("Composing {}...", input.display()));
    let composed = composer.compose_from_path(input, &composer.fetch_context());
    let (definition, summary) = match composed {
        Ok(composed) => composed,
        Err(e) => {
            spinner.finish_error("Composition failed");
            return Err(e.into());
        }
    };

    OscalDocument::ComponentDefinition(definition).write_to(&output)?;
    spinner.finish_success(&format!("Composed {}", input.display()));
    output::print_compose_summary(&summary, &output);

    Ok(())
}

fn cmd_compare(files: &[PathBuf], filter: ReportFilter, json: bool) -> Result<()> {
    let runs = load_runs(files)?;
    let (latest, threshold) = select_runs(&runs).ok_or(CliError::NotEnoughResults { count: runs.len() })?;
    let comparisons = ResultComparisonMap::new(latest, threshold);

    if json {
        output::print_json(&comparisons.machine_friendly_observations())?;
        return Ok(());
    }

    output::info(&format!(
        "Comparing {} against threshold {}",
        latest.uuid, threshold.uuid
    ));

    let rows: Vec<ControlRow> = comparisons
        .control_rows()
        .into_iter()
        .filter(|row| control_admitted(&filter, row))
        .collect();
    output::print_control_rows(&rows);
    output::print_observation_report(&comparisons.observation_report(filter));

    Ok(())
}

fn cmd_evaluate(files: &[PathBuf], json: bool) -> Result<()> {
    let runs = load_runs(files)?;
    let (latest, threshold) = select_runs(&runs).ok_or(CliError::NotEnoughResults { count: runs.len() })?;
    let outcome = evaluate(latest, threshold);

    if json {
        let report = serde_json::json!({
            "result": outcome.result_uuid,
            "threshold": outcome.threshold_uuid,
            "passed": outcome.passed(),
            "regressions": outcome.regressions(),
            "improvements": outcome.improvements(),
            "new": outcome.new_controls(),
            "removed": outcome.removed_controls(),
        });
        output::print_json(&report)?;
    } else {
        output::print_evaluation(&outcome);
    }

    if !outcome.passed() {
        return Err(CliError::Regression {
            count: outcome.regressions().len(),
        });
    }

    if !json {
        output::success("No control went from satisfied to not satisfied");
    }
    Ok(())
}

// =============================================================================
// Helpers
// =============================================================================

/// Pool the assessment runs from every file
fn load_runs(files: &[PathBuf]) -> Result<Vec<AssessmentResult>> {
    let mut runs = Vec::new();
    for path in files {
        let results = OscalDocument::from_file(path)?.into_assessment_results()?;
        tracing::debug!(path = %path.display(), runs = results.results.len(), "Loaded assessment results");
        runs.extend(results.results);
    }
    Ok(runs)
}

/// Control rows follow the same filters as observation rows
fn control_admitted(filter: &ReportFilter, row: &ControlRow) -> bool {
    filter.admits_state(row.state_change, row.satisfied == "true")
}

fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| format!("composed-{}", n.to_string_lossy()))
        .unwrap_or_else(|| "composed.yaml".to_string());
    input.with_file_name(name)
}

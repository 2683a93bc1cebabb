use anyhow::Result;
use clap::Parser;
use matsolve_runner::{
    DriveMode, DriveReport, DriveSummary, MeshTable, ProcessSolver, TableChoice,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(
    name = "matsolve",
    version = "0.3.0",
    about = "Find the largest mesh each stencil configuration can solve"
)]
struct Cli {
    /// Run name: the solver is `./<RUN_NAME>` and results go to
    /// `<results-dir>/<RUN_NAME>[-<SWEEP_MARKER>].json`.
    run_name: String,
    /// Any value switches from capacity search to the fixed sweep.
    sweep_marker: Option<String>,
    #[arg(long)]
    solver: Option<PathBuf>,
    /// Program (and arguments) to launch the solver with, one per flag.
    #[arg(long = "launcher", allow_hyphen_values = true)]
    launcher: Vec<String>,
    #[arg(long, default_value = "results")]
    results_dir: PathBuf,
    /// Sweep mesh table: auto, sm80 or generic.
    #[arg(long, default_value = "auto")]
    table: TableChoice,
    /// Load the sweep mesh table from a YAML/JSON file instead.
    #[arg(long)]
    tables_file: Option<PathBuf>,
    #[arg(long, default_value = "info")]
    log_level: String,
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let json_mode = cli.json;
    match run_command(cli) {
        Ok(Some(payload)) => {
            emit_json(&payload);
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(err) => {
            if json_mode {
                emit_json(&json_error("command_failed", format!("{:#}", err), json!({})));
                std::process::exit(1);
            }
            Err(err)
        }
    }
}

/// `RUST_LOG` wins over `--log-level`. Logs go to stderr so solver output
/// echoed on stdout stays clean.
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run_command(cli: Cli) -> Result<Option<Value>> {
    let program = cli
        .solver
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("./{}", cli.run_name)));
    let mut solver = ProcessSolver::new(program).with_launcher(cli.launcher.clone());
    solver.ensure_available()?;

    let mode = match &cli.sweep_marker {
        None => DriveMode::CapacitySearch,
        Some(marker) => {
            let table = match &cli.tables_file {
                Some(path) => MeshTable::load(path)?,
                None => {
                    let arch = std::env::var(matsolve_runner::tables::ARCH_ENV).ok();
                    cli.table.resolve(arch.as_deref())
                }
            };
            DriveMode::FixedSweep {
                marker: marker.clone(),
                table,
            }
        }
    };
    match &mode {
        DriveMode::CapacitySearch => info!(
            run = %cli.run_name,
            solver = %solver.program().display(),
            "starting capacity search"
        ),
        DriveMode::FixedSweep { marker, table } => info!(
            run = %cli.run_name,
            solver = %solver.program().display(),
            marker = %marker,
            table = %table.name,
            "starting fixed sweep"
        ),
    }

    let summary = matsolve_runner::drive(&mut solver, &mode, &cli.run_name, &cli.results_dir)?;
    if cli.json {
        return Ok(Some(json!({
            "ok": true,
            "run_name": cli.run_name,
            "solver": solver.program().display().to_string(),
            "summary": summary_to_json(&summary)?,
        })));
    }
    print_summary(&summary);
    Ok(None)
}

fn emit_json(value: &Value) {
    match serde_json::to_string(value) {
        Ok(s) => println!("{}", s),
        Err(_) => println!(
            "{{\"ok\":false,\"error\":{{\"code\":\"serialization_error\",\"message\":\"failed to serialize JSON payload\",\"details\":{{}}}}}}"
        ),
    }
}

fn json_error(code: &str, message: String, details: Value) -> Value {
    json!({
        "ok": false,
        "error": {
            "code": code,
            "message": message,
            "details": details
        }
    })
}

fn summary_to_json(summary: &DriveSummary) -> Result<Value> {
    Ok(json!({
        "results_path": summary.results_path.display().to_string(),
        "records": summary.records,
        "report": serde_json::to_value(&summary.report)?,
    }))
}

fn print_summary(summary: &DriveSummary) {
    match &summary.report {
        DriveReport::CapacitySearch { outcomes } => {
            println!("mode: capacity_search");
            for o in outcomes {
                let largest = o
                    .largest_ok
                    .map(|k| k.to_string())
                    .unwrap_or_else(|| "none".to_string());
                println!(
                    "{} {}: largest_ok={} attempts={} stop={:?}",
                    o.problem,
                    o.dof,
                    largest,
                    o.attempted.len(),
                    o.reason
                );
            }
        }
        DriveReport::FixedSweep(report) => {
            println!("mode: fixed_sweep");
            println!("table: {}", report.table);
            println!("invocations: {}", report.invocations);
            for (label, count) in &report.outcomes {
                println!("{}: {}", label, count);
            }
        }
    }
    println!("records: {}", summary.records);
    println!("results: {}", summary.results_path.display());
}

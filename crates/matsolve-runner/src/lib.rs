//! Drives an external solver benchmark across stencil configurations and
//! collects the `Lower:` statistics it prints.
//!
//! Two strategies are available: [`search::capacity_search`] grows the mesh
//! until the solver runs out of memory, [`sweep::fixed_sweep`] runs a fixed
//! table of mesh sizes. Both feed [`aggregate::Results`], which is written
//! once at the end by [`persist::write_results`].

pub mod aggregate;
pub mod error;
pub mod interpret;
pub mod invoke;
pub mod persist;
pub mod problem;
pub mod search;
pub mod sweep;
pub mod tables;

pub use aggregate::{Results, RunRecord};
pub use error::DriverError;
pub use interpret::{Interpretation, LowerBound, OutputInterpreter, RunStatus};
pub use invoke::{ProcessSolver, RunOutput, Solver};
pub use problem::{Configuration, MeshSize, StencilShape};
pub use search::{SearchOutcome, StopReason};
pub use sweep::SweepReport;
pub use tables::{MeshTable, TableChoice};

use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Invoke, interpret and record a single data point.
pub fn run_point<S: Solver>(
    solver: &mut S,
    interpreter: &OutputInterpreter,
    results: &mut Results,
    config: &Configuration,
    mesh: MeshSize,
) -> Result<Interpretation> {
    info!(config = %config, mesh = %mesh, "running solver");
    let output = solver.run(config, mesh)?;
    let interpretation = interpreter.interpret(&output.stdout, &output.stderr);
    debug!(
        config = %config,
        mesh = %mesh,
        exit_code = ?output.exit_code,
        outcome = interpretation.label(),
        metrics = interpretation.metrics.len(),
        "solver finished"
    );
    results.record(config, mesh, &interpretation.metrics);
    Ok(interpretation)
}

#[derive(Clone, Debug)]
pub enum DriveMode {
    CapacitySearch,
    FixedSweep { marker: String, table: MeshTable },
}

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DriveReport {
    CapacitySearch { outcomes: Vec<SearchOutcome> },
    FixedSweep(SweepReport),
}

#[derive(Clone, Debug, Serialize)]
pub struct DriveSummary {
    pub results_path: PathBuf,
    pub records: usize,
    pub report: DriveReport,
}

/// Run the selected strategy and write everything collected to
/// `<results_dir>/<run_name>[-<marker>].json`.
pub fn drive<S: Solver>(
    solver: &mut S,
    mode: &DriveMode,
    run_name: &str,
    results_dir: &Path,
) -> Result<DriveSummary> {
    let interpreter = OutputInterpreter::new()?;
    let mut results = Results::new();
    let (report, marker) = match mode {
        DriveMode::CapacitySearch => {
            let configs = problem::search_configurations();
            let outcomes =
                search::capacity_search(solver, &interpreter, &mut results, &configs)?;
            (DriveReport::CapacitySearch { outcomes }, None)
        }
        DriveMode::FixedSweep { marker, table } => {
            let report = sweep::fixed_sweep(solver, &interpreter, &mut results, table)?;
            (DriveReport::FixedSweep(report), Some(marker.as_str()))
        }
    };

    if results.is_empty() {
        warn!("no solver run produced a metric line; writing an empty results file");
    }
    let results_path = persist::results_path(results_dir, run_name, marker);
    persist::write_results(&results_path, &results)?;
    info!(
        path = %results_path.display(),
        records = results.record_count(),
        "results written"
    );
    Ok(DriveSummary {
        results_path,
        records: results.record_count(),
        report,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::fs;

    /// Succeeds up to 48, then reports out of memory.
    struct SmallGpu {
        calls: usize,
    }

    impl Solver for SmallGpu {
        fn run(&mut self, _config: &Configuration, mesh: MeshSize) -> Result<RunOutput> {
            self.calls += 1;
            let stdout = if mesh.dims()[0] > 48 {
                "out of memory".to_string()
            } else {
                "   Lower:3,1.5,2.25,0.001".to_string()
            };
            Ok(RunOutput {
                stdout,
                ..RunOutput::default()
            })
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "matsolve_{}_{}_{}",
            tag,
            std::process::id(),
            Utc::now().timestamp_micros()
        ))
    }

    #[test]
    fn drive_capacity_search_writes_results_file() {
        let dir = temp_dir("drive_search");
        let mut solver = SmallGpu { calls: 0 };
        let summary = drive(&mut solver, &DriveMode::CapacitySearch, "bench", &dir)
            .expect("drive runs");

        assert_eq!(summary.results_path, dir.join("bench.json"));
        assert_eq!(solver.calls, 10 * 3);
        assert_eq!(summary.records, 10 * 2);
        match &summary.report {
            DriveReport::CapacitySearch { outcomes } => {
                assert!(outcomes.iter().all(|o| o.largest_ok == Some(48)));
                assert!(outcomes.iter().all(|o| o.reason == StopReason::Exhausted));
            }
            other => panic!("unexpected report: {:?}", other),
        }

        let loaded = persist::load_results(&summary.results_path).expect("load");
        assert_eq!(loaded.problems().len(), 5);
        assert_eq!(
            loaded
                .records("stencilstarfill1,width=0", "dof=4")
                .map(|r| r.len()),
            Some(2)
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn drive_fixed_sweep_uses_marker_in_file_name() {
        let dir = temp_dir("drive_sweep");
        let mut solver = SmallGpu { calls: 0 };
        let mode = DriveMode::FixedSweep {
            marker: "bw".to_string(),
            table: MeshTable::generic(),
        };
        let summary = drive(&mut solver, &mode, "bench", &dir).expect("drive runs");

        assert_eq!(summary.results_path, dir.join("bench-bw.json"));
        assert_eq!(solver.calls, 40);
        assert_eq!(summary.records, 0);
        assert!(persist::load_results(&summary.results_path)
            .expect("load")
            .is_empty());
        assert_eq!(
            fs::read_to_string(&summary.results_path).expect("read"),
            "{}"
        );
        let json = serde_json::to_value(&summary.report).expect("serialize");
        assert_eq!(json["mode"], "fixed_sweep");
        assert_eq!(json["invocations"], 40);
        let _ = fs::remove_dir_all(dir);
    }
}

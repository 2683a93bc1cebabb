//! Fixed sweep: one run per (dof, problem) cell at a tabulated mesh size.

use crate::aggregate::Results;
use crate::interpret::OutputInterpreter;
use crate::invoke::Solver;
use crate::problem::{Configuration, MeshSize, PROBLEMS, SWEEP_DOFS};
use crate::run_point;
use crate::tables::MeshTable;
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub table: String,
    pub invocations: usize,
    /// Run count per interpretation label (`ok`, `no_metrics`, ...).
    pub outcomes: BTreeMap<String, usize>,
}

/// Cells in sweep order: dof-major, then the five problems.
pub fn sweep_plan(table: &MeshTable) -> Result<Vec<(Configuration, MeshSize)>> {
    let mut plan = Vec::with_capacity(SWEEP_DOFS.len() * PROBLEMS.len());
    for (dof_index, &dof) in SWEEP_DOFS.iter().enumerate() {
        for (problem, &(shape, width)) in PROBLEMS.iter().enumerate() {
            let k = table.dim(problem, dof_index).ok_or_else(|| {
                anyhow!(
                    "mesh table '{}' has no entry for problem {} dof {}",
                    table.name,
                    problem,
                    dof
                )
            })?;
            plan.push((Configuration::new(shape, width, dof), MeshSize::cube(k)));
        }
    }
    Ok(plan)
}

/// Run every cell once. Stop signals are logged and counted but never cut
/// the sweep short.
pub fn fixed_sweep<S: Solver>(
    solver: &mut S,
    interpreter: &OutputInterpreter,
    results: &mut Results,
    table: &MeshTable,
) -> Result<SweepReport> {
    let plan = sweep_plan(table)?;
    let mut report = SweepReport {
        table: table.name.clone(),
        ..SweepReport::default()
    };
    info!(table = %table.name, cells = plan.len(), "starting fixed sweep");
    for (config, mesh) in &plan {
        let interpretation = run_point(solver, interpreter, results, config, *mesh)?;
        report.invocations += 1;
        *report
            .outcomes
            .entry(interpretation.label().to_string())
            .or_default() += 1;
    }
    Ok(report)
}

//! Capacity search: grow the cubic mesh until the solver gives up.

use crate::aggregate::Results;
use crate::interpret::{OutputInterpreter, RunStatus};
use crate::invoke::Solver;
use crate::problem::{Configuration, MeshSize};
use crate::run_point;
use anyhow::Result;
use serde::Serialize;
use tracing::{info, warn};

pub const BASE_DIM: u32 = 32;
pub const DIM_STEP: u32 = 16;
/// Escalation stops before the cube of the dimension reaches this value.
pub const POINT_CEILING: u64 = i32::MAX as u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Exhausted,
    Faulted,
    Ceiling,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchOutcome {
    pub problem: String,
    pub dof: String,
    /// Dimensions tried, in order.
    pub attempted: Vec<u32>,
    /// Largest dimension whose run did not signal stop.
    pub largest_ok: Option<u32>,
    /// Dimension whose run signalled stop.
    pub stopped_at: Option<u32>,
    pub reason: StopReason,
}

/// Dimensions capacity search will try at most: 32, 48, ... while the
/// cube stays below the ceiling.
pub fn escalation() -> impl Iterator<Item = u32> {
    std::iter::successors(Some(BASE_DIM), |k| k.checked_add(DIM_STEP))
        .take_while(|&k| MeshSize::cube(k).points() < POINT_CEILING)
}

/// Escalate one configuration until a run signals stop or the ceiling is
/// reached.
pub fn search_configuration<S: Solver>(
    solver: &mut S,
    interpreter: &OutputInterpreter,
    results: &mut Results,
    config: &Configuration,
) -> Result<SearchOutcome> {
    let mut outcome = SearchOutcome {
        problem: config.descriptor(),
        dof: config.dof_label(),
        attempted: Vec::new(),
        largest_ok: None,
        stopped_at: None,
        reason: StopReason::Ceiling,
    };
    for k in escalation() {
        outcome.attempted.push(k);
        let interpretation = run_point(solver, interpreter, results, config, MeshSize::cube(k))?;
        match interpretation.status {
            RunStatus::Continue => {
                info!(config = %config, "mesh size: {}", k);
                outcome.largest_ok = Some(k);
            }
            RunStatus::StopExpected => {
                info!(config = %config, mesh = k, "resource limit reached");
                outcome.stopped_at = Some(k);
                outcome.reason = StopReason::Exhausted;
                return Ok(outcome);
            }
            RunStatus::StopFaulted => {
                warn!(config = %config, mesh = k, "solver fault, stopping escalation");
                outcome.stopped_at = Some(k);
                outcome.reason = StopReason::Faulted;
                return Ok(outcome);
            }
        }
    }
    warn!(config = %config, "mesh ceiling reached without a resource limit");
    Ok(outcome)
}

/// Run an independent escalation for each configuration in order.
pub fn capacity_search<S: Solver>(
    solver: &mut S,
    interpreter: &OutputInterpreter,
    results: &mut Results,
    configs: &[Configuration],
) -> Result<Vec<SearchOutcome>> {
    configs
        .iter()
        .map(|config| search_configuration(solver, interpreter, results, config))
        .collect()
}

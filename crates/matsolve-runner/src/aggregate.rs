use crate::interpret::LowerBound;
use crate::problem::{Configuration, MeshSize};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One metric line of one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub mesh_size: MeshSize,
    pub lower: LowerBound,
}

/// Problem descriptor -> dof label -> records in invocation order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Results {
    problems: BTreeMap<String, BTreeMap<String, Vec<RunRecord>>>,
}

impl Results {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record per metric. Buckets are created on first use, so a
    /// configuration that never produced a metric has no entry at all.
    pub fn record(&mut self, config: &Configuration, mesh: MeshSize, metrics: &[LowerBound]) {
        if metrics.is_empty() {
            return;
        }
        let bucket = self
            .problems
            .entry(config.descriptor())
            .or_default()
            .entry(config.dof_label())
            .or_default();
        bucket.extend(metrics.iter().map(|&lower| RunRecord {
            mesh_size: mesh,
            lower,
        }));
    }

    pub fn records(&self, descriptor: &str, dof_label: &str) -> Option<&[RunRecord]> {
        self.problems
            .get(descriptor)
            .and_then(|by_dof| by_dof.get(dof_label))
            .map(Vec::as_slice)
    }

    pub fn problems(&self) -> &BTreeMap<String, BTreeMap<String, Vec<RunRecord>>> {
        &self.problems
    }

    pub fn record_count(&self) -> usize {
        self.problems
            .values()
            .flat_map(|by_dof| by_dof.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.problems.is_empty()
    }
}

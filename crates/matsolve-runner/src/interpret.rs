//! Classification of solver console output.

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// The four statistics printed on a `Lower:` line.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LowerBound(pub [f64; 4]);

/// What a run means for the strategy driving it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Continue,
    /// Resource exhaustion reported by the solver. The normal end of a
    /// capacity search.
    StopExpected,
    /// Unexplained output on standard error.
    StopFaulted,
}

impl RunStatus {
    pub fn is_stop(self) -> bool {
        !matches!(self, RunStatus::Continue)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Interpretation {
    pub status: RunStatus,
    pub metrics: Vec<LowerBound>,
}

impl Interpretation {
    pub fn label(&self) -> &'static str {
        match (self.status, self.metrics.is_empty()) {
            (RunStatus::StopFaulted, _) => "faulted",
            (RunStatus::StopExpected, _) => "exhausted",
            (RunStatus::Continue, false) => "ok",
            (RunStatus::Continue, true) => "no_metrics",
        }
    }
}

pub struct OutputInterpreter {
    lower: Regex,
    exhausted: Regex,
}

impl OutputInterpreter {
    pub fn new() -> Result<Self> {
        const NUM: &str = r"[-+]?[0-9.]+(?:[eE][-+]?[0-9]+)?";
        let lower = Regex::new(&format!(
            r"^\s*Lower:([0-9]+),({NUM}),({NUM}),({NUM})"
        ))?;
        let exhausted = Regex::new(r"(?i)out of memory")?;
        Ok(Self { lower, exhausted })
    }

    /// Classify one run from its captured streams. Any standard error
    /// output stops the run before standard output is looked at.
    pub fn interpret(&self, stdout: &str, stderr: &str) -> Interpretation {
        if !stderr.is_empty() {
            let status = if self.exhausted.is_match(stderr) {
                RunStatus::StopExpected
            } else {
                RunStatus::StopFaulted
            };
            return Interpretation {
                status,
                metrics: Vec::new(),
            };
        }
        self.interpret_stdout(stdout)
    }

    /// Scan standard output line by line. Metric lines seen before an
    /// out-of-memory line are kept; nothing after it is read.
    pub fn interpret_stdout(&self, stdout: &str) -> Interpretation {
        let mut metrics = Vec::new();
        for line in stdout.lines() {
            if self.exhausted.is_match(line) {
                return Interpretation {
                    status: RunStatus::StopExpected,
                    metrics,
                };
            }
            if let Some(caps) = self.lower.captures(line) {
                match parse_lower(&caps) {
                    Some(bound) => metrics.push(bound),
                    None => warn!(line = %line, "skipping unparseable metric line"),
                }
            }
        }
        Interpretation {
            status: RunStatus::Continue,
            metrics,
        }
    }
}

fn parse_lower(caps: &regex::Captures<'_>) -> Option<LowerBound> {
    let mut values = [0.0f64; 4];
    for (i, slot) in values.iter_mut().enumerate() {
        *slot = caps.get(i + 1)?.as_str().parse().ok()?;
    }
    Some(LowerBound(values))
}

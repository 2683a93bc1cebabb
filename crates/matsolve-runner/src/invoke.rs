//! Running the external solver once per data point.

use crate::error::DriverError;
use crate::problem::{Configuration, MeshSize};
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Captured streams of one finished solver run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

pub trait Solver {
    /// Run the solver once for `config` on `mesh` and wait for it to exit.
    /// `Err` is reserved for failing to start or wait on the process.
    fn run(&mut self, config: &Configuration, mesh: MeshSize) -> Result<RunOutput>;
}

/// Invokes `[launcher...] <program> <shape> <width> <dof> <x> <y> <z>`.
/// No timeout and no retry.
#[derive(Clone, Debug)]
pub struct ProcessSolver {
    program: PathBuf,
    launcher: Vec<String>,
    echo: bool,
}

impl ProcessSolver {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            launcher: Vec::new(),
            echo: true,
        }
    }

    pub fn with_launcher(mut self, launcher: Vec<String>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Whether captured streams are copied to this process's stdout and
    /// stderr after each run.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Fail early when the solver is given as a path that does not exist.
    /// Bare program names are left to the `PATH` lookup of the spawn, and a
    /// launcher resolves the program itself.
    pub fn ensure_available(&self) -> Result<()> {
        let is_path = self.program.components().count() > 1;
        if self.launcher.is_empty() && is_path && !self.program.exists() {
            return Err(DriverError::SolverMissing(self.program.clone()).into());
        }
        Ok(())
    }

    pub fn command_line(&self, config: &Configuration, mesh: MeshSize) -> Vec<String> {
        let mut parts = self.launcher.clone();
        parts.push(self.program.to_string_lossy().to_string());
        parts.extend(config.solver_args(mesh));
        parts
    }
}

impl Solver for ProcessSolver {
    fn run(&mut self, config: &Configuration, mesh: MeshSize) -> Result<RunOutput> {
        let parts = self.command_line(config, mesh);
        let (program, args) = parts
            .split_first()
            .ok_or_else(|| anyhow!("empty solver command"))?;
        debug!(command = ?parts, "spawning solver");
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("failed to run solver {}", parts.join(" ")))?;

        let run = RunOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };
        if self.echo {
            println!("{}", run.stdout);
            if !run.stderr.is_empty() {
                eprintln!("{}", run.stderr);
            }
        }
        Ok(run)
    }
}

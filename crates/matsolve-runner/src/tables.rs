//! Precomputed largest feasible mesh dimensions for the fixed sweep.
//!
//! Rows follow [`crate::problem::PROBLEMS`]; columns are dof 1 through 8.

use crate::error::DriverError;
use crate::problem::{PROBLEMS, SWEEP_DOFS};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{info, warn};

pub const ROWS: usize = PROBLEMS.len();
pub const COLS: usize = SWEEP_DOFS.len();

/// Environment variable naming the accelerator architecture.
pub const ARCH_ENV: &str = "CUDAARCHS";

const SM80: [[u32; COLS]; ROWS] = [
    [560, 416, 320, 256, 224, 192, 176, 160],
    [544, 336, 256, 208, 176, 160, 144, 128],
    [416, 256, 192, 160, 144, 128, 112, 104],
    [544, 336, 256, 208, 176, 160, 144, 128],
    [416, 256, 192, 160, 144, 128, 112, 104],
];

const GENERIC: [[u32; COLS]; ROWS] = [
    [512, 336, 256, 208, 176, 160, 144, 128],
    [432, 272, 208, 160, 144, 128, 112, 96],
    [336, 208, 160, 128, 112, 96, 80, 80],
    [432, 272, 208, 160, 144, 128, 112, 96],
    [336, 208, 160, 128, 112, 96, 80, 80],
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshTable {
    pub name: String,
    rows: Vec<Vec<u32>>,
}

impl MeshTable {
    pub fn sm80() -> Self {
        Self::from_const("sm80", &SM80)
    }

    pub fn generic() -> Self {
        Self::from_const("generic", &GENERIC)
    }

    fn from_const(name: &str, rows: &[[u32; COLS]; ROWS]) -> Self {
        Self {
            name: name.to_string(),
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        }
    }

    pub fn new(name: impl Into<String>, rows: Vec<Vec<u32>>) -> Result<Self> {
        let table = Self {
            name: name.into(),
            rows,
        };
        table.validate()?;
        Ok(table)
    }

    /// Read a table from a YAML (or JSON) file with `name` and `rows`.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read mesh table {}", path.display()))?;
        let table: MeshTable = serde_yaml::from_str(&raw)
            .with_context(|| format!("invalid mesh table {}", path.display()))?;
        table.validate()?;
        Ok(table)
    }

    fn validate(&self) -> Result<(), DriverError> {
        if self.rows.len() != ROWS {
            return Err(DriverError::TableRowCount {
                expected: ROWS,
                found: self.rows.len(),
            });
        }
        for (row, sizes) in self.rows.iter().enumerate() {
            if sizes.len() != COLS {
                return Err(DriverError::MalformedTable {
                    expected_rows: ROWS,
                    expected_cols: COLS,
                    row,
                    found: sizes.len(),
                });
            }
            if let Some(col) = sizes.iter().position(|&k| k == 0) {
                return Err(DriverError::ZeroMeshSize { row, col });
            }
        }
        Ok(())
    }

    /// Mesh dimension for problem row `problem` and dof column `dof_index`.
    pub fn dim(&self, problem: usize, dof_index: usize) -> Option<u32> {
        self.rows.get(problem)?.get(dof_index).copied()
    }
}

/// How the sweep table is chosen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TableChoice {
    /// Consult [`ARCH_ENV`] with the legacy comparison.
    #[default]
    Auto,
    Sm80,
    Generic,
}

impl FromStr for TableChoice {
    type Err = DriverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(TableChoice::Auto),
            "sm80" => Ok(TableChoice::Sm80),
            "generic" => Ok(TableChoice::Generic),
            other => Err(DriverError::UnknownTable(other.to_string())),
        }
    }
}

impl TableChoice {
    pub fn resolve(self, arch: Option<&str>) -> MeshTable {
        match self {
            TableChoice::Sm80 => MeshTable::sm80(),
            TableChoice::Generic => MeshTable::generic(),
            TableChoice::Auto => table_for_arch(arch),
        }
    }
}

/// The architecture value is compared as text against a number, which
/// never matches, so the generic table is always chosen. Kept as observed;
/// `--table sm80` selects the other table explicitly.
pub fn table_for_arch(arch: Option<&str>) -> MeshTable {
    let arch = arch.map(str::trim);
    if arch.and_then(|v| v.parse::<u32>().ok()) == Some(80) {
        warn!(
            "{}=80 does not select the sm80 mesh table automatically; pass --table sm80 to use it",
            ARCH_ENV
        );
    }
    info!(arch = ?arch, "using generic mesh table");
    MeshTable::generic()
}

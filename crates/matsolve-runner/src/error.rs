use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("solver executable not found: {}", .0.display())]
    SolverMissing(PathBuf),

    #[error("mesh table must have {expected_rows} rows of {expected_cols} sizes (row {row} has {found})")]
    MalformedTable {
        expected_rows: usize,
        expected_cols: usize,
        row: usize,
        found: usize,
    },

    #[error("mesh table has {found} rows, expected {expected}")]
    TableRowCount { expected: usize, found: usize },

    #[error("mesh table entry is zero at row {row}, column {col}")]
    ZeroMeshSize { row: usize, col: usize },

    #[error("unknown mesh table '{0}' (expected auto, sm80 or generic)")]
    UnknownTable(String),
}

use crate::aggregate::Results;
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// `<dir>/<run_name>[-<marker>].json`
pub fn results_path(results_dir: &Path, run_name: &str, marker: Option<&str>) -> PathBuf {
    let stem = match marker {
        Some(marker) => format!("{}-{}", run_name, marker),
        None => run_name.to_string(),
    };
    results_dir.join(format!("{}.json", stem))
}

fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory {}", path.display()))
}

fn atomic_write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let ts = Utc::now().timestamp_micros();
    let pid = std::process::id();
    let name = path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("results");
    let tmp = path.with_file_name(format!(".{}.tmp.{}.{}", name, pid, ts));
    let mut file = fs::File::create(&tmp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Pretty JSON with 4-space indentation.
fn to_json_pretty<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    Ok(buf)
}

pub fn write_results(path: &Path, results: &Results) -> Result<()> {
    let bytes = to_json_pretty(results)?;
    atomic_write_bytes(path, &bytes)
        .with_context(|| format!("failed to write results to {}", path.display()))
}

pub fn load_results(path: &Path) -> Result<Results> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read results {}", path.display()))?;
    Ok(serde_json::from_str(&raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpret::LowerBound;
    use crate::problem::{Configuration, MeshSize, StencilShape};

    fn temp_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "matsolve_{}_{}_{}",
            tag,
            std::process::id(),
            Utc::now().timestamp_micros()
        ))
    }

    #[test]
    fn results_path_appends_marker() {
        let dir = Path::new("results");
        assert_eq!(
            results_path(dir, "matsolve-a100", None),
            PathBuf::from("results/matsolve-a100.json")
        );
        assert_eq!(
            results_path(dir, "matsolve-a100", Some("bw")),
            PathBuf::from("results/matsolve-a100-bw.json")
        );
    }

    #[test]
    fn write_then_load_preserves_structure_and_order() {
        let mut results = Results::new();
        let star = Configuration::new(StencilShape::Star, 0, 1);
        let boxed = Configuration::new(StencilShape::Box, 0, 4);
        results.record(&star, MeshSize::cube(48), &[LowerBound([1.0, 2.5, 0.5, 0.0625])]);
        results.record(&star, MeshSize::cube(32), &[LowerBound([2.0, 3.5, 0.25, 0.125])]);
        results.record(&boxed, MeshSize::cube(32), &[LowerBound([1.0, 1.0, 1.0, 1.0])]);

        let dir = temp_dir("persist_test");
        let path = results_path(&dir, "run", Some("sweep"));
        write_results(&path, &results).expect("write results");

        let raw = fs::read_to_string(&path).expect("read back");
        assert!(raw.contains("\n    \"stencilbox,width=0\""));
        let loaded = load_results(&path).expect("load results");
        assert_eq!(loaded, results);
        let records = loaded
            .records("stencilstar,width=0", "dof=1")
            .expect("bucket");
        assert_eq!(records[0].mesh_size, MeshSize::cube(48));
        assert_eq!(records[1].mesh_size, MeshSize::cube(32));

        let leftovers: Vec<_> = fs::read_dir(&dir)
            .expect("list dir")
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn empty_results_write_an_empty_object() {
        let dir = temp_dir("persist_empty");
        let path = results_path(&dir, "run", None);
        write_results(&path, &Results::new()).expect("write results");
        assert_eq!(fs::read_to_string(&path).expect("read back"), "{}");
        let _ = fs::remove_dir_all(dir);
    }
}

//! Waveform export, one CSV file per state variable.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use svm_solver::TransientResult;

/// File-system friendly form of a state label: `U(C1)` becomes `U_C1`.
pub fn safe_name(label: &str) -> String {
    label.replace('(', "_").replace([')', ' '], "")
}

/// A series that never moves and stays near zero carries no information.
pub fn is_quiet(values: &[f64]) -> bool {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    values.is_empty() || ((max - min).abs() < 1e-9 && max.abs() < 0.01)
}

/// Write `time,value` rows for one series.
pub fn write_series(path: &Path, time: &[f64], values: &[f64]) -> Result<()> {
    let file =
        fs::File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "time,value")?;
    for (t, v) in time.iter().zip(values) {
        writeln!(out, "{t:e},{v:e}")?;
    }
    out.flush()?;
    Ok(())
}

/// Export every non-quiet series into `<root>/<designation>/`.
///
/// Returns the written paths in state order.
pub fn export_waveforms(
    root: &Path,
    designation: &str,
    result: &TransientResult,
) -> Result<Vec<PathBuf>> {
    let dir = root.join(designation);
    let mut written = Vec::new();

    for (label, values) in result.labeled() {
        if is_quiet(values) {
            log::info!("skipping quiet series {label}");
            continue;
        }
        if written.is_empty() {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let path = dir.join(format!("{}.csv", safe_name(label)));
        write_series(&path, &result.time, values)?;
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use svm_core::{Circuit, Component};
    use svm_solver::{RunConfig, StimulusSelection, TransientParams, run_simulation};

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("U(C1)"), "U_C1");
        assert_eq!(safe_name("I(L 1)"), "I_L1");
    }

    #[test]
    fn test_is_quiet() {
        assert!(is_quiet(&[0.0, 0.0, 0.0]));
        assert!(is_quiet(&[0.005, 0.005]));
        assert!(is_quiet(&[]));
        // Flat but far from zero
        assert!(!is_quiet(&[5.0, 5.0]));
        assert!(!is_quiet(&[0.0, 1e-3]));
    }

    #[test]
    fn test_export_skips_quiet_series() {
        // C2 sits in an isolated loop and never charges
        let circuit = Circuit::from_components(vec![
            Component::voltage_source("V1", 1, 0, 1.0),
            Component::resistor("R1", 1, 2, 1.0),
            Component::capacitor("C1", 2, 0, 1.0),
            Component::resistor("R2", 3, 0, 1.0),
            Component::capacitor("C2", 3, 0, 1.0),
        ]);
        let mut config = RunConfig::new(TransientParams::new(0.5, 0.1));
        config.stimuli = StimulusSelection::None;
        let report = run_simulation(&circuit, &config).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let written = export_waveforms(dir.path(), "rc", &report.transient).unwrap();

        assert_eq!(written, vec![dir.path().join("rc").join("U_C1.csv")]);
        let csv = fs::read_to_string(&written[0]).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows[0], "time,value");
        assert_eq!(rows.len(), 6);
        let first: Vec<f64> = rows[1].split(',').map(|f| f.parse().unwrap()).collect();
        assert!((first[0] - 0.1).abs() < 1e-12);
    }
}

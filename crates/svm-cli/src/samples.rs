//! Sample circuits shipped with the binary.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// `(file name, netlist)` pairs.
pub const SAMPLES: &[(&str, &str)] = &[
    ("testLC.txt", "C Capacitor 1 1 2\nL Inductor 1 2 1\n"),
    (
        "RLC_step.txt",
        "U_src V 10 1 0\nR1 R 5 1 2\nL1 Inductor 0.001 2 3\nC1 Capacitor 10e-6 3 0\n",
    ),
    (
        "inv_off.txt",
        "// OFF\nV_dd V 5.0 3 0\nV_in V 0.0 4 0\nR_g R 50 4 1\nR_load R 1000 3 2\n\
         J_mos VCCS 0.02 2 0 1 0\nC_gs C 2e-12 1 0\nC_ds C 1e-12 2 0\nC_load C 5e-12 2 0\n",
    ),
    (
        "inv_on.txt",
        "// ON\nV_dd V 5.0 3 0\nV_in V 3.0 4 0\nR_g R 50 4 1\nR_load R 1000 3 2\n\
         J_mos VCCS 0.02 2 0 1 0\nC_gs C 2e-12 1 0\nC_gd C 1e-12 1 2\nC_ds C 1e-12 2 0\n\
         C_load C 5e-12 2 0\n",
    ),
    (
        "active_inverter.txt",
        "// Dynamic\nV_dd V 5.0 3 0\nU_in V 3.0 1 0\nR_load R 1000 3 2\nJ_mos VCCS 0.02 2 0 1 0\n\
         C_gs C 2e-12 1 0\nC_gd C 1e-12 1 2\nC_ds C 1e-12 2 0\nC_load C 5e-12 2 0\n",
    ),
    (
        "transistor_circuit.txt",
        "Uin V 5 1 0\nVdd V 12 2 0\nR1 R 10000 2 3\nCgs C 1e-12 1 0\nCgd C 1e-13 1 3\n\
         Cds C 1e-12 3 0\nRds R 1000 3 0\nJd VCCS 0.001 3 0 1 0\n",
    ),
    (
        "nand_circuit.txt",
        "V_dd V 5.0 3 0\nV_const V 3.0 6 0\nR_g2 R 50 6 4\nU_in V 3.0 7 0\nR_g1 R 50 7 5\n\
         R_load R 1000 3 2\nC_load C 5e-12 2 0\nJ_vt2 VCCS 0.02 2 1 4 1\nC_gs2 C 2e-12 4 1\n\
         C_gd2 C 1e-12 4 2\nC_ds2 C 1e-12 2 1\nJ_vt1 VCCS 0.02 1 0 5 0\nC_gs1 C 2e-12 5 0\n\
         C_gd1 C 1e-12 5 1\nC_ds1 C 1e-12 1 0\n",
    ),
];

/// Write every sample into `dir`, leaving existing files alone.
///
/// Returns the paths that were actually written.
pub fn write_samples(dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, text) in SAMPLES {
        let path = dir.join(name);
        if path.exists() {
            log::info!("{} exists, not overwritten", path.display());
            continue;
        }
        fs::write(&path, text).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }
    Ok(written)
}

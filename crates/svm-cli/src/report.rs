//! Console report for a finished run.

use std::fmt::Write as _;

use nalgebra::DMatrix;
use svm_core::Topology;
use svm_core::units::{format_exponent, format_value};
use svm_solver::{SimulationReport, TransientResult};

/// Rows in the progress table, not counting the final sample.
const PROGRESS_ROWS: usize = 15;

pub fn print_report(designation: &str, report: &SimulationReport) {
    let components = report.circuit.components();

    println!("Circuit: {designation}");
    println!("==========================================");
    for c in components {
        println!(
            "  {:<10} {:<14} {:>10}  {} -> {}",
            c.name,
            c.kind,
            format_value(c.value),
            c.node1,
            c.node2
        );
    }
    println!();

    println!("Topology");
    println!("------------------------------------------");
    let names = |ids: &[usize]| {
        ids.iter()
            .map(|&i| components[i].name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    println!(
        "Tree branches ({}): {}",
        report.topology.tree.len(),
        names(&report.topology.tree)
    );
    println!(
        "Chords ({}): {}",
        report.topology.links.len(),
        names(&report.topology.links)
    );
    if let Some(line) = floating_line(&report.topology) {
        println!("{line}");
    }
    if report.topology.num_loops() > 0 {
        println!();
        println!("Fundamental loops:");
        print!("{}", report.topology.render_loop_table(components));
    }
    println!();

    println!("State equations");
    println!("------------------------------------------");
    println!("Matrix A:");
    print!("{}", render_matrix(&report.system.a));
    println!();
    for eq in report.system.equations() {
        println!("{eq}");
    }
    println!();

    let result = &report.transient;
    println!("Transient");
    println!("------------------------------------------");
    println!(
        "T_end={:.3e}s, dt={:.3e}s, steps={}",
        result.t_end,
        result.dt,
        result.num_steps()
    );
    for diagnostic in &report.diagnostics {
        println!("warning: {diagnostic}");
    }
    println!();
    print!("{}", render_progress(result));
}

fn floating_line(topology: &Topology) -> Option<String> {
    if topology.is_connected() {
        return None;
    }
    let nodes: Vec<String> = topology.floating.iter().map(ToString::to_string).collect();
    Some(format!("No path to ground: {}", nodes.join(", ")))
}

/// Fixed-width dump, one row per line.
fn render_matrix(m: &DMatrix<f64>) -> String {
    let mut out = String::new();
    for row in m.row_iter() {
        for v in row.iter() {
            let _ = write!(out, "{:<12} ", format_exponent(*v, 2));
        }
        out.push('\n');
    }
    out
}

/// Sample indices shown in the progress table.
fn progress_rows(steps: usize) -> Vec<usize> {
    let every = (steps / PROGRESS_ROWS).max(1);
    (0..steps)
        .filter(|&k| k % every == 0 || k + 1 == steps)
        .collect()
}

fn render_progress(result: &TransientResult) -> String {
    let mut out = format!("{:<10}", "Time");
    for label in &result.labels {
        let _ = write!(out, " | {label:<10}");
    }
    out.push('\n');

    for k in progress_rows(result.num_steps()) {
        let _ = write!(out, "{:<10.3e}", result.time[k]);
        for series in &result.series {
            let _ = write!(out, " | {:<10.4}", series[k]);
        }
        out.push('\n');
    }
    out
}

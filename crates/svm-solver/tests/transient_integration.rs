//! Integration tests for the full simulation pipeline.

use indexmap::IndexMap;
use svm_core::{Circuit, Component, Diagnostic, NodeId};
use svm_solver::{MAX_STEPS, RunConfig, StimulusSelection, TransientParams, run_simulation};

/// RC discharge from 5 V:
///
/// ```text
///   node1 ──┬────────┐
///           │        │
///          R1=1k   C1=1µ
///           │        │
///   GND ────┴────────┘
/// ```
///
/// Expected: U(C1)(t) = 5·exp(-t/RC), RC = 1 ms
#[test]
fn test_rc_decay_matches_exponential() {
    let circuit = Circuit::from_components(vec![
        Component::resistor("R1", 1, 0, 1e3),
        Component::capacitor("C1", 1, 0, 1e-6),
    ]);

    let mut config = RunConfig::new(TransientParams::new(5e-3, 1e-5));
    config.initial_voltages = Some(IndexMap::from([(1, 5.0)]));

    let report = run_simulation(&circuit, &config).expect("RC run should succeed");
    let result = &report.transient;
    let u = result.series("U(C1)").expect("capacitor voltage series");

    assert_eq!(result.num_steps(), 500);
    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);

    let rc = 1e-3;
    for (k, (&t, &v)) in result.time.iter().zip(u).enumerate() {
        assert!(
            (t - (k + 1) as f64 * 1e-5).abs() < 1e-15,
            "time[{k}] = {t}"
        );
        let expected = 5.0 * (-t / rc).exp();
        assert!(
            ((v - expected) / expected).abs() < 1e-3,
            "U(C1)({t:e}) = {v} (expected {expected})"
        );
    }
}

/// Source-free LC tank, C = L = 1, seeded at 10 V.
///
/// Neither terminal touches ground, so node 2 becomes ground. The energy
/// ½CU² + ½LI² must stay at 50 J over the whole run, and the voltage follows
/// 10·cos(t) at ω = 1/√(LC) = 1 rad/s.
#[test]
fn test_lc_tank_conserves_energy() {
    let mut circuit = Circuit::from_components(vec![
        Component::capacitor("C", 1, 2, 1.0),
        Component::inductor("L", 2, 1, 1.0),
    ]);
    circuit.set_title("testLC");

    let config = RunConfig::new(TransientParams::new(20.0, 0.01));
    let report = run_simulation(&circuit, &config).expect("LC run should succeed");

    assert_eq!(report.transient.num_steps(), 2000);
    assert!(report.diagnostics.contains(&Diagnostic::GroundRemapped {
        node: NodeId::new(2)
    }));

    let u = report.transient.series("U(C)").expect("U(C)");
    let i = report.transient.series("I(L)").expect("I(L)");

    for (k, (&v, &a)) in u.iter().zip(i).enumerate() {
        let energy = 0.5 * v * v + 0.5 * a * a;
        assert!(
            (energy - 50.0).abs() < 1e-3,
            "energy at step {k} = {energy}"
        );
    }

    // One period is 2π s; the voltage must swing through both polarities.
    let max = u.iter().cloned().fold(f64::MIN, f64::max);
    let min = u.iter().cloned().fold(f64::MAX, f64::min);
    assert!(max > 9.9 && min < -9.9, "swing {min}..{max}");

    for (&t, &v) in report.transient.time.iter().zip(u) {
        let expected = 10.0 * t.cos();
        assert!(
            (v - expected).abs() < 5e-3,
            "U(C)({t}) = {v} (expected {expected})"
        );
    }

    let first_crossing = report
        .transient
        .time
        .iter()
        .zip(u)
        .find(|&(_, &v)| v <= 0.0)
        .map(|(&t, _)| t)
        .expect("voltage crosses zero");
    assert!(
        (first_crossing - std::f64::consts::FRAC_PI_2).abs() < 0.011,
        "first zero crossing at {first_crossing}"
    );
}

/// Series RLC driven by a ramped 10 V step:
///
/// ```text
///   U_src(+)─R1=5─L1=1m─C1=10µ─GND
/// ```
///
/// The ramp starts at 2 ms and ends at 2.5 ms; α = R/2L = 2500/s, so by
/// 10 ms the capacitor sits at 10 V with no current.
#[test]
fn test_rlc_step_settles() {
    let mut circuit = Circuit::from_components(vec![
        Component::voltage_source("U_src", 1, 0, 10.0),
        Component::resistor("R1", 1, 2, 5.0),
        Component::inductor("L1", 2, 3, 1e-3),
        Component::capacitor("C1", 3, 0, 10e-6),
    ]);
    circuit.set_title("RLC_step");

    let config = RunConfig::new(TransientParams::new(0.01, 1e-6));
    let report = run_simulation(&circuit, &config).expect("RLC run should succeed");
    let result = &report.transient;

    let u = result.series("U(C1)").expect("U(C1)");
    let i = result.series("I(L1)").expect("I(L1)");

    // Source held at zero until 2 ms
    assert!(u[1000].abs() < 1e-12, "U(C1) before ramp = {}", u[1000]);

    let last = result.num_steps() - 1;
    assert!((u[last] - 10.0).abs() < 1e-3, "final U(C1) = {}", u[last]);
    assert!(i[last].abs() < 1e-3, "final I(L1) = {}", i[last]);

    let position = report.system.state_position("U(C1)").expect("U(C1) is a state");
    assert_eq!(result.final_state()[position], u[last]);
}

#[test]
fn test_step_count_clamped() {
    let circuit = Circuit::from_components(vec![
        Component::resistor("R1", 1, 0, 1e3),
        Component::capacitor("C1", 1, 0, 1e-6),
    ]);
    let config = RunConfig::new(TransientParams::new(1000.0, 1e-6));
    let report = run_simulation(&circuit, &config).expect("clamped run should succeed");

    let result = &report.transient;
    assert_eq!(result.num_steps(), MAX_STEPS);
    assert!((result.t_end - 0.1).abs() < 1e-12, "t_end = {}", result.t_end);
    assert!(
        (result.time[MAX_STEPS - 1] - 0.1).abs() < 1e-9,
        "last sample at {}",
        result.time[MAX_STEPS - 1]
    );
    assert!(report.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::StepCountClamped {
            requested: 1_000_000_000,
            steps: MAX_STEPS,
            ..
        }
    )));
}

#[test]
fn test_runs_are_deterministic() {
    let circuit = Circuit::from_components(vec![
        Component::voltage_source("V_dd", 3, 0, 5.0),
        Component::voltage_source("U_in", 4, 0, 3.0),
        Component::resistor("R_g", 4, 1, 50.0),
        Component::resistor("R_load", 3, 2, 1000.0),
        Component::vccs("J_mos", 2, 0, 1, 0, 0.02),
        Component::capacitor("C_gs", 1, 0, 2e-12),
        Component::capacitor("C_gd", 1, 2, 1e-12),
        Component::capacitor("C_ds", 2, 0, 1e-12),
        Component::capacitor("C_load", 2, 0, 5e-12),
    ]);
    let config = RunConfig::new(TransientParams::new(40e-9, 1e-12));

    let first = run_simulation(&circuit, &config).expect("first run");
    let second = run_simulation(&circuit, &config).expect("second run");

    assert_eq!(first.system.a, second.system.a);
    assert_eq!(first.system.b, second.system.b);
    assert_eq!(first.transient.series, second.transient.series);
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn test_grounded_circuit_is_not_remapped() {
    let circuit = Circuit::from_components(vec![
        Component::voltage_source("V1", 1, 0, 1.0),
        Component::resistor("R1", 1, 2, 1.0),
        Component::capacitor("C1", 2, 0, 1.0),
    ]);
    let mut config = RunConfig::new(TransientParams::new(0.1, 0.01));
    config.stimuli = StimulusSelection::None;

    let report = run_simulation(&circuit, &config).expect("run should succeed");

    assert!(report.diagnostics.is_empty(), "{:?}", report.diagnostics);
    for (before, after) in circuit.components().iter().zip(report.circuit.components()) {
        assert_eq!(before.node1, after.node1, "{}", before.name);
        assert_eq!(before.node2, after.node2, "{}", before.name);
    }
}

//! Benchmarks for equation building and integration.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use svm_core::{Circuit, Component};
use svm_solver::{
    InitialState, InputShaping, SingularPolicy, TransientParams, build_state_space,
    solve_transient,
};

/// Source-driven RC ladder with `stages` sections.
fn rc_ladder(stages: u32) -> Circuit {
    let mut circuit = Circuit::new();
    circuit.add(Component::voltage_source("U_in", 1, 0, 1.0));
    for k in 1..=stages {
        circuit.add(Component::resistor(format!("R{k}"), k, k + 1, 1e3));
        circuit.add(Component::capacitor(format!("C{k}"), k + 1, 0, 1e-9));
    }
    circuit
}

fn bench_build_state_space(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_state_space");

    for stages in [5, 20, 50] {
        let circuit = rc_ladder(stages);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &circuit, |b, circuit| {
            b.iter(|| build_state_space(black_box(circuit), SingularPolicy::ZeroColumn).unwrap());
        });
    }

    group.finish();
}

fn bench_transient(c: &mut Criterion) {
    let mut group = c.benchmark_group("solve_transient");

    for stages in [5, 20] {
        let circuit = rc_ladder(stages);
        let system = build_state_space(&circuit, SingularPolicy::ZeroColumn).unwrap();
        let shaping = InputShaping::by_name_convention(&circuit, &system);
        let params = TransientParams::new(1e-5, 1e-8);

        group.bench_with_input(BenchmarkId::from_parameter(stages), &system, |b, system| {
            b.iter(|| {
                solve_transient(
                    &circuit,
                    black_box(system),
                    &params,
                    &shaping,
                    &InitialState::Zero,
                )
                .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build_state_space, bench_transient);
criterion_main!(benches);

//! Benchmarks for netlist parsing.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use svm_parser::parse;

/// RC ladder netlist with `stages` sections plus comment lines.
fn ladder_netlist(stages: usize) -> String {
    let mut text = String::from("// generated ladder\nU_in V 1.0 1 0\n");
    for k in 1..=stages {
        text.push_str(&format!("R{k} R 1k {k} {}\n", k + 1));
        text.push_str(&format!("C{k} C 1,5n {} 0 # shunt\n", k + 1));
    }
    text
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");

    for stages in [10, 100, 1000] {
        let text = ladder_netlist(stages);
        group.bench_with_input(BenchmarkId::from_parameter(stages), &text, |b, text| {
            b.iter(|| parse(black_box(text)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);

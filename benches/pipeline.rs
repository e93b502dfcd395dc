mod common;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use minijs::{bytecode, compile, semantic};

fn bench_pipeline(c: &mut Criterion) {
    for (label, source) in common::workloads("pipeline") {
        let program = common::load_program(&source);

        c.bench_function(&format!("pipeline_analyze_only_{label}"), |b| {
            b.iter(|| {
                let analysis = semantic::analyze(Some(black_box(&program)));
                black_box(analysis);
            })
        });

        c.bench_function(&format!("pipeline_lower_only_{label}"), |b| {
            b.iter(|| {
                let instructions = bytecode::lower(black_box(&program));
                black_box(bytecode::to_binary(&instructions));
            })
        });

        c.bench_function(&format!("pipeline_total_{label}"), |b| {
            b.iter(|| {
                let compilation = compile(black_box(&source));
                black_box(compilation.instructions.len());
            })
        });
    }
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);

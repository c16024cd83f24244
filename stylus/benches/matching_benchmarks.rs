use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stylus::target::Target;
use web_time::Instant;

/// Build a target of roughly `lines` lines of indented code
fn sample_code(lines: usize) -> String {
    (0..lines)
        .map(|line| format!("    let value_{line} = compute({line}, \"text\");\n"))
        .collect()
}

fn benchmark_compute_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_match");

    for lines in [10, 100, 1000] {
        let code = sample_code(lines);
        let target = Target::new(&code);
        // Learner halfway through, with sloppy whitespace
        let typed: String = code[..code.len() / 2].replace("    ", " ");

        group.bench_with_input(
            BenchmarkId::new("half_typed", format!("{lines}lines")),
            &(target, typed),
            |b, (target, typed)| b.iter(|| target.compute_match(black_box(typed))),
        );
    }

    group.finish();
}

fn benchmark_plan_regions(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_regions");
    let now = Instant::now();

    for lines in [10, 100, 1000] {
        let target = Target::new(&sample_code(lines));
        let matched = target.total_chars() / 2;

        group.bench_with_input(
            BenchmarkId::new("split", format!("{lines}lines")),
            &(target, matched),
            |b, (target, matched)| b.iter(|| target.plan_regions(black_box(*matched), None, now)),
        );
    }

    group.finish();
}

fn benchmark_target_preparation(c: &mut Criterion) {
    let mut group = c.benchmark_group("target_preparation");

    for lines in [10, 100, 1000] {
        let code = sample_code(lines);

        group.bench_with_input(
            BenchmarkId::new("new", format!("{lines}lines")),
            &code,
            |b, code| b.iter(|| Target::new(black_box(code))),
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_compute_match,
    benchmark_plan_regions,
    benchmark_target_preparation
);
criterion_main!(benches);

//! Benchmarks for paragraph flattening and placeholder resolution.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docfill_core::{FlattenedText, PlaceholderPattern, resolve};

/// Paragraph of `runs` text nodes with a placeholder split across every
/// tenth boundary.
fn create_paragraph(runs: usize) -> Vec<String> {
    (0..runs)
        .map(|i| match i % 10 {
            8 => format!("text {i} {{{{field_"),
            9 => format!("{i}}}}} more text"),
            _ => format!("plain run number {i} "),
        })
        .collect()
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for runs in [10, 100, 1000] {
        let paragraph = create_paragraph(runs);
        group.bench_with_input(BenchmarkId::from_parameter(runs), &paragraph, |b, p| {
            b.iter(|| FlattenedText::new(black_box(p)));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let pattern = PlaceholderPattern::default();
    let mut group = c.benchmark_group("resolve");

    for runs in [10, 100, 1000] {
        let paragraph = create_paragraph(runs);
        group.bench_with_input(BenchmarkId::from_parameter(runs), &paragraph, |b, p| {
            b.iter(|| resolve(&pattern, black_box(p)));
        });
    }

    group.bench_function("image_directives", |b| {
        let paragraph = vec![
            "Logo {{image:logo|width:200|".to_owned(),
            "height:100}} for {{client}} and {{image:sig|width:50|height:20}}".to_owned(),
        ];
        b.iter(|| resolve(&pattern, black_box(&paragraph)));
    });

    group.finish();
}

criterion_group!(benches, bench_flatten, bench_resolve);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use math_audio_multigrid::{SparseTransfer, TransferMode, TransferOperator};
use ndarray::Array1;

fn curve_operator(lower: usize) -> TransferOperator<'static, f64> {
    let vertices = SparseTransfer::curve_subdivision(lower, true);
    let edges = SparseTransfer::edge_split(lower);
    TransferOperator::new(lower, 2 * lower, vertices)
        .unwrap()
        .with_edge_constraints(edges)
        .unwrap()
}

fn bench_prolong(c: &mut Criterion) {
    let mut group = c.benchmark_group("prolong");

    for lower in [1024, 16384, 131072] {
        let op = curve_operator(lower);
        for mode in [TransferMode::MatrixOnly, TransferMode::Matrix3AndEdgeConstraints] {
            let v = Array1::from_elem(mode.expected_len(lower), 0.5);
            group.throughput(Throughput::Elements(v.len() as u64));
            group.bench_with_input(BenchmarkId::new(mode.to_string(), lower), &v, |b, v| {
                b.iter(|| op.prolong(black_box(v), mode).unwrap())
            });
        }
    }
    group.finish();
}

fn bench_restrict(c: &mut Criterion) {
    let mut group = c.benchmark_group("restrict");
    let mode = TransferMode::Matrix3AndBarycenter;

    for lower in [1024, 16384, 131072] {
        let op = curve_operator(lower);
        let v = Array1::from_elem(mode.expected_len(2 * lower), 0.5);
        group.throughput(Throughput::Elements(v.len() as u64));

        group.bench_with_input(BenchmarkId::new("transpose", lower), &v, |b, v| {
            b.iter(|| op.restrict_by_transpose(black_box(v), mode).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("pseudo_inverse", lower), &v, |b, v| {
            b.iter(|| op.restrict_by_pseudo_inverse(black_box(v), mode).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_prolong, bench_restrict);
criterion_main!(benches);

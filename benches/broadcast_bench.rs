use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rarray::{
    binary_op, reducer, subset_assign, Array, AxisIndex, BinaryOp, Indexer, ReducerOp,
    StridedRange,
};
use std::time::Duration;

fn random_doubles(rng: &mut StdRng, dims: &[usize]) -> Array {
    let len = dims.iter().product();
    let data: Vec<f64> = (0..len).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Array::from_vec(data, dims).unwrap()
}

/// Matrix plus row vector: the vector is broadcast with stride 0.
fn bench_add_broadcast(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_broadcast");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));
    for size in [100usize, 500, 1000] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let mut rng = StdRng::seed_from_u64(42);
        let x = random_doubles(&mut rng, &[size, size]);
        let row = random_doubles(&mut rng, &[1, size]);
        let same = random_doubles(&mut rng, &[size, size]);

        group.bench_with_input(BenchmarkId::new("same_shape", size), &size, |b, _| {
            b.iter(|| binary_op(BinaryOp::Add, &x, &same).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("row_vector", size), &size, |b, _| {
            b.iter(|| binary_op(BinaryOp::Add, &x, &row).unwrap())
        });
    }
    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce_sum");
    for size in [100usize, 500] {
        group.throughput(Throughput::Elements((size * size) as u64));
        let mut rng = StdRng::seed_from_u64(7);
        let x = random_doubles(&mut rng, &[size, size]);
        let rows: &[usize] = &[0];
        let cols: &[usize] = &[1];
        group.bench_with_input(BenchmarkId::new("axis0", size), &size, |b, _| {
            b.iter(|| reducer(ReducerOp::Sum, &x, Some(rows)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("axis1", size), &size, |b, _| {
            b.iter(|| reducer(ReducerOp::Sum, &x, Some(cols)).unwrap())
        });
    }
    group.finish();
}

/// Strided vs dynamic write of every other row.
fn bench_subset_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("subset_assign");
    for size in [100usize, 500] {
        let mut rng = StdRng::seed_from_u64(3);
        let x = random_doubles(&mut rng, &[size, size]);
        let value = random_doubles(&mut rng, &[size / 2, 1]);
        let strided = Indexer::new(vec![
            AxisIndex::Range(StridedRange::new(0, size, 2)),
            AxisIndex::All,
        ]);
        // descending then ascending, so no single step describes it
        let mut rows: Vec<usize> = (0..size / 4).map(|i| 4 * i).rev().collect();
        rows.extend((0..size / 2 - size / 4).map(|i| 4 * i + 2));
        let dynamic = Indexer::new(vec![AxisIndex::Positions(rows), AxisIndex::All]);

        group.bench_with_input(BenchmarkId::new("strided", size), &size, |b, _| {
            b.iter(|| subset_assign(&x, &strided, &value).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("dynamic", size), &size, |b, _| {
            b.iter(|| subset_assign(&x, &dynamic, &value).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_add_broadcast, bench_reduce, bench_subset_assign);
criterion_main!(benches);

//! Write propagation benchmarks
//!
//! Measures the cost of a single write as the number of dependents grows,
//! and the cost of memoized reads.
//!
//! Run with: `cargo bench`

#![allow(missing_docs)] // Benchmarks don't need extensive docs

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use stayflow_runtime::{ReactionScope, ReactiveCell, Scheduler};
use std::cell::Cell;
use std::rc::Rc;

fn bench_write_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_fan_out");

    for dependents in [1_usize, 10, 100] {
        let scheduler = Scheduler::new();
        let cell = ReactiveCell::new(&scheduler, 0_u64);
        let sum = Rc::new(Cell::new(0_u64));
        let mut scope = ReactionScope::new();
        for _ in 0..dependents {
            let view = cell.reader();
            let sum = Rc::clone(&sum);
            scope.hold(scheduler.register(move || sum.set(sum.get().wrapping_add(view.read()))));
        }

        group.throughput(Throughput::Elements(dependents as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(dependents),
            &dependents,
            |b, _| {
                let mut next = 0_u64;
                b.iter(|| {
                    next += 1;
                    cell.write(black_box(next));
                });
            },
        );
    }

    group.finish();
}

fn bench_derived_read(c: &mut Criterion) {
    let scheduler = Scheduler::new();
    let cell = ReactiveCell::new(&scheduler, (0..365_u32).collect::<Vec<_>>());
    let total = cell.derive(|days| days.iter().map(|d| u64::from(*d)).sum::<u64>());

    c.bench_function("derived_read_cached", |b| {
        b.iter(|| black_box(total.read()));
    });
}

criterion_group!(benches, bench_write_fan_out, bench_derived_read);
criterion_main!(benches);

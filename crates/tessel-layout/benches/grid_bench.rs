//! Benchmarks for grid mutation, normalization and persistence.
//!
//! Run with: cargo bench -p tessel-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tessel_layout::{
    Direction, GridConfig, GridOperation, GridState, GridTimeline, add_view_to_grid,
    deserialize_grid, leaves, normalize_grid, remove_view_from_grid, resize_leaf,
    serialize_grid_to_value,
};

/// Grid with `n` leaves, alternating split axes so the tree nests.
fn make_grid(n: usize) -> GridState {
    let mut state = GridState::new("g0");
    for i in 1..n {
        let locations: Vec<_> = leaves(&state).into_iter().map(|(loc, _)| loc).collect();
        let target = &locations[i % locations.len()];
        let direction = if i % 2 == 0 {
            Direction::Right
        } else {
            Direction::Down
        };
        state = add_view_to_grid(&state, format!("g{i}"), target, direction, None);
    }
    state
}

fn deepest_leaf(state: &GridState) -> Vec<usize> {
    leaves(state)
        .into_iter()
        .map(|(location, _)| location)
        .max_by_key(Vec::len)
        .unwrap_or_default()
}

fn bench_add_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/add_view");
    for n in [4, 16, 64, 256] {
        let state = make_grid(n);
        let target = deepest_leaf(&state);
        group.bench_with_input(BenchmarkId::new("deepest", n), &state, |b, state| {
            b.iter(|| black_box(add_view_to_grid(state, "new", &target, Direction::Left, None)))
        });
    }
    group.finish();
}

fn bench_remove_view(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/remove_view");
    for n in [4, 16, 64, 256] {
        let state = make_grid(n);
        let target = deepest_leaf(&state);
        group.bench_with_input(BenchmarkId::new("deepest", n), &state, |b, state| {
            b.iter(|| black_box(remove_view_from_grid(state, &target)))
        });
    }
    group.finish();
}

fn bench_resize_and_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/resize_normalize");
    for n in [16, 256] {
        let state = make_grid(n);
        let target = deepest_leaf(&state);
        group.bench_with_input(BenchmarkId::new("resize", n), &state, |b, state| {
            b.iter(|| black_box(resize_leaf(state, &target, 70.0)))
        });
        group.bench_with_input(BenchmarkId::new("normalize_clean", n), &state, |b, state| {
            b.iter(|| black_box(normalize_grid(state)))
        });
    }
    group.finish();
}

fn bench_serialize_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/serialize");
    for n in [16, 256] {
        let state = make_grid(n);
        let value = serialize_grid_to_value(&state).expect("grid serializes");
        group.bench_with_input(BenchmarkId::new("serialize", n), &state, |b, state| {
            b.iter(|| black_box(serialize_grid_to_value(state)))
        });
        group.bench_with_input(BenchmarkId::new("deserialize", n), &value, |b, value| {
            b.iter(|| black_box(deserialize_grid(value, None)))
        });
    }
    group.finish();
}

fn bench_timeline_replay(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid/timeline");
    for steps in [16, 128] {
        group.bench_with_input(BenchmarkId::new("replay", steps), &steps, |b, &steps| {
            b.iter_batched(
                || {
                    let mut state = GridState::new("g0");
                    let mut timeline = GridTimeline::with_baseline(&state, GridConfig::default());
                    for i in 1..steps {
                        let op = GridOperation::AddView {
                            group_id: format!("g{i}"),
                            location: Vec::new(),
                            direction: if i % 2 == 0 { Direction::Right } else { Direction::Down },
                            size: None,
                        };
                        if let Ok(next) = timeline.apply_and_record(&state, op) {
                            state = next;
                        }
                    }
                    timeline
                },
                |timeline| black_box(timeline.replay()),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_add_view,
    bench_remove_view,
    bench_resize_and_normalize,
    bench_serialize_round_trip,
    bench_timeline_replay,
);
criterion_main!(benches);

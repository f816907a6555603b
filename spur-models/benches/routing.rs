// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

use std::rc::Rc;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use spur_engine::builder::{TopologyKind, builder_for};
use spur_engine::connectivity::ConnectivityMatrix;
use spur_engine::mapping::NeuronCoreMap;
use spur_models::context::EvaluationContext;
use spur_models::evaluator::Evaluator;
use spur_models::routing::{StrategyKind, strategy_for};
use spur_track::entity::toplevel;
use spur_track::tracker::dev_null_tracker;

const NUM_NEURONS: usize = 512;
const NEURONS_PER_CORE: usize = 16;

/// A fixed pseudo-random sparse matrix so that runs are comparable.
fn sparse_matrix() -> ConnectivityMatrix {
    let mut state: u64 = 0x5eed;
    let rows = (0..NUM_NEURONS)
        .map(|_| {
            (0..NUM_NEURONS)
                .map(|_| {
                    state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
                    if (state >> 33) % 20 == 0 { 1.0 } else { 0.0 }
                })
                .collect()
        })
        .collect();
    ConnectivityMatrix::from_rows(rows).unwrap()
}

fn setup(topology: TopologyKind, strategy: StrategyKind) -> Evaluator {
    // Create entities without the tracker system opening files for logging
    let tracker = dev_null_tracker();
    let top = toplevel(&tracker, "bench");

    let core_count = NUM_NEURONS / NEURONS_PER_CORE;
    let mut map = NeuronCoreMap::new(NUM_NEURONS, core_count);
    for neuron in 0..NUM_NEURONS {
        map.assign(neuron, neuron / NEURONS_PER_CORE).unwrap();
    }
    let tree = builder_for(topology, 4).unwrap().build(core_count).unwrap();
    let context = EvaluationContext::new(
        Rc::new(sparse_matrix()),
        Rc::new(map),
        Rc::new(tree),
        0.5,
    )
    .unwrap();
    Evaluator::new(&top, "eval", context, strategy_for(strategy, 4).unwrap())
}

fn run(evaluator: Evaluator) {
    let acc = evaluator.run();
    assert_eq!(acc.routed() + acc.silent(), NUM_NEURONS);
}

fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("routing");

    group.bench_function("binary_lca", |b| {
        b.iter_batched(
            || setup(TopologyKind::Binary, StrategyKind::Lca),
            run,
            BatchSize::SmallInput,
        );
    });

    group.bench_function("grouped_mask", |b| {
        b.iter_batched(
            || setup(TopologyKind::Grouped, StrategyKind::Mask),
            run,
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default();
    targets = bench_routing
}
criterion_main!(benches);

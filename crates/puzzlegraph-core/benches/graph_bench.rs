//! # Graph Benchmarks
//!
//! Performance benchmarks for puzzlegraph-core graph operations.
//!
//! Run with: `cargo bench -p puzzlegraph-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use puzzlegraph_core::{Graph, NodeId, NodeKind, graph_to_bytes};
use std::collections::{BTreeMap, BTreeSet};
use std::hint::black_box;

fn add_nodes(graph: &mut Graph, size: usize) {
    for i in 0..size {
        let kind = if i % 2 == 0 {
            NodeKind::Puzzle
        } else {
            NodeKind::Key
        };
        graph
            .add_node(format!("n{}", i), kind, format!("Node {}", i), BTreeMap::new())
            .expect("insert");
    }
}

/// Create a graph with N nodes and edges between consecutive nodes.
fn create_linear_graph(size: usize) -> Graph {
    let mut graph = Graph::new();
    add_nodes(&mut graph, size);

    for i in 1..size {
        graph
            .add_edge(&format!("n{}", i - 1), &format!("n{}", i))
            .expect("edge");
    }

    graph
}

/// Create a graph with N nodes and edges in a star pattern (hub-and-spoke).
fn create_star_graph(size: usize) -> Graph {
    let mut graph = Graph::new();
    add_nodes(&mut graph, size);

    for i in 1..size {
        graph.add_edge("n0", &format!("n{}", i)).expect("edge");
    }

    graph
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_node_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("node_insertion");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut graph = Graph::new();
                add_nodes(&mut graph, size);
                black_box(graph)
            });
        });
    }

    group.finish();
}

fn bench_edge_insertion(c: &mut Criterion) {
    let mut group = c.benchmark_group("edge_insertion");

    for size in [100, 1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| black_box(create_linear_graph(size)));
        });
    }

    group.finish();
}

fn bench_cycle_rejection(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_rejection");

    for size in [100, 500, 1000].iter() {
        let mut graph = create_linear_graph(*size);
        let last = format!("n{}", size - 1);

        // Worst case: the reachability check walks the whole chain.
        group.bench_with_input(BenchmarkId::from_parameter(size), &last, |b, last| {
            b.iter(|| black_box(graph.add_edge(last, "n0").is_err()));
        });
    }

    group.finish();
}

fn bench_topological_order(c: &mut Criterion) {
    let mut group = c.benchmark_group("topological_order");

    for size in [100, 1000, 10000].iter() {
        let linear = create_linear_graph(*size);
        let star = create_star_graph(*size);

        group.bench_with_input(BenchmarkId::new("linear", size), &linear, |b, graph| {
            b.iter(|| black_box(graph.topological_order().map(Iterator::count)));
        });
        group.bench_with_input(BenchmarkId::new("star", size), &star, |b, graph| {
            b.iter(|| black_box(graph.topological_order().map(Iterator::count)));
        });
    }

    group.finish();
}

fn bench_reachable_from(c: &mut Criterion) {
    let mut group = c.benchmark_group("reachable_from");

    for size in [100, 500, 1000].iter() {
        let graph = create_linear_graph(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| black_box(graph.reachable_from("n0")));
        });
    }

    group.finish();
}

fn bench_accessible(c: &mut Criterion) {
    let mut group = c.benchmark_group("accessible");

    for size in [100, 500, 1000].iter() {
        let graph = create_star_graph(*size);
        let resolved: BTreeSet<NodeId> = [NodeId::new("n0")].into_iter().collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &resolved, |b, resolved| {
            b.iter(|| black_box(graph.accessible(resolved)));
        });
    }

    group.finish();
}

fn bench_persistence(c: &mut Criterion) {
    let mut group = c.benchmark_group("persistence");

    for size in [100, 500, 1000].iter() {
        let graph = create_linear_graph(*size);

        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| black_box(graph_to_bytes(graph)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_node_insertion,
    bench_edge_insertion,
    bench_cycle_rejection,
    bench_topological_order,
    bench_reachable_from,
    bench_accessible,
    bench_persistence,
);

criterion_main!(benches);

use std::hint::black_box;

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use strata::graphlib::{Graph, GraphOptions};
use strata::{EdgeLabel, GraphLabel, LayoutGraph, NodeLabel, layout, rank};

/// Layered DAG: `layers` rows of `width` nodes, each node wired to a few nodes in the next one or
/// two rows. Wiring comes from a fixed LCG so every run sees the same graph.
fn layered_dag(layers: usize, width: usize, compound: bool) -> LayoutGraph {
    let opts = if compound {
        GraphOptions::compound()
    } else {
        GraphOptions::multigraph()
    };
    let mut g: LayoutGraph = Graph::new(opts);
    g.set_graph(GraphLabel::default());
    g.set_default_edge_label(EdgeLabel::default);

    let id = |l: usize, i: usize| format!("L{l}N{i}");
    for l in 0..layers {
        for i in 0..width {
            g.set_node(id(l, i), NodeLabel::new(60.0, 30.0));
        }
        if compound && l % 3 == 0 {
            let cluster = format!("C{l}");
            g.set_node(cluster.clone(), NodeLabel::default());
            for i in 0..width / 2 {
                let _ = g.set_parent(id(l, i), cluster.clone());
            }
        }
    }

    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;
    let mut next = move |bound: usize| {
        seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        ((seed >> 33) as usize) % bound
    };
    for l in 0..layers.saturating_sub(1) {
        for i in 0..width {
            // Diagonal links keep the whole graph connected.
            g.set_edge(id(l, i), id(l + 1, (i + 1) % width));
            for _ in 0..2 {
                let jump = if l + 2 < layers && next(4) == 0 { 2 } else { 1 };
                let target = next(width);
                let label = EdgeLabel::weighted(1.0 + next(3) as f64).with_minlen(jump);
                g.set_edge_with_label(id(l, i), id(l + jump, target), label);
            }
        }
    }
    g
}

fn bench_network_simplex(c: &mut Criterion) {
    let mut group = c.benchmark_group("network_simplex");
    for (layers, width) in [(8, 6), (20, 10), (40, 12)] {
        let name = format!("{layers}x{width}");
        group.bench_function(BenchmarkId::new("rank", &name), |b| {
            b.iter_batched(
                || layered_dag(layers, width, false),
                |mut g| {
                    rank::network_simplex(black_box(&mut g));
                    black_box(g.node_count())
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");
    for compound in [false, true] {
        let name = if compound { "compound_12x8" } else { "flat_12x8" };
        group.bench_function(name, |b| {
            b.iter_batched(
                || layered_dag(12, 8, compound),
                |mut g| {
                    let _ = layout(black_box(&mut g));
                    black_box(g.graph().height)
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_network_simplex, bench_layout);
criterion_main!(benches);

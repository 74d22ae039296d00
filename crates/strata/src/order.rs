//! Crossing reduction.
//!
//! Starting from a DFS-seeded ordering, the layers are swept alternately downwards (each node
//! placed at the barycenter of its predecessors) and upwards (successors). Every other pair of
//! sweeps breaks barycenter ties to the right instead of the left. The best layering seen so
//! far, counted with [`cross_count`], is kept; sweeping stops after
//! [`GraphLabel::order_iterations`](crate::GraphLabel::order_iterations) sweeps in a row fail to
//! improve on it, or once no crossings remain.

pub mod add_subgraph_constraints;
pub mod barycenter;
pub mod build_layer_graph;
pub mod cross_count;
pub mod init_order;
pub mod resolve_conflicts;
pub mod sort;
pub mod sort_subgraph;

use crate::graphlib::{Graph, GraphOptions};
use crate::util::{build_layer_matrix, max_rank};
use crate::{LayoutGraph, Result};
use rustc_hash::FxHashMap;
use tracing::debug;

pub use add_subgraph_constraints::add_subgraph_constraints;
pub use barycenter::{BarycenterEntry, barycenter};
pub use build_layer_graph::{Relationship, build_layer_graph};
pub use cross_count::cross_count;
pub use init_order::init_order;
pub use resolve_conflicts::{ResolvedEntry, resolve_conflicts};
pub use sort::{SortResult, sort};
pub use sort_subgraph::sort_subgraph;

/// Node label of a single-rank layer graph.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerNode {
    pub order: Option<usize>,
    pub border_left: Option<String>,
    pub border_right: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerGraphLabel {
    /// Synthetic parent of every top-level node on the rank.
    pub root: String,
}

/// One rank of the layout graph plus the adjacent rank's nodes it is sorted against. Edges
/// always point from the adjacent rank into this one and carry the summed edge weight.
pub type LayerGraph = Graph<LayerNode, f64, LayerGraphLabel>;

/// Left-to-right constraints between sibling clusters, accumulated across one sweep.
pub type ConstraintGraph = Graph<(), (), ()>;

pub fn order(g: &mut LayoutGraph) -> Result<()> {
    let Some(max_rank) = max_rank(g) else {
        return Ok(());
    };
    let mut down = build_layer_graph::build_layer_graphs(g, 1..=max_rank, Relationship::InEdges)?;
    let mut up =
        build_layer_graph::build_layer_graphs(g, (0..max_rank).rev(), Relationship::OutEdges)?;

    let layering = init_order(g);
    assign_order(g, &layering);

    // The DFS seed ignores clusters, so a layering only counts once every cluster sits
    // contiguously on each rank.
    let mut best_cc = if keeps_clusters_contiguous(g, &layering) {
        cross_count(g, &layering)
    } else {
        f64::INFINITY
    };
    let mut best = layering;
    let limit = g.graph().order_iterations;

    let mut i = 0usize;
    let mut last_best = 0usize;
    // The first two sweeps together touch every rank.
    while (last_best < limit || i < 2) && best_cc > 0.0 {
        let graphs = if i % 2 == 1 { &mut down } else { &mut up };
        sweep_layer_graphs(g, graphs, i % 4 >= 2);

        let layering = build_layer_matrix(g);
        let cc = cross_count(g, &layering);
        if cc < best_cc && keeps_clusters_contiguous(g, &layering) {
            last_best = 0;
            best = layering;
            best_cc = cc;
        } else {
            last_best += 1;
        }
        i += 1;
    }
    if best_cc.is_infinite() {
        best = build_layer_matrix(g);
    }
    debug!(sweeps = i, crossings = best_cc, "ordering done");

    assign_order(g, &best);
    Ok(())
}

fn sweep_layer_graphs(g: &mut LayoutGraph, layer_graphs: &mut [LayerGraph], bias_right: bool) {
    let mut cg: ConstraintGraph = Graph::new(GraphOptions::default());
    for lg in layer_graphs.iter_mut() {
        for (v, node) in lg.node_labels_mut() {
            node.order = g.node(v).and_then(|n| n.order);
        }

        let root = lg.graph().root.clone();
        let sorted = sort_subgraph(lg, &root, &cg, bias_right);
        for (i, v) in sorted.vs.iter().enumerate() {
            if let Some(node) = lg.node_mut(v) {
                node.order = Some(i);
            }
            if let Some(node) = g.node_mut(v) {
                node.order = Some(i);
            }
        }
        add_subgraph_constraints(lg, &mut cg, &sorted.vs);
    }
}

/// Whether every cluster's members occupy consecutive positions on each rank.
fn keeps_clusters_contiguous(g: &LayoutGraph, layering: &[Vec<String>]) -> bool {
    let mut spans: FxHashMap<&str, (usize, usize, usize)> = FxHashMap::default();
    for layer in layering {
        spans.clear();
        for (i, v) in layer.iter().enumerate() {
            let mut parent = g.parent(v);
            while let Some(p) = parent {
                let span = spans.entry(p).or_insert((i, i, 0));
                span.1 = i;
                span.2 += 1;
                parent = g.parent(p);
            }
        }
        if spans.values().any(|&(first, last, count)| last - first + 1 != count) {
            return false;
        }
    }
    true
}

fn assign_order(g: &mut LayoutGraph, layering: &[Vec<String>]) {
    for layer in layering {
        for (i, v) in layer.iter().enumerate() {
            if let Some(node) = g.node_mut(v) {
                node.order = Some(i);
            }
        }
    }
}

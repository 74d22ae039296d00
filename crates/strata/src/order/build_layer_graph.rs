//! Per-rank graphs for the ordering sweeps.

use super::{LayerGraph, LayerGraphLabel, LayerNode};
use crate::graphlib::{Graph, GraphOptions};
use crate::{LayoutGraph, Result};
use rustc_hash::FxHashMap;

/// Which neighbors a layer is sorted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    /// Predecessors on the rank above (downward sweep).
    InEdges,
    /// Successors on the rank below (upward sweep).
    OutEdges,
}

/// Builds the layer graph of `rank` from `nodes`, the candidates living on that rank.
///
/// The result holds every node on the rank, the clusters spanning it (with that rank's border
/// nodes), and the neighbors selected by `relationship`. Edges always point from the neighbor
/// to the rank's node and carry the summed weight of the parallel edges they replace. Nodes
/// without a parent hang off a fresh root stored in the graph label.
pub fn build_layer_graph(
    g: &LayoutGraph,
    rank: i32,
    relationship: Relationship,
    nodes: &[String],
) -> Result<LayerGraph> {
    let root = unique_root(g);
    let mut result: LayerGraph = Graph::new(GraphOptions::compound());
    result.set_graph(LayerGraphLabel { root: root.clone() });

    for v in nodes {
        let Some(node) = g.node(v) else {
            continue;
        };
        let on_rank = match (&node.cluster, node.rank) {
            (Some(c), _) if g.has_children(v) => c.min_rank <= rank && rank <= c.max_rank,
            (_, Some(r)) => r == rank,
            _ => false,
        };
        if !on_rank {
            continue;
        }

        let mut label = LayerNode {
            order: node.order,
            ..Default::default()
        };
        if g.has_children(v) {
            if let Some(c) = &node.cluster {
                let border = |side: &[Option<String>]| {
                    usize::try_from(rank)
                        .ok()
                        .and_then(|r| side.get(r).cloned().flatten())
                };
                label.border_left = border(&c.border_left);
                label.border_right = border(&c.border_right);
            }
        }
        result.set_node(v.clone(), label);
        result.set_parent(v.clone(), g.parent(v).unwrap_or(root.as_str()))?;

        let edges = match relationship {
            Relationship::InEdges => g.in_edges(v, None),
            Relationship::OutEdges => g.out_edges(v, None),
        };
        for e in edges {
            let u = if e.v == *v { &e.w } else { &e.v };
            let weight = g.edge_by_key(&e).map(|l| l.weight).unwrap_or(0.0);
            if !result.has_node(u) {
                let order = g.node(u).and_then(|n| n.order);
                result.set_node(
                    u.clone(),
                    LayerNode {
                        order,
                        ..Default::default()
                    },
                );
            }
            let prior = result.edge(u, v, None).copied().unwrap_or(0.0);
            result.set_edge_with_label(u.clone(), v.clone(), prior + weight);
        }
    }

    Ok(result)
}

/// Builds the layer graphs for `ranks`, in the given order.
pub fn build_layer_graphs(
    g: &LayoutGraph,
    ranks: impl IntoIterator<Item = i32>,
    relationship: Relationship,
) -> Result<Vec<LayerGraph>> {
    let mut by_rank: FxHashMap<i32, Vec<String>> = FxHashMap::default();
    for (v, node) in g.node_labels() {
        match (&node.cluster, node.rank) {
            (Some(c), _) if g.has_children(v) => {
                for r in c.min_rank..=c.max_rank {
                    by_rank.entry(r).or_default().push(v.to_string());
                }
            }
            (_, Some(r)) => by_rank.entry(r).or_default().push(v.to_string()),
            _ => {}
        }
    }

    ranks
        .into_iter()
        .map(|rank| {
            let nodes = by_rank.get(&rank).map(Vec::as_slice).unwrap_or(&[]);
            build_layer_graph(g, rank, relationship, nodes)
        })
        .collect()
}

fn unique_root(g: &LayoutGraph) -> String {
    let mut n = g.node_ix_bound();
    loop {
        let id = format!("_root{n}");
        if !g.has_node(&id) {
            return id;
        }
        n += 1;
    }
}

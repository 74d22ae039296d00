//! Coordinate assignment for a ranked, ordered graph in top-to-bottom orientation.
//!
//! `y` comes from stacking the ranks, each as tall as its tallest node plus `ranksep`. `x` comes
//! from the Brandes-Köpf heuristic in [`bk`]. Cluster nodes carry no rank, so they never enter the
//! layering; their extent is recovered from the border nodes later.

pub mod bk;

use crate::util::build_layer_matrix;
use crate::LayoutGraph;

pub fn position(g: &mut LayoutGraph) {
    let layering = build_layer_matrix(g);
    position_y(g, &layering);
    for (v, x) in bk::position_x(g, &layering) {
        if let Some(node) = g.node_mut(&v) {
            node.x = x;
        }
    }
}

fn position_y(g: &mut LayoutGraph, layering: &[Vec<String>]) {
    let ranksep = g.graph().ranksep;
    let mut prev_y = 0.0;
    for layer in layering {
        let max_height = layer
            .iter()
            .filter_map(|v| g.node(v))
            .map(|n| n.height)
            .fold(0.0, f64::max);
        for v in layer {
            if let Some(node) = g.node_mut(v) {
                node.y = prev_y + max_height / 2.0;
            }
        }
        prev_y += max_height + ranksep;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphlib::{Graph, GraphOptions};
    use crate::{GraphLabel, NodeLabel};

    fn graph() -> LayoutGraph {
        let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
        g.set_graph(GraphLabel {
            ranksep: 40.0,
            nodesep: 30.0,
            ..Default::default()
        });
        g
    }

    fn node(width: f64, height: f64, rank: i32, order: usize) -> NodeLabel {
        NodeLabel {
            width,
            height,
            rank: Some(rank),
            order: Some(order),
            ..Default::default()
        }
    }

    #[test]
    fn stacks_ranks_by_tallest_node() {
        let mut g = graph();
        g.set_node("a", node(10.0, 20.0, 0, 0));
        g.set_node("b", node(10.0, 60.0, 0, 1));
        g.set_node("c", node(10.0, 10.0, 1, 0));

        position(&mut g);
        assert_eq!(g.node("a").unwrap().y, 30.0);
        assert_eq!(g.node("b").unwrap().y, 30.0);
        assert_eq!(g.node("c").unwrap().y, 60.0 + 40.0 + 5.0);
    }

    #[test]
    fn separates_neighbors_by_nodesep() {
        let mut g = graph();
        g.set_node("a", node(50.0, 10.0, 0, 0));
        g.set_node("b", node(70.0, 10.0, 0, 1));

        position(&mut g);
        let (a, b) = (g.node("a").unwrap().x, g.node("b").unwrap().x);
        assert_eq!(b - a, 25.0 + 30.0 + 35.0);
    }
}

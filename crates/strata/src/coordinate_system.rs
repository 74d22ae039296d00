//! Maps the canonical top-to-bottom layout onto the configured [`RankDir`](crate::RankDir).
//!
//! [`adjust`] runs before positioning and [`undo`] after it; the stages in between only ever see
//! a top-to-bottom graph.

use crate::{EdgeLabel, LayoutGraph, NodeLabel, Point};

pub fn adjust(g: &mut LayoutGraph) {
    if g.graph().rankdir.is_horizontal() {
        swap_width_height(g);
    }
}

pub fn undo(g: &mut LayoutGraph) {
    let rankdir = g.graph().rankdir;
    if matches!(rankdir, crate::RankDir::BT | crate::RankDir::RL) {
        reverse_y(g);
    }
    if rankdir.is_horizontal() {
        swap_xy(g);
        swap_width_height(g);
    }
}

fn swap_width_height(g: &mut LayoutGraph) {
    for (_, node) in g.node_labels_mut() {
        std::mem::swap(&mut node.width, &mut node.height);
    }
    for (_, edge) in g.edge_labels_mut() {
        std::mem::swap(&mut edge.width, &mut edge.height);
    }
}

fn reverse_y(g: &mut LayoutGraph) {
    for (_, node) in g.node_labels_mut() {
        node.y = -node.y;
    }
    for (_, edge) in g.edge_labels_mut() {
        for p in &mut edge.points {
            p.y = -p.y;
        }
        if let Some(y) = edge.y.as_mut() {
            *y = -*y;
        }
    }
}

fn swap_xy(g: &mut LayoutGraph) {
    fn swap_node(node: &mut NodeLabel) {
        std::mem::swap(&mut node.x, &mut node.y);
    }
    fn swap_edge(edge: &mut EdgeLabel) {
        for p in &mut edge.points {
            *p = Point::new(p.y, p.x);
        }
        if let (Some(x), Some(y)) = (edge.x, edge.y) {
            edge.x = Some(y);
            edge.y = Some(x);
        }
    }

    for (_, node) in g.node_labels_mut() {
        swap_node(node);
    }
    for (_, edge) in g.edge_labels_mut() {
        swap_edge(edge);
    }
}

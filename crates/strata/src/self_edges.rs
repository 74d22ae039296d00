//! Self-loops bypass ranking and ordering.
//!
//! [`remove`] parks each loop on its node. After ordering, [`insert`] places a dummy right of the
//! node for every parked loop so positioning reserves room for it, and [`position`] turns each
//! dummy back into the loop edge with a small five-point path.

use crate::util::{add_dummy_node, build_layer_matrix};
use crate::{LayoutGraph, NodeKind, NodeLabel, Point, SelfEdge};

pub fn remove(g: &mut LayoutGraph) {
    for e in g.edge_keys() {
        if !e.is_self_loop() {
            continue;
        }
        let Some(label) = g.edge_by_key(&e).cloned() else {
            continue;
        };
        g.remove_edge_key(&e);
        if let Some(node) = g.node_mut(&e.v) {
            node.self_edges.push(SelfEdge { edge: e, label });
        }
    }
}

pub fn insert(g: &mut LayoutGraph) {
    for layer in build_layer_matrix(g) {
        let mut order_shift = 0usize;
        for (i, v) in layer.iter().enumerate() {
            let Some(node) = g.node_mut(v) else {
                continue;
            };
            node.order = Some(i + order_shift);
            let rank = node.rank;
            let parked = std::mem::take(&mut node.self_edges);
            for self_edge in parked {
                order_shift += 1;
                let label = NodeLabel {
                    width: self_edge.label.width,
                    height: self_edge.label.height,
                    rank,
                    order: Some(i + order_shift),
                    kind: NodeKind::SelfEdge(self_edge),
                    ..Default::default()
                };
                add_dummy_node(g, label, "_se");
            }
        }
    }
}

pub fn position(g: &mut LayoutGraph) {
    let dummies: Vec<String> = g
        .node_labels()
        .filter(|(_, n)| matches!(n.kind, NodeKind::SelfEdge(_)))
        .map(|(v, _)| v.to_string())
        .collect();

    for v in dummies {
        let Some(node) = g.node(&v).cloned() else {
            continue;
        };
        let NodeKind::SelfEdge(SelfEdge { edge, mut label }) = node.kind else {
            continue;
        };
        let Some(owner) = g.node(&edge.v) else {
            continue;
        };

        let x = owner.x + owner.width / 2.0;
        let y = owner.y;
        let dx = node.x - x;
        let dy = owner.height / 2.0;
        label.points = vec![
            Point::new(x + 2.0 * dx / 3.0, y - dy),
            Point::new(x + 5.0 * dx / 6.0, y - dy),
            Point::new(x + dx, y),
            Point::new(x + 5.0 * dx / 6.0, y + dy),
            Point::new(x + 2.0 * dx / 3.0, y + dy),
        ];
        label.x = Some(node.x);
        label.y = Some(node.y);

        g.remove_node(&v);
        g.set_edge_key(edge, label);
    }
}

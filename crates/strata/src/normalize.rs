//! Long edge normalization.
//!
//! [`run`] replaces every edge spanning more than one rank with a chain of dummy nodes, one per
//! intermediate rank, so that each remaining edge connects adjacent ranks. The dummy on the
//! edge's `label_rank` takes the label's size so ordering and positioning reserve room for it.
//! [`undo`] collapses the chains again, turning the dummies' positions into waypoints.

use crate::util::add_dummy_node;
use crate::{EdgeDummy, EdgeLabel, LayoutGraph, NodeKind, NodeLabel, Point};

pub fn run(g: &mut LayoutGraph) {
    g.graph_mut().dummy_chains.clear();
    for e in g.edge_keys() {
        normalize_edge(g, e);
    }
}

fn normalize_edge(g: &mut LayoutGraph, e: crate::graphlib::EdgeKey) {
    let rank_of = |g: &LayoutGraph, v: &str| g.node(v).and_then(|n| n.rank);
    let (Some(v_rank), Some(w_rank)) = (rank_of(g, &e.v), rank_of(g, &e.w)) else {
        return;
    };
    if w_rank <= v_rank + 1 {
        return;
    }
    let Some(mut edge_label) = g.edge_by_key(&e).cloned() else {
        return;
    };
    g.remove_edge_key(&e);
    edge_label.points.clear();

    let weight = edge_label.weight;
    let label_rank = edge_label.label_rank;
    let mut v = e.v.clone();
    for (i, rank) in (v_rank + 1..w_rank).enumerate() {
        let dummy = EdgeDummy {
            edge: e.clone(),
            label: Box::new(edge_label.clone()),
        };
        let mut attrs = NodeLabel::dummy(NodeKind::Edge(dummy)).with_rank(rank);
        if label_rank == Some(rank) {
            attrs.width = edge_label.width;
            attrs.height = edge_label.height;
            if let NodeKind::Edge(d) = std::mem::take(&mut attrs.kind) {
                attrs.kind = NodeKind::EdgeLabel(d);
            }
        }
        let id = add_dummy_node(g, attrs, "_d");
        g.set_edge_named(v, id.clone(), e.name.clone(), Some(EdgeLabel::weighted(weight)));
        if i == 0 {
            g.graph_mut().dummy_chains.push(id.clone());
        }
        v = id;
    }
    g.set_edge_named(v, e.w.clone(), e.name.clone(), Some(EdgeLabel::weighted(weight)));
}

/// Restores the original long edges, accumulating each chain's dummy positions as `points`.
pub fn undo(g: &mut LayoutGraph) {
    let chains = std::mem::take(&mut g.graph_mut().dummy_chains);
    for start in chains {
        let Some(head) = g.node(&start).and_then(|n| n.kind.edge_dummy()) else {
            continue;
        };
        let edge = head.edge.clone();
        let mut label = (*head.label).clone();

        let mut v = start;
        loop {
            let Some(node) = g.node(&v) else {
                break;
            };
            if node.kind.edge_dummy().is_none() {
                break;
            }
            label.points.push(Point::new(node.x, node.y));
            if matches!(node.kind, NodeKind::EdgeLabel(_)) {
                label.x = Some(node.x);
                label.y = Some(node.y);
                label.width = node.width;
                label.height = node.height;
            }
            let next = g.successors(&v).first().map(|w| w.to_string());
            g.remove_node(&v);
            match next {
                Some(w) => v = w,
                None => break,
            }
        }
        g.set_edge_key(edge, label);
    }
}

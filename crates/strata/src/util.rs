//! Helpers shared by several layout stages.

use crate::graphlib::{Graph, GraphOptions};
use crate::{EdgeLabel, Error, LayoutGraph, NodeLabel, Point, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl From<&NodeLabel> for Rect {
    fn from(n: &NodeLabel) -> Self {
        Self {
            x: n.x,
            y: n.y,
            width: n.width,
            height: n.height,
        }
    }
}

/// Inserts `label` under a fresh id starting with `prefix` and returns the id.
pub fn add_dummy_node(g: &mut LayoutGraph, label: NodeLabel, prefix: &str) -> String {
    let mut n = g.node_ix_bound();
    let mut id = format!("{prefix}{n}");
    while g.has_node(&id) {
        n += 1;
        id = format!("{prefix}{n}");
    }
    g.set_node(id.clone(), label);
    id
}

/// Collapses parallel edges into one: weights are summed, the largest `minlen` wins.
pub fn simplify<N, G>(g: &Graph<N, EdgeLabel, G>) -> Graph<N, EdgeLabel, G>
where
    N: Default + Clone + 'static,
    G: Default + Clone,
{
    let mut simplified: Graph<N, EdgeLabel, G> = Graph::new(GraphOptions::default());
    simplified.set_graph(g.graph().clone());
    for (v, label) in g.node_labels() {
        simplified.set_node(v, label.clone());
    }
    for (key, label) in g.edge_labels() {
        let (weight, minlen) = simplified
            .edge(&key.v, &key.w, None)
            .map(|e| (e.weight, e.minlen))
            .unwrap_or((0.0, 1));
        simplified.set_edge_with_label(
            key.v.clone(),
            key.w.clone(),
            EdgeLabel {
                weight: weight + label.weight,
                minlen: minlen.max(label.minlen),
                ..Default::default()
            },
        );
    }
    simplified
}

/// Copy of `g` without cluster nodes and without hierarchy.
pub fn as_non_compound_graph<N, E, G>(g: &Graph<N, E, G>) -> Graph<N, E, G>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    let mut out: Graph<N, E, G> = Graph::new(GraphOptions {
        multigraph: g.is_multigraph(),
        ..Default::default()
    });
    out.set_graph(g.graph().clone());
    for (v, label) in g.node_labels() {
        if !g.has_children(v) {
            out.set_node(v, label.clone());
        }
    }
    for (key, label) in g.edge_labels() {
        out.set_edge_key(key.clone(), label.clone());
    }
    out
}

/// Point where the segment from the centre of `rect` towards `point` leaves the rectangle.
pub fn intersect_rect(rect: Rect, point: Point) -> Result<Point> {
    let dx = point.x - rect.x;
    let dy = point.y - rect.y;
    if dx == 0.0 && dy == 0.0 {
        return Err(Error::DegenerateIntersection {
            x: rect.x,
            y: rect.y,
        });
    }

    let mut w = rect.width / 2.0;
    let mut h = rect.height / 2.0;
    let (sx, sy) = if dy.abs() * w > dx.abs() * h {
        if dy < 0.0 {
            h = -h;
        }
        (h * dx / dy, h)
    } else {
        if dx < 0.0 {
            w = -w;
        }
        (w, w * dy / dx)
    };

    Ok(Point::new(rect.x + sx, rect.y + sy))
}

pub fn max_rank(g: &LayoutGraph) -> Option<i32> {
    g.node_labels().filter_map(|(_, n)| n.rank).max()
}

/// Node ids grouped by rank, each layer sorted by `order`.
pub fn build_layer_matrix(g: &LayoutGraph) -> Vec<Vec<String>> {
    let Some(max) = max_rank(g) else {
        return Vec::new();
    };
    let mut layers: Vec<Vec<(usize, &str)>> = vec![Vec::new(); (max.max(-1) + 1) as usize];
    for (v, node) in g.node_labels() {
        let Some(rank) = node.rank else {
            continue;
        };
        if rank < 0 {
            continue;
        }
        layers[rank as usize].push((node.order.unwrap_or(usize::MAX), v));
    }
    layers
        .into_iter()
        .map(|mut layer| {
            layer.sort_by_key(|(order, _)| *order);
            layer.into_iter().map(|(_, v)| v.to_string()).collect()
        })
        .collect()
}

/// Shifts ranks so the smallest is zero.
pub fn normalize_ranks(g: &mut LayoutGraph) {
    let Some(min) = g.node_labels().filter_map(|(_, n)| n.rank).min() else {
        return;
    };
    for (_, node) in g.node_labels_mut() {
        if let Some(rank) = node.rank.as_mut() {
            *rank -= min;
        }
    }
}

/// Drops empty ranks, except those on multiples of `node_rank_factor`, which separate nesting
/// levels.
pub fn remove_empty_ranks(g: &mut LayoutGraph) {
    let Some(offset) = g.node_labels().filter_map(|(_, n)| n.rank).min() else {
        return;
    };
    let factor = g.graph().node_rank_factor;

    let mut layers: Vec<Vec<String>> = Vec::new();
    for (v, node) in g.node_labels() {
        let Some(rank) = node.rank else {
            continue;
        };
        let ix = (rank - offset) as usize;
        if layers.len() <= ix {
            layers.resize_with(ix + 1, Vec::new);
        }
        layers[ix].push(v.to_string());
    }

    let mut delta = 0i32;
    for (i, vs) in layers.iter().enumerate() {
        if vs.is_empty() {
            if factor == 0 || i % factor != 0 {
                delta -= 1;
            }
        } else if delta != 0 {
            for v in vs {
                if let Some(rank) = g.node_mut(v).and_then(|n| n.rank.as_mut()) {
                    *rank += delta;
                }
            }
        }
    }
}

/// Records each cluster's rank span from its top and bottom borders.
pub fn assign_rank_min_max(g: &mut LayoutGraph) {
    let spans: Vec<(String, i32, i32)> = g
        .node_labels()
        .filter_map(|(v, n)| {
            let cluster = n.cluster.as_ref()?;
            let top = g.node(cluster.border_top.as_deref()?)?.rank?;
            let bottom = g.node(cluster.border_bottom.as_deref()?)?.rank?;
            Some((v.to_string(), top, bottom))
        })
        .collect();

    let mut max_rank = 0;
    for (v, min_rank, max) in spans {
        if let Some(cluster) = g.node_mut(&v).and_then(|n| n.cluster.as_mut()) {
            cluster.min_rank = min_rank;
            cluster.max_rank = max;
        }
        max_rank = max_rank.max(max);
    }
    g.graph_mut().max_rank = max_rank;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GraphLabel;

    fn compound() -> LayoutGraph {
        let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
        g.set_graph(GraphLabel::default());
        g
    }

    #[test]
    fn simplify_merges_parallel_edges() {
        let mut g: LayoutGraph = Graph::new(GraphOptions::multigraph());
        g.set_edge_named("a", "b", Some("x"), Some(EdgeLabel::weighted(2.0).with_minlen(1)));
        g.set_edge_named("a", "b", Some("y"), Some(EdgeLabel::weighted(3.0).with_minlen(4)));

        let s = simplify(&g);
        assert!(!s.is_multigraph());
        let e = s.edge("a", "b", None).unwrap();
        assert_eq!(e.weight, 5.0);
        assert_eq!(e.minlen, 4);
    }

    #[test]
    fn as_non_compound_graph_drops_clusters() {
        let mut g = compound();
        g.set_parent("a", "sg").unwrap();
        g.set_edge("a", "b");

        let nc = as_non_compound_graph(&g);
        assert!(!nc.is_compound());
        assert_eq!(nc.node_ids(), vec!["a", "b"]);
        assert_eq!(nc.edge_count(), 1);
    }

    #[test]
    fn intersect_rect_hits_each_side() {
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 4.0,
        };
        assert_eq!(intersect_rect(rect, Point::new(100.0, 0.0)).unwrap(), Point::new(5.0, 0.0));
        assert_eq!(intersect_rect(rect, Point::new(-100.0, 0.0)).unwrap(), Point::new(-5.0, 0.0));
        assert_eq!(intersect_rect(rect, Point::new(0.0, 50.0)).unwrap(), Point::new(0.0, 2.0));
        assert_eq!(intersect_rect(rect, Point::new(0.0, -50.0)).unwrap(), Point::new(0.0, -2.0));
    }

    #[test]
    fn intersect_rect_rejects_the_centre() {
        let rect = Rect {
            x: 3.0,
            y: 4.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(matches!(
            intersect_rect(rect, Point::new(3.0, 4.0)),
            Err(Error::DegenerateIntersection { .. })
        ));
    }

    #[test]
    fn build_layer_matrix_orders_each_rank() {
        let mut g = compound();
        g.set_node("a", NodeLabel { rank: Some(0), order: Some(1), ..Default::default() });
        g.set_node("b", NodeLabel { rank: Some(0), order: Some(0), ..Default::default() });
        g.set_node("c", NodeLabel { rank: Some(1), order: Some(0), ..Default::default() });
        g.set_node("cluster", NodeLabel::default());

        assert_eq!(
            build_layer_matrix(&g),
            vec![vec!["b".to_string(), "a".into()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn normalize_ranks_shifts_to_zero_and_skips_unranked() {
        let mut g = compound();
        g.set_node("a", NodeLabel::default().with_rank(-3));
        g.set_node("b", NodeLabel::default().with_rank(2));
        g.set_node("sg", NodeLabel::default());

        normalize_ranks(&mut g);
        assert_eq!(g.node("a").unwrap().rank, Some(0));
        assert_eq!(g.node("b").unwrap().rank, Some(5));
        assert_eq!(g.node("sg").unwrap().rank, None);
    }

    #[test]
    fn remove_empty_ranks_keeps_factor_multiples() {
        let mut g = compound();
        g.graph_mut().node_rank_factor = 4;
        g.set_node("a", NodeLabel::default().with_rank(0));
        g.set_node("b", NodeLabel::default().with_rank(6));

        remove_empty_ranks(&mut g);
        // ranks 1, 2, 3 and 5 go; rank 4 stays.
        assert_eq!(g.node("b").unwrap().rank, Some(2));
    }

    #[test]
    fn add_dummy_node_never_reuses_ids() {
        let mut g = compound();
        g.set_node("_d0", NodeLabel::default());
        let a = add_dummy_node(&mut g, NodeLabel::default(), "_d");
        let b = add_dummy_node(&mut g, NodeLabel::default(), "_d");
        assert_ne!(a, "_d0");
        assert_ne!(a, b);
        assert_eq!(g.node_count(), 3);
    }
}

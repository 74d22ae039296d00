//! The layout driver.
//!
//! [`layout`] copies the caller's graph into a private working graph, runs the stages in order
//! and writes the results back. Working on a copy leaves the caller's graph free of dummy nodes,
//! border nodes and renamed edges no matter how the run ends.

use crate::graphlib::{Graph, GraphOptions};
use crate::util::{
    Rect, as_non_compound_graph, assign_rank_min_max, intersect_rect, normalize_ranks,
    remove_empty_ranks,
};
use crate::{
    EdgeLabel, Error, LabelPos, LayoutGraph, NodeKind, NodeLabel, Point, Ranker, Result, acyclic,
    add_border_segments, coordinate_system, nesting_graph, normalize, order,
    parent_dummy_chains, position, rank, self_edges,
};
use tracing::debug_span;

/// Lays out `g` in place.
///
/// Reads `width`/`height` (and `rank` when the ranker is [`crate::Ranker::None`]) from nodes,
/// `minlen`, `weight`, `width`, `height`, `labelpos` and `labeloffset` from edges, and the
/// graph label's configuration. Writes node `x`/`y`/`rank`, cluster `width`/`height`, edge
/// `points` and label `x`/`y`, and the graph's `width`/`height`.
pub fn layout(g: &mut LayoutGraph) -> Result<()> {
    let _span = debug_span!("layout", nodes = g.node_count(), edges = g.edge_count()).entered();
    let mut layout_graph = build_layout_graph(g)?;
    run_layout(&mut layout_graph)?;
    update_input_graph(g, &layout_graph);
    Ok(())
}

fn stage<T>(name: &'static str, f: impl FnOnce() -> T) -> T {
    let _span = debug_span!("stage", name).entered();
    f()
}

fn run_layout(g: &mut LayoutGraph) -> Result<()> {
    stage("make_space_for_edge_labels", || make_space_for_edge_labels(g));
    stage("remove_self_edges", || self_edges::remove(g));
    stage("acyclic", || acyclic::run(g));
    stage("nesting_graph", || nesting_graph::run(g))?;
    stage("rank", || rank_non_compound(g));
    stage("inject_edge_label_proxies", || inject_edge_label_proxies(g));
    stage("remove_empty_ranks", || remove_empty_ranks(g));
    stage("nesting_graph_cleanup", || nesting_graph::cleanup(g));
    stage("normalize_ranks", || normalize_ranks(g));
    stage("assign_rank_min_max", || assign_rank_min_max(g));
    stage("remove_edge_label_proxies", || remove_edge_label_proxies(g));
    stage("normalize", || normalize::run(g));
    stage("parent_dummy_chains", || parent_dummy_chains::parent_dummy_chains(g))?;
    stage("add_border_segments", || add_border_segments::add_border_segments(g))?;
    stage("order", || order::order(g))?;
    stage("insert_self_edges", || self_edges::insert(g));
    stage("adjust_coordinate_system", || coordinate_system::adjust(g));
    stage("position", || position::position(g));
    stage("position_self_edges", || self_edges::position(g));
    stage("remove_border_nodes", || remove_border_nodes(g));
    stage("denormalize", || normalize::undo(g));
    stage("fixup_edge_label_coords", || fixup_edge_label_coords(g));
    stage("undo_coordinate_system", || coordinate_system::undo(g));
    stage("translate_graph", || translate_graph(g));
    stage("assign_node_intersects", || assign_node_intersects(g))?;
    stage("reverse_points", || reverse_points_for_reversed_edges(g));
    stage("acyclic_undo", || acyclic::undo(g));
    Ok(())
}

/// Builds the working graph: a compound multigraph holding only the attributes layout reads.
pub fn build_layout_graph(input: &LayoutGraph) -> Result<LayoutGraph> {
    let mut g: LayoutGraph = Graph::new(GraphOptions::compound());
    let mut config = input.graph().clone();
    config.width = 0.0;
    config.height = 0.0;
    config.dummy_chains.clear();
    config.nesting_root = None;
    config.node_rank_factor = 0;
    config.max_rank = 0;
    g.set_graph(config);

    for (v, node) in input.node_labels() {
        g.set_node(
            v,
            NodeLabel {
                width: node.width,
                height: node.height,
                rank: node.rank,
                ..Default::default()
            },
        );
    }
    if input.is_compound() {
        for v in input.nodes() {
            if let Some(parent) = input.parent(v) {
                g.set_parent(v, parent)?;
            }
        }
    }

    for (key, edge) in input.edge_labels() {
        g.set_edge_key(
            key.clone(),
            EdgeLabel {
                minlen: edge.minlen,
                weight: edge.weight,
                width: edge.width,
                height: edge.height,
                labeloffset: edge.labeloffset,
                labelpos: edge.labelpos,
                ..Default::default()
            },
        );
    }
    Ok(g)
}

/// Copies the results of a finished layout back onto the caller's graph.
///
/// Working ranks are twice the caller's scale because every `minlen` was doubled to make room
/// for edge labels. The rank written back halves them again, measured from the topmost leaf, so
/// `rank(w) - rank(v) >= minlen` holds for every input edge. With [`Ranker::None`] the caller's
/// ranks are left as given.
pub fn update_input_graph(input: &mut LayoutGraph, layout_graph: &LayoutGraph) {
    let keep_ranks = layout_graph.graph().ranker == Ranker::None;
    let top = input
        .nodes()
        .filter(|v| !layout_graph.has_children(v))
        .filter_map(|v| layout_graph.node(v).and_then(|n| n.rank))
        .min()
        .unwrap_or(0);

    for (v, node) in input.node_labels_mut() {
        let Some(laid) = layout_graph.node(v) else {
            continue;
        };
        node.x = laid.x;
        node.y = laid.y;
        if !keep_ranks {
            node.rank = laid.rank.map(|r| (r - top).div_euclid(2));
        }
        if layout_graph.has_children(v) {
            node.width = laid.width;
            node.height = laid.height;
        }
    }

    for (key, edge) in input.edge_labels_mut() {
        let Some(laid) = layout_graph.edge_by_key(key) else {
            continue;
        };
        edge.points = laid.points.clone();
        edge.x = laid.x;
        edge.y = laid.y;
    }

    let (width, height) = (layout_graph.graph().width, layout_graph.graph().height);
    let label = input.graph_mut();
    label.width = width;
    label.height = height;
}

/// Halves `ranksep` and doubles every `minlen`, leaving a spare rank between connected nodes
/// where an edge label can sit. Side labels also grow by their offset.
fn make_space_for_edge_labels(g: &mut LayoutGraph) {
    g.graph_mut().ranksep /= 2.0;
    let horizontal = g.graph().rankdir.is_horizontal();
    for (_, edge) in g.edge_labels_mut() {
        edge.minlen *= 2;
        if edge.labelpos != LabelPos::C {
            if horizontal {
                edge.height += edge.labeloffset;
            } else {
                edge.width += edge.labeloffset;
            }
        }
    }
}

/// Ranks the leaves of `g`; clusters have no edges of their own and stay unranked.
fn rank_non_compound(g: &mut LayoutGraph) {
    let mut flat = as_non_compound_graph(g);
    rank::rank(&mut flat);
    for (v, node) in flat.node_labels() {
        if let Some(target) = g.node_mut(v) {
            target.rank = node.rank;
        }
    }
}

/// Adds a node midway along every labelled edge so that rank cleanup keeps a rank for the label.
fn inject_edge_label_proxies(g: &mut LayoutGraph) {
    for e in g.edge_keys() {
        let Some(edge) = g.edge_by_key(&e) else {
            continue;
        };
        if edge.width == 0.0 || edge.height == 0.0 {
            continue;
        }
        let rank_of = |v: &str| g.node(v).and_then(|n| n.rank);
        let (Some(v_rank), Some(w_rank)) = (rank_of(&e.v), rank_of(&e.w)) else {
            continue;
        };
        let rank = v_rank + (w_rank - v_rank).div_euclid(2);
        crate::util::add_dummy_node(g, NodeLabel::dummy(NodeKind::EdgeProxy(e)).with_rank(rank), "_ep");
    }
}

fn remove_edge_label_proxies(g: &mut LayoutGraph) {
    let proxies: Vec<(String, crate::graphlib::EdgeKey, Option<i32>)> = g
        .node_labels()
        .filter_map(|(v, n)| match &n.kind {
            NodeKind::EdgeProxy(e) => Some((v.to_string(), e.clone(), n.rank)),
            _ => None,
        })
        .collect();
    for (v, e, rank) in proxies {
        if let Some(edge) = g.edge_mut_by_key(&e) {
            edge.label_rank = rank;
        }
        g.remove_node(&v);
    }
}

/// Sizes every cluster from its positioned border nodes, then drops all border nodes.
fn remove_border_nodes(g: &mut LayoutGraph) {
    let clusters: Vec<String> = g
        .nodes()
        .filter(|v| g.has_children(v))
        .map(str::to_string)
        .collect();

    for v in clusters {
        let Some(cluster) = g.node(&v).and_then(|n| n.cluster.as_ref()) else {
            continue;
        };
        let last = |side: &[Option<String>]| side.iter().rev().flatten().next().cloned();
        let point = |id: Option<String>| {
            id.as_deref()
                .and_then(|id| g.node(id))
                .map(|n| Point::new(n.x, n.y))
        };
        let (Some(t), Some(b), Some(l), Some(r)) = (
            point(cluster.border_top.clone()),
            point(cluster.border_bottom.clone()),
            point(last(&cluster.border_left)),
            point(last(&cluster.border_right)),
        ) else {
            continue;
        };

        if let Some(node) = g.node_mut(&v) {
            node.width = (r.x - l.x).abs();
            node.height = (b.y - t.y).abs();
            node.x = l.x + node.width / 2.0;
            node.y = t.y + node.height / 2.0;
        }
    }

    let borders: Vec<String> = g
        .node_labels()
        .filter(|(_, n)| n.kind.is_border())
        .map(|(v, _)| v.to_string())
        .collect();
    for v in borders {
        g.remove_node(&v);
    }
}

/// Moves side labels off the edge line by their offset and removes the offset from their width.
fn fixup_edge_label_coords(g: &mut LayoutGraph) {
    for (_, edge) in g.edge_labels_mut() {
        let Some(x) = edge.x.as_mut() else {
            continue;
        };
        match edge.labelpos {
            LabelPos::L => {
                edge.width -= edge.labeloffset;
                *x -= edge.width / 2.0 + edge.labeloffset;
            }
            LabelPos::R => {
                edge.width -= edge.labeloffset;
                *x += edge.width / 2.0 + edge.labeloffset;
            }
            LabelPos::C => {}
        }
    }
}

/// Shifts the drawing so its top-left corner sits at the margins and records the total size.
fn translate_graph(g: &mut LayoutGraph) {
    let mut min_x = f64::INFINITY;
    let mut max_x: f64 = 0.0;
    let mut min_y = f64::INFINITY;
    let mut max_y: f64 = 0.0;
    let mut extremes = |x: f64, y: f64, w: f64, h: f64| {
        min_x = min_x.min(x - w / 2.0);
        max_x = max_x.max(x + w / 2.0);
        min_y = min_y.min(y - h / 2.0);
        max_y = max_y.max(y + h / 2.0);
    };

    for (_, n) in g.node_labels() {
        extremes(n.x, n.y, n.width, n.height);
    }
    for (_, e) in g.edge_labels() {
        if let (Some(x), Some(y)) = (e.x, e.y) {
            extremes(x, y, e.width, e.height);
        }
    }
    if !min_x.is_finite() {
        min_x = 0.0;
    }
    if !min_y.is_finite() {
        min_y = 0.0;
    }

    let (marginx, marginy) = (g.graph().marginx, g.graph().marginy);
    min_x -= marginx;
    min_y -= marginy;

    for (_, n) in g.node_labels_mut() {
        n.x -= min_x;
        n.y -= min_y;
    }
    for (_, e) in g.edge_labels_mut() {
        for p in &mut e.points {
            p.x -= min_x;
            p.y -= min_y;
        }
        if let Some(x) = e.x.as_mut() {
            *x -= min_x;
        }
        if let Some(y) = e.y.as_mut() {
            *y -= min_y;
        }
    }

    let label = g.graph_mut();
    label.width = max_x - min_x + marginx;
    label.height = max_y - min_y + marginy;
}

/// Clips every edge to its endpoints' boxes by adding the boundary crossings as first and last
/// points.
fn assign_node_intersects(g: &mut LayoutGraph) -> Result<()> {
    for e in g.edge_keys() {
        let node_rect = |id: &str| {
            g.node(id)
                .map(Rect::from)
                .ok_or_else(|| Error::MissingNode { id: id.to_string() })
        };
        let v = node_rect(&e.v)?;
        let w = node_rect(&e.w)?;
        let Some(edge) = g.edge_mut_by_key(&e) else {
            continue;
        };

        let (p1, p2) = match (edge.points.first(), edge.points.last()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => (Point::new(w.x, w.y), Point::new(v.x, v.y)),
        };
        edge.points.insert(0, intersect_rect(v, p1)?);
        edge.points.push(intersect_rect(w, p2)?);
    }
    Ok(())
}

fn reverse_points_for_reversed_edges(g: &mut LayoutGraph) {
    for (_, edge) in g.edge_labels_mut() {
        if edge.reversed {
            edge.points.reverse();
        }
    }
}

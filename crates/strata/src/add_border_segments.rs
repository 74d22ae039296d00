//! Left and right border nodes for clusters.
//!
//! For every rank a cluster spans, a `BorderLeft` and a `BorderRight` node are added and chained
//! rank to rank. Ordering keeps each cluster's content between them; once positioned, the last
//! pair gives the cluster's horizontal extent.

use crate::graphlib::GRAPH_ROOT;
use crate::util::add_dummy_node;
use crate::{EdgeLabel, LayoutGraph, NodeKind, NodeLabel, Result};

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

pub fn add_border_segments(g: &mut LayoutGraph) -> Result<()> {
    // Clusters children-first, matching a postorder walk of the hierarchy.
    let mut clusters: Vec<String> = Vec::new();
    let mut stack: Vec<(String, bool)> = g
        .children(GRAPH_ROOT)
        .into_iter()
        .rev()
        .map(|v| (v.to_string(), false))
        .collect();
    while let Some((v, expanded)) = stack.pop() {
        if expanded {
            clusters.push(v);
            continue;
        }
        let children: Vec<String> = g.children(&v).into_iter().map(str::to_string).collect();
        stack.push((v, true));
        for child in children.into_iter().rev() {
            stack.push((child, false));
        }
    }

    for v in clusters {
        let Some((min_rank, max_rank)) = g
            .node(&v)
            .and_then(|n| n.cluster.as_ref())
            .filter(|c| c.border_top.is_some())
            .map(|c| (c.min_rank, c.max_rank))
        else {
            continue;
        };
        let len = (max_rank.max(0) + 1) as usize;
        if let Some(cluster) = g.node_mut(&v).and_then(|n| n.cluster.as_mut()) {
            cluster.border_left = vec![None; len];
            cluster.border_right = vec![None; len];
        }
        for rank in min_rank..=max_rank {
            add_border_node(g, Side::Left, &v, rank)?;
            add_border_node(g, Side::Right, &v, rank)?;
        }
    }
    Ok(())
}

fn add_border_node(g: &mut LayoutGraph, side: Side, cluster_id: &str, rank: i32) -> Result<()> {
    let (kind, prefix) = match side {
        Side::Left => (NodeKind::BorderLeft, "_bl"),
        Side::Right => (NodeKind::BorderRight, "_br"),
    };
    let Ok(ix) = usize::try_from(rank) else {
        return Ok(());
    };

    let curr = add_dummy_node(g, NodeLabel::dummy(kind).with_rank(rank), prefix);
    let mut prev: Option<String> = None;
    if let Some(cluster) = g.node_mut(cluster_id).and_then(|n| n.cluster.as_mut()) {
        let slots = match side {
            Side::Left => &mut cluster.border_left,
            Side::Right => &mut cluster.border_right,
        };
        if ix > 0 {
            prev = slots.get(ix - 1).cloned().flatten();
        }
        if let Some(slot) = slots.get_mut(ix) {
            *slot = Some(curr.clone());
        }
    }
    g.set_parent(curr.clone(), cluster_id)?;
    if let Some(prev) = prev {
        g.set_edge_with_label(prev, curr, EdgeLabel::weighted(1.0));
    }
    Ok(())
}

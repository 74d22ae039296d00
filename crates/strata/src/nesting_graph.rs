//! Rank constraints for clusters.
//!
//! Every cluster gets a top and a bottom border node. Nesting edges run from the top border to
//! each child (or the child's own top border) and from each child to the bottom border, so
//! ranking places all descendants strictly between the borders. A synthetic root connects every
//! top-level node, which also makes the graph connected for the network simplex ranker.
//!
//! Edge `minlen`s are scaled by `node_rank_factor` (`2 * height + 1`, where `height` is the
//! nesting depth) so real nodes never share a rank with border nodes; the spare ranks are
//! dropped again by [`crate::util::remove_empty_ranks`].

use crate::graphlib::GRAPH_ROOT;
use crate::util::add_dummy_node;
use crate::{EdgeLabel, LayoutGraph, NodeKind, NodeLabel, Result};
use rustc_hash::FxHashMap;

pub fn run(g: &mut LayoutGraph) -> Result<()> {
    let root = add_dummy_node(g, NodeLabel::dummy(NodeKind::Root), "_root");
    let depths = tree_depths(g);
    let height = depths.values().copied().max().unwrap_or(1).saturating_sub(1);
    let node_sep = 2 * height + 1;

    g.graph_mut().nesting_root = Some(root.clone());

    for (_, edge) in g.edge_labels_mut() {
        edge.minlen *= node_sep;
    }

    let weight = g.edge_labels().map(|(_, e)| e.weight).sum::<f64>() + 1.0;

    let top_level: Vec<String> = g
        .children(GRAPH_ROOT)
        .into_iter()
        .map(str::to_string)
        .collect();
    let ctx = Ctx {
        root: &root,
        node_sep,
        weight,
        height,
        depths: &depths,
    };
    for child in top_level {
        ctx.link(g, &child)?;
    }

    g.graph_mut().node_rank_factor = node_sep;
    Ok(())
}

struct Ctx<'a> {
    root: &'a str,
    node_sep: usize,
    weight: f64,
    height: usize,
    depths: &'a FxHashMap<String, usize>,
}

impl Ctx<'_> {
    /// Creates border nodes for `start` and every cluster below it, children before parents.
    fn link(&self, g: &mut LayoutGraph, start: &str) -> Result<()> {
        // (node, children still to link, next child index)
        let mut stack: Vec<(String, Vec<String>, usize)> = Vec::new();
        self.enter(g, start, &mut stack)?;

        while let Some((v, children, i)) = stack.last_mut() {
            if let Some(child) = children.get(*i).cloned() {
                *i += 1;
                let v = v.clone();
                if self.enter(g, &child, &mut stack)? {
                    continue;
                }
                self.connect_child(g, &v, &child);
                continue;
            }

            let Some((v, children, _)) = stack.pop() else {
                break;
            };
            debug_assert!(!children.is_empty());
            if g.parent(&v).is_none() {
                let top = g
                    .node(&v)
                    .and_then(|n| n.cluster.as_ref())
                    .and_then(|c| c.border_top.clone());
                if let Some(top) = top {
                    let depth = self.depths.get(&v).copied().unwrap_or(1);
                    g.set_edge_with_label(
                        self.root,
                        top,
                        EdgeLabel {
                            weight: 0.0,
                            minlen: self.height + depth,
                            ..Default::default()
                        },
                    );
                }
            }
            if let Some((parent, _, _)) = stack.last() {
                let parent = parent.clone();
                self.connect_child(g, &parent, &v);
            }
        }
        Ok(())
    }

    /// Handles a leaf directly; for a cluster, adds its borders and pushes it onto `stack`.
    /// Returns whether `v` was pushed.
    fn enter(
        &self,
        g: &mut LayoutGraph,
        v: &str,
        stack: &mut Vec<(String, Vec<String>, usize)>,
    ) -> Result<bool> {
        let children: Vec<String> = g.children(v).into_iter().map(str::to_string).collect();
        if children.is_empty() {
            if v != self.root {
                g.set_edge_with_label(
                    self.root,
                    v,
                    EdgeLabel {
                        weight: 0.0,
                        minlen: self.node_sep,
                        ..Default::default()
                    },
                );
            }
            return Ok(false);
        }

        let top = add_dummy_node(g, NodeLabel::dummy(NodeKind::BorderTop), "_bt");
        let bottom = add_dummy_node(g, NodeLabel::dummy(NodeKind::BorderBottom), "_bb");
        g.set_parent(top.clone(), v)?;
        g.set_parent(bottom.clone(), v)?;
        if let Some(node) = g.node_mut(v) {
            let cluster = node.cluster_mut();
            cluster.border_top = Some(top);
            cluster.border_bottom = Some(bottom);
        }
        stack.push((v.to_string(), children, 0));
        Ok(true)
    }

    /// Adds the nesting edges that keep `child` between the borders of cluster `v`.
    fn connect_child(&self, g: &mut LayoutGraph, v: &str, child: &str) {
        let borders = |id: &str| {
            g.node(id)
                .and_then(|n| n.cluster.as_ref())
                .map(|c| (c.border_top.clone(), c.border_bottom.clone()))
        };
        let Some((Some(top), Some(bottom))) = borders(v) else {
            return;
        };
        let (child_top, child_bottom, child_is_cluster) = match borders(child) {
            Some((Some(t), Some(b))) => (t, b, true),
            _ => (child.to_string(), child.to_string(), false),
        };

        let this_weight = if child_is_cluster {
            self.weight
        } else {
            2.0 * self.weight
        };
        let minlen = if child_top != child_bottom {
            1
        } else {
            let depth = self.depths.get(v).copied().unwrap_or(1);
            self.height + 1 - depth.min(self.height + 1)
        };
        let nesting = EdgeLabel {
            weight: this_weight,
            minlen,
            nesting_edge: true,
            ..Default::default()
        };
        g.set_edge_with_label(top, child_top, nesting.clone());
        g.set_edge_with_label(child_bottom, bottom, nesting);
    }
}

/// Depth of every node in the cluster hierarchy; top-level nodes have depth 1.
fn tree_depths(g: &LayoutGraph) -> FxHashMap<String, usize> {
    let mut depths: FxHashMap<String, usize> = FxHashMap::default();
    let mut stack: Vec<(&str, usize)> = g.children(GRAPH_ROOT).into_iter().map(|v| (v, 1)).collect();
    while let Some((v, depth)) = stack.pop() {
        depths.insert(v.to_string(), depth);
        for child in g.children(v) {
            stack.push((child, depth + 1));
        }
    }
    depths
}

/// Removes the synthetic root and every nesting edge.
pub fn cleanup(g: &mut LayoutGraph) {
    if let Some(root) = g.graph_mut().nesting_root.take() {
        g.remove_node(&root);
    }
    let nesting: Vec<_> = g
        .edge_labels()
        .filter(|(_, e)| e.nesting_edge)
        .map(|(key, _)| key.clone())
        .collect();
    for key in nesting {
        g.remove_edge_key(&key);
    }
}

//! Tight spanning tree construction.
//!
//! Starting from the first node, the tree grows along edges with zero slack. When no tight edge
//! leaves the tree, the tree is shifted by the smallest slack of any edge crossing its boundary,
//! which makes that edge tight. The ranks stay feasible throughout.

use super::util::slack;
use crate::LayoutGraph;
use crate::graphlib::{EdgeKey, Graph, GraphOptions};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
    pub low: usize,
    pub lim: usize,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeEdge {
    pub cutvalue: f64,
}

/// Undirected spanning tree over the nodes of a ranked graph.
pub type Tree = Graph<TreeNode, TreeEdge, ()>;

/// Builds a tight spanning tree, adjusting ranks in `g` as needed.
///
/// On disconnected inputs the result is a spanning forest; each component is tightened on its
/// own.
pub fn feasible_tree(g: &mut LayoutGraph) -> Tree {
    let mut t: Tree = Graph::new(GraphOptions::undirected());
    let Some(start) = g.nodes().next().map(str::to_string) else {
        return t;
    };
    let size = g.node_count();
    t.set_node(start, TreeNode::default());

    while tight_tree(&mut t, g) < size {
        match find_min_slack_edge(&t, g) {
            Some(edge) => {
                let delta = if t.has_node(&edge.v) {
                    slack(g, &edge)
                } else {
                    -slack(g, &edge)
                };
                shift_ranks(&t, g, delta);
            }
            None => {
                // No edge reaches the rest of the graph: seed the next component.
                let next = g.nodes().find(|v| !t.has_node(v)).map(str::to_string);
                if let Some(next) = next {
                    t.set_node(next, TreeNode::default());
                }
            }
        }
    }

    t
}

/// Extends `t` along tight edges and returns its node count.
fn tight_tree(t: &mut Tree, g: &LayoutGraph) -> usize {
    let roots: Vec<String> = t.node_ids();
    for root in roots {
        let mut stack: Vec<(String, Vec<EdgeKey>, usize)> = vec![(
            root.clone(),
            g.node_edges(&root, None),
            0,
        )];
        while let Some((v, edges, i)) = stack.last_mut() {
            let Some(e) = edges.get(*i).cloned() else {
                stack.pop();
                continue;
            };
            *i += 1;
            let w = if *v == e.v { e.w.clone() } else { e.v.clone() };
            if !t.has_node(&w) && slack(g, &e) == 0 {
                let v = v.clone();
                t.set_node(w.clone(), TreeNode::default());
                t.set_edge(v, w.clone());
                let next = g.node_edges(&w, None);
                stack.push((w, next, 0));
            }
        }
    }
    t.node_count()
}

fn find_min_slack_edge(t: &Tree, g: &LayoutGraph) -> Option<EdgeKey> {
    let mut best: Option<(i32, &EdgeKey)> = None;
    for e in g.edges() {
        if t.has_node(&e.v) == t.has_node(&e.w) {
            continue;
        }
        let s = slack(g, e);
        if best.is_none_or(|(b, _)| s < b) {
            best = Some((s, e));
        }
    }
    best.map(|(_, e)| e.clone())
}

fn shift_ranks(t: &Tree, g: &mut LayoutGraph, delta: i32) {
    for v in t.nodes() {
        if let Some(rank) = g.node_mut(v).and_then(|n| n.rank.as_mut()) {
            *rank += delta;
        }
    }
}

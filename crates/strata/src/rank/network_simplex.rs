//! Network simplex ranking (Gansner et al., "A Technique for Drawing Directed Graphs").
//!
//! 1. Start from longest-path ranks and a tight spanning tree.
//! 2. Give every tree edge a cut value: the weighted count of graph edges crossing the cut the
//!    tree edge induces, signed by direction.
//! 3. While some tree edge has a negative cut value, replace it with the non-tree edge of
//!    minimal slack that reconnects the two halves, then re-rank from the tree.
//!
//! Subtree membership is answered in O(1) from `low`/`lim` postorder numbers.

use super::feasible_tree::{Tree, TreeNode, feasible_tree};
use super::util::{longest_path, slack};
use crate::graphlib::{EdgeKey, alg};
use crate::util::simplify;
use crate::LayoutGraph;
use tracing::{debug, warn};

/// Upper bound on tree exchanges. Degenerate pivots can cycle; real inputs settle far sooner.
const MAX_EXCHANGES_PER_EDGE: usize = 16;

pub fn network_simplex(g: &mut LayoutGraph) {
    let mut sg = simplify(g);
    longest_path(&mut sg);
    let mut t = feasible_tree(&mut sg);
    init_low_lim_values(&mut t, None);
    init_cut_values(&mut t, &sg);

    let limit = MAX_EXCHANGES_PER_EDGE * (sg.edge_count() + 1);
    let mut exchanges = 0usize;
    while let Some(e) = leave_edge(&t) {
        if exchanges >= limit {
            warn!(exchanges, "network simplex stopped before reaching the optimum");
            break;
        }
        let Some(f) = enter_edge(&t, &sg, &e) else {
            break;
        };
        exchange_edges(&mut t, &mut sg, &e, &f);
        exchanges += 1;
    }
    debug!(exchanges, nodes = sg.node_count(), "network simplex done");

    for (v, node) in sg.node_labels() {
        if let Some(target) = g.node_mut(v) {
            target.rank = node.rank;
        }
    }
}

/// Numbers every tree node in postorder: `lim` is the node's own number and `low` the smallest
/// number in its subtree. Also records each node's tree parent.
pub fn init_low_lim_values(t: &mut Tree, root: Option<&str>) {
    let mut roots: Vec<String> = Vec::new();
    if let Some(root) = root {
        roots.push(root.to_string());
    }
    roots.extend(t.node_ids());

    let bound = t.node_ix_bound();
    let mut visited = vec![false; bound];
    let mut next_lim = 1usize;

    for root in roots {
        let Some(root_ix) = t.node_ix(&root) else {
            continue;
        };
        if visited[root_ix] {
            continue;
        }
        visited[root_ix] = true;
        // (node, parent, neighbors, next neighbor, low)
        let mut stack: Vec<(String, Option<String>, Vec<String>, usize, usize)> = Vec::new();
        let neighbors = neighbor_ids(t, &root);
        stack.push((root, None, neighbors, 0, next_lim));

        while let Some((v, _, neighbors, i, _)) = stack.last_mut() {
            if let Some(w) = neighbors.get(*i).cloned() {
                *i += 1;
                let Some(w_ix) = t.node_ix(&w) else {
                    continue;
                };
                if !visited[w_ix] {
                    visited[w_ix] = true;
                    let parent = Some(v.clone());
                    let next = neighbor_ids(t, &w);
                    stack.push((w, parent, next, 0, next_lim));
                }
                continue;
            }

            let Some((v, parent, _, _, low)) = stack.pop() else {
                break;
            };
            if let Some(label) = t.node_mut(&v) {
                label.low = low;
                label.lim = next_lim;
                label.parent = parent;
            }
            next_lim += 1;
        }
    }
}

fn neighbor_ids(t: &Tree, v: &str) -> Vec<String> {
    t.neighbors(v).into_iter().map(str::to_string).collect()
}

/// Computes cut values bottom-up so each child's value is ready before its parent needs it.
pub fn init_cut_values(t: &mut Tree, g: &LayoutGraph) {
    let roots: Vec<String> = t.node_ids();
    let root_refs: Vec<&str> = roots.iter().map(String::as_str).collect();
    let order = alg::postorder(t, &root_refs);
    for v in order {
        assign_cut_value(t, g, &v);
    }
}

fn assign_cut_value(t: &mut Tree, g: &LayoutGraph, child: &str) {
    let Some(parent) = t.node(child).and_then(|n| n.parent.clone()) else {
        return;
    };
    let cutvalue = calc_cut_value(t, g, child);
    if let Some(edge) = t.edge_mut(child, &parent, None) {
        edge.cutvalue = cutvalue;
    }
}

/// Cut value of the tree edge between `child` and its parent.
pub fn calc_cut_value(t: &Tree, g: &LayoutGraph, child: &str) -> f64 {
    let Some(parent) = t.node(child).and_then(|n| n.parent.as_deref()) else {
        return 0.0;
    };

    let (child_is_tail, graph_edge) = match g.edge(child, parent, None) {
        Some(e) => (true, e),
        None => match g.edge(parent, child, None) {
            Some(e) => (false, e),
            None => return 0.0,
        },
    };

    let mut cut_value = graph_edge.weight;
    for e in g.node_edges(child, None) {
        let is_out_edge = e.v == child;
        let other = if is_out_edge { &e.w } else { &e.v };
        if other == parent {
            continue;
        }
        let points_to_head = is_out_edge == child_is_tail;
        let other_weight = g.edge_by_key(&e).map(|l| l.weight).unwrap_or(0.0);
        cut_value += if points_to_head {
            other_weight
        } else {
            -other_weight
        };
        if let Some(tree_edge) = t.edge(child, other, None) {
            let other_cut = tree_edge.cutvalue;
            cut_value += if points_to_head {
                -other_cut
            } else {
                other_cut
            };
        }
    }
    cut_value
}

/// First tree edge with a negative cut value.
pub fn leave_edge(t: &Tree) -> Option<EdgeKey> {
    t.edge_labels()
        .find(|(_, label)| label.cutvalue < 0.0)
        .map(|(key, _)| key.clone())
}

/// Non-tree edge of minimal slack that crosses the cut induced by removing `edge`.
pub fn enter_edge(t: &Tree, g: &LayoutGraph, edge: &EdgeKey) -> Option<EdgeKey> {
    let (v, w) = if g.has_edge(&edge.v, &edge.w, None) {
        (&edge.v, &edge.w)
    } else {
        (&edge.w, &edge.v)
    };
    let v_label = t.node(v)?;
    let w_label = t.node(w)?;

    let (tail_label, flip) = if v_label.lim > w_label.lim {
        (w_label, true)
    } else {
        (v_label, false)
    };

    let mut best: Option<(i32, &EdgeKey)> = None;
    for e in g.edges() {
        let (Some(ev), Some(ew)) = (t.node(&e.v), t.node(&e.w)) else {
            continue;
        };
        if flip == is_descendant(ev, tail_label) && flip != is_descendant(ew, tail_label) {
            let s = slack(g, e);
            if best.is_none_or(|(b, _)| s < b) {
                best = Some((s, e));
            }
        }
    }
    best.map(|(_, e)| e.clone())
}

pub fn exchange_edges(t: &mut Tree, g: &mut LayoutGraph, e: &EdgeKey, f: &EdgeKey) {
    t.remove_edge(&e.v, &e.w, None);
    t.set_edge(f.v.clone(), f.w.clone());
    init_low_lim_values(t, None);
    init_cut_values(t, g);
    update_ranks(t, g);
}

/// Re-derives ranks from the tree: every tree edge becomes tight.
fn update_ranks(t: &Tree, g: &mut LayoutGraph) {
    let roots: Vec<&str> = t
        .node_labels()
        .filter(|(_, n)| n.parent.is_none())
        .map(|(v, _)| v)
        .collect();

    for root in roots {
        for v in alg::preorder(t, &[root]).into_iter().skip(1) {
            let Some(parent) = t.node(&v).and_then(|n| n.parent.clone()) else {
                continue;
            };
            let (minlen, flipped) = match g.edge(&v, &parent, None) {
                Some(e) => (e.minlen as i32, false),
                None => match g.edge(&parent, &v, None) {
                    Some(e) => (e.minlen as i32, true),
                    None => continue,
                },
            };
            let parent_rank = g.node(&parent).and_then(|n| n.rank).unwrap_or(0);
            if let Some(node) = g.node_mut(&v) {
                node.rank = Some(if flipped {
                    parent_rank + minlen
                } else {
                    parent_rank - minlen
                });
            }
        }
    }
}

fn is_descendant(v: &TreeNode, root: &TreeNode) -> bool {
    root.low <= v.lim && v.lim <= root.lim
}

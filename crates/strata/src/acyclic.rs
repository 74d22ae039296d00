//! Break cycles by reversing a feedback arc set.
//!
//! Reversed edges are re-inserted under a fresh `rev{n}` name with `reversed` set and the
//! original name kept in `forward_name`, so [`undo`] can restore them exactly.

use crate::graphlib::EdgeKey;
use crate::{Acyclicer, EdgeLabel, LayoutGraph};
use tracing::trace;

pub fn run(g: &mut LayoutGraph) {
    let fas = match g.graph().acyclicer {
        Acyclicer::Greedy => crate::greedy_fas::greedy_fas(g, |label: &EdgeLabel| {
            if label.weight.is_finite() {
                label.weight.round() as i64
            } else {
                0
            }
        }),
        Acyclicer::Dfs => dfs_fas(g),
    };

    for e in fas.into_iter().filter(|e| !e.is_self_loop()) {
        let Some(mut label) = g.edge_by_key(&e).cloned() else {
            continue;
        };
        g.remove_edge_key(&e);

        label.forward_name = e.name.clone();
        label.reversed = true;
        let name = unique_rev_name(g, &e.w, &e.v);
        trace!(edge = %e, name = %name, "reversing edge");
        g.set_edge_named(e.w, e.v, Some(name), Some(label));
    }
}

pub fn undo(g: &mut LayoutGraph) {
    for e in g.edge_keys() {
        let Some(label) = g.edge_by_key(&e) else {
            continue;
        };
        if !label.reversed {
            continue;
        }
        let mut label = label.clone();
        g.remove_edge_key(&e);

        let forward_name = label.forward_name.take();
        label.reversed = false;
        g.set_edge_named(e.w, e.v, forward_name, Some(label));
    }
}

fn unique_rev_name(g: &LayoutGraph, v: &str, w: &str) -> String {
    let mut i = 1usize;
    loop {
        let candidate = format!("rev{i}");
        if !g.has_edge(v, w, Some(&candidate)) {
            return candidate;
        }
        i += 1;
    }
}

/// Back edges of a depth-first search started from every node in insertion order.
fn dfs_fas(g: &LayoutGraph) -> Vec<EdgeKey> {
    let bound = g.node_ix_bound();
    let mut visited = vec![false; bound];
    let mut on_stack = vec![false; bound];
    let mut fas: Vec<EdgeKey> = Vec::new();

    for root in g.nodes() {
        let Some(root_ix) = g.node_ix(root) else {
            continue;
        };
        if visited[root_ix] {
            continue;
        }
        visited[root_ix] = true;
        on_stack[root_ix] = true;
        let mut stack: Vec<(usize, Vec<EdgeKey>, usize)> =
            vec![(root_ix, g.out_edges(root, None), 0)];

        while let Some((v_ix, edges, i)) = stack.last_mut() {
            let Some(e) = edges.get(*i).cloned() else {
                on_stack[*v_ix] = false;
                stack.pop();
                continue;
            };
            *i += 1;
            if e.is_self_loop() {
                continue;
            }
            let Some(w_ix) = g.node_ix(&e.w) else {
                continue;
            };
            if on_stack[w_ix] {
                fas.push(e);
            } else if !visited[w_ix] {
                visited[w_ix] = true;
                on_stack[w_ix] = true;
                let next = g.out_edges(&e.w, None);
                stack.push((w_ix, next, 0));
            }
        }
    }
    fas
}

//! Moves each dummy chain into the clusters it passes through.
//!
//! A long edge between nodes in different clusters climbs from its tail's cluster up to the
//! lowest common ancestor and back down to its head's cluster. Each dummy is parented to the
//! cluster on that path whose rank range covers the dummy's rank, so ordering keeps it inside
//! the right cluster boundaries.

use crate::graphlib::GRAPH_ROOT;
use crate::{LayoutGraph, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy)]
struct PostorderNum {
    low: usize,
    lim: usize,
}

pub fn parent_dummy_chains(g: &mut LayoutGraph) -> Result<()> {
    let nums = postorder(g);
    let chains = g.graph().dummy_chains.clone();

    for start in chains {
        let Some(edge) = g
            .node(&start)
            .and_then(|n| n.kind.edge_dummy())
            .map(|d| d.edge.clone())
        else {
            continue;
        };
        let (path, lca) = find_path(g, &nums, &edge.v, &edge.w);

        let mut path_ix = 0usize;
        let mut ascending = true;
        let mut v = start;
        while v != edge.w {
            let Some(rank) = g.node(&v).and_then(|n| n.rank) else {
                break;
            };

            let cluster_range = |id: &Option<String>| {
                id.as_deref()
                    .and_then(|id| g.node(id))
                    .and_then(|n| n.cluster.as_ref())
                    .map(|c| (c.min_rank, c.max_rank))
            };

            if ascending {
                while path_ix < path.len()
                    && path[path_ix] != lca
                    && cluster_range(&path[path_ix]).is_some_and(|(_, max)| max < rank)
                {
                    path_ix += 1;
                }
                if path.get(path_ix) == Some(&lca) {
                    ascending = false;
                }
            }
            if !ascending {
                while path_ix + 1 < path.len()
                    && cluster_range(&path[path_ix + 1]).is_some_and(|(min, _)| min <= rank)
                {
                    path_ix += 1;
                }
            }

            match path.get(path_ix).cloned().flatten() {
                Some(parent) => {
                    g.set_parent(v.clone(), parent)?;
                }
                None => {
                    g.clear_parent(&v);
                }
            }

            let Some(next) = g.successors(&v).first().map(|w| w.to_string()) else {
                break;
            };
            v = next;
        }
    }
    Ok(())
}

/// Cluster path from `v` up to the lowest common ancestor with `w` and down to `w`.
/// `None` entries stand for the graph root.
fn find_path(
    g: &LayoutGraph,
    nums: &FxHashMap<String, PostorderNum>,
    v: &str,
    w: &str,
) -> (Vec<Option<String>>, Option<String>) {
    let num = |id: &str| nums.get(id).copied();
    let (Some(nv), Some(nw)) = (num(v), num(w)) else {
        return (vec![None], None);
    };
    let low = nv.low.min(nw.low);
    let lim = nv.lim.max(nw.lim);

    let mut v_path: Vec<Option<String>> = Vec::new();
    let mut parent: Option<String> = Some(v.to_string());
    loop {
        parent = parent.as_deref().and_then(|p| g.parent(p)).map(str::to_string);
        v_path.push(parent.clone());
        let Some(p) = parent.as_deref() else {
            break;
        };
        let Some(np) = num(p) else {
            break;
        };
        if !(np.low > low || lim > np.lim) {
            break;
        }
    }
    let lca = parent;

    let mut w_path: Vec<Option<String>> = Vec::new();
    let mut cur = g.parent(w).map(str::to_string);
    while cur != lca {
        let Some(c) = cur else {
            break;
        };
        let next = g.parent(&c).map(str::to_string);
        w_path.push(Some(c));
        cur = next;
    }

    v_path.extend(w_path.into_iter().rev());
    (v_path, lca)
}

/// Postorder numbering of the cluster hierarchy; `low` is the smallest number in a subtree.
fn postorder(g: &LayoutGraph) -> FxHashMap<String, PostorderNum> {
    let mut result: FxHashMap<String, PostorderNum> = FxHashMap::default();
    let mut lim = 0usize;

    for root in g.children(GRAPH_ROOT) {
        let mut stack: Vec<(&str, Vec<&str>, usize, usize)> = vec![(root, g.children(root), 0, lim)];
        while let Some((v, children, i, low)) = stack.last_mut() {
            if let Some(&child) = children.get(*i) {
                *i += 1;
                let grandchildren = g.children(child);
                stack.push((child, grandchildren, 0, lim));
                continue;
            }
            result.insert(v.to_string(), PostorderNum { low: *low, lim });
            lim += 1;
            stack.pop();
        }
    }
    result
}

//! Greedy feedback arc set heuristic (Eades, Lin and Smyth).
//!
//! Nodes are bucketed by `out_weight - in_weight`. Sinks and sources are peeled off first since
//! they cannot lie on a cycle; otherwise the node with the largest surplus goes next and its
//! remaining in-edges join the feedback set.

use crate::graphlib::{EdgeKey, Graph};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;

/// FIFO buckets with O(1) moves. Moving a node re-enqueues it and invalidates its old entry.
struct Buckets {
    queues: Vec<VecDeque<(usize, u32)>>,
    stamp: Vec<u32>,
}

impl Buckets {
    fn enqueue(&mut self, bucket: usize, v: usize) {
        self.stamp[v] = self.stamp[v].wrapping_add(1);
        self.queues[bucket].push_back((v, self.stamp[v]));
    }

    fn dequeue(&mut self, bucket: usize, removed: &[bool]) -> Option<usize> {
        while let Some((v, stamp)) = self.queues[bucket].pop_front() {
            if !removed[v] && self.stamp[v] == stamp {
                return Some(v);
            }
        }
        None
    }
}

struct FasState {
    in_weight: Vec<i64>,
    out_weight: Vec<i64>,
    in_adj: Vec<Vec<(usize, i64)>>,
    out_adj: Vec<Vec<(usize, i64)>>,
    removed: Vec<bool>,
    remaining: usize,
    buckets: Buckets,
    zero_ix: i64,
}

impl FasState {
    fn last_bucket(&self) -> usize {
        self.buckets.queues.len() - 1
    }

    fn assign_bucket(&mut self, v: usize) {
        let bucket = if self.out_weight[v] == 0 {
            0
        } else if self.in_weight[v] == 0 {
            self.last_bucket()
        } else {
            let ix = self.out_weight[v] - self.in_weight[v] + self.zero_ix;
            ix.clamp(0, self.last_bucket() as i64) as usize
        };
        self.buckets.enqueue(bucket, v);
    }

    /// Removes `v`, returning the predecessors whose edges into `v` must be reversed when
    /// `collect` is set.
    fn remove(&mut self, v: usize, collect: bool) -> Vec<usize> {
        let mut preds = Vec::new();
        self.removed[v] = true;
        self.remaining -= 1;

        let ins = std::mem::take(&mut self.in_adj[v]);
        for &(u, weight) in &ins {
            if self.removed[u] {
                continue;
            }
            if collect {
                preds.push(u);
            }
            self.out_weight[u] -= weight;
            self.assign_bucket(u);
        }
        let outs = std::mem::take(&mut self.out_adj[v]);
        for &(w, weight) in &outs {
            if self.removed[w] {
                continue;
            }
            self.in_weight[w] -= weight;
            self.assign_bucket(w);
        }
        preds
    }
}

/// Returns the edges of `g` to reverse so that it becomes acyclic. Self-loops are ignored.
///
/// `weight_fn` maps each edge label to an integral weight; non-positive weights count as zero.
pub fn greedy_fas<N, E, G, F>(g: &Graph<N, E, G>, weight_fn: F) -> Vec<EdgeKey>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
    F: Fn(&E) -> i64,
{
    if g.node_count() <= 1 {
        return Vec::new();
    }

    let ids: Vec<&str> = g.nodes().collect();
    let ix_of: FxHashMap<&str, usize> = ids.iter().enumerate().map(|(i, v)| (*v, i)).collect();
    let n = ids.len();

    let mut merged: FxHashMap<(usize, usize), i64> = FxHashMap::default();
    let mut pairs: Vec<(usize, usize)> = Vec::new();
    let mut in_weight = vec![0i64; n];
    let mut out_weight = vec![0i64; n];
    for (key, label) in g.edge_labels() {
        if key.v == key.w {
            continue;
        }
        let (Some(&u), Some(&w)) = (ix_of.get(key.v.as_str()), ix_of.get(key.w.as_str())) else {
            continue;
        };
        let weight = weight_fn(label).max(0);
        let slot = merged.entry((u, w)).or_insert_with(|| {
            pairs.push((u, w));
            0
        });
        *slot += weight;
        out_weight[u] += weight;
        in_weight[w] += weight;
    }

    let mut in_adj = vec![Vec::new(); n];
    let mut out_adj = vec![Vec::new(); n];
    for &(u, w) in &pairs {
        let weight = merged[&(u, w)];
        out_adj[u].push((w, weight));
        in_adj[w].push((u, weight));
    }

    let max_in = in_weight.iter().copied().max().unwrap_or(0);
    let max_out = out_weight.iter().copied().max().unwrap_or(0);
    let bucket_count = (max_out + max_in + 3) as usize;

    let mut state = FasState {
        in_weight,
        out_weight,
        in_adj,
        out_adj,
        removed: vec![false; n],
        remaining: n,
        buckets: Buckets {
            queues: vec![VecDeque::new(); bucket_count],
            stamp: vec![0; n],
        },
        zero_ix: max_in + 1,
    };
    for v in 0..n {
        state.assign_bucket(v);
    }

    let sinks = 0;
    let sources = state.last_bucket();
    let mut reversed: Vec<(usize, usize)> = Vec::new();
    while state.remaining > 0 {
        while let Some(v) = state.buckets.dequeue(sinks, &state.removed) {
            state.remove(v, false);
        }
        while let Some(v) = state.buckets.dequeue(sources, &state.removed) {
            state.remove(v, false);
        }
        if state.remaining == 0 {
            break;
        }
        for bucket in (1..sources).rev() {
            if let Some(v) = state.buckets.dequeue(bucket, &state.removed) {
                for u in state.remove(v, true) {
                    reversed.push((u, v));
                }
                break;
            }
        }
    }

    reversed
        .into_iter()
        .flat_map(|(u, w)| g.out_edges(ids[u], Some(ids[w])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphlib::{GraphOptions, alg};

    fn weighted(edges: &[(&str, &str, i64)]) -> Graph<(), i64, ()> {
        let mut g = Graph::new(GraphOptions::default());
        for (v, w, weight) in edges {
            g.set_edge_with_label(*v, *w, *weight);
        }
        g
    }

    fn remove_all(g: &mut Graph<(), i64, ()>, fas: &[EdgeKey]) {
        for e in fas {
            g.remove_edge_key(e);
        }
    }

    #[test]
    fn acyclic_graph_has_empty_fas() {
        let g = weighted(&[("a", "b", 1), ("b", "c", 1), ("a", "c", 1)]);
        assert!(greedy_fas(&g, |w| *w).is_empty());
    }

    #[test]
    fn single_cycle_loses_one_edge() {
        let mut g = weighted(&[("a", "b", 1), ("b", "a", 1)]);
        let fas = greedy_fas(&g, |w| *w);
        assert_eq!(fas.len(), 1);
        remove_all(&mut g, &fas);
        assert!(alg::find_cycles(&g).is_empty());
    }

    #[test]
    fn prefers_reversing_light_edges() {
        let g = weighted(&[("n1", "n2", 2), ("n2", "n1", 1), ("n2", "n3", 2), ("n3", "n2", 1)]);
        let mut fas: Vec<String> = greedy_fas(&g, |w| *w)
            .into_iter()
            .map(|e| format!("{}->{}", e.v, e.w))
            .collect();
        fas.sort();
        assert_eq!(fas, vec!["n2->n1", "n3->n2"]);
    }

    #[test]
    fn breaks_nested_cycles() {
        let mut g = weighted(&[
            ("a", "b", 1),
            ("b", "c", 1),
            ("c", "a", 1),
            ("c", "d", 1),
            ("d", "b", 1),
            ("d", "e", 1),
        ]);
        let fas = greedy_fas(&g, |w| *w);
        remove_all(&mut g, &fas);
        assert!(alg::find_cycles(&g).is_empty());
    }
}

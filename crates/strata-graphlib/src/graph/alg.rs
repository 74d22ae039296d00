//! Traversal and cycle algorithms over [`Graph`].
//!
//! Everything here uses explicit work stacks so that deep chains (long dummy paths after
//! normalization) cannot overflow the call stack.

use super::Graph;
use std::collections::VecDeque;

/// Returned by [`topsort`] when the graph contains a cycle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("graph contains a cycle")]
pub struct CycleError;

/// Depth-first preorder from `roots`, following successors (or neighbors when undirected).
pub fn preorder<N, E, G>(g: &Graph<N, E, G>, roots: &[&str]) -> Vec<String>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let mut visited = vec![false; g.node_ix_bound()];
    let mut out: Vec<String> = Vec::new();

    for &root in roots {
        let mut stack: Vec<&str> = vec![root];
        while let Some(v) = stack.pop() {
            let Some(ix) = g.node_ix(v) else {
                continue;
            };
            if visited[ix] {
                continue;
            }
            visited[ix] = true;
            out.push(v.to_string());
            let next = g.successors(v);
            for w in next.into_iter().rev() {
                stack.push(w);
            }
        }
    }
    out
}

/// Depth-first postorder from `roots`.
pub fn postorder<N, E, G>(g: &Graph<N, E, G>, roots: &[&str]) -> Vec<String>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let mut visited = vec![false; g.node_ix_bound()];
    let mut out: Vec<String> = Vec::new();

    for &root in roots {
        let Some(root_ix) = g.node_ix(root) else {
            continue;
        };
        if visited[root_ix] {
            continue;
        }
        visited[root_ix] = true;
        // (node, successors, next successor to visit)
        let mut stack: Vec<(&str, Vec<&str>, usize)> = vec![(root, g.successors(root), 0)];
        while let Some((v, succ, i)) = stack.last_mut() {
            if *i < succ.len() {
                let w = succ[*i];
                *i += 1;
                if let Some(w_ix) = g.node_ix(w) {
                    if !visited[w_ix] {
                        visited[w_ix] = true;
                        let next = g.successors(w);
                        stack.push((w, next, 0));
                    }
                }
            } else {
                out.push(v.to_string());
                stack.pop();
            }
        }
    }
    out
}

/// Weakly connected components, in node insertion order of their first member.
pub fn components<N, E, G>(g: &Graph<N, E, G>) -> Vec<Vec<String>>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let mut seen = vec![false; g.node_ix_bound()];
    let mut out: Vec<Vec<String>> = Vec::new();

    for start in g.nodes() {
        let Some(start_ix) = g.node_ix(start) else {
            continue;
        };
        if seen[start_ix] {
            continue;
        }
        seen[start_ix] = true;
        let mut comp: Vec<String> = Vec::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            comp.push(v.to_string());
            for n in g.neighbors(v) {
                if let Some(n_ix) = g.node_ix(n) {
                    if !seen[n_ix] {
                        seen[n_ix] = true;
                        queue.push_back(n);
                    }
                }
            }
        }
        out.push(comp);
    }
    out
}

/// Strongly connected components of size > 1, plus single nodes with a self-loop.
pub fn find_cycles<N, E, G>(g: &Graph<N, E, G>) -> Vec<Vec<String>>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    const UNVISITED: usize = usize::MAX;

    let bound = g.node_ix_bound();
    let mut index = vec![UNVISITED; bound];
    let mut lowlink = vec![0usize; bound];
    let mut on_stack = vec![false; bound];
    let mut scc_stack: Vec<usize> = Vec::new();
    let mut next_index = 0usize;
    let mut sccs: Vec<Vec<usize>> = Vec::new();

    let succ_ix = |v: usize| -> Vec<usize> {
        g.node_id_by_ix(v)
            .map(|id| {
                g.successors(id)
                    .into_iter()
                    .filter_map(|w| g.node_ix(w))
                    .collect()
            })
            .unwrap_or_default()
    };

    for root in g.nodes() {
        let Some(root) = g.node_ix(root) else {
            continue;
        };
        if index[root] != UNVISITED {
            continue;
        }

        let mut work: Vec<(usize, Vec<usize>, usize)> = Vec::new();
        index[root] = next_index;
        lowlink[root] = next_index;
        next_index += 1;
        scc_stack.push(root);
        on_stack[root] = true;
        work.push((root, succ_ix(root), 0));

        while let Some(frame) = work.last_mut() {
            let v = frame.0;
            if frame.2 < frame.1.len() {
                let w = frame.1[frame.2];
                frame.2 += 1;
                if index[w] == UNVISITED {
                    index[w] = next_index;
                    lowlink[w] = next_index;
                    next_index += 1;
                    scc_stack.push(w);
                    on_stack[w] = true;
                    let next = succ_ix(w);
                    work.push((w, next, 0));
                } else if on_stack[w] {
                    lowlink[v] = lowlink[v].min(index[w]);
                }
                continue;
            }

            work.pop();
            if let Some(parent) = work.last() {
                let p = parent.0;
                lowlink[p] = lowlink[p].min(lowlink[v]);
            }
            if lowlink[v] == index[v] {
                let mut scc: Vec<usize> = Vec::new();
                while let Some(w) = scc_stack.pop() {
                    on_stack[w] = false;
                    scc.push(w);
                    if w == v {
                        break;
                    }
                }
                sccs.push(scc);
            }
        }
    }

    sccs.into_iter()
        .filter(|scc| {
            scc.len() > 1
                || scc.first().is_some_and(|&v| {
                    g.node_id_by_ix(v)
                        .is_some_and(|id| !g.out_edges(id, Some(id)).is_empty())
                })
        })
        .map(|scc| {
            scc.into_iter()
                .filter_map(|v| g.node_id_by_ix(v).map(str::to_string))
                .collect()
        })
        .collect()
}

pub fn is_acyclic<N, E, G>(g: &Graph<N, E, G>) -> bool
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    topsort(g).is_ok()
}

/// Kahn's algorithm. Ties resolve in node insertion order.
pub fn topsort<N, E, G>(g: &Graph<N, E, G>) -> Result<Vec<String>, CycleError>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    let bound = g.node_ix_bound();
    let mut indegree = vec![0usize; bound];
    for key in g.edges() {
        if let Some(w) = g.node_ix(&key.w) {
            indegree[w] += 1;
        }
    }

    let mut queue: VecDeque<&str> = g
        .nodes()
        .filter(|v| g.node_ix(v).is_some_and(|ix| indegree[ix] == 0))
        .collect();
    let mut out: Vec<String> = Vec::with_capacity(g.node_count());

    while let Some(v) = queue.pop_front() {
        out.push(v.to_string());
        for key in g.out_edges(v, None) {
            let Some(w_ix) = g.node_ix(&key.w) else {
                continue;
            };
            indegree[w_ix] -= 1;
            if indegree[w_ix] == 0 {
                if let Some(w) = g.node_id_by_ix(w_ix) {
                    queue.push_back(w);
                }
            }
        }
    }

    if out.len() == g.node_count() {
        Ok(out)
    } else {
        Err(CycleError)
    }
}

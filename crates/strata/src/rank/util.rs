use crate::LayoutGraph;
use crate::graphlib::EdgeKey;

/// Assigns each node the lowest rank compatible with its successors, with sinks at rank 0 and
/// sources pushed upwards (negative ranks).
///
/// Walks from every source with an explicit stack; unreachable nodes keep their current rank.
pub fn longest_path(g: &mut LayoutGraph) {
    struct Frame {
        v: usize,
        out: Vec<(usize, i32)>,
        next: usize,
        rank: Option<i32>,
    }

    let bound = g.node_ix_bound();
    let mut visited = vec![false; bound];
    let mut ranks: Vec<Option<i32>> = vec![None; bound];

    let out_of = |g: &LayoutGraph, v: usize| -> Vec<(usize, i32)> {
        let Some(id) = g.node_id_by_ix(v) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        g.for_each_out_edge(id, |key, label| {
            if let Some(w) = g.node_ix(&key.w) {
                out.push((w, label.minlen as i32));
            }
        });
        out
    };

    let sources: Vec<usize> = g.sources().into_iter().filter_map(|v| g.node_ix(v)).collect();
    for source in sources {
        if visited[source] {
            continue;
        }
        visited[source] = true;
        let mut stack = vec![Frame {
            v: source,
            out: out_of(&*g, source),
            next: 0,
            rank: None,
        }];

        while let Some(frame) = stack.last_mut() {
            if let Some(&(w, minlen)) = frame.out.get(frame.next) {
                frame.next += 1;
                if visited[w] {
                    if let Some(rw) = ranks[w] {
                        let candidate = rw - minlen;
                        frame.rank = Some(frame.rank.map_or(candidate, |r| r.min(candidate)));
                    }
                } else {
                    visited[w] = true;
                    let out = out_of(&*g, w);
                    stack.push(Frame {
                        v: w,
                        out,
                        next: 0,
                        rank: None,
                    });
                }
                continue;
            }

            let Some(done) = stack.pop() else {
                break;
            };
            let rank = done.rank.unwrap_or(0);
            ranks[done.v] = Some(rank);
            if let Some(parent) = stack.last_mut() {
                if let Some(&(_, minlen)) = parent.out.get(parent.next - 1) {
                    let candidate = rank - minlen;
                    parent.rank = Some(parent.rank.map_or(candidate, |r| r.min(candidate)));
                }
            }
        }
    }

    for (ix, rank) in ranks.into_iter().enumerate() {
        let Some(rank) = rank else {
            continue;
        };
        let Some(id) = g.node_id_by_ix(ix).map(str::to_string) else {
            continue;
        };
        if let Some(node) = g.node_mut(&id) {
            node.rank = Some(rank);
        }
    }
}

/// How much longer than its `minlen` an edge currently is.
pub fn slack(g: &LayoutGraph, e: &EdgeKey) -> i32 {
    let rank = |v: &str| g.node(v).and_then(|n| n.rank).unwrap_or(0);
    let minlen = g.edge_by_key(e).map(|l| l.minlen as i32).unwrap_or(1);
    rank(&e.w) - rank(&e.v) - minlen
}

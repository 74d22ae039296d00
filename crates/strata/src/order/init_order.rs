use crate::LayoutGraph;

/// Initial layering: a depth-first walk from the lowest-ranked leaf nodes, appending each node
/// to its rank as it is first reached. Nodes connected by an edge therefore tend to start out
/// near each other, which gives the sweeps a low-crossing starting point.
pub fn init_order(g: &LayoutGraph) -> Vec<Vec<String>> {
    let mut simple: Vec<(&str, i32)> = g
        .node_labels()
        .filter(|(v, _)| !g.has_children(v))
        .filter_map(|(v, n)| n.rank.map(|r| (v, r)))
        .collect();
    let Some(max_rank) = simple.iter().map(|(_, r)| *r).max() else {
        return Vec::new();
    };
    let mut layers: Vec<Vec<String>> = vec![Vec::new(); (max_rank.max(0) + 1) as usize];

    simple.sort_by_key(|(_, r)| *r);

    let mut visited = vec![false; g.node_ix_bound()];
    for (start, _) in simple {
        let mut stack: Vec<&str> = vec![start];
        while let Some(v) = stack.pop() {
            let Some(ix) = g.node_ix(v) else {
                continue;
            };
            if visited[ix] {
                continue;
            }
            visited[ix] = true;
            if let Some(rank) = g.node(v).and_then(|n| n.rank) {
                if let Some(layer) = usize::try_from(rank).ok().and_then(|r| layers.get_mut(r)) {
                    layer.push(v.to_string());
                }
            }
            for w in g.successors(v).into_iter().rev() {
                stack.push(w);
            }
        }
    }
    layers
}

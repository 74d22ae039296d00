//! Horizontal coordinate assignment after Brandes and Köpf, "Fast and Simple Horizontal
//! Coordinate Assignment".
//!
//! Nodes are grouped into vertical blocks by aligning each with the median of its upper (or
//! lower) neighbors, then blocks are packed left (or right) as tightly as the separation rules
//! allow. Running all four up/down and left/right combinations and balancing the results gives
//! straight long edges without biasing the drawing to one side.
//!
//! Alignments skip pairs recorded as conflicts: type 1 where a non-inner segment crosses an
//! inner segment (one between two dummies), type 2 where two inner segments cross, resolved in
//! favour of cluster border segments.

use crate::graphlib::{Graph, GraphOptions};
use crate::{Align, LabelPos, LayoutGraph, NodeKind};
use rustc_hash::{FxHashMap, FxHashSet};

pub type Xs = FxHashMap<String, f64>;

type BlockGraph = Graph<(), f64, ()>;

/// Unordered node pairs that must not be aligned with each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conflicts(FxHashMap<String, FxHashSet<String>>);

impl Conflicts {
    pub fn add(&mut self, v: &str, w: &str) {
        let (v, w) = if v <= w { (v, w) } else { (w, v) };
        self.0.entry(v.to_string()).or_default().insert(w.to_string());
    }

    pub fn contains(&self, v: &str, w: &str) -> bool {
        let (v, w) = if v <= w { (v, w) } else { (w, v) };
        self.0.get(v).is_some_and(|ws| ws.contains(w))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extend(&mut self, other: Conflicts) {
        for (v, ws) in other.0 {
            self.0.entry(v).or_default().extend(ws);
        }
    }
}

fn is_dummy(g: &LayoutGraph, v: &str) -> bool {
    g.node(v).is_some_and(|n| n.is_dummy())
}

fn order(g: &LayoutGraph, v: &str) -> usize {
    g.node(v).and_then(|n| n.order).unwrap_or(0)
}

pub fn find_type1_conflicts(g: &LayoutGraph, layering: &[Vec<String>]) -> Conflicts {
    let mut conflicts = Conflicts::default();

    for pair in layering.windows(2) {
        let (prev_layer, layer) = (&pair[0], &pair[1]);
        let mut k0 = 0usize;
        let mut scan_pos = 0usize;

        for (i, v) in layer.iter().enumerate() {
            let w = other_inner_segment_node(g, v);
            let k1 = w.map_or(prev_layer.len(), |w| order(g, w));
            if w.is_none() && i + 1 != layer.len() {
                continue;
            }

            for scan_node in &layer[scan_pos..=i] {
                let scan_dummy = is_dummy(g, scan_node);
                for u in g.predecessors(scan_node) {
                    let Some(u_label) = g.node(u) else {
                        continue;
                    };
                    let u_pos = u_label.order.unwrap_or(0);
                    if (u_pos < k0 || k1 < u_pos) && !(u_label.is_dummy() && scan_dummy) {
                        conflicts.add(u, scan_node);
                    }
                }
            }
            scan_pos = i + 1;
            k0 = k1;
        }
    }

    conflicts
}

pub fn find_type2_conflicts(g: &LayoutGraph, layering: &[Vec<String>]) -> Conflicts {
    let mut conflicts = Conflicts::default();

    for pair in layering.windows(2) {
        let (north, south) = (&pair[0], &pair[1]);
        let mut prev_north_pos: i64 = -1;
        let mut next_north_pos: i64 = -1;
        let mut south_pos = 0usize;

        for (lookahead, v) in south.iter().enumerate() {
            if !g.node(v).is_some_and(|n| n.kind.is_border()) {
                continue;
            }
            if let Some(u) = g.predecessors(v).first() {
                next_north_pos = order(g, u) as i64;
                scan_type2(
                    g,
                    &mut conflicts,
                    &south[south_pos..lookahead],
                    prev_north_pos,
                    next_north_pos,
                );
                south_pos = lookahead;
                prev_north_pos = next_north_pos;
            }
        }
        scan_type2(
            g,
            &mut conflicts,
            &south[south_pos..],
            next_north_pos,
            north.len() as i64,
        );
    }

    conflicts
}

fn scan_type2(
    g: &LayoutGraph,
    conflicts: &mut Conflicts,
    south: &[String],
    prev_north_border: i64,
    next_north_border: i64,
) {
    for v in south {
        if !is_dummy(g, v) {
            continue;
        }
        for u in g.predecessors(v) {
            let Some(u_label) = g.node(u) else {
                continue;
            };
            let u_order = u_label.order.unwrap_or(0) as i64;
            if u_label.is_dummy() && (u_order < prev_north_border || u_order > next_north_border) {
                conflicts.add(u, v);
            }
        }
    }
}

/// For a dummy node, the dummy predecessor that continues its inner segment.
fn other_inner_segment_node<'a>(g: &'a LayoutGraph, v: &str) -> Option<&'a str> {
    if !is_dummy(g, v) {
        return None;
    }
    g.predecessors(v).into_iter().find(|u| is_dummy(g, u))
}

/// Block membership: `root` maps every node to the top of its block, `align` links each node
/// to the next one down the block (the last links back to the root).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Alignment {
    pub root: FxHashMap<String, String>,
    pub align: FxHashMap<String, String>,
}

pub fn vertical_alignment<F>(layering: &[Vec<String>], conflicts: &Conflicts, neighbors: F) -> Alignment
where
    F: Fn(&str) -> Vec<String>,
{
    let mut root: FxHashMap<String, String> = FxHashMap::default();
    let mut align: FxHashMap<String, String> = FxHashMap::default();
    let mut pos: FxHashMap<&str, usize> = FxHashMap::default();

    for layer in layering {
        for (order, v) in layer.iter().enumerate() {
            root.insert(v.clone(), v.clone());
            align.insert(v.clone(), v.clone());
            pos.insert(v, order);
        }
    }

    for layer in layering {
        let mut prev_idx: i64 = -1;
        for v in layer {
            let mut ws = neighbors(v);
            if ws.is_empty() {
                continue;
            }
            ws.sort_by_key(|w| pos.get(w.as_str()).copied().unwrap_or(usize::MAX));

            let (lo, hi) = ((ws.len() - 1) / 2, ws.len() / 2);
            for w in &ws[lo..=hi] {
                let Some(&w_pos) = pos.get(w.as_str()) else {
                    continue;
                };
                if align.get(v) == Some(v)
                    && prev_idx < w_pos as i64
                    && !conflicts.contains(v, w)
                {
                    align.insert(w.clone(), v.clone());
                    let w_root = root.get(w).cloned().unwrap_or_else(|| w.clone());
                    align.insert(v.clone(), w_root.clone());
                    root.insert(v.clone(), w_root);
                    prev_idx = w_pos as i64;
                }
            }
        }
    }

    Alignment { root, align }
}

fn root_of<'a>(root: &'a FxHashMap<String, String>, v: &'a str) -> &'a str {
    root.get(v).map(String::as_str).unwrap_or(v)
}

/// Packs blocks as far left as separation allows, then pulls each block right towards its
/// successors where there is slack. With `reverse_sep` the layering has been mirrored and label
/// offsets flip accordingly.
pub fn horizontal_compaction(
    g: &LayoutGraph,
    layering: &[Vec<String>],
    root: &FxHashMap<String, String>,
    align: &FxHashMap<String, String>,
    reverse_sep: bool,
) -> Xs {
    let block = build_block_graph(g, layering, root, reverse_sep);
    let mut xs: Xs = FxHashMap::default();

    iterate(
        &block,
        |elem| {
            let mut x: f64 = 0.0;
            block.for_each_in_edge(elem, |e, sep| {
                x = x.max(xs.get(&e.v).copied().unwrap_or(0.0) + sep);
            });
            xs.insert(elem.to_string(), x);
        },
        |elem| block.predecessors(elem).into_iter().map(str::to_string).collect(),
    );

    iterate(
        &block,
        |elem| {
            let mut min = f64::INFINITY;
            block.for_each_out_edge(elem, |e, sep| {
                min = min.min(xs.get(&e.w).copied().unwrap_or(0.0) - sep);
            });
            let pinned = g.node(elem).is_some_and(|n| {
                if reverse_sep {
                    matches!(n.kind, NodeKind::BorderLeft)
                } else {
                    matches!(n.kind, NodeKind::BorderRight)
                }
            });
            if min.is_finite() && !pinned {
                let x = xs.entry(elem.to_string()).or_insert(0.0);
                *x = x.max(min);
            }
        },
        |elem| block.successors(elem).into_iter().map(str::to_string).collect(),
    );

    align
        .keys()
        .map(|v| {
            let x = xs.get(root_of(root, v)).copied().unwrap_or(0.0);
            (v.clone(), x)
        })
        .collect()
}

/// Visits every block after the blocks `next` returns for it.
fn iterate<V, N>(block: &BlockGraph, mut visit: V, next: N)
where
    V: FnMut(&str),
    N: Fn(&str) -> Vec<String>,
{
    let mut visited = vec![false; block.node_ix_bound()];
    let mut stack: Vec<String> = block.node_ids();
    while let Some(elem) = stack.pop() {
        let Some(ix) = block.node_ix(&elem) else {
            continue;
        };
        if visited[ix] {
            visit(&elem);
            continue;
        }
        visited[ix] = true;
        let more = next(&elem);
        stack.push(elem);
        stack.extend(more);
    }
}

/// One node per block; an edge between horizontally adjacent blocks carries the largest
/// separation required by any pair of their members.
fn build_block_graph(
    g: &LayoutGraph,
    layering: &[Vec<String>],
    root: &FxHashMap<String, String>,
    reverse_sep: bool,
) -> BlockGraph {
    let mut block: BlockGraph = Graph::new(GraphOptions::default());
    for layer in layering {
        let mut u: Option<&str> = None;
        for v in layer {
            let v_root = root_of(root, v);
            block.ensure_node(v_root);
            if let Some(u) = u {
                let u_root = root_of(root, u);
                let prev = block.edge(u_root, v_root, None).copied().unwrap_or(0.0);
                let required = sep(g, v, u, reverse_sep).max(prev);
                block.set_edge_with_label(u_root, v_root, required);
            }
            u = Some(v);
        }
    }
    block
}

/// Minimum centre distance between `v` and its left neighbor `w`.
fn sep(g: &LayoutGraph, v: &str, w: &str, reverse_sep: bool) -> f64 {
    let (Some(v_label), Some(w_label)) = (g.node(v), g.node(w)) else {
        return 0.0;
    };
    let nodesep = g.graph().nodesep;
    let edgesep = g.graph().edgesep;
    let shift = |delta: f64| if reverse_sep { delta } else { -delta };

    let mut sum = v_label.width / 2.0;
    sum += match v_label.labelpos() {
        Some(LabelPos::L) => shift(-v_label.width / 2.0),
        Some(LabelPos::R) => shift(v_label.width / 2.0),
        _ => 0.0,
    };
    sum += if v_label.is_dummy() { edgesep } else { nodesep } / 2.0;
    sum += if w_label.is_dummy() { edgesep } else { nodesep } / 2.0;
    sum += w_label.width / 2.0;
    sum += match w_label.labelpos() {
        Some(LabelPos::L) => shift(w_label.width / 2.0),
        Some(LabelPos::R) => shift(-w_label.width / 2.0),
        _ => 0.0,
    };
    sum
}

/// Index of the alignment with the narrowest overall extent; ties go to the earliest.
pub fn find_smallest_width_alignment(g: &LayoutGraph, xss: &[(Align, Xs)]) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;
    for (i, (_, xs)) in xss.iter().enumerate() {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for (v, x) in xs {
            let half = g.node(v).map_or(0.0, |n| n.width / 2.0);
            min = min.min(x - half);
            max = max.max(x + half);
        }
        let width = max - min;
        if best.is_none_or(|(b, _)| width < b) {
            best = Some((width, i));
        }
    }
    best.map(|(_, i)| i)
}

fn extent(xs: &Xs) -> (f64, f64) {
    xs.values().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &x| {
        (min.min(x), max.max(x))
    })
}

/// Shifts every alignment onto the one at `align_to`: left alignments share its minimum, right
/// alignments its maximum.
pub fn align_coordinates(xss: &mut [(Align, Xs)], align_to: usize) {
    let Some((to_min, to_max)) = xss.get(align_to).map(|(_, xs)| extent(xs)) else {
        return;
    };
    for (i, (align, xs)) in xss.iter_mut().enumerate() {
        if i == align_to || xs.is_empty() {
            continue;
        }
        let (min, max) = extent(xs);
        let delta = match align {
            Align::UL | Align::DL => to_min - min,
            Align::UR | Align::DR => to_max - max,
        };
        if delta != 0.0 {
            for x in xs.values_mut() {
                *x += delta;
            }
        }
    }
}

/// Final x per node: the requested alignment if one is set, otherwise the mean of the two
/// median candidates.
pub fn balance(xss: &[(Align, Xs)], align: Option<Align>) -> Xs {
    let Some((_, first)) = xss.first() else {
        return FxHashMap::default();
    };
    first
        .keys()
        .map(|v| {
            let x = match align {
                Some(a) => xss
                    .iter()
                    .find(|(k, _)| *k == a)
                    .and_then(|(_, xs)| xs.get(v))
                    .copied()
                    .unwrap_or(0.0),
                None => {
                    let mut vals: Vec<f64> = xss.iter().filter_map(|(_, xs)| xs.get(v).copied()).collect();
                    vals.sort_by(f64::total_cmp);
                    let n = vals.len();
                    (vals[(n - 1) / 2] + vals[n / 2]) / 2.0
                }
            };
            (v.clone(), x)
        })
        .collect()
}

pub fn position_x(g: &LayoutGraph, layering: &[Vec<String>]) -> Xs {
    let mut conflicts = find_type1_conflicts(g, layering);
    conflicts.extend(find_type2_conflicts(g, layering));

    let mut xss: Vec<(Align, Xs)> = Vec::with_capacity(4);
    for align in [Align::UL, Align::UR, Align::DL, Align::DR] {
        let down = matches!(align, Align::DL | Align::DR);
        let right = matches!(align, Align::UR | Align::DR);

        let mut adjusted = layering.to_vec();
        if down {
            adjusted.reverse();
        }
        if right {
            for layer in &mut adjusted {
                layer.reverse();
            }
        }

        let alignment = vertical_alignment(&adjusted, &conflicts, |v| {
            let ns = if down { g.successors(v) } else { g.predecessors(v) };
            ns.into_iter().map(str::to_string).collect()
        });
        let mut xs = horizontal_compaction(g, &adjusted, &alignment.root, &alignment.align, right);
        if right {
            for x in xs.values_mut() {
                *x = -*x;
            }
        }
        xss.push((align, xs));
    }

    if let Some(smallest) = find_smallest_width_alignment(g, &xss) {
        align_coordinates(&mut xss, smallest);
    }
    balance(&xss, g.graph().align)
}

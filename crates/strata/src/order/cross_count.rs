//! Weighted crossing count between adjacent layers, using the accumulator tree of Barth, Jünger
//! and Mutzel ("Simple and Efficient Bilayer Cross Counting").

use crate::LayoutGraph;
use rustc_hash::FxHashMap;

pub fn cross_count(g: &LayoutGraph, layering: &[Vec<String>]) -> f64 {
    layering
        .windows(2)
        .map(|pair| two_layer_cross_count(g, &pair[0], &pair[1]))
        .sum()
}

fn two_layer_cross_count(g: &LayoutGraph, north: &[String], south: &[String]) -> f64 {
    let south_pos: FxHashMap<&str, usize> = south
        .iter()
        .enumerate()
        .map(|(i, v)| (v.as_str(), i))
        .collect();

    // South endpoints of all edges, in north order, each group sorted by south position.
    let mut entries: Vec<(usize, f64)> = Vec::new();
    for v in north {
        let start = entries.len();
        g.for_each_out_edge(v, |key, label| {
            if let Some(&pos) = south_pos.get(key.w.as_str()) {
                entries.push((pos, label.weight));
            }
        });
        entries[start..].sort_by_key(|(pos, _)| *pos);
    }

    let mut first_index = 1usize;
    while first_index < south.len() {
        first_index <<= 1;
    }
    let tree_size = 2 * first_index - 1;
    first_index -= 1;
    let mut tree = vec![0.0f64; tree_size];

    let mut cc = 0.0;
    for (pos, weight) in entries {
        let mut index = pos + first_index;
        tree[index] += weight;
        let mut weight_sum = 0.0;
        while index > 0 {
            if index % 2 == 1 {
                weight_sum += tree[index + 1];
            }
            index = (index - 1) >> 1;
            tree[index] += weight;
        }
        cc += weight * weight_sum;
    }
    cc
}

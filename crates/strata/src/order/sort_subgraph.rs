//! Orders the children of one layer-graph node, recursing into nested clusters.
//!
//! A cluster is sorted as a unit: its members are ordered first, then the cluster takes the
//! combined barycenter of its members and its border nodes are pinned to either end.

use super::{
    BarycenterEntry, ConstraintGraph, LayerGraph, SortResult, barycenter, resolve_conflicts, sort,
};
use rustc_hash::FxHashMap;

pub fn sort_subgraph(g: &LayerGraph, v: &str, cg: &ConstraintGraph, bias_right: bool) -> SortResult {
    let (bl, br) = g
        .node(v)
        .map(|n| (n.border_left.clone(), n.border_right.clone()))
        .unwrap_or_default();

    let movable: Vec<String> = g
        .children(v)
        .into_iter()
        .filter(|w| bl.as_deref() != Some(*w) && br.as_deref() != Some(*w))
        .map(str::to_string)
        .collect();

    let mut barycenters = barycenter(g, &movable);
    let mut subgraphs: FxHashMap<String, SortResult> = FxHashMap::default();
    for entry in &mut barycenters {
        if g.has_children(&entry.v) {
            let result = sort_subgraph(g, &entry.v, cg, bias_right);
            if let Some(b) = result.barycenter {
                merge_barycenters(entry, b, result.weight);
            }
            subgraphs.insert(entry.v.clone(), result);
        }
    }

    let mut entries = resolve_conflicts(&barycenters, cg);
    for entry in &mut entries {
        let vs = std::mem::take(&mut entry.vs);
        entry.vs = vs
            .into_iter()
            .flat_map(|v| match subgraphs.remove(&v) {
                Some(sub) => sub.vs,
                None => vec![v],
            })
            .collect();
    }

    let mut result = sort(entries, bias_right);

    if let (Some(bl), Some(br)) = (bl, br) {
        let order_of_pred = |border: &str| {
            g.predecessors(border)
                .first()
                .and_then(|p| g.node(p))
                .and_then(|n| n.order)
        };
        let preds = (order_of_pred(&bl), order_of_pred(&br));

        let mut vs = Vec::with_capacity(result.vs.len() + 2);
        vs.push(bl);
        vs.append(&mut result.vs);
        vs.push(br);
        result.vs = vs;

        if let (Some(bl_order), Some(br_order)) = preds {
            let sum = result.barycenter.unwrap_or(0.0) * result.weight;
            result.barycenter = Some((sum + bl_order as f64 + br_order as f64) / (result.weight + 2.0));
            result.weight += 2.0;
        }
    }

    result
}

fn merge_barycenters(target: &mut BarycenterEntry, barycenter: f64, weight: f64) {
    match target.barycenter {
        Some(b) => {
            target.barycenter =
                Some((b * target.weight + barycenter * weight) / (target.weight + weight));
            target.weight += weight;
        }
        None => {
            target.barycenter = Some(barycenter);
            target.weight = weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphlib::{Graph, GraphOptions};
    use crate::order::{LayerGraphLabel, LayerNode};

    fn layer_graph() -> LayerGraph {
        let mut g: LayerGraph = Graph::new(GraphOptions::compound());
        g.set_graph(LayerGraphLabel {
            root: "root".into(),
        });
        g.set_default_edge_label(|| 1.0);
        g
    }

    fn fixed(g: &mut LayerGraph, v: &str, order: usize) {
        g.set_node(
            v,
            LayerNode {
                order: Some(order),
                ..Default::default()
            },
        );
    }

    #[test]
    fn sorts_flat_children_by_barycenter() {
        let mut g = layer_graph();
        for (i, v) in ["up0", "up1", "up2"].iter().enumerate() {
            fixed(&mut g, v, i);
        }
        for v in ["a", "b", "c"] {
            g.set_parent(v, "root").unwrap();
        }
        g.set_edge("up2", "a");
        g.set_edge("up1", "b");
        g.set_edge("up0", "c");

        let cg: ConstraintGraph = Graph::new(GraphOptions::default());
        let result = sort_subgraph(&g, "root", &cg, false);
        assert_eq!(result.vs, ["c", "b", "a"]);
    }

    #[test]
    fn keeps_cluster_members_contiguous_between_borders() {
        let mut g = layer_graph();
        for (i, v) in ["up0", "up1", "up2", "up3"].iter().enumerate() {
            fixed(&mut g, v, i);
        }
        g.set_node(
            "sg",
            LayerNode {
                border_left: Some("bl".into()),
                border_right: Some("br".into()),
                ..Default::default()
            },
        );
        g.set_parent("sg", "root").unwrap();
        for v in ["bl", "br", "x", "y"] {
            g.set_parent(v, "sg").unwrap();
        }
        g.set_parent("z", "root").unwrap();
        g.set_edge("up0", "x");
        g.set_edge("up3", "y");
        g.set_edge("up1", "z");

        let cg: ConstraintGraph = Graph::new(GraphOptions::default());
        let result = sort_subgraph(&g, "root", &cg, false);
        let pos = |v: &str| result.vs.iter().position(|w| w == v).unwrap();
        assert_eq!(result.vs.len(), 5);
        assert_eq!(pos("bl") + 1, pos("x"));
        assert_eq!(pos("x") + 1, pos("y"));
        assert_eq!(pos("y") + 1, pos("br"));
    }
}

use super::LayerGraph;

#[derive(Debug, Clone, PartialEq)]
pub struct BarycenterEntry {
    pub v: String,
    /// Weighted mean order of the in-neighbors; `None` when there are none.
    pub barycenter: Option<f64>,
    pub weight: f64,
}

pub fn barycenter(g: &LayerGraph, movable: &[String]) -> Vec<BarycenterEntry> {
    movable
        .iter()
        .map(|v| {
            let mut sum = 0.0;
            let mut weight = 0.0;
            let mut any = false;
            g.for_each_in_edge(v, |key, edge_weight| {
                let order = g.node(&key.v).and_then(|n| n.order).unwrap_or(0);
                sum += edge_weight * order as f64;
                weight += edge_weight;
                any = true;
            });
            BarycenterEntry {
                v: v.clone(),
                barycenter: (any && weight != 0.0).then(|| sum / weight),
                weight: if any { weight } else { 0.0 },
            }
        })
        .collect()
}

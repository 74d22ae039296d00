//! Reconciles barycenter order with the constraint graph.
//!
//! Entries are visited in topological order of the constraints. When a constrained predecessor
//! would land right of its successor (or either has no barycenter), the two are merged into one
//! entry whose node list keeps the required order. This is the approach of Forster, "A Fast and
//! Simple Heuristic for Constrained Two-Level Crossing Reduction".

use super::{BarycenterEntry, ConstraintGraph};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntry {
    pub vs: Vec<String>,
    /// Smallest original index among the merged entries.
    pub i: usize,
    pub barycenter: Option<f64>,
    pub weight: f64,
}

struct Mapped {
    indegree: usize,
    ins: Vec<usize>,
    outs: Vec<usize>,
    vs: Vec<String>,
    i: usize,
    barycenter: Option<f64>,
    weight: f64,
    merged: bool,
}

pub fn resolve_conflicts(entries: &[BarycenterEntry], cg: &ConstraintGraph) -> Vec<ResolvedEntry> {
    let mut mapped: Vec<Mapped> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| Mapped {
            indegree: 0,
            ins: Vec::new(),
            outs: Vec::new(),
            vs: vec![entry.v.clone()],
            i,
            barycenter: entry.barycenter,
            weight: if entry.barycenter.is_some() {
                entry.weight
            } else {
                0.0
            },
            merged: false,
        })
        .collect();
    let index: FxHashMap<&str, usize> = entries
        .iter()
        .enumerate()
        .map(|(i, e)| (e.v.as_str(), i))
        .collect();

    for e in cg.edges() {
        let (Some(&v), Some(&w)) = (index.get(e.v.as_str()), index.get(e.w.as_str())) else {
            continue;
        };
        mapped[w].indegree += 1;
        mapped[v].outs.push(w);
    }

    let mut sources: Vec<usize> = (0..mapped.len())
        .filter(|&ix| mapped[ix].indegree == 0)
        .collect();
    let mut visited: Vec<usize> = Vec::new();

    while let Some(v) = sources.pop() {
        visited.push(v);

        let ins: Vec<usize> = mapped[v].ins.iter().rev().copied().collect();
        for u in ins {
            if mapped[u].merged {
                continue;
            }
            let (ub, vb) = (mapped[u].barycenter, mapped[v].barycenter);
            let must_merge = match (ub, vb) {
                (Some(ub), Some(vb)) => ub >= vb,
                _ => true,
            };
            if must_merge {
                merge_entries(&mut mapped, v, u);
            }
        }

        let outs = mapped[v].outs.clone();
        for w in outs {
            mapped[w].ins.push(v);
            mapped[w].indegree -= 1;
            if mapped[w].indegree == 0 {
                sources.push(w);
            }
        }
    }

    visited
        .into_iter()
        .filter(|&ix| !mapped[ix].merged)
        .map(|ix| {
            let m = &mapped[ix];
            ResolvedEntry {
                vs: m.vs.clone(),
                i: m.i,
                barycenter: m.barycenter,
                weight: m.weight,
            }
        })
        .collect()
}

fn merge_entries(mapped: &mut [Mapped], target: usize, source: usize) {
    let mut sum = 0.0;
    let mut weight = 0.0;
    for ix in [target, source] {
        if let Some(b) = mapped[ix].barycenter {
            if mapped[ix].weight != 0.0 {
                sum += b * mapped[ix].weight;
                weight += mapped[ix].weight;
            }
        }
    }

    let mut vs = std::mem::take(&mut mapped[source].vs);
    vs.append(&mut mapped[target].vs);
    let source_i = mapped[source].i;

    let t = &mut mapped[target];
    t.vs = vs;
    t.barycenter = (weight != 0.0).then(|| sum / weight);
    t.weight = weight;
    t.i = t.i.min(source_i);
    mapped[source].merged = true;
}

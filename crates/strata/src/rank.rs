//! Layer assignment.
//!
//! Every ranker guarantees `rank(w) - rank(v) >= minlen` for each edge `v -> w`. Ranks are not
//! normalized here; callers shift them with [`crate::util::normalize_ranks`].

pub mod feasible_tree;
pub mod network_simplex;
pub mod util;

use crate::{LayoutGraph, Ranker};

pub use feasible_tree::feasible_tree;
pub use network_simplex::network_simplex;
pub use util::{longest_path, slack};

/// Ranks a non-compound graph with the configured [`Ranker`].
pub fn rank(g: &mut LayoutGraph) {
    match g.graph().ranker {
        Ranker::NetworkSimplex => network_simplex(g),
        Ranker::TightTree => {
            longest_path(g);
            feasible_tree(g);
        }
        Ranker::LongestPath => longest_path(g),
        Ranker::None => {}
    }
}

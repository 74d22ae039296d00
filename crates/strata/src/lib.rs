#![forbid(unsafe_code)]

//! Layered graph layout.
//!
//! [`layout`] takes a graph whose nodes carry `width`/`height` and assigns every node an `x`/`y`
//! centre, every edge a polyline of `points`, and the graph an overall `width`/`height`. The
//! work is split into the classic Sugiyama phases, each available as its own module:
//!
//! 1. [`acyclic`] reverses a feedback arc set,
//! 2. [`rank`] assigns layers,
//! 3. [`nesting_graph`] and [`normalize`] handle clusters and long edges,
//! 4. [`order`] reduces crossings,
//! 5. [`position`] assigns coordinates,
//! 6. [`coordinate_system`] maps the top-to-bottom result onto the requested direction.

pub use strata_graphlib as graphlib;

mod error;
mod model;

pub mod acyclic;
pub mod add_border_segments;
pub mod coordinate_system;
pub mod greedy_fas;
pub mod layout;
pub mod nesting_graph;
pub mod normalize;
pub mod order;
pub mod parent_dummy_chains;
pub mod position;
pub mod rank;
pub mod self_edges;
pub mod util;

pub use error::{Error, Result};
pub use layout::layout;
pub use model::{
    Acyclicer, Align, Cluster, EdgeDummy, EdgeLabel, GraphLabel, LabelPos, NodeKind, NodeLabel,
    Point, RankDir, Ranker, SelfEdge,
};

/// The graph type every layout stage operates on.
pub type LayoutGraph = graphlib::Graph<NodeLabel, EdgeLabel, GraphLabel>;

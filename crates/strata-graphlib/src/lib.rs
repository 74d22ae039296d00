#![forbid(unsafe_code)]

//! Graph container used by the `strata` layout engine.
//!
//! Graphs are directed or undirected, simple or multi-edge, flat or compound. Nodes and edges
//! carry arbitrary labels and are identified by strings; internally both live in dense arenas
//! with index handles so the layout stages can walk adjacency without rescanning edge lists.

mod error;
pub mod graph;

pub use error::{GraphError, Result};
pub use graph::{EdgeKey, GRAPH_ROOT, Graph, GraphOptions, alg};

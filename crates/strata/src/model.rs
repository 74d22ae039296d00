//! Label types carried by the layout graph.
//!
//! Every node has the same geometry record (`width`, `height`, `x`, `y`, `rank`, `order`);
//! what a node *is* lives in [`NodeKind`], so stages match on the variant instead of probing
//! optional fields.

use crate::graphlib::EdgeKey;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RankDir {
    #[default]
    TB,
    BT,
    LR,
    RL,
}

impl RankDir {
    pub fn is_horizontal(self) -> bool {
        matches!(self, RankDir::LR | RankDir::RL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ranker {
    #[default]
    NetworkSimplex,
    TightTree,
    LongestPath,
    /// Keep the ranks already present on the input nodes.
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Acyclicer {
    Greedy,
    #[default]
    #[serde(alias = "default")]
    Dfs,
}

/// Which of the four Brandes-Köpf alignments to use instead of their balanced average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Align {
    UL,
    UR,
    DL,
    DR,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LabelPos {
    #[serde(alias = "l")]
    L,
    #[serde(alias = "c")]
    C,
    #[default]
    #[serde(alias = "r")]
    R,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Graph-level configuration and layout outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphLabel {
    pub rankdir: RankDir,
    pub ranker: Ranker,
    pub acyclicer: Acyclicer,
    pub align: Option<Align>,
    pub nodesep: f64,
    pub edgesep: f64,
    pub ranksep: f64,
    pub marginx: f64,
    pub marginy: f64,
    /// Number of consecutive non-improving ordering sweeps before giving up.
    pub order_iterations: usize,

    pub width: f64,
    pub height: f64,

    #[serde(skip)]
    pub dummy_chains: Vec<String>,
    #[serde(skip)]
    pub nesting_root: Option<String>,
    #[serde(skip)]
    pub node_rank_factor: usize,
    #[serde(skip)]
    pub max_rank: i32,
}

impl Default for GraphLabel {
    fn default() -> Self {
        Self {
            rankdir: RankDir::TB,
            ranker: Ranker::NetworkSimplex,
            acyclicer: Acyclicer::Dfs,
            align: None,
            nodesep: 50.0,
            edgesep: 20.0,
            ranksep: 50.0,
            marginx: 0.0,
            marginy: 0.0,
            order_iterations: 4,
            width: 0.0,
            height: 0.0,
            dummy_chains: Vec::new(),
            nesting_root: None,
            node_rank_factor: 0,
            max_rank: 0,
        }
    }
}

impl GraphLabel {
    /// Parses a JSON configuration object; missing keys keep their defaults.
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Bookkeeping for a compound (cluster) node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cluster {
    pub min_rank: i32,
    pub max_rank: i32,
    pub border_top: Option<String>,
    pub border_bottom: Option<String>,
    /// Indexed by rank; only `min_rank..=max_rank` is populated.
    pub border_left: Vec<Option<String>>,
    pub border_right: Vec<Option<String>>,
}

/// A dummy node standing in for one rank of a long edge.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeDummy {
    pub edge: EdgeKey,
    pub label: Box<EdgeLabel>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelfEdge {
    pub edge: EdgeKey,
    pub label: EdgeLabel,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum NodeKind {
    #[default]
    Real,
    BorderLeft,
    BorderRight,
    BorderTop,
    BorderBottom,
    Edge(EdgeDummy),
    EdgeLabel(EdgeDummy),
    EdgeProxy(EdgeKey),
    SelfEdge(SelfEdge),
    Root,
}

impl NodeKind {
    pub fn is_dummy(&self) -> bool {
        !matches!(self, NodeKind::Real)
    }

    pub fn is_border(&self) -> bool {
        matches!(
            self,
            NodeKind::BorderLeft | NodeKind::BorderRight | NodeKind::BorderTop | NodeKind::BorderBottom
        )
    }

    pub fn edge_dummy(&self) -> Option<&EdgeDummy> {
        match self {
            NodeKind::Edge(d) | NodeKind::EdgeLabel(d) => Some(d),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeLabel {
    pub width: f64,
    pub height: f64,
    pub x: f64,
    pub y: f64,
    /// Layer index; unset on cluster nodes, which span `cluster.min_rank..=cluster.max_rank`.
    pub rank: Option<i32>,
    pub order: Option<usize>,
    pub kind: NodeKind,
    pub cluster: Option<Cluster>,
    pub self_edges: Vec<SelfEdge>,
}

impl NodeLabel {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn dummy(kind: NodeKind) -> Self {
        Self {
            kind,
            ..Default::default()
        }
    }

    pub fn with_rank(mut self, rank: i32) -> Self {
        self.rank = Some(rank);
        self
    }

    pub fn is_dummy(&self) -> bool {
        self.kind.is_dummy()
    }

    /// Label side for edge-label dummies; other nodes have none.
    pub fn labelpos(&self) -> Option<LabelPos> {
        match &self.kind {
            NodeKind::EdgeLabel(d) => Some(d.label.labelpos),
            _ => None,
        }
    }

    pub fn cluster_mut(&mut self) -> &mut Cluster {
        self.cluster.get_or_insert_with(Cluster::default)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLabel {
    pub width: f64,
    pub height: f64,
    pub labelpos: LabelPos,
    pub labeloffset: f64,
    pub label_rank: Option<i32>,
    pub minlen: usize,
    pub weight: f64,
    pub nesting_edge: bool,
    pub reversed: bool,
    pub forward_name: Option<String>,

    /// Label centre; only set for edges whose label occupied a dummy node.
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub points: Vec<Point>,
}

impl Default for EdgeLabel {
    fn default() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            labelpos: LabelPos::R,
            labeloffset: 10.0,
            label_rank: None,
            minlen: 1,
            weight: 1.0,
            nesting_edge: false,
            reversed: false,
            forward_name: None,
            x: None,
            y: None,
            points: Vec::new(),
        }
    }
}

impl EdgeLabel {
    pub fn weighted(weight: f64) -> Self {
        Self {
            weight,
            ..Default::default()
        }
    }

    pub fn with_minlen(mut self, minlen: usize) -> Self {
        self.minlen = minlen;
        self
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

//! The core [`Graph`] container.
//!
//! Nodes and edges are stored in insertion-ordered arenas. Removing an entry leaves a tombstone
//! so that the indices held by adjacency lists stay valid; iteration skips tombstones and keeps
//! the original insertion order, which the layout stages rely on for determinism.

mod edge_key;
mod entries;
mod options;

pub mod alg;

use crate::{GraphError, Result};
use edge_key::EdgeKeyView;
use entries::{EdgeEntry, NodeEntry};
use rustc_hash::FxBuildHasher;

pub use edge_key::EdgeKey;
pub use options::GraphOptions;

type HashMap<K, V> = hashbrown::HashMap<K, V, FxBuildHasher>;

/// Parent id reported for top-level nodes of a compound graph.
pub const GRAPH_ROOT: &str = "\u{0}";

pub struct Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    options: GraphOptions,

    graph_label: G,
    default_node_label: Box<dyn Fn() -> N + Send + Sync>,
    default_edge_label: Box<dyn Fn() -> E + Send + Sync>,

    nodes: Vec<Option<NodeEntry<N>>>,
    node_index: HashMap<String, usize>,

    edges: Vec<Option<EdgeEntry<E>>>,
    edge_index: HashMap<EdgeKey, usize>,

    parent: HashMap<String, String>,
    children: HashMap<String, Vec<String>>,
}

impl<N, E, G> std::fmt::Debug for Graph<N, E, G>
where
    N: Default + std::fmt::Debug + 'static,
    E: Default + std::fmt::Debug + 'static,
    G: Default + std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("options", &self.options)
            .field("graph", &self.graph_label)
            .field("nodes", &self.node_ids())
            .field("edges", &self.edge_keys())
            .finish()
    }
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default + 'static,
    E: Default + 'static,
    G: Default,
{
    pub fn new(options: GraphOptions) -> Self {
        Self {
            options,
            graph_label: G::default(),
            default_node_label: Box::new(N::default),
            default_edge_label: Box::new(E::default),
            nodes: Vec::new(),
            node_index: HashMap::default(),
            edges: Vec::new(),
            edge_index: HashMap::default(),
            parent: HashMap::default(),
            children: HashMap::default(),
        }
    }

    pub fn options(&self) -> GraphOptions {
        self.options
    }

    pub fn is_directed(&self) -> bool {
        self.options.directed
    }

    pub fn is_multigraph(&self) -> bool {
        self.options.multigraph
    }

    pub fn is_compound(&self) -> bool {
        self.options.compound
    }

    pub fn set_graph(&mut self, label: G) -> &mut Self {
        self.graph_label = label;
        self
    }

    pub fn graph(&self) -> &G {
        &self.graph_label
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph_label
    }

    pub fn set_default_node_label<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> N + Send + Sync + 'static,
    {
        self.default_node_label = Box::new(f);
        self
    }

    pub fn set_default_edge_label<F>(&mut self, f: F) -> &mut Self
    where
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.default_edge_label = Box::new(f);
        self
    }

    // ---- nodes ----

    pub fn has_node(&self, id: &str) -> bool {
        self.node_index.contains_key(id)
    }

    pub fn set_node(&mut self, id: impl Into<String>, label: N) -> &mut Self {
        let id = id.into();
        if let Some(&ix) = self.node_index.get(&id) {
            if let Some(entry) = self.nodes[ix].as_mut() {
                entry.label = label;
            }
            return self;
        }
        let ix = self.nodes.len();
        self.nodes.push(Some(NodeEntry {
            id: id.clone(),
            label,
            in_edges: Vec::new(),
            out_edges: Vec::new(),
        }));
        self.node_index.insert(id, ix);
        self
    }

    pub fn ensure_node(&mut self, id: impl Into<String>) -> &mut Self {
        let id = id.into();
        if self.node_index.contains_key(&id) {
            return self;
        }
        let label = (self.default_node_label)();
        self.set_node(id, label)
    }

    pub fn node(&self, id: &str) -> Option<&N> {
        let ix = *self.node_index.get(id)?;
        self.nodes[ix].as_ref().map(|n| &n.label)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut N> {
        let ix = *self.node_index.get(id)?;
        self.nodes[ix].as_mut().map(|n| &mut n.label)
    }

    pub fn node_count(&self) -> usize {
        self.node_index.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().flatten().map(|n| n.id.as_str())
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.nodes().map(str::to_string).collect()
    }

    /// Iterates `(id, label)` pairs in insertion order.
    pub fn node_labels(&self) -> impl Iterator<Item = (&str, &N)> {
        self.nodes
            .iter()
            .flatten()
            .map(|n| (n.id.as_str(), &n.label))
    }

    pub fn node_labels_mut(&mut self) -> impl Iterator<Item = (&str, &mut N)> {
        self.nodes
            .iter_mut()
            .flatten()
            .map(|n| (n.id.as_str(), &mut n.label))
    }

    /// Arena index of a node. Stable until the node is removed.
    pub fn node_ix(&self, id: &str) -> Option<usize> {
        self.node_index.get(id).copied()
    }

    pub fn node_id_by_ix(&self, ix: usize) -> Option<&str> {
        self.nodes.get(ix)?.as_ref().map(|n| n.id.as_str())
    }

    /// Upper bound (exclusive) of node arena indices, for sizing dense side tables.
    pub fn node_ix_bound(&self) -> usize {
        self.nodes.len()
    }

    pub fn remove_node(&mut self, id: &str) -> bool {
        let Some(ix) = self.node_index.remove(id) else {
            return false;
        };
        let Some(entry) = self.nodes[ix].take() else {
            return false;
        };

        let mut incident: Vec<usize> = entry.in_edges;
        incident.extend(entry.out_edges);
        incident.sort_unstable();
        incident.dedup();
        for edge_ix in incident {
            self.remove_edge_at(edge_ix);
        }

        if self.options.compound {
            let new_parent = self.parent.remove(id);
            if let Some(p) = new_parent.as_deref() {
                if let Some(siblings) = self.children.get_mut(p) {
                    siblings.retain(|c| c != id);
                }
            }
            if let Some(orphans) = self.children.remove(id) {
                for child in orphans {
                    match new_parent.as_deref() {
                        Some(p) => {
                            self.parent.insert(child.clone(), p.to_string());
                            self.children.entry(p.to_string()).or_default().push(child);
                        }
                        None => {
                            self.parent.remove(&child);
                        }
                    }
                }
            }
        }
        true
    }

    // ---- edges ----

    fn edge_key_view<'a>(&self, v: &'a str, w: &'a str, name: Option<&'a str>) -> EdgeKeyView<'a> {
        let (v, w) = if self.options.directed || v <= w {
            (v, w)
        } else {
            (w, v)
        };
        let name = if self.options.multigraph { name } else { None };
        EdgeKeyView { v, w, name }
    }

    fn canonicalize_key(&self, mut key: EdgeKey) -> EdgeKey {
        if !self.options.directed && key.v > key.w {
            std::mem::swap(&mut key.v, &mut key.w);
        }
        if !self.options.multigraph {
            key.name = None;
        }
        key
    }

    fn edge_ix_of(&self, v: &str, w: &str, name: Option<&str>) -> Option<usize> {
        let view = self.edge_key_view(v, w, name);
        self.edge_index.get(&view).copied()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.iter().flatten().map(|e| &e.key)
    }

    pub fn edge_keys(&self) -> Vec<EdgeKey> {
        self.edges().cloned().collect()
    }

    pub fn edge_labels(&self) -> impl Iterator<Item = (&EdgeKey, &E)> {
        self.edges.iter().flatten().map(|e| (&e.key, &e.label))
    }

    pub fn edge_labels_mut(&mut self) -> impl Iterator<Item = (&EdgeKey, &mut E)> {
        self.edges
            .iter_mut()
            .flatten()
            .map(|e| (&e.key, &mut e.label))
    }

    pub fn set_edge(&mut self, v: impl Into<String>, w: impl Into<String>) -> &mut Self {
        self.set_edge_named(v, w, None::<String>, None)
    }

    pub fn set_edge_with_label(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        label: E,
    ) -> &mut Self {
        self.set_edge_named(v, w, None::<String>, Some(label))
    }

    /// Creates or updates an edge. Missing endpoints are created with the default node label.
    /// `label = None` keeps an existing label or assigns the default edge label.
    pub fn set_edge_named(
        &mut self,
        v: impl Into<String>,
        w: impl Into<String>,
        name: Option<impl Into<String>>,
        label: Option<E>,
    ) -> &mut Self {
        let key = self.canonicalize_key(EdgeKey {
            v: v.into(),
            w: w.into(),
            name: name.map(Into::into),
        });

        if let Some(&ix) = self.edge_index.get(&key) {
            if let (Some(label), Some(entry)) = (label, self.edges[ix].as_mut()) {
                entry.label = label;
            }
            return self;
        }

        self.ensure_node(key.v.clone());
        self.ensure_node(key.w.clone());
        let v_ix = self.node_index[&key.v];
        let w_ix = self.node_index[&key.w];

        let label = label.unwrap_or_else(|| (self.default_edge_label)());
        let ix = self.edges.len();
        if let Some(n) = self.nodes[v_ix].as_mut() {
            n.out_edges.push(ix);
        }
        if let Some(n) = self.nodes[w_ix].as_mut() {
            n.in_edges.push(ix);
        }
        self.edges.push(Some(EdgeEntry {
            key: key.clone(),
            v_ix,
            w_ix,
            label,
        }));
        self.edge_index.insert(key, ix);
        self
    }

    pub fn set_edge_key(&mut self, key: EdgeKey, label: E) -> &mut Self {
        self.set_edge_named(key.v, key.w, key.name, Some(label))
    }

    pub fn set_path(&mut self, nodes: &[&str]) -> &mut Self {
        for pair in nodes.windows(2) {
            self.set_edge(pair[0], pair[1]);
        }
        self
    }

    pub fn has_edge(&self, v: &str, w: &str, name: Option<&str>) -> bool {
        self.edge_ix_of(v, w, name).is_some()
    }

    pub fn edge(&self, v: &str, w: &str, name: Option<&str>) -> Option<&E> {
        let ix = self.edge_ix_of(v, w, name)?;
        self.edges[ix].as_ref().map(|e| &e.label)
    }

    pub fn edge_mut(&mut self, v: &str, w: &str, name: Option<&str>) -> Option<&mut E> {
        let ix = self.edge_ix_of(v, w, name)?;
        self.edges[ix].as_mut().map(|e| &mut e.label)
    }

    pub fn edge_by_key(&self, key: &EdgeKey) -> Option<&E> {
        self.edge(&key.v, &key.w, key.name.as_deref())
    }

    pub fn edge_mut_by_key(&mut self, key: &EdgeKey) -> Option<&mut E> {
        self.edge_mut(&key.v, &key.w, key.name.as_deref())
    }

    fn remove_edge_at(&mut self, ix: usize) {
        let Some(entry) = self.edges[ix].take() else {
            return;
        };
        self.edge_index.remove(&entry.key);
        if let Some(n) = self.nodes[entry.v_ix].as_mut() {
            n.out_edges.retain(|&e| e != ix);
        }
        if let Some(n) = self.nodes[entry.w_ix].as_mut() {
            n.in_edges.retain(|&e| e != ix);
        }
    }

    pub fn remove_edge(&mut self, v: &str, w: &str, name: Option<&str>) -> bool {
        let Some(ix) = self.edge_ix_of(v, w, name) else {
            return false;
        };
        self.remove_edge_at(ix);
        true
    }

    pub fn remove_edge_key(&mut self, key: &EdgeKey) -> bool {
        self.remove_edge(&key.v, &key.w, key.name.as_deref())
    }

    // ---- adjacency ----

    fn entry(&self, v: &str) -> Option<&NodeEntry<N>> {
        let ix = *self.node_index.get(v)?;
        self.nodes[ix].as_ref()
    }

    fn edge_entry(&self, ix: usize) -> Option<&EdgeEntry<E>> {
        self.edges.get(ix)?.as_ref()
    }

    /// Every edge index incident on `v`, outgoing first.
    fn incident(&self, v: &str) -> Vec<usize> {
        let Some(n) = self.entry(v) else {
            return Vec::new();
        };
        let mut out = n.out_edges.clone();
        for &e in &n.in_edges {
            if !out.contains(&e) {
                out.push(e);
            }
        }
        out
    }

    fn push_unique<'a>(out: &mut Vec<&'a str>, id: &'a str) {
        if !out.contains(&id) {
            out.push(id);
        }
    }

    pub fn successors(&self, v: &str) -> Vec<&str> {
        if !self.options.directed {
            return self.neighbors(v);
        }
        let mut out: Vec<&str> = Vec::new();
        if let Some(n) = self.entry(v) {
            for &e in &n.out_edges {
                if let Some(e) = self.edge_entry(e) {
                    Self::push_unique(&mut out, e.key.w.as_str());
                }
            }
        }
        out
    }

    pub fn predecessors(&self, v: &str) -> Vec<&str> {
        if !self.options.directed {
            return self.neighbors(v);
        }
        let mut out: Vec<&str> = Vec::new();
        if let Some(n) = self.entry(v) {
            for &e in &n.in_edges {
                if let Some(e) = self.edge_entry(e) {
                    Self::push_unique(&mut out, e.key.v.as_str());
                }
            }
        }
        out
    }

    /// Union of predecessors and successors, successors first.
    pub fn neighbors(&self, v: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for ix in self.incident(v) {
            if let Some(e) = self.edge_entry(ix) {
                let other = if e.key.v == v { &e.key.w } else { &e.key.v };
                Self::push_unique(&mut out, other.as_str());
            }
        }
        out
    }

    pub fn out_edges(&self, v: &str, w: Option<&str>) -> Vec<EdgeKey> {
        if !self.options.directed {
            return self.node_edges(v, w);
        }
        let Some(n) = self.entry(v) else {
            return Vec::new();
        };
        n.out_edges
            .iter()
            .filter_map(|&ix| self.edge_entry(ix))
            .filter(|e| w.is_none_or(|w| e.key.w == w))
            .map(|e| e.key.clone())
            .collect()
    }

    pub fn in_edges(&self, v: &str, u: Option<&str>) -> Vec<EdgeKey> {
        if !self.options.directed {
            return self.node_edges(v, u);
        }
        let Some(n) = self.entry(v) else {
            return Vec::new();
        };
        n.in_edges
            .iter()
            .filter_map(|&ix| self.edge_entry(ix))
            .filter(|e| u.is_none_or(|u| e.key.v == u))
            .map(|e| e.key.clone())
            .collect()
    }

    /// Edges incident on `v`, optionally restricted to those whose other endpoint is `w`.
    pub fn node_edges(&self, v: &str, w: Option<&str>) -> Vec<EdgeKey> {
        self.incident(v)
            .into_iter()
            .filter_map(|ix| self.edge_entry(ix))
            .filter(|e| {
                let other = if e.key.v == v { &e.key.w } else { &e.key.v };
                w.is_none_or(|w| other == w)
            })
            .map(|e| e.key.clone())
            .collect()
    }

    /// Calls `f(key, label)` for each out-edge of `v` without cloning keys.
    pub fn for_each_out_edge<F>(&self, v: &str, mut f: F)
    where
        F: FnMut(&EdgeKey, &E),
    {
        let Some(n) = self.entry(v) else {
            return;
        };
        for &ix in &n.out_edges {
            if let Some(e) = self.edge_entry(ix) {
                f(&e.key, &e.label);
            }
        }
    }

    pub fn for_each_in_edge<F>(&self, v: &str, mut f: F)
    where
        F: FnMut(&EdgeKey, &E),
    {
        let Some(n) = self.entry(v) else {
            return;
        };
        for &ix in &n.in_edges {
            if let Some(e) = self.edge_entry(ix) {
                f(&e.key, &e.label);
            }
        }
    }

    pub fn sources(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| !self.options.directed || n.in_edges.is_empty())
            .map(|n| n.id.as_str())
            .collect()
    }

    pub fn sinks(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .flatten()
            .filter(|n| !self.options.directed || n.out_edges.is_empty())
            .map(|n| n.id.as_str())
            .collect()
    }

    // ---- hierarchy ----

    /// Moves `child` under `parent`, creating either node if needed.
    pub fn set_parent(
        &mut self,
        child: impl Into<String>,
        parent: impl Into<String>,
    ) -> Result<&mut Self> {
        if !self.options.compound {
            return Err(GraphError::NotCompound);
        }
        let child = child.into();
        let parent = parent.into();

        let mut ancestor = Some(parent.as_str());
        while let Some(a) = ancestor {
            if a == child {
                return Err(GraphError::ParentCycle { child, parent });
            }
            ancestor = self.parent.get(a).map(String::as_str);
        }

        self.ensure_node(child.clone());
        self.ensure_node(parent.clone());
        if let Some(prev) = self.parent.insert(child.clone(), parent.clone()) {
            if let Some(siblings) = self.children.get_mut(&prev) {
                siblings.retain(|c| c != &child);
            }
        }
        let entry = self.children.entry(parent).or_default();
        if !entry.contains(&child) {
            entry.push(child);
        }
        Ok(self)
    }

    /// Moves `child` back to the top level.
    pub fn clear_parent(&mut self, child: &str) -> &mut Self {
        if let Some(prev) = self.parent.remove(child) {
            if let Some(siblings) = self.children.get_mut(&prev) {
                siblings.retain(|c| c != child);
            }
        }
        self
    }

    pub fn parent(&self, child: &str) -> Option<&str> {
        self.parent.get(child).map(String::as_str)
    }

    /// Direct children of `parent`. Passing [`GRAPH_ROOT`] yields the top-level nodes.
    pub fn children(&self, parent: &str) -> Vec<&str> {
        if parent == GRAPH_ROOT {
            return self.children_root();
        }
        if !self.options.compound {
            return Vec::new();
        }
        self.children
            .get(parent)
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn children_root(&self) -> Vec<&str> {
        self.nodes()
            .filter(|id| !self.parent.contains_key(*id))
            .collect()
    }

    pub fn has_children(&self, v: &str) -> bool {
        self.children.get(v).is_some_and(|c| !c.is_empty())
    }
}

impl<N, E, G> Graph<N, E, G>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    /// Induced subgraph over the nodes accepted by `keep`.
    ///
    /// In compound graphs each kept node is re-parented to its nearest kept ancestor.
    pub fn filter_nodes(&self, mut keep: impl FnMut(&str, &N) -> bool) -> Self {
        let mut out: Self = Graph::new(self.options);
        out.set_graph(self.graph_label.clone());

        for (id, label) in self.node_labels() {
            if keep(id, label) {
                out.set_node(id, label.clone());
            }
        }

        for (key, label) in self.edge_labels() {
            if out.has_node(&key.v) && out.has_node(&key.w) {
                out.set_edge_key(key.clone(), label.clone());
            }
        }

        if self.options.compound {
            let kept = out.node_ids();
            for id in kept {
                let mut ancestor = self.parent(&id);
                while let Some(a) = ancestor {
                    if out.has_node(a) {
                        break;
                    }
                    ancestor = self.parent(a);
                }
                if let Some(a) = ancestor {
                    out.parent.insert(id.clone(), a.to_string());
                    out.children.entry(a.to_string()).or_default().push(id);
                }
            }
        }

        out
    }
}

impl<N, E, G> Clone for Graph<N, E, G>
where
    N: Default + Clone + 'static,
    E: Default + Clone + 'static,
    G: Default + Clone,
{
    /// Clones structure and labels. Default label factories are reset to `Default::default`.
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            graph_label: self.graph_label.clone(),
            default_node_label: Box::new(N::default),
            default_edge_label: Box::new(E::default),
            nodes: self.nodes.clone(),
            node_index: self.node_index.clone(),
            edges: self.edges.clone(),
            edge_index: self.edge_index.clone(),
            parent: self.parent.clone(),
            children: self.children.clone(),
        }
    }
}

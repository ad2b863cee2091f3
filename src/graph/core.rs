// src/graph/core.rs

use std::collections::BTreeMap;

use crate::errors::{Result, TrellisError};
use crate::store::Store;

/// A vertex with a typed payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<N> {
    pub id: String,
    pub data: N,
}

/// A connection between two nodes with a typed payload and a weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge<E> {
    pub from: String,
    pub to: String,
    pub data: E,
    pub weight: f64,
}

/// Adjacency index: node ID -> neighbor ID -> edge record.
type Adjacency<E> = BTreeMap<String, BTreeMap<String, Edge<E>>>;

/// Graph over string-keyed nodes, supporting directed and undirected modes.
///
/// Adjacency is indexed in both directions (`out`: from -> to, `inbound`:
/// to -> from) so in-/out-neighbor lookup is proportional to degree. For an
/// undirected graph, one logical edge materialises the symmetric records in
/// both indices.
///
/// All indices are ordered maps, so every enumeration (`nodes`, `neighbors`,
/// `edges`, metadata iteration during encoding) comes out in sorted order
/// without a separate sort pass.
#[derive(Debug)]
pub struct Graph<N, E> {
    directed: bool,
    nodes: BTreeMap<String, Node<N>>,
    out: Adjacency<E>,
    inbound: Adjacency<E>,
    node_meta: BTreeMap<String, Store>,
    edge_meta: BTreeMap<(String, String), Store>,
}

impl<N, E> Graph<N, E> {
    /// Create an empty graph. If `directed` is true, edges are one-way.
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            nodes: BTreeMap::new(),
            out: BTreeMap::new(),
            inbound: BTreeMap::new(),
            node_meta: BTreeMap::new(),
            edge_meta: BTreeMap::new(),
        }
    }

    pub fn is_directed(&self) -> bool {
        self.directed
    }

    /// Add a node. Re-adding an existing ID overwrites its payload but keeps
    /// its adjacency and metadata.
    pub fn add_node(&mut self, id: impl Into<String>, data: N) {
        let id = id.into();
        self.out.entry(id.clone()).or_default();
        self.inbound.entry(id.clone()).or_default();
        self.nodes.insert(id.clone(), Node { id, data });
    }

    /// Add an edge between two existing nodes. Self-loops are permitted.
    ///
    /// Re-adding an existing edge overwrites its payload and weight but keeps
    /// its metadata. For undirected graphs the symmetric adjacency records
    /// are maintained as well.
    pub fn add_edge(&mut self, from: &str, to: &str, data: E, weight: f64) -> Result<()>
    where
        E: Clone,
    {
        if !self.has_node(from) {
            return Err(TrellisError::NodeMissing(from.to_string()));
        }
        if !self.has_node(to) {
            return Err(TrellisError::NodeMissing(to.to_string()));
        }

        let edge = Edge {
            from: from.to_string(),
            to: to.to_string(),
            data,
            weight,
        };

        if !self.directed && from != to {
            let rev = Edge {
                from: to.to_string(),
                to: from.to_string(),
                data: edge.data.clone(),
                weight,
            };
            self.insert_adjacency(to, from, rev);
        }
        self.insert_adjacency(from, to, edge);
        Ok(())
    }

    fn insert_adjacency(&mut self, from: &str, to: &str, edge: Edge<E>)
    where
        E: Clone,
    {
        self.inbound
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string(), edge.clone());
        self.out
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string(), edge);
    }

    /// Remove a node together with every incident edge and all metadata for
    /// the node and those edges. Unknown IDs are ignored.
    pub fn remove_node(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            return;
        }

        let outgoing: Vec<String> = self
            .out
            .get(id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        for to in &outgoing {
            if let Some(m) = self.inbound.get_mut(to) {
                m.remove(id);
            }
            let key = self.meta_key(id, to);
            self.edge_meta.remove(&key);
        }

        let incoming: Vec<String> = self
            .inbound
            .get(id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        for from in &incoming {
            if let Some(m) = self.out.get_mut(from) {
                m.remove(id);
            }
            let key = self.meta_key(from, id);
            self.edge_meta.remove(&key);
        }

        self.out.remove(id);
        self.inbound.remove(id);
        self.node_meta.remove(id);
        self.nodes.remove(id);
    }

    /// Remove the edge `from -> to` (both directions for undirected graphs)
    /// and its metadata. Missing edges are ignored.
    pub fn remove_edge(&mut self, from: &str, to: &str) {
        if let Some(m) = self.out.get_mut(from) {
            m.remove(to);
        }
        if let Some(m) = self.inbound.get_mut(to) {
            m.remove(from);
        }
        if !self.directed {
            if let Some(m) = self.out.get_mut(to) {
                m.remove(from);
            }
            if let Some(m) = self.inbound.get_mut(from) {
                m.remove(to);
            }
        }
        let key = self.meta_key(from, to);
        self.edge_meta.remove(&key);
    }

    pub fn node(&self, id: &str) -> Option<&Node<N>> {
        self.nodes.get(id)
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&Edge<E>> {
        self.out.get(from).and_then(|m| m.get(to))
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn has_edge(&self, from: &str, to: &str) -> bool {
        self.out.get(from).is_some_and(|m| m.contains_key(to))
    }

    /// IDs adjacent to `id` in the outgoing direction, sorted. For undirected
    /// graphs this is every neighbor.
    pub fn neighbors(&self, id: &str) -> Vec<String> {
        self.out
            .get(id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Edges originating from `id`, sorted by target.
    pub fn out_edges(&self, id: &str) -> Vec<&Edge<E>> {
        self.out
            .get(id)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }

    /// Edges pointing to `id`, sorted by source.
    pub fn in_edges(&self, id: &str) -> Vec<&Edge<E>> {
        self.inbound
            .get(id)
            .map(|m| m.values().collect())
            .unwrap_or_default()
    }

    /// All nodes, sorted by ID.
    pub fn nodes(&self) -> Vec<&Node<N>> {
        self.nodes.values().collect()
    }

    /// All edges, sorted by (from, to). For undirected graphs each logical
    /// edge appears exactly once, with endpoints normalised so `from <= to`.
    pub fn edges(&self) -> Vec<&Edge<E>> {
        let mut result = Vec::new();
        for (from, targets) in &self.out {
            for (to, edge) in targets {
                if !self.directed && from > to {
                    continue;
                }
                result.push(edge);
            }
        }
        result
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Number of logical edges.
    pub fn size(&self) -> usize {
        self.edges().len()
    }

    /// Duplicate the topology and payloads. Metadata stores are not carried
    /// over; they travel at the subgraph/manager level when needed.
    pub fn copy(&self) -> Graph<N, E>
    where
        N: Clone,
        E: Clone,
    {
        Graph {
            directed: self.directed,
            nodes: self.nodes.clone(),
            out: self.out.clone(),
            inbound: self.inbound.clone(),
            node_meta: BTreeMap::new(),
            edge_meta: BTreeMap::new(),
        }
    }

    /// Metadata store for a node, if one has been created.
    pub fn node_meta(&self, id: &str) -> Option<&Store> {
        self.node_meta.get(id)
    }

    /// Metadata store for an existing node, created lazily on first access.
    /// Returns `None` if the node does not exist.
    pub fn node_meta_mut(&mut self, id: &str) -> Option<&mut Store> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        Some(self.node_meta.entry(id.to_string()).or_default())
    }

    /// Metadata store for an edge, if one has been created. For undirected
    /// graphs, `(a, b)` and `(b, a)` resolve to the same store.
    pub fn edge_meta(&self, from: &str, to: &str) -> Option<&Store> {
        self.edge_meta.get(&self.meta_key(from, to))
    }

    /// Metadata store for an existing edge, created lazily on first access.
    /// Returns `None` if the edge does not exist.
    pub fn edge_meta_mut(&mut self, from: &str, to: &str) -> Option<&mut Store> {
        if !self.has_edge(from, to) {
            return None;
        }
        let key = self.meta_key(from, to);
        Some(self.edge_meta.entry(key).or_default())
    }

    /// Canonical metadata key for an edge: undirected edges share one store
    /// keyed by the lexically smaller endpoint first.
    fn meta_key(&self, from: &str, to: &str) -> (String, String) {
        if !self.directed && from > to {
            (to.to_string(), from.to_string())
        } else {
            (from.to_string(), to.to_string())
        }
    }
}

// src/snapshot.rs

//! Bidirectional JSON codec for graph topology and metadata.
//!
//! The on-disk form is a versioned [`Snapshot`]: topology (nodes + edges)
//! and metadata (per-node / per-edge entries with optional schemas). Two
//! encodes of the same logical state are byte-identical: nodes are emitted
//! in sorted-ID order, edges sorted by (from, to) with undirected endpoints
//! normalised so `from <= to`, and entry maps are ordered.
//!
//! Decoding is typed end-to-end. Node and edge payloads deserialize straight
//! into their declared shapes through the `serde` bounds, so no re-coercion
//! pass over loosely typed maps is needed afterwards.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{Result, TrellisError};
use crate::graph::traverse::subgraph;
use crate::graph::Graph;
use crate::store::Schema;

pub const SNAPSHOT_VERSION: u64 = 1;

/// Top-level serialized form of a graph.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot<N, E> {
    pub version: u64,
    pub directed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<Topology<N, E>>,
    #[serde(
        rename = "metadata",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub meta: Option<MetaSection>,
}

/// Graph topology: nodes and edges.
#[derive(Debug, Serialize, Deserialize)]
pub struct Topology<N, E> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<NodeRecord<N>>,
    #[serde(default = "Vec::new")]
    pub edges: Vec<EdgeRecord<E>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeRecord<N> {
    pub id: String,
    pub data: N,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeRecord<E> {
    pub from: String,
    pub to: String,
    pub data: E,
    pub weight: f64,
}

/// Metadata for every node and edge that carries entries.
#[derive(Debug, Serialize, Deserialize)]
pub struct MetaSection {
    #[serde(default)]
    pub nodes: Vec<NodeMetaRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeMetaRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeMetaRecord {
    pub id: String,
    pub entries: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeMetaRecord {
    pub from: String,
    pub to: String,
    pub entries: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

/// Controls what [`encode`] emits.
#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// When set, encoding operates on the induced subgraph of these nodes.
    pub node_ids: Option<Vec<String>>,
    /// Include the topology section.
    pub graph: bool,
    /// Include the metadata section.
    pub meta: bool,
    /// Include per-store schema definitions inside the metadata section.
    pub schemas: bool,
    /// Pretty-print the JSON.
    pub indent: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            node_ids: None,
            graph: true,
            meta: true,
            schemas: true,
            indent: true,
        }
    }
}

/// Serialize a graph to its snapshot JSON form.
pub fn encode<N, E>(g: &Graph<N, E>, opts: &EncodeOptions) -> Result<String>
where
    N: Clone + Serialize,
    E: Clone + Serialize,
{
    let induced;
    let target = match &opts.node_ids {
        Some(ids) => {
            induced = subgraph(g, ids);
            &induced
        }
        None => g,
    };

    let mut snap = Snapshot {
        version: SNAPSHOT_VERSION,
        directed: target.is_directed(),
        graph: None,
        meta: None,
    };

    if opts.graph {
        // `nodes()` and `edges()` already come out sorted and, for
        // undirected graphs, normalised to `from <= to`.
        let nodes = target
            .nodes()
            .into_iter()
            .map(|n| NodeRecord {
                id: n.id.clone(),
                data: n.data.clone(),
            })
            .collect();
        let edges = target
            .edges()
            .into_iter()
            .map(|e| EdgeRecord {
                from: e.from.clone(),
                to: e.to.clone(),
                data: e.data.clone(),
                weight: e.weight,
            })
            .collect();
        snap.graph = Some(Topology { nodes, edges });
    }

    if opts.meta {
        let mut nodes = Vec::new();
        for n in target.nodes() {
            let Some(store) = target.node_meta(&n.id) else {
                continue;
            };
            if store.is_empty() {
                continue;
            }
            nodes.push(NodeMetaRecord {
                id: n.id.clone(),
                entries: store.entries().clone(),
                schema: schema_for(store.schema(), opts.schemas),
            });
        }

        let mut edges = Vec::new();
        for e in target.edges() {
            let Some(store) = target.edge_meta(&e.from, &e.to) else {
                continue;
            };
            if store.is_empty() {
                continue;
            }
            edges.push(EdgeMetaRecord {
                from: e.from.clone(),
                to: e.to.clone(),
                entries: store.entries().clone(),
                schema: schema_for(store.schema(), opts.schemas),
            });
        }

        snap.meta = Some(MetaSection { nodes, edges });
    }

    let text = if opts.indent {
        serde_json::to_string_pretty(&snap)?
    } else {
        serde_json::to_string(&snap)?
    };
    Ok(text)
}

fn schema_for(schema: Option<&Schema>, include: bool) -> Option<Schema> {
    if include {
        schema.cloned()
    } else {
        None
    }
}

/// Deserialize snapshot JSON into a new graph.
///
/// Topology is replayed first (any edge referencing a missing node surfaces
/// the underlying `NodeMissing` error), then metadata entries and schemas
/// are applied. Metadata for nodes or edges the topology does not contain is
/// silently skipped.
pub fn decode<N, E>(data: &str) -> Result<Graph<N, E>>
where
    N: DeserializeOwned + Default,
    E: DeserializeOwned + Clone + Default,
{
    let snap: Snapshot<N, E> = serde_json::from_str(data)?;
    if snap.version != SNAPSHOT_VERSION {
        return Err(TrellisError::UnsupportedVersion(snap.version));
    }

    let mut g = Graph::new(snap.directed);
    if let Some(topology) = snap.graph {
        for n in topology.nodes {
            g.add_node(n.id, n.data);
        }
        for e in topology.edges {
            g.add_edge(&e.from, &e.to, e.data, e.weight)?;
        }
    }
    if let Some(meta) = snap.meta {
        apply_meta_section(&mut g, meta);
    }
    Ok(g)
}

/// Read only the metadata section from snapshot JSON and apply it to an
/// existing graph, with the same silent-skip rule as [`decode`].
pub fn apply_meta<N, E>(data: &str, g: &mut Graph<N, E>) -> Result<()> {
    #[derive(Deserialize)]
    struct MetaOnly {
        #[serde(rename = "metadata", default)]
        meta: Option<MetaSection>,
    }

    let raw: MetaOnly = serde_json::from_str(data)?;
    if let Some(meta) = raw.meta {
        apply_meta_section(g, meta);
    }
    Ok(())
}

fn apply_meta_section<N, E>(g: &mut Graph<N, E>, meta: MetaSection) {
    for record in meta.nodes {
        let Some(store) = g.node_meta_mut(&record.id) else {
            continue;
        };
        for (key, value) in record.entries {
            store.set(key, value);
        }
        if let Some(schema) = record.schema {
            store.set_schema(schema);
        }
    }
    for record in meta.edges {
        let Some(store) = g.edge_meta_mut(&record.from, &record.to) else {
            continue;
        };
        for (key, value) in record.entries {
            store.set(key, value);
        }
        if let Some(schema) = record.schema {
            store.set_schema(schema);
        }
    }
}

// src/manager/mod.rs

//! Named graphs on disk and the high-level API over them.
//!
//! A [`Manager`] owns a storage directory and an in-memory cache of open
//! graphs, guarded by one mutex: every operation exposed here locks it, so
//! the manager is safe to share across the RPC layer.
//!
//! - [`types`] defines the request/response shapes.
//! - [`upsert`] implements the batch create/update operation.
//! - [`read`] implements the filtered, paginated node read.
//! - [`filter`] evaluates scalar filter predicates.
//! - [`transition`] enforces the status state machine with readiness
//!   propagation.

pub mod filter;
pub mod read;
pub mod transition;
pub mod types;
pub mod upsert;

pub use types::*;

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::{Result, TrellisError};
use crate::graph::{connected_components, leaves, roots, Graph};
use crate::snapshot::{self, EncodeOptions};

/// The concrete graph type managed here.
pub type ApiGraph = Graph<NodePayload, EdgePayload>;

/// High-level API for managing named graphs. All methods are safe for
/// concurrent use.
#[derive(Debug)]
pub struct Manager {
    dir: PathBuf,
    graphs: Mutex<BTreeMap<String, ApiGraph>>,
}

impl Manager {
    /// Create a manager backed by the given directory. The directory is
    /// created if it does not exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            graphs: Mutex::new(BTreeMap::new()),
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ApiGraph>> {
        self.graphs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn graph_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load a graph from disk, or create a new empty directed graph if the
    /// file does not exist. The graph stays cached for later operations.
    pub fn open(&self, name: &str) -> Result<GraphInfo> {
        let mut graphs = self.lock();
        if let Some(g) = graphs.get(name) {
            return Ok(graph_info(name, g));
        }

        let path = self.graph_path(name);
        let g = match fs::read_to_string(&path) {
            Ok(data) => snapshot::decode(&data)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Graph::new(true),
            Err(err) => return Err(err.into()),
        };
        debug!(graph = %name, nodes = g.order(), edges = g.size(), "graph opened");

        let info = graph_info(name, &g);
        graphs.insert(name.to_string(), g);
        Ok(info)
    }

    /// Persist an open graph to `<dir>/<name>.json` as indented JSON.
    pub fn save(&self, name: &str) -> Result<()> {
        let graphs = self.lock();
        let g = get_graph(&graphs, name)?;
        let data = snapshot::encode(g, &EncodeOptions::default())?;
        fs::write(self.graph_path(name), data)?;
        debug!(graph = %name, "graph saved");
        Ok(())
    }

    /// Info for every persisted graph (files on disk), sorted by name.
    ///
    /// Cached graphs report their in-memory state; others are peeked from
    /// the file. Unreadable or non-snapshot files are skipped.
    pub fn list(&self) -> Result<Vec<GraphInfo>> {
        let graphs = self.lock();

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(|f| f.strip_suffix(".json")) else {
                continue;
            };
            names.push(name.to_string());
        }
        names.sort();

        let mut result = Vec::with_capacity(names.len());
        for name in names {
            if let Some(g) = graphs.get(&name) {
                result.push(graph_info(&name, g));
                continue;
            }
            match peek_info(&self.graph_path(&name), &name) {
                Some(info) => result.push(info),
                None => warn!(graph = %name, "skipping unreadable graph file"),
            }
        }
        Ok(result)
    }

    /// Remove a graph from disk and from the in-memory cache. A missing
    /// file is not an error.
    pub fn delete(&self, name: &str) -> Result<()> {
        let mut graphs = self.lock();
        graphs.remove(name);
        match fs::remove_file(self.graph_path(name)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// Structural statistics for an open graph.
    pub fn summary(&self, name: &str) -> Result<GraphSummary> {
        let graphs = self.lock();
        let g = get_graph(&graphs, name)?;

        let root_ids = roots(g).into_iter().map(|n| n.id.clone()).collect();
        let leaf_ids = leaves(g).into_iter().map(|n| n.id.clone()).collect();

        let mut status_counts: BTreeMap<String, usize> = BTreeMap::new();
        for n in g.nodes() {
            let status = if n.data.status.is_empty() {
                "(none)"
            } else {
                n.data.status.as_str()
            };
            *status_counts.entry(status.to_string()).or_default() += 1;
        }

        Ok(GraphSummary {
            info: graph_info(name, g),
            roots: root_ids,
            leaves: leaf_ids,
            status_counts,
            components: connected_components(g).len(),
        })
    }

    /// Delete the listed nodes, then the listed edges. Entries that do not
    /// exist are silently ignored; the outcome counts what was actually
    /// removed.
    pub fn remove(&self, req: &RemoveRequest) -> Result<RemoveOutcome> {
        let mut graphs = self.lock();
        let g = get_graph_mut(&mut graphs, &req.graph)?;

        let mut outcome = RemoveOutcome::default();
        for id in &req.nodes {
            if g.has_node(id) {
                g.remove_node(id);
                outcome.nodes_removed += 1;
            }
        }
        for e in &req.edges {
            if g.has_edge(&e.from, &e.to) {
                g.remove_edge(&e.from, &e.to);
                outcome.edges_removed += 1;
            }
        }
        Ok(outcome)
    }
}

pub(crate) fn get_graph<'g>(
    graphs: &'g BTreeMap<String, ApiGraph>,
    name: &str,
) -> Result<&'g ApiGraph> {
    graphs
        .get(name)
        .ok_or_else(|| TrellisError::GraphNotOpen(name.to_string()))
}

pub(crate) fn get_graph_mut<'g>(
    graphs: &'g mut BTreeMap<String, ApiGraph>,
    name: &str,
) -> Result<&'g mut ApiGraph> {
    graphs
        .get_mut(name)
        .ok_or_else(|| TrellisError::GraphNotOpen(name.to_string()))
}

pub(crate) fn graph_info(name: &str, g: &ApiGraph) -> GraphInfo {
    GraphInfo {
        name: name.to_string(),
        node_count: g.order(),
        edge_count: g.size(),
        directed: g.is_directed(),
    }
}

/// Read just enough of a snapshot file to build a [`GraphInfo`] without
/// decoding payloads.
fn peek_info(path: &Path, name: &str) -> Option<GraphInfo> {
    #[derive(Deserialize)]
    struct Peek {
        #[serde(default)]
        directed: bool,
        graph: Option<PeekTopology>,
    }

    #[derive(Deserialize)]
    struct PeekTopology {
        #[serde(default)]
        nodes: Vec<serde::de::IgnoredAny>,
        #[serde(default)]
        edges: Vec<serde::de::IgnoredAny>,
    }

    let data = fs::read_to_string(path).ok()?;
    let peek: Peek = serde_json::from_str(&data).ok()?;
    let (node_count, edge_count) = peek
        .graph
        .map(|t| (t.nodes.len(), t.edges.len()))
        .unwrap_or((0, 0));
    Some(GraphInfo {
        name: name.to_string(),
        node_count,
        edge_count,
        directed: peek.directed,
    })
}

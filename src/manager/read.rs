// src/manager/read.rs

//! Selective node reads with filtering, projection, and pagination.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::errors::Result;
use crate::graph::subgraph;
use crate::manager::filter::matches_filters;
use crate::manager::types::{EdgeView, NodeView, ReadNodesRequest, ReadNodesResponse};
use crate::manager::{get_graph, Manager};
use crate::store::Store;

/// Page size applied when a request does not specify one.
const DEFAULT_LIMIT: usize = 100;

impl Manager {
    /// Read nodes through these stages, in order: candidate collection
    /// (explicit IDs filtered to existing nodes, else all nodes), filter
    /// predicates (AND), sort, pagination, then per-node metadata
    /// projection. With `include_edges`, the response also carries the
    /// edges of the page's induced subgraph.
    pub fn read_nodes(&self, req: &ReadNodesRequest) -> Result<ReadNodesResponse> {
        let graphs = self.lock();
        let g = get_graph(&graphs, &req.graph)?;

        let candidates: Vec<String> = if req.ids.is_empty() {
            g.nodes().iter().map(|n| n.id.clone()).collect()
        } else {
            req.ids
                .iter()
                .filter(|id| g.has_node(id))
                .cloned()
                .collect()
        };

        let mut matched: Vec<String> = candidates
            .into_iter()
            .filter(|id| matches_filters(g, id, &req.filters))
            .collect();
        matched.sort();

        let total = matched.len();
        let limit = if req.limit == 0 {
            DEFAULT_LIMIT
        } else {
            req.limit
        };
        let offset = req.offset.min(total);
        let end = (offset + limit).min(total);
        let page = &matched[offset..end];

        let key_set: Option<BTreeSet<&str>> = if req.keys.is_empty() {
            None
        } else {
            Some(req.keys.iter().map(String::as_str).collect())
        };

        let mut nodes = Vec::with_capacity(page.len());
        for id in page {
            let Some(node) = g.node(id) else {
                continue;
            };
            nodes.push(NodeView {
                id: id.clone(),
                label: node.data.label.clone(),
                status: node.data.status.clone(),
                meta: project_meta(g.node_meta(id), key_set.as_ref()),
                in_degree: g.in_edges(id).len(),
                out_degree: g.out_edges(id).len(),
            });
        }

        let mut edges = Vec::new();
        if req.include_edges && !page.is_empty() {
            let sub = subgraph(g, page);
            for e in sub.edges() {
                edges.push(EdgeView {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    label: e.data.label.clone(),
                    weight: e.weight,
                    meta: project_meta(g.edge_meta(&e.from, &e.to), None),
                });
            }
        }

        Ok(ReadNodesResponse {
            nodes,
            edges,
            total,
            has_more: end < total,
        })
    }
}

/// Metadata entries filtered by the key set; `None` keys means all keys.
/// Returns `None` when there is no store or nothing survives projection.
fn project_meta(
    store: Option<&Store>,
    key_set: Option<&BTreeSet<&str>>,
) -> Option<BTreeMap<String, Value>> {
    let store = store?;
    let mut result = BTreeMap::new();
    store.range(|key, value| {
        if key_set.map_or(true, |keys| keys.contains(key)) {
            result.insert(key.to_string(), value.clone());
        }
        true
    });
    if result.is_empty() {
        None
    } else {
        Some(result)
    }
}

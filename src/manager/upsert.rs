// src/manager/upsert.rs

//! Batch create/update of nodes and edges with metadata side effects.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::manager::types::{EdgePayload, NodePayload, UpsertOutcome, UpsertRequest};
use crate::manager::{get_graph_mut, Manager};
use crate::store::Store;

impl Manager {
    /// Apply a batch of idempotent node and edge create/update operations.
    ///
    /// For nodes: a missing ID is created with the given label and status;
    /// an existing ID has only its provided non-empty fields overwritten,
    /// and counts as updated only when something actually changed. For
    /// edges: missing endpoint nodes are auto-created with empty payloads
    /// (each counted as a created node); an existing edge has its label and
    /// weight updated in place, keeping its metadata. Metadata `meta` keys
    /// are set and `delete` keys removed per entry.
    pub fn upsert(&self, req: &UpsertRequest) -> Result<UpsertOutcome> {
        let mut graphs = self.lock();
        let g = get_graph_mut(&mut graphs, &req.graph)?;

        let mut outcome = UpsertOutcome::default();

        for un in &req.nodes {
            if un.id.is_empty() {
                continue;
            }
            match g.node(&un.id) {
                Some(existing) => {
                    let mut payload = existing.data.clone();
                    let mut changed = false;
                    if !un.label.is_empty() && un.label != payload.label {
                        payload.label = un.label.clone();
                        changed = true;
                    }
                    if !un.status.is_empty() && un.status != payload.status {
                        payload.status = un.status.clone();
                        changed = true;
                    }
                    if changed {
                        g.add_node(un.id.clone(), payload);
                        outcome.nodes_updated += 1;
                    }
                }
                None => {
                    g.add_node(
                        un.id.clone(),
                        NodePayload {
                            label: un.label.clone(),
                            status: un.status.clone(),
                        },
                    );
                    outcome.nodes_created += 1;
                }
            }

            if let Some(store) = g.node_meta_mut(&un.id) {
                outcome.meta_keys_set += set_meta(store, &un.meta);
                outcome.meta_keys_deleted += delete_meta(store, &un.delete);
            }
        }

        for ue in &req.edges {
            if ue.from.is_empty() || ue.to.is_empty() {
                continue;
            }
            for endpoint in [&ue.from, &ue.to] {
                if !g.has_node(endpoint) {
                    g.add_node(endpoint.clone(), NodePayload::default());
                    outcome.nodes_created += 1;
                }
            }

            match g.edge(&ue.from, &ue.to) {
                Some(existing) => {
                    let mut payload = existing.data.clone();
                    let mut weight = existing.weight;
                    let mut changed = false;
                    if !ue.label.is_empty() && ue.label != payload.label {
                        payload.label = ue.label.clone();
                        changed = true;
                    }
                    if ue.weight != 0.0 && ue.weight != weight {
                        weight = ue.weight;
                        changed = true;
                    }
                    if changed {
                        // Re-adding overwrites the adjacency records but
                        // keeps the edge's metadata store.
                        g.add_edge(&ue.from, &ue.to, payload, weight)?;
                        outcome.edges_updated += 1;
                    }
                }
                None => {
                    g.add_edge(
                        &ue.from,
                        &ue.to,
                        EdgePayload {
                            label: ue.label.clone(),
                        },
                        ue.weight,
                    )?;
                    outcome.edges_created += 1;
                }
            }

            if let Some(store) = g.edge_meta_mut(&ue.from, &ue.to) {
                outcome.meta_keys_set += set_meta(store, &ue.meta);
                outcome.meta_keys_deleted += delete_meta(store, &ue.delete);
            }
        }

        debug!(
            graph = %req.graph,
            nodes_created = outcome.nodes_created,
            nodes_updated = outcome.nodes_updated,
            edges_created = outcome.edges_created,
            edges_updated = outcome.edges_updated,
            "upsert applied"
        );
        Ok(outcome)
    }
}

fn set_meta(store: &mut Store, meta: &BTreeMap<String, Value>) -> usize {
    for (key, value) in meta {
        store.set(key.clone(), value.clone());
    }
    meta.len()
}

fn delete_meta(store: &mut Store, keys: &[String]) -> usize {
    keys.iter().filter(|k| store.delete(k)).count()
}

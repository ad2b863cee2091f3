// src/manager/types.rs

//! Request and response shapes for the manager API.
//!
//! The manager operates on one concrete payload shape — `{label, status}`
//! for nodes, `{label}` for edges — while the core graph stays generic.
//! Everything here derives `Serialize`/`Deserialize` so the RPC layer can
//! pass these types straight through.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Concrete node payload used by the manager and RPC layers. Rich data
/// lives in metadata stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePayload {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub status: String,
}

/// Concrete edge payload used by the manager and RPC layers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgePayload {
    #[serde(default)]
    pub label: String,
}

/// A graph at a glance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphInfo {
    pub name: String,
    pub node_count: usize,
    pub edge_count: usize,
    pub directed: bool,
}

/// [`GraphInfo`] extended with structural statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    #[serde(flatten)]
    pub info: GraphInfo,
    pub roots: Vec<String>,
    pub leaves: Vec<String>,
    pub status_counts: BTreeMap<String, usize>,
    pub components: usize,
}

// --- Upsert ---

/// A batch of node and edge create/update operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertRequest {
    pub graph: String,
    #[serde(default)]
    pub nodes: Vec<UpsertNode>,
    #[serde(default)]
    pub edges: Vec<UpsertEdge>,
}

/// A node to create or update. On update, only non-empty fields overwrite.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertNode {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub status: String,
    /// Metadata keys to set.
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
    /// Metadata keys to delete.
    #[serde(default)]
    pub delete: Vec<String>,
}

/// An edge to create or update. Missing endpoint nodes are auto-created
/// with an empty payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpsertEdge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub weight: f64,
    #[serde(default)]
    pub meta: BTreeMap<String, Value>,
    #[serde(default)]
    pub delete: Vec<String>,
}

/// Side-effect counts from an upsert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub nodes_created: usize,
    pub nodes_updated: usize,
    pub edges_created: usize,
    pub edges_updated: usize,
    pub meta_keys_set: usize,
    pub meta_keys_deleted: usize,
}

// --- Read ---

/// A selective read with optional ID lookup, filtering, key projection, and
/// pagination.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadNodesRequest {
    pub graph: String,
    #[serde(default)]
    pub ids: Vec<String>,
    /// Metadata keys to project; empty means all keys.
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub include_edges: bool,
    #[serde(default)]
    pub offset: usize,
    /// Page size; 0 means the default limit.
    #[serde(default)]
    pub limit: usize,
}

/// A single predicate applied to a node's structural fields (`status`,
/// `label`) or its metadata store.
#[derive(Debug, Clone, Deserialize)]
pub struct Filter {
    pub key: String,
    pub op: String,
    #[serde(default)]
    pub value: Value,
}

/// A node in a read response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeView {
    pub id: String,
    pub label: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
    pub in_degree: usize,
    pub out_degree: usize,
}

/// An edge in a read response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeView {
    pub from: String,
    pub to: String,
    pub label: String,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadNodesResponse {
    pub nodes: Vec<NodeView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeView>,
    pub total: usize,
    pub has_more: bool,
}

// --- Transition ---

/// Move a node to a new status.
#[derive(Debug, Clone, Deserialize)]
pub struct TransitionRequest {
    pub graph: String,
    pub id: String,
    pub status: String,
}

/// What happened after a status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub id: String,
    pub old_status: String,
    pub new_status: String,
    /// Downstream nodes promoted to `ready` by this transition.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub newly_ready: Vec<String>,
}

// --- Remove ---

/// Delete nodes and/or edges. Entries that do not exist are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoveRequest {
    pub graph: String,
    #[serde(default)]
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeRef {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoveOutcome {
    pub nodes_removed: usize,
    pub edges_removed: usize,
}

// src/server/tools.rs

//! Tool descriptors served by `tools/list`.
//!
//! Each tool wraps exactly one manager operation. Input schemas enumerate
//! the accepted fields; unknown keys in arguments are ignored by the
//! handlers.

use serde::Serialize;
use serde_json::{json, Value};

/// A tool as advertised to clients.
#[derive(Debug, Serialize)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// The fixed tool set, in registration order.
pub fn registry() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: "open_graph",
            description: "Open or create a named graph",
            input_schema: name_only_schema(),
        },
        ToolSpec {
            name: "save_graph",
            description: "Persist a graph to disk",
            input_schema: name_only_schema(),
        },
        ToolSpec {
            name: "list_graphs",
            description: "List all persisted graphs",
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        ToolSpec {
            name: "delete_graph",
            description: "Delete a graph from disk and memory",
            input_schema: name_only_schema(),
        },
        ToolSpec {
            name: "graph_summary",
            description:
                "Get structural statistics for a graph (roots, leaves, status counts, components)",
            input_schema: name_only_schema(),
        },
        ToolSpec {
            name: "upsert",
            description: "Batch create/update nodes, edges, and metadata",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "graph": { "type": "string", "description": "Graph name" },
                    "nodes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "id": { "type": "string" },
                                "label": { "type": "string" },
                                "status": { "type": "string" },
                                "meta": { "type": "object" },
                                "delete": { "type": "array", "items": { "type": "string" } }
                            },
                            "required": ["id"]
                        }
                    },
                    "edges": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "from": { "type": "string" },
                                "to": { "type": "string" },
                                "label": { "type": "string" },
                                "weight": { "type": "number" },
                                "meta": { "type": "object" },
                                "delete": { "type": "array", "items": { "type": "string" } }
                            },
                            "required": ["from", "to"]
                        }
                    }
                },
                "required": ["graph"]
            }),
        },
        ToolSpec {
            name: "read_nodes",
            description: "Selective read with filters, key projection, and pagination",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "graph": { "type": "string", "description": "Graph name" },
                    "ids": { "type": "array", "items": { "type": "string" } },
                    "keys": { "type": "array", "items": { "type": "string" } },
                    "filters": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "key": { "type": "string" },
                                "op": { "type": "string" },
                                "value": {}
                            },
                            "required": ["key", "op"]
                        }
                    },
                    "include_edges": { "type": "boolean" },
                    "offset": { "type": "integer" },
                    "limit": { "type": "integer" }
                },
                "required": ["graph"]
            }),
        },
        ToolSpec {
            name: "transition",
            description: "Change node status with auto-ready propagation",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "graph": { "type": "string", "description": "Graph name" },
                    "id": { "type": "string", "description": "Node ID" },
                    "status": { "type": "string", "description": "Target status" }
                },
                "required": ["graph", "id", "status"]
            }),
        },
        ToolSpec {
            name: "remove",
            description: "Delete nodes and/or edges from a graph",
            input_schema: json!({
                "type": "object",
                "properties": {
                    "graph": { "type": "string", "description": "Graph name" },
                    "nodes": { "type": "array", "items": { "type": "string" } },
                    "edges": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "from": { "type": "string" },
                                "to": { "type": "string" }
                            },
                            "required": ["from", "to"]
                        }
                    }
                },
                "required": ["graph"]
            }),
        },
    ]
}

fn name_only_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "name": { "type": "string", "description": "Graph name" }
        },
        "required": ["name"]
    })
}

// src/manager/filter.rs

//! Scalar filter predicates over node payloads and metadata.

use serde_json::Value;

use crate::manager::types::{Filter, NodePayload};
use crate::manager::ApiGraph;
use crate::store::Store;

/// Whether the node passes every filter (AND logic).
pub(crate) fn matches_filters(g: &ApiGraph, id: &str, filters: &[Filter]) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Some(node) = g.node(id) else {
        return false;
    };
    let store = g.node_meta(id);
    filters.iter().all(|f| matches(store, &node.data, f))
}

/// Evaluate one predicate. `status` and `label` resolve from the structural
/// payload; every other key reads from the metadata store. An unknown
/// operator never matches.
fn matches(store: Option<&Store>, payload: &NodePayload, f: &Filter) -> bool {
    let value: Option<Value> = match f.key.as_str() {
        "status" => Some(Value::String(payload.status.clone())),
        "label" => Some(Value::String(payload.label.clone())),
        key => store.and_then(|s| s.get(key)).cloned(),
    };

    match f.op.as_str() {
        "exists" => value.is_some(),
        "eq" => value.is_some_and(|v| text(&v) == text(&f.value)),
        "neq" => value.map_or(true, |v| text(&v) != text(&f.value)),
        "contains" => value.is_some_and(|v| text(&v).contains(&text(&f.value))),
        "gt" | "gte" | "lt" | "lte" => {
            let (Some(a), Some(b)) = (value.as_ref().and_then(numeric), numeric(&f.value)) else {
                return false;
            };
            match f.op.as_str() {
                "gt" => a > b,
                "gte" => a >= b,
                "lt" => a < b,
                _ => a <= b,
            }
        }
        _ => false,
    }
}

/// Stringified form used by `eq`/`neq`/`contains`: strings compare as-is,
/// everything else by its JSON rendering.
fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric(v: &Value) -> Option<f64> {
    v.as_f64()
}

// src/server/handlers.rs

//! Thin mapping from tool invocations onto manager operations.
//!
//! Argument parse failures and manager errors propagate to the caller,
//! which reports them as tool-level failures (`isError: true`), never as
//! JSON-RPC errors.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::{Result, TrellisError};
use crate::manager::{
    Manager, ReadNodesRequest, RemoveRequest, TransitionRequest, UpsertRequest,
};

#[derive(Debug, Deserialize)]
struct NameArgs {
    name: String,
}

/// Invoke the named tool with raw JSON arguments.
pub(crate) fn dispatch(manager: &Manager, name: &str, args: Value) -> Result<Value> {
    match name {
        "open_graph" => {
            let a: NameArgs = parse(args)?;
            to_value(&manager.open(&a.name)?)
        }
        "save_graph" => {
            let a: NameArgs = parse(args)?;
            manager.save(&a.name)?;
            Ok(json!({ "ok": true }))
        }
        "list_graphs" => to_value(&manager.list()?),
        "delete_graph" => {
            let a: NameArgs = parse(args)?;
            manager.delete(&a.name)?;
            Ok(json!({ "ok": true }))
        }
        "graph_summary" => {
            let a: NameArgs = parse(args)?;
            to_value(&manager.summary(&a.name)?)
        }
        "upsert" => {
            let req: UpsertRequest = parse(args)?;
            to_value(&manager.upsert(&req)?)
        }
        "read_nodes" => {
            let req: ReadNodesRequest = parse(args)?;
            to_value(&manager.read_nodes(&req)?)
        }
        "transition" => {
            let req: TransitionRequest = parse(args)?;
            to_value(&manager.transition(&req)?)
        }
        "remove" => {
            let req: RemoveRequest = parse(args)?;
            to_value(&manager.remove(&req)?)
        }
        other => Err(TrellisError::UnknownTool(other.to_string())),
    }
}

fn parse<T: DeserializeOwned>(args: Value) -> Result<T> {
    Ok(serde_json::from_value(args)?)
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

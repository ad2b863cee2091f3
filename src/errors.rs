// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrellisError {
    #[error("node not found: {0}")]
    NodeMissing(String),

    #[error("edge not found: {0} -> {1}")]
    EdgeMissing(String, String),

    #[error("no path from {0} to {1}")]
    NoPath(String, String),

    #[error("graph contains a cycle")]
    Cycle,

    #[error("operation requires a directed graph")]
    Undirected,

    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u64),

    #[error("graph not open: {0}")]
    GraphNotOpen(String),

    #[error("invalid transition: {from:?} -> {to:?}")]
    InvalidTransition { from: String, to: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, TrellisError>;

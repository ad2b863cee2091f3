// src/manager/transition.rs

//! Node status transitions with automatic readiness propagation.

use tracing::debug;

use crate::errors::{Result, TrellisError};
use crate::manager::types::{TransitionOutcome, TransitionRequest};
use crate::manager::{get_graph_mut, ApiGraph, Manager};
use crate::tasks::TaskState;

impl Manager {
    /// Move a node to a new status, enforcing the state machine. When a node
    /// becomes `done`, downstream nodes whose dependencies are now all
    /// `done` are promoted from `pending` to `ready` and reported in
    /// `newly_ready`.
    pub fn transition(&self, req: &TransitionRequest) -> Result<TransitionOutcome> {
        let mut graphs = self.lock();
        let g = get_graph_mut(&mut graphs, &req.graph)?;

        let Some(node) = g.node(&req.id) else {
            return Err(TrellisError::NodeMissing(req.id.clone()));
        };

        let old_status = node.data.status.clone();
        if !transition_allowed(&old_status, &req.status) {
            return Err(TrellisError::InvalidTransition {
                from: old_status,
                to: req.status.clone(),
            });
        }

        let mut payload = node.data.clone();
        payload.status = req.status.clone();
        g.add_node(req.id.clone(), payload);

        let newly_ready = if req.status == "done" {
            promote_ready_downstream(g, &req.id)
        } else {
            Vec::new()
        };

        debug!(
            graph = %req.graph,
            node = %req.id,
            from = %old_status,
            to = %req.status,
            newly_ready = newly_ready.len(),
            "status transition"
        );
        Ok(TransitionOutcome {
            id: req.id.clone(),
            old_status,
            new_status: req.status.clone(),
            newly_ready,
        })
    }
}

/// The status table of the task state machine, over plain strings. A blank
/// status may enter `pending` or `ready`; everything else follows
/// [`TaskState::can_transition_to`].
fn transition_allowed(from: &str, to: &str) -> bool {
    if from.is_empty() {
        return matches!(to, "pending" | "ready");
    }
    match (from.parse::<TaskState>(), to.parse::<TaskState>()) {
        (Ok(from), Ok(to)) => from.can_transition_to(to),
        _ => false,
    }
}

/// Promote every `pending` successor of `id` whose dependencies are all
/// `done`. Returns the promoted IDs in sorted order.
fn promote_ready_downstream(g: &mut ApiGraph, id: &str) -> Vec<String> {
    let downstream: Vec<String> = g.out_edges(id).iter().map(|e| e.to.clone()).collect();

    let mut newly_ready = Vec::new();
    for target in downstream {
        let Some(node) = g.node(&target) else {
            continue;
        };
        if node.data.status != "pending" {
            continue;
        }
        let all_done = g
            .in_edges(&target)
            .iter()
            .all(|e| g.node(&e.from).is_some_and(|dep| dep.data.status == "done"));
        if !all_done {
            continue;
        }
        let mut payload = node.data.clone();
        payload.status = "ready".to_string();
        g.add_node(target.clone(), payload);
        newly_ready.push(target);
    }
    newly_ready
}

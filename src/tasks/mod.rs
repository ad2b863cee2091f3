// src/tasks/mod.rs

//! Task scheduling over a dependency graph.
//!
//! - [`state`] defines the task status state machine.
//! - [`TaskGraph`] tracks tasks and their dependencies, computes readiness,
//!   and runs ready tasks concurrently under a semaphore bound.
//!
//! The dependency graph is always directed: the edge `(a, b)` encodes
//! "b depends on a", so a task's incoming edges enumerate its dependencies.

pub mod state;

pub use state::TaskState;

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{Result, TrellisError};
use crate::graph::Graph;

/// A unit of work with a typed payload and a status.
#[derive(Debug, Clone, PartialEq)]
pub struct Task<T> {
    pub id: String,
    pub data: T,
    pub state: TaskState,
}

/// A single task failure recorded during [`TaskGraph::run`].
#[derive(Debug, Clone)]
pub struct TaskFailure {
    pub id: String,
    pub message: String,
}

/// Aggregated failures from one run: every task whose callback returned an
/// error, in completion order.
#[derive(Debug, Error)]
#[error("{} task(s) failed: {}", .failures.len(), summarize(.failures))]
pub struct RunFailure {
    pub failures: Vec<TaskFailure>,
}

fn summarize(failures: &[TaskFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{:?}: {}", f.id, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why a run stopped without completing every task.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("task run cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] RunFailure),
}

/// Tasks with dependencies, state tracking, and concurrent execution.
///
/// Every operation takes the internal lock, so the graph is safe to share
/// behind an `Arc`. Task callbacks run *without* the lock held; they may
/// perform arbitrary IO but must not assume exclusive access to the graph.
#[derive(Debug)]
pub struct TaskGraph<T> {
    inner: Mutex<Graph<Task<T>, ()>>,
}

impl<T> Default for TaskGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TaskGraph<T> {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Graph::new(true)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Graph<Task<T>, ()>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a task in the `pending` state. Re-adding an ID replaces its
    /// payload and resets its state.
    pub fn add_task(&self, id: impl Into<String>, data: T) {
        let id = id.into();
        let task = Task {
            id: id.clone(),
            data,
            state: TaskState::Pending,
        };
        self.lock().add_node(id, task);
    }

    /// Declare that task `from` depends on task `to`: `to` must complete
    /// before `from` can run.
    pub fn add_dependency(&self, from: &str, to: &str) -> Result<()> {
        // Edge direction to -> from, so incoming edges of a task are its
        // dependencies.
        self.lock().add_edge(to, from, (), 0.0)
    }

    /// Run the closure against the underlying graph, under the lock. Useful
    /// for traversal and queries over the task topology.
    pub fn with_graph<R>(&self, f: impl FnOnce(&Graph<Task<T>, ()>) -> R) -> R {
        f(&self.lock())
    }
}

impl<T: Clone> TaskGraph<T> {
    /// All currently runnable tasks in sorted-ID order.
    ///
    /// Any `pending` task whose dependencies are all `done` is promoted to
    /// `ready` as a side effect.
    pub fn ready(&self) -> Vec<Task<T>> {
        ready_locked(&mut self.lock())
    }

    /// Move a task to a new state, validating against the transition table.
    pub fn transition(&self, id: &str, next: TaskState) -> Result<()> {
        transition_locked(&mut self.lock(), id, next)
    }

    /// Current snapshot of a task.
    pub fn get(&self, id: &str) -> Option<Task<T>> {
        self.lock().node(id).map(|n| n.data.clone())
    }

    /// Set every task back to `pending`.
    pub fn reset(&self) {
        let mut g = self.lock();
        let ids: Vec<String> = g.nodes().iter().map(|n| n.id.clone()).collect();
        for id in ids {
            if let Some(node) = g.node(&id) {
                let mut task = node.data.clone();
                task.state = TaskState::Pending;
                g.add_node(id, task);
            }
        }
    }
}

fn ready_locked<T: Clone>(g: &mut Graph<Task<T>, ()>) -> Vec<Task<T>> {
    let ids: Vec<String> = g.nodes().iter().map(|n| n.id.clone()).collect();
    let mut ready = Vec::new();
    for id in ids {
        let Some(node) = g.node(&id) else {
            continue;
        };
        let mut task = node.data.clone();
        if task.state == TaskState::Pending && all_deps_done(g, &id) {
            task.state = TaskState::Ready;
            g.add_node(id, task.clone());
        }
        if task.state == TaskState::Ready {
            ready.push(task);
        }
    }
    ready
}

fn all_deps_done<T>(g: &Graph<Task<T>, ()>, id: &str) -> bool {
    g.in_edges(id)
        .iter()
        .all(|e| g.node(&e.from).is_some_and(|dep| dep.data.state == TaskState::Done))
}

fn transition_locked<T: Clone>(
    g: &mut Graph<Task<T>, ()>,
    id: &str,
    next: TaskState,
) -> Result<()> {
    let Some(node) = g.node(id) else {
        return Err(TrellisError::NodeMissing(id.to_string()));
    };
    let mut task = node.data.clone();
    if !task.state.can_transition_to(next) {
        return Err(TrellisError::InvalidTransition {
            from: task.state.as_str().to_string(),
            to: next.as_str().to_string(),
        });
    }
    task.state = next;
    g.add_node(id.to_string(), task);
    Ok(())
}

impl<T> TaskGraph<T>
where
    T: Clone + Send + 'static,
{
    /// Execute tasks in dependency order with the given concurrency limit.
    ///
    /// Each batch of ready tasks is dispatched in sorted-ID order; at most
    /// `max(1, concurrency)` callbacks run at once, enforced by a semaphore.
    /// A callback returning `Ok` moves its task to `done`; an error moves it
    /// to `failed` and is recorded. Once any batch has recorded a failure,
    /// no further batches are scheduled (downstream tasks are left as they
    /// are, not skipped).
    ///
    /// The cancellation token is consulted before each dispatch: on
    /// cancellation the remaining batch is abandoned, in-flight callbacks
    /// are awaited but not interrupted, and `RunError::Cancelled` is
    /// returned.
    pub async fn run<F, Fut>(
        self: Arc<Self>,
        cancel: &CancellationToken,
        concurrency: usize,
        f: F,
    ) -> std::result::Result<(), RunError>
    where
        F: Fn(Task<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let concurrency = concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let failures: Arc<Mutex<Vec<TaskFailure>>> = Arc::new(Mutex::new(Vec::new()));
        let f = Arc::new(f);

        loop {
            let batch = self.ready();
            if batch.is_empty() {
                break;
            }
            debug!(batch_size = batch.len(), "dispatching ready tasks");

            let mut handles = Vec::with_capacity(batch.len());
            let mut cancelled = false;

            for task in batch {
                if cancel.is_cancelled() {
                    debug!("cancellation requested; abandoning batch");
                    cancelled = true;
                    break;
                }
                if self.transition(&task.id, TaskState::Running).is_err() {
                    // Raced with an external transition; only start tasks we
                    // ourselves saw as ready.
                    continue;
                }

                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let graph = Arc::clone(&self);
                let f = Arc::clone(&f);
                let failures = Arc::clone(&failures);

                handles.push(tokio::spawn(async move {
                    let _permit = permit;
                    let Some(current) = graph.get(&task.id) else {
                        return;
                    };
                    let id = current.id.clone();
                    match f(current).await {
                        Ok(()) => {
                            let _ = graph.transition(&id, TaskState::Done);
                        }
                        Err(err) => {
                            warn!(task = %id, error = %err, "task callback failed");
                            let _ = graph.transition(&id, TaskState::Failed);
                            failures
                                .lock()
                                .unwrap_or_else(PoisonError::into_inner)
                                .push(TaskFailure {
                                    id,
                                    message: err.to_string(),
                                });
                        }
                    }
                }));
            }

            for handle in handles {
                let _ = handle.await;
            }

            if cancelled {
                return Err(RunError::Cancelled);
            }
            let failed = !failures
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty();
            if failed {
                break;
            }
        }

        let failures = std::mem::take(&mut *failures.lock().unwrap_or_else(PoisonError::into_inner));
        if failures.is_empty() {
            Ok(())
        } else {
            Err(RunFailure { failures }.into())
        }
    }
}

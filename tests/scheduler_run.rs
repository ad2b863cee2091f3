mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use tokio_util::sync::CancellationToken;
use trellis::tasks::{RunError, TaskGraph, TaskState};
use trellis_test_utils::builders::TaskGraphBuilder;

fn diamond() -> Arc<TaskGraph<()>> {
    // b and c depend on a; d depends on both b and c.
    Arc::new(
        TaskGraphBuilder::new()
            .task("a")
            .task("b")
            .task("c")
            .task("d")
            .dep("b", "a")
            .dep("c", "a")
            .dep("d", "b")
            .dep("d", "c")
            .build(),
    )
}

#[test]
fn ready_promotes_pending_tasks_with_done_deps() {
    common::init_tracing();

    let graph = diamond();

    let ready: Vec<String> = graph.ready().into_iter().map(|t| t.id).collect();
    assert_eq!(ready, vec!["a"]);

    graph.transition("a", TaskState::Running).unwrap();
    graph.transition("a", TaskState::Done).unwrap();

    let ready: Vec<String> = graph.ready().into_iter().map(|t| t.id).collect();
    assert_eq!(ready, vec!["b", "c"]);
}

#[test]
fn transitions_are_validated() {
    let graph = TaskGraphBuilder::new().task("a").build();

    assert!(graph.transition("a", TaskState::Done).is_err());
    assert!(graph.transition("missing", TaskState::Ready).is_err());

    graph.transition("a", TaskState::Ready).unwrap();
    graph.transition("a", TaskState::Running).unwrap();
    graph.transition("a", TaskState::Failed).unwrap();
    // Failed tasks may be retried.
    graph.transition("a", TaskState::Pending).unwrap();
    assert_eq!(graph.get("a").unwrap().state, TaskState::Pending);
}

#[tokio::test]
async fn run_executes_in_dependency_order() {
    common::init_tracing();

    let graph = diamond();
    let log: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let log_ref = log.clone();
    let cancel = CancellationToken::new();
    graph
        .clone()
        .run(&cancel, 2, move |task| {
            let log = log_ref.clone();
            async move {
                log.lock().unwrap().push(task.id.clone());
                Ok(())
            }
        })
        .await
        .unwrap();

    let order = log.lock().unwrap().clone();
    assert_eq!(order.len(), 4);
    assert_eq!(order[0], "a");
    assert_eq!(order[3], "d");

    for id in ["a", "b", "c", "d"] {
        assert_eq!(graph.get(id).unwrap().state, TaskState::Done);
    }
}

#[tokio::test]
async fn run_bounds_concurrency() {
    let graph = Arc::new(
        TaskGraphBuilder::new()
            .task("t1")
            .task("t2")
            .task("t3")
            .task("t4")
            .build(),
    );

    let active = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let active_ref = active.clone();
    let peak_ref = peak.clone();
    let cancel = CancellationToken::new();
    graph
        .clone()
        .run(&cancel, 2, move |_task| {
            let active = active_ref.clone();
            let peak = peak_ref.clone();
            async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            }
        })
        .await
        .unwrap();

    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn run_stops_scheduling_after_a_failed_batch() {
    let graph = Arc::new(
        TaskGraphBuilder::new()
            .task("a")
            .task("b")
            .dep("b", "a")
            .build(),
    );

    let cancel = CancellationToken::new();
    let err = graph
        .clone()
        .run(&cancel, 1, move |task| async move {
            if task.id == "a" {
                Err(anyhow!("boom"))
            } else {
                Ok(())
            }
        })
        .await
        .unwrap_err();

    match err {
        RunError::Failed(failure) => {
            assert_eq!(failure.failures.len(), 1);
            assert_eq!(failure.failures[0].id, "a");
        }
        other => panic!("expected failure, got {other:?}"),
    }

    assert_eq!(graph.get("a").unwrap().state, TaskState::Failed);
    // Downstream tasks are left alone, not skipped.
    assert_eq!(graph.get("b").unwrap().state, TaskState::Pending);
}

#[tokio::test]
async fn run_respects_cancellation() {
    let graph = Arc::new(TaskGraphBuilder::new().task("a").task("b").build());

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = graph
        .clone()
        .run(&cancel, 1, move |_task| async move { Ok(()) })
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Cancelled));

    // Nothing was started.
    assert_eq!(graph.get("a").unwrap().state, TaskState::Ready);
    assert_eq!(graph.get("b").unwrap().state, TaskState::Ready);
}

#[test]
fn reset_returns_every_task_to_pending() {
    let graph = TaskGraphBuilder::new().task("a").task("b").build();
    graph.transition("a", TaskState::Ready).unwrap();
    graph.transition("a", TaskState::Running).unwrap();
    graph.transition("a", TaskState::Done).unwrap();

    graph.reset();
    assert_eq!(graph.get("a").unwrap().state, TaskState::Pending);
    assert_eq!(graph.get("b").unwrap().state, TaskState::Pending);
}

#[test]
fn with_graph_exposes_the_task_topology() {
    let graph = diamond();
    let deps: Vec<String> = graph.with_graph(|g| {
        g.in_edges("d").iter().map(|e| e.from.clone()).collect()
    });
    assert_eq!(deps, vec!["b", "c"]);
}

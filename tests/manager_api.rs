mod common;

use serde_json::json;
use tempfile::TempDir;
use trellis::errors::TrellisError;
use trellis::manager::{Manager, RemoveRequest, EdgeRef};
use trellis_test_utils::builders::{UpsertBuilder, UpsertEdgeBuilder, UpsertNodeBuilder};

fn manager() -> (Manager, TempDir) {
    let dir = TempDir::new().expect("temp dir");
    let mgr = Manager::new(dir.path()).expect("manager");
    (mgr, dir)
}

#[test]
fn open_creates_an_empty_directed_graph() {
    common::init_tracing();

    let (mgr, _dir) = manager();
    let info = mgr.open("fresh").unwrap();
    assert_eq!(info.name, "fresh");
    assert_eq!(info.node_count, 0);
    assert_eq!(info.edge_count, 0);
    assert!(info.directed);

    // Opening again returns the cached graph.
    let again = mgr.open("fresh").unwrap();
    assert_eq!(again, info);
}

#[test]
fn save_requires_an_open_graph() {
    let (mgr, _dir) = manager();
    let err = mgr.save("never-opened").unwrap_err();
    assert!(matches!(err, TrellisError::GraphNotOpen(_)));
}

#[test]
fn save_and_reopen_roundtrips_through_disk() {
    let dir = TempDir::new().unwrap();

    {
        let mgr = Manager::new(dir.path()).unwrap();
        mgr.open("plan").unwrap();
        let req = UpsertBuilder::new("plan")
            .with_node(
                UpsertNodeBuilder::new("a")
                    .label("start")
                    .status("pending")
                    .meta("lang", json!("rust"))
                    .build(),
            )
            .with_edge(UpsertEdgeBuilder::new("a", "b").weight(2.5).build())
            .build();
        mgr.upsert(&req).unwrap();
        mgr.save("plan").unwrap();
    }

    // A fresh manager over the same directory sees the persisted state.
    let mgr = Manager::new(dir.path()).unwrap();
    let info = mgr.open("plan").unwrap();
    assert_eq!(info.node_count, 2);
    assert_eq!(info.edge_count, 1);

    let summary = mgr.summary("plan").unwrap();
    assert_eq!(summary.roots, vec!["a"]);
    assert_eq!(summary.leaves, vec!["b"]);
}

#[test]
fn list_reports_cached_and_on_disk_graphs_sorted() {
    let (mgr, dir) = manager();

    mgr.open("beta").unwrap();
    mgr.save("beta").unwrap();
    mgr.open("alpha").unwrap();
    mgr.upsert(
        &UpsertBuilder::new("alpha")
            .with_edge(UpsertEdgeBuilder::new("x", "y").build())
            .build(),
    )
    .unwrap();
    mgr.save("alpha").unwrap();

    // A stray non-snapshot file is skipped.
    std::fs::write(dir.path().join("junk.json"), "not json").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let infos = mgr.list().unwrap();
    let names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    assert_eq!(infos[0].node_count, 2);
    assert_eq!(infos[0].edge_count, 1);
}

#[test]
fn list_peeks_files_that_are_not_cached() {
    let dir = TempDir::new().unwrap();
    {
        let mgr = Manager::new(dir.path()).unwrap();
        mgr.open("peeked").unwrap();
        mgr.upsert(
            &UpsertBuilder::new("peeked")
                .with_edge(UpsertEdgeBuilder::new("a", "b").build())
                .build(),
        )
        .unwrap();
        mgr.save("peeked").unwrap();
    }

    let mgr = Manager::new(dir.path()).unwrap();
    let infos = mgr.list().unwrap();
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].name, "peeked");
    assert_eq!(infos[0].node_count, 2);
    assert_eq!(infos[0].edge_count, 1);
    assert!(infos[0].directed);
}

#[test]
fn delete_drops_cache_and_file() {
    let (mgr, dir) = manager();
    mgr.open("doomed").unwrap();
    mgr.save("doomed").unwrap();
    assert!(dir.path().join("doomed.json").exists());

    mgr.delete("doomed").unwrap();
    assert!(!dir.path().join("doomed.json").exists());
    assert!(matches!(
        mgr.save("doomed"),
        Err(TrellisError::GraphNotOpen(_))
    ));

    // Deleting a graph that never existed is fine.
    mgr.delete("doomed").unwrap();
}

#[test]
fn summary_counts_statuses_and_components() {
    let (mgr, _dir) = manager();
    mgr.open("g").unwrap();
    mgr.upsert(
        &UpsertBuilder::new("g")
            .with_node(UpsertNodeBuilder::new("a").status("done").build())
            .with_node(UpsertNodeBuilder::new("b").status("done").build())
            .with_node(UpsertNodeBuilder::new("c").build())
            .with_node(UpsertNodeBuilder::new("island").build())
            .with_edge(UpsertEdgeBuilder::new("a", "b").build())
            .with_edge(UpsertEdgeBuilder::new("b", "c").build())
            .build(),
    )
    .unwrap();

    let summary = mgr.summary("g").unwrap();
    assert_eq!(summary.info.node_count, 4);
    assert_eq!(summary.roots, vec!["a", "island"]);
    assert_eq!(summary.leaves, vec!["c", "island"]);
    assert_eq!(summary.components, 2);
    assert_eq!(summary.status_counts.get("done"), Some(&2));
    assert_eq!(summary.status_counts.get("(none)"), Some(&2));
}

#[test]
fn remove_counts_only_what_existed() {
    let (mgr, _dir) = manager();
    mgr.open("g").unwrap();
    mgr.upsert(
        &UpsertBuilder::new("g")
            .with_edge(UpsertEdgeBuilder::new("a", "b").build())
            .with_edge(UpsertEdgeBuilder::new("b", "c").build())
            .build(),
    )
    .unwrap();

    let outcome = mgr
        .remove(&RemoveRequest {
            graph: "g".to_string(),
            nodes: vec!["a".to_string(), "ghost".to_string()],
            edges: vec![
                EdgeRef {
                    from: "b".to_string(),
                    to: "c".to_string(),
                },
                EdgeRef {
                    from: "c".to_string(),
                    to: "b".to_string(),
                },
            ],
        })
        .unwrap();

    assert_eq!(outcome.nodes_removed, 1);
    assert_eq!(outcome.edges_removed, 1);

    let summary = mgr.summary("g").unwrap();
    assert_eq!(summary.info.node_count, 2);
    assert_eq!(summary.info.edge_count, 0);
}

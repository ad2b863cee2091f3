mod common;

use serde_json::json;
use trellis::errors::TrellisError;
use trellis::graph::{
    ancestors, bfs, connected_components, cycle_detect, descendants, dfs, leaves, roots,
    shortest_path, subgraph, topological_sort, Graph,
};

fn diamond() -> Graph<(), ()> {
    // a -> b -> d
    //   \-> c -/
    let mut g = Graph::new(true);
    for id in ["a", "b", "c", "d"] {
        g.add_node(id, ());
    }
    g.add_edge("a", "b", (), 1.0).unwrap();
    g.add_edge("a", "c", (), 1.0).unwrap();
    g.add_edge("b", "d", (), 1.0).unwrap();
    g.add_edge("c", "d", (), 1.0).unwrap();
    g
}

#[test]
fn bfs_visits_in_level_order_with_sorted_ties() {
    common::init_tracing();

    let g = diamond();
    assert_eq!(bfs(&g, "a", |_| true), vec!["a", "b", "c", "d"]);
    assert!(bfs(&g, "missing", |_| true).is_empty());
}

#[test]
fn bfs_visitor_halts_traversal() {
    let g = diamond();
    let order = bfs(&g, "a", |n| n.id != "b");
    // "b" is already part of the order when the visitor stops the walk.
    assert_eq!(order, vec!["a", "b"]);
}

#[test]
fn dfs_visits_preorder_with_sorted_neighbors() {
    let g = diamond();
    assert_eq!(dfs(&g, "a", |_| true), vec!["a", "b", "d", "c"]);

    let order = dfs(&g, "a", |n| n.id != "d");
    assert_eq!(order, vec!["a", "b", "d"]);
}

#[test]
fn shortest_path_prefers_cheapest_route() {
    let mut g: Graph<(), ()> = Graph::new(true);
    for id in ["a", "b", "c", "d"] {
        g.add_node(id, ());
    }
    g.add_edge("a", "b", (), 1.0).unwrap();
    g.add_edge("b", "d", (), 2.0).unwrap();
    g.add_edge("a", "c", (), 1.0).unwrap();
    g.add_edge("c", "d", (), 1.0).unwrap();

    let (path, cost) = shortest_path(&g, "a", "d").unwrap();
    assert_eq!(path, vec!["a", "c", "d"]);
    assert_eq!(cost, 2.0);
}

#[test]
fn shortest_path_errors() {
    let mut g: Graph<(), ()> = Graph::new(true);
    g.add_node("a", ());
    g.add_node("b", ());

    assert!(matches!(
        shortest_path(&g, "a", "zz"),
        Err(TrellisError::NodeMissing(_))
    ));
    assert!(matches!(
        shortest_path(&g, "a", "b"),
        Err(TrellisError::NoPath(_, _))
    ));

    let (path, cost) = shortest_path(&g, "a", "a").unwrap();
    assert_eq!(path, vec!["a"]);
    assert_eq!(cost, 0.0);
}

#[test]
fn topological_sort_breaks_ties_by_id() {
    let g = diamond();
    assert_eq!(topological_sort(&g).unwrap(), vec!["a", "b", "c", "d"]);
}

#[test]
fn topological_sort_rejects_undirected_and_cyclic_graphs() {
    let undirected: Graph<(), ()> = Graph::new(false);
    assert!(matches!(
        topological_sort(&undirected),
        Err(TrellisError::Undirected)
    ));

    let mut cyclic: Graph<(), ()> = Graph::new(true);
    for id in ["a", "b"] {
        cyclic.add_node(id, ());
    }
    cyclic.add_edge("a", "b", (), 1.0).unwrap();
    cyclic.add_edge("b", "a", (), 1.0).unwrap();
    assert!(matches!(
        topological_sort(&cyclic),
        Err(TrellisError::Cycle)
    ));
}

#[test]
fn cycle_detect_reports_the_cycle_nodes() {
    let mut g: Graph<(), ()> = Graph::new(true);
    for id in ["a", "b", "c"] {
        g.add_node(id, ());
    }
    g.add_edge("a", "b", (), 1.0).unwrap();
    g.add_edge("b", "c", (), 1.0).unwrap();
    g.add_edge("c", "a", (), 1.0).unwrap();

    let cycle = cycle_detect(&g).expect("cycle expected");
    let mut nodes = cycle.clone();
    nodes.sort();
    nodes.dedup();
    assert_eq!(nodes, vec!["a", "b", "c"]);
}

#[test]
fn cycle_detect_ignores_acyclic_and_undirected_graphs() {
    assert!(cycle_detect(&diamond()).is_none());

    // An undirected triangle is not a cycle at this API.
    let mut g: Graph<(), ()> = Graph::new(false);
    for id in ["a", "b", "c"] {
        g.add_node(id, ());
    }
    g.add_edge("a", "b", (), 1.0).unwrap();
    g.add_edge("b", "c", (), 1.0).unwrap();
    g.add_edge("c", "a", (), 1.0).unwrap();
    assert!(cycle_detect(&g).is_none());
}

#[test]
fn connected_components_are_weak_and_sorted() {
    let mut g: Graph<(), ()> = Graph::new(true);
    for id in ["a", "b", "c", "x", "y", "lone"] {
        g.add_node(id, ());
    }
    g.add_edge("b", "a", (), 1.0).unwrap();
    g.add_edge("b", "c", (), 1.0).unwrap();
    g.add_edge("x", "y", (), 1.0).unwrap();

    let components = connected_components(&g);
    assert_eq!(
        components,
        vec![
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
            vec!["lone".to_string()],
            vec!["x".to_string(), "y".to_string()],
        ]
    );
}

#[test]
fn subgraph_keeps_inner_edges_and_copies_metadata() {
    let mut g: Graph<String, String> = Graph::new(true);
    for id in ["a", "b", "c"] {
        g.add_node(id, id.to_uppercase());
    }
    g.add_edge("a", "b", "ab".to_string(), 1.0).unwrap();
    g.add_edge("b", "c", "bc".to_string(), 1.0).unwrap();
    g.node_meta_mut("a").unwrap().set("role", json!("start"));
    g.edge_meta_mut("a", "b").unwrap().set("type", json!("link"));

    let sub = subgraph(&g, &["a".to_string(), "b".to_string()]);
    assert_eq!(sub.order(), 2);
    assert!(sub.has_edge("a", "b"));
    assert!(!sub.has_node("c"));
    assert_eq!(
        sub.node_meta("a").unwrap().get("role"),
        Some(&json!("start"))
    );
    assert_eq!(
        sub.edge_meta("a", "b").unwrap().get("type"),
        Some(&json!("link"))
    );

    // The subgraph's metadata is independent of the parent's.
    g.node_meta_mut("a").unwrap().set("role", json!("changed"));
    assert_eq!(
        sub.node_meta("a").unwrap().get("role"),
        Some(&json!("start"))
    );
}

#[test]
fn reachability_and_degree_queries() {
    let g = diamond();

    assert_eq!(ancestors(&g, "d"), vec!["a", "b", "c"]);
    assert_eq!(descendants(&g, "a"), vec!["b", "c", "d"]);
    assert!(ancestors(&g, "a").is_empty());

    let root_ids: Vec<&str> = roots(&g).iter().map(|n| n.id.as_str()).collect();
    let leaf_ids: Vec<&str> = leaves(&g).iter().map(|n| n.id.as_str()).collect();
    assert_eq!(root_ids, vec!["a"]);
    assert_eq!(leaf_ids, vec!["d"]);
}

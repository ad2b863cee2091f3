// src/graph/traverse.rs

//! Deterministic graph algorithms: BFS/DFS, Dijkstra shortest path, Kahn
//! topological sort, cycle detection, weakly connected components, and
//! subgraph extraction.
//!
//! All functions are read-only with respect to the graph. Wherever neighbors
//! are enumerated, the order is `Graph::neighbors` (sorted), so results are
//! reproducible for a fixed graph state.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, VecDeque};

use crate::errors::{Result, TrellisError};
use crate::graph::core::{Graph, Node};

/// Breadth-first traversal from `start`, returning visited IDs in order.
///
/// `visit` is invoked once per visited node; returning false halts the
/// traversal immediately (the current node is already part of the order, and
/// no further neighbors are enqueued). Returns an empty order if `start`
/// does not exist.
pub fn bfs<N, E>(
    g: &Graph<N, E>,
    start: &str,
    mut visit: impl FnMut(&Node<N>) -> bool,
) -> Vec<String> {
    if !g.has_node(start) {
        return Vec::new();
    }

    let mut visited = BTreeSet::from([start.to_string()]);
    let mut queue = VecDeque::from([start.to_string()]);
    let mut order = Vec::new();

    while let Some(id) = queue.pop_front() {
        order.push(id.clone());
        if let Some(node) = g.node(&id) {
            if !visit(node) {
                break;
            }
        }
        for nb in g.neighbors(&id) {
            if visited.insert(nb.clone()) {
                queue.push_back(nb);
            }
        }
    }
    order
}

/// Depth-first pre-order traversal from `start`, returning visited IDs.
///
/// Same visitor and early-stop contract as [`bfs`].
pub fn dfs<N, E>(
    g: &Graph<N, E>,
    start: &str,
    mut visit: impl FnMut(&Node<N>) -> bool,
) -> Vec<String> {
    if !g.has_node(start) {
        return Vec::new();
    }

    let mut visited = BTreeSet::new();
    let mut order = Vec::new();
    dfs_walk(g, start, &mut visited, &mut order, &mut visit);
    order
}

fn dfs_walk<N, E>(
    g: &Graph<N, E>,
    id: &str,
    visited: &mut BTreeSet<String>,
    order: &mut Vec<String>,
    visit: &mut impl FnMut(&Node<N>) -> bool,
) -> bool {
    if !visited.insert(id.to_string()) {
        return true;
    }
    order.push(id.to_string());
    if let Some(node) = g.node(id) {
        if !visit(node) {
            return false;
        }
    }
    for nb in g.neighbors(id) {
        if !dfs_walk(g, &nb, visited, order, visit) {
            return false;
        }
    }
    true
}

/// Entry in the Dijkstra frontier. `BinaryHeap` is a max-heap, so the
/// ordering is inverted to pop the smallest accumulated distance first, with
/// the node ID as a reproducible tie-break.
#[derive(Debug)]
struct HeapEntry {
    dist: f64,
    id: String,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest weighted path from `src` to `dst` using Dijkstra's algorithm.
///
/// Returns the path as node IDs plus the total cost. Fails with
/// `NodeMissing` if either endpoint is absent, or `NoPath` if `dst` is
/// unreachable.
pub fn shortest_path<N, E>(g: &Graph<N, E>, src: &str, dst: &str) -> Result<(Vec<String>, f64)> {
    if !g.has_node(src) {
        return Err(TrellisError::NodeMissing(src.to_string()));
    }
    if !g.has_node(dst) {
        return Err(TrellisError::NodeMissing(dst.to_string()));
    }

    let mut dist: BTreeMap<String, f64> = BTreeMap::from([(src.to_string(), 0.0)]);
    let mut prev: BTreeMap<String, String> = BTreeMap::new();
    let mut heap = BinaryHeap::from([HeapEntry {
        dist: 0.0,
        id: src.to_string(),
    }]);

    while let Some(entry) = heap.pop() {
        // Stale frontier entry superseded by a shorter distance.
        if dist.get(&entry.id).is_some_and(|&d| entry.dist > d) {
            continue;
        }
        if entry.id == dst {
            break;
        }
        for e in g.out_edges(&entry.id) {
            let next = entry.dist + e.weight;
            if dist.get(&e.to).map_or(true, |&d| next < d) {
                dist.insert(e.to.clone(), next);
                prev.insert(e.to.clone(), entry.id.clone());
                heap.push(HeapEntry {
                    dist: next,
                    id: e.to.clone(),
                });
            }
        }
    }

    let Some(&cost) = dist.get(dst) else {
        return Err(TrellisError::NoPath(src.to_string(), dst.to_string()));
    };

    // Reconstruct by walking the predecessor chain back to the source.
    let mut path = vec![dst.to_string()];
    let mut cur = dst.to_string();
    while cur != src {
        let Some(p) = prev.get(&cur) else {
            break;
        };
        path.push(p.clone());
        cur = p.clone();
    }
    path.reverse();
    Ok((path, cost))
}

/// Topological ordering of a directed graph via Kahn's algorithm.
///
/// The ready set is kept in sorted-ID order, so ties always break the same
/// way. Fails with `Undirected` for undirected graphs and `Cycle` when the
/// ordering cannot cover every node.
pub fn topological_sort<N, E>(g: &Graph<N, E>) -> Result<Vec<String>> {
    if !g.is_directed() {
        return Err(TrellisError::Undirected);
    }

    let mut in_deg: BTreeMap<String, usize> = g
        .nodes()
        .iter()
        .map(|n| (n.id.clone(), g.in_edges(&n.id).len()))
        .collect();
    let mut ready: BTreeSet<String> = in_deg
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| id.clone())
        .collect();

    let mut order = Vec::with_capacity(in_deg.len());
    while let Some(id) = ready.pop_first() {
        for nb in g.neighbors(&id) {
            if let Some(deg) = in_deg.get_mut(&nb) {
                *deg -= 1;
                if *deg == 0 {
                    ready.insert(nb);
                }
            }
        }
        order.push(id);
    }

    if order.len() != g.order() {
        return Err(TrellisError::Cycle);
    }
    Ok(order)
}

#[derive(Clone, Copy, PartialEq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Detect a cycle in a directed graph via DFS tri-coloring.
///
/// Returns one cycle in forward order, or `None` if the graph is acyclic.
/// Undirected graphs always report `None`; their symmetric adjacency records
/// are not treated as cycles.
pub fn cycle_detect<N, E>(g: &Graph<N, E>) -> Option<Vec<String>> {
    if !g.is_directed() {
        return None;
    }

    let mut color: BTreeMap<String, Color> = BTreeMap::new();
    let mut parent: BTreeMap<String, String> = BTreeMap::new();

    for node in g.nodes() {
        if color.get(&node.id).copied().unwrap_or(Color::White) == Color::White {
            if let Some(cycle) = cycle_dfs(g, &node.id, &mut color, &mut parent) {
                return Some(cycle);
            }
        }
    }
    None
}

fn cycle_dfs<N, E>(
    g: &Graph<N, E>,
    id: &str,
    color: &mut BTreeMap<String, Color>,
    parent: &mut BTreeMap<String, String>,
) -> Option<Vec<String>> {
    color.insert(id.to_string(), Color::Gray);
    for nb in g.neighbors(id) {
        match color.get(&nb).copied().unwrap_or(Color::White) {
            Color::Gray => {
                // Back edge: rebuild the cycle through the parent links.
                let mut cycle = vec![nb.clone(), id.to_string()];
                let mut cur = id.to_string();
                while cur != nb {
                    match parent.get(&cur) {
                        Some(p) if *p == nb => break,
                        Some(p) => {
                            cycle.push(p.clone());
                            cur = p.clone();
                        }
                        None => break,
                    }
                }
                cycle.reverse();
                return Some(cycle);
            }
            Color::White => {
                parent.insert(nb.clone(), id.to_string());
                if let Some(cycle) = cycle_dfs(g, &nb, color, parent) {
                    return Some(cycle);
                }
            }
            Color::Black => {}
        }
    }
    color.insert(id.to_string(), Color::Black);
    None
}

/// Connected components, each returned as a sorted list of node IDs.
///
/// Directed edges are treated as symmetric, so for directed graphs this
/// yields the weakly connected components. Components appear in order of
/// their smallest member.
pub fn connected_components<N, E>(g: &Graph<N, E>) -> Vec<Vec<String>> {
    let mut adj: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for node in g.nodes() {
        adj.entry(node.id.as_str()).or_default();
    }
    for e in g.edges() {
        adj.entry(e.from.as_str()).or_default().insert(e.to.as_str());
        adj.entry(e.to.as_str()).or_default().insert(e.from.as_str());
    }

    let mut visited: BTreeSet<&str> = BTreeSet::new();
    let mut components = Vec::new();

    for node in g.nodes() {
        if visited.contains(node.id.as_str()) {
            continue;
        }
        let mut component = BTreeSet::from([node.id.as_str()]);
        let mut queue = VecDeque::from([node.id.as_str()]);
        visited.insert(node.id.as_str());
        while let Some(id) = queue.pop_front() {
            if let Some(neighbors) = adj.get(id) {
                for &nb in neighbors {
                    if visited.insert(nb) {
                        component.insert(nb);
                        queue.push_back(nb);
                    }
                }
            }
        }
        components.push(component.into_iter().map(str::to_string).collect());
    }
    components
}

/// Extract a new graph containing exactly the given nodes and the edges
/// whose endpoints are both in the set. Metadata stores for included nodes
/// and edges are copied, so the subgraph is fully independent.
pub fn subgraph<N, E>(g: &Graph<N, E>, ids: &[String]) -> Graph<N, E>
where
    N: Clone,
    E: Clone,
{
    let mut sub = Graph::new(g.is_directed());
    let id_set: BTreeSet<&str> = ids.iter().map(String::as_str).collect();

    for id in &id_set {
        if let Some(n) = g.node(id) {
            sub.add_node(n.id.clone(), n.data.clone());
        }
    }
    for id in &id_set {
        for e in g.out_edges(id) {
            if id_set.contains(e.to.as_str()) && !sub.has_edge(&e.from, &e.to) {
                let _ = sub.add_edge(&e.from, &e.to, e.data.clone(), e.weight);
            }
        }
    }

    for id in &id_set {
        if let Some(src) = g.node_meta(id) {
            if let Some(dst) = sub.node_meta_mut(id) {
                *dst = src.clone();
            }
        }
    }
    let edge_keys: Vec<(String, String)> = sub
        .edges()
        .iter()
        .map(|e| (e.from.clone(), e.to.clone()))
        .collect();
    for (from, to) in edge_keys {
        if let Some(src) = g.edge_meta(&from, &to) {
            if let Some(dst) = sub.edge_meta_mut(&from, &to) {
                *dst = src.clone();
            }
        }
    }
    sub
}

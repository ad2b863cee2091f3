#![allow(dead_code)]

use serde_json::Value;
use trellis::manager::{UpsertEdge, UpsertNode, UpsertRequest};
use trellis::tasks::TaskGraph;

/// Builder for `UpsertRequest` to simplify test setup.
pub struct UpsertBuilder {
    request: UpsertRequest,
}

impl UpsertBuilder {
    pub fn new(graph: &str) -> Self {
        Self {
            request: UpsertRequest {
                graph: graph.to_string(),
                nodes: Vec::new(),
                edges: Vec::new(),
            },
        }
    }

    pub fn with_node(mut self, node: UpsertNode) -> Self {
        self.request.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: UpsertEdge) -> Self {
        self.request.edges.push(edge);
        self
    }

    pub fn build(self) -> UpsertRequest {
        self.request
    }
}

/// Builder for `UpsertNode`.
pub struct UpsertNodeBuilder {
    node: UpsertNode,
}

impl UpsertNodeBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            node: UpsertNode {
                id: id.to_string(),
                ..UpsertNode::default()
            },
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.node.label = label.to_string();
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.node.status = status.to_string();
        self
    }

    pub fn meta(mut self, key: &str, value: Value) -> Self {
        self.node.meta.insert(key.to_string(), value);
        self
    }

    pub fn delete(mut self, key: &str) -> Self {
        self.node.delete.push(key.to_string());
        self
    }

    pub fn build(self) -> UpsertNode {
        self.node
    }
}

/// Builder for `UpsertEdge`.
pub struct UpsertEdgeBuilder {
    edge: UpsertEdge,
}

impl UpsertEdgeBuilder {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            edge: UpsertEdge {
                from: from.to_string(),
                to: to.to_string(),
                ..UpsertEdge::default()
            },
        }
    }

    pub fn label(mut self, label: &str) -> Self {
        self.edge.label = label.to_string();
        self
    }

    pub fn weight(mut self, weight: f64) -> Self {
        self.edge.weight = weight;
        self
    }

    pub fn meta(mut self, key: &str, value: Value) -> Self {
        self.edge.meta.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> UpsertEdge {
        self.edge
    }
}

/// Builder for a `TaskGraph<()>` from task IDs and dependency pairs.
pub struct TaskGraphBuilder {
    tasks: Vec<String>,
    deps: Vec<(String, String)>,
}

impl TaskGraphBuilder {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            deps: Vec::new(),
        }
    }

    pub fn task(mut self, id: &str) -> Self {
        self.tasks.push(id.to_string());
        self
    }

    /// Declare that `from` depends on `to`.
    pub fn dep(mut self, from: &str, to: &str) -> Self {
        self.deps.push((from.to_string(), to.to_string()));
        self
    }

    pub fn build(self) -> TaskGraph<()> {
        let graph = TaskGraph::new();
        for id in &self.tasks {
            graph.add_task(id.clone(), ());
        }
        for (from, to) in &self.deps {
            graph
                .add_dependency(from, to)
                .expect("dependency endpoints must be declared as tasks");
        }
        graph
    }
}

impl Default for TaskGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

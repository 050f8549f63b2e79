//! Graph Export
//!
//! A serializable snapshot of the registered nodes and edges, for inspection
//! with external tools. Renders to Graphviz DOT, JSON or MessagePack.


use serde::Serialize;

use super::DependencyGraph;
use crate::error::Result;
use crate::task::{TaskId, TaskState, Value};

/// One registered node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeExport {
    pub id: TaskId,
    pub name: String,
    pub kind: &'static str,
    pub state: TaskState,
    pub value: Option<Value>,
}

/// Snapshot of a graph's nodes and edges.
///
/// Edges are `(producer name, consumer name)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeExport>,
    pub edges: Vec<(String, String)>,
}

impl GraphExport {
    /// Render as a Graphviz digraph.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph tickgraph {\n");
        for node in &self.nodes {
            out.push_str(&format!("    {};\n", quote(&node.name)));
        }
        for (producer, consumer) in &self.edges {
            out.push_str(&format!("    {} -> {};\n", quote(producer), quote(consumer)));
        }
        out.push_str("}\n");
        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn to_msgpack(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }
}

fn quote(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('"');
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

impl DependencyGraph {
    /// Snapshot the registered nodes (in insertion order) and their edges.
    pub fn export(&self) -> GraphExport {
        let node = |id: TaskId| {
            let kind = self.kind_label(id);
            NodeExport {
                id,
                name: self.name(id).unwrap_or_default().to_string(),
                kind,
                state: self.state(id).unwrap_or(TaskState::Pending),
                value: self.raw_value(id).cloned(),
            }
        };
        let name = |id: TaskId| self.name(id).unwrap_or_default().to_string();

        GraphExport {
            nodes: self.nodes().map(node).collect(),
            edges: self.edges().map(|(p, c)| (name(p), name(c))).collect(),
        }
    }
}

//! Dependency Graph
//!
//! This module implements the computational dependency graph that tracks
//! producer→consumer relationships between tasks.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph (DAG) where:
//!
//! - Nodes are tasks (constants, computations, arrays, cell values)
//! - Edges represent dependencies: if task A reads B, there is an edge from B to A
//!
//! Edges are registered as a side effect of building tasks, so callers rarely
//! call [`DependencyGraph::add_dependency`] directly. Evaluation is explicit:
//! [`DependencyGraph::calculate`] runs every Pending task in topological order,
//! and [`DependencyGraph::update`] invalidates one task's downstream closure
//! before recalculating.
//!
//! # Design Decisions
//!
//! 1. The graph is an owned value rather than a process-wide registry. Several
//!    independent graphs can coexist, and mutation requires `&mut`.
//!
//! 2. Tasks live in an arena indexed by [`TaskId`](crate::task::TaskId). A task
//!    only becomes a graph node once it has an edge, and a non-cell task that
//!    loses its last edge gives its slot back for reuse. Ids carry the slot's
//!    generation so stale handles are caught.
//!
//! 3. We maintain both parent and child adjacency for every node so traversal
//!    is cheap in both directions.

mod config;
mod dependency;
mod export;
mod scheduler;
mod shared;

pub use config::GraphConfig;
pub use dependency::DependencyGraph;
pub use export::{GraphExport, NodeExport};
pub use scheduler::CalculationTasks;
pub use shared::SharedGraph;

//! Tickgraph Core
//!
//! This crate provides a dependency-tracked computation graph and a
//! time-indexed sheet built on top of it. It implements:
//!
//! - Lazy, memoized tasks whose dependency edges are registered as they are built
//! - Cycle detection and deterministic topological evaluation
//! - Incremental updates that recompute exactly the downstream closure of a change
//! - Sheets of cells with replaceable formulas, addressed by row and tick
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `task`: Task handles, values and the combinator that builds compute tasks
//! - `graph`: The dependency graph, its scheduler and exports
//! - `sheet`: Cells and sheets over the graph
//! - `ticks`: Day, week and month time axes
//! - `input`: Input series for the inventory model
//!
//! # Example
//!
//! ```rust
//! use tickgraph_core::graph::DependencyGraph;
//!
//! let mut graph = DependencyGraph::new();
//! let price = graph.value_task(|| 2.0);
//! let quantity = graph.constant(3.0);
//! let total = graph.mul(price, quantity);
//!
//! graph.calculate().unwrap();
//! assert_eq!(graph.value(total).unwrap(), 6.0);
//!
//! // Change an input and recompute what depends on it
//! graph.set_source(price, || 5.0).unwrap();
//! graph.update(price).unwrap();
//! assert_eq!(graph.value(total).unwrap(), 15.0);
//! ```

pub mod error;
pub mod graph;
pub mod input;
pub mod sheet;
pub mod task;
pub mod ticks;

pub use error::{Error, Result};

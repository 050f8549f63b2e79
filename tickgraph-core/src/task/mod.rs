//! Tasks
//!
//! A task is a unit of lazy, memoized, at-most-once-per-reset computation.
//! Every node of a [`DependencyGraph`](crate::graph::DependencyGraph) is a
//! task, stored in the graph's arena and addressed by a [`TaskId`].
//!
//! # Kinds
//!
//! - **Constant**: a literal. Done from the moment it is created, and
//!   re-done immediately whenever it is reset.
//! - **Compute**: a pure function applied to the values of its inputs.
//! - **Array**: the values of several tasks collected into one sequence.
//! - **Cell value**: the current value of a sheet cell, read through whichever
//!   formula is assigned to the cell at run time.
//!
//! # State
//!
//! A task is either [`TaskState::Pending`] or [`TaskState::Done`]. Running a
//! Done task does nothing; running a Pending one executes it and, only if that
//! succeeds, caches the value and marks it Done. Reading a Pending task's
//! value fails with [`Error::NotEvaluated`](crate::Error::NotEvaluated).

mod combinator;
mod handle;
mod node;
mod value;

pub use combinator::{Combinator, Operands, TaskFn};
pub use handle::{IntoOperand, ValueArray, ValueTask};
pub use node::{TaskId, TaskState};
pub use value::{Data, Value};

pub(crate) use node::{TaskKind, TaskNode};

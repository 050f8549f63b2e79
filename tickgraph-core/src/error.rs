//! Error Types
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the single [`Error`] enum below. Failures are synchronous and bubble to
//! the caller; nothing is retried and nothing is rolled back.

use thiserror::Error;

use crate::task::TaskId;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can go wrong while building or evaluating a graph.
#[derive(Debug, Error)]
pub enum Error {
    /// A topological order was requested but the edge set contains a cycle.
    #[error("cyclic dependency detected")]
    CyclicDependency,

    /// A task's value was read before the task finished executing.
    #[error("task '{task}' has not been evaluated")]
    NotEvaluated { task: String },

    /// A cell's formula was read before anything was assigned to it.
    #[error("cell is empty (row: {row}, col: {column})")]
    AccessEmptyCell { row: String, column: String },

    /// A tick could not be parsed from text.
    #[error("{kind}: invalid format '{input}'")]
    InvalidFormat { kind: &'static str, input: String },

    /// Input data failed validation.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A tick slice has no stop or a step that never reaches it.
    #[error("unterminating slice (start: {start}, stop: {stop:?}, step: {step:?})")]
    UnterminatingSlice {
        start: i64,
        stop: Option<i64>,
        step: Option<i64>,
    },

    /// A value was read as a different type than the one it holds.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// The handle does not belong to this graph's arena, or its task was released.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// A cell-only operation was called with a task that is not a cell value.
    #[error("task {0} is not a cell value")]
    NotACell(TaskId),

    /// `set_source` was called on a task that is not a zero-input computation.
    #[error("task {0} is not a source task")]
    NotASource(TaskId),

    #[error("unknown row '{0}'")]
    UnknownRow(String),

    #[error("column '{0}' is outside the sheet")]
    UnknownColumn(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    MessagePack(#[from] rmp_serde::encode::Error),
}

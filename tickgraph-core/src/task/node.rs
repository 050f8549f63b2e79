//! Task Nodes
//!
//! This module defines the task records stored in the graph's arena.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smallvec::SmallVec;

use super::value::Value;
use crate::error::{Error, Result};

/// Handle to a task in a [`DependencyGraph`](crate::graph::DependencyGraph).
///
/// A handle is an arena slot plus the generation of that slot when the task
/// was created. Slots are recycled once their task is released, and the
/// generation bump makes older handles to the slot fail with
/// [`Error::UnknownTask`] instead of reaching the new occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TaskId {
    index: u32,
    generation: u32,
}

impl TaskId {
    pub(crate) fn from_parts(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Get the raw arena index.
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// How many times the slot had been recycled when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.index)
    }
}

/// Execution state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TaskState {
    /// The task has not run since creation or since its last reset.
    Pending,

    /// The task has run and its value is cached.
    Done,
}

/// Type-erased task function: receives the resolved input values in order.
pub(crate) type ComputeFn = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// What a task does when it executes.
pub(crate) enum TaskKind {
    /// A literal. Always Done.
    Constant(Value),

    /// Applies `func` to the values of `inputs`.
    Compute {
        inputs: SmallVec<[TaskId; 4]>,
        func: ComputeFn,
    },

    /// Collects the values of `elements`, in order, into an array.
    Array { elements: Vec<TaskId> },

    /// Forwards the value of the owning cell's current formula.
    CellValue {
        row: String,
        column: String,
        formula: Option<TaskId>,
    },
}

impl TaskKind {
    pub(crate) fn label(&self) -> &'static str {
        match self {
            TaskKind::Constant(_) => "constant",
            TaskKind::Compute { .. } => "compute",
            TaskKind::Array { .. } => "array",
            TaskKind::CellValue { .. } => "cell",
        }
    }
}

/// A task in the arena.
pub(crate) struct TaskNode {
    name: String,
    state: TaskState,
    value: Option<Value>,
    pub(crate) kind: TaskKind,
}

impl TaskNode {
    /// Create a pending task. Constants are created Done with their value.
    pub(crate) fn new(id: TaskId, kind: TaskKind) -> Self {
        let (state, value) = match &kind {
            TaskKind::Constant(v) => (TaskState::Done, Some(v.clone())),
            _ => (TaskState::Pending, None),
        };
        Self {
            name: id.to_string(),
            state,
            value,
            kind,
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn state(&self) -> TaskState {
        self.state
    }

    pub(crate) fn is_done(&self) -> bool {
        self.state == TaskState::Done
    }

    /// The cached value, only while Done.
    pub(crate) fn cached(&self) -> Option<&Value> {
        match self.state {
            TaskState::Done => self.value.as_ref(),
            TaskState::Pending => None,
        }
    }

    /// The cached value, or `NotEvaluated` if the task has not run.
    pub(crate) fn value(&self) -> Result<&Value> {
        self.cached().ok_or_else(|| Error::NotEvaluated {
            task: self.name.clone(),
        })
    }

    pub(crate) fn complete(&mut self, value: Value) {
        self.value = Some(value);
        self.state = TaskState::Done;
    }

    /// Return to Pending and drop the cached value.
    ///
    /// A constant has nothing to recompute, so it collapses straight back to
    /// Done with its literal.
    pub(crate) fn reset(&mut self) {
        match &self.kind {
            TaskKind::Constant(v) => {
                self.value = Some(v.clone());
                self.state = TaskState::Done;
            }
            _ => {
                self.value = None;
                self.state = TaskState::Pending;
            }
        }
    }

    pub(crate) fn is_cell_value(&self) -> bool {
        matches!(self.kind, TaskKind::CellValue { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compute(index: u32) -> TaskNode {
        TaskNode::new(
            TaskId::from_parts(index, 0),
            TaskKind::Compute {
                inputs: SmallVec::new(),
                func: Arc::new(|_: &[Value]| -> Result<Value> { Ok(Value::Integer(1)) }),
            },
        )
    }

    #[test]
    fn constant_starts_done() {
        let node = TaskNode::new(TaskId::from_parts(0, 0), TaskKind::Constant(Value::Number(1.0)));
        assert_eq!(node.state(), TaskState::Done);
        assert_eq!(node.value().unwrap(), &Value::Number(1.0));
    }

    #[test]
    fn compute_starts_pending() {
        let node = compute(3);
        assert_eq!(node.state(), TaskState::Pending);
        assert_eq!(node.name(), "[3]");
        assert!(matches!(node.value(), Err(Error::NotEvaluated { .. })));
    }

    #[test]
    fn reset_clears_value() {
        let mut node = compute(0);
        node.complete(Value::Integer(7));
        assert!(node.is_done());
        assert_eq!(node.cached(), Some(&Value::Integer(7)));

        node.reset();
        assert_eq!(node.state(), TaskState::Pending);
        assert!(node.cached().is_none());
    }

    #[test]
    fn ids_differ_by_generation() {
        let first = TaskId::from_parts(4, 0);
        let reused = TaskId::from_parts(4, 1);
        assert_ne!(first, reused);
        assert_eq!(first.index(), reused.index());
        assert_eq!(reused.to_string(), "[4]");
    }

    #[test]
    fn constant_survives_reset() {
        let mut node = TaskNode::new(TaskId::from_parts(0, 0), TaskKind::Constant(Value::Bool(true)));
        node.reset();
        assert!(node.is_done());
        assert_eq!(node.cached(), Some(&Value::Bool(true)));
    }
}

//! Typed Task Handles

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use super::node::TaskId;
use super::value::Data;
use crate::graph::DependencyGraph;

/// A handle to a task that produces a `V`.
///
/// This is a `Copy` wrapper around [`TaskId`]; the task itself lives in the
/// graph. Reading its value goes through
/// [`DependencyGraph::value`](crate::graph::DependencyGraph::value).
pub struct ValueTask<V> {
    id: TaskId,
    _marker: PhantomData<fn() -> V>,
}

/// A task producing the values of several tasks as one ordered sequence.
pub type ValueArray<V> = ValueTask<Vec<V>>;

impl<V> ValueTask<V> {
    pub(crate) fn from_id(id: TaskId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }
}

impl<V> Clone for ValueTask<V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for ValueTask<V> {}

impl<V> PartialEq for ValueTask<V> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<V> Eq for ValueTask<V> {}

impl<V> Hash for ValueTask<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<V> fmt::Debug for ValueTask<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueTask").field(&self.id).finish()
    }
}

impl<V> From<ValueTask<V>> for TaskId {
    fn from(task: ValueTask<V>) -> Self {
        task.id
    }
}

/// Anything usable as a task input: an existing task, or a literal that gets
/// wrapped in a new constant.
pub trait IntoOperand<V> {
    fn into_task(self, graph: &mut DependencyGraph) -> ValueTask<V>;
}

impl<V: Data> IntoOperand<V> for ValueTask<V> {
    fn into_task(self, _graph: &mut DependencyGraph) -> ValueTask<V> {
        self
    }
}

macro_rules! literal_operand {
    ($($lit:ty => $target:ty),* $(,)?) => {
        $(
            impl IntoOperand<$target> for $lit {
                fn into_task(self, graph: &mut DependencyGraph) -> ValueTask<$target> {
                    graph.constant(<$target>::from(self))
                }
            }
        )*
    };
}

literal_operand! {
    f64 => f64,
    i32 => f64,
    i64 => i64,
    bool => bool,
    String => String,
    &str => String,
    Vec<f64> => Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn handles_compare_by_id() {
        let a: ValueTask<f64> = ValueTask::from_id(TaskId::from_parts(1, 0));
        let b: ValueTask<f64> = ValueTask::from_id(TaskId::from_parts(1, 0));
        let c: ValueTask<f64> = ValueTask::from_id(TaskId::from_parts(2, 0));
        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<_> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn literals_become_constants() {
        let mut graph = DependencyGraph::new();
        let x = IntoOperand::<f64>::into_task(3, &mut graph);
        let y = IntoOperand::<String>::into_task("hi", &mut graph);
        assert_ne!(x.id(), y.id());
        assert_eq!(graph.value(x).unwrap(), 3.0);
        assert_eq!(graph.value(y).unwrap(), "hi");
    }
}

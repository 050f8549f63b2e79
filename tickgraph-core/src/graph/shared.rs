//! Shared Graph Handle

use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};

use super::DependencyGraph;
use crate::error::Result;
use crate::task::TaskId;

/// A cloneable handle to one graph, usable from several threads.
///
/// Every operation takes the lock for its whole duration, so building,
/// `calculate` and `update` never interleave.
#[derive(Debug, Clone, Default)]
pub struct SharedGraph {
    inner: Arc<Mutex<DependencyGraph>>,
}

impl SharedGraph {
    pub fn new(graph: DependencyGraph) -> Self {
        Self {
            inner: Arc::new(Mutex::new(graph)),
        }
    }

    /// Lock the graph for a sequence of operations.
    pub fn lock(&self) -> MutexGuard<'_, DependencyGraph> {
        self.inner.lock()
    }

    /// Run `f` with exclusive access to the graph.
    pub fn with<R>(&self, f: impl FnOnce(&mut DependencyGraph) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn calculate(&self) -> Result<()> {
        self.inner.lock().calculate()
    }

    pub fn update(&self, node: impl Into<TaskId>) -> Result<Vec<TaskId>> {
        self.inner.lock().update(node)
    }
}

impl From<DependencyGraph> for SharedGraph {
    fn from(graph: DependencyGraph) -> Self {
        Self::new(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn graph_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<DependencyGraph>();
        assert_send::<SharedGraph>();
    }

    #[test]
    fn threads_build_into_one_graph() {
        let shared = SharedGraph::default();
        let total = shared.with(|graph| graph.constant(0.0));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || shared.with(|graph| graph.add(total, i as f64)))
            })
            .collect();
        let tasks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        shared.calculate().unwrap();
        let graph = shared.lock();
        let mut values: Vec<f64> = tasks.iter().map(|&t| graph.value(t).unwrap()).collect();
        values.sort_by(f64::total_cmp);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 3.0]);
    }
}

//! Calculation Scheduler
//!
//! The scheduler determines the order in which tasks run during a full
//! calculation. It ensures that producers always run before their consumers.
//!
//! # Algorithm
//!
//! Kahn's algorithm over a snapshot of the graph:
//!
//! 1. Verify the graph is acyclic. If not, fail before yielding anything.
//! 2. Copy every node's in-degree and child list.
//! 3. Seed a FIFO queue with the in-degree-0 nodes, in insertion order.
//! 4. On each step pop a node, yield it, and decrement its children's
//!    in-degree, enqueueing any child that reaches zero.
//!
//! The order is produced lazily, one node per `next()`, and the snapshot is
//! independent of the graph afterwards: edges added while iterating are not
//! seen by the iterator.

use std::collections::VecDeque;

use indexmap::IndexMap;

use super::dependency::Adjacency;
use crate::error::{Error, Result};
use crate::task::TaskId;

/// One-shot topological order over a graph snapshot.
#[derive(Debug, Clone)]
pub struct CalculationTasks {
    in_degree: IndexMap<TaskId, usize>,
    children: IndexMap<TaskId, Vec<TaskId>>,
    ready: VecDeque<TaskId>,
    remaining: usize,
}

impl CalculationTasks {
    pub(crate) fn new(edges: &IndexMap<TaskId, Adjacency>) -> Result<Self> {
        if !is_acyclic(edges) {
            return Err(Error::CyclicDependency);
        }

        let mut in_degree = IndexMap::with_capacity(edges.len());
        let mut children = IndexMap::with_capacity(edges.len());
        let mut ready = VecDeque::new();

        for (&id, adj) in edges {
            let degree = adj.parents.len();
            if degree == 0 {
                ready.push_back(id);
            }
            in_degree.insert(id, degree);
            children.insert(id, adj.children.iter().copied().collect());
        }

        Ok(Self {
            in_degree,
            children,
            ready,
            remaining: edges.len(),
        })
    }
}

impl Iterator for CalculationTasks {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        let id = self.ready.pop_front()?;
        if let Some(children) = self.children.swap_remove(&id) {
            for child in children {
                if let Some(degree) = self.in_degree.get_mut(&child) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        self.ready.push_back(child);
                    }
                }
            }
        }
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

// Acyclicity is checked up front, so every node is eventually yielded.
impl ExactSizeIterator for CalculationTasks {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Finished,
}

/// Iterative three-colour DFS. A child found on the active path is a back
/// edge, i.e. a cycle.
pub(crate) fn is_acyclic(edges: &IndexMap<TaskId, Adjacency>) -> bool {
    let mut visit = vec![Visit::New; edges.len()];
    // (node position, index of the next child to look at)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..edges.len() {
        if visit[root] != Visit::New {
            continue;
        }
        visit[root] = Visit::Active;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (node, next) = *frame;
            let child = edges
                .get_index(node)
                .and_then(|(_, adj)| adj.children.get_index(next));

            match child {
                Some(child) => {
                    frame.1 += 1;
                    let Some(pos) = edges.get_index_of(child) else {
                        continue;
                    };
                    match visit[pos] {
                        Visit::Active => return false,
                        Visit::New => {
                            visit[pos] = Visit::Active;
                            stack.push((pos, 0));
                        }
                        Visit::Finished => {}
                    }
                }
                None => {
                    visit[node] = Visit::Finished;
                    stack.pop();
                }
            }
        }
    }
    true
}

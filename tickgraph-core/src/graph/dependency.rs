//! The dependency graph: task arena, edges and evaluation.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use tracing::{debug, info_span, trace, warn};

use super::config::GraphConfig;
use super::scheduler::CalculationTasks;
use crate::error::{Error, Result};
use crate::task::{
    Data, IntoOperand, TaskId, TaskKind, TaskNode, TaskState, Value, ValueArray, ValueTask,
};

/// Direct neighbours of a registered node.
#[derive(Debug, Clone, Default)]
pub(crate) struct Adjacency {
    /// Producers this node consumes.
    pub(crate) parents: IndexSet<TaskId>,

    /// Consumers of this node.
    pub(crate) children: IndexSet<TaskId>,
}

impl Adjacency {
    fn is_isolated(&self) -> bool {
        self.parents.is_empty() && self.children.is_empty()
    }
}

/// An arena slot. `generation` counts how often the slot has been released.
struct Slot {
    generation: u32,
    node: Option<TaskNode>,
}

/// Arena of tasks plus the producer→consumer edges between them.
///
/// # Invariants
///
/// 1. **Checked handles:** a [`TaskId`] stays valid until its task is
///    released. A task is released when it loses its last edge and is not a
///    cell value, or on [`clear`](Self::clear). Released slots are reused
///    under a new generation, so a stale handle fails with
///    [`Error::UnknownTask`].
/// 2. **Lazy membership:** a task becomes a graph node when the first edge
///    touching it is added, and stops being one when the last such edge is
///    removed.
/// 3. **Bidirectional adjacency:** `p ∈ parents[c]` iff `c ∈ children[p]`.
/// 4. **Insertion order:** nodes and child lists keep insertion order, which
///    makes the calculation order deterministic for identical build sequences.
pub struct DependencyGraph {
    tasks: Vec<Slot>,
    /// Released slots, reused before the arena grows.
    free: Vec<u32>,
    edges: IndexMap<TaskId, Adjacency>,
    edge_count: usize,
    /// Creation counters for combinator labels, keyed by function name.
    labels: HashMap<&'static str, usize>,
    config: GraphConfig,
}

impl DependencyGraph {
    /// Create an empty graph with the default configuration.
    pub fn new() -> Self {
        Self::with_config(GraphConfig::default())
    }

    pub fn with_config(config: GraphConfig) -> Self {
        Self {
            tasks: Vec::new(),
            free: Vec::new(),
            edges: IndexMap::new(),
            edge_count: 0,
            labels: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Task construction
    // ------------------------------------------------------------------

    /// Store a new task, reusing a released slot when there is one.
    ///
    /// # Panics
    ///
    /// Panics if the arena would need more than `u32::MAX` live slots.
    pub(crate) fn push_task(&mut self, kind: TaskKind) -> TaskId {
        let id = match self.free.pop() {
            Some(index) => TaskId::from_parts(index, self.tasks[index as usize].generation),
            None => {
                let Ok(index) = u32::try_from(self.tasks.len()) else {
                    panic!("task arena is full ({} slots)", self.tasks.len());
                };
                self.tasks.push(Slot {
                    generation: 0,
                    node: None,
                });
                TaskId::from_parts(index, 0)
            }
        };
        self.tasks[id.index()].node = Some(TaskNode::new(id, kind));
        id
    }

    /// Drop a task and hand its slot back for reuse.
    fn release(&mut self, id: TaskId) {
        let Some(slot) = self.tasks.get_mut(id.index()) else {
            return;
        };
        if slot.generation != id.generation() || slot.node.take().is_none() {
            return;
        }
        slot.generation = slot.generation.wrapping_add(1);
        // Slot indices are issued from u32, so this cannot truncate
        self.free.push(id.index() as u32);
    }

    /// Append `(name-k)` to a task's label, `k` counting uses of `name`.
    pub(crate) fn label_task(&mut self, id: TaskId, name: &'static str) {
        let counter = self.labels.entry(name).or_insert(0);
        let k = *counter;
        *counter += 1;
        if let Ok(node) = self.node_mut(id) {
            let label = format!("{}\n({}-{})", node.name(), name, k);
            node.set_name(label);
        }
    }

    /// A task holding a literal. It is Done immediately.
    pub fn constant<V: Data>(&mut self, value: V) -> ValueTask<V> {
        ValueTask::from_id(self.push_task(TaskKind::Constant(value.into_value())))
    }

    /// A task with no inputs that produces `f()` when run.
    pub fn value_task<V, F>(&mut self, f: F) -> ValueTask<V>
    where
        V: Data,
        F: Fn() -> V + Send + Sync + 'static,
    {
        ValueTask::from_id(self.push_task(TaskKind::Compute {
            inputs: SmallVec::new(),
            func: Arc::new(move |_: &[Value]| -> Result<Value> { Ok(f().into_value()) }),
        }))
    }

    /// Replace the function of a task created with [`value_task`](Self::value_task).
    ///
    /// The cached value is left alone; call [`update`](Self::update) to
    /// propagate the change.
    pub fn set_source<V, F>(&mut self, task: ValueTask<V>, f: F) -> Result<()>
    where
        V: Data,
        F: Fn() -> V + Send + Sync + 'static,
    {
        let id = task.id();
        match &mut self.node_mut(id)?.kind {
            TaskKind::Compute { inputs, func } if inputs.is_empty() => {
                *func = Arc::new(move |_: &[Value]| -> Result<Value> { Ok(f().into_value()) });
                Ok(())
            }
            _ => Err(Error::NotASource(id)),
        }
    }

    /// A task producing the values of `elements`, in order.
    pub fn array<V: Data>(&mut self, elements: &[ValueTask<V>]) -> ValueArray<V> {
        let ids: Vec<TaskId> = elements.iter().map(ValueTask::id).collect();
        let id = self.push_task(TaskKind::Array {
            elements: ids.clone(),
        });
        for element in ids {
            self.add_dependency(element, id);
        }
        ValueTask::from_id(id)
    }

    /// A cell value node for the cell at (`row`, `column`), with no formula yet.
    pub fn cell_value<V: Data>(&mut self, row: &str, column: &str) -> ValueTask<V> {
        let id = self.push_task(TaskKind::CellValue {
            row: row.to_string(),
            column: column.to_string(),
            formula: None,
        });
        if let Ok(node) = self.node_mut(id) {
            node.set_name(format!("({}, {})", row, column));
        }
        ValueTask::from_id(id)
    }

    /// Point a cell value at a new formula.
    ///
    /// The edge from the previous formula (if any) is swapped for one from the
    /// new formula. Edges leaving the cell value are not touched, so every
    /// consumer of the cell keeps working unchanged.
    pub fn set_formula<V: Data>(
        &mut self,
        cell: ValueTask<V>,
        formula: impl IntoOperand<V>,
    ) -> Result<ValueTask<V>> {
        let cell_id = cell.id();
        if !self.node(cell_id)?.is_cell_value() {
            return Err(Error::NotACell(cell_id));
        }
        let formula = formula.into_task(self);

        let previous = match &mut self.node_mut(cell_id)?.kind {
            TaskKind::CellValue { formula: slot, .. } => slot.replace(formula.id()),
            _ => None,
        };
        if let Some(old) = previous {
            self.remove_dependency(old, cell_id);
        }
        self.add_dependency(formula, cell_id);
        Ok(formula)
    }

    /// The formula currently assigned to a cell value.
    pub fn formula<V: Data>(&self, cell: ValueTask<V>) -> Result<ValueTask<V>> {
        match &self.node(cell.id())?.kind {
            TaskKind::CellValue {
                formula: Some(formula),
                ..
            } => Ok(ValueTask::from_id(*formula)),
            TaskKind::CellValue { row, column, .. } => Err(Error::AccessEmptyCell {
                row: row.clone(),
                column: column.clone(),
            }),
            _ => Err(Error::NotACell(cell.id())),
        }
    }

    // ------------------------------------------------------------------
    // Task access
    // ------------------------------------------------------------------

    fn node(&self, id: TaskId) -> Result<&TaskNode> {
        self.tasks
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_ref())
            .ok_or(Error::UnknownTask(id))
    }

    fn node_mut(&mut self, id: TaskId) -> Result<&mut TaskNode> {
        self.tasks
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.node.as_mut())
            .ok_or(Error::UnknownTask(id))
    }

    /// Number of live tasks in this graph, wired or not.
    pub fn task_count(&self) -> usize {
        self.tasks.len() - self.free.len()
    }

    pub fn state(&self, id: impl Into<TaskId>) -> Result<TaskState> {
        Ok(self.node(id.into())?.state())
    }

    /// Display name used in labels and exports.
    pub fn name(&self, id: impl Into<TaskId>) -> Result<&str> {
        Ok(self.node(id.into())?.name())
    }

    pub fn set_name(&mut self, id: impl Into<TaskId>, name: impl Into<String>) -> Result<()> {
        self.node_mut(id.into())?.set_name(name.into());
        Ok(())
    }

    pub(crate) fn kind_label(&self, id: TaskId) -> &'static str {
        self.node(id).map_or("unknown", |node| node.kind.label())
    }

    pub fn is_cell_value(&self, id: impl Into<TaskId>) -> bool {
        self.node(id.into()).is_ok_and(TaskNode::is_cell_value)
    }

    /// The typed value of a Done task.
    pub fn value<V: Data>(&self, task: ValueTask<V>) -> Result<V> {
        V::from_value(self.node(task.id())?.value()?)
    }

    /// The typed value if the task is Done, `None` otherwise.
    pub fn get<V: Data>(&self, task: ValueTask<V>) -> Option<V> {
        self.raw_value(task).and_then(|v| V::from_value(v).ok())
    }

    /// The untyped cached value if the task is Done.
    pub fn raw_value(&self, id: impl Into<TaskId>) -> Option<&Value> {
        self.node(id.into()).ok().and_then(TaskNode::cached)
    }

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Record that `consumer` reads `producer`. Both become graph nodes.
    pub fn add_dependency(&mut self, producer: impl Into<TaskId>, consumer: impl Into<TaskId>) {
        let (producer, consumer) = (producer.into(), consumer.into());
        let inserted = self.edges.entry(producer).or_default().children.insert(consumer);
        self.edges.entry(consumer).or_default().parents.insert(producer);
        if inserted {
            self.edge_count += 1;
        }
    }

    /// Remove the edge `producer → consumer`, dropping either endpoint from
    /// the node set if it has no edges left.
    ///
    /// An endpoint dropped this way is also released, unless it is a cell
    /// value. Handles to a released task fail with [`Error::UnknownTask`].
    ///
    /// Returns whether the edge existed.
    pub fn remove_dependency(
        &mut self,
        producer: impl Into<TaskId>,
        consumer: impl Into<TaskId>,
    ) -> bool {
        let (producer, consumer) = (producer.into(), consumer.into());
        let removed = self
            .edges
            .get_mut(&producer)
            .is_some_and(|adj| adj.children.shift_remove(&consumer));
        if !removed {
            return false;
        }
        if let Some(adj) = self.edges.get_mut(&consumer) {
            adj.parents.shift_remove(&producer);
        }
        self.edge_count -= 1;

        self.prune(producer);
        self.prune(consumer);
        true
    }

    fn prune(&mut self, id: TaskId) {
        if !self.edges.get(&id).is_some_and(Adjacency::is_isolated) {
            return;
        }
        self.edges.shift_remove(&id);
        // Cells are owned by their sheet and outlive their formulas
        if !self.is_cell_value(id) {
            self.release(id);
        }
    }

    /// Direct producers of `node`. Empty if the node is not registered.
    pub fn get_parents(&self, node: impl Into<TaskId>) -> impl Iterator<Item = TaskId> + '_ {
        self.edges
            .get(&node.into())
            .into_iter()
            .flat_map(|adj| adj.parents.iter().copied())
    }

    /// Direct consumers of `node`. Empty if the node is not registered.
    pub fn get_children(&self, node: impl Into<TaskId>) -> impl Iterator<Item = TaskId> + '_ {
        self.edges
            .get(&node.into())
            .into_iter()
            .flat_map(|adj| adj.children.iter().copied())
    }

    /// Whether `node` currently has at least one edge.
    pub fn contains(&self, node: impl Into<TaskId>) -> bool {
        self.edges.contains_key(&node.into())
    }

    /// Registered nodes, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.edges.keys().copied()
    }

    /// All edges as `(producer, consumer)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (TaskId, TaskId)> + '_ {
        self.edges
            .iter()
            .flat_map(|(&p, adj)| adj.children.iter().map(move |&c| (p, c)))
    }

    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Drop every task and edge. Handles issued before this call are invalid
    /// afterwards.
    pub fn clear(&mut self) {
        for (index, slot) in self.tasks.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.edges.clear();
        self.edge_count = 0;
        self.labels.clear();
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    /// Execute a task unless it is already Done.
    ///
    /// On failure the task stays Pending, so it can be run again once the
    /// cause is fixed.
    pub fn run(&mut self, id: impl Into<TaskId>) -> Result<()> {
        let id = id.into();
        if self.node(id)?.is_done() {
            return Ok(());
        }
        let value = self.execute(id)?;
        let node = self.node_mut(id)?;
        trace!(task = %node.name(), "task executed");
        node.complete(value);
        Ok(())
    }

    /// Return a task to Pending. Constants stay Done.
    pub fn reset(&mut self, id: impl Into<TaskId>) -> Result<()> {
        self.node_mut(id.into())?.reset();
        Ok(())
    }

    fn read(&self, id: TaskId) -> Result<&Value> {
        self.node(id)?.value()
    }

    fn execute(&self, id: TaskId) -> Result<Value> {
        match &self.node(id)?.kind {
            TaskKind::Constant(value) => Ok(value.clone()),
            TaskKind::Compute { inputs, func } => {
                let args = inputs
                    .iter()
                    .map(|&input| self.read(input).cloned())
                    .collect::<Result<Vec<_>>>()?;
                func(&args)
            }
            TaskKind::Array { elements } => elements
                .iter()
                .map(|&element| self.read(element).cloned())
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            TaskKind::CellValue {
                row,
                column,
                formula,
            } => {
                let formula = formula.ok_or_else(|| Error::AccessEmptyCell {
                    row: row.clone(),
                    column: column.clone(),
                })?;
                self.read(formula).cloned()
            }
        }
    }

    /// A topological order over a snapshot of the current edges.
    ///
    /// Fails with [`Error::CyclicDependency`] before yielding anything if the
    /// graph has a cycle.
    pub fn get_calculation_tasks(&self) -> Result<CalculationTasks> {
        CalculationTasks::new(&self.edges).inspect_err(|_| {
            warn!(nodes = self.edges.len(), "refusing to order a cyclic graph");
        })
    }

    /// Run every registered task in topological order.
    ///
    /// Tasks that are already Done are skipped, so repeated calls only pay for
    /// tasks invalidated since the last one.
    pub fn calculate(&mut self) -> Result<()> {
        let order = self.get_calculation_tasks()?;
        let total = order.len();
        let _span = info_span!("calculate", tasks = total).entered();
        let interval = self.config.progress_interval.max(1);

        for (i, id) in order.enumerate() {
            self.run(id)?;
            if (i + 1) % interval == 0 {
                debug!(done = i + 1, total, "calculation progress");
            }
        }
        debug!(total, "calculation finished");
        Ok(())
    }

    /// Invalidate `node` and everything downstream of it, then recalculate.
    ///
    /// Returns the invalidated tasks in discovery order.
    pub fn update(&mut self, node: impl Into<TaskId>) -> Result<Vec<TaskId>> {
        let start = node.into();
        self.node(start)?;

        let mut visited = HashSet::from([start]);
        let mut stack = vec![start];
        let mut invalidated = Vec::new();

        while let Some(current) = stack.pop() {
            self.node_mut(current)?.reset();
            invalidated.push(current);
            if let Some(adj) = self.edges.get(&current) {
                for &child in &adj.children {
                    if visited.insert(child) {
                        stack.push(child);
                    }
                }
            }
        }
        let name = self.node(start)?.name();
        debug!(
            task = %name,
            invalidated = invalidated.len(),
            "invalidated downstream tasks"
        );

        self.calculate()?;
        Ok(invalidated)
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("tasks", &self.task_count())
            .field("nodes", &self.edges.len())
            .field("edges", &self.edge_count)
            .field("config", &self.config)
            .finish()
    }
}

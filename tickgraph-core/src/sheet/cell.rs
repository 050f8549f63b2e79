//! Sheet Cells

use std::fmt;

use crate::error::Result;
use crate::graph::DependencyGraph;
use crate::task::{IntoOperand, ValueTask};
use crate::ticks::Tick;

/// One (row, tick) slot of a sheet.
///
/// A cell owns nothing in the graph but a handle to its cell value node. The
/// handle never changes, so tasks built from [`Cell::value`] keep observing
/// the cell through every formula reassignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell<T> {
    row: String,
    column: T,
    value: ValueTask<f64>,
}

impl<T: Tick> Cell<T> {
    pub(crate) fn new(graph: &mut DependencyGraph, row: &str, column: T) -> Self {
        let value = graph.cell_value(row, &column.to_string());
        Self {
            row: row.to_string(),
            column,
            value,
        }
    }

    pub fn row(&self) -> &str {
        &self.row
    }

    pub fn column(&self) -> T {
        self.column
    }

    /// The stable node to read this cell through.
    pub fn value(&self) -> ValueTask<f64> {
        self.value
    }

    /// The current formula. Fails with `AccessEmptyCell` if none was assigned.
    pub fn formula(&self, graph: &DependencyGraph) -> Result<ValueTask<f64>> {
        graph.formula(self.value)
    }

    pub fn set_formula(
        &self,
        graph: &mut DependencyGraph,
        formula: impl IntoOperand<f64>,
    ) -> Result<ValueTask<f64>> {
        graph.set_formula(self.value, formula)
    }

    /// The evaluated value, or `None` if the cell has not been calculated.
    pub fn result(&self, graph: &DependencyGraph) -> Option<f64> {
        graph.get(self.value)
    }
}

impl<T: Tick> fmt::Display for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

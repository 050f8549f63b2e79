//! Sheets
//!
//! A sheet is a grid of [`Cell`]s addressed by row name and [`Tick`]. Every
//! cell starts empty; writing to it assigns a formula, either a literal or a
//! task built from other cells. All evaluation is delegated to the sheet's
//! [`DependencyGraph`], so cells can be written in any order.
//!
//! # Example
//!
//! ```rust
//! use tickgraph_core::sheet::Sheet;
//! use tickgraph_core::ticks::Month;
//!
//! let start = Month::new(2022, 1).unwrap();
//! let mut sheet = Sheet::new(start, start + 2, ["sales", "total"]).unwrap();
//!
//! for i in 0..3 {
//!     sheet.set("sales", start + i, 10.0 * (i + 1) as f64).unwrap();
//! }
//! let window = sheet.get_range("sales", &sheet.columns()).unwrap();
//! let total = sheet.graph_mut().sum(window);
//! sheet.set("total", start + 2, total).unwrap();
//!
//! sheet.calculate().unwrap();
//! assert_eq!(sheet.result("total", start + 2).unwrap(), Some(60.0));
//! ```

mod cell;

pub use cell::Cell;

use std::collections::{HashMap, HashSet};
use std::io;

use indexmap::IndexSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::task::{IntoOperand, TaskId, ValueArray, ValueTask};
use crate::ticks::{self, Tick};

#[derive(Debug, Clone, Copy)]
enum Direction {
    Parents,
    Children,
}

/// A (row × tick) grid of cells over one dependency graph.
#[derive(Debug)]
pub struct Sheet<T: Tick> {
    graph: DependencyGraph,
    start: T,
    end: T,
    rows: IndexSet<String>,
    cells: Vec<Vec<Cell<T>>>,
    /// Cell value node → (row, column) position.
    positions: HashMap<TaskId, (usize, usize)>,
}

impl<T: Tick> Sheet<T> {
    /// Create a sheet spanning `start..=end` with the given rows, over a
    /// fresh graph.
    pub fn new<I, S>(start: T, end: T, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_graph(DependencyGraph::new(), start, end, rows)
    }

    /// Create a sheet whose cells live in `graph`.
    pub fn with_graph<I, S>(mut graph: DependencyGraph, start: T, end: T, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if end < start {
            return Err(Error::InvalidData(format!(
                "sheet ends ({end}) before it starts ({start})"
            )));
        }

        let mut names = IndexSet::new();
        for row in rows {
            let row = row.into();
            if names.contains(&row) {
                return Err(Error::InvalidData(format!("duplicate row '{row}'")));
            }
            names.insert(row);
        }

        let columns = ticks::span(start, end);
        let mut positions = HashMap::new();
        let cells: Vec<Vec<Cell<T>>> = names
            .iter()
            .enumerate()
            .map(|(r, row)| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(c, &column)| {
                        let cell = Cell::new(&mut graph, row, column);
                        positions.insert(cell.value().id(), (r, c));
                        cell
                    })
                    .collect()
            })
            .collect();

        debug!(
            rows = names.len(),
            columns = columns.len(),
            %start,
            %end,
            "sheet created"
        );

        Ok(Self {
            graph,
            start,
            end,
            rows: names,
            cells,
            positions,
        })
    }

    fn position(&self, row: &str, column: T) -> Result<(usize, usize)> {
        let r = self
            .rows
            .get_index_of(row)
            .ok_or_else(|| Error::UnknownRow(row.to_string()))?;
        if column < self.start || column > self.end {
            return Err(Error::UnknownColumn(column.to_string()));
        }
        Ok((r, column.since(self.start) as usize))
    }

    /// The cell at (`row`, `column`).
    pub fn cell(&self, row: &str, column: T) -> Result<&Cell<T>> {
        let (r, c) = self.position(row, column)?;
        Ok(&self.cells[r][c])
    }

    /// Every cell of one row, in column order.
    pub fn row(&self, name: &str) -> Result<&[Cell<T>]> {
        let r = self
            .rows
            .get_index_of(name)
            .ok_or_else(|| Error::UnknownRow(name.to_string()))?;
        Ok(&self.cells[r])
    }

    /// The value handle of a cell, for use as a formula operand.
    pub fn get(&self, row: &str, column: T) -> Result<ValueTask<f64>> {
        Ok(self.cell(row, column)?.value())
    }

    /// An array task over the cells of `row` at `columns`, in the given order.
    pub fn get_range(&mut self, row: &str, columns: &[T]) -> Result<ValueArray<f64>> {
        let values = columns
            .iter()
            .map(|&column| self.get(row, column))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.graph.array(&values))
    }

    /// Assign a formula to a cell. Literals are wrapped in a constant.
    pub fn set(&mut self, row: &str, column: T, formula: impl IntoOperand<f64>) -> Result<()> {
        let (r, c) = self.position(row, column)?;
        self.cells[r][c].set_formula(&mut self.graph, formula)?;
        Ok(())
    }

    /// The formula currently assigned to a cell.
    pub fn formula(&self, row: &str, column: T) -> Result<ValueTask<f64>> {
        self.cell(row, column)?.formula(&self.graph)
    }

    /// The evaluated value of a cell, `None` if it has not been calculated.
    pub fn result(&self, row: &str, column: T) -> Result<Option<f64>> {
        Ok(self.cell(row, column)?.result(&self.graph))
    }

    pub fn start(&self) -> T {
        self.start
    }

    pub fn end(&self) -> T {
        self.end
    }

    pub fn columns(&self) -> Vec<T> {
        ticks::span(self.start, self.end)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns().iter().map(ToString::to_string).collect()
    }

    pub fn row_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(String::as_str)
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    /// Mutable access to the graph, for building formulas from cell values.
    pub fn graph_mut(&mut self) -> &mut DependencyGraph {
        &mut self.graph
    }

    pub fn calculate(&mut self) -> Result<()> {
        self.graph.calculate()
    }

    /// Evaluated values by row then column. `None` for cells not yet
    /// calculated.
    pub fn values(&self) -> Vec<Vec<Option<f64>>> {
        self.cells
            .iter()
            .map(|row| row.iter().map(|cell| cell.result(&self.graph)).collect())
            .collect()
    }

    /// Replace a cell's formula with `value` and recalculate everything
    /// downstream of it.
    ///
    /// Returns the cells whose values were invalidated, the updated cell
    /// included.
    pub fn update(&mut self, row: &str, column: T, value: f64) -> Result<Vec<Cell<T>>> {
        let (r, c) = self.position(row, column)?;
        let formula = self.cells[r][c].set_formula(&mut self.graph, value)?;
        let invalidated = self.graph.update(formula)?;

        let affected: Vec<Cell<T>> = invalidated
            .iter()
            .filter_map(|id| self.positions.get(id))
            .map(|&(r, c)| self.cells[r][c].clone())
            .collect();
        debug!(row, %column, affected = affected.len(), "cell updated");
        Ok(affected)
    }

    /// Cells the given cell depends on, directly or through intermediate
    /// tasks. The search does not continue past a cell.
    pub fn parent_cells(&self, row: &str, column: T) -> Result<Vec<&Cell<T>>> {
        let start = self.get(row, column)?.id();
        Ok(self.reachable_cells(start, Direction::Parents))
    }

    /// Cells that depend on the given cell, directly or through intermediate
    /// tasks. The search does not continue past a cell.
    pub fn child_cells(&self, row: &str, column: T) -> Result<Vec<&Cell<T>>> {
        let start = self.get(row, column)?.id();
        Ok(self.reachable_cells(start, Direction::Children))
    }

    fn reachable_cells(&self, start: TaskId, direction: Direction) -> Vec<&Cell<T>> {
        let mut found = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![start];

        while let Some(current) = stack.pop() {
            let next: Vec<TaskId> = match direction {
                Direction::Parents => self.graph.get_parents(current).collect(),
                Direction::Children => self.graph.get_children(current).collect(),
            };
            for id in next {
                if !visited.insert(id) {
                    continue;
                }
                match self.positions.get(&id) {
                    Some(&(r, c)) => found.push(&self.cells[r][c]),
                    None => stack.push(id),
                }
            }
        }
        found
    }

    /// Render as tab-separated text: a header of column ticks, then one line
    /// per row with the evaluated values. Uncalculated cells are blank.
    pub fn to_tsv(&self) -> String {
        self.tsv_lines().map(|line| line + "\n").collect()
    }

    /// Stream the [`to_tsv`](Self::to_tsv) text to `writer`, line by line.
    pub fn write_tsv<W: io::Write>(&self, mut writer: W) -> Result<()> {
        for line in self.tsv_lines() {
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        Ok(())
    }

    fn tsv_lines(&self) -> impl Iterator<Item = String> + '_ {
        let header: String = self
            .columns()
            .iter()
            .map(|column| format!("\t{column}"))
            .collect();
        let body = self.rows.iter().zip(&self.cells).map(|(name, row)| {
            let mut line = name.clone();
            for cell in row {
                line.push('\t');
                if let Some(value) = cell.result(&self.graph) {
                    line.push_str(&value.to_string());
                }
            }
            line
        });
        std::iter::once(header).chain(body)
    }
}

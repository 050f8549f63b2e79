//! Combinators
//!
//! A [`Combinator`] lifts a plain Rust function over values into a builder
//! over tasks. Applying it:
//!
//! 1. turns every literal argument into a constant task,
//! 2. creates a compute task that, when run, reads the inputs' values and
//!    calls the function,
//! 3. registers one edge from each input to the new task.
//!
//! Nothing is evaluated at build time. The graph decides when the new task
//! runs.
//!
//! # Example
//!
//! ```rust
//! use tickgraph_core::graph::DependencyGraph;
//! use tickgraph_core::task::Combinator;
//!
//! let mut graph = DependencyGraph::new();
//! let plus = Combinator::new("plus", |x: f64, y: f64| x + y);
//!
//! let a = graph.constant(1.0);
//! let c = plus.apply(&mut graph, (a, 1.0));
//!
//! graph.calculate().unwrap();
//! assert_eq!(graph.value(c).unwrap(), 2.0);
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use smallvec::SmallVec;

use super::handle::{IntoOperand, ValueArray, ValueTask};
use super::node::{ComputeFn, TaskId, TaskKind};
use super::value::{Data, Value};
use crate::error::Result;
use crate::graph::DependencyGraph;

/// A function of `Args` that can back a compute task.
///
/// Implemented for every `Fn(A1, .., An) -> R` with `n <= 6` whose argument
/// and return types are [`Data`].
pub trait TaskFn<Args>: Send + Sync + 'static {
    type Output: Data;

    fn invoke(&self, args: &[Value]) -> Result<Value>;
}

/// A tuple of operands matching the argument list `Args`.
pub trait Operands<Args> {
    fn into_inputs(self, graph: &mut DependencyGraph) -> SmallVec<[TaskId; 4]>;
}

macro_rules! impl_arity {
    ($($arg:ident $operand:ident $var:ident $idx:tt),*) => {
        impl<Func, Out, $($arg,)*> TaskFn<($($arg,)*)> for Func
        where
            Func: Fn($($arg),*) -> Out + Send + Sync + 'static,
            Out: Data,
            $($arg: Data,)*
        {
            type Output = Out;

            #[allow(unused_variables)]
            fn invoke(&self, args: &[Value]) -> Result<Value> {
                Ok((self)($(<$arg as Data>::from_value(&args[$idx])?),*).into_value())
            }
        }

        impl<$($arg, $operand,)*> Operands<($($arg,)*)> for ($($operand,)*)
        where
            $($arg: Data, $operand: IntoOperand<$arg>,)*
        {
            #[allow(unused_variables, unused_mut)]
            fn into_inputs(self, graph: &mut DependencyGraph) -> SmallVec<[TaskId; 4]> {
                let ($($var,)*) = self;
                let mut inputs = SmallVec::new();
                $(inputs.push($var.into_task(graph).id());)*
                inputs
            }
        }
    };
}

impl_arity!();
impl_arity!(A1 O1 a1 0);
impl_arity!(A1 O1 a1 0, A2 O2 a2 1);
impl_arity!(A1 O1 a1 0, A2 O2 a2 1, A3 O3 a3 2);
impl_arity!(A1 O1 a1 0, A2 O2 a2 1, A3 O3 a3 2, A4 O4 a4 3);
impl_arity!(A1 O1 a1 0, A2 O2 a2 1, A3 O3 a3 2, A4 O4 a4 3, A5 O5 a5 4);
impl_arity!(A1 O1 a1 0, A2 O2 a2 1, A3 O3 a3 2, A4 O4 a4 3, A5 O5 a5 4, A6 O6 a6 5);

/// A named task builder wrapping a pure function.
pub struct Combinator<F, Args> {
    name: &'static str,
    func: Arc<F>,
    _args: PhantomData<fn(Args)>,
}

impl<F, Args> Combinator<F, Args>
where
    F: TaskFn<Args>,
    Args: 'static,
{
    /// Wrap `func`. `name` shows up in task labels and graph exports.
    pub fn new(name: &'static str, func: F) -> Self {
        Self {
            name,
            func: Arc::new(func),
            _args: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Build a new task computing this function over `operands`.
    pub fn apply<O>(
        &self,
        graph: &mut DependencyGraph,
        operands: O,
    ) -> ValueTask<<F as TaskFn<Args>>::Output>
    where
        O: Operands<Args>,
    {
        let inputs = operands.into_inputs(graph);
        let id = graph.push_task(TaskKind::Compute {
            inputs: inputs.clone(),
            func: erase::<F, Args>(Arc::clone(&self.func)),
        });
        for input in inputs {
            graph.add_dependency(input, id);
        }
        graph.label_task(id, self.name);

        ValueTask::from_id(id)
    }
}

// Kept out of `apply` so the closure type does not capture the operand type.
fn erase<F, Args>(func: Arc<F>) -> ComputeFn
where
    F: TaskFn<Args>,
    Args: 'static,
{
    Arc::new(move |args: &[Value]| <F as TaskFn<Args>>::invoke(&func, args))
}

impl<F, Args> Clone for Combinator<F, Args> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            func: Arc::clone(&self.func),
            _args: PhantomData,
        }
    }
}

// Builders for the common arithmetic. Each call is a separate node.
impl DependencyGraph {
    pub fn add(
        &mut self,
        lhs: impl IntoOperand<f64>,
        rhs: impl IntoOperand<f64>,
    ) -> ValueTask<f64> {
        Combinator::new("add", |x: f64, y: f64| x + y).apply(self, (lhs, rhs))
    }

    pub fn sub(
        &mut self,
        lhs: impl IntoOperand<f64>,
        rhs: impl IntoOperand<f64>,
    ) -> ValueTask<f64> {
        Combinator::new("sub", |x: f64, y: f64| x - y).apply(self, (lhs, rhs))
    }

    pub fn mul(
        &mut self,
        lhs: impl IntoOperand<f64>,
        rhs: impl IntoOperand<f64>,
    ) -> ValueTask<f64> {
        Combinator::new("mul", |x: f64, y: f64| x * y).apply(self, (lhs, rhs))
    }

    /// Division follows IEEE semantics: dividing by zero yields an infinity or NaN.
    pub fn div(
        &mut self,
        lhs: impl IntoOperand<f64>,
        rhs: impl IntoOperand<f64>,
    ) -> ValueTask<f64> {
        Combinator::new("div", |x: f64, y: f64| x / y).apply(self, (lhs, rhs))
    }

    /// Sum of an array's elements.
    pub fn sum(&mut self, values: ValueArray<f64>) -> ValueTask<f64> {
        Combinator::new("sum", |xs: Vec<f64>| xs.iter().sum::<f64>()).apply(self, (values,))
    }
}

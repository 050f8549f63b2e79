//! Integration Tests for the Dependency Graph
//!
//! These tests verify that tasks, combinators, cells and the graph work
//! together correctly through the public API.

use std::collections::HashSet;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::Arc;

use tickgraph_core::graph::{DependencyGraph, GraphConfig, SharedGraph};
use tickgraph_core::task::{Combinator, TaskId, TaskState};
use tickgraph_core::Error;

/// Test that a combinator over two constants wires both edges and computes.
#[test]
fn combinator_over_constants() {
    let mut graph = DependencyGraph::new();
    let plus = Combinator::new("plus", |x: f64, y: f64| x + y);

    let a = graph.constant(1.0);
    let b = graph.constant(1.0);
    let c = plus.apply(&mut graph, (a, b));

    // Building registers the edges but runs nothing
    assert_eq!(graph.state(c).unwrap(), TaskState::Pending);
    assert_eq!(graph.get_parents(c).count(), 2);

    graph.calculate().unwrap();
    assert_eq!(graph.value(c).unwrap(), 2.0);
}

/// Test that a three-node cycle is rejected before anything runs.
#[test]
fn cycle_is_rejected_on_first_request() {
    let runs = Arc::new(AtomicUsize::new(0));
    let mut graph = DependencyGraph::new();

    let tasks: Vec<_> = (0..3)
        .map(|_| {
            let runs = Arc::clone(&runs);
            graph.value_task(move || {
                runs.fetch_add(1, Ordering::SeqCst);
                1.0
            })
        })
        .collect();
    graph.add_dependency(tasks[0], tasks[1]);
    graph.add_dependency(tasks[1], tasks[2]);
    graph.add_dependency(tasks[2], tasks[0]);

    assert!(matches!(graph.get_calculation_tasks(), Err(Error::CyclicDependency)));
    assert!(matches!(graph.calculate(), Err(Error::CyclicDependency)));
    assert_eq!(runs.load(Ordering::SeqCst), 0);

    // Breaking the cycle makes the graph usable again
    assert!(graph.remove_dependency(tasks[2], tasks[0]));
    graph.calculate().unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

/// Test that update invalidates exactly the downstream closure and recomputes it.
#[test]
fn update_recomputes_downstream_closure() {
    let source = Arc::new(AtomicI32::new(1));
    let reader = Arc::clone(&source);

    let mut graph = DependencyGraph::new();
    let a = graph.value_task(move || f64::from(reader.load(Ordering::SeqCst)));
    let b = graph.value_task(|| 2.0);
    let c = graph.add(a, b);

    graph.calculate().unwrap();
    assert_eq!(graph.value(c).unwrap(), 3.0);

    // Change the input behind a's back, then tell the graph about it
    source.store(3, Ordering::SeqCst);
    let invalidated: HashSet<TaskId> = graph.update(a).unwrap().into_iter().collect();

    assert_eq!(invalidated, HashSet::from([a.id(), c.id()]));
    assert_eq!(graph.value(c).unwrap(), 5.0);
}

/// Test that every edge is respected by the calculation order.
#[test]
fn calculation_order_is_topological() {
    let mut graph = DependencyGraph::new();
    let inputs: Vec<_> = (0..5).map(|i| graph.constant(i as f64)).collect();

    // A small lattice of sums over overlapping pairs
    let mut layer = inputs;
    while layer.len() > 1 {
        layer = layer
            .windows(2)
            .map(|pair| graph.add(pair[0], pair[1]))
            .collect();
    }

    let order: Vec<TaskId> = graph.get_calculation_tasks().unwrap().collect();
    assert_eq!(order.len(), graph.node_count());

    let position = |id: TaskId| order.iter().position(|&t| t == id).unwrap();
    for (producer, consumer) in graph.edges() {
        assert!(position(producer) < position(consumer));
    }

    graph.calculate().unwrap();
    // Binomial weights 1 4 6 4 1 over 0..5
    assert_eq!(graph.value(layer[0]).unwrap(), 32.0);
}

/// Test that identical build sequences produce identical orders.
#[test]
fn calculation_order_is_deterministic() {
    fn build() -> Vec<TaskId> {
        let mut graph = DependencyGraph::new();
        let a = graph.constant(1.0);
        let b = graph.constant(2.0);
        let c = graph.add(a, b);
        let d = graph.mul(b, c);
        graph.sub(d, a);
        graph.get_calculation_tasks().unwrap().collect()
    }

    assert_eq!(build(), build());
}

/// Test that a failing task leaves everything downstream Pending.
#[test]
fn failure_propagates_without_caching() {
    let mut graph = DependencyGraph::new();
    let fragile = Combinator::new("fragile", |x: f64| x.sqrt());
    let cell = graph.cell_value::<f64>("input", "2022-01-01");
    let root = fragile.apply(&mut graph, (cell,));
    let doubled = graph.mul(root, 2.0);

    assert!(matches!(graph.calculate(), Err(Error::AccessEmptyCell { .. })));
    assert_eq!(graph.state(root).unwrap(), TaskState::Pending);
    assert_eq!(graph.state(doubled).unwrap(), TaskState::Pending);

    // Assigning the missing formula lets the same graph finish
    graph.set_formula(cell, 16.0).unwrap();
    graph.calculate().unwrap();
    assert_eq!(graph.value(doubled).unwrap(), 8.0);
}

/// Test that a configured graph behaves like a default one.
#[test]
fn configured_graph_calculates() {
    let config = GraphConfig::from_json(r#"{"progress_interval": 1}"#).unwrap();
    let mut graph = DependencyGraph::with_config(config);

    let a = graph.constant(2.0);
    let b = graph.mul(a, a);
    graph.calculate().unwrap();

    assert_eq!(graph.config().progress_interval, 1);
    assert_eq!(graph.value(b).unwrap(), 4.0);
}

/// Test that a graph shared between threads serializes building and evaluation.
#[test]
fn shared_graph_across_threads() {
    let shared = SharedGraph::new(DependencyGraph::new());
    let base = shared.with(|graph| graph.constant(10.0));

    let workers: Vec<_> = (1..=4)
        .map(|i| {
            let shared = shared.clone();
            std::thread::spawn(move || shared.with(|graph| graph.mul(base, f64::from(i))))
        })
        .collect();
    let products: Vec<_> = workers.into_iter().map(|w| w.join().unwrap()).collect();

    shared.calculate().unwrap();
    let graph = shared.lock();
    let total: f64 = products.iter().map(|&p| graph.value(p).unwrap()).sum();
    assert_eq!(total, 100.0);
}

/// Test that export reflects the registered graph.
#[test]
fn export_lists_every_edge() {
    let mut graph = DependencyGraph::new();
    let a = graph.constant(1.0);
    let b = graph.add(a, 2.0);
    graph.mul(b, 3.0);
    graph.calculate().unwrap();

    let export = graph.export();
    assert_eq!(export.nodes.len(), graph.node_count());
    assert_eq!(export.edges.len(), graph.edge_count());
    assert!(export.nodes.iter().all(|node| node.state == TaskState::Done));

    let dot = export.to_dot();
    assert_eq!(dot.matches(" -> ").count(), 4);
}

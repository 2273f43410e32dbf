use expression_trees::{Node, NodeKind, Tree};

use crate::dataset::{Dataset, Problem};
use crate::grammar::{Grammar, SymbolSet};
use crate::options::GeneticAlgorithmConfig;

/// Two inputs on a small grid, target `f(x0, x1)`, two thirds for training.
pub fn grid_problem(n_rows: usize, f: impl Fn(f64, f64) -> f64) -> Problem {
    let x0: Vec<f64> = (0..n_rows).map(|i| (i % 10) as f64 * 0.3 + 0.1).collect();
    let x1: Vec<f64> = (0..n_rows).map(|i| (i / 10) as f64 * 0.2 - 0.5).collect();
    let y: Vec<f64> = x0.iter().zip(&x1).map(|(&a, &b)| f(a, b)).collect();
    let ds = Dataset::from_columns(vec![("x0".into(), x0), ("x1".into(), x1), ("y".into(), y)]).unwrap();
    let split = n_rows * 2 / 3;
    Problem::new(ds, "y", 0..split, split..n_rows).unwrap()
}

pub fn with_grammar(mut problem: Problem, enabled: SymbolSet) -> Problem {
    *problem.grammar_mut() = Grammar::new(enabled);
    problem
}

/// Small, quiet configuration for in-process runs.
pub fn small_config(seed: u64) -> GeneticAlgorithmConfig {
    GeneticAlgorithmConfig {
        seed,
        generations: 5,
        population_size: 20,
        evaluations: 1_000_000,
        iterations: 5,
        max_selection_pressure: 20.0,
        max_length: 20,
        max_depth: 6,
        threads: 1,
        progress: false,
        ..Default::default()
    }
}

/// Kind, arity and feature of every node: the tree with its values erased.
pub fn shape(tree: &Tree) -> Vec<(NodeKind, u8, u16)> {
    tree.nodes().iter().map(|n| (n.kind, n.arity, n.feature)).collect()
}

pub fn var(feature: u16) -> Node {
    Node::variable(feature, 1.0)
}

pub fn c(value: f64) -> Node {
    Node::constant(value)
}

pub fn op(kind: NodeKind) -> Node {
    Node::function(kind)
}

//! Symbolic regression by genetic programming with offspring selection.
//!
//! Trees come from [`expression_trees`]; this crate grows, varies, fits and
//! selects them. Entry point: [`GeneticProgrammingAlgorithm`].

pub(crate) mod algorithm;
pub(crate) mod creators;
pub(crate) mod crossover;
pub(crate) mod dataset;
pub(crate) mod error;
pub(crate) mod evaluator;
pub(crate) mod grammar;
pub(crate) mod individual;
pub(crate) mod metrics;
pub(crate) mod mutation;
pub(crate) mod optim;
pub(crate) mod options;
pub(crate) mod population;
pub mod prelude;
pub(crate) mod progress_bars;
pub(crate) mod random;
pub(crate) mod recombinator;
pub(crate) mod selection;

#[cfg(feature = "cli")]
pub mod cli;

pub use algorithm::{AlgorithmState, GenerationReport, GeneticProgrammingAlgorithm};
pub use creators::{CreatorKind, TreeCreator};
pub use crossover::SubtreeCrossover;
pub use dataset::{Dataset, Problem, Variable, default_ranges};
pub use error::{Error, Result};
pub use evaluator::{Evaluator, evaluate_tree};
pub use grammar::{Grammar, SymbolSet};
pub use individual::{FitnessOrder, Individual};
pub use metrics::{
    NormalizedMeanSquaredError, RSquared, Scorer, apply_scaling, linear_scaling, mean_squared_error, normalized_mse,
    pearson, r_squared,
};
pub use mutation::{MultiMutation, Mutation, MutationChoice};
pub use options::{GeneticAlgorithmConfig, MutationWeights};
pub use population::Population;
pub use random::{stream_rng, stream_seed};
pub use recombinator::{GenerationOutcome, Offspring, OffspringSelectionRecombinator};
pub use selection::Selection;

pub use expression_trees;

#[cfg(test)]
mod tests;

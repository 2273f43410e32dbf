//! Convenience re-exports for quickstarts.

pub use crate::algorithm::{GenerationReport, GeneticProgrammingAlgorithm};
pub use crate::dataset::{Dataset, Problem, default_ranges};
pub use crate::grammar::{Grammar, SymbolSet};
pub use crate::metrics::{NormalizedMeanSquaredError, RSquared};
pub use crate::options::GeneticAlgorithmConfig;
pub use crate::selection::Selection;

pub use expression_trees::{NodeKind, StringTreeOptions, Tree, string_tree};

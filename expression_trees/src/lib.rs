pub mod evaluate;
pub mod evaluate_derivative;
pub mod node;
pub mod node_utils;
pub mod operators;
pub mod strings;
pub mod tree;

#[cfg(any(test, feature = "proptest"))]
pub mod proptest_utils;

pub use ndarray;

pub use crate::evaluate::{EvalContext, EvalOptions, eval_tree_array, eval_tree_array_into};
pub use crate::evaluate_derivative::{JacobianContext, eval_jacobian, eval_jacobian_into};
pub use crate::node::{Node, NodeKind};
pub use crate::node_utils::{
    child_indices, count_depth, count_function_nodes, count_leaf_nodes, has_variables, is_valid_postfix,
    lengths_consistent, node_levels, subtree_depths, subtree_range, subtree_sizes, tree_mapreduce,
};
pub use crate::strings::{StringTreeOptions, string_tree};
pub use crate::tree::{Tree, TreeError};

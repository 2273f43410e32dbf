use expression_trees::{Node, NodeKind, Tree};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::creators::TreeCreator;
use crate::dataset::Variable;
use crate::grammar::{Grammar, sample_weighted};
use crate::random::{choose, usize_range_excl};

/// Point resamples before a structural mutation gives up.
pub const SUBTREE_ATTEMPTS: usize = 10;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MutationChoice {
    OnePoint,
    MultiPoint,
    ChangeVariable,
    ChangeFunction,
    InsertSubtree,
    ReplaceSubtree,
    ShuffleSubtrees,
}

/// A single mutation operator.
///
/// Every variant is total: when the tree offers nothing to mutate, or no
/// candidate fits the bounds, the input comes back unchanged.
#[derive(Copy, Clone, Debug)]
pub enum Mutation<'a> {
    /// Gaussian jitter on one leaf value.
    OnePoint { sigma: f64 },
    /// Gaussian jitter on every leaf value.
    MultiPoint { sigma: f64 },
    ChangeVariable { variables: &'a [Variable] },
    ChangeFunction { grammar: &'a Grammar },
    InsertSubtree {
        creator: &'a TreeCreator<'a>,
        max_depth: usize,
        max_length: usize,
    },
    ReplaceSubtree {
        creator: &'a TreeCreator<'a>,
        max_depth: usize,
        max_length: usize,
    },
    /// Swap the operands of one commutative node.
    ShuffleSubtrees,
}

fn leaf_indices(nodes: &[Node]) -> Vec<usize> {
    nodes.iter().enumerate().filter_map(|(i, n)| n.is_leaf().then_some(i)).collect()
}

fn function_indices(nodes: &[Node]) -> Vec<usize> {
    nodes.iter().enumerate().filter_map(|(i, n)| n.is_function().then_some(i)).collect()
}

fn kind_indices(nodes: &[Node], keep: impl Fn(NodeKind) -> bool) -> Vec<usize> {
    nodes.iter().enumerate().filter_map(|(i, n)| keep(n.kind).then_some(i)).collect()
}

impl<'a> Mutation<'a> {
    pub fn choice(&self) -> MutationChoice {
        match self {
            Mutation::OnePoint { .. } => MutationChoice::OnePoint,
            Mutation::MultiPoint { .. } => MutationChoice::MultiPoint,
            Mutation::ChangeVariable { .. } => MutationChoice::ChangeVariable,
            Mutation::ChangeFunction { .. } => MutationChoice::ChangeFunction,
            Mutation::InsertSubtree { .. } => MutationChoice::InsertSubtree,
            Mutation::ReplaceSubtree { .. } => MutationChoice::ReplaceSubtree,
            Mutation::ShuffleSubtrees => MutationChoice::ShuffleSubtrees,
        }
    }

    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, tree: Tree) -> Tree {
        match *self {
            Mutation::OnePoint { sigma } => one_point(rng, tree, sigma),
            Mutation::MultiPoint { sigma } => multi_point(rng, tree, sigma),
            Mutation::ChangeVariable { variables } => change_variable(rng, tree, variables),
            Mutation::ChangeFunction { grammar } => change_function(rng, tree, grammar),
            Mutation::InsertSubtree {
                creator,
                max_depth,
                max_length,
            } => insert_subtree(rng, tree, creator, max_depth, max_length),
            Mutation::ReplaceSubtree {
                creator,
                max_depth,
                max_length,
            } => replace_subtree(rng, tree, creator, max_depth, max_length),
            Mutation::ShuffleSubtrees => shuffle_subtrees(rng, tree),
        }
    }
}

fn one_point<R: Rng + ?Sized>(rng: &mut R, mut tree: Tree, sigma: f64) -> Tree {
    let leaves = leaf_indices(tree.nodes());
    if let Some(&i) = choose(rng, &leaves) {
        let jitter: f64 = rng.sample(StandardNormal);
        tree.nodes_mut()[i].value += sigma * jitter;
    }
    tree
}

fn multi_point<R: Rng + ?Sized>(rng: &mut R, mut tree: Tree, sigma: f64) -> Tree {
    for node in tree.nodes_mut().iter_mut().filter(|n| n.is_leaf()) {
        let jitter: f64 = rng.sample(StandardNormal);
        node.value += sigma * jitter;
    }
    tree
}

fn change_variable<R: Rng + ?Sized>(rng: &mut R, mut tree: Tree, variables: &[Variable]) -> Tree {
    let candidates = kind_indices(tree.nodes(), |k| k == NodeKind::Variable);
    let Some(&i) = choose(rng, &candidates) else {
        return tree;
    };
    if variables.len() < 2 {
        return tree;
    }
    let current = tree.nodes()[i].feature;
    let pick = match variables.iter().position(|v| v.index == current) {
        Some(pos) => usize_range_excl(rng, 0..variables.len(), pos),
        None => rng.random_range(0..variables.len()),
    };
    tree.nodes_mut()[i].feature = variables[pick].index;
    tree
}

fn change_function<R: Rng + ?Sized>(rng: &mut R, mut tree: Tree, grammar: &Grammar) -> Tree {
    let candidates = function_indices(tree.nodes());
    let Some(&i) = choose(rng, &candidates) else {
        return tree;
    };
    let current = tree.nodes()[i].kind;
    if let Some(kind) = grammar.sample_where(rng, |k| k.arity() == current.arity() && k != current) {
        tree.nodes_mut()[i].set_kind(kind);
    }
    tree
}

fn insert_subtree<R: Rng + ?Sized>(
    rng: &mut R,
    tree: Tree,
    creator: &TreeCreator<'_>,
    max_depth: usize,
    max_length: usize,
) -> Tree {
    let len = tree.len();
    if len >= max_length {
        return tree;
    }
    let room = max_length - len;
    let levels = tree.levels();
    let depths = tree.subtree_depths();

    for _ in 0..SUBTREE_ATTEMPTS {
        let i = rng.random_range(0..len);
        if levels[i] + depths[i] > max_depth {
            continue;
        }
        let max_arity = room.min(2) as u8;
        let Some(kind) = creator.grammar().sample_symbol(rng, 1, max_arity) else {
            return tree;
        };

        let sibling = if kind.arity() == 2 {
            match creator.create(rng, max_depth - levels[i], room - 1) {
                Ok(t) => Some((t, rng.random_bool(0.5))),
                Err(_) => return tree,
            }
        } else {
            None
        };

        let target = tree.subtree(i);
        let mut replacement = Vec::with_capacity(room + target.len());
        match &sibling {
            None => replacement.extend_from_slice(target),
            Some((s, true)) => {
                replacement.extend_from_slice(target);
                replacement.extend_from_slice(s.nodes());
            }
            Some((s, false)) => {
                replacement.extend_from_slice(s.nodes());
                replacement.extend_from_slice(target);
            }
        }
        replacement.push(Node::function(kind));
        return tree.replace_subtree(i, &replacement);
    }
    tree
}

fn replace_subtree<R: Rng + ?Sized>(
    rng: &mut R,
    tree: Tree,
    creator: &TreeCreator<'_>,
    max_depth: usize,
    max_length: usize,
) -> Tree {
    let len = tree.len();
    let levels = tree.levels();

    for _ in 0..SUBTREE_ATTEMPTS {
        let i = rng.random_range(0..len);
        let sub_len = tree.nodes()[i].subtree_len();
        let depth_budget = (max_depth + 1).saturating_sub(levels[i]);
        let length_budget = max_length.saturating_sub(len - sub_len);
        if depth_budget == 0 || length_budget == 0 {
            continue;
        }
        let Ok(fresh) = creator.create(rng, depth_budget, length_budget) else {
            return tree;
        };
        return tree.replace_subtree(i, fresh.nodes());
    }
    tree
}

fn shuffle_subtrees<R: Rng + ?Sized>(rng: &mut R, tree: Tree) -> Tree {
    let candidates = kind_indices(tree.nodes(), NodeKind::is_commutative);
    let Some(&i) = choose(rng, &candidates) else {
        return tree;
    };
    let children = tree.children(i);
    let mut replacement = Vec::with_capacity(tree.nodes()[i].subtree_len());
    for &c in children.iter().rev() {
        replacement.extend_from_slice(tree.subtree(c));
    }
    replacement.push(tree.nodes()[i]);
    tree.replace_subtree(i, &replacement)
}

/// Weighted dispatcher over mutation operators. Weights are relative; a
/// non-positive weight disables its operator.
#[derive(Clone, Debug, Default)]
pub struct MultiMutation<'a> {
    operators: Vec<(Mutation<'a>, f64)>,
}

impl<'a> MultiMutation<'a> {
    pub fn new(operators: Vec<(Mutation<'a>, f64)>) -> Self {
        Self { operators }
    }

    pub fn add(&mut self, mutation: Mutation<'a>, weight: f64) {
        self.operators.push((mutation, weight));
    }

    pub fn operators(&self) -> &[(Mutation<'a>, f64)] {
        &self.operators
    }

    pub fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, tree: Tree) -> Tree {
        let live: Vec<(usize, f64)> = self
            .operators
            .iter()
            .enumerate()
            .filter(|(_, (_, w))| *w > 0.0 && w.is_finite())
            .map(|(i, (_, w))| (i, *w))
            .collect();
        match sample_weighted(rng, &live) {
            Some(i) => self.operators[i].0.mutate(rng, tree),
            None => tree,
        }
    }
}

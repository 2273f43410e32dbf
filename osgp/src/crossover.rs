use expression_trees::Tree;
use rand::Rng;

use crate::random::choose;

/// Replace a subtree of the first parent by a subtree of the second.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubtreeCrossover {
    /// Chance that a crossover point is a function node, when the tree has any.
    pub internal_probability: f64,
    pub max_depth: usize,
    pub max_length: usize,
    pub max_attempts: usize,
}

impl SubtreeCrossover {
    pub fn new(max_depth: usize, max_length: usize) -> Self {
        Self {
            internal_probability: 0.9,
            max_depth,
            max_length,
            max_attempts: 10,
        }
    }

    /// Child of `lhs` and `rhs`, or a copy of `lhs` when no pair of points
    /// fits the bounds within `max_attempts` draws.
    pub fn cross<R: Rng + ?Sized>(&self, rng: &mut R, lhs: &Tree, rhs: &Tree) -> Tree {
        let lhs_points = PointSet::new(lhs);
        let rhs_points = PointSet::new(rhs);
        let lhs_levels = lhs.levels();
        let rhs_depths = rhs.subtree_depths();

        for _ in 0..self.max_attempts {
            let i = lhs_points.pick(rng, self.internal_probability);
            let j = rhs_points.pick(rng, self.internal_probability);
            let removed = lhs.nodes()[i].subtree_len();
            let inserted = rhs.nodes()[j].subtree_len();
            if lhs.len() - removed + inserted > self.max_length {
                continue;
            }
            if lhs_levels[i] - 1 + rhs_depths[j] > self.max_depth {
                continue;
            }
            return lhs.replace_subtree(i, rhs.subtree(j));
        }
        lhs.clone()
    }
}

struct PointSet {
    internal: Vec<usize>,
    leaves: Vec<usize>,
}

impl PointSet {
    fn new(tree: &Tree) -> Self {
        let (internal, leaves): (Vec<usize>, Vec<usize>) = (0..tree.len()).partition(|&i| tree.nodes()[i].is_function());
        Self { internal, leaves }
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R, internal_probability: f64) -> usize {
        let pool = if !self.internal.is_empty() && rng.random_bool(internal_probability) {
            &self.internal
        } else {
            &self.leaves
        };
        *choose(rng, pool).expect("every tree has at least one leaf")
    }
}

#[cfg(test)]
mod tests {
    use expression_trees::{Node, NodeKind};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn chain(kind: NodeKind, depth: usize, feature: u16) -> Tree {
        let mut nodes = vec![Node::variable(feature, 1.0)];
        for _ in 1..depth {
            nodes.push(Node::function(kind));
        }
        Tree::new(nodes).unwrap()
    }

    #[test]
    fn child_mixes_material_from_both_parents() {
        let mut rng = StdRng::seed_from_u64(0);
        let lhs = chain(NodeKind::Sin, 4, 0);
        let rhs = chain(NodeKind::Exp, 3, 1);
        let x = SubtreeCrossover::new(10, 20);
        let mut saw_rhs = false;
        for _ in 0..50 {
            let child = x.cross(&mut rng, &lhs, &rhs);
            assert!(child.is_valid());
            assert!(child.len() <= 20);
            saw_rhs |= child.nodes().iter().any(|n| n.kind == NodeKind::Exp || n.feature == 1);
        }
        assert!(saw_rhs);
    }

    #[test]
    fn bounds_hold_and_failure_returns_lhs() {
        let mut rng = StdRng::seed_from_u64(1);
        let lhs = chain(NodeKind::Sin, 5, 0);
        let rhs = chain(NodeKind::Cos, 5, 1);
        let x = SubtreeCrossover::new(5, 5);
        for _ in 0..100 {
            let child = x.cross(&mut rng, &lhs, &rhs);
            assert!(child.len() <= 5 && child.depth() <= 5);
        }

        // The smallest subtree of rhs is one node, so any replacement of the
        // lhs leaf-only tree exceeds a length bound of zero.
        let tight = SubtreeCrossover {
            max_length: 0,
            ..x
        };
        let leaf = Tree::leaf(Node::constant(3.0));
        assert_eq!(tight.cross(&mut rng, &leaf, &rhs), leaf);
    }
}

use expression_trees::{Node, NodeKind, Tree};
use rand::Rng;
use rand_distr::StandardNormal;

use crate::dataset::Variable;
use crate::error::{Error, Result};
use crate::grammar::{Grammar, sample_weighted};
use crate::random::choose;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CreatorKind {
    Grow,
    Full,
    RampedHalfAndHalf,
}

/// Random tree factory over a grammar and a set of input variables.
#[derive(Copy, Clone, Debug)]
pub struct TreeCreator<'a> {
    pub kind: CreatorKind,
    grammar: &'a Grammar,
    variables: &'a [Variable],
}

impl<'a> TreeCreator<'a> {
    pub fn new(kind: CreatorKind, grammar: &'a Grammar, variables: &'a [Variable]) -> Self {
        Self {
            kind,
            grammar,
            variables,
        }
    }

    pub fn grow(grammar: &'a Grammar, variables: &'a [Variable]) -> Self {
        Self::new(CreatorKind::Grow, grammar, variables)
    }

    pub fn full(grammar: &'a Grammar, variables: &'a [Variable]) -> Self {
        Self::new(CreatorKind::Full, grammar, variables)
    }

    pub fn ramped(grammar: &'a Grammar, variables: &'a [Variable]) -> Self {
        Self::new(CreatorKind::RampedHalfAndHalf, grammar, variables)
    }

    pub fn grammar(&self) -> &'a Grammar {
        self.grammar
    }

    pub fn variables(&self) -> &'a [Variable] {
        self.variables
    }

    /// A tree with `length() <= max_length` and `depth() <= max_depth`.
    ///
    /// The ramped scheme draws its depth target and its full/grow choice from `rng`.
    pub fn create<R: Rng + ?Sized>(&self, rng: &mut R, max_depth: usize, max_length: usize) -> Result<Tree> {
        match self.kind {
            CreatorKind::Grow => self.build(rng, false, max_depth, max_length),
            CreatorKind::Full => self.build(rng, true, max_depth, max_length),
            CreatorKind::RampedHalfAndHalf => {
                let (lo, hi) = ramp_bounds(max_depth);
                let depth = rng.random_range(lo..=hi);
                let full = rng.random_bool(0.5);
                self.build(rng, full, depth, max_length)
            }
        }
    }

    /// Like [`TreeCreator::create`], but the ramped scheme derives its depth
    /// target and shape from the population slot: even slots are full, odd
    /// slots grow, and depth targets cycle over `2..=max_depth`.
    pub fn create_at<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        slot: usize,
        max_depth: usize,
        max_length: usize,
    ) -> Result<Tree> {
        match self.kind {
            CreatorKind::RampedHalfAndHalf => {
                let (lo, hi) = ramp_bounds(max_depth);
                let depth = lo + (slot / 2) % (hi - lo + 1);
                self.build(rng, slot % 2 == 0, depth, max_length)
            }
            _ => self.create(rng, max_depth, max_length),
        }
    }

    fn terminals(&self) -> Vec<(NodeKind, f64)> {
        self.grammar
            .allowed_symbols()
            .into_iter()
            .filter(|&(k, _)| match k {
                NodeKind::Constant => true,
                NodeKind::Variable => !self.variables.is_empty(),
                _ => false,
            })
            .collect()
    }

    fn build<R: Rng + ?Sized>(&self, rng: &mut R, full: bool, max_depth: usize, max_length: usize) -> Result<Tree> {
        let violation = |reason| Error::ConstraintViolation {
            max_depth,
            max_length,
            reason,
        };
        if max_depth < 1 || max_length < 1 {
            return Err(violation("bounds must be at least 1"));
        }
        let terminals = self.terminals();
        if terminals.is_empty() {
            return Err(violation("grammar has no usable terminal symbol"));
        }
        let functions: Vec<(NodeKind, f64)> = self
            .grammar
            .allowed_symbols()
            .into_iter()
            .filter(|(k, _)| !k.is_leaf())
            .collect();

        let mut builder = Builder {
            rng,
            full,
            max_depth,
            terminals: &terminals,
            functions: &functions,
            variables: self.variables,
            nodes: Vec::with_capacity(max_length),
        };
        builder.subtree(1, max_length);
        let tree = Tree::new(builder.nodes).expect("creator emits complete postfix trees");
        debug_assert!(tree.len() <= max_length && tree.depth() <= max_depth);
        Ok(tree)
    }
}

fn ramp_bounds(max_depth: usize) -> (usize, usize) {
    if max_depth < 2 { (max_depth, max_depth) } else { (2, max_depth) }
}

struct Builder<'b, R: ?Sized> {
    rng: &'b mut R,
    full: bool,
    max_depth: usize,
    terminals: &'b [(NodeKind, f64)],
    functions: &'b [(NodeKind, f64)],
    variables: &'b [Variable],
    nodes: Vec<Node>,
}

impl<R: Rng + ?Sized> Builder<'_, R> {
    /// Emit a subtree rooted at `depth` using at most `budget` nodes; returns the count used.
    fn subtree(&mut self, depth: usize, budget: usize) -> usize {
        debug_assert!(budget >= 1);
        let kind = self.pick(depth, budget);
        if kind.is_leaf() {
            let node = self.leaf(kind);
            self.nodes.push(node);
            return 1;
        }

        let arity = kind.arity() as usize;
        let mut remaining = budget - 1;
        let mut used = 1;
        for left in (1..=arity).rev() {
            let share = (remaining / left).max(1);
            let n = self.subtree(depth + 1, share.min(remaining - (left - 1)));
            remaining -= n;
            used += n;
        }
        self.nodes.push(Node::function(kind));
        used
    }

    fn pick(&mut self, depth: usize, budget: usize) -> NodeKind {
        let fits: Vec<(NodeKind, f64)> = if depth < self.max_depth {
            self.functions
                .iter()
                .copied()
                .filter(|(k, _)| (k.arity() as usize) < budget)
                .collect()
        } else {
            Vec::new()
        };

        let pool: Vec<(NodeKind, f64)> = if fits.is_empty() {
            self.terminals.to_vec()
        } else if self.full {
            fits
        } else {
            fits.into_iter().chain(self.terminals.iter().copied()).collect()
        };
        sample_weighted(self.rng, &pool).unwrap_or(NodeKind::Constant)
    }

    fn leaf(&mut self, kind: NodeKind) -> Node {
        match kind {
            NodeKind::Variable => {
                let v = choose(self.rng, self.variables).expect("variable leaves require input variables");
                Node::variable(v.index, 1.0)
            }
            _ => Node::constant(self.rng.sample(StandardNormal)),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::grammar::SymbolSet;

    fn vars() -> Vec<Variable> {
        (0..3)
            .map(|i| Variable {
                name: format!("x{i}"),
                index: i,
            })
            .collect()
    }

    #[test]
    fn full_trees_reach_the_depth_bound_when_length_allows() {
        let g = Grammar::default();
        let v = vars();
        let c = TreeCreator::full(&g, &v);
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            let t = c.create(&mut rng, 4, 100).unwrap();
            assert_eq!(t.depth(), 4);
            assert_eq!(t.len(), 15);
        }
    }

    #[test]
    fn bounds_hold_for_every_creator() {
        let g = Grammar::new(SymbolSet::FULL);
        let v = vars();
        let mut rng = StdRng::seed_from_u64(1);
        for kind in [CreatorKind::Grow, CreatorKind::Full, CreatorKind::RampedHalfAndHalf] {
            let c = TreeCreator::new(kind, &g, &v);
            for (depth, length) in [(1, 1), (1, 10), (3, 2), (5, 7), (12, 50)] {
                for slot in 0..20 {
                    let t = c.create_at(&mut rng, slot, depth, length).unwrap();
                    assert!(t.is_valid());
                    assert!(t.len() <= length, "{kind:?} {} > {length}", t.len());
                    assert!(t.depth() <= depth, "{kind:?} {} > {depth}", t.depth());
                }
            }
        }
    }

    #[test]
    fn zero_bounds_and_missing_terminals_are_violations() {
        let g = Grammar::default();
        let v = vars();
        let c = TreeCreator::grow(&g, &v);
        let mut rng = StdRng::seed_from_u64(2);
        assert!(matches!(c.create(&mut rng, 0, 10), Err(Error::ConstraintViolation { .. })));
        assert!(matches!(c.create(&mut rng, 3, 0), Err(Error::ConstraintViolation { .. })));

        let vars_only = Grammar::new(SymbolSet::from_kind(NodeKind::Variable) | SymbolSet::from_kind(NodeKind::Add));
        let c = TreeCreator::grow(&vars_only, &[]);
        assert!(matches!(c.create(&mut rng, 3, 10), Err(Error::ConstraintViolation { .. })));
    }

    #[test]
    fn ramped_slots_alternate_shape_and_cycle_depth() {
        let g = Grammar::default();
        let v = vars();
        let c = TreeCreator::ramped(&g, &v);
        let mut rng = StdRng::seed_from_u64(3);
        // slot 0 and 1 target depth 2, slot 2 and 3 depth 3, slot 4 and 5 depth 4
        for (slot, depth) in [(0, 2), (2, 3), (4, 4), (6, 2)] {
            let t = c.create_at(&mut rng, slot, 4, 1000).unwrap();
            assert_eq!(t.depth(), depth);
        }
        for slot in [1, 3, 5] {
            let t = c.create_at(&mut rng, slot, 4, 1000).unwrap();
            assert!(t.depth() <= 2 + slot / 2);
        }
    }

    #[test]
    fn leaves_use_unit_weight_and_known_variables() {
        let g = Grammar::new(SymbolSet::from_kind(NodeKind::Variable) | SymbolSet::from_kind(NodeKind::Mul));
        let v = vec![Variable {
            name: "a".into(),
            index: 7,
        }];
        let c = TreeCreator::grow(&g, &v);
        let mut rng = StdRng::seed_from_u64(4);
        let t = c.create(&mut rng, 5, 20).unwrap();
        for n in t.nodes().iter().filter(|n| n.is_leaf()) {
            assert_eq!(n.kind, NodeKind::Variable);
            assert_eq!(n.feature, 7);
            assert_eq!(n.value, 1.0);
        }
    }
}

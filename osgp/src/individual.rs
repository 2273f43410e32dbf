use std::cmp::Ordering;

use expression_trees::Tree;

/// A genotype with `K` objective values.
#[derive(Clone, Debug, PartialEq)]
pub struct Individual<const K: usize = 1> {
    pub genotype: Tree,
    pub fitness: [f64; K],
    pub rank: usize,
}

impl<const K: usize> Individual<K> {
    /// Unevaluated individual; fitness is NaN until assigned.
    pub fn new(genotype: Tree) -> Self {
        Self {
            genotype,
            fitness: [f64::NAN; K],
            rank: 0,
        }
    }

    pub fn with_fitness(genotype: Tree, fitness: [f64; K]) -> Self {
        Self {
            genotype,
            fitness,
            rank: 0,
        }
    }

    #[inline]
    pub fn fitness(&self, objective: usize) -> f64 {
        self.fitness[objective]
    }

    #[inline]
    pub fn length(&self) -> usize {
        self.genotype.len()
    }
}

/// Orders fitness values so that `Less` means "better".
///
/// NaN ranks below every number in either direction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FitnessOrder {
    pub objective: usize,
    pub maximization: bool,
}

impl FitnessOrder {
    pub fn new(objective: usize, maximization: bool) -> Self {
        Self { objective, maximization }
    }

    #[inline]
    fn key(&self, v: f64) -> f64 {
        match (v.is_nan(), self.maximization) {
            (false, _) => v,
            (true, true) => f64::NEG_INFINITY,
            (true, false) => f64::INFINITY,
        }
    }

    #[inline]
    pub fn compare_values(&self, a: f64, b: f64) -> Ordering {
        let (a, b) = (self.key(a), self.key(b));
        if self.maximization { b.total_cmp(&a) } else { a.total_cmp(&b) }
    }

    #[inline]
    pub fn is_better(&self, a: f64, b: f64) -> bool {
        self.compare_values(a, b) == Ordering::Less
    }

    #[inline]
    pub fn compare<const K: usize>(&self, a: &Individual<K>, b: &Individual<K>) -> Ordering {
        self.compare_values(a.fitness[self.objective], b.fitness[self.objective])
    }

    /// `(worse, better)` of two values.
    pub fn worse_better(&self, a: f64, b: f64) -> (f64, f64) {
        if self.is_better(a, b) { (b, a) } else { (a, b) }
    }
}

#[cfg(test)]
mod tests {
    use expression_trees::Node;

    use super::*;

    #[test]
    fn order_follows_direction() {
        let max = FitnessOrder::new(0, true);
        let min = FitnessOrder::new(0, false);
        assert!(max.is_better(0.9, 0.1));
        assert!(min.is_better(0.1, 0.9));
        assert_eq!(max.worse_better(0.9, 0.1), (0.1, 0.9));
        assert_eq!(min.worse_better(0.9, 0.1), (0.9, 0.1));
    }

    #[test]
    fn worst_values_rank_last() {
        let max = FitnessOrder::new(0, true);
        assert!(max.is_better(-1e300, f64::MIN));
        let min = FitnessOrder::new(0, false);
        assert!(min.is_better(1e300, f64::MAX));
    }

    #[test]
    fn new_individual_is_unevaluated() {
        let ind: Individual<2> = Individual::new(Tree::leaf(Node::constant(1.0)));
        assert!(ind.fitness.iter().all(|f| f.is_nan()));
        assert_eq!(ind.length(), 1);
    }
}

use crate::individual::{FitnessOrder, Individual};

#[derive(Clone, Debug, Default)]
pub struct Population<const K: usize = 1> {
    pub members: Vec<Individual<K>>,
}

impl<const K: usize> Population<K> {
    pub fn new(members: Vec<Individual<K>>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Index of the best member; ties go to the lowest index.
    pub fn best_index(&self, order: FitnessOrder) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, m) in self.members.iter().enumerate() {
            match best {
                Some(b) if !order.is_better(m.fitness[order.objective], self.members[b].fitness[order.objective]) => {}
                _ => best = Some(i),
            }
        }
        best
    }

    pub fn best(&self, order: FitnessOrder) -> Option<&Individual<K>> {
        self.best_index(order).map(|i| &self.members[i])
    }

    pub fn average_length(&self) -> f64 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.length() as f64).sum::<f64>() / self.members.len() as f64
    }

    /// Running mean of one objective in member order. Stays finite when
    /// members hold the clamped worst values `f64::MIN`/`f64::MAX`.
    pub fn average_fitness(&self, objective: usize) -> f64 {
        let mut mean = 0.0;
        for (k, m) in self.members.iter().enumerate() {
            let n = (k + 1) as f64;
            mean += m.fitness[objective] / n - mean / n;
        }
        mean
    }
}

#[cfg(test)]
mod tests {
    use expression_trees::{Node, Tree};

    use super::*;

    fn pop(fits: &[f64]) -> Population {
        Population::new(
            fits.iter()
                .map(|&f| Individual::with_fitness(Tree::leaf(Node::constant(0.0)), [f]))
                .collect(),
        )
    }

    #[test]
    fn best_respects_direction_and_ties() {
        let p = pop(&[0.2, 0.8, 0.8, 0.1]);
        assert_eq!(p.best_index(FitnessOrder::new(0, true)), Some(1));
        assert_eq!(p.best_index(FitnessOrder::new(0, false)), Some(3));
        assert_eq!(pop(&[]).best_index(FitnessOrder::new(0, true)), None);
    }

    #[test]
    fn averages() {
        let p = pop(&[1.0, 2.0, 3.0]);
        assert_eq!(p.average_fitness(0), 2.0);
        assert_eq!(p.average_length(), 1.0);
    }

    #[test]
    fn clamped_worst_values_keep_the_average_finite() {
        for worst in [f64::MIN, f64::MAX] {
            let p = pop(&[worst, worst, 0.5, worst]);
            let avg = p.average_fitness(0);
            assert!(avg.is_finite(), "{avg}");
            assert!(avg.abs() > 1e300);
        }
        assert_eq!(pop(&[f64::MIN, f64::MIN]).average_fitness(0), f64::MIN);
        assert_eq!(pop(&[]).average_fitness(0), 0.0);
    }
}

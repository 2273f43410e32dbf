use std::ops::Range;
use std::sync::atomic::{AtomicU64, Ordering};

use expression_trees::{
    EvalContext, EvalOptions, JacobianContext, Tree, eval_jacobian_into, eval_tree_array, eval_tree_array_into,
};
use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::dataset::{Dataset, Problem};
use crate::metrics::Scorer;
use crate::optim::{EvalBudget, LmOptions, Residuals, levenberg_marquardt};

const NO_CHECK: EvalOptions = EvalOptions { check_finite: false };

/// Predictions of `tree` over `range` of `dataset`.
pub fn evaluate_tree(tree: &Tree, dataset: &Dataset, range: Range<usize>) -> Vec<f64> {
    eval_tree_array(tree, dataset.columns(range), &NO_CHECK).0
}

/// Scores trees on the training rows of a problem, refining their leaf
/// values first, and keeps the evaluation counters for the whole run.
///
/// Shared across workers by reference; the counters are atomic.
#[derive(Debug)]
pub struct Evaluator<'a, S: Scorer> {
    problem: &'a Problem,
    scorer: S,
    local_iterations: usize,
    budget: u64,
    fitness_evaluations: AtomicU64,
    local_evaluations: AtomicU64,
}

impl<'a, S: Scorer> Evaluator<'a, S> {
    pub fn new(problem: &'a Problem, scorer: S, local_iterations: usize, budget: u64) -> Self {
        Self {
            problem,
            scorer,
            local_iterations,
            budget,
            fitness_evaluations: AtomicU64::new(0),
            local_evaluations: AtomicU64::new(0),
        }
    }

    pub fn problem(&self) -> &'a Problem {
        self.problem
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn fitness_evaluations(&self) -> u64 {
        self.fitness_evaluations.load(Ordering::Relaxed)
    }

    pub fn local_evaluations(&self) -> u64 {
        self.local_evaluations.load(Ordering::Relaxed)
    }

    pub fn total_evaluations(&self) -> u64 {
        self.fitness_evaluations() + self.local_evaluations()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.total_evaluations() >= self.budget
    }

    /// Fitness of `tree` on the training rows.
    ///
    /// Leaf values improved by the local search are written back into `tree`.
    /// Returns [`Scorer::worst`] without evaluating once the budget is spent.
    pub fn evaluate(&self, tree: &mut Tree) -> f64 {
        if self.budget_exhausted() {
            return S::worst();
        }
        self.force_evaluate(tree)
    }

    /// Like [`Evaluator::evaluate`], but spends the evaluations even past
    /// the budget, so the result never depends on what ran concurrently.
    pub fn force_evaluate(&self, tree: &mut Tree) -> f64 {
        let range = self.problem.training_range();
        let x = self.problem.dataset().columns(range.clone());
        let target = self.problem.target_values(range);

        if self.local_iterations > 0 && tree.coefficient_count() > 0 {
            let x0 = tree.coefficients();
            let mut residuals = TreeResiduals::new(tree.clone(), x, target);
            let opts = LmOptions {
                iterations: self.local_iterations,
                ..LmOptions::default()
            };
            let res = levenberg_marquardt(&x0, &mut residuals, opts);
            self.local_evaluations
                .fetch_add(res.budget.total() as u64, Ordering::Relaxed);
            if res.improved() {
                tree.set_coefficients(&res.minimizer);
            }
        }

        let mut ctx = EvalContext::new(x.ncols());
        let mut predicted = vec![0.0; x.ncols()];
        eval_tree_array_into(&mut predicted, tree, x, &mut ctx, &NO_CHECK);
        self.fitness_evaluations.fetch_add(1, Ordering::Relaxed);
        self.scorer.fitness(&predicted, target)
    }
}

/// Residuals `tree(x; θ) - y` as a function of the leaf values θ.
struct TreeResiduals<'d> {
    tree: Tree,
    x: ArrayView2<'d, f64>,
    target: ArrayView1<'d, f64>,
    eval_ctx: EvalContext,
    jac_ctx: JacobianContext,
}

impl<'d> TreeResiduals<'d> {
    fn new(tree: Tree, x: ArrayView2<'d, f64>, target: ArrayView1<'d, f64>) -> Self {
        let n_rows = x.ncols();
        Self {
            tree,
            x,
            target,
            eval_ctx: EvalContext::new(n_rows),
            jac_ctx: JacobianContext::new(n_rows),
        }
    }

    fn subtract_target(&self, r_out: &mut [f64]) {
        for (r, &y) in r_out.iter_mut().zip(self.target.iter()) {
            *r -= y;
        }
    }
}

impl Residuals for TreeResiduals<'_> {
    fn n_residuals(&self) -> usize {
        self.target.len()
    }

    fn residuals(&mut self, x: &[f64], r_out: &mut [f64], budget: &mut EvalBudget) {
        budget.residual_calls += 1;
        self.tree.set_coefficients(x);
        eval_tree_array_into(r_out, &self.tree, self.x, &mut self.eval_ctx, &NO_CHECK);
        self.subtract_target(r_out);
    }

    fn residuals_and_jacobian(
        &mut self,
        x: &[f64],
        r_out: &mut [f64],
        jac_out: &mut Array2<f64>,
        budget: &mut EvalBudget,
    ) {
        budget.jacobian_calls += 1;
        self.tree.set_coefficients(x);
        eval_jacobian_into(r_out, jac_out.view_mut(), &self.tree, self.x, &mut self.jac_ctx);
        self.subtract_target(r_out);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use expression_trees::{Node, NodeKind};

    use super::*;
    use crate::metrics::{NormalizedMeanSquaredError, RSquared};

    fn problem() -> Problem {
        let x: Vec<f64> = (0..30).map(|i| i as f64 / 10.0).collect();
        let y: Vec<f64> = x.iter().map(|&v| 3.0 * v + 0.5).collect();
        let ds = Dataset::from_columns(vec![("x".into(), x), ("y".into(), y)]).unwrap();
        Problem::new(ds, "y", 0..20, 20..30).unwrap()
    }

    // c0 + x * c1, with the weight of x acting as the slope
    fn affine() -> Tree {
        Tree::new(vec![Node::constant(0.0), Node::variable(0, 1.0), Node::function(NodeKind::Add)]).unwrap()
    }

    #[test]
    fn local_search_writes_back_coefficients() {
        let p = problem();
        let ev = Evaluator::new(&p, NormalizedMeanSquaredError, 50, 10_000);
        let mut t = affine();
        let fit = ev.evaluate(&mut t);
        assert!(fit < 1e-10);
        let coeffs = t.coefficients();
        assert_relative_eq!(coeffs[0], 0.5, epsilon = 1e-6);
        assert_relative_eq!(coeffs[1], 3.0, epsilon = 1e-6);
        assert_eq!(ev.fitness_evaluations(), 1);
        assert!(ev.local_evaluations() >= 2);
    }

    #[test]
    fn zero_iterations_leaves_tree_untouched() {
        let p = problem();
        let ev = Evaluator::new(&p, RSquared, 0, 10_000);
        let mut t = affine();
        let fit = ev.evaluate(&mut t);
        assert_relative_eq!(fit, 1.0, epsilon = 1e-12);
        assert_eq!(t, affine());
        assert_eq!(ev.local_evaluations(), 0);
    }

    #[test]
    fn non_finite_predictions_score_worst() {
        let p = problem();
        let ev = Evaluator::new(&p, RSquared, 0, 10_000);
        // log(-1 * x) is NaN on every positive row
        let mut t = Tree::new(vec![Node::variable(0, -1.0), Node::function(NodeKind::Log)]).unwrap();
        assert_eq!(ev.evaluate(&mut t), f64::MIN);

        let ev = Evaluator::new(&p, NormalizedMeanSquaredError, 0, 10_000);
        let mut t = Tree::new(vec![Node::constant(0.0), Node::variable(0, 1.0), Node::function(NodeKind::Div)]).unwrap();
        assert_eq!(ev.evaluate(&mut t), f64::MAX);
    }

    #[test]
    fn exhausted_budget_short_circuits() {
        let p = problem();
        let ev = Evaluator::new(&p, RSquared, 0, 2);
        let mut t = affine();
        ev.evaluate(&mut t);
        ev.evaluate(&mut t);
        assert!(ev.budget_exhausted());
        assert_eq!(ev.evaluate(&mut t), f64::MIN);
        assert_eq!(ev.total_evaluations(), 2);
    }

    #[test]
    fn forced_evaluation_ignores_the_budget() {
        let p = problem();
        let ev = Evaluator::new(&p, RSquared, 0, 1);
        let mut t = affine();
        ev.evaluate(&mut t);
        assert!(ev.budget_exhausted());
        assert_relative_eq!(ev.force_evaluate(&mut t), 1.0, epsilon = 1e-12);
        assert_eq!(ev.fitness_evaluations(), 2);
    }

    #[test]
    fn evaluate_tree_uses_the_requested_rows() {
        let p = problem();
        let y = evaluate_tree(&affine(), p.dataset(), p.test_range());
        assert_eq!(y.len(), 10);
        assert_relative_eq!(y[0], 2.0);
    }
}

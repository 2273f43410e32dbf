use expression_trees::Tree;
use log::trace;
use rand::Rng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::crossover::SubtreeCrossover;
use crate::evaluator::Evaluator;
use crate::individual::{FitnessOrder, Individual};
use crate::metrics::Scorer;
use crate::mutation::MultiMutation;
use crate::population::Population;
use crate::random::stream_rng;
use crate::selection::Selection;

/// Result of building one generation.
#[derive(Clone, Debug)]
pub struct GenerationOutcome {
    pub offspring: Population,
    /// Candidates generated per population slot.
    pub selection_pressure: f64,
    pub comparison_factor: f64,
    /// The evaluation budget ran out while this generation was assembled.
    pub budget_exhausted: bool,
}

/// Outcome of one recombination attempt.
#[derive(Clone, Debug)]
pub struct Offspring {
    pub child: Individual,
    pub accepted: bool,
}

struct SlotState {
    rng: StdRng,
    accepted: Option<Individual>,
    best_rejected: Option<Individual>,
}

impl SlotState {
    fn keep_rejected(&mut self, candidate: Individual, order: FitnessOrder) {
        match &self.best_rejected {
            Some(b) if !order.is_better(candidate.fitness(0), b.fitness(0)) => {}
            _ => self.best_rejected = Some(candidate),
        }
    }
}

/// Offspring-selection recombination: a child only enters the next
/// generation when it beats a threshold between its parents' fitness values.
///
/// The threshold slides from the worse parent towards the better one as the
/// selection pressure of the previous generation approaches the ceiling.
pub struct OffspringSelectionRecombinator<'a, S: Scorer> {
    evaluator: &'a Evaluator<'a, S>,
    selection: Selection,
    crossover: SubtreeCrossover,
    mutation: &'a MultiMutation<'a>,
    crossover_probability: f64,
    mutation_probability: f64,
    max_selection_pressure: f64,
    previous_pressure: Option<f64>,
}

impl<'a, S: Scorer> OffspringSelectionRecombinator<'a, S> {
    pub fn new(
        evaluator: &'a Evaluator<'a, S>,
        selection: Selection,
        crossover: SubtreeCrossover,
        mutation: &'a MultiMutation<'a>,
    ) -> Self {
        Self {
            evaluator,
            selection,
            crossover,
            mutation,
            crossover_probability: 1.0,
            mutation_probability: 0.25,
            max_selection_pressure: 100.0,
            previous_pressure: None,
        }
    }

    pub fn with_probabilities(mut self, crossover: f64, mutation: f64) -> Self {
        self.crossover_probability = crossover;
        self.mutation_probability = mutation;
        self
    }

    pub fn with_max_selection_pressure(mut self, max_selection_pressure: f64) -> Self {
        self.max_selection_pressure = max_selection_pressure;
        self
    }

    pub fn order(&self) -> FitnessOrder {
        FitnessOrder::new(0, S::MAXIMIZATION)
    }

    pub fn max_selection_pressure(&self) -> f64 {
        self.max_selection_pressure
    }

    /// Pressure reached by the last completed generation.
    pub fn previous_pressure(&self) -> Option<f64> {
        self.previous_pressure
    }

    pub fn reset(&mut self) {
        self.previous_pressure = None;
    }

    /// Interpolation factor between worse (0) and better (1) parent.
    pub fn comparison_factor(&self) -> f64 {
        match self.previous_pressure {
            None => 0.0,
            Some(_) if self.max_selection_pressure <= 0.0 => 1.0,
            Some(p) => (p / self.max_selection_pressure).clamp(0.0, 1.0),
        }
    }

    /// Acceptance threshold for a child of parents with fitness `a` and `b`.
    pub fn threshold(&self, a: f64, b: f64, factor: f64) -> f64 {
        let (worse, better) = self.order().worse_better(a, b);
        let t = worse + factor * (better - worse);
        if t.is_finite() { t } else { better }
    }

    /// Select parents, apply the operators, evaluate and judge one child.
    pub fn recombine<R: Rng + ?Sized>(&self, rng: &mut R, parents: &[Individual], factor: f64) -> Offspring {
        let order = self.order();
        let first = self.selection.select(rng, parents, order);
        let second = self.selection.select(rng, parents, order);
        let crossed = rng.random_bool(self.crossover_probability);
        let mutated = rng.random_bool(self.mutation_probability);

        let p1 = &parents[first];
        let p2 = &parents[second];
        let mut genotype: Tree = if crossed {
            self.crossover.cross(rng, &p1.genotype, &p2.genotype)
        } else {
            p1.genotype.clone()
        };
        if mutated {
            genotype = self.mutation.mutate(rng, genotype);
        }
        let fitness = self.evaluator.evaluate(&mut genotype);

        let threshold = if crossed {
            self.threshold(p1.fitness(0), p2.fitness(0), factor)
        } else {
            self.threshold(p1.fitness(0), p1.fitness(0), factor)
        };
        Offspring {
            child: Individual::with_fitness(genotype, [fitness]),
            accepted: order.is_better(fitness, threshold),
        }
    }

    /// Build the successor of `parents`.
    ///
    /// Slot 0 keeps the best parent. The other slots draw from their own
    /// random stream `(seed, generation, slot)`, so the result does not depend
    /// on how rayon schedules them.
    pub fn next_generation(&mut self, parents: &Population, seed: u64, generation: u64) -> GenerationOutcome {
        let order = self.order();
        let factor = self.comparison_factor();
        let n = parents.len();
        let mut offspring = Vec::with_capacity(n);
        if let Some(best) = parents.best(order) {
            offspring.push(best.clone());
        }

        let mut slots: Vec<SlotState> = (1..n)
            .map(|slot| SlotState {
                rng: stream_rng(seed, generation, slot as u64),
                accepted: None,
                best_rejected: None,
            })
            .collect();

        let mut attempts = 0usize;
        let mut exhausted = false;
        loop {
            let open = slots.iter().filter(|s| s.accepted.is_none()).count();
            if open == 0 {
                break;
            }
            if self.evaluator.budget_exhausted() {
                exhausted = true;
                break;
            }
            let pressure = attempts as f64 / n as f64;
            if pressure > self.max_selection_pressure {
                trace!("selection pressure {pressure:.2} above ceiling, filling {open} open slots");
                let generated = slots
                    .par_iter_mut()
                    .filter(|s| s.accepted.is_none())
                    .map(|s| match s.best_rejected.take() {
                        Some(ind) => {
                            s.accepted = Some(ind);
                            0
                        }
                        None => {
                            let o = self.recombine(&mut s.rng, &parents.members, factor);
                            s.accepted = Some(o.child);
                            1
                        }
                    })
                    .sum::<usize>();
                attempts += generated;
                break;
            }

            slots
                .par_iter_mut()
                .filter(|s| s.accepted.is_none())
                .for_each(|s| {
                    let o = self.recombine(&mut s.rng, &parents.members, factor);
                    if o.accepted {
                        s.accepted = Some(o.child);
                    } else {
                        s.keep_rejected(o.child, order);
                    }
                });
            attempts += open;
        }
        exhausted |= self.evaluator.budget_exhausted();

        let selection_pressure = if n == 0 { 0.0 } else { attempts as f64 / n as f64 };
        if !exhausted {
            self.previous_pressure = Some(selection_pressure);
        }
        offspring.extend(slots.into_iter().filter_map(|s| s.accepted));
        GenerationOutcome {
            offspring: Population::new(offspring),
            selection_pressure,
            comparison_factor: factor,
            budget_exhausted: exhausted,
        }
    }
}

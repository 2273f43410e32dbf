use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

use crate::creators::{CreatorKind, TreeCreator};
use crate::crossover::SubtreeCrossover;
use crate::dataset::Problem;
use crate::error::{Error, Result};
use crate::evaluator::{Evaluator, evaluate_tree};
use crate::individual::{FitnessOrder, Individual};
use crate::metrics::{Scorer, apply_scaling, linear_scaling, normalized_mse, r_squared};
use crate::options::GeneticAlgorithmConfig;
use crate::population::Population;
use crate::progress_bars::SearchProgress;
use crate::random::stream_rng;
use crate::recombinator::OffspringSelectionRecombinator;
use crate::selection::Selection;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlgorithmState {
    Initialize,
    Running,
    Terminated,
}

/// Snapshot taken after each completed generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationReport {
    pub elapsed: Duration,
    pub generation: usize,
    pub best: Individual,
    /// `(intercept, slope)` fitted to the best tree's training predictions.
    pub scaling: (f64, f64),
    /// Scores of the best individual after linear scaling on the training rows.
    pub r2_train: f64,
    pub r2_test: f64,
    pub nmse_train: f64,
    pub nmse_test: f64,
    pub average_length: f64,
    pub average_fitness: f64,
    pub fitness_evaluations: u64,
    pub local_evaluations: u64,
    pub total_evaluations: u64,
    pub selection_pressure: f64,
}

/// Generational loop with offspring selection.
pub struct GeneticProgrammingAlgorithm<'a, S: Scorer + Clone> {
    problem: &'a Problem,
    config: GeneticAlgorithmConfig,
    scorer: S,
    selection: Selection,
    creator: CreatorKind,
    state: AlgorithmState,
    generation: usize,
    population: Population,
}

impl<'a, S: Scorer + Clone> GeneticProgrammingAlgorithm<'a, S> {
    pub fn new(problem: &'a Problem, config: GeneticAlgorithmConfig, scorer: S) -> Result<Self> {
        config.validate()?;
        if problem.grammar().config().is_empty() {
            return Err(Error::InvalidConfig("grammar has no enabled symbols".into()));
        }
        Ok(Self {
            problem,
            config,
            scorer,
            selection: Selection::Random,
            creator: CreatorKind::RampedHalfAndHalf,
            state: AlgorithmState::Initialize,
            generation: 0,
            population: Population::default(),
        })
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_creator(mut self, creator: CreatorKind) -> Self {
        self.creator = creator;
        self
    }

    pub fn config(&self) -> &GeneticAlgorithmConfig {
        &self.config
    }

    pub fn state(&self) -> AlgorithmState {
        self.state
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn order(&self) -> FitnessOrder {
        FitnessOrder::new(0, S::MAXIMIZATION)
    }

    /// Run to termination, calling `on_generation` after generation 0 and
    /// after every completed generation. Returns the best individual.
    pub fn run(&mut self, on_generation: impl FnMut(&GenerationReport) + Send) -> Result<Individual> {
        if self.config.threads > 0 {
            let pool = ThreadPoolBuilder::new()
                .num_threads(self.config.threads)
                .build()
                .map_err(|e| Error::ThreadPool(e.to_string()))?;
            pool.install(|| self.run_in_pool(on_generation))
        } else {
            self.run_in_pool(on_generation)
        }
    }

    fn run_in_pool(&mut self, mut on_generation: impl FnMut(&GenerationReport)) -> Result<Individual> {
        let start = Instant::now();
        let cfg = &self.config;
        let problem = self.problem;
        let order = FitnessOrder::new(0, S::MAXIMIZATION);

        info!(
            "starting run: population {}, generations {}, budget {} evaluations, {} threads",
            cfg.population_size,
            cfg.generations,
            cfg.evaluations,
            rayon::current_num_threads()
        );

        let evaluator = Evaluator::new(problem, self.scorer.clone(), cfg.iterations, cfg.evaluations);
        let creator = TreeCreator::new(self.creator, problem.grammar(), problem.input_variables());
        let mutation = cfg.mutation_weights.build(
            problem.grammar(),
            problem.input_variables(),
            &creator,
            cfg.max_depth,
            cfg.max_length,
        );
        let mut recombinator = OffspringSelectionRecombinator::new(
            &evaluator,
            self.selection,
            SubtreeCrossover::new(cfg.max_depth, cfg.max_length),
            &mutation,
        )
        .with_probabilities(cfg.crossover_probability, cfg.mutation_probability)
        .with_max_selection_pressure(cfg.max_selection_pressure);
        let mut progress = SearchProgress::new(cfg.progress, cfg.generations);

        self.state = AlgorithmState::Initialize;
        self.generation = 0;
        let members = (0..cfg.population_size)
            .into_par_iter()
            .map(|slot| {
                let mut rng = stream_rng(cfg.seed, 0, slot as u64);
                let mut tree = creator.create_at(&mut rng, slot, cfg.max_depth, cfg.max_length)?;
                let fitness = evaluator.force_evaluate(&mut tree);
                Ok::<_, Error>(Individual::with_fitness(tree, [fitness]))
            })
            .collect::<Result<Vec<_>>>()?;
        self.population = Population::new(members);
        if evaluator.budget_exhausted() {
            warn!("evaluation budget exhausted by the initial population");
        }

        let report = self.report(&evaluator, 0.0, start);
        progress.on_generation(&report, cfg.generations == 0);
        on_generation(&report);
        self.state = AlgorithmState::Running;

        while self.generation < cfg.generations && !evaluator.budget_exhausted() {
            let outcome = recombinator.next_generation(&self.population, cfg.seed, self.generation as u64 + 1);
            if outcome.budget_exhausted {
                warn!(
                    "evaluation budget exhausted during generation {}; discarding it",
                    self.generation + 1
                );
                break;
            }
            self.population = outcome.offspring;
            self.generation += 1;

            let report = self.report(&evaluator, outcome.selection_pressure, start);
            debug!(
                "generation {}: best {:.6}, r2 train {:.4} test {:.4}, pressure {:.2}, evals {}",
                report.generation,
                report.best.fitness(0),
                report.r2_train,
                report.r2_test,
                report.selection_pressure,
                report.total_evaluations
            );
            progress.on_generation(&report, self.generation == cfg.generations);
            on_generation(&report);
        }

        self.state = AlgorithmState::Terminated;
        progress.finish();
        info!(
            "run terminated after {} generations and {} evaluations in {:.2?}",
            self.generation,
            evaluator.total_evaluations(),
            start.elapsed()
        );

        self.population
            .best(order)
            .cloned()
            .ok_or_else(|| Error::InvalidConfig("population is empty".into()))
    }

    fn report(&self, evaluator: &Evaluator<'_, S>, selection_pressure: f64, start: Instant) -> GenerationReport {
        let order = self.order();
        let best = self
            .population
            .best(order)
            .cloned()
            .expect("population is non-empty after initialization");
        let problem = self.problem;
        let dataset = problem.dataset();

        let mut train = evaluate_tree(&best.genotype, dataset, problem.training_range());
        let mut test = evaluate_tree(&best.genotype, dataset, problem.test_range());
        let scaling = linear_scaling(&train, problem.training_target());
        apply_scaling(&mut train, scaling);
        apply_scaling(&mut test, scaling);

        GenerationReport {
            elapsed: start.elapsed(),
            generation: self.generation,
            r2_train: r_squared(&train, problem.training_target()),
            r2_test: r_squared(&test, problem.test_target()),
            nmse_train: normalized_mse(&train, problem.training_target()),
            nmse_test: normalized_mse(&test, problem.test_target()),
            average_length: self.population.average_length(),
            average_fitness: self.population.average_fitness(0),
            fitness_evaluations: evaluator.fitness_evaluations(),
            local_evaluations: evaluator.local_evaluations(),
            total_evaluations: evaluator.total_evaluations(),
            selection_pressure,
            scaling,
            best,
        }
    }
}

use super::common::{grid_problem, small_config};
use crate::algorithm::{AlgorithmState, GeneticProgrammingAlgorithm};
use crate::metrics::RSquared;
use crate::options::GeneticAlgorithmConfig;

#[test]
fn run_stops_when_the_budget_is_spent() {
    let problem = grid_problem(30, |a, b| a / (1.0 + b * b));
    let config = GeneticAlgorithmConfig {
        generations: 10_000,
        evaluations: 3_000,
        threads: 2,
        ..small_config(3)
    };
    let budget = config.evaluations;
    let mut reports = Vec::new();
    let mut algo = GeneticProgrammingAlgorithm::new(&problem, config, RSquared).unwrap();
    let best = algo.run(|r| reports.push(r.clone())).unwrap();

    assert_eq!(algo.state(), AlgorithmState::Terminated);
    assert!(algo.generation() < 10_000);
    assert_eq!(reports.len(), algo.generation() + 1);
    assert_eq!(best.fitness(0), reports.last().unwrap().best.fitness(0));
    for r in &reports {
        assert!(r.total_evaluations < budget);
        assert_eq!(r.total_evaluations, r.fitness_evaluations + r.local_evaluations);
        assert!(r.average_fitness.is_finite());
    }
    for pair in reports.windows(2) {
        assert!(pair[1].fitness_evaluations > pair[0].fitness_evaluations);
        assert!(pair[1].local_evaluations >= pair[0].local_evaluations);
        // elitism: the best never gets worse
        assert!(pair[1].best.fitness(0) >= pair[0].best.fitness(0));
    }
}

#[test]
fn generation_limit_ends_the_run_first() {
    let problem = grid_problem(30, |a, _| a);
    let config = GeneticAlgorithmConfig {
        generations: 2,
        ..small_config(8)
    };
    let mut count = 0;
    let mut algo = GeneticProgrammingAlgorithm::new(&problem, config, RSquared).unwrap();
    algo.run(|_| count += 1).unwrap();
    assert_eq!(count, 3);
    assert_eq!(algo.generation(), 2);
}

use osgp::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn main() -> osgp::Result<()> {
    let n_rows = 300;
    let mut rng = StdRng::seed_from_u64(0);
    let x1: Vec<f64> = (0..n_rows).map(|_| rng.random_range(-3.0..3.0)).collect();
    let x2: Vec<f64> = (0..n_rows).map(|_| rng.random_range(-3.0..3.0)).collect();
    let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 2.0 * b.cos() + a * a - 2.0).collect();

    let dataset = Dataset::from_columns(vec![("x1".into(), x1), ("x2".into(), x2), ("y".into(), y)])?;
    let (train, test) = default_ranges(n_rows);
    let mut problem = Problem::new(dataset, "y", train, test)?;
    problem.grammar_mut().enable(SymbolSet::parse("cos,sin,exp")?);

    let config = GeneticAlgorithmConfig {
        population_size: 500,
        generations: 50,
        progress: false,
        ..Default::default()
    };
    let mut algorithm = GeneticProgrammingAlgorithm::new(&problem, config, RSquared)?;
    let best = algorithm.run(|r| {
        println!(
            "{:>4}  r2 train {:.4}  test {:.4}  evals {}",
            r.generation, r.r2_train, r.r2_test, r.total_evaluations
        );
    })?;

    let names = problem.dataset().names();
    println!(
        "best: {}",
        string_tree(
            &best.genotype,
            StringTreeOptions {
                variable_names: Some(names),
                ..Default::default()
            }
        )
    );
    Ok(())
}

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::common::{grid_problem, shape};
use crate::creators::TreeCreator;
use crate::crossover::SubtreeCrossover;
use crate::evaluator::Evaluator;
use crate::individual::Individual;
use crate::metrics::RSquared;
use crate::mutation::{MultiMutation, Mutation};
use crate::population::Population;
use crate::recombinator::OffspringSelectionRecombinator;
use crate::selection::Selection;

#[test]
fn value_mutations_never_change_structure() {
    let problem = grid_problem(30, |a, b| 2.0 * a - b);
    let evaluator = Evaluator::new(&problem, RSquared, 3, 1_000_000);
    let creator = TreeCreator::ramped(problem.grammar(), problem.input_variables());
    let mut rng = StdRng::seed_from_u64(4);
    let members: Vec<Individual> = (0..4)
        .map(|slot| {
            let mut tree = creator.create_at(&mut rng, slot, 4, 15).unwrap();
            let f = evaluator.evaluate(&mut tree);
            Individual::with_fitness(tree, [f])
        })
        .collect();
    let parents = Population::new(members);

    let mutation = MultiMutation::new(vec![
        (Mutation::OnePoint { sigma: 1.0 }, 1.0),
        (Mutation::MultiPoint { sigma: 1.0 }, 1.0),
    ]);
    let mut recombinator = OffspringSelectionRecombinator::new(
        &evaluator,
        Selection::Tournament { size: 2 },
        SubtreeCrossover::new(4, 15),
        &mutation,
    )
    .with_probabilities(0.0, 1.0);

    let parent_shapes: Vec<_> = parents.members.iter().map(|p| shape(&p.genotype)).collect();
    let outcome = recombinator.next_generation(&parents, 4, 1);
    assert_eq!(outcome.offspring.len(), 4);
    for child in &outcome.offspring.members {
        let s = shape(&child.genotype);
        assert!(parent_shapes.contains(&s), "child {} has no parent with its shape", child.genotype);
        assert!(child.genotype.is_valid());
    }
}

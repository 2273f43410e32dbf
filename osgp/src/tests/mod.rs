mod common;

mod test_budget_termination;
mod test_parametric_mutation_generation;

// CLI entrypoint + option wiring.

use anyhow::Context;
use clap::Parser;
use log::info;

use crate::algorithm::{GenerationReport, GeneticProgrammingAlgorithm};
use crate::cli::args::{Cli, ScorerKind};
use crate::cli::output::{model_string, report_header, report_line, write_reports};
use crate::cli::symbols::{build_grammar, print_grammar};
use crate::dataset::Problem;
use crate::metrics::{NormalizedMeanSquaredError, RSquared, Scorer};
use crate::options::GeneticAlgorithmConfig;
use crate::selection::Selection;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let grammar = build_grammar(&cli)?;
    if cli.show_grammar {
        print_grammar(&grammar);
        return Ok(());
    }

    let table = super::io::load_table(&cli).context("failed to load input table")?;
    let mut problem = super::io::build_problem(table, &cli).context("failed to build problem")?;
    *problem.grammar_mut() = grammar;

    let mut config = GeneticAlgorithmConfig::default();
    cli.config.apply_to(&mut config);
    config.validate().context("invalid configuration")?;

    let selection = parent_selection(cli.tournament_size);
    info!(
        "target {:?}, {} inputs, {} training rows, {} test rows",
        problem.target().name,
        problem.input_variables().len(),
        problem.training_range().len(),
        problem.test_range().len()
    );

    let reports = match cli.scorer {
        ScorerKind::R2 => search(&problem, config, RSquared, selection)?,
        ScorerKind::Nmse => search(&problem, config, NormalizedMeanSquaredError, selection)?,
    };

    if let Some(last) = reports.last() {
        println!();
        println!("model: {}", model_string(&problem, last));
    }
    if let Some(path) = &cli.output {
        write_reports(path, &reports).with_context(|| format!("failed to write reports to {}", path.display()))?;
    }
    Ok(())
}

fn parent_selection(tournament_size: usize) -> Selection {
    match tournament_size {
        0 => Selection::Random,
        size => Selection::Tournament { size },
    }
}

fn search<S: Scorer + Clone>(
    problem: &Problem,
    config: GeneticAlgorithmConfig,
    scorer: S,
    selection: Selection,
) -> anyhow::Result<Vec<GenerationReport>> {
    let mut algorithm = GeneticProgrammingAlgorithm::new(problem, config, scorer)?.with_selection(selection);
    let mut reports = Vec::new();
    println!("{}", report_header());
    algorithm.run(|report| {
        println!("{}", report_line(report));
        reports.push(report.clone());
    })?;
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn parents_are_drawn_uniformly_by_default() {
        let cli = Cli::try_parse_from(["osgp", "--dataset", "t.csv", "--target", "y"]).unwrap();
        assert_eq!(parent_selection(cli.tournament_size), Selection::Random);
        assert_eq!(parent_selection(3), Selection::Tournament { size: 3 });
    }
}

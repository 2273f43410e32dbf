// CLI output formatting.

use std::path::Path;

use anyhow::Context;
use expression_trees::{StringTreeOptions, string_tree};

use crate::algorithm::GenerationReport;
use crate::dataset::Problem;

const COLUMNS: [&str; 12] = [
    "generation",
    "elapsed",
    "r2_train",
    "r2_test",
    "nmse_train",
    "nmse_test",
    "best_fitness",
    "avg_fitness",
    "avg_length",
    "fitness_evals",
    "local_evals",
    "total_evals",
];

fn fields(report: &GenerationReport) -> [String; 12] {
    [
        report.generation.to_string(),
        format!("{:.3}", report.elapsed.as_secs_f64()),
        format!("{:.6}", report.r2_train),
        format!("{:.6}", report.r2_test),
        format!("{:.6}", report.nmse_train),
        format!("{:.6}", report.nmse_test),
        format!("{:.6}", report.best.fitness(0)),
        format!("{:.6}", report.average_fitness),
        format!("{:.2}", report.average_length),
        report.fitness_evaluations.to_string(),
        report.local_evaluations.to_string(),
        report.total_evaluations.to_string(),
    ]
}

pub fn report_header() -> String {
    COLUMNS.join("\t")
}

pub fn report_line(report: &GenerationReport) -> String {
    fields(report).join("\t")
}

/// Infix form of the best model with the dataset's column names,
/// including the linear scaling its scores were computed with.
pub fn model_string(problem: &Problem, report: &GenerationReport) -> String {
    let tree = string_tree(
        &report.best.genotype,
        StringTreeOptions {
            variable_names: Some(problem.dataset().names()),
            precision: Some(6),
        },
    );
    let (intercept, slope) = report.scaling;
    format!("{intercept:.6} + {slope:.6} * ({tree})")
}

pub fn write_reports(path: &Path, reports: &[GenerationReport]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path).with_context(|| format!("failed to create {}", path.display()))?;
    wtr.write_record(COLUMNS)?;
    for r in reports {
        wtr.write_record(fields(r))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use expression_trees::{Node, NodeKind, Tree};

    use super::*;
    use crate::dataset::Dataset;
    use crate::individual::Individual;

    fn report() -> GenerationReport {
        let tree = Tree::new(vec![Node::variable(0, 2.0), Node::constant(1.0), Node::function(NodeKind::Add)]).unwrap();
        GenerationReport {
            elapsed: Duration::from_millis(1500),
            generation: 3,
            best: Individual::with_fitness(tree, [0.75]),
            scaling: (0.5, 2.0),
            r2_train: 0.75,
            r2_test: 0.5,
            nmse_train: 0.25,
            nmse_test: 0.5,
            average_length: 4.0,
            average_fitness: 0.1,
            fitness_evaluations: 10,
            local_evaluations: 20,
            total_evaluations: 30,
            selection_pressure: 1.5,
        }
    }

    #[test]
    fn report_line_matches_header() {
        let line = report_line(&report());
        assert_eq!(line.split('\t').count(), report_header().split('\t').count());
        assert!(line.starts_with("3\t1.500\t0.750000"));
        assert!(line.ends_with("\t10\t20\t30"));
    }

    #[test]
    fn model_uses_column_names() {
        let ds = Dataset::from_columns(vec![("speed".into(), vec![1.0, 2.0, 3.0]), ("y".into(), vec![0.0; 3])]).unwrap();
        let p = Problem::new(ds, "y", 0..2, 2..3).unwrap();
        let s = model_string(&p, &report());
        assert!(s.contains("speed"), "{s}");
    }

    #[test]
    fn model_carries_the_linear_scaling() {
        let ds = Dataset::from_columns(vec![("x".into(), vec![1.0, 2.0, 3.0]), ("y".into(), vec![0.0; 3])]).unwrap();
        let p = Problem::new(ds, "y", 0..2, 2..3).unwrap();
        let s = model_string(&p, &report());
        assert!(s.starts_with("0.500000 + 2.000000 * ("), "{s}");
        assert!(s.ends_with(')'), "{s}");
    }
}

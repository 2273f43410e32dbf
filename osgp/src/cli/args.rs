// CLI argument parsing.

use std::ops::Range;
use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};

use crate::options::cli_args::ConfigArgs;

#[rustfmt::skip]
#[derive(Parser, Debug, Clone)]
#[command(name = "osgp")]
#[command(about = "Symbolic regression by genetic programming with offspring selection")]
pub struct Cli {
    /// Input dataset path (.csv or .xlsx).
    #[arg(long, required_unless_present = "show_grammar")]
    pub dataset: Option<PathBuf>,

    /// Sheet name for .xlsx (defaults to the first sheet).
    #[arg(long)]
    pub sheet: Option<String>,

    /// Treat input as having no header row; columns are named col0, col1, ...
    #[arg(long)]
    pub no_header: bool,

    /// Target column, by name or 0-based index.
    #[arg(long, required_unless_present = "show_grammar")]
    pub target: Option<String>,

    /// Input columns (comma-separated). Defaults to every column except the target.
    #[arg(long, value_delimiter = ',')]
    pub inputs: Option<Vec<String>>,

    /// Training rows as `start:end` (defaults to the first two thirds).
    #[arg(long)]
    pub train: Option<String>,

    /// Test rows as `start:end` (defaults to the rows after the training range).
    #[arg(long)]
    pub test: Option<String>,

    /// Symbols to enable on top of the default arithmetic set, e.g. `exp,log,sin`.
    #[arg(long)]
    pub enable_symbols: Option<String>,

    /// Symbols to remove from the grammar.
    #[arg(long)]
    pub disable_symbols: Option<String>,

    /// Print the enabled symbols with their weights and exit.
    #[arg(long)]
    pub show_grammar: bool,

    /// Fitness measure driving the search.
    #[arg(long, value_enum, default_value_t = ScorerKind::R2)]
    pub scorer: ScorerKind,

    /// Tournament size for parent selection; 0 selects parents uniformly.
    #[arg(long, default_value_t = 0)]
    pub tournament_size: usize,

    /// Also write the per-generation reports to this CSV file.
    #[arg(long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScorerKind {
    /// Coefficient of determination, maximized.
    R2,
    /// Normalized mean squared error, minimized.
    Nmse,
}

/// Parse a half-open row range written as `start:end`.
pub fn parse_range(raw: &str) -> anyhow::Result<Range<usize>> {
    let (start, end) = raw
        .split_once(':')
        .with_context(|| format!("row range {raw:?} must look like start:end"))?;
    let start: usize = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start in {raw:?}"))?;
    let end: usize = end
        .trim()
        .parse()
        .with_context(|| format!("invalid range end in {raw:?}"))?;
    if start > end {
        bail!("row range {raw:?} has start after end");
    }
    Ok(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_row_ranges() {
        assert_eq!(parse_range("0:100").unwrap(), 0..100);
        assert_eq!(parse_range(" 5 : 7 ").unwrap(), 5..7);
        assert_eq!(parse_range("3:3").unwrap(), 3..3);
    }

    #[test]
    fn rejects_malformed_ranges() {
        for raw in ["", "10", "a:b", "5:2", "1:2:3", "-1:4"] {
            assert!(parse_range(raw).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn config_flags_flatten_into_the_command() {
        let cli = Cli::try_parse_from([
            "osgp",
            "--dataset",
            "data.csv",
            "--target",
            "y",
            "--population-size",
            "50",
            "--mw-multi-point",
            "2",
            "--scorer",
            "nmse",
            "--no-progress",
        ])
        .unwrap();
        assert_eq!(cli.config.population_size, Some(50));
        assert_eq!(cli.config.mutation_weights.multi_point, Some(2.0));
        assert_eq!(cli.scorer, ScorerKind::Nmse);
        assert!(cli.config.no_progress);
        assert_eq!(cli.tournament_size, 0);
    }

    #[test]
    fn show_grammar_needs_no_dataset() {
        let cli = Cli::try_parse_from(["osgp", "--show-grammar", "--enable-symbols", "exp"]).unwrap();
        assert!(cli.show_grammar);
        assert!(cli.dataset.is_none());
    }
}

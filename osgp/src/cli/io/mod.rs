mod columns;
mod csv;
mod table;
mod xlsx;

use std::ops::Range;

use anyhow::{Context, bail};
pub use columns::ColumnSelector;
pub use table::Table;

use crate::cli::args::{Cli, parse_range};
use crate::dataset::{Dataset, Problem, Variable, default_ranges};

pub fn load_table(cli: &Cli) -> anyhow::Result<Table> {
    let path = cli
        .dataset
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("missing input dataset path"))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let has_header = !cli.no_header;

    match ext.as_str() {
        "csv" => csv::load_csv(path, has_header),
        "xlsx" | "xls" | "ods" => xlsx::load_xlsx(path, cli.sheet.as_deref(), has_header),
        _ => bail!("unsupported input extension {ext:?} (expected .csv or .xlsx)"),
    }
}

/// Resolve target, inputs and row ranges against `table`.
pub fn build_problem(table: Table, cli: &Cli) -> anyhow::Result<Problem> {
    let target_raw = cli
        .target
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("missing --target"))?;
    let target_idx = table
        .column_index(&ColumnSelector::parse(target_raw)?)
        .context("failed to resolve --target")?;

    let input_idx: Vec<usize> = match &cli.inputs {
        Some(xs) => xs
            .iter()
            .map(|s| ColumnSelector::parse(s).and_then(|sel| table.column_index(&sel)))
            .collect::<anyhow::Result<Vec<_>>>()
            .context("failed to resolve --inputs")?,
        None => (0..table.n_cols).filter(|&i| i != target_idx).collect(),
    };
    if input_idx.is_empty() {
        bail!("no input columns selected (use --inputs to specify explicitly)");
    }
    if input_idx.contains(&target_idx) {
        bail!("target column {target_raw:?} is also listed as an input");
    }

    let (training, test) = resolve_ranges(cli, table.n_rows)?;
    let dataset = Dataset::from_columns(table.headers.into_iter().zip(table.columns).collect())?;
    let variables = dataset.variables();
    let inputs: Vec<Variable> = input_idx.iter().map(|&i| variables[i].clone()).collect();
    let target = variables[target_idx].clone();

    Ok(Problem::with_inputs(dataset, target, inputs, training, test)?)
}

fn resolve_ranges(cli: &Cli, n_rows: usize) -> anyhow::Result<(Range<usize>, Range<usize>)> {
    let train = cli.train.as_deref().map(parse_range).transpose().context("failed to parse --train")?;
    let test = cli.test.as_deref().map(parse_range).transpose().context("failed to parse --test")?;
    Ok(match (train, test) {
        (Some(train), Some(test)) => (train, test),
        (Some(train), None) => {
            let test = if train.start > 0 {
                0..train.start
            } else if train.end < n_rows {
                train.end..n_rows
            } else {
                0..0
            };
            (train, test)
        }
        (None, Some(test)) => (0..test.start, test),
        (None, None) => default_ranges(n_rows),
    })
}

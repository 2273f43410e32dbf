use std::path::Path;

use anyhow::{Context, bail};
use calamine::{Data, Reader};

use super::Table;

pub fn load_xlsx(path: &Path, sheet: Option<&str>, has_header: bool) -> anyhow::Result<Table> {
    let mut wb = calamine::open_workbook_auto(path).with_context(|| format!("failed to open {}", path.display()))?;

    let sheet_name = match sheet {
        Some(s) => s.to_string(),
        None => wb
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("workbook has no sheets"))?,
    };
    let range = wb
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet {sheet_name:?}"))?;

    let first = range
        .rows()
        .next()
        .ok_or_else(|| anyhow::anyhow!("sheet {sheet_name:?} is empty"))?;
    let n_cols = first.len();
    if n_cols == 0 {
        bail!("sheet {sheet_name:?} has zero columns");
    }
    let (headers, skip): (Vec<String>, usize) = if has_header {
        (first.iter().enumerate().map(|(i, c)| header_name(i, c)).collect(), 1)
    } else {
        ((0..n_cols).map(|i| format!("col{i}")).collect(), 0)
    };

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); n_cols];
    for (row_idx, row) in range.rows().skip(skip).enumerate() {
        let row_num = row_idx + 1;
        if row.len() != n_cols {
            bail!("ragged sheet row {row_num}: expected {n_cols} columns but got {}", row.len());
        }
        for (col_idx, cell) in row.iter().enumerate() {
            let v = cell_to_f64(cell)
                .with_context(|| format!("failed to parse numeric cell at row {row_num}, col {col_idx}"))?;
            columns[col_idx].push(v);
        }
    }

    Table::new(headers, columns)
}

fn header_name(i: usize, cell: &Data) -> String {
    match cell {
        Data::String(s) if !s.trim().is_empty() => s.trim().to_string(),
        Data::Float(f) => f.to_string(),
        Data::Int(n) => n.to_string(),
        _ => format!("col{i}"),
    }
}

fn cell_to_f64(cell: &Data) -> anyhow::Result<f64> {
    match cell {
        Data::Float(f) => Ok(*f),
        Data::Int(i) => Ok(*i as f64),
        Data::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Data::String(s) => s.trim().parse::<f64>().with_context(|| format!("raw={s:?}")),
        Data::Empty => bail!("empty cell"),
        other => bail!("unsupported cell type {other:?}"),
    }
}

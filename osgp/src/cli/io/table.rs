use anyhow::{Context, bail};

use super::columns::ColumnSelector;

/// Numeric columns read from disk, before any column is given a role.
#[derive(Debug)]
pub struct Table {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<f64>>,
    pub n_rows: usize,
    pub n_cols: usize,
}

impl Table {
    pub fn new(headers: Vec<String>, columns: Vec<Vec<f64>>) -> anyhow::Result<Self> {
        if headers.len() != columns.len() {
            bail!("{} headers for {} columns", headers.len(), columns.len());
        }
        let n_rows = columns.first().map_or(0, Vec::len);
        if let Some((name, col)) = headers.iter().zip(&columns).find(|(_, c)| c.len() != n_rows) {
            bail!("column {name:?} has {} rows but expected {n_rows}", col.len());
        }
        if n_rows == 0 {
            bail!("table has no data rows");
        }
        Ok(Self {
            n_cols: columns.len(),
            headers,
            columns,
            n_rows,
        })
    }

    /// Exact header match first, then a unique case-insensitive one.
    pub fn column_index(&self, selector: &ColumnSelector) -> anyhow::Result<usize> {
        match selector {
            ColumnSelector::Index(i) => {
                if *i >= self.n_cols {
                    bail!("column index {i} out of bounds (n_cols={})", self.n_cols);
                }
                Ok(*i)
            }
            ColumnSelector::Name(name) => {
                if let Some(i) = self.headers.iter().position(|h| h == name) {
                    return Ok(i);
                }
                let mut matches = self
                    .headers
                    .iter()
                    .enumerate()
                    .filter(|(_, h)| h.eq_ignore_ascii_case(name))
                    .map(|(i, _)| i);
                let first = matches.next().with_context(|| format!("unknown column name {name:?}"))?;
                if matches.next().is_some() {
                    bail!("ambiguous column name {name:?} (multiple case-insensitive matches)");
                }
                Ok(first)
            }
        }
    }
}

use std::path::Path;

use anyhow::{Context, bail};

use super::Table;

pub fn load_csv(path: &Path, has_header: bool) -> anyhow::Result<Table> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(has_header)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open CSV {}", path.display()))?;

    let mut headers: Vec<String> = if has_header {
        rdr.headers()
            .with_context(|| format!("failed to read CSV headers from {}", path.display()))?
            .iter()
            .map(str::to_string)
            .collect()
    } else {
        Vec::new()
    };

    let mut columns: Vec<Vec<f64>> = Vec::new();
    for (row_idx, rec) in rdr.records().enumerate() {
        let row_num = row_idx + 1;
        let rec = rec.with_context(|| format!("failed to read CSV record at row {row_num}"))?;

        if row_idx == 0 {
            if has_header && headers.len() != rec.len() {
                bail!(
                    "CSV header has {} columns but first row has {} columns",
                    headers.len(),
                    rec.len()
                );
            }
            columns = vec![Vec::new(); rec.len()];
        } else if rec.len() != columns.len() {
            bail!(
                "ragged CSV at row {row_num}: expected {} fields but got {}",
                columns.len(),
                rec.len()
            );
        }

        for (col, raw) in columns.iter_mut().zip(rec.iter()) {
            let v: f64 = raw
                .parse()
                .with_context(|| format!("failed to parse float at row {row_num}: raw={raw:?}"))?;
            col.push(v);
        }
    }

    if !has_header {
        headers = (0..columns.len()).map(|i| format!("col{i}")).collect();
    }
    Table::new(headers, columns).with_context(|| format!("failed to build table from {}", path.display()))
}

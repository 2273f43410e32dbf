use std::ops::Range;

use ndarray::{Array2, ArrayView1, ArrayView2, s};

use crate::error::{Error, Result};
use crate::grammar::Grammar;

/// A named column that trees may reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Variable {
    pub name: String,
    pub index: u16,
}

/// Numeric table stored column-major: shape `(n_columns, n_rows)`, so each
/// column is one contiguous row of `values`.
#[derive(Clone, Debug)]
pub struct Dataset {
    values: Array2<f64>,
    names: Vec<String>,
}

impl Dataset {
    pub fn new(values: Array2<f64>, names: Vec<String>) -> Result<Self> {
        let values = values.as_standard_layout().to_owned();
        if names.len() != values.nrows() {
            return Err(Error::InvalidProblem(format!(
                "{} column names for {} columns",
                names.len(),
                values.nrows()
            )));
        }
        if values.nrows() > u16::MAX as usize {
            return Err(Error::InvalidProblem(format!("too many columns ({})", values.nrows())));
        }
        Ok(Self { values, names })
    }

    /// Build from `(name, column)` pairs of equal length.
    pub fn from_columns(columns: Vec<(String, Vec<f64>)>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, |(_, c)| c.len());
        let mut names = Vec::with_capacity(columns.len());
        let mut data = Vec::with_capacity(columns.len() * n_rows);
        for (name, col) in columns {
            if col.len() != n_rows {
                return Err(Error::InvalidProblem(format!(
                    "column {name:?} has {} rows but expected {n_rows}",
                    col.len()
                )));
            }
            names.push(name);
            data.extend(col);
        }
        let values = Array2::from_shape_vec((names.len(), n_rows), data)
            .map_err(|e| Error::InvalidProblem(e.to_string()))?;
        Self::new(values, names)
    }

    #[inline]
    pub fn n_rows(&self) -> usize {
        self.values.ncols()
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.values.nrows()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn variables(&self) -> Vec<Variable> {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| Variable {
                name: name.clone(),
                index: i as u16,
            })
            .collect()
    }

    pub fn variable(&self, name: &str) -> Option<Variable> {
        let index = self.names.iter().position(|n| n == name)?;
        Some(Variable {
            name: name.to_string(),
            index: index as u16,
        })
    }

    pub fn column(&self, index: u16) -> ArrayView1<'_, f64> {
        self.values.row(index as usize)
    }

    /// All columns restricted to `rows`, shaped for the tree interpreter.
    pub fn columns(&self, rows: Range<usize>) -> ArrayView2<'_, f64> {
        self.values.slice(s![.., rows])
    }

    pub fn values(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }
}

/// Dataset, grammar, target and row ranges of one regression run.
#[derive(Clone, Debug)]
pub struct Problem {
    dataset: Dataset,
    grammar: Grammar,
    target: Variable,
    inputs: Vec<Variable>,
    training_range: Range<usize>,
    test_range: Range<usize>,
}

impl Problem {
    /// Inputs default to every column except the target.
    pub fn new(
        dataset: Dataset,
        target: &str,
        training_range: Range<usize>,
        test_range: Range<usize>,
    ) -> Result<Self> {
        let target_var = dataset
            .variable(target)
            .ok_or_else(|| Error::InvalidProblem(format!("target variable {target:?} not in dataset")))?;
        let inputs: Vec<Variable> = dataset.variables().into_iter().filter(|v| v.index != target_var.index).collect();
        Self::with_inputs(dataset, target_var, inputs, training_range, test_range)
    }

    pub fn with_inputs(
        dataset: Dataset,
        target: Variable,
        inputs: Vec<Variable>,
        training_range: Range<usize>,
        test_range: Range<usize>,
    ) -> Result<Self> {
        let n = dataset.n_rows();
        if training_range.is_empty() {
            return Err(Error::InvalidProblem("training range is empty".into()));
        }
        for (label, r) in [("training", &training_range), ("test", &test_range)] {
            if r.start > r.end || r.end > n {
                return Err(Error::InvalidProblem(format!(
                    "{label} range {}:{} is outside the {n} dataset rows",
                    r.start, r.end
                )));
            }
        }
        if !test_range.is_empty() && training_range.start < test_range.end && test_range.start < training_range.end {
            return Err(Error::InvalidProblem(format!(
                "training range {}:{} overlaps test range {}:{}",
                training_range.start, training_range.end, test_range.start, test_range.end
            )));
        }
        if inputs.iter().any(|v| v.index == target.index) {
            return Err(Error::InvalidProblem(format!("target {:?} is also an input", target.name)));
        }
        if inputs.iter().any(|v| v.index as usize >= dataset.n_columns()) {
            return Err(Error::InvalidProblem("input variable index out of bounds".into()));
        }
        Ok(Self {
            dataset,
            grammar: Grammar::default(),
            target,
            inputs,
            training_range,
            test_range,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn grammar_mut(&mut self) -> &mut Grammar {
        &mut self.grammar
    }

    pub fn target(&self) -> &Variable {
        &self.target
    }

    pub fn input_variables(&self) -> &[Variable] {
        &self.inputs
    }

    pub fn training_range(&self) -> Range<usize> {
        self.training_range.clone()
    }

    pub fn test_range(&self) -> Range<usize> {
        self.test_range.clone()
    }

    pub fn target_values(&self, rows: Range<usize>) -> ArrayView1<'_, f64> {
        self.dataset.column(self.target.index).slice_move(s![rows])
    }

    pub fn training_target(&self) -> ArrayView1<'_, f64> {
        self.target_values(self.training_range())
    }

    pub fn test_target(&self) -> ArrayView1<'_, f64> {
        self.target_values(self.test_range())
    }
}

/// First two thirds of the rows for training, the rest for testing.
pub fn default_ranges(n_rows: usize) -> (Range<usize>, Range<usize>) {
    let split = n_rows * 2 / 3;
    (0..split, split..n_rows)
}

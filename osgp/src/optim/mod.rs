mod levenberg_marquardt;
mod linalg;
mod options;

pub(crate) use levenberg_marquardt::levenberg_marquardt;
pub(crate) use options::{EvalBudget, LmOptions, LmResult, Residuals};

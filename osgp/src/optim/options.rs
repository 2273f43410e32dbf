use ndarray::Array2;

#[derive(Clone, Copy, Debug)]
pub(crate) struct LmOptions {
    pub iterations: usize,
    /// Initial damping relative to the largest diagonal entry of `JᵀJ`.
    pub tau: f64,
    pub g_abstol: f64,
    pub x_reltol: f64,
    pub f_reltol: f64,
}

impl Default for LmOptions {
    fn default() -> Self {
        Self {
            iterations: 50,
            tau: 1e-3,
            g_abstol: 1e-10,
            x_reltol: 1e-10,
            f_reltol: 1e-12,
        }
    }
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct EvalBudget {
    pub residual_calls: usize,
    pub jacobian_calls: usize,
}

impl EvalBudget {
    pub fn total(&self) -> usize {
        self.residual_calls + self.jacobian_calls
    }
}

#[derive(Clone, Debug)]
pub(crate) struct LmResult {
    pub minimizer: Vec<f64>,
    /// Half the squared residual norm at `minimizer`.
    pub minimum: f64,
    pub initial: f64,
    pub iterations: usize,
    pub budget: EvalBudget,
}

impl LmResult {
    pub fn improved(&self) -> bool {
        self.minimum < self.initial
    }
}

/// A vector of residuals `r(x)` and its Jacobian, shape `n_residuals x n_params`.
///
/// Implementors bump the matching counter in `budget` on every call.
pub(crate) trait Residuals {
    fn n_residuals(&self) -> usize;

    fn residuals(&mut self, x: &[f64], r_out: &mut [f64], budget: &mut EvalBudget);

    fn residuals_and_jacobian(
        &mut self,
        x: &[f64],
        r_out: &mut [f64],
        jac_out: &mut Array2<f64>,
        budget: &mut EvalBudget,
    );
}

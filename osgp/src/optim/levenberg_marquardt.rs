use ndarray::{Array1, Array2, ArrayView1};

use super::linalg::{cholesky_solve, dot, inf_norm, norm};
use super::options::{EvalBudget, LmOptions, LmResult, Residuals};

fn normal_equations(jac: &Array2<f64>, r: &[f64]) -> (Array2<f64>, Array1<f64>) {
    let jt = jac.t();
    (jt.dot(jac), jt.dot(&ArrayView1::from(r)))
}

fn all_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> bool {
    values.into_iter().all(|v| v.is_finite())
}

/// Minimize `0.5 * |r(x)|²` starting at `x0`.
///
/// Damping follows Nielsen's update: shrink on a successful step in
/// proportion to the gain ratio, double the growth factor on failure.
/// The returned minimizer is never worse than `x0`.
pub(crate) fn levenberg_marquardt(x0: &[f64], f: &mut impl Residuals, opts: LmOptions) -> LmResult {
    let n = x0.len();
    let m = f.n_residuals();
    let mut budget = EvalBudget::default();

    let mut x = x0.to_vec();
    let mut r = vec![0.0; m];
    let mut jac = Array2::<f64>::zeros((m, n));
    f.residuals_and_jacobian(&x, &mut r, &mut jac, &mut budget);
    let mut cost = 0.5 * dot(&r, &r);
    let initial = cost;

    let mut result = LmResult {
        minimizer: x.clone(),
        minimum: cost,
        initial,
        iterations: 0,
        budget,
    };
    if n == 0 || !cost.is_finite() || !all_finite(jac.iter()) {
        result.budget = budget;
        return result;
    }

    let (mut jtj, mut g) = normal_equations(&jac, &r);
    let max_diag = (0..n).map(|i| jtj[(i, i)]).fold(0.0, f64::max);
    let mut mu = opts.tau * max_diag.max(f64::MIN_POSITIVE);
    let mut nu = 2.0;

    let mut x_trial = vec![0.0; n];
    let mut r_trial = vec![0.0; m];
    let mut iterations = 0;

    while iterations < opts.iterations {
        iterations += 1;

        let g_slice = g.as_slice().unwrap_or(&[]);
        if !all_finite(g.iter()) || inf_norm(g_slice) <= opts.g_abstol {
            break;
        }

        let mut a = jtj.clone();
        for i in 0..n {
            a[(i, i)] += mu;
        }
        let neg_g = g.mapv(|v| -v);
        let Some(h) = cholesky_solve(&a, neg_g.view()) else {
            mu *= nu;
            nu *= 2.0;
            if !mu.is_finite() {
                break;
            }
            continue;
        };
        let h = h.to_vec();
        if norm(&h) <= opts.x_reltol * (norm(&x) + opts.x_reltol) {
            break;
        }

        for ((t, &xi), &hi) in x_trial.iter_mut().zip(&x).zip(&h) {
            *t = xi + hi;
        }
        f.residuals(&x_trial, &mut r_trial, &mut budget);
        let cost_trial = 0.5 * dot(&r_trial, &r_trial);

        let predicted: f64 = h.iter().zip(g.iter()).map(|(&hi, &gi)| hi * (mu * hi - gi)).sum::<f64>() * 0.5;
        let rho = (cost - cost_trial) / predicted;

        if cost_trial.is_finite() && rho > 0.0 {
            let reduction = cost - cost_trial;
            std::mem::swap(&mut x, &mut x_trial);
            f.residuals_and_jacobian(&x, &mut r, &mut jac, &mut budget);
            cost = 0.5 * dot(&r, &r);
            (jtj, g) = normal_equations(&jac, &r);
            mu *= (1.0f64 / 3.0).max(1.0 - (2.0 * rho - 1.0).powi(3));
            nu = 2.0;
            if reduction <= opts.f_reltol * cost.max(f64::MIN_POSITIVE) || !all_finite(jac.iter()) {
                break;
            }
        } else {
            mu *= nu;
            nu *= 2.0;
            if !mu.is_finite() {
                break;
            }
        }
    }

    if cost.is_finite() && cost <= initial {
        result.minimizer = x;
        result.minimum = cost;
    }
    result.iterations = iterations;
    result.budget = budget;
    result
}

use ndarray::{Array1, Array2, ArrayView1};

pub(crate) fn inf_norm(v: &[f64]) -> f64 {
    v.iter().copied().map(f64::abs).fold(0.0, |a, b| a.max(b))
}

pub(crate) fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .copied()
        .zip(b.iter().copied())
        .map(|(x, y)| x * y)
        .sum()
}

pub(crate) fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Solve `a x = b` for symmetric positive definite `a` by Cholesky.
///
/// Returns `None` when `a` is not numerically positive definite.
pub(crate) fn cholesky_solve(a: &Array2<f64>, b: ArrayView1<'_, f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(b.len(), n);

    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[(i, j)];
            for k in 0..j {
                sum -= l[(i, k)] * l[(j, k)];
            }
            if i == j {
                if !(sum > 0.0) || !sum.is_finite() {
                    return None;
                }
                l[(i, i)] = sum.sqrt();
            } else {
                l[(i, j)] = sum / l[(j, j)];
            }
        }
    }

    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[(i, k)] * y[k];
        }
        y[i] = sum / l[(i, i)];
    }
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for k in (i + 1)..n {
            sum -= l[(k, i)] * x[k];
        }
        x[i] = sum / l[(i, i)];
    }
    Some(x)
}

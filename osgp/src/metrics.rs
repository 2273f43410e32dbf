//! Goodness-of-fit scores and the pluggable fitness scorers built on them.

use ndarray::ArrayView1;

/// Fitness function over predictions and targets.
pub trait Scorer: Send + Sync {
    /// Higher is better when true.
    const MAXIMIZATION: bool;

    fn name(&self) -> &'static str;

    fn score(&self, estimated: &[f64], target: ArrayView1<'_, f64>) -> f64;

    /// Worst representable value for this direction.
    fn worst() -> f64 {
        if Self::MAXIMIZATION { f64::MIN } else { f64::MAX }
    }

    /// Score with non-finite results mapped to [`Scorer::worst`].
    fn fitness(&self, estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
        let s = self.score(estimated, target);
        if s.is_finite() { s } else { Self::worst() }
    }
}

/// Squared Pearson correlation. Invariant to linear scaling of the estimate.
#[derive(Copy, Clone, Debug, Default)]
pub struct RSquared;

impl Scorer for RSquared {
    const MAXIMIZATION: bool = true;

    fn name(&self) -> &'static str {
        "r2"
    }

    fn score(&self, estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
        r_squared(estimated, target)
    }
}

/// Mean squared error normalized by the target variance.
#[derive(Copy, Clone, Debug, Default)]
pub struct NormalizedMeanSquaredError;

impl Scorer for NormalizedMeanSquaredError {
    const MAXIMIZATION: bool = false;

    fn name(&self) -> &'static str {
        "nmse"
    }

    fn score(&self, estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
        normalized_mse(estimated, target)
    }
}

pub fn mean_squared_error(estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(estimated.len(), target.len());
    if estimated.is_empty() {
        return f64::NAN;
    }
    let sum: f64 = estimated.iter().zip(target.iter()).map(|(&e, &t)| (e - t) * (e - t)).sum();
    sum / estimated.len() as f64
}

fn variance(values: ArrayView1<'_, f64>) -> f64 {
    let n = values.len() as f64;
    let mean = values.sum() / n;
    values.iter().map(|&v| (v - mean) * (v - mean)).sum::<f64>() / n
}

pub fn normalized_mse(estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
    mean_squared_error(estimated, target) / variance(target)
}

/// Pearson correlation; NaN when either side has zero variance.
pub fn pearson(estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
    assert_eq!(estimated.len(), target.len());
    let n = estimated.len() as f64;
    if estimated.is_empty() {
        return f64::NAN;
    }
    let me = estimated.iter().sum::<f64>() / n;
    let mt = target.sum() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&e, &t) in estimated.iter().zip(target.iter()) {
        let de = e - me;
        let dt = t - mt;
        sxy += de * dt;
        sxx += de * de;
        syy += dt * dt;
    }
    let r = sxy / (sxx * syy).sqrt();
    if sxx == 0.0 || syy == 0.0 { f64::NAN } else { r }
}

pub fn r_squared(estimated: &[f64], target: ArrayView1<'_, f64>) -> f64 {
    let r = pearson(estimated, target);
    r * r
}

/// Least-squares `(intercept, slope)` such that `intercept + slope * estimated ≈ target`.
///
/// Falls back to `(mean(target), 0)` when the estimate is constant or non-finite.
pub fn linear_scaling(estimated: &[f64], target: ArrayView1<'_, f64>) -> (f64, f64) {
    assert_eq!(estimated.len(), target.len());
    if estimated.is_empty() {
        return (0.0, 1.0);
    }
    let n = estimated.len() as f64;
    let me = estimated.iter().sum::<f64>() / n;
    let mt = target.sum() / n;
    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (&e, &t) in estimated.iter().zip(target.iter()) {
        sxy += (e - me) * (t - mt);
        sxx += (e - me) * (e - me);
    }
    let slope = sxy / sxx;
    if !slope.is_finite() || !me.is_finite() {
        return (mt, 0.0);
    }
    (mt - slope * me, slope)
}

pub fn apply_scaling(estimated: &mut [f64], (intercept, slope): (f64, f64)) {
    for v in estimated {
        *v = intercept + slope * *v;
    }
}

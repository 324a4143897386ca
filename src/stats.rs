//! Windowed statistics and z-normalization (SPEC_FULL §4.1, §4.2).
//!
//! Grounded on `movmeanstd`/`zNormalize` in the go-matrixprofile source and
//! on the `stats::{mean, moving_avg, moving_std, std}` call surface of the
//! teacher crate's `lib.rs`.

use crate::error::MassError;

/// Arithmetic mean of a slice. Empty input returns `0.0`.
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    x.iter().sum::<f64>() / x.len() as f64
}

/// Biased (population) standard deviation of a slice.
pub fn std(x: &[f64]) -> f64 {
    if x.len() < 2 {
        return 0.0;
    }
    let mu = mean(x);
    let var = x.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / x.len() as f64;
    var.max(0.0).sqrt()
}

/// Rolling mean and (biased) standard deviation of every window of length
/// `m` in `x`, computed in O(n) with a running sum and running
/// sum-of-squares.
///
/// Returns `(mean[0..=n-m], std[0..=n-m])`. Fails when `m < 2` or `m > n`.
pub fn moving_stats(x: &[f64], m: usize) -> Result<(Vec<f64>, Vec<f64>), MassError> {
    if m < 2 {
        return Err(MassError::WindowTooShort(m));
    }
    let n = x.len();
    if m > n {
        return Err(MassError::SubsequenceTooLong { m, n });
    }

    let count = n - m + 1;
    let mut means = Vec::with_capacity(count);
    let mut stds = Vec::with_capacity(count);

    let mut sum: f64 = x[..m].iter().sum();
    let mut sum_sq: f64 = x[..m].iter().map(|v| v * v).sum();
    let mf = m as f64;

    let push = |sum: f64, sum_sq: f64, means: &mut Vec<f64>, stds: &mut Vec<f64>| {
        let mu = sum / mf;
        let var = (sum_sq / mf - mu * mu).max(0.0);
        means.push(mu);
        stds.push(var.sqrt());
    };

    push(sum, sum_sq, &mut means, &mut stds);
    for i in 1..count {
        let leaving = x[i - 1];
        let entering = x[i + m - 1];
        sum += entering - leaving;
        sum_sq += entering * entering - leaving * leaving;
        push(sum, sum_sq, &mut means, &mut stds);
    }

    Ok((means, stds))
}

/// z-normalize a subsequence: `(q - mean(q)) / std(q)`.
///
/// Fails when `q.len() < 2`, or when `std(q) == 0` (a constant
/// subsequence has no well-defined z-normalized form).
pub fn z_normalize(q: &[f64]) -> Result<Vec<f64>, MassError> {
    if q.len() < 2 {
        return Err(MassError::WindowTooShort(q.len()));
    }
    let mu = mean(q);
    let sigma = std(q);
    if sigma == 0.0 {
        return Err(MassError::DegenerateSubsequence);
    }
    Ok(q.iter().map(|v| (v - mu) / sigma).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_stats_matches_naive() {
        let x = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0];
        let m = 3;
        let (means, stds) = moving_stats(&x, m).unwrap();
        for i in 0..means.len() {
            let window = &x[i..i + m];
            assert!((means[i] - mean(window)).abs() < 1e-12);
            assert!((stds[i] - std(window)).abs() < 1e-12);
        }
    }

    #[test]
    fn moving_stats_rejects_short_window() {
        assert_eq!(moving_stats(&[1.0, 2.0], 1), Err(MassError::WindowTooShort(1)));
    }

    #[test]
    fn moving_stats_rejects_oversized_window() {
        assert_eq!(
            moving_stats(&[1.0, 2.0], 3),
            Err(MassError::SubsequenceTooLong { m: 3, n: 2 })
        );
    }

    #[test]
    fn z_normalize_constant_is_degenerate() {
        assert_eq!(z_normalize(&[2.0, 2.0, 2.0]), Err(MassError::DegenerateSubsequence));
    }

    #[test]
    fn z_normalize_has_zero_mean_unit_std() {
        let q = z_normalize(&[1.0, 5.0, 3.0, 9.0]).unwrap();
        assert!(mean(&q).abs() < 1e-9);
        assert!((std(&q) - 1.0).abs() < 1e-9);
    }
}

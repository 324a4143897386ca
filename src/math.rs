//! FFT sliding dot product and distance-profile conversions (SPEC_FULL
//! §4.3, §4.4, §4.5, §4.6).
//!
//! Grounded on `crossCorrelate`/`mass`/`calculateDistanceProfile` in the
//! go-matrixprofile source, and on the teacher crate's `math::{argmin,
//! fft_mult}` call surface. The real-to-complex FFT plan usage
//! (`RealFftPlanner`, `make_output_vec`, `process`) follows the pattern in
//! `examples/other_examples/..._monistowl-elf__...-hrv.rs.rs`.

use realfft::num_complex::Complex;
use realfft::{ComplexToReal, RealFftPlanner, RealToComplex};
use std::sync::Arc;

use crate::error::MassError;

/// Caches a real-to-complex FFT plan pair of length `n`, plus the
/// precomputed FFT of the target series `b` (zero-padded to `n`).
///
/// One instance lives on [`crate::MatrixProfile`] for its whole lifetime
/// and is only rebuilt when `n` changes (on `stamp_update`), replacing the
/// source's "one plan per `crossCorrelate` call" (SPEC_FULL §9).
pub struct FftCache {
    n: usize,
    r2c: Arc<dyn RealToComplex<f64>>,
    c2r: Arc<dyn ComplexToReal<f64>>,
    b_fft: Vec<Complex<f64>>,
}

impl FftCache {
    /// Build a cache of FFT plans of length `n` and precompute the FFT of
    /// `b`, zero-padded to `n`.
    pub fn new(b: &[f64], n: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(n);
        let c2r = planner.plan_fft_inverse(n);

        let mut padded = r2c.make_input_vec();
        padded[..b.len()].copy_from_slice(b);
        let mut b_fft = r2c.make_output_vec();
        r2c.process(&mut padded, &mut b_fft)
            .expect("fixed-size FFT plan matches buffer length");

        FftCache { n, r2c, c2r, b_fft }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Sliding dot product (cross-correlation) of query `q` (length `m`)
    /// against the cached series, using the FFT convolution theorem.
    ///
    /// `q` is reversed and zero-padded to length `n`, transformed,
    /// multiplied pointwise against the cached FFT of `b`, and inverted.
    /// Returns the tail of length `n - m + 1` starting at `m - 1`, scaled
    /// to undo the unnormalized FFT/inverse-FFT pair.
    pub fn cross_correlate(&self, q: &[f64]) -> Vec<f64> {
        let m = q.len();
        let mut qpad = self.r2c.make_input_vec();
        for i in 0..m {
            qpad[i] = q[m - 1 - i];
        }

        let mut qf = self.r2c.make_output_vec();
        self.r2c
            .process(&mut qpad, &mut qf)
            .expect("fixed-size FFT plan matches buffer length");

        for (a, b) in qf.iter_mut().zip(self.b_fft.iter()) {
            *a *= *b;
        }

        let mut dot = self.c2r.make_output_vec();
        self.c2r
            .process(&mut qf, &mut dot)
            .expect("fixed-size FFT plan matches buffer length");

        let n = self.n;
        let scale = n as f64;
        dot[m - 1..n]
            .iter()
            .map(|v| v / scale)
            .collect()
    }
}

/// Index of the minimum value in a slice of finite (or `+inf`) values.
/// Panics on an empty slice — callers always pass a non-empty profile.
pub fn argmin(values: &[f64]) -> usize {
    let mut best_idx = 0;
    let mut best_val = values[0];
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v < best_val {
            best_val = v;
            best_idx = i;
        }
    }
    best_idx
}

/// Overwrite `profile[center-half_width ..= center+half_width]` (clamped to
/// bounds) with `+inf`, suppressing trivial self-matches and already
/// reported motifs/discords (SPEC_FULL §4.3).
pub fn apply_exclusion_zone(profile: &mut [f64], center: usize, half_width: usize) {
    let start = center.saturating_sub(half_width);
    let end = (center + half_width + 1).min(profile.len());
    for v in &mut profile[start..end] {
        *v = f64::INFINITY;
    }
}

/// MASS-form distance profile (SPEC_FULL §4.5): converts a sliding dot
/// product against a z-normalized query into z-normalized Euclidean
/// distances, using the query's own mean/std and the target's rolling std.
pub fn mass_distance(dot: &[f64], b_std: &[f64], m: usize, profile: &mut [f64]) -> Result<(), MassError> {
    if dot.len() != b_std.len() {
        return Err(MassError::LengthMismatch {
            left_name: "dot",
            left: dot.len(),
            right_name: "b_std",
            right: b_std.len(),
        });
    }
    if profile.len() != dot.len() {
        return Err(MassError::LengthMismatch {
            left_name: "profile",
            left: profile.len(),
            right_name: "dot",
            right: dot.len(),
        });
    }
    let mf = m as f64;
    for i in 0..dot.len() {
        profile[i] = (2.0 * (mf - dot[i] / b_std[i])).abs().sqrt();
    }
    Ok(())
}

/// Shared core of the STOMP-incremental formula (SPEC_FULL §4.6): both
/// `stomp_distance` (query mean/std taken from the cached `b_mean[idx]`,
/// `b_std[idx]`) and the legacy [`mass_classic_distance`] (query mean/std
/// supplied directly, since a one-off query isn't a row of `b`) reduce to
/// this computation.
///
/// The `|1 - ...|` absolute value is preserved verbatim (SPEC_FULL §9 open
/// question 4): it masks small negative arguments from floating-point
/// rounding rather than clamping to zero.
fn correlation_distance(
    dot: &[f64],
    mu_q: f64,
    sigma_q: f64,
    b_mean: &[f64],
    b_std: &[f64],
    m: usize,
    profile: &mut [f64],
) {
    let mf = m as f64;
    for i in 0..dot.len() {
        let corr = (dot[i] - mf * b_mean[i] * mu_q) / (mf * b_std[i] * sigma_q);
        profile[i] = (2.0 * mf * (1.0 - corr).abs()).sqrt();
    }
}

/// STOMP-incremental distance profile (SPEC_FULL §4.6): converts a raw
/// sliding dot product (not normalized by std) plus cached window
/// statistics into z-normalized Euclidean distances. Algebraically
/// equivalent to [`mass_distance`] but avoids re-normalizing the query.
pub fn stomp_distance(
    dot: &[f64],
    b_mean: &[f64],
    b_std: &[f64],
    m: usize,
    idx: usize,
    profile: &mut [f64],
) -> Result<(), MassError> {
    if profile.len() != dot.len() {
        return Err(MassError::LengthMismatch {
            left_name: "profile",
            left: profile.len(),
            right_name: "dot",
            right: dot.len(),
        });
    }
    correlation_distance(dot, b_mean[idx], b_std[idx], b_mean, b_std, m, profile);
    Ok(())
}

/// Classic single-query MASS distance (SPEC_FULL §4.14): like
/// [`stomp_distance`], but for a one-off query that isn't itself a row of
/// the cached series, so its mean/std (`mu_q`, `sigma_q`) are supplied
/// directly instead of being looked up in `b_mean`/`b_std`. This is the
/// formula the teacher crate's top-level `mass`/`mass_batch` use.
pub fn mass_classic_distance(
    dot: &[f64],
    mu_q: f64,
    sigma_q: f64,
    ts_mean: &[f64],
    ts_std: &[f64],
    m: usize,
) -> Vec<f64> {
    let mut profile = vec![0.0; dot.len()];
    correlation_distance(dot, mu_q, sigma_q, ts_mean, ts_std, m, &mut profile);
    profile
}

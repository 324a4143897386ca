//! The `MatrixProfile` engine: STMP, STAMP, STOMP and STAMP-update
//! (SPEC_FULL §3, §4.7-§4.10).
//!
//! Grounded method-for-method on the `MatrixProfile` struct and its `New`,
//! `Stmp`, `Stamp`, `Stomp`/`stompBatch`/`mergeStompResults`, `StampUpdate`
//! methods in the go-matrixprofile source, with STOMP's channel+waitgroup
//! parallelism replaced by a `rayon` map-then-reduce (SPEC_FULL §9).

use rand::seq::SliceRandom;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::error::MassError;
use crate::math::{self, FftCache};
use crate::stats;

/// A motif group: a set of mutually similar subsequences and the minimum
/// pairwise distance that defines them (SPEC_FULL §4.11).
#[derive(Debug, Clone, PartialEq)]
pub struct MotifGroup {
    pub indices: Vec<usize>,
    pub min_dist: f64,
}

/// Tracks the matrix profile computation for a time series pair `(a, b)`
/// with subsequence length `m` (SPEC_FULL §3).
pub struct MatrixProfile {
    a: Vec<f64>,
    b: Vec<f64>,
    n: usize,
    m: usize,
    self_join: bool,
    b_mean: Vec<f64>,
    b_std: Vec<f64>,
    fft: FftCache,
    mp: Vec<f64>,
    idx: Vec<usize>,
}

struct StompBatchResult {
    mp: Option<Vec<f64>>,
    idx: Option<Vec<usize>>,
    err: Option<MassError>,
}

impl MatrixProfile {
    /// Construct a matrix-profile engine. If `b` is `None`, `a` is used for
    /// a self join with an exclusion zone; otherwise a general join between
    /// `a` and `b` is performed. Fails when either series is empty, `m < 2`,
    /// or `2*m >= n` where `n = b.len()` (or `a.len()` for a self join).
    pub fn try_new(a: Vec<f64>, b: Option<Vec<f64>>, m: usize) -> Result<Self, MassError> {
        if a.is_empty() {
            return Err(MassError::EmptySeries);
        }
        let (b, self_join) = match b {
            None => (a.clone(), true),
            Some(b) => {
                if b.is_empty() {
                    return Err(MassError::SecondSeriesEmpty);
                }
                (b, false)
            }
        };

        let n = b.len();
        if m < 2 {
            return Err(MassError::WindowTooShort(m));
        }
        if 2 * m >= n {
            return Err(MassError::SubsequenceTooLong { m, n });
        }

        let (b_mean, b_std) = stats::moving_stats(&b, m)?;
        let fft = FftCache::new(&b, n);

        let profile_len = n - m + 1;
        debug!(n, m, self_join, profile_len, "constructed matrix profile engine");

        Ok(MatrixProfile {
            a,
            b,
            n,
            m,
            self_join,
            b_mean,
            b_std,
            fft,
            mp: vec![f64::INFINITY; profile_len],
            idx: vec![usize::MAX; profile_len],
        })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn m(&self) -> usize {
        self.m
    }

    pub fn is_self_join(&self) -> bool {
        self.self_join
    }

    /// The current matrix profile.
    pub fn mp(&self) -> &[f64] {
        &self.mp
    }

    /// The current matrix profile index. `usize::MAX` marks an
    /// as-yet-unassigned entry.
    pub fn idx(&self) -> &[usize] {
        &self.idx
    }

    fn profile_len(&self) -> usize {
        self.n - self.m + 1
    }

    /// MASS-form distance profile for row `idx` of `a` against `b`
    /// (SPEC_FULL §4.5). Applies the exclusion zone when self-joining.
    fn mass_distance_profile(&self, idx: usize, profile: &mut [f64]) -> Result<(), MassError> {
        if idx + self.m > self.a.len() {
            return Err(MassError::IndexOutOfRange {
                idx,
                m: self.m,
                len: self.a.len(),
            });
        }
        let q = stats::z_normalize(&self.a[idx..idx + self.m])?;
        let dot = self.fft.cross_correlate(&q);
        math::mass_distance(&dot, &self.b_std, self.m, profile)?;
        if self.self_join {
            math::apply_exclusion_zone(profile, idx, self.m / 2);
        }
        Ok(())
    }

    /// STMP: brute-force reference matrix profile (SPEC_FULL §4.7). Visits
    /// every row in order; deterministic regardless of join type.
    pub fn stmp(&mut self) -> Result<(), MassError> {
        let len = self.profile_len();
        let mut profile = vec![0.0; len];
        for row in 0..len {
            self.mass_distance_profile(row, &mut profile)?;
            for j in 0..len {
                if profile[j] <= self.mp[j] {
                    self.mp[j] = profile[j];
                    self.idx[j] = row;
                }
            }
        }
        Ok(())
    }

    /// STAMP with a caller-seeded random source (SPEC_FULL §4.8). `sample`
    /// must be in `(0, 1]`; `1.0` computes the exact matrix profile in
    /// random row order.
    pub fn stamp_with_rng(&mut self, sample: f64, rng: &mut impl rand::Rng) -> Result<(), MassError> {
        if !(sample > 0.0 && sample <= 1.0) {
            return Err(MassError::InvalidSampleRate(sample));
        }
        let len = self.profile_len();
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(rng);

        let take = ((len as f64) * sample) as usize;
        let mut profile = vec![0.0; len];
        for &row in order.iter().take(take) {
            self.mass_distance_profile(row, &mut profile)?;
            for j in 0..len {
                if profile[j] <= self.mp[j] {
                    self.mp[j] = profile[j];
                    self.idx[j] = row;
                }
            }
        }
        Ok(())
    }

    /// STAMP seeded from the thread-local RNG (SPEC_FULL §4.8). Use
    /// [`MatrixProfile::stamp_with_rng`] for reproducible runs.
    pub fn stamp(&mut self, sample: f64) -> Result<(), MassError> {
        let mut rng = rand::thread_rng();
        self.stamp_with_rng(sample, &mut rng)
    }

    /// STOMP: parallel, order-dependent self-join matrix profile
    /// (SPEC_FULL §4.9). Requires a self join. Partitions rows into
    /// `parallelism` batches, computes each with a rayon task, then folds
    /// the batch results into the global profile in batch order.
    pub fn stomp(&mut self, parallelism: usize) -> Result<(), MassError> {
        if !self.self_join {
            return Err(MassError::NotSelfJoin);
        }
        if parallelism == 0 {
            return Err(MassError::InvalidParallelism);
        }

        let total = self.profile_len();
        let batch_size = (total + parallelism - 1) / parallelism;

        let cached_dot = self.fft.cross_correlate(&self.a[..self.m]);

        let a = &self.a;
        let m = self.m;
        let n = self.n;
        let b_mean = &self.b_mean;
        let b_std = &self.b_std;
        let fft = &self.fft;

        debug!(parallelism, batch_size, total, "dispatching stomp batches");

        let results: Vec<StompBatchResult> = (0..parallelism)
            .into_par_iter()
            .map(|batch| {
                stomp_batch(batch, batch_size, total, a, m, n, b_mean, b_std, fft, &cached_dot)
            })
            .collect();

        let mut first_err: Option<MassError> = None;
        for result in results {
            if let Some(e) = result.err {
                if first_err.is_none() {
                    first_err = Some(e);
                }
                continue;
            }
            if let (Some(batch_mp), Some(batch_idx)) = (result.mp, result.idx) {
                for j in 0..batch_mp.len() {
                    if batch_mp[j] <= self.mp[j] {
                        self.mp[j] = batch_mp[j];
                        self.idx[j] = batch_idx[j];
                    }
                }
            }
        }

        debug!("stomp merge complete");
        if let Some(e) = first_err {
            return Err(e);
        }
        Ok(())
    }

    /// STAMP-update: append new observations to a self-joined series,
    /// recomputing windowed statistics and the FFT from scratch, then
    /// materializing only the new row's distance profile (SPEC_FULL
    /// §4.10). This is a Non-goal-preserving design: mean/std are
    /// recomputed on every append rather than incrementally maintained.
    pub fn stamp_update(&mut self, new_values: &[f64]) -> Result<(), MassError> {
        if !self.self_join {
            return Err(MassError::NotSelfJoin);
        }

        for &val in new_values {
            self.a.push(val);
            self.b.push(val);
            self.n += 1;
            self.mp.push(f64::INFINITY);
            self.idx.push(usize::MAX);

            let (b_mean, b_std) = stats::moving_stats(&self.b, self.m)?;
            self.b_mean = b_mean;
            self.b_std = b_std;
            self.fft = FftCache::new(&self.b, self.n);

            let new_row = self.n - self.m;
            let len = self.profile_len();
            let mut profile = vec![0.0; len];
            self.mass_distance_profile(new_row, &mut profile)?;

            let mut min_val = f64::INFINITY;
            let mut min_idx = usize::MAX;
            for j in 0..len - 1 {
                if profile[j] <= self.mp[j] {
                    self.mp[j] = profile[j];
                    self.idx[j] = new_row;
                }
                if profile[j] < min_val {
                    min_val = profile[j];
                    min_idx = j;
                }
            }
            self.mp[new_row] = min_val;
            self.idx[new_row] = min_idx;
            trace!(new_row, n = self.n, "stamp_update appended row");
        }
        Ok(())
    }

    /// Top-K motifs (SPEC_FULL §4.11). Self-join only.
    pub fn top_k_motifs(&self, k: usize, r: f64) -> Result<Vec<MotifGroup>, MassError> {
        if !self.self_join {
            return Err(MassError::NotSelfJoin);
        }

        let mut mp_current = self.mp.clone();
        let mut motifs = Vec::with_capacity(k);
        let mut prof = vec![0.0; self.profile_len()];

        for _ in 0..k {
            let min_idx = math::argmin(&mp_current);
            let motif_distance = mp_current[min_idx];
            if !motif_distance.is_finite() {
                break;
            }

            let mut motif_set = std::collections::BTreeSet::new();
            motif_set.insert(min_idx);
            motif_set.insert(self.idx[min_idx]);

            let seeds: Vec<usize> = motif_set.iter().copied().collect();
            for seed in seeds {
                self.mass_distance_profile(seed, &mut prof)?;
                for (i, &d) in prof.iter().enumerate() {
                    if d < motif_distance * r {
                        motif_set.insert(i);
                    }
                }
            }

            for &member in &motif_set {
                math::apply_exclusion_zone(&mut mp_current, member, self.m / 2);
            }

            motifs.push(MotifGroup {
                indices: motif_set.into_iter().collect(),
                min_dist: motif_distance,
            });
        }

        Ok(motifs)
    }

    /// Top-K discords (SPEC_FULL §4.12). Each discovery applies an
    /// exclusion zone of `exclusion_zone` around the found index. `+inf`
    /// entries are never selected. Caps `k` at the profile length.
    pub fn discords(&self, k: usize, exclusion_zone: usize) -> Vec<usize> {
        let mut mp_current = self.mp.clone();
        let k = k.min(mp_current.len());
        let mut discords = Vec::with_capacity(k);

        for _ in 0..k {
            let mut max_val = 0.0_f64;
            let mut max_idx = usize::MAX;
            for (j, &val) in mp_current.iter().enumerate() {
                if val.is_finite() && val > max_val {
                    max_val = val;
                    max_idx = j;
                }
            }
            if max_idx == usize::MAX {
                break;
            }
            discords.push(max_idx);
            math::apply_exclusion_zone(&mut mp_current, max_idx, exclusion_zone);
        }
        discords
    }

    /// Arc-curve segmentation (SPEC_FULL §4.13). Returns the segmentation
    /// candidate index, its normalized score, and the full histogram.
    pub fn segment(&self) -> (usize, f64, Vec<f64>) {
        crate::analysis::segment(&self.idx)
    }
}

/// One STOMP worker's contribution (SPEC_FULL §4.9 step 2): computes the
/// batch's first row via FFT, then shift-updates the dot product for
/// every subsequent row in the batch.
#[allow(clippy::too_many_arguments)]
fn stomp_batch(
    batch: usize,
    batch_size: usize,
    total: usize,
    a: &[f64],
    m: usize,
    n: usize,
    b_mean: &[f64],
    b_std: &[f64],
    fft: &FftCache,
    cached_dot: &[f64],
) -> StompBatchResult {
    let r = batch * batch_size;
    if r >= total {
        return StompBatchResult { mp: None, idx: None, err: None };
    }

    let mut dot = fft.cross_correlate(&a[r..r + m]);
    let mut profile = vec![0.0; total];
    if let Err(e) = math::stomp_distance(&dot, b_mean, b_std, m, r, &mut profile) {
        return StompBatchResult { mp: None, idx: None, err: Some(e) };
    }
    math::apply_exclusion_zone(&mut profile, r, m / 2);

    let mut result_mp = profile.clone();
    let mut result_idx = vec![r; total];

    let batch_rows = batch_size.min(total - r);
    trace!(batch, r, batch_rows, "stomp worker processing batch");

    for i in 1..batch_rows {
        for j in (1..=n - m).rev() {
            dot[j] = dot[j - 1] - a[j - 1] * a[r + i - 1] + a[j + m - 1] * a[r + i + m - 1];
        }
        dot[0] = cached_dot[r + i];

        if let Err(e) = math::stomp_distance(&dot, b_mean, b_std, m, r + i, &mut profile) {
            return StompBatchResult { mp: None, idx: None, err: Some(e) };
        }
        math::apply_exclusion_zone(&mut profile, r + i, m / 2);

        for j in 0..total {
            if profile[j] <= result_mp[j] {
                result_mp[j] = profile[j];
                result_idx[j] = r + i;
            }
        }
    }

    StompBatchResult {
        mp: Some(result_mp),
        idx: Some(result_idx),
        err: None,
    }
}

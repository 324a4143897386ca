//!
//! Matrix Profile: STMP/STAMP/STOMP self- and general-join algorithms over
//! z-normalized Euclidean distance, plus the analyses built on top of a
//! matrix profile — top-K motifs, top-K discords, and arc-curve
//! segmentation.

//! > Similarity search for time series subsequences is THE most important subroutine for time series pattern mining. Subsequence similarity search has been scaled to trillions of observations under both DTW (Dynamic Time Warping) and Euclidean distances. The key technique that makes early-abandoning search useful has a gap: it finds the single nearest match to a query, not the full distance profile against every subsequence. MASS fills that gap in O(n log n) via an FFT-based sliding dot product, independent of the data or the query.

//! > The matrix profile generalizes MASS into a self-join: the distance profile of every subsequence of a series against every other (non-trivial) subsequence of the same series, yielding a single vector from which motifs, discords and segmentation boundaries can all be read off directly.
//!
//! Excerpt of motivation adapted from:
//!
//!```markdown
//!@misc{
//!FastestSimilaritySearch,
//!title={The Fastest Similarity Search Algorithm for Time Series Subsequences under Euclidean Distance},
//!author={ Mueen, Abdullah and Zhu, Yan and Yeh, Michael and Kamgar, Kaveh and Viswanathan, Krishnamurthy and Gupta, Chetan and Keogh, Eamonn},
//!year={2017},
//!month={August},
//!note = {\url{http://www.cs.unm.edu/~mueen/FastestSimilaritySearch.html}}
//!}
//!```
//!
//! ## Modules
//!
//! - [`profile`] — the [`MatrixProfile`] engine: `try_new`, `stmp`, `stamp`,
//!   `stomp`, `stamp_update`, plus `top_k_motifs`, `discords`, `segment`.
//! - [`stats`] — windowed mean/std and z-normalization.
//! - [`math`] — the FFT sliding dot product and the two distance-profile
//!   formulas (MASS form and STOMP-incremental form).
//! - [`analysis`] — arc-curve segmentation helpers used by
//!   [`MatrixProfile::segment`](profile::MatrixProfile::segment).
//! - [`error`] — the [`MassError`] taxonomy shared by every fallible entry
//!   point.
//! - [`time_series`] — generic numeric plumbing (`TimeSeries`, `Record`,
//!   `MassType`) underlying the legacy single-query search below.
//!
//! ## Legacy single-query search
//!
//! [`mass`] and [`mass_batch`] predate the matrix-profile engine and remain
//! useful standalone utilities for a one-off query against a time series
//! that doesn't warrant standing up a full [`MatrixProfile`] (no self-join,
//! no exclusion zone — just `ts` and `query` as two independent series).
//!
//! ## Features
//!
//! `"jemalloc"` enables jemallocator as the global allocator.
//!
//! `"auto"` uses all logical cores to parallelize [`mass_batch`] and
//! [`profile::MatrixProfile::stomp`]. Enabled by default. Disabling this
//! feature exposes [`init_pool`] to initialize the global `rayon` thread
//! pool with an explicit thread count.
//!
//! ## Examples
//!
//!```
//!use matrixprofile::MatrixProfile;
//!
//!let a: Vec<f64> = (0..200).map(|t| (t as f64 * 0.3).sin()).collect();
//!let mut mp = MatrixProfile::try_new(a, None, 20).unwrap();
//!mp.stomp(2).unwrap();
//!let discords = mp.discords(1, 10);
//!dbg!(discords);
//!```
//!
//!```
//!let ts = (0..10_000).map(|i| (i as f64).sin()).collect::<Vec<f64>>();
//!let query = (0..500).map(|i| (i as f64 * 1.7).sin()).collect::<Vec<f64>>();
//!let res = matrixprofile::mass_batch(&ts[..], &query[..], 501, 3).unwrap();
//! // top_matches (only the best per batch considered): (index, distance) tuples.
//!dbg!(res);
//!```

#[cfg(all(not(target_env = "msvc"), feature = "jemallocator"))]
use jemallocator::Jemalloc;

#[cfg(all(not(target_env = "msvc"), feature = "jemallocator"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fmt::Debug;
use std::ops;

use rayon::iter::ParallelBridge;
use rayon::prelude::*;

pub mod analysis;
pub mod error;
pub mod math;
pub mod profile;
pub mod stats;
pub mod time_series;

pub use error::MassError;
pub use profile::{MatrixProfile, MotifGroup};

/// A scalar numeric observation usable by the legacy [`mass`]/[`mass_batch`]
/// search: convertible to and from `f64` so the matrix-profile math (which
/// is fixed to `f64`, per the engine's data model) can operate on it.
pub trait MassType:
    PartialOrd + From<f64> + Into<f64> + Copy + ops::Add<f64> + Debug + Default + Sync
{
}

/// compute the MASS distance and return the index and value of the minimum found.
fn min_subsequence_distance<T>(start_idx: usize, subsequence: &[T], query: &[T]) -> (usize, f64)
where
    T: MassType,
{
    let distances = mass(subsequence, query);

    //  find mininimum index of this batch which will be between 0 and batch_size
    let min_idx = math::argmin(&distances);

    // add the minimum distance found to the best distances
    let dist = distances[min_idx];

    // compute the global index
    let index = min_idx + start_idx;

    (index, dist)
}

/// Compute the distance profile for the given query over the given time
/// series (SPEC_FULL §4.14). Standalone: no self-join, no exclusion zone.
pub fn mass<T: Debug + Default>(ts: &[T], query: &[T]) -> Vec<f64>
where
    T: MassType,
{
    let ts_f: Vec<f64> = ts.iter().map(|&v| v.into()).collect();
    let query_f: Vec<f64> = query.iter().map(|&v| v.into()).collect();
    mass_f64(&ts_f, &query_f)
}

fn mass_f64(ts: &[f64], query: &[f64]) -> Vec<f64> {
    let n = ts.len();
    let m = query.len();

    debug_assert!(n >= m);

    let mu_q = stats::mean(query);
    let sigma_q = stats::std(query);

    let (ts_mean, ts_std) = stats::moving_stats(ts, m)
        .expect("mass() requires 2 <= query.len() <= ts.len()");

    let fft = math::FftCache::new(ts, n);
    let dot = fft.cross_correlate(query);

    math::mass_classic_distance(&dot, mu_q, sigma_q, &ts_mean, &ts_std, m)
}

// need to try whether chunks over logical is faster than over physical cores SMT!!
#[cfg(not(feature = "auto"))]
fn cpus() -> usize {
    num_cpus::get()
}

#[cfg(not(feature = "auto"))]
use std::sync::Once;

#[cfg(not(feature = "auto"))]
static JOBS_SET: Once = Once::new();

// Init global pool with [`jobs`] threads.
#[cfg(not(feature = "auto"))]
fn start_pool(jobs: usize) {
    assert!(jobs > 0, "Job count must be at least 1.");
    // silently use at max all available logical cpus
    let jobs = jobs.min(cpus());
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build_global()
        .unwrap();
}

/// Initialize the global `rayon` thread pool with `threads` threads. Must be
/// called before the first call to [`mass_batch`] or
/// [`profile::MatrixProfile::stomp`] to take effect; the pool is final once
/// built. Only available when the `auto` feature is disabled.
#[cfg(not(feature = "auto"))]
pub fn init_pool(threads: usize) {
    JOBS_SET.call_once(|| start_pool(threads));
}

/// Finds the top subsequence per batch with the lowest distance profile for
/// a given `query` and returns the top-K best-of-batch matches (SPEC_FULL
/// §4.14). Useful for filtering adjacent suboptimal subsequences, where a
/// local optimum overlaps with suboptima differing only by a few index
/// strides. Implements MASS V3, splitting the series into power-of-two
/// chunks computed in parallel over `rayon`. Results are partitioned, not
/// sorted; sort them afterwards if needed.
///
/// Errors: `batch_size == 0`; `top_matches == 0`; `batch_size` not greater
/// than `query.len()`; or the series too short to produce `top_matches`
/// batches.
pub fn mass_batch<T: MassType>(
    ts: &[T],
    query: &[T],
    batch_size: usize,
    top_matches: usize,
) -> Result<Vec<(usize, f64)>, MassError> {
    if batch_size == 0 {
        return Err(MassError::InvalidBatchSize(batch_size));
    }
    if top_matches == 0 {
        return Err(MassError::InvalidTopMatches(top_matches));
    }
    if batch_size <= query.len() {
        return Err(MassError::BatchSizeTooSmallForQuery {
            batch_size,
            query_len: query.len(),
        });
    }

    // TODO support nth top matches in parallel
    // consider doing full nth top matches with a partition pseudosort per thread to ensure global optima.
    let mut dists: Vec<_> = task_index(ts.len(), query.len(), batch_size)
        .into_iter()
        .par_bridge()
        .map(|(l, h)| min_subsequence_distance(l, &ts[l..=h], query))
        .collect();

    if dists.len() < top_matches {
        return Err(MassError::TooFewBatches {
            batches: dists.len(),
            top_matches,
        });
    }
    dists.select_nth_unstable_by(top_matches - 1, |x, y| x.1.partial_cmp(&(y.1)).unwrap());

    Ok(dists.into_iter().take(top_matches).collect())
}

/// Generate the index for time series slices of size batch size; Batch size may be rounded to the nearest power of two.
/// Rounding to the nearest power of two may panic! if the new batch size is greater than the time series' length.
#[inline]
fn task_index(
    ts: usize,
    query: usize,
    mut batch_size: usize,
) -> impl Iterator<Item = (usize, usize)> {
    debug_assert!(
        batch_size > query,
        "batch size must be greater than the query's length"
    );

    if !batch_size.is_power_of_two() {
        batch_size = batch_size.next_power_of_two();
    }

    debug_assert!(
        batch_size <= ts,
        "batchsize after next power of two must be less or equal than series' length"
    );
    debug_assert!(
        batch_size >= query,
        "batchsize after next power of two must be greater or equal than query's length"
    );

    let step_size = batch_size - (query - 1);

    (0..ts - query).step_by(step_size).map(move |i| (i, (ts - 1).min(i + batch_size - 1)))
}

#[cfg(test)]
pub mod tests {

    use super::*;

    #[test]
    fn usize_div() {
        assert_eq!(5usize / 2usize, 2);
    }

    // must run before any other call to [`mass_batch`] for it to pass. See [`init_pool`].
    #[test]
    #[cfg(not(feature = "auto"))]
    fn init_tpool() {
        let t = 4;
        init_pool(t);
        assert!(rayon::current_num_threads() == t);
    }

    #[test]
    #[ignore = "for manual inspection purposes"]
    fn jobs_range_0() {
        let a = task_index(6, 2, 4);
        for i in a {
            print!("{:?}\n", i);
        }
    }

    #[test]
    fn jobs_range_1() {
        let mut a = task_index(10, 4, 5);
        assert!(a.next().unwrap() == (0, 7));
        assert!(a.next().unwrap() == (5, 9));
        assert!(a.next() == None);
    }

    #[test]
    fn jobs_range_2() {
        let mut a = task_index(6, 2, 4);
        assert!(a.next().unwrap() == (0, 3));
        assert!(a.next().unwrap() == (3, 5));
        assert!(a.next() == None);
    }

    #[test]
    fn jobs_range_3() {
        let mut a = task_index(8, 2, 8);
        assert!(a.next().unwrap() == (0, 7));
        assert!(a.next() == None);
    }
    #[test]
    fn jobs_range_4() {
        let mut a = task_index(6, 3, 4);

        assert!(a.next().unwrap() == (0, 3));
        assert!(a.next().unwrap() == (2, 5));
        assert!(a.next() == None);
    }

    #[test]
    fn integration_1() {
        let a = &[10., 3., 2., 3., 4.5, 6., 0., -1.];
        let b = &[2., 3.];
        let bsize = 4;
        let c = mass_batch(a, b, bsize, 2).unwrap();
        println!("{:?}", c);
        assert!(c[0].0 == 3);
    }

    #[test]
    fn integration_2() {
        let a = &[0., 10., 20., 30., 50., 10.];
        let b = &[2., 3., 2.];
        let c = mass_batch(a, b, 4, 1).unwrap();
        assert!(c[0].0 == 3);
    }

    #[test]
    fn mass_batch_rejects_batch_size_not_greater_than_query() {
        let a = &[0., 10., 20., 30., 50., 10.];
        let b = &[2., 3., 2.];
        assert_eq!(
            mass_batch(a, b, 3, 1),
            Err(MassError::BatchSizeTooSmallForQuery {
                batch_size: 3,
                query_len: 3
            })
        );
    }

    #[test]
    fn mass_batch_rejects_too_few_batches_for_top_matches() {
        let a = &[0., 10., 20., 30., 50., 10.];
        let b = &[2., 3., 2.];
        // task_index(6, 3, 4) yields exactly 2 chunks: (0,3) and (2,5).
        assert_eq!(
            mass_batch(a, b, 4, 5),
            Err(MassError::TooFewBatches {
                batches: 2,
                top_matches: 5
            })
        );
    }
}

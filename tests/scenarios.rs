//! End-to-end scenarios and cross-cutting invariants for the matrix-profile
//! engine (SPEC_FULL §8).

use matrixprofile::MatrixProfile;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

fn sine(len: usize, period: f64) -> Vec<f64> {
    (0..len).map(|t| (2.0 * PI * (t as f64) / period).sin()).collect()
}

fn noise(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen::<f64>() * 2.0 - 1.0).collect()
}

/// Best-effort subscriber so `tracing::debug!`/`trace!` spans emitted by the
/// engine (batch dispatch, merge, stamp_update recompute) are visible when
/// these tests are run with `--nocapture`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn max_abs_diff(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// S1 — Embedded motif: a sine period repeated back-to-back self-matches
/// near-perfectly at a multiple of the period.
#[test]
fn s1_embedded_motif() {
    let half = sine(200, 20.0);
    let mut a = half.clone();
    a.extend(half);
    let m = 20;

    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stomp(2).unwrap();

    let min_val = mp.mp().iter().cloned().fold(f64::INFINITY, f64::min);
    assert!(min_val < 1e-6, "expected a near-zero matrix profile minimum, got {min_val}");

    let motifs = mp.top_k_motifs(1, 2.0).unwrap();
    assert_eq!(motifs.len(), 1);
    let group = &motifs[0];
    assert!(group.min_dist < 1e-6);
    assert!(group.indices.len() >= 2);

    // Every pairwise gap inside the motif group must respect the exclusion
    // zone, and (since the series is built from a period-20 sine repeated)
    // should land on a multiple of the period.
    for w in group.indices.windows(2) {
        let gap = w[1] - w[0];
        assert!(gap > m / 2, "motif members {} and {} violate the exclusion zone", w[0], w[1]);
        assert_eq!(gap % 20, 0, "motif gap {gap} is not a multiple of the embedded period");
    }
}

/// S2 — Pure noise: STMP and STOMP must agree on the same series.
#[test]
fn s2_pure_noise_stmp_stomp_agree() {
    let a = noise(512, 42);
    let m = 16;

    let mut stmp_engine = MatrixProfile::try_new(a.clone(), None, m).unwrap();
    stmp_engine.stmp().unwrap();

    let mut stomp_engine = MatrixProfile::try_new(a, None, m).unwrap();
    stomp_engine.stomp(4).unwrap();

    let diff = max_abs_diff(stmp_engine.mp(), stomp_engine.mp());
    assert!(diff < 1e-6, "STMP and STOMP(4) disagree by {diff}");
}

/// S3 — Streaming: STOMP over an initial series plus `stamp_update` must
/// agree with a fresh STOMP over the fully appended series.
#[test]
fn s3_streaming_matches_fresh_stomp() {
    init_tracing();
    let m = 8;
    let initial = noise(100, 7);
    let appended = noise(20, 99);

    let mut streamed = MatrixProfile::try_new(initial.clone(), None, m).unwrap();
    streamed.stomp(1).unwrap();
    streamed.stamp_update(&appended).unwrap();

    let mut full = initial;
    full.extend(appended);
    let mut fresh = MatrixProfile::try_new(full, None, m).unwrap();
    fresh.stomp(1).unwrap();

    assert_eq!(streamed.mp().len(), fresh.mp().len());
    let diff = max_abs_diff(streamed.mp(), fresh.mp());
    assert!(diff < 1e-6, "streamed and fresh matrix profiles disagree by {diff}");
}

/// S4 — Discord on a planted anomaly: a 10-sample spike should dominate the
/// discord search.
#[test]
fn s4_discord_on_planted_anomaly() {
    let mut a = sine(300, 25.0);
    for v in a.iter_mut().take(160).skip(150) {
        *v += 6.0;
    }
    let m = 10;

    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stmp().unwrap();

    let discords = mp.discords(1, 10);
    assert_eq!(discords.len(), 1);
    assert!(
        (141..=159).contains(&discords[0]),
        "expected the discord near the planted spike, got {}",
        discords[0]
    );
}

/// S5 — Segmentation: a frequency change should produce a low arc-crossing
/// score near the boundary between the two regimes.
#[test]
fn s5_segmentation_finds_regime_change() {
    let mut a = sine(200, 10.0);
    a.extend(sine(200, 30.0));
    let m = 20;

    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stomp(4).unwrap();

    let (min_idx, _min_val, histo) = mp.segment();
    assert_eq!(histo.len(), mp.mp().len());
    assert!(
        (180..=220).contains(&min_idx),
        "expected the segmentation boundary near 200, got {min_idx}"
    );
}

/// S6 — Exclusion zone: a series with an obvious adjacent near-duplicate at
/// the start must never report itself as its own trivial neighbor.
#[test]
fn s6_exclusion_zone_suppresses_trivial_matches() {
    let mut a = vec![5.0, 1.0, 5.0, 1.0]; // positions 0 and 1 nearly identical to shifted copies
    a.extend(sine(60, 13.0));
    let m = 4;

    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stmp().unwrap();

    for (i, &j) in mp.idx().iter().enumerate() {
        if j == usize::MAX {
            continue;
        }
        let gap = (i as isize - j as isize).unsigned_abs();
        assert!(gap > m / 2, "index {i} and its neighbor {j} violate the exclusion zone");
    }
}

/// Property 1/2: dimensions and distance bounds hold for any successful run.
#[test]
fn dimensions_and_bounds_hold() {
    let a = noise(150, 3);
    let m = 12;
    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stmp().unwrap();

    let expected_len = mp.n() - mp.m() + 1;
    assert_eq!(mp.mp().len(), expected_len);
    assert_eq!(mp.idx().len(), expected_len);

    let max_dist = 2.0 * (m as f64).sqrt();
    for &v in mp.mp() {
        if v.is_finite() {
            assert!((0.0..=max_dist + 1e-9).contains(&v), "distance {v} exceeds 2*sqrt(m)");
        }
    }
}

/// Property 4: STMP, STOMP (any P), and STAMP(sample=1) agree.
#[test]
fn cross_algorithm_agreement_including_stamp() {
    let a = noise(256, 11);
    let m = 16;

    let mut stmp_engine = MatrixProfile::try_new(a.clone(), None, m).unwrap();
    stmp_engine.stmp().unwrap();

    let mut stamp_engine = MatrixProfile::try_new(a, None, m).unwrap();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    stamp_engine.stamp_with_rng(1.0, &mut rng).unwrap();

    let diff = max_abs_diff(stmp_engine.mp(), stamp_engine.mp());
    assert!(diff < 1e-6, "STMP and STAMP(sample=1) disagree by {diff}");
}

/// Property 5: STOMP is deterministic for a fixed (a, m, P).
#[test]
fn stomp_is_deterministic() {
    let a = noise(200, 21);
    let m = 10;

    let mut run1 = MatrixProfile::try_new(a.clone(), None, m).unwrap();
    run1.stomp(3).unwrap();
    let mut run2 = MatrixProfile::try_new(a, None, m).unwrap();
    run2.stomp(3).unwrap();

    assert_eq!(run1.mp(), run2.mp());
    assert_eq!(run1.idx(), run2.idx());
}

/// Property 6: the top motif pair is symmetric.
#[test]
fn motif_symmetry_holds() {
    let half = sine(150, 15.0);
    let mut a = half.clone();
    a.extend(half);
    let m = 15;

    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stomp(2).unwrap();

    let i = matrixprofile::math::argmin(mp.mp());
    let j = mp.idx()[i];
    assert_ne!(j, usize::MAX);
    assert!((mp.mp()[i] - mp.mp()[j]).abs() < 1e-6);
    assert_eq!(mp.idx()[j], i);
}

/// Property 7: discords come back in non-increasing order of distance.
#[test]
fn discord_ordering_is_non_increasing() {
    let a = noise(200, 17);
    let m = 10;
    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stmp().unwrap();

    let discords = mp.discords(5, 10);
    let dists: Vec<f64> = discords.iter().map(|&i| mp.mp()[i]).collect();
    for w in dists.windows(2) {
        assert!(w[0] >= w[1], "discord distances out of order: {dists:?}");
    }
}

/// Property 8: the segmentation candidate is never an endpoint.
#[test]
fn segmentation_never_picks_an_endpoint() {
    let mut a = sine(100, 9.0);
    a.extend(sine(100, 27.0));
    let m = 12;
    let mut mp = MatrixProfile::try_new(a, None, m).unwrap();
    mp.stmp().unwrap();

    let (min_idx, _, histo) = mp.segment();
    assert_ne!(min_idx, 0);
    assert_ne!(min_idx, histo.len() - 1);
}

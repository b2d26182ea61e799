//! Sparse drivers against the dense reference and on restricted supports.

use std::sync::Arc;

use revsample::{
    sweep_dense, sweep_sparse, sweep_sparse_fast, CountMatrix, ReversibleSample, SamplerConfig,
    SamplerError, SparseCounts, SparseReversibleSampler, SparseSample, SparseTopology,
};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

fn counts_4x4() -> CountMatrix {
    CountMatrix::from_rows(&[
        vec![5.0, 3.0, 1.0, 2.0],
        vec![2.0, 8.0, 4.0, 1.0],
        vec![1.0, 3.0, 6.0, 2.0],
        vec![3.0, 1.0, 2.0, 7.0],
    ])
    .unwrap()
}

/// Birth-death chain: only neighbours and self-transitions are observed.
fn tridiagonal(n: usize) -> (Arc<SparseTopology>, SparseCounts) {
    let mut triplets = Vec::new();
    for i in 0..n {
        triplets.push((i, i, 4.0));
        if i + 1 < n {
            triplets.push((i, i + 1, 3.0 + i as f64));
            triplets.push((i + 1, i, 2.0));
        }
    }
    let pairs: Vec<(usize, usize)> = triplets.iter().map(|&(i, j, _)| (i, j)).collect();
    let topology = Arc::new(SparseTopology::from_pairs(n, &pairs).unwrap());
    let counts = SparseCounts::from_triplets(&topology, &triplets).unwrap();
    (topology, counts)
}

#[test]
fn full_topology_reproduces_dense_run() {
    let counts = counts_4x4();
    let config = SamplerConfig::default();
    let topology = Arc::new(SparseTopology::full(4).unwrap());
    let sparse_counts = counts.restrict(&topology).unwrap();

    let mut dense = ReversibleSample::from_counts(&counts).unwrap();
    let mut sparse = SparseSample::from_counts(Arc::clone(&topology), &sparse_counts).unwrap();

    let mut rng_dense = ChaCha20Rng::seed_from_u64(99);
    let mut rng_sparse = ChaCha20Rng::seed_from_u64(99);

    for _ in 0..25 {
        let a = sweep_dense(&mut dense, &counts, &config, 4, &mut rng_dense).unwrap();
        let b = sweep_sparse(&mut sparse, &sparse_counts, &config, 4, &mut rng_sparse).unwrap();
        assert_eq!(a, b, "proposal statistics diverged");

        let p = dense.transition_matrix();
        let q = sparse.transition_matrix();
        for (x, y) in p.as_slice().iter().zip(q.as_slice()) {
            assert!((x - y).abs() < 1e-12, "dense {x} vs sparse {y}");
        }
    }
}

#[test]
fn instrumented_driver_reports_proposals() {
    let (topology, counts) = tridiagonal(6);
    let mut sample = SparseSample::from_counts(topology, &counts).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(12);

    let stats = sweep_sparse(&mut sample, &counts, &SamplerConfig::default(), 50, &mut rng).unwrap();

    // 5 edges and 6 diagonal entries per sweep
    assert_eq!(stats.proposed, 50 * 11);
    assert!(stats.accepted > 0);
}

#[test]
fn fast_driver_keeps_reversibility_and_support() {
    let n = 7;
    let (topology, counts) = tridiagonal(n);
    let mut sample = SparseSample::from_counts(Arc::clone(&topology), &counts).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(8080);
    let config = SamplerConfig::default();

    for _ in 0..100 {
        sweep_sparse_fast(&mut sample, &counts, &config, 3, &mut rng);

        let p = sample.transition_matrix();
        assert!(p.validate(1e-9).is_ok());
        assert!(p.is_reversible(&sample.stationary_weights(), 1e-12));
        for i in 0..n {
            for j in 0..n {
                if topology.find(i, j).is_none() {
                    assert_eq!(p.get(i, j), 0.0, "mass leaked to ({i}, {j})");
                }
            }
        }
    }
}

#[test]
fn fast_and_instrumented_agree_in_distribution() {
    let (topology, counts) = tridiagonal(3);
    let config = SamplerConfig::default();
    let k = topology.find(0, 1).unwrap();

    let mut slow = SparseSample::from_counts(Arc::clone(&topology), &counts).unwrap();
    let mut fast = SparseSample::from_counts(Arc::clone(&topology), &counts).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(4242);

    let (mut mean_slow, mut mean_fast) = (0.0, 0.0);
    let draws = 20_000;
    for _ in 0..draws {
        sweep_sparse(&mut slow, &counts, &config, 1, &mut rng).unwrap();
        sweep_sparse_fast(&mut fast, &counts, &config, 1, &mut rng);
        mean_slow += slow.transition_values()[k];
        mean_fast += fast.transition_values()[k];
    }
    mean_slow /= draws as f64;
    mean_fast /= draws as f64;
    assert!(
        (mean_slow - mean_fast).abs() < 0.02,
        "instrumented mean {mean_slow:.4} vs fast mean {mean_fast:.4}"
    );
}

#[test]
fn cached_row_sums_match_flux() {
    let (topology, counts) = tridiagonal(5);
    let mut sample = SparseSample::from_counts(Arc::clone(&topology), &counts).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(5);
    let config = SamplerConfig::default().with_renormalize_every(1_000_000);

    sweep_sparse_fast(&mut sample, &counts, &config, 500, &mut rng);

    let mut fresh = vec![0.0; topology.n()];
    for (k, &v) in sample.flux().iter().enumerate() {
        fresh[topology.rows()[k]] += v;
    }
    for (i, &s) in fresh.iter().enumerate() {
        assert!((sample.row_sums().get(i) - s).abs() < 1e-9);
    }
}

#[test]
fn mismatched_counts_are_rejected() {
    let (topology, counts) = tridiagonal(4);
    let (_, other) = tridiagonal(5);
    let mut sample = SparseSample::from_counts(topology, &counts).unwrap();
    let mut rng = ChaCha20Rng::seed_from_u64(0);

    let err = sweep_sparse(&mut sample, &other, &SamplerConfig::default(), 1, &mut rng);
    assert!(matches!(err, Err(SamplerError::LengthMismatch { .. })));
}

#[test]
fn fast_driver_fills_counted_empty_edges_without_gamma_proposals() {
    let topology = Arc::new(SparseTopology::full(3).unwrap());
    let counts = CountMatrix::new(3, vec![3.0; 9]).unwrap().restrict(&topology).unwrap();
    // π X for π = [.25, .5, .25] on a birth-death chain
    let flux = topology.gather(&[0.125, 0.125, 0.0, 0.125, 0.25, 0.125, 0.0, 0.125, 0.125]);
    let mut sample = SparseSample::from_flux(Arc::clone(&topology), flux).unwrap();
    let k = topology.find(0, 2).unwrap();
    let config = SamplerConfig::default()
        .with_gamma_proposal(false)
        .with_renormalize_every(0);
    let mut rng = ChaCha20Rng::seed_from_u64(2002);

    sweep_sparse_fast(&mut sample, &counts, &config, 200, &mut rng);

    assert!(sample.flux()[k] > 0.0, "edge (0, 2) stuck at zero");
    assert_eq!(sample.flux()[k], sample.flux()[topology.transpose(k)]);
    assert!(sample.transition_matrix().validate(1e-9).is_ok());
}

#[test]
fn fast_sampler_reports_untracked_stats() {
    let (topology, counts) = tridiagonal(4);
    let config = SamplerConfig::default();

    let mut fast = SparseReversibleSampler::new(Arc::clone(&topology), counts.clone(), config.clone(), 1)
        .unwrap()
        .with_fast_sweeps(true);
    fast.update(10);
    assert!(!fast.tracks_stats());
    assert_eq!(fast.stats().proposed, 0);

    let mut slow = SparseReversibleSampler::new(topology, counts, config, 1).unwrap();
    slow.update(10);
    assert!(slow.tracks_stats());
    assert!(slow.stats().proposed > 0);
}

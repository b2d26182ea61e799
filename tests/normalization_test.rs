//! Row sums and normalization over dense and sparse layouts.

use revsample::{
    normalize_all, normalize_all_sparse, sum_all, sum_row, RowSums, SparseTopology,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn random_matrix(rng: &mut impl Rng, n: usize) -> Vec<f64> {
    (0..n * n).map(|_| rng.gen_range(0.01..5.0)).collect()
}

#[test]
fn row_sums_add_up_to_grand_total() {
    let mut rng = ChaCha20Rng::seed_from_u64(0xC0FFEE);
    for n in 1..8 {
        let x = random_matrix(&mut rng, n);
        let by_row: f64 = (0..n).map(|i| sum_row(&x, n, i)).sum();
        let total = sum_all(&x, n);
        assert!(
            (by_row - total).abs() < 1e-10 * total,
            "n={n}: rows give {by_row}, total {total}"
        );
    }
}

#[test]
fn normalization_is_idempotent() {
    let mut rng = ChaCha20Rng::seed_from_u64(17);
    let n = 6;
    let mut once = random_matrix(&mut rng, n);
    normalize_all(&mut once, n);
    let mut twice = once.clone();
    normalize_all(&mut twice, n);

    for (a, b) in once.iter().zip(&twice) {
        assert!((a - b).abs() < 1e-12);
    }
    for i in 0..n {
        assert!((sum_row(&once, n, i) - 1.0).abs() < 1e-12);
    }
}

#[test]
fn single_state_normalizes_to_one() {
    let mut x = vec![0.37];
    normalize_all(&mut x, 1);
    assert_eq!(x, vec![1.0]);
}

#[test]
fn sparse_normalization_matches_dense_on_full_support() {
    let mut rng = ChaCha20Rng::seed_from_u64(99);
    let n = 5;
    let dense = random_matrix(&mut rng, n);
    let topology = SparseTopology::full(n).unwrap();

    let mut values = topology.gather(&dense);
    normalize_all_sparse(&mut values, topology.rows(), n);
    let mut expected = dense.clone();
    normalize_all(&mut expected, n);

    for (a, b) in topology.scatter(&values).iter().zip(&expected) {
        assert!((a - b).abs() < 1e-12);
    }
}

#[test]
fn sparse_normalization_only_sees_listed_entries() {
    // Tridiagonal support of a 4-state chain.
    let mut pairs = Vec::new();
    for i in 0..4usize {
        pairs.push((i, i));
        if i + 1 < 4 {
            pairs.push((i, i + 1));
            pairs.push((i + 1, i));
        }
    }
    let topology = SparseTopology::from_pairs(4, &pairs).unwrap();
    let mut values: Vec<f64> = (1..=topology.n_idx()).map(|k| k as f64).collect();
    topology.normalize(&mut values);

    let sums = RowSums::from_sparse(&values, topology.rows(), 4);
    for i in 0..4 {
        assert!((sums.get(i) - 1.0).abs() < 1e-12, "row {i} sums to {}", sums.get(i));
    }
    let dense = topology.scatter(&values);
    assert_eq!(dense[3], 0.0);
    assert_eq!(dense[12], 0.0);
}

//! Observed transition counts, validated once per run.

use crate::error::SamplerError;
use crate::matrix::{sum_row, RowSums};
use crate::topology::SparseTopology;

/// Validate a flat row-major buffer as an n×n matrix of finite,
/// non-negative values.
pub(crate) fn check_nonnegative(values: &[f64], n: usize) -> Result<(), SamplerError> {
    if n == 0 {
        return Err(SamplerError::EmptyMatrix);
    }
    if values.len() != n * n {
        return Err(SamplerError::NotSquare { len: values.len(), n });
    }
    for (k, &v) in values.iter().enumerate() {
        let (row, col) = (k / n, k % n);
        if !v.is_finite() {
            return Err(SamplerError::NonFiniteEntry { row, col });
        }
        if v < 0.0 {
            return Err(SamplerError::NegativeEntry { row, col, value: v });
        }
    }
    Ok(())
}

/// Flatten row vectors into a row-major buffer, checking they form a square.
pub(crate) fn flatten_rows(rows: &[Vec<f64>]) -> Result<(usize, Vec<f64>), SamplerError> {
    let n = rows.len();
    let mut flat = Vec::with_capacity(n * n);
    for row in rows {
        if row.len() != n {
            return Err(SamplerError::DimensionMismatch {
                expected: n,
                got: row.len(),
            });
        }
        flat.extend_from_slice(row);
    }
    Ok((n, flat))
}

/// Dense count matrix `C` with cached row sums `sumC`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountMatrix {
    n: usize,
    counts: Vec<f64>,
    row_sums: RowSums,
}

impl CountMatrix {
    /// Build from a row-major buffer of length n².
    pub fn new(n: usize, counts: Vec<f64>) -> Result<Self, SamplerError> {
        check_nonnegative(&counts, n)?;
        let row_sums = RowSums::from_dense(&counts, n);
        Ok(Self { n, counts, row_sums })
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SamplerError> {
        let (n, flat) = flatten_rows(rows)?;
        Self::new(n, flat)
    }

    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.counts[i * self.n + j]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.counts
    }

    pub fn row_sums(&self) -> &RowSums {
        &self.row_sums
    }

    /// Total number of observed transitions.
    pub fn total(&self) -> f64 {
        (0..self.n).map(|i| sum_row(&self.counts, self.n, i)).sum()
    }

    /// Counts on the sparse support; counts outside it are dropped.
    pub fn restrict(&self, topology: &SparseTopology) -> Result<SparseCounts, SamplerError> {
        if topology.n() != self.n {
            return Err(SamplerError::DimensionMismatch {
                expected: self.n,
                got: topology.n(),
            });
        }
        SparseCounts::new(topology, topology.gather(&self.counts))
    }
}

/// Counts aligned with a [`SparseTopology`], with their row sums.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseCounts {
    values: Vec<f64>,
    row_sums: RowSums,
}

impl SparseCounts {
    pub fn new(topology: &SparseTopology, values: Vec<f64>) -> Result<Self, SamplerError> {
        topology.check_len(&values)?;
        for (k, &v) in values.iter().enumerate() {
            let (row, col) = (topology.rows()[k], topology.cols()[k]);
            if !v.is_finite() {
                return Err(SamplerError::NonFiniteEntry { row, col });
            }
            if v < 0.0 {
                return Err(SamplerError::NegativeEntry { row, col, value: v });
            }
        }
        let row_sums = RowSums::from_sparse(&values, topology.rows(), topology.n());
        Ok(Self { values, row_sums })
    }

    /// Build from (row, col, count) triplets; unlisted coordinates count zero.
    pub fn from_triplets(
        topology: &SparseTopology,
        triplets: &[(usize, usize, f64)],
    ) -> Result<Self, SamplerError> {
        let mut values = vec![0.0; topology.n_idx()];
        for &(row, col, c) in triplets {
            let k = topology
                .find(row, col)
                .ok_or(SamplerError::NotInTopology { row, col })?;
            values[k] += c;
        }
        Self::new(topology, values)
    }

    #[inline(always)]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn row_sums(&self) -> &RowSums {
        &self.row_sums
    }

    /// Number of states covered by the row sums.
    pub fn n(&self) -> usize {
        self.row_sums.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caches_row_sums() {
        let c = CountMatrix::from_rows(&[vec![1.0, 3.0], vec![2.0, 0.0]]).unwrap();
        assert_eq!(c.row_sums().as_slice(), &[4.0, 2.0]);
        assert_eq!(c.total(), 6.0);
    }

    #[test]
    fn rejects_ragged_rows() {
        let err = CountMatrix::from_rows(&[vec![1.0, 3.0], vec![2.0]]);
        assert_eq!(
            err,
            Err(SamplerError::DimensionMismatch { expected: 2, got: 1 })
        );
    }

    #[test]
    fn rejects_negative_counts() {
        let err = CountMatrix::new(2, vec![1.0, -1.0, 0.0, 1.0]);
        assert!(matches!(
            err,
            Err(SamplerError::NegativeEntry { row: 0, col: 1, .. })
        ));
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(CountMatrix::new(0, vec![]), Err(SamplerError::EmptyMatrix));
    }

    #[test]
    fn restrict_drops_unlisted_counts() {
        let c = CountMatrix::from_rows(&[
            vec![1.0, 2.0, 5.0],
            vec![2.0, 1.0, 0.0],
            vec![5.0, 0.0, 1.0],
        ])
        .unwrap();
        let t = SparseTopology::from_pairs(3, &[(0, 0), (0, 1), (1, 0), (1, 1), (2, 2)]).unwrap();
        let sparse = c.restrict(&t).unwrap();
        assert_eq!(sparse.values(), &[1.0, 2.0, 2.0, 1.0, 1.0]);
        assert_eq!(sparse.row_sums().as_slice(), &[3.0, 3.0, 1.0]);
    }

    #[test]
    fn triplets_outside_support_fail() {
        let t = SparseTopology::from_pairs(2, &[(0, 0), (1, 1)]).unwrap();
        assert!(SparseCounts::from_triplets(&t, &[(0, 1, 2.0)]).is_err());
    }
}

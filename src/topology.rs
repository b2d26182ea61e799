//! Immutable coordinate structure for sparse sampling.

use std::ops::Range;

use crate::error::SamplerError;
use crate::matrix::normalize_all_sparse;

/// CSR-style row offsets for a coordinate list grouped by row.
///
/// Row `i` owns entries `offsets[i]..offsets[i + 1]`. `rows` must be
/// non-decreasing and every entry must be `< n`.
pub fn generate_row_indexes(rows: &[usize], n: usize) -> Vec<usize> {
    debug_assert!(rows.windows(2).all(|w| w[0] <= w[1]));
    let mut offsets = vec![0usize; n + 1];
    for &r in rows {
        offsets[r + 1] += 1;
    }
    for i in 0..n {
        offsets[i + 1] += offsets[i];
    }
    offsets
}

/// The allowed (row, col) pairs of a sparse sampling run.
///
/// Entries are stored sorted by row, then column. Every (i, j) has a
/// matching (j, i), whose position is cached in the transpose map. Built
/// once per run and only read afterwards, so it can be shared between
/// chains behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseTopology {
    n: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    row_offsets: Vec<usize>,
    transpose: Vec<usize>,
}

impl SparseTopology {
    /// Build from parallel row / column arrays in any order.
    pub fn new(n: usize, rows: &[usize], cols: &[usize]) -> Result<Self, SamplerError> {
        if n == 0 {
            return Err(SamplerError::EmptyMatrix);
        }
        if rows.len() != cols.len() {
            return Err(SamplerError::LengthMismatch {
                expected: rows.len(),
                got: cols.len(),
            });
        }

        let mut pairs: Vec<(usize, usize)> = Vec::with_capacity(rows.len());
        for (&row, &col) in rows.iter().zip(cols) {
            if row >= n || col >= n {
                return Err(SamplerError::IndexOutOfRange { row, col, n });
            }
            pairs.push((row, col));
        }
        pairs.sort_unstable();
        if let Some(w) = pairs.windows(2).find(|w| w[0] == w[1]) {
            return Err(SamplerError::DuplicateCoordinate {
                row: w[0].0,
                col: w[0].1,
            });
        }

        let rows: Vec<usize> = pairs.iter().map(|p| p.0).collect();
        let cols: Vec<usize> = pairs.iter().map(|p| p.1).collect();
        let row_offsets = generate_row_indexes(&rows, n);

        let mut topology = Self {
            n,
            rows,
            cols,
            row_offsets,
            transpose: Vec::new(),
        };
        let mut transpose = Vec::with_capacity(topology.n_idx());
        for k in 0..topology.n_idx() {
            let (i, j) = (topology.rows[k], topology.cols[k]);
            match topology.find(j, i) {
                Some(t) => transpose.push(t),
                None => return Err(SamplerError::MissingTranspose { row: i, col: j }),
            }
        }
        topology.transpose = transpose;
        Ok(topology)
    }

    /// Build from a list of (row, col) pairs.
    pub fn from_pairs(n: usize, pairs: &[(usize, usize)]) -> Result<Self, SamplerError> {
        let rows: Vec<usize> = pairs.iter().map(|p| p.0).collect();
        let cols: Vec<usize> = pairs.iter().map(|p| p.1).collect();
        Self::new(n, &rows, &cols)
    }

    /// Every pair of an n-state space.
    pub fn full(n: usize) -> Result<Self, SamplerError> {
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (0..n).map(move |j| (i, j)))
            .collect();
        Self::from_pairs(n, &pairs)
    }

    /// Nonzero pattern of `x + xᵀ` for a dense row-major matrix, plus the
    /// diagonal.
    pub fn from_dense_pattern(x: &[f64], n: usize) -> Result<Self, SamplerError> {
        if x.len() != n * n {
            return Err(SamplerError::NotSquare { len: x.len(), n });
        }
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in 0..n {
                if i == j || x[i * n + j] + x[j * n + i] > 0.0 {
                    pairs.push((i, j));
                }
            }
        }
        Self::from_pairs(n, &pairs)
    }

    /// Number of states.
    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of stored coordinates.
    #[inline(always)]
    pub fn n_idx(&self) -> usize {
        self.rows.len()
    }

    #[inline(always)]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    pub fn row_offsets(&self) -> &[usize] {
        &self.row_offsets
    }

    /// Entry positions owned by row `i`.
    #[inline(always)]
    pub fn row(&self, i: usize) -> Range<usize> {
        self.row_offsets[i]..self.row_offsets[i + 1]
    }

    /// Position of (j, i) for the entry at position `k` = (i, j).
    #[inline(always)]
    pub fn transpose(&self, k: usize) -> usize {
        self.transpose[k]
    }

    /// Position of (i, j), if listed.
    pub fn find(&self, i: usize, j: usize) -> Option<usize> {
        let range = self.row(i);
        let start = range.start;
        self.cols[range].binary_search(&j).ok().map(|p| start + p)
    }

    /// Pick the listed entries out of a dense row-major matrix.
    pub fn gather(&self, dense: &[f64]) -> Vec<f64> {
        self.rows
            .iter()
            .zip(&self.cols)
            .map(|(&i, &j)| dense[i * self.n + j])
            .collect()
    }

    /// Expand aligned values into a dense row-major matrix, zeros elsewhere.
    pub fn scatter(&self, values: &[f64]) -> Vec<f64> {
        let mut dense = vec![0.0; self.n * self.n];
        for (k, &v) in values.iter().enumerate() {
            dense[self.rows[k] * self.n + self.cols[k]] = v;
        }
        dense
    }

    /// Row-normalize aligned values over the sparse support.
    pub fn normalize(&self, values: &mut [f64]) {
        normalize_all_sparse(values, &self.rows, self.n);
    }

    /// Check that `values` is aligned with this topology.
    pub fn check_len(&self, values: &[f64]) -> Result<(), SamplerError> {
        if values.len() != self.n_idx() {
            return Err(SamplerError::LengthMismatch {
                expected: self.n_idx(),
                got: values.len(),
            });
        }
        Ok(())
    }
}

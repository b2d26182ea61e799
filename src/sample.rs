//! The working sample of a reversible chain and its immutable snapshots.

use std::fmt;

use crate::counts::{check_nonnegative, flatten_rows, CountMatrix};
use crate::error::SamplerError;
use crate::matrix::{normalize_all, print_matrix, sum_all, RowSums};

/// Relative tolerance when accepting a supplied flux as symmetric.
const SYMMETRY_TOL: f64 = 1e-10;

/// A row-stochastic transition matrix handed out as a finished sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionMatrix {
    n: usize,
    probs: Vec<f64>,
}

impl TransitionMatrix {
    /// Build from a row-major buffer, checking it is row-stochastic to 1e-9.
    pub fn new(n: usize, probs: Vec<f64>) -> Result<Self, SamplerError> {
        check_nonnegative(&probs, n)?;
        let matrix = Self { n, probs };
        matrix.validate(1e-9)?;
        Ok(matrix)
    }

    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, SamplerError> {
        let (n, flat) = flatten_rows(rows)?;
        Self::new(n, flat)
    }

    pub(crate) fn from_probs(n: usize, probs: Vec<f64>) -> Self {
        Self { n, probs }
    }

    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    #[inline(always)]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.probs[i * self.n + j]
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.probs[i * self.n..(i + 1) * self.n]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.probs
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.probs
    }

    /// Check that every entry is finite and in [0, 1] and every row sums to
    /// 1 within `tol`.
    pub fn validate(&self, tol: f64) -> Result<(), SamplerError> {
        for i in 0..self.n {
            let mut sum = 0.0;
            for (j, &p) in self.row(i).iter().enumerate() {
                if !p.is_finite() {
                    return Err(SamplerError::NonFiniteEntry { row: i, col: j });
                }
                if p < 0.0 {
                    return Err(SamplerError::NegativeEntry {
                        row: i,
                        col: j,
                        value: p,
                    });
                }
                sum += p;
            }
            if (sum - 1.0).abs() > tol {
                return Err(SamplerError::NotStochastic { row: i, sum });
            }
        }
        Ok(())
    }

    /// Detailed balance `π_i X_ij == π_j X_ji` for every pair, within `tol`.
    pub fn is_reversible(&self, pi: &[f64], tol: f64) -> bool {
        if pi.len() != self.n {
            return false;
        }
        for i in 0..self.n {
            for j in (i + 1)..self.n {
                if (pi[i] * self.get(i, j) - pi[j] * self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }
}

impl fmt::Display for TransitionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Vec::new();
        print_matrix(&self.probs, self.n, &mut buf).map_err(|_| fmt::Error)?;
        f.write_str(&String::from_utf8_lossy(&buf))
    }
}

/// Mutable state of a dense reversible chain.
///
/// Holds the symmetric flux `W[i][j] = π_i X[i][j]` and its row sums. The
/// transition matrix is `W[i][j] / sumX[i]` and the stationary weights are
/// the normalized row sums, so every state the drivers leave behind is
/// reversible and row-stochastic. Sweeps take it by `&mut`; finished samples
/// leave as [`TransitionMatrix`] copies.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversibleSample {
    n: usize,
    flux: Vec<f64>,
    row_sums: RowSums,
}

impl ReversibleSample {
    /// Start from a symmetric non-negative flux, rescaled to unit mass.
    pub fn from_flux(n: usize, mut flux: Vec<f64>) -> Result<Self, SamplerError> {
        check_nonnegative(&flux, n)?;
        for i in 0..n {
            for j in (i + 1)..n {
                let (forward, backward) = (flux[i * n + j], flux[j * n + i]);
                if (forward - backward).abs() > SYMMETRY_TOL * forward.max(backward) {
                    return Err(SamplerError::NotSymmetric {
                        row: i,
                        col: j,
                        forward,
                        backward,
                    });
                }
                let mean = 0.5 * (forward + backward);
                flux[i * n + j] = mean;
                flux[j * n + i] = mean;
            }
        }

        let row_sums = RowSums::from_dense(&flux, n);
        if let Some(row) = (0..n).find(|&i| row_sums.get(i) <= 0.0) {
            return Err(SamplerError::ZeroRowSum { row });
        }

        let mut sample = Self { n, flux, row_sums };
        sample.rescale();
        Ok(sample)
    }

    /// Start from a reversible transition matrix and its stationary weights.
    pub fn from_transition_matrix(
        matrix: &TransitionMatrix,
        pi: &[f64],
    ) -> Result<Self, SamplerError> {
        let n = matrix.n();
        if pi.len() != n {
            return Err(SamplerError::LengthMismatch {
                expected: n,
                got: pi.len(),
            });
        }
        let flux = (0..n * n).map(|k| pi[k / n] * matrix.as_slice()[k]).collect();
        Self::from_flux(n, flux)
    }

    /// Start from the symmetrized counts `C + Cᵀ`.
    pub fn from_counts(counts: &CountMatrix) -> Result<Self, SamplerError> {
        let n = counts.n();
        let flux = (0..n * n)
            .map(|k| {
                let (i, j) = (k / n, k % n);
                counts.get(i, j) + counts.get(j, i)
            })
            .collect();
        Self::from_flux(n, flux)
    }

    #[inline(always)]
    pub fn n(&self) -> usize {
        self.n
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn row_sums(&self) -> &RowSums {
        &self.row_sums
    }

    /// Split borrow for the sweep drivers.
    #[inline(always)]
    pub(crate) fn parts_mut(&mut self) -> (&mut [f64], &mut RowSums) {
        (&mut self.flux, &mut self.row_sums)
    }

    /// Row-normalized copy of the flux.
    pub fn transition_matrix(&self) -> TransitionMatrix {
        let mut probs = self.flux.clone();
        normalize_all(&mut probs, self.n);
        TransitionMatrix::from_probs(self.n, probs)
    }

    /// Stationary weights of the current transition matrix.
    pub fn stationary_weights(&self) -> Vec<f64> {
        let total = self.row_sums.total();
        self.row_sums.as_slice().iter().map(|s| s / total).collect()
    }

    /// Scale the flux to unit total mass.
    pub fn rescale(&mut self) {
        let total = sum_all(&self.flux, self.n);
        let factor = 1.0 / total;
        for v in &mut self.flux {
            *v *= factor;
        }
        self.row_sums.scale(factor);
    }

    /// Rebuild the cached row sums and return the largest error they had.
    pub fn repair_row_sums(&mut self) -> f64 {
        let fresh = RowSums::from_dense(&self.flux, self.n);
        let drift = self.row_sums.max_drift(&fresh);
        self.row_sums = fresh;
        drift
    }
}

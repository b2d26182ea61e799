//! Row bookkeeping and normalization for flat row-major matrices.

use std::io::{self, Write};

/// Σ_j X[i][j] for a dense row-major n×n matrix.
#[inline]
pub fn sum_row(x: &[f64], n: usize, i: usize) -> f64 {
    x[i * n..(i + 1) * n].iter().sum()
}

/// Σ_ij X[i][j] for a dense row-major n×n matrix.
pub fn sum_all(x: &[f64], n: usize) -> f64 {
    x[..n * n].iter().sum()
}

/// Divide every row by its sum, in place.
///
/// A row with zero sum turns into NaN; callers guarantee every row has
/// positive mass.
pub fn normalize_all(x: &mut [f64], n: usize) {
    for row in x[..n * n].chunks_exact_mut(n) {
        let s: f64 = row.iter().sum();
        for v in row.iter_mut() {
            *v /= s;
        }
    }
}

/// Row-normalize the values of a coordinate-list matrix.
///
/// `rows[k]` is the owning row of `x[k]`. Entries need not be grouped by
/// row. Only listed entries take part in the row sums.
pub fn normalize_all_sparse(x: &mut [f64], rows: &[usize], n: usize) {
    debug_assert_eq!(x.len(), rows.len());
    let mut sums = vec![0.0; n];
    for (&v, &r) in x.iter().zip(rows) {
        sums[r] += v;
    }
    for (v, &r) in x.iter_mut().zip(rows) {
        *v /= sums[r];
    }
}

/// Write a dense matrix as whitespace-separated rows.
pub fn print_matrix<W: Write>(x: &[f64], n: usize, out: &mut W) -> io::Result<()> {
    for row in x[..n * n].chunks_exact(n) {
        let mut first = true;
        for v in row {
            if !first {
                write!(out, " ")?;
            }
            write!(out, "{v:.6}")?;
            first = false;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Cached row sums of the working flux (`sumX`).
///
/// Kept in step with the flux by the sweep drivers, one O(1) update per
/// accepted edge. [`RowSums::max_drift`] and a fresh rebuild repair the
/// floating-point error that accumulates over long runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RowSums {
    sums: Vec<f64>,
}

impl RowSums {
    /// Row sums of a dense row-major matrix.
    pub fn from_dense(x: &[f64], n: usize) -> Self {
        Self {
            sums: (0..n).map(|i| sum_row(x, n, i)).collect(),
        }
    }

    /// Row sums of a coordinate-list matrix.
    pub fn from_sparse(x: &[f64], rows: &[usize], n: usize) -> Self {
        let mut sums = vec![0.0; n];
        for (&v, &r) in x.iter().zip(rows) {
            sums[r] += v;
        }
        Self { sums }
    }

    /// Number of rows.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    /// True for a zero-state matrix.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }

    #[inline(always)]
    pub fn get(&self, i: usize) -> f64 {
        self.sums[i]
    }

    #[inline(always)]
    pub fn set(&mut self, i: usize, value: f64) {
        self.sums[i] = value;
    }

    /// Σ_i sumX[i].
    pub fn total(&self) -> f64 {
        self.sums.iter().sum()
    }

    /// Multiply every cached sum by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for s in &mut self.sums {
            *s *= factor;
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.sums
    }

    /// Largest absolute difference between the cache and `fresh`.
    pub fn max_drift(&self, fresh: &RowSums) -> f64 {
        self.sums
            .iter()
            .zip(&fresh.sums)
            .map(|(a, b)| (a - b).abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_and_total_sums_agree() {
        let x = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];
        let by_row: f64 = (0..3).map(|i| sum_row(&x, 3, i)).sum();
        assert!((by_row - sum_all(&x, 3)).abs() < 1e-12);
    }

    #[test]
    fn normalize_single_state() {
        let mut x = [7.5];
        normalize_all(&mut x, 1);
        assert_eq!(x, [1.0]);
    }

    #[test]
    fn sparse_normalization_ignores_row_order() {
        let mut x = [1.0, 2.0, 3.0, 1.0];
        let rows = [1, 0, 1, 0];
        normalize_all_sparse(&mut x, &rows, 2);
        assert!((x[0] - 0.25).abs() < 1e-12);
        assert!((x[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((x[2] - 0.75).abs() < 1e-12);
        assert!((x[3] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn print_matrix_layout() {
        let mut out = Vec::new();
        print_matrix(&[0.5, 0.5, 0.25, 0.75], 2, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "0.500000 0.500000\n0.250000 0.750000\n");
    }

    #[test]
    fn drift_against_fresh_sums() {
        let x = [1.0, 1.0, 2.0, 2.0];
        let mut cached = RowSums::from_dense(&x, 2);
        cached.set(1, 4.5);
        let fresh = RowSums::from_dense(&x, 2);
        assert!((cached.max_drift(&fresh) - 0.5).abs() < 1e-12);
    }
}

//! Sweeps restricted to a sparse coordinate set.
//!
//! Flux values live in an array aligned with a [`SparseTopology`]; the
//! topology itself is shared, so several chains can sample over the same
//! support without copying it.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use crate::config::SamplerConfig;
use crate::counts::SparseCounts;
use crate::dense::{SweepStats, DRIFT_WARN};
use crate::error::SamplerError;
use crate::matrix::{normalize_all, RowSums};
use crate::sample::TransitionMatrix;
use crate::topology::SparseTopology;
use crate::update::{diagonal_step, edge_update, EdgeCounts, EdgeState};

/// Mutable state of a sparse reversible chain.
#[derive(Debug, Clone)]
pub struct SparseSample {
    topology: Arc<SparseTopology>,
    flux: Vec<f64>,
    row_sums: RowSums,
}

impl SparseSample {
    /// Start from symmetric flux values aligned with `topology`, rescaled to
    /// unit mass.
    pub fn from_flux(topology: Arc<SparseTopology>, mut flux: Vec<f64>) -> Result<Self, SamplerError> {
        topology.check_len(&flux)?;
        for k in 0..topology.n_idx() {
            let (row, col) = (topology.rows()[k], topology.cols()[k]);
            let v = flux[k];
            if !v.is_finite() {
                return Err(SamplerError::NonFiniteEntry { row, col });
            }
            if v < 0.0 {
                return Err(SamplerError::NegativeEntry { row, col, value: v });
            }
            let t = topology.transpose(k);
            if t > k {
                let backward = flux[t];
                if (v - backward).abs() > 1e-10 * v.max(backward) {
                    return Err(SamplerError::NotSymmetric {
                        row,
                        col,
                        forward: v,
                        backward,
                    });
                }
                let mean = 0.5 * (v + backward);
                flux[k] = mean;
                flux[t] = mean;
            }
        }

        let row_sums = RowSums::from_sparse(&flux, topology.rows(), topology.n());
        if let Some(row) = (0..topology.n()).find(|&i| row_sums.get(i) <= 0.0) {
            return Err(SamplerError::ZeroRowSum { row });
        }

        let mut sample = Self {
            topology,
            flux,
            row_sums,
        };
        sample.rescale();
        Ok(sample)
    }

    /// Start from the symmetrized counts on the support.
    pub fn from_counts(
        topology: Arc<SparseTopology>,
        counts: &SparseCounts,
    ) -> Result<Self, SamplerError> {
        topology.check_len(counts.values())?;
        let c = counts.values();
        let flux = (0..topology.n_idx())
            .map(|k| c[k] + c[topology.transpose(k)])
            .collect();
        Self::from_flux(topology, flux)
    }

    pub fn topology(&self) -> &Arc<SparseTopology> {
        &self.topology
    }

    pub fn flux(&self) -> &[f64] {
        &self.flux
    }

    pub fn row_sums(&self) -> &RowSums {
        &self.row_sums
    }

    /// Transition probabilities on the support, aligned with the topology.
    pub fn transition_values(&self) -> Vec<f64> {
        let mut values = self.flux.clone();
        self.topology.normalize(&mut values);
        values
    }

    /// Dense transition matrix with zeros off the support.
    pub fn transition_matrix(&self) -> TransitionMatrix {
        let n = self.topology.n();
        let mut probs = self.topology.scatter(&self.flux);
        normalize_all(&mut probs, n);
        TransitionMatrix::from_probs(n, probs)
    }

    pub fn stationary_weights(&self) -> Vec<f64> {
        let total = self.row_sums.total();
        self.row_sums.as_slice().iter().map(|s| s / total).collect()
    }

    /// Scale the flux to unit total mass.
    pub fn rescale(&mut self) {
        let total: f64 = self.flux.iter().sum();
        let factor = 1.0 / total;
        for v in &mut self.flux {
            *v *= factor;
        }
        self.row_sums.scale(factor);
    }

    /// Rebuild the cached row sums and return the largest error they had.
    pub fn repair_row_sums(&mut self) -> f64 {
        let fresh = RowSums::from_sparse(&self.flux, self.topology.rows(), self.topology.n());
        let drift = self.row_sums.max_drift(&fresh);
        self.row_sums = fresh;
        drift
    }

    fn finish_sweep(&mut self, sweep: usize, config: &SamplerConfig) {
        self.rescale();
        if config.repair_due(sweep) {
            let drift = self.repair_row_sums();
            if drift > DRIFT_WARN {
                warn!(sweep, drift, "sparse row sums drifted from the flux");
            }
        }
    }
}

fn check_counts(sample: &SparseSample, counts: &SparseCounts) -> Result<(), SamplerError> {
    let topology = sample.topology();
    topology.check_len(counts.values())?;
    if counts.n() != topology.n() {
        return Err(SamplerError::DimensionMismatch {
            expected: topology.n(),
            got: counts.n(),
        });
    }
    Ok(())
}

/// Instrumented sparse sweep.
///
/// Visits each row's entries with `col <= row` in column order, the same
/// order as the dense driver, so a full topology reproduces a dense run
/// draw for draw.
pub fn sweep_sparse<R: Rng + ?Sized>(
    sample: &mut SparseSample,
    counts: &SparseCounts,
    config: &SamplerConfig,
    n_step: usize,
    rng: &mut R,
) -> Result<SweepStats, SamplerError> {
    config.validate()?;
    check_counts(sample, counts)?;
    Ok(sweep_sparse_unchecked(sample, counts, config, n_step, rng))
}

/// [`sweep_sparse`] without validation.
pub fn sweep_sparse_unchecked<R: Rng + ?Sized>(
    sample: &mut SparseSample,
    counts: &SparseCounts,
    config: &SamplerConfig,
    n_step: usize,
    rng: &mut R,
) -> SweepStats {
    let topology = Arc::clone(&sample.topology);
    debug_assert_eq!(counts.values().len(), topology.n_idx());
    let n = topology.n();
    let cols = topology.cols();
    let c = counts.values();
    let sum_c = counts.row_sums();
    let mut stats = SweepStats::default();

    for sweep in 0..n_step {
        let mut sweep_stats = SweepStats::default();
        let w = &mut sample.flux;
        let sum_w = &mut sample.row_sums;
        for i in 0..n {
            for k in topology.row(i) {
                let j = cols[k];
                if j > i {
                    break;
                }
                if j == i {
                    if c[k] > 0.0 {
                        let v = w[k];
                        let rest = (sum_w.get(i) - v).max(0.0);
                        let step = diagonal_step(v, rest, c[k], sum_c.get(i), rng);
                        sweep_stats.record(step);
                        w[k] = step.value;
                        sum_w.set(i, rest + step.value);
                    }
                    continue;
                }

                let t = topology.transpose(k);
                let c0 = c[k] + c[t];
                let v0 = w[k];
                if c0 > 0.0 || v0 > 0.0 {
                    let edge = EdgeState {
                        v0,
                        v1: (sum_w.get(i) - v0).max(0.0),
                        v2: (sum_w.get(j) - v0).max(0.0),
                    };
                    let edge_counts = EdgeCounts {
                        c0,
                        c1: sum_c.get(i),
                        c2: sum_c.get(j),
                    };
                    let step = edge_update(edge, edge_counts, config, rng);
                    sweep_stats.record(step);
                    w[k] = step.value;
                    w[t] = step.value;
                    sum_w.set(i, edge.v1 + step.value);
                    sum_w.set(j, edge.v2 + step.value);
                }
            }
        }
        sample.finish_sweep(sweep, config);
        stats.merge(sweep_stats);
    }

    debug!(
        n,
        n_idx = topology.n_idx(),
        n_step,
        proposed = stats.proposed,
        accepted = stats.accepted,
        rate = stats.acceptance_rate(),
        "sparse sweeps finished"
    );
    stats
}

/// Throughput variant of [`sweep_sparse`].
///
/// One flat pass over the stored entries with `col >= row` per sweep, no
/// validation and no bookkeeping. Samples the same posterior as the
/// instrumented driver but consumes randomness in a different order.
pub fn sweep_sparse_fast<R: Rng + ?Sized>(
    sample: &mut SparseSample,
    counts: &SparseCounts,
    config: &SamplerConfig,
    n_step: usize,
    rng: &mut R,
) {
    let topology = Arc::clone(&sample.topology);
    debug_assert_eq!(counts.values().len(), topology.n_idx());
    let rows = topology.rows();
    let cols = topology.cols();
    let c = counts.values();
    let sum_c = counts.row_sums();

    for sweep in 0..n_step {
        let w = &mut sample.flux;
        let sum_w = &mut sample.row_sums;
        for k in 0..topology.n_idx() {
            let (i, j) = (rows[k], cols[k]);
            if j < i {
                continue;
            }
            if i == j {
                if c[k] > 0.0 {
                    let v = w[k];
                    let rest = (sum_w.get(i) - v).max(0.0);
                    let value = diagonal_step(v, rest, c[k], sum_c.get(i), rng).value;
                    w[k] = value;
                    sum_w.set(i, rest + value);
                }
                continue;
            }

            let t = topology.transpose(k);
            let c0 = c[k] + c[t];
            let v0 = w[k];
            if c0 > 0.0 || v0 > 0.0 {
                let v1 = (sum_w.get(i) - v0).max(0.0);
                let v2 = (sum_w.get(j) - v0).max(0.0);
                let value = edge_update(
                    EdgeState { v0, v1, v2 },
                    EdgeCounts {
                        c0,
                        c1: sum_c.get(i),
                        c2: sum_c.get(j),
                    },
                    config,
                    rng,
                )
                .value;
                w[k] = value;
                w[t] = value;
                sum_w.set(i, v1 + value);
                sum_w.set(j, v2 + value);
            }
        }
        sample.finish_sweep(sweep, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_flux_checks_transposes() {
        let topology = Arc::new(SparseTopology::from_pairs(2, &[(0, 1), (1, 0)]).unwrap());
        let err = SparseSample::from_flux(Arc::clone(&topology), vec![1.0, 2.0]);
        assert!(matches!(err, Err(SamplerError::NotSymmetric { .. })));
        assert!(SparseSample::from_flux(topology, vec![1.0, 1.0]).is_ok());
    }

    #[test]
    fn transition_values_are_row_stochastic() {
        let topology =
            Arc::new(SparseTopology::from_pairs(2, &[(0, 0), (0, 1), (1, 0)]).unwrap());
        let sample = SparseSample::from_flux(topology, vec![3.0, 1.0, 1.0]).unwrap();
        let values = sample.transition_values();
        assert!((values[0] - 0.75).abs() < 1e-12);
        assert!((values[1] - 0.25).abs() < 1e-12);
        assert!((values[2] - 1.0).abs() < 1e-12);
    }
}

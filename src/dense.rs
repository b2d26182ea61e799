//! Sweeps over every state pair of a dense flux matrix.

use rand::Rng;
use tracing::{debug, warn};

use crate::config::SamplerConfig;
use crate::counts::CountMatrix;
use crate::error::SamplerError;
use crate::sample::ReversibleSample;
use crate::update::{diagonal_step, edge_update, EdgeCounts, EdgeState, EdgeStep};

/// Row sums are rebuilt every `renormalize_every` sweeps; drift above this
/// is reported.
pub(crate) const DRIFT_WARN: f64 = 1e-9;

/// Proposal bookkeeping returned by the instrumented drivers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub proposed: u64,
    pub accepted: u64,
}

impl SweepStats {
    #[inline(always)]
    pub(crate) fn record(&mut self, step: EdgeStep) {
        self.proposed += 1;
        if step.accepted {
            self.accepted += 1;
        }
    }

    /// Accepted fraction of all proposals, 0 when nothing was proposed.
    pub fn acceptance_rate(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }

    pub fn merge(&mut self, other: SweepStats) {
        self.proposed += other.proposed;
        self.accepted += other.accepted;
    }
}

/// Run `n_step` dense sweeps after checking that the sample, the counts and
/// the configuration fit together.
pub fn sweep_dense<R: Rng + ?Sized>(
    sample: &mut ReversibleSample,
    counts: &CountMatrix,
    config: &SamplerConfig,
    n_step: usize,
    rng: &mut R,
) -> Result<SweepStats, SamplerError> {
    config.validate()?;
    if counts.n() != sample.n() {
        return Err(SamplerError::DimensionMismatch {
            expected: sample.n(),
            got: counts.n(),
        });
    }

    Ok(sweep_dense_unchecked(sample, counts, config, n_step, rng))
}

/// Dense sweep loop without validation.
///
/// Visits `(i, j)` for `i` in `0..n` and `j` in `0..=i`. Diagonal entries
/// get a Gibbs draw, off-diagonal pairs with counts or mass get
/// [`edge_update`]. Row sums follow each change in O(1). The flux is
/// rescaled to unit mass after every sweep.
pub fn sweep_dense_unchecked<R: Rng + ?Sized>(
    sample: &mut ReversibleSample,
    counts: &CountMatrix,
    config: &SamplerConfig,
    n_step: usize,
    rng: &mut R,
) -> SweepStats {
    let n = sample.n();
    debug_assert_eq!(counts.n(), n);
    let c = counts.as_slice();
    let sum_c = counts.row_sums();
    let mut stats = SweepStats::default();

    for sweep in 0..n_step {
        let (w, sum_w) = sample.parts_mut();
        for i in 0..n {
            for j in 0..=i {
                let ij = i * n + j;
                if i == j {
                    let c_self = c[ij];
                    if c_self > 0.0 {
                        let v = w[ij];
                        let rest = (sum_w.get(i) - v).max(0.0);
                        let step = diagonal_step(v, rest, c_self, sum_c.get(i), rng);
                        stats.record(step);
                        w[ij] = step.value;
                        sum_w.set(i, rest + step.value);
                    }
                    continue;
                }

                let ji = j * n + i;
                let c0 = c[ij] + c[ji];
                let v0 = w[ij];
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
                    stats.record(step);
                    w[ij] = step.value;
                    w[ji] = step.value;
                    sum_w.set(i, edge.v1 + step.value);
                    sum_w.set(j, edge.v2 + step.value);
                }
            }
        }

        sample.rescale();
        if config.repair_due(sweep) {
            let drift = sample.repair_row_sums();
            if drift > DRIFT_WARN {
                warn!(sweep, drift, "row sums drifted from the flux");
            }
        }
    }

    debug!(
        n,
        n_step,
        proposed = stats.proposed,
        accepted = stats.accepted,
        rate = stats.acceptance_rate(),
        "dense sweeps finished"
    );
    stats
}

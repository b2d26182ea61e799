//! Samplers that own a chain's counts, state, settings and RNG.
//!
//! Everything is validated once in the constructor; `update` then runs the
//! unchecked sweep loops.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::config::SamplerConfig;
use crate::counts::{CountMatrix, SparseCounts};
use crate::dense::{sweep_dense_unchecked, SweepStats};
use crate::error::SamplerError;
use crate::sample::{ReversibleSample, TransitionMatrix};
use crate::sparse::{sweep_sparse_fast, sweep_sparse_unchecked, SparseSample};
use crate::topology::SparseTopology;

/// Dense reversible sampler.
pub struct ReversibleSampler<R = ChaCha20Rng> {
    counts: CountMatrix,
    sample: ReversibleSample,
    config: SamplerConfig,
    rng: R,
    stats: SweepStats,
}

impl ReversibleSampler<ChaCha20Rng> {
    /// Seeded sampler starting from the symmetrized counts.
    pub fn new(counts: CountMatrix, config: SamplerConfig, seed: u64) -> Result<Self, SamplerError> {
        let initial = ReversibleSample::from_counts(&counts)?;
        Self::with_rng(counts, initial, config, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> ReversibleSampler<R> {
    pub fn with_rng(
        counts: CountMatrix,
        initial: ReversibleSample,
        config: SamplerConfig,
        rng: R,
    ) -> Result<Self, SamplerError> {
        config.validate()?;
        if counts.n() != initial.n() {
            return Err(SamplerError::DimensionMismatch {
                expected: initial.n(),
                got: counts.n(),
            });
        }
        Ok(Self {
            counts,
            sample: initial,
            config,
            rng,
            stats: SweepStats::default(),
        })
    }

    /// Advance the chain by `n_step` sweeps.
    pub fn update(&mut self, n_step: usize) -> SweepStats {
        let stats = sweep_dense_unchecked(
            &mut self.sample,
            &self.counts,
            &self.config,
            n_step,
            &mut self.rng,
        );
        self.stats.merge(stats);
        stats
    }

    /// Advance by `n_step` sweeps and return the resulting transition matrix.
    pub fn sample(&mut self, n_step: usize) -> TransitionMatrix {
        self.update(n_step);
        self.sample.transition_matrix()
    }

    /// Like [`ReversibleSampler::sample`], with the stationary weights of
    /// the returned matrix.
    pub fn sample_with_weights(&mut self, n_step: usize) -> (TransitionMatrix, Vec<f64>) {
        self.update(n_step);
        (
            self.sample.transition_matrix(),
            self.sample.stationary_weights(),
        )
    }

    pub fn current(&self) -> &ReversibleSample {
        &self.sample
    }

    /// Proposal counts since construction.
    pub fn stats(&self) -> SweepStats {
        self.stats
    }
}

/// Sparse reversible sampler over a shared topology.
pub struct SparseReversibleSampler<R = ChaCha20Rng> {
    counts: SparseCounts,
    sample: SparseSample,
    config: SamplerConfig,
    rng: R,
    fast: bool,
    stats: SweepStats,
}

impl SparseReversibleSampler<ChaCha20Rng> {
    pub fn new(
        topology: Arc<SparseTopology>,
        counts: SparseCounts,
        config: SamplerConfig,
        seed: u64,
    ) -> Result<Self, SamplerError> {
        let initial = SparseSample::from_counts(topology, &counts)?;
        Self::with_rng(counts, initial, config, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> SparseReversibleSampler<R> {
    pub fn with_rng(
        counts: SparseCounts,
        initial: SparseSample,
        config: SamplerConfig,
        rng: R,
    ) -> Result<Self, SamplerError> {
        config.validate()?;
        initial.topology().check_len(counts.values())?;
        if counts.n() != initial.topology().n() {
            return Err(SamplerError::DimensionMismatch {
                expected: initial.topology().n(),
                got: counts.n(),
            });
        }
        Ok(Self {
            counts,
            sample: initial,
            config,
            rng,
            fast: false,
            stats: SweepStats::default(),
        })
    }

    /// Use the flat-pass driver; proposal statistics stop being collected.
    pub fn with_fast_sweeps(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn update(&mut self, n_step: usize) -> SweepStats {
        if self.fast {
            sweep_sparse_fast(
                &mut self.sample,
                &self.counts,
                &self.config,
                n_step,
                &mut self.rng,
            );
            return SweepStats::default();
        }
        let stats = sweep_sparse_unchecked(
            &mut self.sample,
            &self.counts,
            &self.config,
            n_step,
            &mut self.rng,
        );
        self.stats.merge(stats);
        stats
    }

    pub fn sample(&mut self, n_step: usize) -> TransitionMatrix {
        self.update(n_step);
        self.sample.transition_matrix()
    }

    /// Advance and return the transition probabilities on the support only.
    pub fn sample_values(&mut self, n_step: usize) -> Vec<f64> {
        self.update(n_step);
        self.sample.transition_values()
    }

    pub fn sample_with_weights(&mut self, n_step: usize) -> (TransitionMatrix, Vec<f64>) {
        self.update(n_step);
        (
            self.sample.transition_matrix(),
            self.sample.stationary_weights(),
        )
    }

    pub fn current(&self) -> &SparseSample {
        &self.sample
    }

    /// Proposal counts since construction; always zero with fast sweeps.
    pub fn stats(&self) -> SweepStats {
        self.stats
    }

    /// False when the flat-pass driver is in use.
    pub fn tracks_stats(&self) -> bool {
        !self.fast
    }
}

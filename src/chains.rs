//! Independent chains run in parallel.
//!
//! Each chain owns its sample, its copy of the counts and its RNG; only the
//! sparse topology is shared. Chain `k` is seeded from `(seed, k)`, so the
//! output does not depend on how rayon schedules the work.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::info;

use crate::config::SamplerConfig;
use crate::counts::{CountMatrix, SparseCounts};
use crate::dense::SweepStats;
use crate::error::SamplerError;
use crate::sample::{ReversibleSample, TransitionMatrix};
use crate::sampler::{ReversibleSampler, SparseReversibleSampler};
use crate::sparse::SparseSample;
use crate::topology::SparseTopology;
use crate::utils::rng::chain_rng;

/// Shape of a multi-chain run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainPlan {
    pub n_chains: usize,
    /// Samples recorded per chain.
    pub n_samples: usize,
    /// Sweeps between recorded samples.
    pub n_step: usize,
    pub seed: u64,
}

/// Samples and proposal statistics of one chain.
#[derive(Debug, Clone)]
pub struct ChainRun {
    pub chain: usize,
    pub samples: Vec<TransitionMatrix>,
    pub stats: SweepStats,
}

/// Run dense chains from the symmetrized counts. `progress` is called once
/// per recorded sample, from worker threads.
pub fn sample_chains<F>(
    counts: &CountMatrix,
    config: &SamplerConfig,
    plan: ChainPlan,
    progress: F,
) -> Result<Vec<ChainRun>, SamplerError>
where
    F: Fn() + Sync,
{
    config.validate()?;
    let initial = ReversibleSample::from_counts(counts)?;

    (0..plan.n_chains)
        .into_par_iter()
        .map(|chain| {
            let mut sampler = ReversibleSampler::with_rng(
                counts.clone(),
                initial.clone(),
                config.clone(),
                chain_rng(plan.seed, chain),
            )?;
            info!(chain, n = counts.n(), "dense chain started");
            let samples = (0..plan.n_samples)
                .map(|_| {
                    let sample = sampler.sample(plan.n_step);
                    progress();
                    sample
                })
                .collect();
            let stats = sampler.stats();
            info!(chain, rate = stats.acceptance_rate(), "dense chain finished");
            Ok(ChainRun {
                chain,
                samples,
                stats,
            })
        })
        .collect()
}

/// Sparse counterpart of [`sample_chains`]; every chain reads the same
/// topology.
pub fn sample_sparse_chains<F>(
    topology: Arc<SparseTopology>,
    counts: &SparseCounts,
    config: &SamplerConfig,
    fast: bool,
    plan: ChainPlan,
    progress: F,
) -> Result<Vec<ChainRun>, SamplerError>
where
    F: Fn() + Sync,
{
    config.validate()?;
    let initial = SparseSample::from_counts(Arc::clone(&topology), counts)?;

    (0..plan.n_chains)
        .into_par_iter()
        .map(|chain| {
            let mut sampler = SparseReversibleSampler::with_rng(
                counts.clone(),
                initial.clone(),
                config.clone(),
                chain_rng(plan.seed, chain),
            )?
            .with_fast_sweeps(fast);
            info!(chain, n_idx = topology.n_idx(), fast, "sparse chain started");
            let samples = (0..plan.n_samples)
                .map(|_| {
                    let sample = sampler.sample(plan.n_step);
                    progress();
                    sample
                })
                .collect();
            let stats = sampler.stats();
            if sampler.tracks_stats() {
                info!(chain, rate = stats.acceptance_rate(), "sparse chain finished");
            } else {
                info!(chain, "sparse chain finished, acceptance not tracked");
            }
            Ok(ChainRun {
                chain,
                samples,
                stats,
            })
        })
        .collect()
}

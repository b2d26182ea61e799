//! Bayesian sampling of reversible transition matrices.
//!
//! Given an observed count matrix `C`, the drivers in this crate run a
//! Markov chain over reversible row-stochastic matrices whose stationary
//! distribution is the posterior given `C`. The chain state is a symmetric
//! flux `W[i][j] = π_i X[i][j]`; each sweep perturbs it one edge at a time
//! with count-weighted Metropolis moves.
//!
//! ```text
//!  CountMatrix ──▶ ReversibleSample ──sweep_dense──▶ TransitionMatrix
//!       │                                               ▲
//!       └─restrict─▶ SparseCounts ──▶ SparseSample ─sweep_sparse─┘
//! ```
//!
//! ```rust
//! use revsample::{CountMatrix, ReversibleSampler, SamplerConfig};
//!
//! let counts = CountMatrix::from_rows(&[vec![8.0, 2.0], vec![2.0, 8.0]]).unwrap();
//! let mut sampler = ReversibleSampler::new(counts, SamplerConfig::default(), 7).unwrap();
//! let p = sampler.sample(10);
//! assert!(p.validate(1e-9).is_ok());
//! ```

pub mod chains;
pub mod config;
pub mod counts;
pub mod dense;
pub mod error;
pub mod matrix;
pub mod nonreversible;
pub mod sample;
pub mod sampler;
pub mod sparse;
pub mod topology;
pub mod update;
pub mod utils;

pub use chains::{sample_chains, sample_sparse_chains, ChainPlan, ChainRun};
pub use config::SamplerConfig;
pub use counts::{CountMatrix, SparseCounts};
pub use dense::{sweep_dense, sweep_dense_unchecked, SweepStats};
pub use error::SamplerError;
pub use matrix::{normalize_all, normalize_all_sparse, print_matrix, sum_all, sum_row, RowSums};
pub use nonreversible::NonReversibleSampler;
pub use sample::{ReversibleSample, TransitionMatrix};
pub use sampler::{ReversibleSampler, SparseReversibleSampler};
pub use sparse::{sweep_sparse, sweep_sparse_fast, sweep_sparse_unchecked, SparseSample};
pub use topology::{generate_row_indexes, SparseTopology};
pub use update::{diagonal_step, gamma_step, update_step, EdgeCounts, EdgeState, EdgeStep};

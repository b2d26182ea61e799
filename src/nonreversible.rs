//! Posterior sampling without the reversibility constraint.
//!
//! Rows are independent: row `i` is a Dirichlet draw with parameters
//! `C[i] + prior`, built from Gamma variates.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, Gamma};

use crate::counts::CountMatrix;
use crate::error::SamplerError;
use crate::matrix::normalize_all;
use crate::sample::TransitionMatrix;

/// Default Dirichlet pseudocount added to every count.
pub const DEFAULT_PRIOR: f64 = 1.0;

/// Independent-row Dirichlet sampler.
pub struct NonReversibleSampler<R = ChaCha20Rng> {
    n: usize,
    alpha: Vec<f64>,
    rng: R,
}

impl NonReversibleSampler<ChaCha20Rng> {
    pub fn new(counts: &CountMatrix, prior: f64, seed: u64) -> Result<Self, SamplerError> {
        Self::with_rng(counts, prior, ChaCha20Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> NonReversibleSampler<R> {
    /// Build the Dirichlet parameters `C + prior`.
    ///
    /// Fails when `prior` is negative or non-finite, or when a row ends up
    /// with no positive parameter.
    pub fn with_rng(counts: &CountMatrix, prior: f64, rng: R) -> Result<Self, SamplerError> {
        if !prior.is_finite() || prior < 0.0 {
            return Err(SamplerError::InvalidConfig {
                reason: format!("dirichlet prior must be finite and >= 0, got {prior}"),
            });
        }
        let n = counts.n();
        let alpha: Vec<f64> = counts.as_slice().iter().map(|c| c + prior).collect();
        for (row, params) in alpha.chunks_exact(n).enumerate() {
            if !params.iter().any(|&a| a > 0.0) {
                return Err(SamplerError::ZeroRowSum { row });
            }
        }
        Ok(Self { n, alpha, rng })
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Dirichlet parameters, row-major.
    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    /// Draw a fresh transition matrix.
    pub fn sample(&mut self) -> TransitionMatrix {
        let mut probs = vec![0.0; self.n * self.n];
        for (p, &a) in probs.iter_mut().zip(&self.alpha) {
            // Zero parameters stay out of the support.
            if let Ok(gamma) = Gamma::new(a, 1.0) {
                *p = gamma.sample(&mut self.rng);
            }
        }
        normalize_all(&mut probs, self.n);
        TransitionMatrix::from_probs(self.n, probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_prior() {
        let c = CountMatrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
        assert!(NonReversibleSampler::new(&c, -1.0, 0).is_err());
    }

    #[test]
    fn empty_row_without_prior_fails() {
        let c = CountMatrix::from_rows(&[vec![1.0, 1.0], vec![0.0, 0.0]]).unwrap();
        assert_eq!(
            NonReversibleSampler::new(&c, 0.0, 0).err(),
            Some(SamplerError::ZeroRowSum { row: 1 })
        );
    }

    #[test]
    fn zero_parameters_stay_zero() {
        let c = CountMatrix::from_rows(&[vec![4.0, 0.0], vec![2.0, 3.0]]).unwrap();
        let mut sampler = NonReversibleSampler::new(&c, 0.0, 11).unwrap();
        let p = sampler.sample();
        assert_eq!(p.get(0, 1), 0.0);
        assert_eq!(p.get(0, 0), 1.0);
    }
}

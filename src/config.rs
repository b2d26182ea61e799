//! Run-time settings for the sweep drivers.

use crate::error::SamplerError;

/// Tuning parameters shared by the dense and sparse drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Standard deviation of the Gaussian proposal in log-flux space.
    /// Zero disables the random-walk move.
    pub random_walk_stepsize: f64,
    /// Try a Gamma independence proposal before each random-walk move.
    pub gamma_proposal: bool,
    /// Recompute row sums from scratch every this many sweeps.
    pub renormalize_every: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            random_walk_stepsize: 1.0,
            gamma_proposal: true,
            renormalize_every: 100,
        }
    }
}

impl SamplerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stepsize(mut self, stepsize: f64) -> Self {
        self.random_walk_stepsize = stepsize;
        self
    }

    pub fn with_gamma_proposal(mut self, enabled: bool) -> Self {
        self.gamma_proposal = enabled;
        self
    }

    pub fn with_renormalize_every(mut self, sweeps: usize) -> Self {
        self.renormalize_every = sweeps;
        self
    }

    /// True when row sums are due for a rebuild after sweep `sweep`
    /// (0-based). An interval of zero never repairs.
    #[inline]
    pub fn repair_due(&self, sweep: usize) -> bool {
        self.renormalize_every > 0 && (sweep + 1) % self.renormalize_every == 0
    }

    /// Check that the stepsize is finite and non-negative and that the
    /// repair interval is at least one sweep.
    pub fn validate(&self) -> Result<(), SamplerError> {
        if !self.random_walk_stepsize.is_finite() || self.random_walk_stepsize < 0.0 {
            return Err(SamplerError::InvalidConfig {
                reason: format!(
                    "random_walk_stepsize must be finite and >= 0, got {}",
                    self.random_walk_stepsize
                ),
            });
        }
        if self.renormalize_every == 0 {
            return Err(SamplerError::InvalidConfig {
                reason: "renormalize_every must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

//! Metropolis moves on a single edge of the flux matrix.
//!
//! The flux `W` is symmetric, so an off-diagonal edge carries one free value
//! `v0 = W[i][j] = W[j][i]`. With the rest of row `i` (`v1`) and of row `j`
//! (`v2`) held fixed, its conditional posterior is
//!
//! ```text
//!   p(v0) ∝ v0^(c0-1) · (v0+v1)^(-c1) · (v0+v2)^(-c2)
//! ```
//!
//! where `c0 = C[i][j] + C[j][i]`, `c1 = sumC[i]` and `c2 = sumC[j]`. Every
//! move here leaves that density invariant. None of them touch the matrix:
//! the driver writes the returned value back and adjusts the row sums.

use rand::Rng;
use rand_distr::{Beta, Distribution, Gamma, StandardNormal};

use crate::config::SamplerConfig;

/// Current flux on an edge and the remaining mass of its two rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeState {
    /// W[i][j] (= W[j][i]).
    pub v0: f64,
    /// sumX[i] - W[i][j].
    pub v1: f64,
    /// sumX[j] - W[j][i].
    pub v2: f64,
}

/// Count weights of an edge: symmetric pair count and the two row totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeCounts {
    pub c0: f64,
    pub c1: f64,
    pub c2: f64,
}

/// Result of one move, with the acceptance flag for instrumented drivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStep {
    pub value: f64,
    pub accepted: bool,
}

impl EdgeStep {
    #[inline(always)]
    fn kept(value: f64) -> Self {
        Self { value, accepted: false }
    }

    #[inline(always)]
    fn moved(value: f64) -> Self {
        Self { value, accepted: true }
    }
}

/// log p(v) up to a constant.
#[inline(always)]
fn log_target(v: f64, edge: &EdgeState, counts: &EdgeCounts) -> f64 {
    (counts.c0 - 1.0) * v.ln() - counts.c1 * (v + edge.v1).ln() - counts.c2 * (v + edge.v2).ln()
}

#[inline(always)]
fn accept<R: Rng + ?Sized>(log_ratio: f64, rng: &mut R) -> bool {
    if log_ratio >= 0.0 {
        true
    } else {
        rng.gen::<f64>() < log_ratio.exp()
    }
}

/// Random-walk Metropolis step in log-flux space.
///
/// Proposes `ln v0' = ln v0 + stepsize · N(0, 1)`. The log-space Jacobian
/// turns the `c0 - 1` exponent into `c0` in the acceptance ratio. A zero
/// stepsize or an edge without mass returns `v0` and draws nothing.
pub fn update_step<R: Rng + ?Sized>(
    edge: EdgeState,
    counts: EdgeCounts,
    stepsize: f64,
    rng: &mut R,
) -> EdgeStep {
    let v0 = edge.v0;
    if stepsize == 0.0 || !(v0 > 0.0 && v0.is_finite()) {
        return EdgeStep::kept(v0);
    }

    let z: f64 = rng.sample(StandardNormal);
    let log_v0 = v0.ln();
    let log_new = log_v0 + stepsize * z;
    let v_new = log_new.exp();
    if !(v_new > 0.0 && v_new.is_finite()) {
        return EdgeStep::kept(v0);
    }

    let log_ratio = counts.c0 * (log_new - log_v0)
        - counts.c1 * ((v_new + edge.v1).ln() - (v0 + edge.v1).ln())
        - counts.c2 * ((v_new + edge.v2).ln() - (v0 + edge.v2).ln());

    if accept(log_ratio, rng) {
        EdgeStep::moved(v_new)
    } else {
        EdgeStep::kept(v0)
    }
}

/// Shape and scale of a Gamma matched to the mode and curvature of the edge
/// posterior, or `None` when no usable fit exists.
pub fn gamma_fit(edge: &EdgeState, counts: &EdgeCounts) -> Option<(f64, f64)> {
    let EdgeState { v1, v2, .. } = *edge;
    let EdgeCounts { c0, c1, c2 } = *counts;

    // Stationary point of c0·ln v - c1·ln(v+v1) - c2·ln(v+v2).
    let a = c1 + c2 - c0;
    let b = (c1 - c0) * v2 + (c2 - c0) * v1;
    let c = -c0 * v1 * v2;
    let mode = if a == 0.0 {
        if b == 0.0 {
            return None;
        }
        -c / b
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        0.5 * (-b + disc.sqrt()) / a
    };
    if !(mode > 0.0 && mode.is_finite()) {
        return None;
    }

    let h = c1 / ((mode + v1) * (mode + v1)) + c2 / ((mode + v2) * (mode + v2))
        - c0 / (mode * mode);
    let shape = -h * mode * mode;
    let scale = -1.0 / (h * mode);
    if shape > 0.0 && shape.is_finite() && scale > 0.0 && scale.is_finite() {
        Some((shape, scale))
    } else {
        None
    }
}

/// Independence Metropolis-Hastings step with a Gamma proposal from
/// [`gamma_fit`].
///
/// An edge with no mass takes any admissible proposal outright, which is how
/// edges that start at zero enter the support.
pub fn gamma_step<R: Rng + ?Sized>(edge: EdgeState, counts: EdgeCounts, rng: &mut R) -> EdgeStep {
    let v0 = edge.v0;
    let Some((shape, scale)) = gamma_fit(&edge, &counts) else {
        return EdgeStep::kept(v0);
    };
    let Ok(proposal) = Gamma::new(shape, scale) else {
        return EdgeStep::kept(v0);
    };

    let v_new: f64 = proposal.sample(rng);
    if !(v_new > 0.0 && v_new.is_finite()) {
        return EdgeStep::kept(v0);
    }
    if v0 <= 0.0 {
        return EdgeStep::moved(v_new);
    }

    let log_q = |v: f64| (shape - 1.0) * v.ln() - v / scale;
    let log_ratio = (log_target(v_new, &edge, &counts) - log_q(v_new))
        - (log_target(v0, &edge, &counts) - log_q(v0));

    if accept(log_ratio, rng) {
        EdgeStep::moved(v_new)
    } else {
        EdgeStep::kept(v0)
    }
}

/// Exact Gibbs draw for a diagonal flux entry.
///
/// With `t ~ Beta(c_self, c_row - c_self)` the new value is
/// `t / (1 - t) · rest`, so that `t` is the self-transition probability of
/// the row. Rows without self counts, or without any other counts, keep
/// their value.
pub fn diagonal_step<R: Rng + ?Sized>(
    v: f64,
    rest: f64,
    c_self: f64,
    c_row: f64,
    rng: &mut R,
) -> EdgeStep {
    let c_other = c_row - c_self;
    if !(c_self > 0.0 && c_other > 0.0) {
        return EdgeStep::kept(v);
    }
    let Ok(beta) = Beta::new(c_self, c_other) else {
        return EdgeStep::kept(v);
    };
    let t: f64 = beta.sample(rng);
    let v_new = t / (1.0 - t) * rest;
    if v_new > 0.0 && v_new.is_finite() {
        EdgeStep::moved(v_new)
    } else {
        EdgeStep::kept(v)
    }
}

/// Full off-diagonal update as the drivers run it: the Gamma move, then the
/// random walk from wherever it left the edge.
///
/// The Gamma move runs when enabled, and always for an edge that has pair
/// counts but no mass. The random walk cannot leave zero on its own.
#[inline]
pub fn edge_update<R: Rng + ?Sized>(
    edge: EdgeState,
    counts: EdgeCounts,
    config: &SamplerConfig,
    rng: &mut R,
) -> EdgeStep {
    let mut edge = edge;
    let mut accepted = false;
    if config.gamma_proposal || (edge.v0 <= 0.0 && counts.c0 > 0.0) {
        let step = gamma_step(edge, counts, rng);
        accepted = step.accepted;
        edge.v0 = step.value;
    }
    let step = update_step(edge, counts, config.random_walk_stepsize, rng);
    EdgeStep {
        value: step.value,
        accepted: accepted || step.accepted,
    }
}

//! Error types for the revsample crate.

/// Error type for the validated (non hot-loop) paths of the sampler.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplerError {
    /// Returned when a matrix has no states.
    #[error("matrix is empty")]
    EmptyMatrix,

    /// Returned when a flat buffer cannot hold an n x n matrix.
    #[error("matrix is not square: {len} entries cannot form a {n}x{n} matrix")]
    NotSquare {
        /// Number of entries supplied.
        len: usize,
        /// Requested dimension.
        n: usize,
    },

    /// Returned when two collaborating objects disagree on the state count.
    #[error("dimension mismatch: expected {expected} states, got {got}")]
    DimensionMismatch {
        /// Dimension of the reference object.
        expected: usize,
        /// Dimension of the offending object.
        got: usize,
    },

    /// Returned when a parallel array has the wrong length.
    #[error("length mismatch: expected {expected} entries, got {got}")]
    LengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        got: usize,
    },

    /// Returned when a matrix entry is negative.
    #[error("negative entry at ({row}, {col}): {value}")]
    NegativeEntry {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// The offending value.
        value: f64,
    },

    /// Returned when a matrix entry is NaN or infinite.
    #[error("non-finite entry at ({row}, {col})")]
    NonFiniteEntry {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// Returned when a row has no mass and cannot be normalized.
    #[error("row {row} has zero sum")]
    ZeroRowSum {
        /// Row index.
        row: usize,
    },

    /// Returned when a flux matrix is not symmetric.
    #[error("flux is not symmetric at ({row}, {col}): {forward} vs {backward}")]
    NotSymmetric {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Value at (row, col).
        forward: f64,
        /// Value at (col, row).
        backward: f64,
    },

    /// Returned when a coordinate lies outside the state space.
    #[error("coordinate ({row}, {col}) is out of range for {n} states")]
    IndexOutOfRange {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Number of states.
        n: usize,
    },

    /// Returned when a coordinate list repeats a pair.
    #[error("duplicate coordinate ({row}, {col})")]
    DuplicateCoordinate {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// Returned when (row, col) is listed but (col, row) is not.
    #[error("coordinate ({row}, {col}) has no transpose entry")]
    MissingTranspose {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// Returned when a coordinate is not part of the sparse support.
    #[error("coordinate ({row}, {col}) is not in the sparse topology")]
    NotInTopology {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// Returned when a matrix row does not sum to one.
    #[error("row {row} sums to {sum}, expected 1")]
    NotStochastic {
        /// Row index.
        row: usize,
        /// Observed row sum.
        sum: f64,
    },

    /// Returned when a sampler setting is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// Description of the problem.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_not_square() {
        let e = SamplerError::NotSquare { len: 5, n: 2 };
        assert_eq!(
            e.to_string(),
            "matrix is not square: 5 entries cannot form a 2x2 matrix"
        );
    }

    #[test]
    fn error_negative_entry() {
        let e = SamplerError::NegativeEntry {
            row: 1,
            col: 0,
            value: -2.5,
        };
        assert_eq!(e.to_string(), "negative entry at (1, 0): -2.5");
    }

    #[test]
    fn error_not_symmetric() {
        let e = SamplerError::NotSymmetric {
            row: 0,
            col: 2,
            forward: 0.25,
            backward: 0.5,
        };
        assert_eq!(
            e.to_string(),
            "flux is not symmetric at (0, 2): 0.25 vs 0.5"
        );
    }

    #[test]
    fn error_missing_transpose() {
        let e = SamplerError::MissingTranspose { row: 3, col: 4 };
        assert_eq!(e.to_string(), "coordinate (3, 4) has no transpose entry");
    }

    #[test]
    fn error_invalid_config() {
        let e = SamplerError::InvalidConfig {
            reason: "stepsize must be finite".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "invalid configuration: stepsize must be finite"
        );
    }

    #[test]
    fn error_is_send_and_sync() {
        fn assert_impl<T: Send + Sync + std::error::Error>() {}
        assert_impl::<SamplerError>();
    }
}

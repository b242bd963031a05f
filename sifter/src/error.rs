use thiserror::Error;

/// Errors produced by the candidate clustering engine.
#[derive(Debug, Error)]
pub enum SiftError {
    /// A threshold was configured with a non-positive value.
    #[error("invalid parameter {name}: {value} (must be positive)")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Two candidates in the same batch share an index.
    #[error("duplicate candidate index in batch: {index}")]
    DuplicateIndex {
        /// The repeated index.
        index: u64,
    },

    /// A candidate DM would make the fractional DM test non-finite.
    #[error("candidate {index} has DM {dm} which breaks the fractional DM test")]
    NonFiniteComparison {
        /// Index of the offending candidate.
        index: u64,
        /// The zero or non-finite DM value.
        dm: f64,
    },

    /// A post-scan correctness assertion failed. This indicates a bug in
    /// the clustering algorithm itself, not a data problem.
    #[error("cluster invariant violated: {0}")]
    InvariantViolation(String),
}

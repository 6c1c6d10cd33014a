//! The error type shared by all integration routines.
use thiserror::Error;

/// Error type returned by user supplied callables.
pub type CallError = Box<dyn std::error::Error + Send + Sync>;

/// Convenience alias for results of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong during an integration.
#[derive(Debug, Error)]
pub enum Error {
    /// The integration domain is empty, or an interval has `lower > upper` or a non-finite limit.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// A callable was invoked with a point whose length differs from its dimension.
    #[error("dimension mismatch: callable expects {expected} variables, point has {found}")]
    DimensionMismatch {
        /// The dimension the callable reported.
        expected: usize,
        /// The length of the point.
        found: usize,
    },

    /// A bin classifier returned a value outside `[1, num_bins]`.
    #[error("bin index {bin} is outside of [1, {num_bins}]")]
    BinIndex {
        /// The (one-based) bin returned by the classifier.
        bin: usize,
        /// The number of bins.
        num_bins: usize,
    },

    /// The number of samples is zero, or larger than the number of available events.
    #[error("invalid sample count: {0}")]
    InvalidSampleCount(String),

    /// A callable returned values of different lengths for different events.
    #[error("shape mismatch: expected {expected} components, found {found}")]
    ShapeMismatch {
        /// The length of the first value.
        expected: usize,
        /// The length of the offending value.
        found: usize,
    },

    /// The error raised by a user supplied callable.
    #[error(transparent)]
    Callable(CallError),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

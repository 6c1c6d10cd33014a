//! Core functionality. You don't need to import this modules since all it's public members are
//! part of the crate namespace.
pub mod domain;
pub mod error;
pub mod estimators;
pub mod matrix;

pub use domain::{Bounds, PointBatch, UniformPoints};
pub use error::{CallError, Error, Result};
pub use estimators::{Checkpoint, Estimate, Observable, Sample};
pub use matrix::Matrix;

/// Trait which every callable handed to the integrators must implement.
///
/// The same trait describes amplitude vectors (`V = Vec<Complex64>`), real-valued integrands
/// (`V = f64` or `V = Vec<f64>`), per-event weights and bin classifiers (`V = usize`).
pub trait Integrand<V>: Send + Sync {
    /// Evaluates the callable at the phase space point `x`, which has as many entries as
    /// specified by `dim()`.
    fn call(&self, x: &[f64]) -> std::result::Result<V, CallError>;

    /// Returns the number of variables the callable expects.
    fn dim(&self) -> usize;
}

/// An [`Integrand`] built from a closure.
pub struct FnIntegrand<F> {
    dim: usize,
    f: F,
}

impl<F> FnIntegrand<F> {
    /// Wrap the closure `f` expecting points with `dim` variables.
    pub fn new<V>(dim: usize, f: F) -> Self
    where
        F: Fn(&[f64]) -> std::result::Result<V, CallError>,
    {
        Self { dim, f }
    }
}

impl<V, F> Integrand<V> for FnIntegrand<F>
where
    F: Fn(&[f64]) -> std::result::Result<V, CallError> + Send + Sync,
{
    fn call(&self, x: &[f64]) -> std::result::Result<V, CallError> {
        (self.f)(x)
    }

    fn dim(&self) -> usize {
        self.dim
    }
}

/// Evaluate `callable` at the point `x`, returning its result unmodified.
///
/// Fails with [`Error::DimensionMismatch`] if the length of `x` differs from `callable.dim()`;
/// errors of the callable are passed through as [`Error::Callable`].
pub fn evaluate<V, I>(callable: &I, x: &[f64]) -> Result<V>
where
    I: Integrand<V> + ?Sized,
{
    check_dim(callable, x.len())?;
    callable.call(x).map_err(Error::Callable)
}

/// Make sure that `callable` accepts points with `dim` variables.
pub(crate) fn check_dim<V, I>(callable: &I, dim: usize) -> Result<()>
where
    I: Integrand<V> + ?Sized,
{
    if callable.dim() == dim {
        Ok(())
    } else {
        Err(Error::DimensionMismatch {
            expected: callable.dim(),
            found: dim,
        })
    }
}

/// Compute the number of calls on a given core, given the total number of cores
/// `n_cores`, the index `core` (zero-based) of the current thread as well as the
/// total number of calls `total_calls` to perform combined on all cores.
pub(crate) fn compute_calls_for_core(core: usize, n_cores: usize, total_calls: usize) -> usize {
    debug_assert!(core < n_cores);
    let calls_per_core = compute_calls_per_core(n_cores, total_calls);

    // the last cores might not need all of the `calls_per_core` to reach `total_calls`
    total_calls
        .saturating_sub(core * calls_per_core)
        .min(calls_per_core)
}

/// The number of calls each core performs, except possibly the last ones.
pub(crate) fn compute_calls_per_core(n_cores: usize, total_calls: usize) -> usize {
    (total_calls + n_cores - 1) / n_cores
}

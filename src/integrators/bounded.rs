//! Integration over hyper-rectangles with uniformly distributed random points.
//!
//! Given $N$ calls, each half draws $N$ independent points $x^{(j)}$ and estimates
//!
//! $$ I_k = \frac{V}{N} \sum_{j=1}^N f \left( x^{(j)} \right) $$
//!
//! where $V$ is the volume of the bounds. Both halves are drawn one after the other from the same
//! random number generator, which is the same as drawing $2N$ points and splitting them.
use super::{merge, run_on_cores, Integrator};
use crate::accumulators::{
    Accumulator, BinnedAmplitudes, CrossTensorProduct, Plain, TensorProduct,
};
use crate::callbacks::Callback;
use crate::core::error::{Error, Result};
use crate::core::estimators::{Estimate, Observable};
use crate::core::matrix::Matrix;
use crate::core::{compute_calls_for_core, compute_calls_per_core, Bounds, Integrand};
use log::{debug, trace};
use num_complex::Complex64;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};

impl<R, C> Integrator<R, C>
where
    R: Clone + Rng + Send + Sync,
    C: Callback,
{
    /// Integrate `accumulator` over `bounds`, using `calls` uniformly distributed points for each
    /// of the two halves. This costs `2 * calls` evaluations of the accumulator.
    pub fn integrate<A: Accumulator>(
        &mut self,
        accumulator: &A,
        bounds: &Bounds,
        calls: usize,
    ) -> Result<Estimate<A::Output>> {
        if calls == 0 {
            return Err(Error::InvalidSampleCount(
                "the number of calls must be positive".to_string(),
            ));
        }

        accumulator.check_dim(bounds.dim())?;

        let n_cores = self.options.n_cores;
        let scale = bounds.volume() / calls as f64;

        let first = perform_half(accumulator, bounds, &mut self.rng, calls, n_cores)?;
        debug!("first half of {} calls finished", calls);
        let second = perform_half(accumulator, bounds, &mut self.rng, calls, n_cores)?;
        debug!("second half of {} calls finished", calls);

        self.finish((calls, first), (calls, second), scale)
    }

    /// Estimate $\int \mathrm{d}y \, f(y)$ for a real or complex, scalar or vector valued
    /// `integrand`.
    pub fn integral<V, I>(
        &mut self,
        integrand: &I,
        bounds: &Bounds,
        calls: usize,
    ) -> Result<Estimate<V>>
    where
        V: Observable,
        I: Integrand<V> + ?Sized,
    {
        self.integrate(&Plain::new(integrand), bounds, calls)
    }

    /// Estimate the normalization integrals $I_{ij} = \int \mathrm{d}y \, \overline{A_i(y)}
    /// A_j(y)$ of the amplitude vector returned by `amplitudes`.
    pub fn integral_of_tensor_product<A>(
        &mut self,
        amplitudes: &A,
        bounds: &Bounds,
        calls: usize,
    ) -> Result<Estimate<Matrix<Complex64>>>
    where
        A: Integrand<Vec<Complex64>> + ?Sized,
    {
        self.integrate(&TensorProduct::new(amplitudes), bounds, calls)
    }

    /// Estimate $I_{ij} = \int \mathrm{d}y \, \overline{A_i(y)} B_j(y)$ for the amplitude vectors
    /// returned by `left` and `right`, which may have different lengths.
    pub fn integral_of_tensor_product_2func<A, B>(
        &mut self,
        left: &A,
        right: &B,
        bounds: &Bounds,
        calls: usize,
    ) -> Result<Estimate<Matrix<Complex64>>>
    where
        A: Integrand<Vec<Complex64>> + ?Sized,
        B: Integrand<Vec<Complex64>> + ?Sized,
    {
        self.integrate(&CrossTensorProduct::new(left, right), bounds, calls)
    }

    /// Estimate $I_{rb} = \int_{\text{bin } b} \mathrm{d}y \, A_r(y)$, where `classifier` maps
    /// each point to a bin in `[1, num_bins]`.
    pub fn integral_of_tensor_product_w_bins<A, B>(
        &mut self,
        amplitudes: &A,
        classifier: &B,
        num_bins: usize,
        bounds: &Bounds,
        calls: usize,
    ) -> Result<Estimate<Matrix<Complex64>>>
    where
        A: Integrand<Vec<Complex64>> + ?Sized,
        B: Integrand<usize> + ?Sized,
    {
        self.integrate(
            &BinnedAmplitudes::new(amplitudes, classifier, num_bins),
            bounds,
            calls,
        )
    }
}

/// Perform the part of a half that is assigned to `core`, using its own copy of the random number
/// generator.
fn perform_half_contribution_from_core<A, R>(
    accumulator: &A,
    bounds: &Bounds,
    mut rng: R,
    calls: usize,
    core: usize,
    n_cores: usize,
    failed: &AtomicBool,
) -> Result<Option<A::Output>>
where
    A: Accumulator,
    R: Rng,
{
    // skip the random numbers that are used by the previous cores
    let skip = compute_calls_per_core(n_cores, calls) * core * bounds.dim();
    for _ in 0..skip {
        let _ = rng.gen::<f64>();
    }

    let actual_calls = compute_calls_for_core(core, n_cores, calls);
    trace!("core {} performs {} calls", core, actual_calls);

    // create a buffer for the sampled points such that
    // we do not need to allocate vectors in every call
    let mut x = vec![0.0; bounds.dim()];
    let mut sum = None;

    for _ in 0..actual_calls {
        if failed.load(Ordering::Relaxed) {
            break;
        }

        bounds.sample_into(&mut rng, &mut x);
        accumulator.accumulate(&mut sum, &x)?;
    }

    Ok(sum)
}

/// Perform one half with `calls` points on `n_cores` cores and advance `rng` past all random
/// numbers that were used.
fn perform_half<A, R>(
    accumulator: &A,
    bounds: &Bounds,
    rng: &mut R,
    calls: usize,
    n_cores: usize,
) -> Result<Option<A::Output>>
where
    A: Accumulator,
    R: Clone + Rng + Send + Sync,
{
    let rng_start = rng.clone();

    let partial_sums = run_on_cores(n_cores, |core, failed| {
        perform_half_contribution_from_core(
            accumulator,
            bounds,
            rng_start.clone(),
            calls,
            core,
            n_cores,
            failed,
        )
    })?;

    // return the updated rng
    for _ in 0..calls * bounds.dim() {
        let _ = rng.gen::<f64>();
    }

    merge(partial_sums)
}

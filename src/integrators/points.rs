//! Integration over batches of externally generated events.
//!
//! The events of a [`PointBatch`] are split by index: the first `n_pts / 2` events form the first
//! half, the remaining ones the second half. Apart from the cross-binned integrals, the sums are
//! multiplied with the volume of the batch and divided by `n_pts`.
use super::Integrator;
use crate::accumulators::{
    BinnedCrossProduct, BinnedWeights, DoubleBinnedProduct, Plain, TensorProduct,
};
use crate::callbacks::Callback;
use crate::core::error::Result;
use crate::core::estimators::{Estimate, Observable};
use crate::core::matrix::Matrix;
use crate::core::{Integrand, PointBatch};
use num_complex::Complex64;

impl<R, C: Callback> Integrator<R, C> {
    /// Estimate $\int \mathrm{d}y \, f(y)$ from the events in `batch`.
    pub fn integral_w_pts<V, I>(&self, integrand: &I, batch: &PointBatch) -> Result<Estimate<V>>
    where
        V: Observable,
        I: Integrand<V> + ?Sized,
    {
        self.integrate_batch(&Plain::new(integrand), batch, batch.volume())
    }

    /// Estimate $I_{ij} = \int \mathrm{d}y \, \overline{A_i(y)} A_j(y)$ from the events in
    /// `batch`.
    pub fn integral_of_tensor_product_w_pts<A>(
        &self,
        amplitudes: &A,
        batch: &PointBatch,
    ) -> Result<Estimate<Matrix<Complex64>>>
    where
        A: Integrand<Vec<Complex64>> + ?Sized,
    {
        self.integrate_batch(&TensorProduct::new(amplitudes), batch, batch.volume())
    }

    /// Histogram the events in `batch`: every event adds its `weight` to the bin returned by
    /// `classifier`. The result has `num_bins` entries.
    pub fn integral_b_w_pts<B, W>(
        &self,
        classifier: &B,
        weight: &W,
        num_bins: usize,
        batch: &PointBatch,
    ) -> Result<Estimate<Vec<f64>>>
    where
        B: Integrand<usize> + ?Sized,
        W: Integrand<f64> + ?Sized,
    {
        self.integrate_batch(
            &BinnedWeights::new(classifier, weight, num_bins),
            batch,
            batch.volume(),
        )
    }

    /// Estimate the `R` × `num_bins` matrix $I_{rb} = \int \mathrm{d}y \, \overline{g_b(y)}
    /// A_r(y)$ of the amplitudes with a binned function $g$, whose value in the bin given by
    /// `classifier` is returned by `binned_value`.
    ///
    /// The volume of the batch is not used: the sums are only divided by `n_pts`, so the
    /// per-event values must already contain the weight of each event.
    pub fn integral_b_tensor_func_w_pts<B, F, A>(
        &self,
        classifier: &B,
        binned_value: &F,
        num_bins: usize,
        amplitudes: &A,
        batch: &PointBatch,
    ) -> Result<Estimate<Matrix<Complex64>>>
    where
        B: Integrand<usize> + ?Sized,
        F: Integrand<Complex64> + ?Sized,
        A: Integrand<Vec<Complex64>> + ?Sized,
    {
        self.integrate_batch(
            &BinnedCrossProduct::new(classifier, binned_value, num_bins, amplitudes),
            batch,
            1.0,
        )
    }

    /// Estimate the `num_bins_b` × `num_bins_c` matrix of products $\overline{g_b} h_c$ of two
    /// binned functions, each given as `(classifier, value, num_bins)`.
    ///
    /// As for [`Integrator::integral_b_tensor_func_w_pts`], the volume of the batch is not used.
    pub fn integral_b_tensor_b_w_pts<B, F, D, G>(
        &self,
        binned_b: (&B, &F, usize),
        binned_c: (&D, &G, usize),
        batch: &PointBatch,
    ) -> Result<Estimate<Matrix<Complex64>>>
    where
        B: Integrand<usize> + ?Sized,
        F: Integrand<Complex64> + ?Sized,
        D: Integrand<usize> + ?Sized,
        G: Integrand<Complex64> + ?Sized,
    {
        self.integrate_batch(&DoubleBinnedProduct::new(binned_b, binned_c), batch, 1.0)
    }
}

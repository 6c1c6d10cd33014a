//! Accumulators fold the per-event contributions of one or more callables into a sum.
//!
//! Every accumulator describes how a single event contributes to the result; the integrators
//! take care of sampling, splitting the events into halves and normalizing the sums. Bin
//! classifiers return one-based bin ids, which are converted to zero-based indices by
//! [`bin_index`] before anything is stored.
use crate::core::error::{Error, Result};
use crate::core::estimators::Observable;
use crate::core::matrix::Matrix;
use crate::core::{check_dim, evaluate, Integrand};
use num_complex::Complex64;
use num_traits::Zero;
use std::marker::PhantomData;

/// Trait implemented by all accumulators.
pub trait Accumulator: Sync {
    /// The type of the accumulated sum.
    type Output: Observable;

    /// Make sure that all callables accept events with `dim` variables.
    fn check_dim(&self, dim: usize) -> Result<()>;

    /// Add the contribution of the event `x` to `sum`. The sum is `None` before the first event
    /// has been added, since its shape is only known after evaluating the callables.
    fn accumulate(&self, sum: &mut Option<Self::Output>, x: &[f64]) -> Result<()>;
}

/// Convert the one-based `bin` returned by a classifier into a zero-based index.
pub fn bin_index(bin: usize, num_bins: usize) -> Result<usize> {
    if (1..=num_bins).contains(&bin) {
        Ok(bin - 1)
    } else {
        Err(Error::BinIndex { bin, num_bins })
    }
}

pub(crate) fn add_value<V: Observable>(sum: &mut Option<V>, value: V) -> Result<()> {
    match sum {
        Some(sum) => sum.accumulate(&value),
        None => {
            *sum = Some(value);
            Ok(())
        }
    }
}

/// Returns the matrix stored in `sum`, creating a zero `rows` × `cols` matrix for the first
/// event, and makes sure its shape did not change.
fn matrix_with_shape(
    sum: &mut Option<Matrix<Complex64>>,
    rows: usize,
    cols: usize,
) -> Result<&mut Matrix<Complex64>> {
    let matrix = sum.get_or_insert_with(|| Matrix::from_elem(rows, cols, Complex64::zero()));

    if matrix.rows() != rows {
        return Err(Error::ShapeMismatch {
            expected: matrix.rows(),
            found: rows,
        });
    }

    if matrix.cols() != cols {
        return Err(Error::ShapeMismatch {
            expected: matrix.cols(),
            found: cols,
        });
    }

    Ok(matrix)
}

/// Add the outer product $\overline{a_i} b_j$ to `sum`.
fn add_outer_product(
    sum: &mut Option<Matrix<Complex64>>,
    left: &[Complex64],
    right: &[Complex64],
) -> Result<()> {
    let matrix = matrix_with_shape(sum, left.len(), right.len())?;

    for (i, a) in left.iter().enumerate() {
        let a = a.conj();

        for (j, b) in right.iter().enumerate() {
            matrix[(i, j)] += a * b;
        }
    }

    Ok(())
}

/// The integrand itself: a real or complex scalar, or a vector of them.
pub struct Plain<'a, I: ?Sized, V> {
    integrand: &'a I,
    value: PhantomData<fn() -> V>,
}

impl<'a, I: ?Sized, V> Plain<'a, I, V> {
    /// Constructor.
    pub fn new(integrand: &'a I) -> Self {
        Self {
            integrand,
            value: PhantomData,
        }
    }
}

impl<'a, I, V> Accumulator for Plain<'a, I, V>
where
    I: Integrand<V> + ?Sized,
    V: Observable,
{
    type Output = V;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.integrand, dim)
    }

    fn accumulate(&self, sum: &mut Option<V>, x: &[f64]) -> Result<()> {
        add_value(sum, evaluate(self.integrand, x)?)
    }
}

/// The tensor product $\overline{A_i} A_j$ of an amplitude vector with itself.
pub struct TensorProduct<'a, A: ?Sized> {
    amplitudes: &'a A,
}

impl<'a, A: ?Sized> TensorProduct<'a, A> {
    /// Constructor.
    pub fn new(amplitudes: &'a A) -> Self {
        Self { amplitudes }
    }
}

impl<'a, A> Accumulator for TensorProduct<'a, A>
where
    A: Integrand<Vec<Complex64>> + ?Sized,
{
    type Output = Matrix<Complex64>;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.amplitudes, dim)
    }

    fn accumulate(&self, sum: &mut Option<Matrix<Complex64>>, x: &[f64]) -> Result<()> {
        let a = evaluate(self.amplitudes, x)?;
        add_outer_product(sum, &a, &a)
    }
}

/// The tensor product $\overline{A_i} B_j$ of two amplitude vectors evaluated at the same event.
pub struct CrossTensorProduct<'a, A: ?Sized, B: ?Sized> {
    left: &'a A,
    right: &'a B,
}

impl<'a, A: ?Sized, B: ?Sized> CrossTensorProduct<'a, A, B> {
    /// Constructor.
    pub fn new(left: &'a A, right: &'a B) -> Self {
        Self { left, right }
    }
}

impl<'a, A, B> Accumulator for CrossTensorProduct<'a, A, B>
where
    A: Integrand<Vec<Complex64>> + ?Sized,
    B: Integrand<Vec<Complex64>> + ?Sized,
{
    type Output = Matrix<Complex64>;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.left, dim)?;
        check_dim(self.right, dim)
    }

    fn accumulate(&self, sum: &mut Option<Matrix<Complex64>>, x: &[f64]) -> Result<()> {
        let a = evaluate(self.left, x)?;
        let b = evaluate(self.right, x)?;
        add_outer_product(sum, &a, &b)
    }
}

/// The amplitudes restricted to bins: `A_r` is added to the entry `[r, bin - 1]` of an
/// `R` × `num_bins` matrix.
pub struct BinnedAmplitudes<'a, A: ?Sized, C: ?Sized> {
    amplitudes: &'a A,
    classifier: &'a C,
    num_bins: usize,
}

impl<'a, A: ?Sized, C: ?Sized> BinnedAmplitudes<'a, A, C> {
    /// Constructor.
    pub fn new(amplitudes: &'a A, classifier: &'a C, num_bins: usize) -> Self {
        Self {
            amplitudes,
            classifier,
            num_bins,
        }
    }
}

impl<'a, A, C> Accumulator for BinnedAmplitudes<'a, A, C>
where
    A: Integrand<Vec<Complex64>> + ?Sized,
    C: Integrand<usize> + ?Sized,
{
    type Output = Matrix<Complex64>;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.amplitudes, dim)?;
        check_dim(self.classifier, dim)
    }

    fn accumulate(&self, sum: &mut Option<Matrix<Complex64>>, x: &[f64]) -> Result<()> {
        let bin = bin_index(evaluate(self.classifier, x)?, self.num_bins)?;
        let a = evaluate(self.amplitudes, x)?;
        let matrix = matrix_with_shape(sum, a.len(), self.num_bins)?;

        for (r, value) in a.into_iter().enumerate() {
            matrix[(r, bin)] += value;
        }

        Ok(())
    }
}

/// A histogram of per-event weights: `weight(x)` is added to the entry `bin(x) - 1`.
pub struct BinnedWeights<'a, C: ?Sized, W: ?Sized> {
    classifier: &'a C,
    weight: &'a W,
    num_bins: usize,
}

impl<'a, C: ?Sized, W: ?Sized> BinnedWeights<'a, C, W> {
    /// Constructor.
    pub fn new(classifier: &'a C, weight: &'a W, num_bins: usize) -> Self {
        Self {
            classifier,
            weight,
            num_bins,
        }
    }
}

impl<'a, C, W> Accumulator for BinnedWeights<'a, C, W>
where
    C: Integrand<usize> + ?Sized,
    W: Integrand<f64> + ?Sized,
{
    type Output = Vec<f64>;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.classifier, dim)?;
        check_dim(self.weight, dim)
    }

    fn accumulate(&self, sum: &mut Option<Vec<f64>>, x: &[f64]) -> Result<()> {
        let bin = bin_index(evaluate(self.classifier, x)?, self.num_bins)?;
        let weight = evaluate(self.weight, x)?;
        let num_bins = self.num_bins;

        sum.get_or_insert_with(|| vec![0.0; num_bins])[bin] += weight;

        Ok(())
    }
}

/// The product of a binned function with an amplitude vector: $\overline{f_b} A_r$ is added to
/// the entry `[r, bin - 1]` of an `R` × `num_bins` matrix, where the classifier determines the
/// bin and `binned_value` the value of the binned function.
pub struct BinnedCrossProduct<'a, C: ?Sized, F: ?Sized, A: ?Sized> {
    classifier: &'a C,
    binned_value: &'a F,
    num_bins: usize,
    amplitudes: &'a A,
}

impl<'a, C: ?Sized, F: ?Sized, A: ?Sized> BinnedCrossProduct<'a, C, F, A> {
    /// Constructor.
    pub fn new(classifier: &'a C, binned_value: &'a F, num_bins: usize, amplitudes: &'a A) -> Self {
        Self {
            classifier,
            binned_value,
            num_bins,
            amplitudes,
        }
    }
}

impl<'a, C, F, A> Accumulator for BinnedCrossProduct<'a, C, F, A>
where
    C: Integrand<usize> + ?Sized,
    F: Integrand<Complex64> + ?Sized,
    A: Integrand<Vec<Complex64>> + ?Sized,
{
    type Output = Matrix<Complex64>;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.classifier, dim)?;
        check_dim(self.binned_value, dim)?;
        check_dim(self.amplitudes, dim)
    }

    fn accumulate(&self, sum: &mut Option<Matrix<Complex64>>, x: &[f64]) -> Result<()> {
        let bin = bin_index(evaluate(self.classifier, x)?, self.num_bins)?;
        let binned_value = evaluate(self.binned_value, x)?.conj();
        let a = evaluate(self.amplitudes, x)?;
        let matrix = matrix_with_shape(sum, a.len(), self.num_bins)?;

        for (r, value) in a.into_iter().enumerate() {
            matrix[(r, bin)] += binned_value * value;
        }

        Ok(())
    }
}

/// The product of two binned functions: $\overline{f_b} f_c$ is added to the entry
/// `[b - 1, c - 1]` of a `num_bins_b` × `num_bins_c` matrix.
pub struct DoubleBinnedProduct<'a, B: ?Sized, F: ?Sized, C: ?Sized, G: ?Sized> {
    classifier_b: &'a B,
    value_b: &'a F,
    num_bins_b: usize,
    classifier_c: &'a C,
    value_c: &'a G,
    num_bins_c: usize,
}

impl<'a, B: ?Sized, F: ?Sized, C: ?Sized, G: ?Sized> DoubleBinnedProduct<'a, B, F, C, G> {
    /// Constructor. The pairs `(classifier_b, value_b)` and `(classifier_c, value_c)` describe
    /// the two binned functions.
    pub fn new(
        (classifier_b, value_b, num_bins_b): (&'a B, &'a F, usize),
        (classifier_c, value_c, num_bins_c): (&'a C, &'a G, usize),
    ) -> Self {
        Self {
            classifier_b,
            value_b,
            num_bins_b,
            classifier_c,
            value_c,
            num_bins_c,
        }
    }
}

impl<'a, B, F, C, G> Accumulator for DoubleBinnedProduct<'a, B, F, C, G>
where
    B: Integrand<usize> + ?Sized,
    F: Integrand<Complex64> + ?Sized,
    C: Integrand<usize> + ?Sized,
    G: Integrand<Complex64> + ?Sized,
{
    type Output = Matrix<Complex64>;

    fn check_dim(&self, dim: usize) -> Result<()> {
        check_dim(self.classifier_b, dim)?;
        check_dim(self.value_b, dim)?;
        check_dim(self.classifier_c, dim)?;
        check_dim(self.value_c, dim)
    }

    fn accumulate(&self, sum: &mut Option<Matrix<Complex64>>, x: &[f64]) -> Result<()> {
        let b = bin_index(evaluate(self.classifier_b, x)?, self.num_bins_b)?;
        let c = bin_index(evaluate(self.classifier_c, x)?, self.num_bins_c)?;
        let value = evaluate(self.value_b, x)?.conj() * evaluate(self.value_c, x)?;

        matrix_with_shape(sum, self.num_bins_b, self.num_bins_c)?[(b, c)] += value;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CallError, FnIntegrand};

    fn fold<A: Accumulator>(accumulator: &A, events: &[Vec<f64>]) -> Result<Option<A::Output>> {
        let mut sum = None;
        for x in events {
            accumulator.accumulate(&mut sum, x)?;
        }
        Ok(sum)
    }

    #[test]
    fn test_bin_index() {
        assert_eq!(bin_index(1, 3).unwrap(), 0);
        assert_eq!(bin_index(3, 3).unwrap(), 2);
        assert!(matches!(
            bin_index(0, 3),
            Err(Error::BinIndex {
                bin: 0,
                num_bins: 3
            })
        ));
        assert!(matches!(bin_index(4, 3), Err(Error::BinIndex { .. })));
    }

    #[test]
    fn test_tensor_product_term() {
        let amplitudes = FnIntegrand::new(1, |x: &[f64]| {
            Ok(vec![Complex64::new(x[0], 0.0), Complex64::new(0.0, 2.0)])
        });

        let sum = fold(&TensorProduct::new(&amplitudes), &[vec![3.0]])
            .unwrap()
            .unwrap();

        assert_eq!(sum.shape(), (2, 2));
        assert_eq!(sum[(0, 0)], Complex64::new(9.0, 0.0));
        assert_eq!(sum[(0, 1)], Complex64::new(0.0, 6.0));
        assert_eq!(sum[(1, 0)], Complex64::new(0.0, -6.0));
        assert_eq!(sum[(1, 1)], Complex64::new(4.0, 0.0));
    }

    #[test]
    fn test_cross_tensor_product_shape() {
        let left = FnIntegrand::new(1, |_: &[f64]| Ok(vec![Complex64::new(1.0, 1.0); 3]));
        let right = FnIntegrand::new(1, |_: &[f64]| Ok(vec![Complex64::new(2.0, 0.0); 2]));

        let sum = fold(&CrossTensorProduct::new(&left, &right), &[vec![0.0], vec![1.0]])
            .unwrap()
            .unwrap();

        assert_eq!(sum.shape(), (3, 2));
        assert_eq!(sum[(2, 1)], Complex64::new(4.0, -4.0));
    }

    #[test]
    fn test_changing_amplitude_length() {
        let amplitudes = FnIntegrand::new(1, |x: &[f64]| {
            Ok(vec![Complex64::new(1.0, 0.0); if x[0] < 0.5 { 2 } else { 3 }])
        });

        assert!(matches!(
            fold(&TensorProduct::new(&amplitudes), &[vec![0.0], vec![1.0]]),
            Err(Error::ShapeMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn test_binned_amplitudes() {
        let amplitudes = FnIntegrand::new(1, |x: &[f64]| {
            Ok(vec![Complex64::new(x[0], 0.0), Complex64::new(0.0, x[0])])
        });
        let classifier = FnIntegrand::new(1, |x: &[f64]| Ok(if x[0] < 2.0 { 1 } else { 3 }));

        let sum = fold(
            &BinnedAmplitudes::new(&amplitudes, &classifier, 3),
            &[vec![1.0], vec![2.0], vec![4.0]],
        )
        .unwrap()
        .unwrap();

        assert_eq!(sum.shape(), (2, 3));
        assert_eq!(sum[(0, 0)], Complex64::new(1.0, 0.0));
        assert_eq!(sum[(0, 1)], Complex64::zero());
        assert_eq!(sum[(0, 2)], Complex64::new(6.0, 0.0));
        assert_eq!(sum[(1, 2)], Complex64::new(0.0, 6.0));
    }

    #[test]
    fn test_binned_weights() {
        let classifier = FnIntegrand::new(1, |x: &[f64]| Ok(x[0] as usize));
        let weight = FnIntegrand::new(1, |x: &[f64]| Ok(10.0 * x[0]));

        let sum = fold(
            &BinnedWeights::new(&classifier, &weight, 2),
            &[vec![1.0], vec![2.0], vec![1.0]],
        )
        .unwrap()
        .unwrap();

        assert_eq!(sum, vec![20.0, 20.0]);
    }

    #[test]
    fn test_binned_weights_out_of_range() {
        let classifier = FnIntegrand::new(1, |x: &[f64]| Ok(x[0] as usize));
        let weight = FnIntegrand::new(1, |_: &[f64]| Ok(1.0));

        assert!(matches!(
            fold(
                &BinnedWeights::new(&classifier, &weight, 2),
                &[vec![1.0], vec![3.0]]
            ),
            Err(Error::BinIndex {
                bin: 3,
                num_bins: 2
            })
        ));
    }

    #[test]
    fn test_binned_cross_product() {
        let classifier = FnIntegrand::new(1, |x: &[f64]| Ok(x[0] as usize));
        let binned_value = FnIntegrand::new(1, |_: &[f64]| Ok(Complex64::new(0.0, 1.0)));
        let amplitudes = FnIntegrand::new(1, |_: &[f64]| {
            Ok(vec![Complex64::new(1.0, 0.0), Complex64::new(0.0, 1.0)])
        });

        let sum = fold(
            &BinnedCrossProduct::new(&classifier, &binned_value, 2, &amplitudes),
            &[vec![2.0]],
        )
        .unwrap()
        .unwrap();

        assert_eq!(sum.shape(), (2, 2));
        assert_eq!(sum[(0, 1)], Complex64::new(0.0, -1.0));
        assert_eq!(sum[(1, 1)], Complex64::new(1.0, 0.0));
        assert_eq!(sum[(0, 0)], Complex64::zero());
    }

    #[test]
    fn test_double_binned_product() {
        let classifier_b = FnIntegrand::new(2, |x: &[f64]| Ok(x[0] as usize));
        let value_b = FnIntegrand::new(2, |_: &[f64]| Ok(Complex64::new(1.0, 1.0)));
        let classifier_c = FnIntegrand::new(2, |x: &[f64]| Ok(x[1] as usize));
        let value_c = FnIntegrand::new(2, |_: &[f64]| Ok(Complex64::new(2.0, 0.0)));

        let sum = fold(
            &DoubleBinnedProduct::new(
                (&classifier_b, &value_b, 2),
                (&classifier_c, &value_c, 3),
            ),
            &[vec![1.0, 3.0], vec![1.0, 3.0], vec![2.0, 1.0]],
        )
        .unwrap()
        .unwrap();

        assert_eq!(sum.shape(), (2, 3));
        assert_eq!(sum[(0, 2)], Complex64::new(4.0, -4.0));
        assert_eq!(sum[(1, 0)], Complex64::new(2.0, -2.0));
        assert_eq!(sum[(0, 0)], Complex64::zero());
    }

    #[test]
    fn test_check_dim() {
        let amplitudes = FnIntegrand::new(2, |_: &[f64]| Ok(vec![Complex64::zero()]));
        let classifier =
            FnIntegrand::new(3, |_: &[f64]| -> std::result::Result<usize, CallError> { Ok(1) });

        let accumulator = BinnedAmplitudes::new(&amplitudes, &classifier, 1);

        assert!(matches!(
            accumulator.check_dim(2),
            Err(Error::DimensionMismatch {
                expected: 3,
                found: 2
            })
        ));
    }
}

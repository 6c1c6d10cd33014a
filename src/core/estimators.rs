//! This module contains everything related to estimators.
//!
//! All integrators use the same split-sample estimator: the events are divided into two
//! disjoint halves, the integral is estimated independently from each half, $I_1$ and $I_2$, and
//! the results are combined into
//!
//! $$ I = \frac{I_1 + I_2}{2}, \qquad \Delta I = \frac{|I_1 - I_2|}{2}. $$
//!
//! The error $\Delta I$ is a cheap consistency check and not a variance based standard error; it
//! tends to underestimate the statistical uncertainty.
use crate::core::error::{Error, Result};
use crate::core::matrix::Matrix;
use num_complex::Complex64;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Scalar types the integrals can be computed for: `f64` and `Complex64`.
pub trait Sample:
    Copy
    + Debug
    + Send
    + Sync
    + Zero
    + Add<Output = Self>
    + AddAssign
    + Sub<Output = Self>
    + Mul<f64, Output = Self>
{
    /// Returns the absolute value, or the modulus for complex numbers.
    fn modulus(self) -> f64;
}

impl Sample for f64 {
    fn modulus(self) -> f64 {
        self.abs()
    }
}

impl Sample for Complex64 {
    fn modulus(self) -> f64 {
        self.norm()
    }
}

/// The shape of a quantity accumulated by an integrator: a scalar, a vector or a matrix.
pub trait Observable: Clone + Debug + Send {
    /// The type of the error estimate, which has the same shape but is always real.
    type Magnitude: Clone + Debug + Send;

    /// Returns an object with the same shape and all entries set to zero.
    fn zeros_like(&self) -> Self;

    /// Add `other` to `self`; fails if the shapes disagree.
    fn accumulate(&mut self, other: &Self) -> Result<()>;

    /// Multiply every entry with `factor`.
    fn scale(&mut self, factor: f64);

    /// Combine two independent estimates into their mean and half their absolute difference.
    fn split_estimate(first: &Self, second: &Self) -> Result<(Self, Self::Magnitude)>;
}

macro_rules! impl_observable_for_sample {
    ($($sample:ty),*) => {
        $(
            impl Observable for $sample {
                type Magnitude = f64;

                fn zeros_like(&self) -> Self {
                    Self::zero()
                }

                fn accumulate(&mut self, other: &Self) -> Result<()> {
                    *self += *other;
                    Ok(())
                }

                fn scale(&mut self, factor: f64) {
                    *self = *self * factor;
                }

                fn split_estimate(first: &Self, second: &Self) -> Result<(Self, f64)> {
                    Ok(mean_and_error(*first, *second))
                }
            }
        )*
    };
}

impl_observable_for_sample!(f64, Complex64);

fn mean_and_error<S: Sample>(first: S, second: S) -> (S, f64) {
    ((first + second) * 0.5, (first - second).modulus() * 0.5)
}

fn check_shape(expected: usize, found: usize) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ShapeMismatch { expected, found })
    }
}

impl<S: Sample> Observable for Vec<S> {
    type Magnitude = Vec<f64>;

    fn zeros_like(&self) -> Self {
        vec![S::zero(); self.len()]
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        check_shape(self.len(), other.len())?;

        for (lhs, rhs) in self.iter_mut().zip(other) {
            *lhs += *rhs;
        }

        Ok(())
    }

    fn scale(&mut self, factor: f64) {
        self.iter_mut().for_each(|x| *x = *x * factor);
    }

    fn split_estimate(first: &Self, second: &Self) -> Result<(Self, Vec<f64>)> {
        check_shape(first.len(), second.len())?;

        Ok(first
            .iter()
            .zip(second)
            .map(|(&a, &b)| mean_and_error(a, b))
            .unzip())
    }
}

impl<S: Sample> Observable for Matrix<S> {
    type Magnitude = Matrix<f64>;

    fn zeros_like(&self) -> Self {
        Self::from_elem(self.rows(), self.cols(), S::zero())
    }

    fn accumulate(&mut self, other: &Self) -> Result<()> {
        check_shape(self.as_slice().len(), other.as_slice().len())?;
        check_shape(self.cols(), other.cols())?;

        for (lhs, rhs) in self.as_mut_slice().iter_mut().zip(other.as_slice()) {
            *lhs += *rhs;
        }

        Ok(())
    }

    fn scale(&mut self, factor: f64) {
        self.as_mut_slice()
            .iter_mut()
            .for_each(|x| *x = *x * factor);
    }

    fn split_estimate(first: &Self, second: &Self) -> Result<(Self, Matrix<f64>)> {
        check_shape(first.as_slice().len(), second.as_slice().len())?;
        check_shape(first.cols(), second.cols())?;

        let (mean, error): (Vec<_>, Vec<_>) = first
            .as_slice()
            .iter()
            .zip(second.as_slice())
            .map(|(&a, &b)| mean_and_error(a, b))
            .unzip();

        let (rows, cols) = first.shape();
        let shape_error = || Error::ShapeMismatch {
            expected: rows * cols,
            found: second.as_slice().len(),
        };

        Ok((
            Self::from_vec(rows, cols, mean).ok_or_else(shape_error)?,
            Matrix::from_vec(rows, cols, error).ok_or_else(shape_error)?,
        ))
    }
}

/// The result of one half of a split-sample integration.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Checkpoint<V> {
    calls: usize,
    sum: V,
    estimate: V,
}

impl<V: Observable> Checkpoint<V> {
    /// Constructor. The `estimate` is the `sum` over all `calls` multiplied by `scale`.
    pub(crate) fn new(calls: usize, sum: V, scale: f64) -> Self {
        let mut estimate = sum.clone();
        estimate.scale(scale);

        Self {
            calls,
            sum,
            estimate,
        }
    }

    /// Returns the number of events contributing to this half.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Returns the plain sum of the per-event contributions, before any normalization.
    pub fn sum(&self) -> &V {
        &self.sum
    }

    /// Returns the estimate of the integral obtained from this half alone.
    pub fn estimate(&self) -> &V {
        &self.estimate
    }
}

/// The value and the error estimate of an integral, together with the results of both halves.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(bound(
    serialize = "V: Serialize, V::Magnitude: Serialize",
    deserialize = "V: Deserialize<'de>, V::Magnitude: Deserialize<'de>"
))]
pub struct Estimate<V: Observable> {
    value: V,
    error: V::Magnitude,
    halves: Vec<Checkpoint<V>>,
}

impl<V: Observable> Estimate<V> {
    /// Combine the two halves of a split-sample integration.
    pub(crate) fn new(halves: Vec<Checkpoint<V>>) -> Result<Self> {
        let (value, error) = match halves.as_slice() {
            [first, second] => V::split_estimate(first.estimate(), second.estimate())?,
            _ => {
                return Err(Error::InvalidSampleCount(format!(
                    "expected two halves, got {}",
                    halves.len()
                )))
            }
        };

        Ok(Self {
            value,
            error,
            halves,
        })
    }

    /// Returns the estimated integral.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// Returns the error estimate, half the absolute difference of the two halves.
    pub fn error(&self) -> &V::Magnitude {
        &self.error
    }

    /// Returns the results of the two halves.
    pub fn halves(&self) -> &[Checkpoint<V>] {
        &self.halves
    }

    /// Returns the total number of events used for this estimate.
    pub fn calls(&self) -> usize {
        self.halves.iter().map(Checkpoint::calls).sum()
    }

    /// Destructure the estimate into value and error.
    pub fn into_parts(self) -> (V, V::Magnitude) {
        (self.value, self.error)
    }
}

#![warn(clippy::all, clippy::cargo, clippy::nursery, clippy::pedantic)]
#![warn(missing_docs)]

//! The crate `pwaint` provides [Monte Carlo integration] routines for the normalization integrals
//! of a partial-wave analysis (PWA). Given a vector of complex amplitudes $A_i(y)$ over a phase
//! space $y$, it estimates the matrix
//!
//! $$ I_{ij} = \int \mathrm{d}y \, \overline{A_i(y)} A_j(y) $$
//!
//! together with a number of variants: integrals of plain scalar or vector functions, products of
//! two different amplitude vectors, and integrals resolved into bins of a user-provided
//! classifier.
//!
//! # Features
//!
//! - **Two kinds of samples**. Points are either drawn uniformly from a hyper-rectangle given by
//! [`Bounds`], or taken from a [`PointBatch`] of externally generated (for example accepted
//! Monte Carlo) events.
//! - **Split-sample error estimate**. Every integral is estimated independently from two disjoint
//! halves of the sample. The value is their mean and the error half their absolute difference,
//! computed entry by entry.
//! - **Generic random number generator**. Every random number generator that implements the `Rng`
//! trait from the `rand` crate can be used. Its state after an integration is available, so that
//! a later run can continue the same random sequence.
//! - **Reproducibility**. The results only depend on the random number generator and its seed, and
//! not on the number of cores the integrator was started with.
//!
//! # What is ...?
//!
//! - an *integrand* or *callable* is anything implementing [`Integrand`], for example a closure
//! wrapped in [`FnIntegrand`],
//! - the number of *calls* is the number of points used for each of the two halves,
//! - a *classifier* maps a point to a one-based bin id in `[1, num_bins]`,
//! - the *volume* is the product of the widths of the bounds, or the phase space volume given
//! together with a batch of events.
//!
//! [Monte Carlo integration]: https://en.wikipedia.org/wiki/Monte_Carlo_integration

pub mod accumulators;
pub mod callbacks;
pub mod core;
pub mod integrators;

pub use crate::callbacks::{Callback, SimpleCallback, SinkCallback};
pub use crate::core::*;
pub use crate::integrators::{Integrator, Options};

//! Split-sample Monte Carlo integrators.
//!
//! An [`Integrator`] owns the random number generator, the [`Options`] and a [`Callback`]. It
//! estimates integrals either over a hyper-rectangle, drawing uniformly distributed points (see
//! the methods in [`bounded`]), or over a [`PointBatch`] of externally generated events (see
//! [`points`]). In both cases the events are split into two disjoint halves and each half is
//! accumulated independently, see [`crate::core::estimators`].
pub mod bounded;
pub mod points;

use crate::accumulators::{add_value, Accumulator};
use crate::callbacks::{Callback, SinkCallback};
use crate::core::error::{Error, Result};
use crate::core::estimators::{Checkpoint, Estimate, Observable};
use crate::core::PointBatch;
use crate::core::{compute_calls_for_core, compute_calls_per_core};
use crossbeam as cb;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::sync::atomic::{AtomicBool, Ordering};

/// Settings of an [`Integrator`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Options {
    /// The number of threads each half of an integration is distributed on.
    pub n_cores: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self { n_cores: 1 }
    }
}

impl Options {
    /// Read the options from a JSON string such as `{ "n_cores": 4 }`. Missing fields are set to
    /// their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        Ok(options.normalized())
    }

    fn normalized(mut self) -> Self {
        self.n_cores = self.n_cores.max(1);
        self
    }
}

/// Monte Carlo integrator producing split-sample estimates.
///
/// The random number generator `rng` is the only state that changes between integrations: each
/// integration over [`crate::Bounds`] consumes `2 * calls * dim` random numbers, independently of
/// the number of cores. The state after the last integration is available from
/// [`Integrator::rng`].
pub struct Integrator<R, C = SinkCallback> {
    rng: R,
    options: Options,
    callback: C,
}

impl<R> Integrator<R> {
    /// Construct an integrator drawing random numbers from `rng`, running on a single core and
    /// without a callback.
    pub fn new(rng: R) -> Self {
        Self {
            rng,
            options: Options::default(),
            callback: SinkCallback {},
        }
    }
}

impl<R, C> Integrator<R, C> {
    /// Replace the options.
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options.normalized();
        self
    }

    /// Distribute the evaluation of each half on `n_cores` threads.
    pub fn with_cores(mut self, n_cores: usize) -> Self {
        self.options.n_cores = n_cores.max(1);
        self
    }

    /// Replace the callback, which is called after each integration.
    pub fn with_callback<D: Callback>(self, callback: D) -> Integrator<R, D> {
        Integrator {
            rng: self.rng,
            options: self.options,
            callback,
        }
    }

    /// Returns the random number generator in its current state.
    pub fn rng(&self) -> &R {
        &self.rng
    }

    /// Returns the options.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Destructure the integrator and return the random number generator.
    pub fn into_rng(self) -> R {
        self.rng
    }
}

impl<R, C: Callback> Integrator<R, C> {
    /// Integrate `accumulator` over the events of `batch`. The first `n_pts / 2` events form the
    /// first half and the remaining ones the second half. The sum of each half is multiplied by
    /// `weight` and divided by `n_pts / 2`, so that the final value is the sum over all events
    /// times `weight / n_pts`.
    pub fn integrate_batch<A: Accumulator>(
        &self,
        accumulator: &A,
        batch: &PointBatch,
        weight: f64,
    ) -> Result<Estimate<A::Output>> {
        accumulator.check_dim(batch.n_vars())?;

        let n_cores = self.options.n_cores;
        let scale = 2.0 * weight / batch.n_pts() as f64;
        let [first, second] = batch.halves();

        let first = (first.len(), batch_half(accumulator, batch, first, n_cores)?);
        debug!("first half of {} events finished", first.0);
        let second = (second.len(), batch_half(accumulator, batch, second, n_cores)?);
        debug!("second half of {} events finished", second.0);

        self.finish(first, second, scale)
    }

    /// Turn the sums of both halves into an [`Estimate`], calling the callback once per half.
    fn finish<V: Observable>(
        &self,
        (first_calls, first): (usize, Option<V>),
        (second_calls, second): (usize, Option<V>),
        scale: f64,
    ) -> Result<Estimate<V>> {
        // a half without any events contributes zero
        let (first, second) = match (first, second) {
            (Some(first), Some(second)) => (first, second),
            (None, Some(second)) => (second.zeros_like(), second),
            (Some(first), None) => {
                let zeros = first.zeros_like();
                (first, zeros)
            }
            (None, None) => {
                return Err(Error::InvalidSampleCount(
                    "no events have been evaluated".to_string(),
                ))
            }
        };

        let mut halves = Vec::with_capacity(2);
        halves.push(Checkpoint::new(first_calls, first, scale));
        self.callback.print(&halves);
        halves.push(Checkpoint::new(second_calls, second, scale));
        self.callback.print(&halves);

        Estimate::new(halves)
    }
}

/// Accumulate the events of `batch` with indices in `range`, distributed on `n_cores` threads.
fn batch_half<A: Accumulator>(
    accumulator: &A,
    batch: &PointBatch,
    range: Range<usize>,
    n_cores: usize,
) -> Result<Option<A::Output>> {
    let calls = range.len();
    let offset = range.start;
    let calls_per_core = compute_calls_per_core(n_cores, calls);

    let partial_sums = run_on_cores(n_cores, |core, failed| {
        let start = offset + (core * calls_per_core).min(calls);
        let end = start + compute_calls_for_core(core, n_cores, calls);
        let mut sum = None;

        for index in start..end {
            if failed.load(Ordering::Relaxed) {
                break;
            }

            accumulator.accumulate(&mut sum, batch.point(index))?;
        }

        Ok(sum)
    })?;

    merge(partial_sums)
}

/// Run `work` for each core on its own thread and collect the results in the order of the cores.
///
/// If any of the threads fails, the flag passed to the others is set so that they can stop early,
/// and the error of the first failing core is returned.
fn run_on_cores<T, F>(n_cores: usize, work: F) -> Result<Vec<T>>
where
    T: Send,
    F: Fn(usize, &AtomicBool) -> Result<T> + Sync,
{
    let failed = AtomicBool::new(false);

    let results = cb::thread::scope(|s| {
        let work = &work;
        let failed = &failed;

        let handles = (0..n_cores)
            .map(|core| {
                s.spawn(move |_| {
                    let result = work(core, failed);
                    if result.is_err() {
                        failed.store(true, Ordering::Relaxed);
                    }
                    result
                })
            })
            .collect::<Vec<_>>();

        // wait for the threads to finish
        handles
            .into_iter()
            .map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|panic| std::panic::resume_unwind(panic))
            })
            .collect::<Vec<_>>()
    })
    .unwrap_or_else(|panic| std::panic::resume_unwind(panic));

    results.into_iter().collect()
}

/// Add up the partial sums of the different cores.
fn merge<V: Observable>(partial_sums: Vec<Option<V>>) -> Result<Option<V>> {
    let mut total = None;

    for partial_sum in partial_sums.into_iter().flatten() {
        add_value(&mut total, partial_sum)?;
    }

    Ok(total)
}

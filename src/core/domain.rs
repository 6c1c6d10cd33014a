//! Integration domains: hyper-rectangles sampled uniformly and batches of pre-generated events.
use crate::core::error::{Error, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::ops::Range;

/// A hyper-rectangular integration domain, given by one `(lower, upper)` pair per variable.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "Vec<(f64, f64)>", into = "Vec<(f64, f64)>")]
pub struct Bounds {
    limits: Vec<(f64, f64)>,
}

impl Bounds {
    /// Constructor. Fails if `limits` is empty or if any interval has `lower > upper`. Degenerate
    /// intervals with `lower == upper` are allowed and lead to a vanishing volume.
    pub fn new(limits: Vec<(f64, f64)>) -> Result<Self> {
        if limits.is_empty() {
            return Err(Error::InvalidBounds("no variables given".to_string()));
        }

        for (index, &(lower, upper)) in limits.iter().enumerate() {
            if !lower.is_finite() || !upper.is_finite() {
                return Err(Error::InvalidBounds(format!(
                    "interval {} = [{}, {}] is not finite",
                    index, lower, upper
                )));
            }

            if lower > upper {
                return Err(Error::InvalidBounds(format!(
                    "interval {} has lower limit {} above upper limit {}",
                    index, lower, upper
                )));
            }
        }

        Ok(Self { limits })
    }

    /// Returns the number of variables.
    pub fn dim(&self) -> usize {
        self.limits.len()
    }

    /// Returns the `(lower, upper)` pairs.
    pub fn limits(&self) -> &[(f64, f64)] {
        &self.limits
    }

    /// Returns the volume $\prod_i (b_i - a_i)$ of the domain.
    pub fn volume(&self) -> f64 {
        self.limits
            .iter()
            .map(|(lower, upper)| upper - lower)
            .product()
    }

    /// Overwrite `x` with a point drawn uniformly from the domain. Every coordinate consumes
    /// exactly one random number of `rng`.
    pub fn sample_into<R: Rng>(&self, rng: &mut R, x: &mut [f64]) {
        debug_assert_eq!(x.len(), self.limits.len());

        for (value, &(lower, upper)) in x.iter_mut().zip(self.limits.iter()) {
            *value = lower + (upper - lower) * rng.gen::<f64>();
        }
    }

    /// Lazily draw `count` points uniformly distributed in the domain.
    pub fn draw<'a, R: Rng>(&'a self, rng: &'a mut R, count: usize) -> UniformPoints<'a, R> {
        UniformPoints {
            bounds: self,
            rng,
            remaining: count,
        }
    }
}

impl TryFrom<Vec<(f64, f64)>> for Bounds {
    type Error = Error;

    fn try_from(limits: Vec<(f64, f64)>) -> Result<Self> {
        Self::new(limits)
    }
}

impl From<Bounds> for Vec<(f64, f64)> {
    fn from(bounds: Bounds) -> Self {
        bounds.limits
    }
}

/// Iterator over uniformly distributed points, see [`Bounds::draw`].
pub struct UniformPoints<'a, R> {
    bounds: &'a Bounds,
    rng: &'a mut R,
    remaining: usize,
}

impl<'a, R: Rng> Iterator for UniformPoints<'a, R> {
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        self.remaining -= 1;

        let mut x = vec![0.0; self.bounds.dim()];
        self.bounds.sample_into(&mut *self.rng, &mut x);

        Some(x)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// A batch of externally generated events, for example accepted Monte Carlo events from a
/// detector simulation.
///
/// Only the first `n_pts` events are used. The `volume` is multiplied into the sums as is, it
/// must already contain the weight of a single event relative to the density of the events.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "PointBatchData")]
pub struct PointBatch {
    n_vars: usize,
    /// Coordinates, stored event after event.
    data: Vec<f64>,
    n_pts: usize,
    volume: f64,
}

#[derive(Deserialize)]
struct PointBatchData {
    n_vars: usize,
    data: Vec<f64>,
    n_pts: usize,
    volume: f64,
}

impl TryFrom<PointBatchData> for PointBatch {
    type Error = Error;

    fn try_from(batch: PointBatchData) -> Result<Self> {
        Self::with_data(batch.n_vars, batch.data, batch.n_pts, batch.volume)
    }
}

impl PointBatch {
    /// Construct a batch from `rows`, where each row holds the values of a single variable for
    /// all events (variables × events).
    pub fn from_rows(rows: Vec<Vec<f64>>, n_pts: usize, volume: f64) -> Result<Self> {
        let n_vars = rows.len();
        let events = rows.first().map_or(0, Vec::len);

        if let Some(row) = rows.iter().find(|row| row.len() != events) {
            return Err(Error::ShapeMismatch {
                expected: events,
                found: row.len(),
            });
        }

        let mut data = Vec::with_capacity(n_vars * events);
        for event in 0..events {
            data.extend(rows.iter().map(|row| row[event]));
        }

        Self::with_data(n_vars, data, n_pts, volume)
    }

    /// Construct a batch from a list of events, each being a point of the phase space.
    pub fn from_events(events: Vec<Vec<f64>>, n_pts: usize, volume: f64) -> Result<Self> {
        let n_vars = events.first().map_or(0, Vec::len);

        if let Some(event) = events.iter().find(|event| event.len() != n_vars) {
            return Err(Error::ShapeMismatch {
                expected: n_vars,
                found: event.len(),
            });
        }

        let data = events.into_iter().flatten().collect();

        Self::with_data(n_vars, data, n_pts, volume)
    }

    fn with_data(n_vars: usize, data: Vec<f64>, n_pts: usize, volume: f64) -> Result<Self> {
        if n_vars == 0 {
            return Err(Error::InvalidSampleCount(
                "the batch does not contain any variables".to_string(),
            ));
        }

        let events = data.len() / n_vars;

        if n_pts == 0 || n_pts > events {
            return Err(Error::InvalidSampleCount(format!(
                "n_pts = {} must be between 1 and the number of events, {}",
                n_pts, events
            )));
        }

        Ok(Self {
            n_vars,
            data,
            n_pts,
            volume,
        })
    }

    /// Returns the number of variables of each event.
    pub fn n_vars(&self) -> usize {
        self.n_vars
    }

    /// Returns the number of events taking part in the integration.
    pub fn n_pts(&self) -> usize {
        self.n_pts
    }

    /// Returns the total volume (weight) multiplied into the sums.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Returns the event with the (zero-based) `index`.
    pub fn point(&self, index: usize) -> &[f64] {
        &self.data[index * self.n_vars..(index + 1) * self.n_vars]
    }

    /// Returns the index ranges of the two halves: the first `n_pts / 2` events and the
    /// remaining ones.
    pub fn halves(&self) -> [Range<usize>; 2] {
        let middle = self.n_pts / 2;
        [0..middle, middle..self.n_pts]
    }
}

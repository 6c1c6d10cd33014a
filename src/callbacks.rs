//! Implementation of different callback functions.
use crate::core::estimators::{Checkpoint, Observable};
use log::info;

/// Trait for implementing callbacks for split-sample integrations.
pub trait Callback {
    /// This method is called after each finished half and may report information about it. When
    /// it is called after the second half, `chkpts` contains both halves.
    fn print<V: Observable>(&self, chkpts: &[Checkpoint<V>]);
}

/// A callback function that does nothing
pub struct SinkCallback {}

impl Callback for SinkCallback {
    fn print<V: Observable>(&self, _: &[Checkpoint<V>]) {}
}

/// A callback function that logs the result of each individual half with level `info`.
pub struct SimpleCallback {}

impl Callback for SimpleCallback {
    fn print<V: Observable>(&self, chkpts: &[Checkpoint<V>]) {
        let half = chkpts.len();
        // Make sure that there is at least one checkpoint
        // otherwise do nothing.
        if let Some(chkpt) = chkpts.last() {
            info!("half {} finished.", half - 1);
            info!("this half: N={} E={:?}", chkpt.calls(), chkpt.estimate());
        }
    }
}

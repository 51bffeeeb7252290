//! Per-operation metric aggregation

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::callsite::CallSite;

/// Aggregated cost of one named operation
///
/// `count` and cumulative `time` only ever grow. In-flight start instants are
/// kept as a stack, so nested invocations of the same operation each time
/// correctly instead of the inner call clobbering the outer one.
#[derive(Debug, Default)]
pub struct OpMetric {
    inner: Mutex<MetricInner>,
}

#[derive(Debug, Default)]
struct MetricInner {
    count: u64,
    time: Duration,
    in_flight: Vec<Instant>,
    invocations: Vec<CallSite>,
}

impl OpMetric {
    /// Create an empty metric
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin timing one invocation
    ///
    /// Records the call site when one was captured and increments the
    /// invocation count.
    pub fn start(&self, site: Option<CallSite>) {
        let mut inner = self.inner.lock();
        if let Some(site) = site {
            inner.invocations.push(site);
        }
        inner.in_flight.push(Instant::now());
        inner.count += 1;
    }

    /// Finish timing the most recent invocation
    ///
    /// Adds the elapsed time to the cumulative total. A stop with no matching
    /// start is ignored.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if let Some(started) = inner.in_flight.pop() {
            inner.time += started.elapsed();
        }
    }

    /// Number of invocations recorded so far
    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    /// Cumulative elapsed time in nanoseconds
    pub fn time_ns(&self) -> u64 {
        self.inner.lock().time.as_nanos() as u64
    }

    /// Read-only view of the current state
    ///
    /// Reading a snapshot never mutates the metric.
    pub fn snapshot(&self) -> MetricSnapshot {
        let inner = self.inner.lock();
        MetricSnapshot {
            count: inner.count,
            time_ns: inner.time.as_nanos() as u64,
            invocations: inner.invocations.clone(),
        }
    }
}

/// Point-in-time view of a metric
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Number of invocations
    pub count: u64,
    /// Cumulative elapsed time in nanoseconds
    pub time_ns: u64,
    /// Call sites of the recorded invocations, when capture was enabled
    pub invocations: Vec<CallSite>,
}

impl MetricSnapshot {
    /// Mean elapsed time per invocation in nanoseconds
    pub fn mean_ns(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.time_ns as f64 / self.count as f64
        }
    }
}

/// Closes out a measurement on every exit path, including panics
pub(crate) struct MeasureGuard<'a> {
    metric: &'a OpMetric,
}

impl<'a> MeasureGuard<'a> {
    pub(crate) fn new(metric: &'a OpMetric) -> Self {
        Self { metric }
    }
}

impl Drop for MeasureGuard<'_> {
    fn drop(&mut self) {
        self.metric.stop();
    }
}

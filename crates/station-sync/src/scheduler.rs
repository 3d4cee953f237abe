//! Bounded record sync scheduling.
//!
//! [`BoundedScheduler`] runs one future per sensor with a fixed ceiling on
//! how many are in flight. Tasks are admitted in submission order. A failing
//! task never cancels its siblings, and the batch keeps running on its own
//! Tokio task even if the caller stops waiting for it.

use std::future::Future;

use futures::stream::{self, StreamExt};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use station_types::{SensorId, SensorRecord};

use crate::error::{Error, Result};

/// Default number of record sync tasks allowed to run at once.
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Result of running a batch of record sync tasks.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Records of every successful task, in completion order.
    pub records: Vec<SensorRecord>,
    /// Sensors whose task succeeded, in completion order.
    pub succeeded: Vec<SensorId>,
    /// Failed tasks, in completion order.
    pub failures: Vec<(SensorId, Error)>,
}

impl BatchOutcome {
    /// Whether every task succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The earliest failing task, if any.
    pub fn first_failure(&self) -> Option<&(SensorId, Error)> {
        self.failures.first()
    }

    /// Collapse into the aggregate result.
    ///
    /// Fails with [`Error::RecordSync`] wrapping the earliest failure when any
    /// task failed; the records of successful tasks are not returned then.
    pub fn into_result(self) -> Result<Vec<SensorRecord>> {
        match self.failures.into_iter().next() {
            Some((sensor, source)) => Err(Error::record_sync(sensor, source)),
            None => Ok(self.records),
        }
    }
}

/// Runs per-sensor record sync tasks with bounded concurrency.
#[derive(Debug, Clone, Copy)]
pub struct BoundedScheduler {
    limit: usize,
}

impl Default for BoundedScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT)
    }
}

impl BoundedScheduler {
    /// Create a scheduler running at most `limit` tasks at once.
    ///
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    /// Maximum number of tasks in flight.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every task and wait for all of them to finish.
    ///
    /// Returns [`Error::TaskAborted`] only if the batch itself was torn down,
    /// for example because a task panicked. Task failures are reported in the
    /// returned [`BatchOutcome`].
    pub async fn run<F>(&self, tasks: Vec<(SensorId, F)>) -> Result<BatchOutcome>
    where
        F: Future<Output = Result<Vec<SensorRecord>>> + Send + 'static,
    {
        let limit = self.limit;
        let total = tasks.len();
        let (tx, rx) = oneshot::channel();

        debug!("Scheduling {} record sync task(s), limit {}", total, limit);

        tokio::spawn(async move {
            let mut completions = stream::iter(
                tasks
                    .into_iter()
                    .map(|(sensor, task)| async move { (sensor, task.await) }),
            )
            .buffer_unordered(limit);

            let mut outcome = BatchOutcome::default();
            while let Some((sensor, result)) = completions.next().await {
                match result {
                    Ok(records) => {
                        debug!("Record sync for {} returned {} record(s)", sensor, records.len());
                        outcome.records.extend(records);
                        outcome.succeeded.push(sensor);
                    }
                    Err(e) => {
                        warn!("Record sync for {} failed: {}", sensor, e);
                        outcome.failures.push((sensor, e));
                    }
                }
            }

            // The caller may have gone away; the work is done either way.
            let _ = tx.send(outcome);
        });

        rx.await
            .map_err(|_| Error::TaskAborted(format!("record scheduler ({} tasks)", total)))
    }
}

//! The cloud sync orchestrator.
//!
//! [`CloudSync`] composes reconciliation, record sync, offsets, images and
//! settings into the public sync operations. Every operation runs on its own
//! Tokio task: dropping the returned future stops waiting for the result but
//! does not cancel the sync.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use futures::stream::{FuturesUnordered, StreamExt};
use time::Duration;
use tracing::{debug, info, warn};

use station_types::{CloudSettings, LocalSensor, SensorRecord};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::images::ImageSync;
use crate::offsets::sync_offsets;
use crate::reconcile::{Reconciliation, reconcile};
use crate::records::{DEFAULT_RETENTION, RecordSync};
use crate::scheduler::{BatchOutcome, BoundedScheduler, DEFAULT_MAX_CONCURRENT};
use crate::settings::sync_settings;
use crate::traits::{CloudClient, CursorStore, ImageCache, LocalConfig, LocalStore};

/// The capabilities a [`CloudSync`] works with.
#[derive(Clone)]
pub struct Capabilities {
    /// Local sensor and record store.
    pub local: Arc<dyn LocalStore>,
    /// Cloud service client.
    pub cloud: Arc<dyn CloudClient>,
    /// Per-sensor record sync cursors.
    pub cursors: Arc<dyn CursorStore>,
    /// Background image cache.
    pub images: Arc<dyn ImageCache>,
    /// Local settings overwritten by cloud preferences.
    pub config: Arc<dyn LocalConfig>,
}

/// Tuning for a [`CloudSync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOptions {
    /// Look-back window for sensors that were never synced.
    pub retention: Duration,
    /// Ceiling on concurrent record sync tasks in [`CloudSync::sync_all_records`].
    pub max_concurrent_record_syncs: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            max_concurrent_record_syncs: DEFAULT_MAX_CONCURRENT,
        }
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            retention: config.retention(),
            max_concurrent_record_syncs: config.max_concurrent_record_syncs,
        }
    }
}

/// Synchronizes sensors, history and settings with the cloud.
///
/// Cloning is cheap; clones share the same capabilities.
///
/// Callers must not run two syncs covering the same sensor at once; there is
/// no per-sensor locking.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use station_sync::mock::{MockCloud, MockConfig, MockCursorStore, MockImageCache, MockLocalStore};
/// use station_sync::{Capabilities, CloudSync, SyncOptions};
/// use station_types::CloudSensor;
///
/// #[tokio::main]
/// async fn main() -> station_sync::Result<()> {
///     let cloud = Arc::new(MockCloud::new());
///     cloud.add_sensor(CloudSensor::new("AA:BB:CC:DD:EE:FF"));
///
///     let sync = CloudSync::new(
///         Capabilities {
///             local: Arc::new(MockLocalStore::new()),
///             cloud,
///             cursors: Arc::new(MockCursorStore::new()),
///             images: Arc::new(MockImageCache::new()),
///             config: Arc::new(MockConfig::new()),
///         },
///         SyncOptions::default(),
///     );
///
///     let touched = sync.sync_all().await?;
///     assert_eq!(touched.len(), 1);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct CloudSync {
    inner: Arc<Inner>,
}

struct Inner {
    local: Arc<dyn LocalStore>,
    cloud: Arc<dyn CloudClient>,
    config: Arc<dyn LocalConfig>,
    records: RecordSync,
    images: ImageSync,
    scheduler: BoundedScheduler,
}

impl std::fmt::Debug for CloudSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudSync")
            .field("records", &self.inner.records)
            .field("scheduler", &self.inner.scheduler)
            .finish_non_exhaustive()
    }
}

impl CloudSync {
    /// Create an orchestrator over the given capabilities.
    pub fn new(capabilities: Capabilities, options: SyncOptions) -> Self {
        let Capabilities {
            local,
            cloud,
            cursors,
            images,
            config,
        } = capabilities;

        let records = RecordSync::new(
            Arc::clone(&local),
            Arc::clone(&cloud),
            cursors,
            options.retention,
        );
        let images = ImageSync::new(Arc::clone(&cloud), images);

        Self {
            inner: Arc::new(Inner {
                local,
                cloud,
                config,
                records,
                images,
                scheduler: BoundedScheduler::new(options.max_concurrent_record_syncs),
            }),
        }
    }

    /// Pull the account's unit preferences into local configuration.
    pub async fn sync_settings(&self) -> Result<CloudSettings> {
        let inner = Arc::clone(&self.inner);
        detached("sync_settings", async move { inner.sync_settings().await }).await
    }

    /// Fetch new history of one sensor and advance its cursor.
    pub async fn sync_sensor(&self, sensor: &LocalSensor) -> Result<Vec<SensorRecord>> {
        let inner = Arc::clone(&self.inner);
        let sensor = sensor.clone();
        detached("sync_sensor", async move { inner.records.sync(&sensor).await }).await
    }

    /// Reconcile local sensors with the cloud.
    ///
    /// Applies the computed creates, updates and unclaims, starts caching
    /// missing images in the background and pushes calibration offsets.
    /// Returns every sensor touched by the pass, ordered by identity.
    pub async fn sync_sensors(&self) -> Result<Vec<LocalSensor>> {
        let inner = Arc::clone(&self.inner);
        detached("sync_sensors", async move { inner.sync_sensors().await }).await
    }

    /// Sync the history of every cloud-linked sensor, a bounded number at a
    /// time.
    ///
    /// Fails with [`Error::RecordSync`] for the earliest failing sensor once
    /// every task has finished. Sensors that succeeded keep their advanced
    /// cursor and persisted records either way.
    pub async fn sync_all_records(&self) -> Result<Vec<SensorRecord>> {
        self.sync_all_records_outcome().await?.into_result()
    }

    /// Like [`CloudSync::sync_all_records`], but reports every sensor's
    /// outcome.
    pub async fn sync_all_records_outcome(&self) -> Result<BatchOutcome> {
        let inner = Arc::clone(&self.inner);
        detached("sync_all_records", async move { inner.sync_all_records().await }).await
    }

    /// Reconcile sensors and sync the history of every touched sensor, while
    /// syncing settings alongside.
    ///
    /// Succeeds only if all three parts succeed. Record syncs of the touched
    /// sensors run unbounded and all finish; a failure is reported as
    /// [`Error::RecordSync`] for the first sensor to fail in completion order.
    /// Returns the touched sensors.
    pub async fn sync_all(&self) -> Result<Vec<LocalSensor>> {
        let inner = Arc::clone(&self.inner);
        detached("sync_all", async move { inner.sync_all().await }).await
    }
}

/// Run `fut` on its own task so it completes even if the caller goes away.
async fn detached<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| Error::TaskAborted(format!("{}: {}", operation, e)))?
}

impl Inner {
    async fn sync_settings(&self) -> Result<CloudSettings> {
        sync_settings(self.cloud.as_ref(), self.config.as_ref()).await
    }

    async fn sync_sensors(&self) -> Result<Vec<LocalSensor>> {
        let local = self.local.read_all_sensors().await?;
        let cloud = self.cloud.list_sensors().await?;

        let reconciliation = reconcile(&local, &cloud);
        info!(
            "Reconciled {} local and {} cloud sensor(s): {} update(s), {} create(s), {} unclaim(s)",
            local.len(),
            cloud.len(),
            reconciliation.updates.len(),
            reconciliation.creates.len(),
            reconciliation.unclaims.len()
        );

        self.apply(&reconciliation).await?;

        // Image results are only logged by the background task
        drop(self.images.spawn_missing(cloud.clone()));

        let touched = reconciliation.touched();
        sync_offsets(self.local.as_ref(), &cloud, &touched).await?;

        Ok(touched)
    }

    async fn apply(&self, reconciliation: &Reconciliation) -> Result<()> {
        if reconciliation.is_noop() {
            debug!("Local sensors already match the cloud");
            return Ok(());
        }

        let creates = reconciliation.creates.iter().map(|s| self.local.create(s));
        let updates = reconciliation
            .updates
            .iter()
            .chain(&reconciliation.unclaims)
            .map(|s| self.local.update(s));

        for result in join_all(creates.chain(updates)).await {
            result.map_err(|e| Error::reconciliation(e.into()))?;
        }

        Ok(())
    }

    async fn sync_all_records(&self) -> Result<BatchOutcome> {
        let sensors = self.local.read_all_sensors().await?;

        let tasks: Vec<_> = sensors
            .into_iter()
            .filter(|s| s.is_cloud)
            .map(|sensor| {
                let records = self.records.clone();
                (sensor.id.clone(), async move { records.sync(&sensor).await })
            })
            .collect();

        info!("Syncing records of {} cloud sensor(s)", tasks.len());
        let outcome = self.scheduler.run(tasks).await?;

        if !outcome.is_success() {
            warn!(
                "{} of {} record sync task(s) failed",
                outcome.failures.len(),
                outcome.failures.len() + outcome.succeeded.len()
            );
        }
        Ok(outcome)
    }

    async fn sync_all(&self) -> Result<Vec<LocalSensor>> {
        let sensors_and_records = async {
            let touched = self.sync_sensors().await?;

            let mut pending: FuturesUnordered<_> = touched
                .iter()
                .map(|sensor| async move { (sensor, self.records.sync(sensor).await) })
                .collect();

            // Every sync runs to the end; the first to fail is reported
            let mut first_failure = None;
            while let Some((sensor, result)) = pending.next().await {
                if let Err(e) = result {
                    warn!("Record sync for {} failed: {}", sensor.id, e);
                    first_failure
                        .get_or_insert_with(|| Error::record_sync(sensor.id.clone(), e));
                }
            }
            drop(pending);

            match first_failure {
                Some(err) => Err(err),
                None => Ok::<_, Error>(touched),
            }
        };

        let (touched, settings) = tokio::join!(sensors_and_records, self.sync_settings());
        let touched = touched?;
        settings?;

        info!("Full sync finished for {} sensor(s)", touched.len());
        Ok(touched)
    }
}

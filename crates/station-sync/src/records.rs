//! Per-sensor incremental record sync.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use station_types::{LocalSensor, SensorRecord};

use crate::error::{Error, Result};
use crate::traits::{CloudClient, CursorStore, LocalStore};

/// Default look-back window for sensors that were never synced.
pub const DEFAULT_RETENTION: Duration = Duration::hours(240);

/// Fetches new history of one sensor and advances its cursor.
///
/// A task for a sensor must not run concurrently with another task for the
/// same sensor; the engine does not lock per sensor.
#[derive(Clone)]
pub struct RecordSync {
    local: Arc<dyn LocalStore>,
    cloud: Arc<dyn CloudClient>,
    cursors: Arc<dyn CursorStore>,
    retention: Duration,
}

impl std::fmt::Debug for RecordSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordSync")
            .field("retention", &self.retention)
            .finish_non_exhaustive()
    }
}

impl RecordSync {
    /// Create a record sync task runner.
    pub fn new(
        local: Arc<dyn LocalStore>,
        cloud: Arc<dyn CloudClient>,
        cursors: Arc<dyn CursorStore>,
        retention: Duration,
    ) -> Self {
        Self {
            local,
            cloud,
            cursors,
            retention,
        }
    }

    /// The look-back window used when a sensor has no cursor.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Sync one sensor.
    ///
    /// Records newer than the cursor (or the retention window when there is
    /// none) are fetched by MAC, stored under the sensor's own identity, and
    /// then the cursor moves to the time the fetch started. On any failure
    /// the cursor is left untouched and the error is returned as is.
    pub async fn sync(&self, sensor: &LocalSensor) -> Result<Vec<SensorRecord>> {
        let mac = sensor
            .network_id()
            .ok_or_else(|| Error::missing_network_identity(&sensor.id))?;

        let started_at = OffsetDateTime::now_utc();
        let since = match self.cursors.get(&sensor.id).await? {
            Some(cursor) => cursor,
            None => self.window_start(started_at),
        };

        debug!("Fetching records for {} since {}", sensor.id, since);
        let mut records = self.cloud.fetch_records(mac, since).await?;
        for record in &mut records {
            record.sensor_id = sensor.id.clone();
        }

        let stored = self.local.create_records(&records).await?;
        self.cursors.set(&sensor.id, started_at).await?;

        info!(
            "Synced {} record(s) for {} ({} new)",
            records.len(),
            sensor.id,
            stored
        );
        Ok(records)
    }

    /// Start of the retention window ending at `now`, never before the epoch.
    fn window_start(&self, now: OffsetDateTime) -> OffsetDateTime {
        now.checked_sub(self.retention)
            .filter(|start| *start >= OffsetDateTime::UNIX_EPOCH)
            .unwrap_or(OffsetDateTime::UNIX_EPOCH)
    }
}

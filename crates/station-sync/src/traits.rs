//! Capabilities consumed by the sync engine.
//!
//! The engine owns no I/O of its own. Everything it touches is one of the
//! traits below, injected into [`crate::CloudSync`] at construction. Real
//! implementations live in [`crate::local`]; [`crate::mock`] provides test
//! doubles.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use image::DynamicImage;
use time::OffsetDateTime;

use station_types::{
    CloudSensor, CloudSettings, LocalSensor, MacId, OffsetKind, SensorId, SensorRecord,
    UnitPreference,
};

use crate::error::{CloudResult, StorageResult};

/// Local persistent store for sensors and their history.
///
/// Implementations must serialize mutations per underlying storage handle;
/// the engine issues them concurrently.
#[async_trait]
pub trait LocalStore: Send + Sync {
    /// Read every sensor known to this device.
    async fn read_all_sensors(&self) -> StorageResult<Vec<LocalSensor>>;

    /// Persist a sensor this device has never seen.
    async fn create(&self, sensor: &LocalSensor) -> StorageResult<()>;

    /// Overwrite an existing sensor.
    async fn update(&self, sensor: &LocalSensor) -> StorageResult<()>;

    /// Set one calibration offset of a sensor.
    ///
    /// Must be idempotent per offset kind. `None` clears the offset.
    async fn update_offset(
        &self,
        kind: OffsetKind,
        value: Option<f64>,
        sensor: &LocalSensor,
    ) -> StorageResult<()>;

    /// Persist fetched history records, ignoring ones already stored.
    ///
    /// Returns the number of new records.
    async fn create_records(&self, records: &[SensorRecord]) -> StorageResult<usize>;
}

/// Client for the remote cloud service.
///
/// Timeouts and transport retries belong to implementations; the engine
/// imposes none.
#[async_trait]
pub trait CloudClient: Send + Sync {
    /// List every sensor claimed by or shared with the signed-in account.
    async fn list_sensors(&self) -> CloudResult<Vec<CloudSensor>>;

    /// Fetch the account's unit preferences.
    async fn fetch_settings(&self) -> CloudResult<CloudSettings>;

    /// Fetch records of a sensor measured strictly after `since`.
    async fn fetch_records(
        &self,
        mac: &MacId,
        since: OffsetDateTime,
    ) -> CloudResult<Vec<SensorRecord>>;

    /// Download raw bytes, used for sensor background pictures.
    async fn download_image(&self, url: &str) -> CloudResult<Bytes>;
}

/// Per-sensor record sync cursors.
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// When records of this sensor were last synced successfully.
    async fn get(&self, sensor: &SensorId) -> StorageResult<Option<OffsetDateTime>>;

    /// Record a successful sync.
    ///
    /// Implementations must never move a cursor backwards.
    async fn set(&self, sensor: &SensorId, at: OffsetDateTime) -> StorageResult<()>;
}

/// Local cache for sensor background images.
#[async_trait]
pub trait ImageCache: Send + Sync {
    /// Whether the sensor's image has already been cached.
    async fn is_cached(&self, sensor: &SensorId) -> StorageResult<bool>;

    /// Store a decoded image for the sensor and return where it was written.
    async fn store(&self, image: &DynamicImage, sensor: &SensorId) -> StorageResult<PathBuf>;

    /// Remember that the sensor's image is cached so future syncs skip it.
    async fn mark_cached(&self, sensor: &SensorId) -> StorageResult<()>;
}

/// Local application settings the cloud may override.
pub trait LocalConfig: Send + Sync {
    /// Overwrite one unit preference.
    fn set_unit(&self, unit: UnitPreference);
}

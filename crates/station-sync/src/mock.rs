//! In-memory capability implementations for testing.
//!
//! These mocks let the engine run without a cloud account or a database.
//!
//! # Features
//!
//! - **Failure injection**: fail listing, settings, record fetches per sensor,
//!   local writes and image stores
//! - **Latency simulation**: delay record fetches to exercise the scheduler
//! - **Call tracking**: record fetch arguments, concurrency peaks and counts
//!
//! Internal state uses `std::sync::Mutex`; no lock is held across an await.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageFormat};
use time::OffsetDateTime;

use station_types::{
    CloudSensor, CloudSettings, LocalSensor, MacId, OffsetKind, SensorId, SensorRecord,
    UnitPreference,
};

use crate::error::{CloudError, CloudResult, StorageError, StorageResult};
use crate::traits::{CloudClient, CursorStore, ImageCache, LocalConfig, LocalStore};

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Encode a blank PNG of the given size, for image download tests.
pub fn png_bytes(width: u32, height: u32) -> Bytes {
    let mut buf = std::io::Cursor::new(Vec::new());
    // Encoding an in-memory RGB image cannot fail
    let _ = DynamicImage::new_rgb8(width, height).write_to(&mut buf, ImageFormat::Png);
    Bytes::from(buf.into_inner())
}

/// A mock cloud service.
///
/// # Example
///
/// ```
/// use station_sync::CloudClient;
/// use station_sync::mock::MockCloud;
/// use station_types::CloudSensor;
///
/// #[tokio::main]
/// async fn main() {
///     let cloud = MockCloud::new();
///     cloud.add_sensor(CloudSensor::new("AA:BB:CC:DD:EE:FF"));
///
///     let sensors = cloud.list_sensors().await.unwrap();
///     assert_eq!(sensors.len(), 1);
/// }
/// ```
#[derive(Debug, Default)]
pub struct MockCloud {
    sensors: Mutex<Vec<CloudSensor>>,
    settings: Mutex<CloudSettings>,
    records: Mutex<Vec<SensorRecord>>,
    images: Mutex<HashMap<String, Bytes>>,
    list_error: Mutex<Option<CloudError>>,
    settings_error: Mutex<Option<CloudError>>,
    record_errors: Mutex<HashMap<SensorId, CloudError>>,
    record_fetches: Mutex<Vec<(MacId, OffsetDateTime)>>,
    /// Simulated record fetch latency in milliseconds (0 = no delay).
    record_latency_ms: AtomicU64,
    sensor_latencies: Mutex<HashMap<SensorId, Duration>>,
    fetches_in_flight: AtomicUsize,
    max_fetches_in_flight: AtomicUsize,
    image_downloads: AtomicUsize,
}

impl MockCloud {
    /// Create an empty mock cloud.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sensor to the account.
    pub fn add_sensor(&self, sensor: CloudSensor) {
        lock(&self.sensors).push(sensor);
    }

    /// Replace the account's sensors.
    pub fn set_sensors(&self, sensors: Vec<CloudSensor>) {
        *lock(&self.sensors) = sensors;
    }

    /// Set the account's settings.
    pub fn set_settings(&self, settings: CloudSettings) {
        *lock(&self.settings) = settings;
    }

    /// Add history records, served by `fetch_records` by sensor identity.
    pub fn add_records(&self, records: Vec<SensorRecord>) {
        lock(&self.records).extend(records);
    }

    /// Serve `bytes` for downloads of `url`.
    pub fn set_image(&self, url: &str, bytes: Bytes) {
        lock(&self.images).insert(url.to_string(), bytes);
    }

    /// Make sensor listing fail, or succeed again with `None`.
    pub fn fail_list(&self, error: Option<CloudError>) {
        *lock(&self.list_error) = error;
    }

    /// Make settings fetches fail, or succeed again with `None`.
    pub fn fail_settings(&self, error: Option<CloudError>) {
        *lock(&self.settings_error) = error;
    }

    /// Make record fetches for one sensor fail.
    pub fn fail_records_for(&self, sensor: &SensorId, error: CloudError) {
        lock(&self.record_errors).insert(sensor.clone(), error);
    }

    /// Delay every record fetch.
    pub fn set_record_latency(&self, latency: Duration) {
        self.record_latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Delay record fetches of one sensor, overriding the shared latency.
    pub fn set_record_latency_for(&self, sensor: &SensorId, latency: Duration) {
        lock(&self.sensor_latencies).insert(sensor.clone(), latency);
    }

    /// Arguments of every record fetch, in call order.
    pub fn record_fetches(&self) -> Vec<(MacId, OffsetDateTime)> {
        lock(&self.record_fetches).clone()
    }

    /// Highest number of record fetches observed in flight at once.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_fetches_in_flight.load(Ordering::SeqCst)
    }

    /// Number of image downloads.
    pub fn image_downloads(&self) -> usize {
        self.image_downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CloudClient for MockCloud {
    async fn list_sensors(&self) -> CloudResult<Vec<CloudSensor>> {
        if let Some(err) = lock(&self.list_error).clone() {
            return Err(err);
        }
        Ok(lock(&self.sensors).clone())
    }

    async fn fetch_settings(&self) -> CloudResult<CloudSettings> {
        if let Some(err) = lock(&self.settings_error).clone() {
            return Err(err);
        }
        Ok(*lock(&self.settings))
    }

    async fn fetch_records(
        &self,
        mac: &MacId,
        since: OffsetDateTime,
    ) -> CloudResult<Vec<SensorRecord>> {
        lock(&self.record_fetches).push((mac.clone(), since));

        let now = self.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_fetches_in_flight.fetch_max(now, Ordering::SeqCst);

        let sensor = SensorId::from(mac);
        let latency = lock(&self.sensor_latencies)
            .get(&sensor)
            .copied()
            .unwrap_or_else(|| {
                Duration::from_millis(self.record_latency_ms.load(Ordering::Relaxed))
            });
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(err) = lock(&self.record_errors).get(&sensor).cloned() {
            return Err(err);
        }

        Ok(lock(&self.records)
            .iter()
            .filter(|r| r.sensor_id == sensor && r.date > since)
            .cloned()
            .collect())
    }

    async fn download_image(&self, url: &str) -> CloudResult<Bytes> {
        self.image_downloads.fetch_add(1, Ordering::SeqCst);
        lock(&self.images)
            .get(url)
            .cloned()
            .ok_or_else(|| CloudError::status(404, format!("no image at {}", url)))
    }
}

/// A mock local sensor store.
#[derive(Debug, Default)]
pub struct MockLocalStore {
    sensors: Mutex<Vec<LocalSensor>>,
    offsets: Mutex<HashMap<SensorId, HashMap<OffsetKind, Option<f64>>>>,
    records: Mutex<Vec<SensorRecord>>,
    fail_reads: AtomicBool,
    fail_record_writes: AtomicBool,
    failing_updates: Mutex<HashSet<SensorId>>,
    failing_offsets: Mutex<HashSet<SensorId>>,
    creates: AtomicUsize,
    updates: AtomicUsize,
}

impl MockLocalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `sensors`.
    pub fn with_sensors(sensors: Vec<LocalSensor>) -> Self {
        let store = Self::new();
        *lock(&store.sensors) = sensors;
        store
    }

    /// Current sensors.
    pub fn sensors(&self) -> Vec<LocalSensor> {
        lock(&self.sensors).clone()
    }

    /// Current state of one sensor.
    pub fn sensor(&self, id: &SensorId) -> Option<LocalSensor> {
        lock(&self.sensors).iter().find(|s| &s.id == id).cloned()
    }

    /// Offsets written for a sensor.
    pub fn offsets(&self, id: &SensorId) -> HashMap<OffsetKind, Option<f64>> {
        lock(&self.offsets).get(id).cloned().unwrap_or_default()
    }

    /// Records persisted so far.
    pub fn records(&self) -> Vec<SensorRecord> {
        lock(&self.records).clone()
    }

    /// Number of `create` calls that succeeded.
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    /// Number of `update` calls that succeeded.
    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Make `read_all_sensors` fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Make `create_records` fail.
    pub fn fail_record_writes(&self, fail: bool) {
        self.fail_record_writes.store(fail, Ordering::Relaxed);
    }

    /// Make `create` and `update` fail for one sensor.
    pub fn fail_updates_for(&self, id: &SensorId) {
        lock(&self.failing_updates).insert(id.clone());
    }

    /// Make `update_offset` fail for one sensor.
    pub fn fail_offsets_for(&self, id: &SensorId) {
        lock(&self.failing_offsets).insert(id.clone());
    }

    fn check_update(&self, id: &SensorId) -> StorageResult<()> {
        if lock(&self.failing_updates).contains(id) {
            Err(StorageError::backend(format!("mock write failure for {}", id)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LocalStore for MockLocalStore {
    async fn read_all_sensors(&self) -> StorageResult<Vec<LocalSensor>> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(StorageError::backend("mock read failure"));
        }
        Ok(self.sensors())
    }

    async fn create(&self, sensor: &LocalSensor) -> StorageResult<()> {
        self.check_update(&sensor.id)?;
        let mut sensors = lock(&self.sensors);
        if sensors.iter().any(|s| s.id == sensor.id) {
            return Err(StorageError::backend(format!("sensor {} exists", sensor.id)));
        }
        sensors.push(sensor.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update(&self, sensor: &LocalSensor) -> StorageResult<()> {
        self.check_update(&sensor.id)?;
        let mut sensors = lock(&self.sensors);
        let existing = sensors
            .iter_mut()
            .find(|s| s.id == sensor.id)
            .ok_or_else(|| StorageError::backend(format!("sensor {} not found", sensor.id)))?;
        *existing = sensor.clone();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_offset(
        &self,
        kind: OffsetKind,
        value: Option<f64>,
        sensor: &LocalSensor,
    ) -> StorageResult<()> {
        if lock(&self.failing_offsets).contains(&sensor.id) {
            return Err(StorageError::backend(format!(
                "mock offset failure for {}",
                sensor.id
            )));
        }
        lock(&self.offsets)
            .entry(sensor.id.clone())
            .or_default()
            .insert(kind, value);
        Ok(())
    }

    async fn create_records(&self, records: &[SensorRecord]) -> StorageResult<usize> {
        if self.fail_record_writes.load(Ordering::Relaxed) {
            return Err(StorageError::backend("mock record write failure"));
        }
        let mut stored = lock(&self.records);
        let mut added = 0;
        for record in records {
            let exists = stored
                .iter()
                .any(|r| r.sensor_id == record.sensor_id && r.date == record.date);
            if !exists {
                stored.push(record.clone());
                added += 1;
            }
        }
        Ok(added)
    }
}

/// A mock cursor store.
///
/// Like a real store, it never moves a cursor backwards.
#[derive(Debug, Default)]
pub struct MockCursorStore {
    cursors: Mutex<HashMap<SensorId, OffsetDateTime>>,
    sets: AtomicUsize,
    fail: AtomicBool,
}

impl MockCursorStore {
    /// Create an empty cursor store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a cursor without counting it as a set.
    pub fn insert(&self, sensor: &SensorId, at: OffsetDateTime) {
        lock(&self.cursors).insert(sensor.clone(), at);
    }

    /// Current cursor of a sensor.
    pub fn cursor(&self, sensor: &SensorId) -> Option<OffsetDateTime> {
        lock(&self.cursors).get(sensor).copied()
    }

    /// Number of `set` calls that succeeded.
    pub fn set_count(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    /// Make every call fail.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }

    fn check(&self) -> StorageResult<()> {
        if self.fail.load(Ordering::Relaxed) {
            Err(StorageError::backend("mock cursor failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CursorStore for MockCursorStore {
    async fn get(&self, sensor: &SensorId) -> StorageResult<Option<OffsetDateTime>> {
        self.check()?;
        Ok(self.cursor(sensor))
    }

    async fn set(&self, sensor: &SensorId, at: OffsetDateTime) -> StorageResult<()> {
        self.check()?;
        let mut cursors = lock(&self.cursors);
        let cursor = cursors.entry(sensor.clone()).or_insert(at);
        *cursor = (*cursor).max(at);
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A mock image cache.
#[derive(Debug, Default)]
pub struct MockImageCache {
    marked: Mutex<HashSet<SensorId>>,
    stored: Mutex<HashMap<SensorId, (u32, u32)>>,
    fail_stores: AtomicBool,
}

impl MockImageCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a sensor as cached.
    pub fn mark(&self, sensor: &SensorId) {
        lock(&self.marked).insert(sensor.clone());
    }

    /// Invalidate every cached flag.
    pub fn invalidate(&self) {
        lock(&self.marked).clear();
    }

    /// Whether a sensor is marked as cached.
    pub fn is_marked(&self, sensor: &SensorId) -> bool {
        lock(&self.marked).contains(sensor)
    }

    /// Size of the image stored for a sensor.
    pub fn stored_dimensions(&self, sensor: &SensorId) -> Option<(u32, u32)> {
        lock(&self.stored).get(sensor).copied()
    }

    /// Make `store` fail.
    pub fn fail_stores(&self, fail: bool) {
        self.fail_stores.store(fail, Ordering::Relaxed);
    }
}

#[async_trait]
impl ImageCache for MockImageCache {
    async fn is_cached(&self, sensor: &SensorId) -> StorageResult<bool> {
        Ok(self.is_marked(sensor))
    }

    async fn store(&self, image: &DynamicImage, sensor: &SensorId) -> StorageResult<PathBuf> {
        if self.fail_stores.load(Ordering::Relaxed) {
            return Err(StorageError::backend("mock image store failure"));
        }
        lock(&self.stored).insert(sensor.clone(), image.dimensions());
        Ok(PathBuf::from(format!("mock/{}.png", sensor)))
    }

    async fn mark_cached(&self, sensor: &SensorId) -> StorageResult<()> {
        self.mark(sensor);
        Ok(())
    }
}

/// A mock local configuration recording applied preferences.
#[derive(Debug, Default)]
pub struct MockConfig {
    applied: Mutex<Vec<UnitPreference>>,
}

impl MockConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferences applied so far, in order.
    pub fn applied(&self) -> Vec<UnitPreference> {
        lock(&self.applied).clone()
    }
}

impl LocalConfig for MockConfig {
    fn set_unit(&self, unit: UnitPreference) {
        lock(&self.applied).push(unit);
    }
}

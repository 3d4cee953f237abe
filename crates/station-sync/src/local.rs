//! SQLite-backed implementations of the local capabilities.
//!
//! [`SqliteBackend`] implements [`LocalStore`] and [`CursorStore`] on top of
//! a shared [`Store`]. The store sits behind an async mutex, so every
//! mutation issued by the engine's concurrent fan-outs is serialized on the
//! one connection. [`FileImageCache`] writes PNG files and keeps the cached
//! flag in the same database.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use station_store::Store;
use station_types::{LocalSensor, OffsetKind, SensorId, SensorRecord};

use crate::config::StorageConfig;
use crate::error::{StorageError, StorageResult};
use crate::traits::{CursorStore, ImageCache, LocalStore};

/// Local store and cursor store backed by SQLite.
#[derive(Clone)]
pub struct SqliteBackend {
    store: Arc<Mutex<Store>>,
}

impl SqliteBackend {
    /// Wrap an open store.
    pub fn new(store: Store) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Open the database configured in `config`.
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        Ok(Self::new(Store::open(&config.path)?))
    }

    /// Open an in-memory database (for testing).
    pub fn in_memory() -> StorageResult<Self> {
        Ok(Self::new(Store::open_in_memory()?))
    }

    /// The shared store handle.
    pub fn store(&self) -> Arc<Mutex<Store>> {
        Arc::clone(&self.store)
    }

    /// An image cache writing into `dir` that shares this database.
    pub fn image_cache(&self, dir: impl AsRef<Path>) -> FileImageCache {
        FileImageCache {
            dir: dir.as_ref().to_path_buf(),
            store: self.store(),
        }
    }
}

impl std::fmt::Debug for SqliteBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteBackend").finish_non_exhaustive()
    }
}

#[async_trait]
impl LocalStore for SqliteBackend {
    async fn read_all_sensors(&self) -> StorageResult<Vec<LocalSensor>> {
        Ok(self.store.lock().await.list_sensors()?)
    }

    async fn create(&self, sensor: &LocalSensor) -> StorageResult<()> {
        Ok(self.store.lock().await.create_sensor(sensor)?)
    }

    async fn update(&self, sensor: &LocalSensor) -> StorageResult<()> {
        Ok(self.store.lock().await.update_sensor(sensor)?)
    }

    async fn update_offset(
        &self,
        kind: OffsetKind,
        value: Option<f64>,
        sensor: &LocalSensor,
    ) -> StorageResult<()> {
        self.store
            .lock()
            .await
            .set_offset(sensor.id.as_str(), kind, value)?;
        Ok(())
    }

    async fn create_records(&self, records: &[SensorRecord]) -> StorageResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        Ok(self.store.lock().await.insert_records(records)?)
    }
}

#[async_trait]
impl CursorStore for SqliteBackend {
    async fn get(&self, sensor: &SensorId) -> StorageResult<Option<OffsetDateTime>> {
        Ok(self.store.lock().await.get_sync_cursor(sensor.as_str())?)
    }

    async fn set(&self, sensor: &SensorId, at: OffsetDateTime) -> StorageResult<()> {
        self.store
            .lock()
            .await
            .set_sync_cursor(sensor.as_str(), at)?;
        Ok(())
    }
}

/// Image cache writing PNG files into a directory.
#[derive(Clone)]
pub struct FileImageCache {
    dir: PathBuf,
    store: Arc<Mutex<Store>>,
}

impl FileImageCache {
    /// Directory images are written into.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the cached image of a sensor.
    pub fn path_for(&self, sensor: &SensorId) -> PathBuf {
        let name: String = sensor
            .as_str()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.png", name))
    }
}

impl std::fmt::Debug for FileImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileImageCache")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ImageCache for FileImageCache {
    async fn is_cached(&self, sensor: &SensorId) -> StorageResult<bool> {
        Ok(self.store.lock().await.is_image_cached(sensor.as_str())?)
    }

    async fn store(&self, image: &DynamicImage, sensor: &SensorId) -> StorageResult<PathBuf> {
        let path = self.path_for(sensor);
        let dir = self.dir.clone();
        let image = image.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> StorageResult<()> {
            std::fs::create_dir_all(&dir)?;
            image
                .save_with_format(&target, ImageFormat::Png)
                .map_err(|e| StorageError::backend(format!("writing {}: {}", target.display(), e)))
        })
        .await
        .map_err(|e| StorageError::backend(format!("image writer failed: {}", e)))??;

        debug!("Wrote image for {} to {}", sensor, path.display());
        Ok(path)
    }

    async fn mark_cached(&self, sensor: &SensorId) -> StorageResult<()> {
        Ok(self.store.lock().await.mark_image_cached(sensor.as_str())?)
    }
}

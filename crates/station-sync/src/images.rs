//! Background image caching.
//!
//! Images are cached at most once per sensor: after a successful store the
//! sensor is marked cached and later syncs skip it until the cache is
//! invalidated externally. Image failures are never part of a sync's result.

use std::path::PathBuf;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use station_types::{CloudSensor, SensorId};

use crate::error::{Error, Result};
use crate::traits::{CloudClient, ImageCache};

/// Downloads and caches sensor background images.
#[derive(Clone)]
pub struct ImageSync {
    cloud: Arc<dyn CloudClient>,
    cache: Arc<dyn ImageCache>,
}

impl std::fmt::Debug for ImageSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageSync").finish_non_exhaustive()
    }
}

impl ImageSync {
    /// Create an image syncer.
    pub fn new(cloud: Arc<dyn CloudClient>, cache: Arc<dyn ImageCache>) -> Self {
        Self { cloud, cache }
    }

    /// Cache the images of every sensor that has none yet.
    ///
    /// Returns one outcome per attempted sensor; sensors already cached are
    /// skipped. A sensor without a picture URL fails with
    /// [`Error::MissingPictureUrl`] without affecting the others.
    pub async fn sync_missing(&self, sensors: &[CloudSensor]) -> Vec<(SensorId, Result<PathBuf>)> {
        let mut pending = Vec::new();
        for sensor in sensors {
            match self.cache.is_cached(&sensor.id).await {
                Ok(true) => debug!("Image for {} already cached", sensor.id),
                Ok(false) => pending.push(sensor),
                Err(e) => warn!("Could not check image cache for {}: {}", sensor.id, e),
            }
        }

        join_all(
            pending
                .into_iter()
                .map(|sensor| async move { (sensor.id.clone(), self.sync_one(sensor).await) }),
        )
        .await
    }

    /// Run [`ImageSync::sync_missing`] in the background, logging failures.
    pub fn spawn_missing(&self, sensors: Vec<CloudSensor>) -> tokio::task::JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move {
            let outcomes = this.sync_missing(&sensors).await;
            let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
            for (sensor, result) in &outcomes {
                if let Err(e) = result {
                    warn!("Image sync for {} failed: {}", sensor, e);
                }
            }
            if !outcomes.is_empty() {
                info!(
                    "Image sync finished: {} cached, {} failed",
                    outcomes.len() - failed,
                    failed
                );
            }
        })
    }

    async fn sync_one(&self, sensor: &CloudSensor) -> Result<PathBuf> {
        let url = sensor
            .picture
            .as_deref()
            .ok_or_else(|| Error::MissingPictureUrl(sensor.id.clone()))?;

        let bytes = self.cloud.download_image(url).await?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| Error::response_parse(format!("image for {}: {}", sensor.id, e)))?;

        let path = self.cache.store(&image, &sensor.id).await?;
        self.cache.mark_cached(&sensor.id).await?;

        debug!("Cached image for {} at {}", sensor.id, path.display());
        Ok(path)
    }
}

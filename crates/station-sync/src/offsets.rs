//! Calibration offset propagation.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::debug;

use station_types::{CloudSensor, LocalSensor, OffsetKind, SensorId};

use crate::error::{Error, Result};
use crate::traits::LocalStore;

/// Push the cloud's calibration offsets of every touched sensor to the local
/// store.
///
/// Sensors absent from `cloud` are skipped. All three offset kinds of all
/// sensors are written concurrently. Any failure fails the whole sync with
/// [`Error::OffsetSync`] wrapping the first failure in issue order; writes
/// that already succeeded are kept. Returns the number of writes.
pub async fn sync_offsets(
    store: &dyn LocalStore,
    cloud: &[CloudSensor],
    touched: &[LocalSensor],
) -> Result<usize> {
    let by_id: HashMap<&SensorId, &CloudSensor> = cloud.iter().map(|s| (&s.id, s)).collect();

    let updates: Vec<_> = touched
        .iter()
        .filter_map(|sensor| by_id.get(&sensor.id).map(|cloud| (sensor, *cloud)))
        .flat_map(|(sensor, cloud)| {
            OffsetKind::ALL
                .into_iter()
                .map(move |kind| (sensor, kind, cloud.offset(kind)))
        })
        .map(|(sensor, kind, value)| async move {
            store.update_offset(kind, value, sensor).await
        })
        .collect();

    let total = updates.len();
    debug!("Pushing {} offset update(s)", total);

    for result in join_all(updates).await {
        result.map_err(|e| Error::offset_sync(e.into()))?;
    }

    Ok(total)
}

//! Sensor reconciliation.
//!
//! [`reconcile`] compares the local sensor set with the cloud's and returns
//! the local mutations needed to match the cloud's view of which sensors
//! exist and who owns them. It performs no I/O.

use std::collections::{BTreeMap, HashMap, HashSet};

use station_types::{CloudSensor, LocalSensor, SensorId};

/// Mutations computed by [`reconcile`].
///
/// `updates`, `creates` and `unclaims` are disjoint by sensor identity, and
/// every sensor in them differs from what is stored locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Existing local sensors whose cloud linkage changed, in their new state.
    pub updates: Vec<LocalSensor>,
    /// Cloud sensors this device has never seen, as claimed local sensors.
    pub creates: Vec<LocalSensor>,
    /// Local sensors no longer in the cloud, with their claim cleared.
    pub unclaims: Vec<LocalSensor>,
    /// Local sensors present in the cloud that are already up to date.
    pub unchanged: Vec<LocalSensor>,
}

impl Reconciliation {
    /// Whether applying this reconciliation would change nothing.
    pub fn is_noop(&self) -> bool {
        self.updates.is_empty() && self.creates.is_empty() && self.unclaims.is_empty()
    }

    /// Number of mutations to apply.
    pub fn mutation_count(&self) -> usize {
        self.updates.len() + self.creates.len() + self.unclaims.len()
    }

    /// Every sensor considered by this pass, in its post-mutation state,
    /// ordered by identity.
    ///
    /// Covers the mutated sensors plus the unchanged ones still linked to the
    /// cloud, so offset and record sync reach every cloud sensor.
    pub fn touched(&self) -> Vec<LocalSensor> {
        let mut touched: BTreeMap<&SensorId, &LocalSensor> = BTreeMap::new();
        for sensor in self
            .updates
            .iter()
            .chain(&self.creates)
            .chain(&self.unclaims)
            .chain(&self.unchanged)
        {
            touched.entry(&sensor.id).or_insert(sensor);
        }
        touched.into_values().cloned().collect()
    }
}

/// Compute the local mutations that bring `local` in line with `cloud`.
///
/// Sensors are matched by identity only. A cloud identity listed twice is
/// considered once, first occurrence wins.
pub fn reconcile(local: &[LocalSensor], cloud: &[CloudSensor]) -> Reconciliation {
    let mut by_id: HashMap<&SensorId, &CloudSensor> = HashMap::with_capacity(cloud.len());
    for sensor in cloud {
        by_id.entry(&sensor.id).or_insert(sensor);
    }

    let mut result = Reconciliation::default();
    let mut seen: HashSet<&SensorId> = HashSet::with_capacity(local.len());

    for sensor in local {
        if !seen.insert(&sensor.id) {
            continue;
        }

        match by_id.get(&sensor.id) {
            Some(cloud_sensor) => {
                let updated = sensor.with_cloud_sensor(cloud_sensor);
                if updated == *sensor {
                    result.unchanged.push(updated);
                } else {
                    result.updates.push(updated);
                }
            }
            None => {
                let unclaimed = sensor.unclaimed();
                if unclaimed != *sensor {
                    result.unclaims.push(unclaimed);
                }
            }
        }
    }

    let mut created: HashSet<&SensorId> = HashSet::new();
    for sensor in cloud {
        if !seen.contains(&sensor.id) && created.insert(&sensor.id) {
            result.creates.push(sensor.to_local_sensor());
        }
    }

    result
}

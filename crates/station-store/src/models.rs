//! Data models for stored data that have no counterpart in station-types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use station_types::OffsetKind;

/// Calibration offsets stored for a sensor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorOffsets {
    /// Temperature offset in degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity offset in percent.
    pub humidity: Option<f64>,
    /// Pressure offset in hectopascals.
    pub pressure: Option<f64>,
    /// When any offset was last written.
    #[serde(with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl SensorOffsets {
    /// The offset of the given kind.
    pub fn get(&self, kind: OffsetKind) -> Option<f64> {
        match kind {
            OffsetKind::Temperature => self.temperature,
            OffsetKind::Humidity => self.humidity,
            OffsetKind::Pressure => self.pressure,
        }
    }

    pub(crate) fn set(&mut self, kind: OffsetKind, value: Option<f64>) {
        match kind {
            OffsetKind::Temperature => self.temperature = value,
            OffsetKind::Humidity => self.humidity = value,
            OffsetKind::Pressure => self.pressure = value,
        }
    }
}

/// Cloud sync state for a sensor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// Sensor identity.
    pub sensor_id: String,
    /// When history was last fetched successfully.
    #[serde(with = "time::serde::rfc3339")]
    pub last_sync_at: OffsetDateTime,
}

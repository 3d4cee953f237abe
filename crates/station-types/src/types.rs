//! Core types for sensors, their cloud counterparts, and history records.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::ParseError;

/// Identity of a sensor, shared by the local and cloud representations.
///
/// This is the only key used to match a local sensor with its cloud
/// counterpart. It is usually the sensor's MAC address, but sensors that
/// were only ever seen through a platform-local Bluetooth identifier use
/// that identifier instead.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SensorId(String);

impl SensorId {
    /// Create a sensor identity from any string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SensorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SensorId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&MacId> for SensorId {
    fn from(mac: &MacId) -> Self {
        Self(mac.0.clone())
    }
}

/// A 48-bit Bluetooth MAC address, the sensor's network identity.
///
/// Always stored in the normalised `AA:BB:CC:DD:EE:FF` form.
///
/// ```
/// use station_types::MacId;
///
/// let mac: MacId = "aa-bb-cc-dd-ee-ff".parse().unwrap();
/// assert_eq!(mac.as_str(), "AA:BB:CC:DD:EE:FF");
/// assert!("not a mac".parse::<MacId>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct MacId(String);

impl MacId {
    /// The normalised address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MacId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex: String = s
            .chars()
            .filter(|c| !matches!(c, ':' | '-'))
            .collect::<String>()
            .to_ascii_uppercase();

        if hex.len() != 12 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::InvalidMac(s.to_string()));
        }

        let octets: Vec<&str> = (0..6).map(|i| &hex[i * 2..i * 2 + 2]).collect();
        Ok(Self(octets.join(":")))
    }
}

impl TryFrom<String> for MacId {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MacId> for String {
    fn from(mac: MacId) -> Self {
        mac.0
    }
}

impl fmt::Display for MacId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Platform-local Bluetooth identifier.
///
/// Some platforms hide the MAC address and hand out a per-host UUID instead.
/// A sensor known only by its LUID cannot be addressed in the cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Luid(Uuid);

impl Luid {
    /// Wrap an existing UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for Luid {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseError::InvalidLuid(s.to_string()))
    }
}

impl fmt::Display for Luid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sensor as known to this device.
///
/// Local sensors are created when first observed over Bluetooth or when the
/// cloud reports a sensor this device has never seen. The sync engine
/// mutates them but never deletes them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LocalSensor {
    /// Identity shared with the cloud.
    pub id: SensorId,
    /// Platform-local Bluetooth identifier, if the platform provides one.
    pub luid: Option<Luid>,
    /// MAC address, the network identity used for cloud record fetches.
    pub mac: Option<MacId>,
    /// Display name.
    pub name: String,
    /// Advertisement data format version.
    pub version: u8,
    /// Whether the sensor accepts GATT connections.
    pub is_connectable: bool,
    /// Whether the sensor is claimed by a cloud account.
    pub is_claimed: bool,
    /// Whether the signed-in user owns the sensor.
    pub is_owner: bool,
    /// E-mail of the owning account.
    pub owner: Option<String>,
    /// Whether the sensor is linked to the cloud (its history is cloud-synced).
    pub is_cloud: bool,
}

impl LocalSensor {
    /// Create a local-only sensor.
    pub fn new(id: impl Into<SensorId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            luid: None,
            mac: None,
            name: name.into(),
            version: 5,
            is_connectable: true,
            is_claimed: false,
            is_owner: false,
            owner: None,
            is_cloud: false,
        }
    }

    /// Builder-style MAC assignment.
    #[must_use]
    pub fn with_mac(mut self, mac: MacId) -> Self {
        self.mac = Some(mac);
        self
    }

    /// Builder-style LUID assignment.
    #[must_use]
    pub fn with_luid(mut self, luid: Luid) -> Self {
        self.luid = Some(luid);
        self
    }

    /// The network identity used to address this sensor in the cloud.
    pub fn network_id(&self) -> Option<&MacId> {
        self.mac.as_ref()
    }

    /// Apply the cloud's view of this sensor.
    ///
    /// The cloud is authoritative for name, ownership and claim state. A
    /// sensor without a MAC adopts the cloud identity as its network identity
    /// when that identity is a valid MAC address.
    #[must_use]
    pub fn with_cloud_sensor(&self, cloud: &CloudSensor) -> Self {
        let mac = self
            .mac
            .clone()
            .or_else(|| cloud.id.as_str().parse::<MacId>().ok());

        Self {
            id: self.id.clone(),
            luid: self.luid,
            mac,
            name: cloud.name.clone().unwrap_or_else(|| self.name.clone()),
            version: self.version,
            is_connectable: self.is_connectable,
            is_claimed: true,
            is_owner: cloud.is_owner,
            owner: cloud.owner.clone(),
            is_cloud: true,
        }
    }

    /// The same sensor after its cloud claim has been removed.
    ///
    /// Applying this to an already-unclaimed sensor yields an equal value.
    #[must_use]
    pub fn unclaimed(&self) -> Self {
        Self {
            is_claimed: false,
            is_owner: false,
            is_cloud: false,
            ..self.clone()
        }
    }
}

/// A sensor as reported by the cloud.
///
/// This is a snapshot fetched fresh on every sync and never persisted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CloudSensor {
    /// Identity shared with local sensors (the MAC address).
    pub id: SensorId,
    /// Name set in the cloud.
    pub name: Option<String>,
    /// Whether the sensor is claimed.
    pub is_claimed: bool,
    /// Whether the signed-in user owns the sensor.
    pub is_owner: bool,
    /// E-mail of the owning account.
    pub owner: Option<String>,
    /// URL of the sensor's background picture.
    pub picture: Option<String>,
    /// Temperature offset in degrees Celsius.
    pub offset_temperature: Option<f64>,
    /// Relative humidity offset in percent.
    pub offset_humidity: Option<f64>,
    /// Pressure offset in hectopascals.
    pub offset_pressure: Option<f64>,
}

impl CloudSensor {
    /// Create a claimed cloud sensor with no offsets or picture.
    pub fn new(id: impl Into<SensorId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            is_claimed: true,
            is_owner: true,
            owner: None,
            picture: None,
            offset_temperature: None,
            offset_humidity: None,
            offset_pressure: None,
        }
    }

    /// The offset of the given kind.
    pub fn offset(&self, kind: OffsetKind) -> Option<f64> {
        match kind {
            OffsetKind::Temperature => self.offset_temperature,
            OffsetKind::Humidity => self.offset_humidity,
            OffsetKind::Pressure => self.offset_pressure,
        }
    }

    /// The local sensor created for a cloud sensor this device has never seen.
    pub fn to_local_sensor(&self) -> LocalSensor {
        let name = self.name.clone().unwrap_or_else(|| self.id.to_string());
        LocalSensor::new(self.id.clone(), name).with_cloud_sensor(self)
    }
}

/// A single timestamped reading.
///
/// Records are immutable and keyed by `(sensor_id, date)`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SensorRecord {
    /// Sensor the reading belongs to.
    pub sensor_id: SensorId,
    /// When the reading was measured.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub date: OffsetDateTime,
    /// Temperature in degrees Celsius.
    pub temperature: Option<f64>,
    /// Relative humidity in percent.
    pub humidity: Option<f64>,
    /// Pressure in hectopascals.
    pub pressure: Option<f64>,
    /// Signal strength at the receiving gateway.
    pub rssi: Option<i32>,
    /// Battery voltage.
    pub voltage: Option<f64>,
    /// Acceleration on the X axis in g.
    pub acceleration_x: Option<f64>,
    /// Acceleration on the Y axis in g.
    pub acceleration_y: Option<f64>,
    /// Acceleration on the Z axis in g.
    pub acceleration_z: Option<f64>,
    /// Movement counter.
    pub movement_counter: Option<u32>,
    /// Measurement sequence number.
    pub measurement_sequence_number: Option<u32>,
    /// Transmit power in dBm.
    pub tx_power: Option<i32>,
}

impl SensorRecord {
    /// Create a record with no measurements.
    pub fn new(sensor_id: impl Into<SensorId>, date: OffsetDateTime) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            date,
            temperature: None,
            humidity: None,
            pressure: None,
            rssi: None,
            voltage: None,
            acceleration_x: None,
            acceleration_y: None,
            acceleration_z: None,
            movement_counter: None,
            measurement_sequence_number: None,
            tx_power: None,
        }
    }
}

/// Kind of per-sensor calibration offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OffsetKind {
    /// Temperature offset.
    Temperature,
    /// Humidity offset.
    Humidity,
    /// Pressure offset.
    Pressure,
}

impl OffsetKind {
    /// All offset kinds, in push order.
    pub const ALL: [OffsetKind; 3] = [
        OffsetKind::Temperature,
        OffsetKind::Humidity,
        OffsetKind::Pressure,
    ];

    /// Stable lower-case name, used as a storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            OffsetKind::Temperature => "temperature",
            OffsetKind::Humidity => "humidity",
            OffsetKind::Pressure => "pressure",
        }
    }
}

impl fmt::Display for OffsetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Temperature display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum TemperatureUnit {
    /// Degrees Celsius.
    #[default]
    Celsius,
    /// Degrees Fahrenheit.
    Fahrenheit,
    /// Kelvin.
    Kelvin,
}

impl FromStr for TemperatureUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "c" | "celsius" => Ok(Self::Celsius),
            "f" | "fahrenheit" => Ok(Self::Fahrenheit),
            "k" | "kelvin" => Ok(Self::Kelvin),
            _ => Err(ParseError::unknown_unit("temperature", s)),
        }
    }
}

/// Humidity display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HumidityUnit {
    /// Relative humidity in percent.
    #[default]
    Percent,
    /// Absolute humidity in g/m³.
    Gm3,
    /// Dew point.
    Dew,
}

impl FromStr for HumidityUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "0" | "percent" | "%" => Ok(Self::Percent),
            "1" | "gm3" | "g/m3" => Ok(Self::Gm3),
            "2" | "dew" => Ok(Self::Dew),
            _ => Err(ParseError::unknown_unit("humidity", s)),
        }
    }
}

/// Pressure display unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PressureUnit {
    /// Hectopascals.
    #[default]
    Hectopascals,
    /// Millimetres of mercury.
    MillimetersOfMercury,
    /// Inches of mercury.
    InchesOfMercury,
}

impl FromStr for PressureUnit {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "1" | "hpa" | "hectopascals" => Ok(Self::Hectopascals),
            "2" | "mmhg" | "millimetersofmercury" => Ok(Self::MillimetersOfMercury),
            "3" | "inhg" | "inchesofmercury" => Ok(Self::InchesOfMercury),
            _ => Err(ParseError::unknown_unit("pressure", s)),
        }
    }
}

/// A single local unit preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitPreference {
    /// Temperature display unit.
    Temperature(TemperatureUnit),
    /// Humidity display unit.
    Humidity(HumidityUnit),
    /// Pressure display unit.
    Pressure(PressureUnit),
}

/// Account-wide preferences stored in the cloud.
///
/// `None` means the cloud has no preference and the local value must be left
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CloudSettings {
    /// Preferred temperature unit.
    pub unit_temperature: Option<TemperatureUnit>,
    /// Preferred humidity unit.
    pub unit_humidity: Option<HumidityUnit>,
    /// Preferred pressure unit.
    pub unit_pressure: Option<PressureUnit>,
}

impl CloudSettings {
    /// The preferences present in these settings.
    pub fn preferences(&self) -> Vec<UnitPreference> {
        let mut prefs = Vec::with_capacity(3);
        if let Some(unit) = self.unit_temperature {
            prefs.push(UnitPreference::Temperature(unit));
        }
        if let Some(unit) = self.unit_humidity {
            prefs.push(UnitPreference::Humidity(unit));
        }
        if let Some(unit) = self.unit_pressure {
            prefs.push(UnitPreference::Pressure(unit));
        }
        prefs
    }
}

//! Platform-agnostic types for Station sensors.
//!
//! This crate provides the types shared by local persistence
//! (station-store) and the cloud synchronization engine (station-sync).
//!
//! # Features
//!
//! - Sensor identities: [`SensorId`], [`MacId`], [`Luid`]
//! - Local and cloud sensor snapshots with the claim transforms used
//!   during reconciliation
//! - History records, calibration offsets, and unit preferences
//! - Error types for identifier and unit parsing
//!
//! # Example
//!
//! ```
//! use station_types::{CloudSensor, LocalSensor};
//!
//! let local = LocalSensor::new("AA:BB:CC:DD:EE:FF", "Sauna");
//! let cloud = CloudSensor::new("AA:BB:CC:DD:EE:FF");
//!
//! let claimed = local.with_cloud_sensor(&cloud);
//! assert!(claimed.is_claimed && claimed.is_cloud);
//! assert_eq!(claimed.unclaimed().unclaimed(), claimed.unclaimed());
//! ```

pub mod error;
pub mod types;

pub use error::{ParseError, ParseResult};
pub use types::{
    CloudSensor, CloudSettings, HumidityUnit, LocalSensor, Luid, MacId, OffsetKind,
    PressureUnit, SensorId, SensorRecord, TemperatureUnit, UnitPreference,
};

#[cfg(test)]
mod tests {
    use super::*;

    // --- MacId parsing tests ---

    #[test]
    fn test_parse_mac_normalises_case_and_separators() {
        let a: MacId = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        let b: MacId = "AABBCCDDEEFF".parse().unwrap();
        let c: MacId = "aa-bb-cc-dd-ee-ff".parse().unwrap();

        assert_eq!(a.as_str(), "AA:BB:CC:DD:EE:FF");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_parse_mac_rejects_short_input() {
        let err = "aa:bb".parse::<MacId>().unwrap_err();
        assert_eq!(err, ParseError::InvalidMac("aa:bb".to_string()));
    }

    #[test]
    fn test_parse_mac_rejects_non_hex() {
        assert!("GG:BB:CC:DD:EE:FF".parse::<MacId>().is_err());
    }

    #[test]
    fn test_sensor_id_from_mac() {
        let mac: MacId = "aabbccddeeff".parse().unwrap();
        assert_eq!(SensorId::from(&mac).as_str(), "AA:BB:CC:DD:EE:FF");
    }

    #[test]
    fn test_parse_luid() {
        let luid: Luid = "67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap();
        assert_eq!(luid.to_string(), "67e55044-10b1-426f-9247-bb680e5fe0c8");
        assert!("nope".parse::<Luid>().is_err());
    }

    // --- Claim transform tests ---

    #[test]
    fn test_with_cloud_sensor_claims_and_links() {
        let local = LocalSensor::new("aa:bb", "Kitchen");
        let mut cloud = CloudSensor::new("aa:bb");
        cloud.name = Some("Cloud Kitchen".to_string());
        cloud.owner = Some("owner@example.com".to_string());

        let updated = local.with_cloud_sensor(&cloud);

        assert!(updated.is_claimed);
        assert!(updated.is_cloud);
        assert!(updated.is_owner);
        assert_eq!(updated.name, "Cloud Kitchen");
        assert_eq!(updated.owner.as_deref(), Some("owner@example.com"));
        // "aa:bb" is not a MAC, so no network identity can be adopted
        assert!(updated.mac.is_none());
    }

    #[test]
    fn test_with_cloud_sensor_adopts_mac_identity() {
        let local = LocalSensor::new("AA:BB:CC:DD:EE:FF", "Sauna");
        let cloud = CloudSensor::new("AA:BB:CC:DD:EE:FF");

        let updated = local.with_cloud_sensor(&cloud);
        assert_eq!(
            updated.network_id().map(MacId::as_str),
            Some("AA:BB:CC:DD:EE:FF")
        );
    }

    #[test]
    fn test_with_cloud_sensor_keeps_local_name_when_cloud_has_none() {
        let local = LocalSensor::new("aa:bb", "Garage");
        let updated = local.with_cloud_sensor(&CloudSensor::new("aa:bb"));
        assert_eq!(updated.name, "Garage");
    }

    #[test]
    fn test_unclaimed_is_idempotent() {
        let mut local = LocalSensor::new("aa:bb", "Attic");
        local.is_claimed = true;
        local.is_owner = true;
        local.is_cloud = true;

        let once = local.unclaimed();
        assert_ne!(once, local);
        assert!(!once.is_claimed && !once.is_owner && !once.is_cloud);
        assert_eq!(once.unclaimed(), once);
    }

    #[test]
    fn test_unclaimed_keeps_connection_attributes() {
        let mac: MacId = "aabbccddeeff".parse().unwrap();
        let mut local = LocalSensor::new("AA:BB:CC:DD:EE:FF", "Porch").with_mac(mac.clone());
        local.is_claimed = true;
        local.is_connectable = false;

        let unclaimed = local.unclaimed();
        assert_eq!(unclaimed.mac, Some(mac));
        assert!(!unclaimed.is_connectable);
        assert_eq!(unclaimed.name, "Porch");
    }

    #[test]
    fn test_cloud_sensor_to_local_sensor() {
        let cloud = CloudSensor::new("AA:BB:CC:DD:EE:01");
        let local = cloud.to_local_sensor();

        assert_eq!(local.id, cloud.id);
        assert_eq!(local.name, "AA:BB:CC:DD:EE:01");
        assert!(local.is_claimed && local.is_cloud);
        assert!(local.network_id().is_some());
    }

    #[test]
    fn test_cloud_sensor_offsets() {
        let mut cloud = CloudSensor::new("x");
        cloud.offset_temperature = Some(1.5);
        cloud.offset_pressure = Some(-2.0);

        assert_eq!(cloud.offset(OffsetKind::Temperature), Some(1.5));
        assert_eq!(cloud.offset(OffsetKind::Humidity), None);
        assert_eq!(cloud.offset(OffsetKind::Pressure), Some(-2.0));
    }

    // --- Unit tests ---

    #[test]
    fn test_unit_parsing() {
        assert_eq!("F".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Fahrenheit));
        assert_eq!("kelvin".parse::<TemperatureUnit>(), Ok(TemperatureUnit::Kelvin));
        assert_eq!("2".parse::<HumidityUnit>(), Ok(HumidityUnit::Dew));
        assert_eq!("mmHg".parse::<PressureUnit>(), Ok(PressureUnit::MillimetersOfMercury));

        let err = "X".parse::<TemperatureUnit>().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_cloud_settings_preferences_skip_absent_fields() {
        let settings = CloudSettings {
            unit_temperature: Some(TemperatureUnit::Kelvin),
            unit_humidity: None,
            unit_pressure: Some(PressureUnit::InchesOfMercury),
        };

        assert_eq!(
            settings.preferences(),
            vec![
                UnitPreference::Temperature(TemperatureUnit::Kelvin),
                UnitPreference::Pressure(PressureUnit::InchesOfMercury),
            ]
        );
        assert!(CloudSettings::default().preferences().is_empty());
    }

    // --- Serialization tests ---

    #[test]
    fn test_mac_serialization_validates() {
        let mac: MacId = serde_json::from_str("\"aabbccddeeff\"").unwrap();
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"AA:BB:CC:DD:EE:FF\"");
        assert!(serde_json::from_str::<MacId>("\"zz\"").is_err());
    }

    #[test]
    fn test_record_serialization_uses_rfc3339() {
        let record = SensorRecord::new("aa", time::OffsetDateTime::UNIX_EPOCH);
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_offset_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&OffsetKind::Humidity).unwrap(),
            "\"humidity\""
        );
    }
}

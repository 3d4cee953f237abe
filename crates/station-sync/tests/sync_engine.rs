//! End-to-end tests for the sync engine.
//!
//! Most tests drive [`CloudSync`] against the in-memory mocks. The last
//! section runs a full sync against the SQLite backend and file image cache.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use time::{Duration, OffsetDateTime};

use station_sync::local::SqliteBackend;
use station_sync::mock::{
    MockCloud, MockConfig, MockCursorStore, MockImageCache, MockLocalStore, png_bytes,
};
use station_sync::{
    Capabilities, CloudError, CloudSync, Error, SharedUnits, StorageError, SyncOptions,
    UnitPreferences,
};
use station_types::{
    CloudSensor, CloudSettings, LocalSensor, MacId, OffsetKind, PressureUnit, SensorId,
    SensorRecord, TemperatureUnit, UnitPreference,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn mac(i: u8) -> MacId {
    format!("AA:BB:CC:DD:EE:{:02X}", i).parse().unwrap()
}

/// A claimed, cloud-linked local sensor with a MAC.
fn cloud_linked(i: u8) -> LocalSensor {
    let mac = mac(i);
    CloudSensor::new(SensorId::from(&mac))
        .to_local_sensor()
        .with_mac(mac)
}

struct Fixture {
    local: Arc<MockLocalStore>,
    cloud: Arc<MockCloud>,
    cursors: Arc<MockCursorStore>,
    images: Arc<MockImageCache>,
    config: Arc<MockConfig>,
    sync: CloudSync,
}

impl Fixture {
    fn new(local: Vec<LocalSensor>) -> Self {
        Self::with_options(local, SyncOptions::default())
    }

    fn with_options(local: Vec<LocalSensor>, options: SyncOptions) -> Self {
        init_tracing();
        let local = Arc::new(MockLocalStore::with_sensors(local));
        let cloud = Arc::new(MockCloud::new());
        let cursors = Arc::new(MockCursorStore::new());
        let images = Arc::new(MockImageCache::new());
        let config = Arc::new(MockConfig::new());

        let sync = CloudSync::new(
            Capabilities {
                local: local.clone(),
                cloud: cloud.clone(),
                cursors: cursors.clone(),
                images: images.clone(),
                config: config.clone(),
            },
            options,
        );

        Self {
            local,
            cloud,
            cursors,
            images,
            config,
            sync,
        }
    }
}

async fn settle() {
    for _ in 0..100 {
        tokio::task::yield_now().await;
    }
}

fn ids(sensors: &[LocalSensor]) -> Vec<&str> {
    sensors.iter().map(|s| s.id.as_str()).collect()
}

// =============================================================================
// Sensor reconciliation
// =============================================================================

#[tokio::test]
async fn test_unclaimed_local_sensor_is_claimed_and_new_cloud_sensor_created() {
    let f = Fixture::new(vec![LocalSensor::new("aa:bb", "X")]);
    f.cloud
        .set_sensors(vec![CloudSensor::new("aa:bb"), CloudSensor::new("cc:dd")]);

    let touched = f.sync.sync_sensors().await.unwrap();

    assert_eq!(ids(&touched), vec!["aa:bb", "cc:dd"]);
    assert_eq!(f.local.update_count(), 1);
    assert_eq!(f.local.create_count(), 1);

    let x = f.local.sensor(&"aa:bb".into()).unwrap();
    assert!(x.is_claimed && x.is_cloud);
    assert_eq!(x.name, "X");
    let y = f.local.sensor(&"cc:dd".into()).unwrap();
    assert!(y.is_claimed && y.is_cloud);
}

#[tokio::test]
async fn test_claimed_sensor_absent_from_cloud_is_unclaimed_once() {
    let f = Fixture::new(vec![cloud_linked(1)]);

    let touched = f.sync.sync_sensors().await.unwrap();
    assert_eq!(touched.len(), 1);
    assert!(!touched[0].is_claimed);
    assert_eq!(f.local.update_count(), 1);

    let z = f.local.sensor(&touched[0].id).unwrap();
    assert!(!z.is_claimed && !z.is_cloud);

    // Already unclaimed: not reported, not written again
    let touched = f.sync.sync_sensors().await.unwrap();
    assert!(touched.is_empty());
    assert_eq!(f.local.update_count(), 1);
}

#[tokio::test]
async fn test_cloud_list_failure_is_surfaced_unchanged() {
    let f = Fixture::new(vec![]);
    f.cloud.fail_list(Some(CloudError::status(502, "bad gateway")));

    let err = f.sync.sync_sensors().await.unwrap_err();
    assert!(matches!(err, Error::Cloud(CloudError::Status { status: 502, .. })));
    assert_eq!(f.local.create_count(), 0);
}

#[tokio::test]
async fn test_offsets_are_pushed_for_every_cloud_sensor() {
    let f = Fixture::new(vec![cloud_linked(1)]);
    let mut cloud_a = CloudSensor::new(SensorId::from(&mac(1)));
    cloud_a.offset_temperature = Some(0.5);
    let mut cloud_b = CloudSensor::new(SensorId::from(&mac(2)));
    cloud_b.offset_humidity = Some(-4.0);
    f.cloud.set_sensors(vec![cloud_a, cloud_b]);

    f.sync.sync_sensors().await.unwrap();

    let a = f.local.offsets(&SensorId::from(&mac(1)));
    assert_eq!(a.get(&OffsetKind::Temperature), Some(&Some(0.5)));
    assert_eq!(a.len(), 3);
    let b = f.local.offsets(&SensorId::from(&mac(2)));
    assert_eq!(b.get(&OffsetKind::Humidity), Some(&Some(-4.0)));
}

#[tokio::test]
async fn test_offset_failure_fails_sensor_sync() {
    let f = Fixture::new(vec![]);
    f.cloud.set_sensors(vec![CloudSensor::new(SensorId::from(&mac(1)))]);
    f.local.fail_offsets_for(&SensorId::from(&mac(1)));

    let err = f.sync.sync_sensors().await.unwrap_err();

    assert!(matches!(err, Error::OffsetSync { .. }));
    assert!(matches!(err.root_cause(), Error::Storage(StorageError::Backend(_))));
    // Mutations are not rolled back
    assert_eq!(f.local.create_count(), 1);
}

// =============================================================================
// Images
// =============================================================================

#[tokio::test]
async fn test_images_are_cached_once_in_the_background() {
    let f = Fixture::new(vec![]);
    let mut sensor = CloudSensor::new(SensorId::from(&mac(1)));
    sensor.picture = Some("https://img/1.png".to_string());
    f.cloud.set_sensors(vec![sensor]);
    f.cloud.set_image("https://img/1.png", png_bytes(8, 6));

    f.sync.sync_sensors().await.unwrap();
    settle().await;

    let id = SensorId::from(&mac(1));
    assert!(f.images.is_marked(&id));
    assert_eq!(f.images.stored_dimensions(&id), Some((8, 6)));
    assert_eq!(f.cloud.image_downloads(), 1);

    f.sync.sync_sensors().await.unwrap();
    settle().await;
    assert_eq!(f.cloud.image_downloads(), 1);

    // External invalidation allows a new download
    f.images.invalidate();
    f.sync.sync_sensors().await.unwrap();
    settle().await;
    assert_eq!(f.cloud.image_downloads(), 2);
}

#[tokio::test]
async fn test_image_failures_never_fail_the_sync() {
    let f = Fixture::new(vec![]);
    let mut broken = CloudSensor::new(SensorId::from(&mac(1)));
    broken.picture = Some("https://img/broken".to_string());
    let no_picture = CloudSensor::new(SensorId::from(&mac(2)));
    f.cloud.set_sensors(vec![broken, no_picture]);
    f.cloud
        .set_image("https://img/broken", bytes::Bytes::from_static(b"garbage"));

    let touched = f.sync.sync_sensors().await.unwrap();
    settle().await;

    assert_eq!(touched.len(), 2);
    assert!(!f.images.is_marked(&SensorId::from(&mac(1))));
    assert!(!f.images.is_marked(&SensorId::from(&mac(2))));
}

// =============================================================================
// Record sync
// =============================================================================

#[tokio::test]
async fn test_first_sync_fetches_retention_window_and_cursor_is_fetch_start() {
    let f = Fixture::with_options(
        vec![cloud_linked(1)],
        SyncOptions {
            retention: Duration::hours(48),
            ..SyncOptions::default()
        },
    );
    let id = SensorId::from(&mac(1));
    let newest = OffsetDateTime::now_utc() - Duration::hours(2);
    f.cloud.add_records(vec![
        SensorRecord::new(id.clone(), newest - Duration::hours(1)),
        SensorRecord::new(id.clone(), newest),
    ]);

    let before = OffsetDateTime::now_utc();
    let records = f.sync.sync_sensor(&cloud_linked(1)).await.unwrap();
    let after = OffsetDateTime::now_utc();

    assert_eq!(records.len(), 2);
    let (_, since) = f.cloud.record_fetches()[0];
    assert!(since >= before - Duration::hours(48) && since <= after - Duration::hours(48));

    let cursor = f.cursors.cursor(&id).unwrap();
    assert!(cursor >= before && cursor <= after);
    assert_ne!(cursor, newest);
}

#[tokio::test]
async fn test_cursor_is_monotonic_across_success_and_failure() {
    let f = Fixture::new(vec![cloud_linked(1)]);
    let id = SensorId::from(&mac(1));
    let t = OffsetDateTime::now_utc() - Duration::minutes(10);
    f.cursors.insert(&id, t);

    let start = OffsetDateTime::now_utc();
    f.sync.sync_sensor(&cloud_linked(1)).await.unwrap();
    let advanced = f.cursors.cursor(&id).unwrap();
    assert!(advanced >= t);
    assert!(advanced >= start);

    f.cloud
        .fail_records_for(&id, CloudError::request("connection reset"));
    f.sync.sync_sensor(&cloud_linked(1)).await.unwrap_err();
    assert_eq!(f.cursors.cursor(&id), Some(advanced));
}

#[tokio::test]
async fn test_sensor_without_mac_fails_before_fetch() {
    let f = Fixture::new(vec![]);

    let err = f
        .sync
        .sync_sensor(&LocalSensor::new("aa:bb", "Local only"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingNetworkIdentity(_)));
    assert!(f.cloud.record_fetches().is_empty());
}

#[tokio::test]
async fn test_sync_all_records_only_syncs_cloud_linked_sensors() {
    let mut local = vec![cloud_linked(1), cloud_linked(2)];
    local.push(LocalSensor::new(SensorId::from(&mac(3)), "Local").with_mac(mac(3)));
    let f = Fixture::new(local);
    f.cloud.add_records(vec![
        SensorRecord::new(SensorId::from(&mac(1)), OffsetDateTime::now_utc() - Duration::hours(1)),
        SensorRecord::new(SensorId::from(&mac(3)), OffsetDateTime::now_utc() - Duration::hours(1)),
    ]);

    let records = f.sync.sync_all_records().await.unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(f.cloud.record_fetches().len(), 2);
    assert!(f.cursors.cursor(&SensorId::from(&mac(3))).is_none());
    assert_eq!(f.local.records().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_at_most_three_record_syncs_run_at_once() {
    let local: Vec<_> = (0..10).map(cloud_linked).collect();
    let f = Fixture::new(local.clone());
    f.cloud.set_record_latency(StdDuration::from_millis(50));

    f.sync.sync_all_records().await.unwrap();

    assert_eq!(f.cloud.max_concurrent_fetches(), 3);

    let fetches = f.cloud.record_fetches();
    assert_eq!(fetches.len(), 10);
    for sensor in &local {
        let count = fetches
            .iter()
            .filter(|(mac, _)| Some(mac) == sensor.mac.as_ref())
            .count();
        assert_eq!(count, 1, "{} fetched {} times", sensor.id, count);
        assert!(f.cursors.cursor(&sensor.id).is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn test_configured_concurrency_limit_is_honoured() {
    let local: Vec<_> = (0..6).map(cloud_linked).collect();
    let f = Fixture::with_options(
        local,
        SyncOptions {
            max_concurrent_record_syncs: 1,
            ..SyncOptions::default()
        },
    );
    f.cloud.set_record_latency(StdDuration::from_millis(10));

    f.sync.sync_all_records().await.unwrap();

    assert_eq!(f.cloud.max_concurrent_fetches(), 1);
    assert_eq!(f.cloud.record_fetches().len(), 6);
}

#[tokio::test]
async fn test_partial_failure_reports_error_and_keeps_successful_cursor() {
    let f = Fixture::new(vec![cloud_linked(1), cloud_linked(2)]);
    let a = SensorId::from(&mac(1));
    let b = SensorId::from(&mac(2));
    f.cloud.fail_records_for(&a, CloudError::Unauthorized);
    f.cloud.add_records(vec![SensorRecord::new(
        b.clone(),
        OffsetDateTime::now_utc() - Duration::hours(1),
    )]);

    let err = f.sync.sync_all_records().await.unwrap_err();

    match &err {
        Error::RecordSync { sensor, source } => {
            assert_eq!(sensor, &a);
            assert!(matches!(**source, Error::Cloud(CloudError::Unauthorized)));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(f.cursors.cursor(&a).is_none());
    assert!(f.cursors.cursor(&b).is_some());
    // B's records were persisted even though the aggregate failed
    assert_eq!(f.local.records().len(), 1);
}

#[tokio::test]
async fn test_outcome_reports_every_sensor() {
    let f = Fixture::new(vec![cloud_linked(1), cloud_linked(2), cloud_linked(3)]);
    f.cloud
        .fail_records_for(&SensorId::from(&mac(2)), CloudError::request("timeout"));

    let outcome = f.sync.sync_all_records_outcome().await.unwrap();

    assert_eq!(outcome.succeeded.len(), 2);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].0, SensorId::from(&mac(2)));
}

#[tokio::test(start_paused = true)]
async fn test_record_sync_completes_after_caller_gives_up() {
    let local: Vec<_> = (0..5).map(cloud_linked).collect();
    let f = Fixture::new(local.clone());
    f.cloud.set_record_latency(StdDuration::from_millis(100));

    let abandoned =
        tokio::time::timeout(StdDuration::from_millis(10), f.sync.sync_all_records()).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(StdDuration::from_secs(1)).await;

    for sensor in &local {
        assert!(f.cursors.cursor(&sensor.id).is_some(), "{} not synced", sensor.id);
    }
}

// =============================================================================
// Settings and full sync
// =============================================================================

#[tokio::test]
async fn test_sync_settings_applies_present_preferences() {
    let f = Fixture::new(vec![]);
    f.cloud.set_settings(CloudSettings {
        unit_temperature: Some(TemperatureUnit::Kelvin),
        unit_humidity: None,
        unit_pressure: Some(PressureUnit::MillimetersOfMercury),
    });

    let settings = f.sync.sync_settings().await.unwrap();

    assert_eq!(settings.unit_humidity, None);
    assert_eq!(
        f.config.applied(),
        vec![
            UnitPreference::Temperature(TemperatureUnit::Kelvin),
            UnitPreference::Pressure(PressureUnit::MillimetersOfMercury),
        ]
    );
}

#[tokio::test]
async fn test_sync_all_reconciles_syncs_records_and_settings() {
    let f = Fixture::new(vec![LocalSensor::new(SensorId::from(&mac(1)), "Sauna")]);
    f.cloud.set_sensors(vec![
        CloudSensor::new(SensorId::from(&mac(1))),
        CloudSensor::new(SensorId::from(&mac(2))),
    ]);
    f.cloud.add_records(vec![SensorRecord::new(
        SensorId::from(&mac(2)),
        OffsetDateTime::now_utc() - Duration::hours(1),
    )]);
    f.cloud.set_settings(CloudSettings {
        unit_temperature: Some(TemperatureUnit::Fahrenheit),
        ..CloudSettings::default()
    });

    let touched = f.sync.sync_all().await.unwrap();

    assert_eq!(touched.len(), 2);
    assert_eq!(f.cloud.record_fetches().len(), 2);
    for sensor in &touched {
        assert!(f.cursors.cursor(&sensor.id).is_some());
    }
    assert_eq!(f.local.records().len(), 1);
    assert_eq!(
        f.config.applied(),
        vec![UnitPreference::Temperature(TemperatureUnit::Fahrenheit)]
    );
}

#[tokio::test]
async fn test_sync_all_fails_when_settings_fail_but_sensors_still_sync() {
    let f = Fixture::new(vec![]);
    f.cloud.set_sensors(vec![CloudSensor::new(SensorId::from(&mac(1)))]);
    f.cloud.fail_settings(Some(CloudError::Unauthorized));

    let err = f.sync.sync_all().await.unwrap_err();

    assert!(matches!(err, Error::Cloud(CloudError::Unauthorized)));
    assert_eq!(f.local.create_count(), 1);
    assert!(f.cursors.cursor(&SensorId::from(&mac(1))).is_some());
}

#[tokio::test]
async fn test_sync_all_fails_when_a_record_sync_fails() {
    let f = Fixture::new(vec![]);
    f.cloud.set_sensors(vec![
        CloudSensor::new(SensorId::from(&mac(1))),
        CloudSensor::new(SensorId::from(&mac(2))),
    ]);
    f.cloud
        .fail_records_for(&SensorId::from(&mac(2)), CloudError::status(500, "oops"));

    let err = f.sync.sync_all().await.unwrap_err();

    assert!(matches!(&err, Error::RecordSync { sensor, .. } if *sensor == SensorId::from(&mac(2))));
    assert!(f.cursors.cursor(&SensorId::from(&mac(1))).is_some());
}

#[tokio::test(start_paused = true)]
async fn test_sync_all_reports_the_first_failure_to_complete() {
    let f = Fixture::new(vec![]);
    f.cloud.set_sensors(vec![
        CloudSensor::new(SensorId::from(&mac(1))),
        CloudSensor::new(SensorId::from(&mac(2))),
    ]);
    f.cloud
        .fail_records_for(&SensorId::from(&mac(1)), CloudError::status(503, "slow"));
    f.cloud
        .fail_records_for(&SensorId::from(&mac(2)), CloudError::status(500, "fast"));
    f.cloud
        .set_record_latency_for(&SensorId::from(&mac(1)), StdDuration::from_millis(200));

    let err = f.sync.sync_all().await.unwrap_err();

    match err {
        Error::RecordSync { sensor, source } => {
            assert_eq!(sensor, SensorId::from(&mac(2)));
            assert!(matches!(*source, Error::Cloud(CloudError::Status { status: 500, .. })));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // The slower sync still ran
    assert_eq!(f.cloud.record_fetches().len(), 2);
}

#[tokio::test]
async fn test_sync_all_stops_before_records_when_reconciliation_fails() {
    let f = Fixture::new(vec![]);
    f.cloud.set_sensors(vec![CloudSensor::new(SensorId::from(&mac(1)))]);
    f.local.fail_updates_for(&SensorId::from(&mac(1)));

    let err = f.sync.sync_all().await.unwrap_err();

    assert!(matches!(err, Error::Reconciliation { .. }));
    assert!(f.cloud.record_fetches().is_empty());
}

// =============================================================================
// SQLite backend
// =============================================================================

#[tokio::test]
async fn test_full_sync_against_sqlite_backend() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let backend = SqliteBackend::in_memory().unwrap();
    let image_dir = dir.path().join("images");
    let units = Arc::new(SharedUnits::new(UnitPreferences::default()));
    let cloud = Arc::new(MockCloud::new());

    // A sensor claimed on this device that the account no longer has
    {
        let store = backend.store();
        let store = store.lock().await;
        store.create_sensor(&cloud_linked(9)).unwrap();
    }

    let mut sauna = CloudSensor::new(SensorId::from(&mac(1)));
    sauna.name = Some("Sauna".to_string());
    sauna.picture = Some("https://img/sauna.png".to_string());
    sauna.offset_temperature = Some(-1.25);
    cloud.set_sensors(vec![sauna]);
    cloud.set_image("https://img/sauna.png", png_bytes(4, 4));
    cloud.set_settings(CloudSettings {
        unit_pressure: Some(PressureUnit::InchesOfMercury),
        ..CloudSettings::default()
    });

    let t = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp()).unwrap();
    cloud.add_records(vec![
        SensorRecord::new(SensorId::from(&mac(1)), t - Duration::hours(2)),
        SensorRecord::new(SensorId::from(&mac(1)), t - Duration::hours(1)),
    ]);

    let sync = CloudSync::new(
        Capabilities {
            local: Arc::new(backend.clone()),
            cloud: cloud.clone(),
            cursors: Arc::new(backend.clone()),
            images: Arc::new(backend.image_cache(&image_dir)),
            config: units.clone(),
        },
        SyncOptions::default(),
    );

    let touched = sync.sync_all().await.unwrap();
    assert_eq!(touched.len(), 2);

    // Image writes happen on a blocking thread in the background
    let image_path = image_dir.join("AA_BB_CC_DD_EE_01.png");
    for _ in 0..200 {
        if backend.store().lock().await.is_image_cached(mac(1).as_str()).unwrap() {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    assert!(image_path.exists());

    let store = backend.store();
    let store = store.lock().await;

    let sauna = store.get_sensor(mac(1).as_str()).unwrap().unwrap();
    assert_eq!(sauna.name, "Sauna");
    assert!(sauna.is_claimed && sauna.is_cloud);

    let gone = store.get_sensor(mac(9).as_str()).unwrap().unwrap();
    assert!(!gone.is_claimed && !gone.is_cloud);

    let offsets = store.get_offsets(mac(1).as_str()).unwrap();
    assert_eq!(offsets.temperature, Some(-1.25));
    assert_eq!(offsets.humidity, None);

    assert_eq!(store.count_records(Some(mac(1).as_str())).unwrap(), 2);
    assert!(store.get_sync_cursor(mac(1).as_str()).unwrap().is_some());
    assert!(store.is_image_cached(mac(1).as_str()).unwrap());

    assert_eq!(units.get().pressure, PressureUnit::InchesOfMercury);
    assert_eq!(units.get().temperature, TemperatureUnit::Celsius);
    drop(store);

    // Running again changes nothing and stores no duplicate records
    sync.sync_all().await.unwrap();
    assert_eq!(
        backend
            .store()
            .lock()
            .await
            .count_records(Some(mac(1).as_str()))
            .unwrap(),
        2
    );
}

#[tokio::test]
async fn test_sensor_known_by_luid_syncs_into_sqlite() {
    init_tracing();
    let backend = SqliteBackend::in_memory().unwrap();
    let cloud = Arc::new(MockCloud::new());

    let mut sensor = LocalSensor::new("67e55044-10b1-426f-9247-bb680e5fe0c8", "Cellar")
        .with_mac(mac(3));
    sensor.is_claimed = true;
    sensor.is_cloud = true;
    backend.store().lock().await.create_sensor(&sensor).unwrap();

    // The cloud keys history by MAC
    let t = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp()).unwrap();
    cloud.add_records(vec![
        SensorRecord::new(SensorId::from(&mac(3)), t - Duration::hours(2)),
        SensorRecord::new(SensorId::from(&mac(3)), t - Duration::hours(1)),
    ]);

    let sync = CloudSync::new(
        Capabilities {
            local: Arc::new(backend.clone()),
            cloud: cloud.clone(),
            cursors: Arc::new(backend.clone()),
            images: Arc::new(MockImageCache::new()),
            config: Arc::new(MockConfig::new()),
        },
        SyncOptions::default(),
    );

    let records = sync.sync_sensor(&sensor).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.sensor_id == sensor.id));

    sync.sync_all_records().await.unwrap();

    let store = backend.store();
    let store = store.lock().await;
    assert_eq!(store.count_records(Some(sensor.id.as_str())).unwrap(), 2);
    assert_eq!(store.count_records(Some(mac(3).as_str())).unwrap(), 0);
    assert!(store.get_sync_cursor(sensor.id.as_str()).unwrap().is_some());
}

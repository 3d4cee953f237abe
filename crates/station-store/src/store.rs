//! Main store implementation.

use std::collections::BTreeSet;
use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::{debug, info};

use station_types::{LocalSensor, OffsetKind, SensorId, SensorRecord};

use crate::error::{Error, Result};
use crate::models::{SensorOffsets, SyncState};
use crate::queries::{RECORD_COLUMNS, RecordQuery};
use crate::schema;

const SENSOR_COLUMNS: &str =
    "id, luid, mac, name, version, is_connectable, is_claimed, is_owner, owner, is_cloud";

/// SQLite-based store for sensors, their history, and cloud sync state.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    fn sensor_exists(&self, sensor_id: &str) -> Result<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM sensors WHERE id = ?",
            [sensor_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn require_sensor(&self, sensor_id: &str) -> Result<()> {
        if self.sensor_exists(sensor_id)? {
            Ok(())
        } else {
            Err(Error::SensorNotFound(sensor_id.to_string()))
        }
    }
}

fn timestamp(col: usize, ts: i64) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp(ts)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Integer, Box::new(e)))
}

fn timestamp_nanos(col: usize, ns: i64) -> rusqlite::Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ns))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Integer, Box::new(e)))
}

fn parse_column<T>(col: usize, value: Option<String>) -> rusqlite::Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|s| s.parse::<T>())
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(col, Type::Text, Box::new(e)))
}

fn sensor_from_row(row: &Row<'_>) -> rusqlite::Result<LocalSensor> {
    Ok(LocalSensor {
        id: SensorId::new(row.get::<_, String>(0)?),
        luid: parse_column(1, row.get(1)?)?,
        mac: parse_column(2, row.get(2)?)?,
        name: row.get(3)?,
        version: row.get(4)?,
        is_connectable: row.get(5)?,
        is_claimed: row.get(6)?,
        is_owner: row.get(7)?,
        owner: row.get(8)?,
        is_cloud: row.get(9)?,
    })
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<SensorRecord> {
    Ok(SensorRecord {
        sensor_id: SensorId::new(row.get::<_, String>(0)?),
        date: timestamp(1, row.get(1)?)?,
        temperature: row.get(2)?,
        humidity: row.get(3)?,
        pressure: row.get(4)?,
        rssi: row.get(5)?,
        voltage: row.get(6)?,
        acceleration_x: row.get(7)?,
        acceleration_y: row.get(8)?,
        acceleration_z: row.get(9)?,
        movement_counter: row.get(10)?,
        measurement_sequence_number: row.get(11)?,
        tx_power: row.get(12)?,
    })
}

// Sensor operations
impl Store {
    /// Insert a new sensor.
    ///
    /// Fails with [`Error::SensorExists`] if a sensor with the same identity
    /// is already stored.
    pub fn create_sensor(&self, sensor: &LocalSensor) -> Result<()> {
        if self.sensor_exists(sensor.id.as_str())? {
            return Err(Error::SensorExists(sensor.id.to_string()));
        }

        let now = OffsetDateTime::now_utc().unix_timestamp();
        self.conn.execute(
            "INSERT INTO sensors (id, luid, mac, name, version, is_connectable, is_claimed,
             is_owner, owner, is_cloud, first_seen, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            rusqlite::params![
                sensor.id.as_str(),
                sensor.luid.map(|l| l.to_string()),
                sensor.mac.as_ref().map(|m| m.as_str()),
                &sensor.name,
                sensor.version,
                sensor.is_connectable,
                sensor.is_claimed,
                sensor.is_owner,
                &sensor.owner,
                sensor.is_cloud,
                now,
            ],
        )?;

        debug!("Created sensor {}", sensor.id);
        Ok(())
    }

    /// Overwrite all attributes of an existing sensor.
    pub fn update_sensor(&self, sensor: &LocalSensor) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE sensors SET
                luid = ?2,
                mac = ?3,
                name = ?4,
                version = ?5,
                is_connectable = ?6,
                is_claimed = ?7,
                is_owner = ?8,
                owner = ?9,
                is_cloud = ?10,
                updated_at = ?11
             WHERE id = ?1",
            rusqlite::params![
                sensor.id.as_str(),
                sensor.luid.map(|l| l.to_string()),
                sensor.mac.as_ref().map(|m| m.as_str()),
                &sensor.name,
                sensor.version,
                sensor.is_connectable,
                sensor.is_claimed,
                sensor.is_owner,
                &sensor.owner,
                sensor.is_cloud,
                OffsetDateTime::now_utc().unix_timestamp(),
            ],
        )?;

        if changed == 0 {
            return Err(Error::SensorNotFound(sensor.id.to_string()));
        }

        debug!("Updated sensor {}", sensor.id);
        Ok(())
    }

    /// Get a sensor by identity.
    pub fn get_sensor(&self, sensor_id: &str) -> Result<Option<LocalSensor>> {
        let sql = format!("SELECT {} FROM sensors WHERE id = ?", SENSOR_COLUMNS);
        let sensor = self
            .conn
            .query_row(&sql, [sensor_id], sensor_from_row)
            .optional()?;
        Ok(sensor)
    }

    /// List all sensors in the order they were first seen.
    pub fn list_sensors(&self) -> Result<Vec<LocalSensor>> {
        let sql = format!(
            "SELECT {} FROM sensors ORDER BY first_seen ASC, id ASC",
            SENSOR_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let sensors = stmt
            .query_map([], sensor_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sensors)
    }
}

// Offset operations
impl Store {
    /// Set one calibration offset of a sensor.
    ///
    /// `None` clears the offset. Writing the same value twice is a no-op
    /// apart from the update timestamp.
    pub fn set_offset(
        &self,
        sensor_id: &str,
        kind: OffsetKind,
        value: Option<f64>,
    ) -> Result<SensorOffsets> {
        self.require_sensor(sensor_id)?;

        self.conn.execute(
            "INSERT INTO sensor_offsets (sensor_id, kind, value, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(sensor_id, kind) DO UPDATE SET
                value = ?3,
                updated_at = ?4",
            rusqlite::params![
                sensor_id,
                kind.as_str(),
                value,
                OffsetDateTime::now_utc().unix_timestamp()
            ],
        )?;

        debug!("Set {} offset of {} to {:?}", kind, sensor_id, value);
        self.get_offsets(sensor_id)
    }

    /// Get all calibration offsets of a sensor.
    pub fn get_offsets(&self, sensor_id: &str) -> Result<SensorOffsets> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, value, updated_at FROM sensor_offsets WHERE sensor_id = ?",
        )?;
        let rows = stmt
            .query_map([sensor_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<f64>>(1)?,
                    timestamp(2, row.get(2)?)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut offsets = SensorOffsets::default();
        for (kind, value, updated_at) in rows {
            let kind = OffsetKind::ALL
                .into_iter()
                .find(|k| k.as_str() == kind)
                .ok_or(Error::InvalidValue {
                    column: "sensor_offsets.kind",
                    value: kind,
                })?;
            offsets.set(kind, value);
            offsets.updated_at = offsets.updated_at.max(Some(updated_at));
        }

        Ok(offsets)
    }
}

// Record operations
impl Store {
    /// Insert history records, skipping any already stored.
    ///
    /// Records are keyed by `(sensor_id, date)`; re-inserting a window that
    /// was already synced does not create duplicates. Every referenced sensor
    /// must exist. Returns the number of new rows.
    pub fn insert_records(&self, records: &[SensorRecord]) -> Result<usize> {
        let sensors: BTreeSet<&str> = records.iter().map(|r| r.sensor_id.as_str()).collect();
        for sensor_id in &sensors {
            self.require_sensor(sensor_id)?;
        }

        let synced_at = OffsetDateTime::now_utc().unix_timestamp();
        let tx = self.conn.unchecked_transaction()?;
        let mut inserted = 0;

        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO records (sensor_id, date, synced_at, temperature,
                 humidity, pressure, rssi, voltage, acceleration_x, acceleration_y,
                 acceleration_z, movement_counter, measurement_sequence_number, tx_power)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;

            for record in records {
                inserted += stmt.execute(rusqlite::params![
                    record.sensor_id.as_str(),
                    record.date.unix_timestamp(),
                    synced_at,
                    record.temperature,
                    record.humidity,
                    record.pressure,
                    record.rssi,
                    record.voltage,
                    record.acceleration_x,
                    record.acceleration_y,
                    record.acceleration_z,
                    record.movement_counter,
                    record.measurement_sequence_number,
                    record.tx_power,
                ])?;
            }
        }

        tx.commit()?;

        info!(
            "Inserted {} new records for {} sensor(s)",
            inserted,
            sensors.len()
        );
        Ok(inserted)
    }

    /// Query records with filters.
    pub fn query_records(&self, query: &RecordQuery) -> Result<Vec<SensorRecord>> {
        let (sql, params) = query.to_sql();
        debug!("Executing query: {}", sql);

        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map(rusqlite::params_from_iter(params), record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get the newest record of a sensor.
    pub fn get_latest_record(&self, sensor_id: &str) -> Result<Option<SensorRecord>> {
        let query = RecordQuery::new().sensor(sensor_id).limit(1);
        Ok(self.query_records(&query)?.pop())
    }

    /// Count records, optionally for a single sensor.
    pub fn count_records(&self, sensor_id: Option<&str>) -> Result<u64> {
        let count: i64 = match sensor_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM records WHERE sensor_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?,
        };

        Ok(count as u64)
    }
}

// Sync state operations
impl Store {
    /// Get the sync state of a sensor.
    pub fn get_sync_state(&self, sensor_id: &str) -> Result<Option<SyncState>> {
        let state = self
            .conn
            .query_row(
                "SELECT sensor_id, last_sync_at_ns FROM sync_state WHERE sensor_id = ?",
                [sensor_id],
                |row| {
                    Ok(SyncState {
                        sensor_id: row.get(0)?,
                        last_sync_at: timestamp_nanos(1, row.get(1)?)?,
                    })
                },
            )
            .optional()?;

        Ok(state)
    }

    /// Get the sync cursor of a sensor.
    pub fn get_sync_cursor(&self, sensor_id: &str) -> Result<Option<OffsetDateTime>> {
        Ok(self.get_sync_state(sensor_id)?.map(|s| s.last_sync_at))
    }

    /// Advance the sync cursor of a sensor.
    ///
    /// The cursor never moves backwards: an older timestamp leaves the stored
    /// value in place. Returns the cursor after the write.
    pub fn set_sync_cursor(&self, sensor_id: &str, at: OffsetDateTime) -> Result<OffsetDateTime> {
        let nanos = i64::try_from(at.unix_timestamp_nanos())
            .map_err(|_| Error::InvalidTimestamp(at.unix_timestamp()))?;

        let cursor = self.conn.query_row(
            "INSERT INTO sync_state (sensor_id, last_sync_at_ns) VALUES (?1, ?2)
             ON CONFLICT(sensor_id) DO UPDATE SET
                last_sync_at_ns = MAX(last_sync_at_ns, excluded.last_sync_at_ns)
             RETURNING last_sync_at_ns",
            rusqlite::params![sensor_id, nanos],
            |row| timestamp_nanos(0, row.get(0)?),
        )?;

        debug!("Sync cursor for {} is now {}", sensor_id, cursor);
        Ok(cursor)
    }

    /// Forget the sync cursor of a sensor, forcing a full retention-window
    /// fetch on the next sync.
    pub fn clear_sync_cursor(&self, sensor_id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_state WHERE sensor_id = ?", [sensor_id])?;
        Ok(())
    }
}

// Image cache operations
impl Store {
    /// Whether the sensor's background image has been cached.
    pub fn is_image_cached(&self, sensor_id: &str) -> Result<bool> {
        let cached: bool = self.conn.query_row(
            "SELECT COUNT(*) > 0 FROM image_cache WHERE sensor_id = ?",
            [sensor_id],
            |row| row.get(0),
        )?;
        Ok(cached)
    }

    /// Record that the sensor's background image has been cached.
    pub fn mark_image_cached(&self, sensor_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO image_cache (sensor_id, cached_at) VALUES (?1, ?2)",
            rusqlite::params![sensor_id, OffsetDateTime::now_utc().unix_timestamp()],
        )?;
        Ok(())
    }

    /// Invalidate cached image flags, for one sensor or for all of them.
    pub fn clear_image_cache(&self, sensor_id: Option<&str>) -> Result<usize> {
        let removed = match sensor_id {
            Some(id) => self
                .conn
                .execute("DELETE FROM image_cache WHERE sensor_id = ?", [id])?,
            None => self.conn.execute("DELETE FROM image_cache", [])?,
        };
        Ok(removed)
    }
}

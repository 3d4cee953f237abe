//! Database schema and migrations.
//!
//! The schema version lives in SQLite's `user_version` pragma. Each entry of
//! [`MIGRATIONS`] upgrades the database by exactly one version.

use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

/// Schema steps, applied in order. Index `n` upgrades version `n` to `n + 1`.
const MIGRATIONS: &[&str] = &[V1_SENSORS_RECORDS_CURSORS];

/// Version a fully migrated database reports.
pub const SCHEMA_VERSION: i32 = MIGRATIONS.len() as i32;

const V1_SENSORS_RECORDS_CURSORS: &str = r#"
    -- Sensors known to this device, claimed or not
    CREATE TABLE sensors (
        id TEXT PRIMARY KEY,
        luid TEXT,
        mac TEXT,
        name TEXT NOT NULL,
        version INTEGER NOT NULL,
        is_connectable INTEGER NOT NULL,
        is_claimed INTEGER NOT NULL,
        is_owner INTEGER NOT NULL,
        owner TEXT,
        is_cloud INTEGER NOT NULL,
        first_seen INTEGER NOT NULL,
        updated_at INTEGER NOT NULL
    );

    -- Calibration offsets, one row per sensor and kind
    CREATE TABLE sensor_offsets (
        sensor_id TEXT NOT NULL REFERENCES sensors(id),
        kind TEXT NOT NULL,
        value REAL,
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (sensor_id, kind)
    );

    -- History records, unique per sensor and date
    CREATE TABLE records (
        sensor_id TEXT NOT NULL REFERENCES sensors(id),
        date INTEGER NOT NULL,
        synced_at INTEGER NOT NULL,
        temperature REAL,
        humidity REAL,
        pressure REAL,
        rssi INTEGER,
        voltage REAL,
        acceleration_x REAL,
        acceleration_y REAL,
        acceleration_z REAL,
        movement_counter INTEGER,
        measurement_sequence_number INTEGER,
        tx_power INTEGER,
        PRIMARY KEY (sensor_id, date)
    );

    -- Cloud sync cursor per sensor, in unix nanoseconds
    CREATE TABLE sync_state (
        sensor_id TEXT PRIMARY KEY,
        last_sync_at_ns INTEGER NOT NULL
    );

    -- Sensors whose background image has been cached
    CREATE TABLE image_cache (
        sensor_id TEXT PRIMARY KEY,
        cached_at INTEGER NOT NULL
    );
"#;

/// Bring the database up to [`SCHEMA_VERSION`].
///
/// Every pending step runs in its own transaction together with the version
/// bump, so an interrupted upgrade resumes where it stopped.
pub fn initialize(conn: &Connection) -> Result<()> {
    let current = user_version(conn)?;

    for (from, step) in MIGRATIONS.iter().enumerate().skip(current.max(0) as usize) {
        let to = from as i32 + 1;
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(step)?;
        tx.pragma_update(None, "user_version", to)?;
        tx.commit()?;
        info!("Migrated database schema to version {}", to);
    }

    Ok(())
}

fn user_version(conn: &Connection) -> Result<i32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

//! Local data persistence for Station sensors.
//!
//! This crate provides SQLite-based storage for everything the cloud sync
//! engine reads and writes on the device side.
//!
//! # Features
//!
//! - Sensor metadata, including cloud claim state
//! - Per-sensor calibration offsets
//! - History records, deduplicated by sensor and timestamp
//! - Monotonic per-sensor sync cursors
//! - Cached background image flags
//!
//! # Example
//!
//! ```no_run
//! use station_store::{RecordQuery, Store};
//!
//! let store = Store::open_default()?;
//!
//! for sensor in store.list_sensors()? {
//!     let cursor = store.get_sync_cursor(sensor.id.as_str())?;
//!     println!("{}: last synced {:?}", sensor.name, cursor);
//! }
//!
//! let latest = store.query_records(&RecordQuery::new().limit(10))?;
//! # Ok::<(), station_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{SensorOffsets, SyncState};
pub use queries::RecordQuery;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/station/data.db`
/// - macOS: `~/Library/Application Support/station/data.db`
/// - Windows: `C:\Users\<user>\AppData\Local\station\data.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("station")
        .join("data.db")
}

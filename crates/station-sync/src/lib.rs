//! Cloud synchronization engine for Station sensors.
//!
//! This crate reconciles the sensors known to this device with the sensors
//! of a cloud account, pulls sensor history incrementally, and brings cloud
//! calibration offsets, background images and unit preferences to the
//! device.
//!
//! # Features
//!
//! - **Reconciliation**: create, update and unclaim local sensors to match
//!   the cloud's view of sensor existence and ownership
//! - **Incremental history**: per-sensor cursors, advanced only after a
//!   successful fetch
//! - **Bounded concurrency**: at most three record syncs at once by default
//! - **Calibration offsets**: temperature, humidity and pressure offsets
//!   pushed for every reconciled sensor
//! - **Image caching**: background pictures cached once per sensor, in the
//!   background
//! - **Settings**: cloud unit preferences applied to local configuration
//!
//! # Architecture
//!
//! The engine performs no I/O itself. It consumes five capabilities from
//! [`traits`]: a [`LocalStore`], a [`CloudClient`], a [`CursorStore`], an
//! [`ImageCache`] and a [`LocalConfig`]. SQLite-backed implementations live
//! in [`local`]; in-memory doubles for tests live in [`mock`].
//!
//! # Errors
//!
//! Single-step failures surface as [`Error::Cloud`] or [`Error::Storage`].
//! Fan-outs wrap their first failure in [`Error::Reconciliation`],
//! [`Error::OffsetSync`] or [`Error::RecordSync`]. Image failures are logged
//! and never fail a sync.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use station_sync::local::SqliteBackend;
//! use station_sync::{Capabilities, CloudClient, CloudSync, Config, SharedUnits, SyncOptions};
//!
//! # async fn example(cloud: Arc<dyn CloudClient>) -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_default()?;
//! config.validate()?;
//!
//! let backend = SqliteBackend::open(&config.storage)?;
//! let sync = CloudSync::new(
//!     Capabilities {
//!         local: Arc::new(backend.clone()),
//!         cloud,
//!         cursors: Arc::new(backend.clone()),
//!         images: Arc::new(backend.image_cache(&config.storage.image_dir)),
//!         config: Arc::new(SharedUnits::new(config.units)),
//!     },
//!     SyncOptions::from(&config.sync),
//! );
//!
//! let touched = sync.sync_all().await?;
//! println!("Synced {} sensors", touched.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod images;
pub mod local;
pub mod mock;
pub mod offsets;
pub mod reconcile;
pub mod records;
pub mod scheduler;
pub mod service;
pub mod settings;
pub mod traits;

pub use config::{Config, ConfigError, SharedUnits, SyncConfig, UnitPreferences, ValidationError};
pub use error::{CloudError, CloudResult, Error, Result, StorageError, StorageResult};
pub use images::ImageSync;
pub use offsets::sync_offsets;
pub use reconcile::{Reconciliation, reconcile};
pub use records::RecordSync;
pub use scheduler::{BatchOutcome, BoundedScheduler};
pub use service::{Capabilities, CloudSync, SyncOptions};
pub use settings::sync_settings;
pub use traits::{CloudClient, CursorStore, ImageCache, LocalConfig, LocalStore};

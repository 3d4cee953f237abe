//! Error types for station-sync.
//!
//! Leaf capabilities report [`CloudError`] and [`StorageError`]. The engine
//! surfaces those unchanged from single-step operations, and wraps the first
//! failure in an aggregate variant when a fan-out fails:
//!
//! | Aggregate | Raised by |
//! |-----------|-----------|
//! | [`Error::Reconciliation`] | applying create/update/unclaim mutations |
//! | [`Error::OffsetSync`] | pushing calibration offsets |
//! | [`Error::RecordSync`] | the bounded record scheduler |
//!
//! The wrapped cause is always kept; use [`Error::root_cause`] to reach it.
//! Image sync failures never reach an aggregate and are only logged.

use thiserror::Error;

use station_types::SensorId;

use crate::config::ConfigError;

/// Failure reported by a cloud client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CloudError {
    /// The request could not be sent or the connection failed.
    #[error("Cloud request failed: {0}")]
    Request(String),

    /// The cloud answered with an error status.
    #[error("Cloud returned status {status}: {message}")]
    Status {
        /// HTTP-like status code.
        status: u16,
        /// Message from the response body.
        message: String,
    },

    /// No signed-in account, or the session expired.
    #[error("Not authorized with the cloud")]
    Unauthorized,

    /// The response could not be interpreted.
    #[error("Invalid cloud response: {0}")]
    InvalidResponse(String),
}

impl CloudError {
    /// Create a request failure.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Create a status failure.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }
}

/// Failure reported by local persistence.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Error from the SQLite store.
    #[error(transparent)]
    Store(#[from] station_store::Error),

    /// File system error.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure.
    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    /// Create a backend failure.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Errors that can occur while synchronizing with the cloud.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A cloud call failed.
    #[error(transparent)]
    Cloud(#[from] CloudError),

    /// A local store call failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The sensor has no MAC address, so the cloud cannot be asked about it.
    #[error("Sensor {0} has no network identity")]
    MissingNetworkIdentity(SensorId),

    /// The cloud sensor has no background picture.
    #[error("Sensor {0} has no picture URL")]
    MissingPictureUrl(SensorId),

    /// Downloaded bytes could not be decoded.
    #[error("Failed to parse response: {0}")]
    ResponseParse(String),

    /// Applying the reconciled sensor mutations failed.
    #[error("Sensor reconciliation failed: {source}")]
    Reconciliation {
        /// First failure among the applied mutations.
        source: Box<Error>,
    },

    /// Pushing calibration offsets failed.
    #[error("Offset sync failed: {source}")]
    OffsetSync {
        /// First failure among the offset updates.
        source: Box<Error>,
    },

    /// At least one record sync task failed.
    #[error("Record sync failed for sensor {sensor}: {source}")]
    RecordSync {
        /// Sensor of the earliest failing task.
        sensor: SensorId,
        /// Failure of that task.
        source: Box<Error>,
    },

    /// A detached sync task panicked or was aborted by the runtime.
    #[error("Sync task aborted: {0}")]
    TaskAborted(String),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Create a missing network identity error.
    pub fn missing_network_identity(sensor: &SensorId) -> Self {
        Self::MissingNetworkIdentity(sensor.clone())
    }

    /// Create a response parse error.
    pub fn response_parse(message: impl Into<String>) -> Self {
        Self::ResponseParse(message.into())
    }

    pub(crate) fn reconciliation(source: Error) -> Self {
        Self::Reconciliation {
            source: Box::new(source),
        }
    }

    pub(crate) fn offset_sync(source: Error) -> Self {
        Self::OffsetSync {
            source: Box::new(source),
        }
    }

    pub(crate) fn record_sync(sensor: SensorId, source: Error) -> Self {
        Self::RecordSync {
            sensor,
            source: Box::new(source),
        }
    }

    /// The original failure underneath any aggregate wrappers.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::Reconciliation { source }
            | Self::OffsetSync { source }
            | Self::RecordSync { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

impl From<station_store::Error> for Error {
    fn from(err: station_store::Error) -> Self {
        Self::Storage(StorageError::Store(err))
    }
}

/// Result type alias using station-sync's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type returned by [`crate::CloudClient`] implementations.
pub type CloudResult<T> = std::result::Result<T, CloudError>;

/// Result type returned by local persistence capabilities.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

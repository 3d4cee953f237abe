//! Query builder for history records.
//!
//! # Example
//!
//! ```
//! use station_store::{RecordQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let yesterday = OffsetDateTime::now_utc() - Duration::hours(24);
//!
//! let records = store.query_records(
//!     &RecordQuery::new()
//!         .sensor("AA:BB:CC:DD:EE:FF")
//!         .since(yesterday)
//!         .limit(50),
//! )?;
//! assert!(records.is_empty());
//! # Ok::<(), station_store::Error>(())
//! ```

use rusqlite::types::Value;
use time::OffsetDateTime;

/// Columns selected for records, in row-mapping order.
pub(crate) const RECORD_COLUMNS: &str = "sensor_id, date, temperature, humidity, pressure, \
     rssi, voltage, acceleration_x, acceleration_y, acceleration_z, movement_counter, \
     measurement_sequence_number, tx_power";

/// Filter and page through stored records.
///
/// Results are newest first unless [`RecordQuery::oldest_first`] is set.
/// Time bounds are inclusive.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordQuery {
    /// Only records of this sensor.
    pub sensor_id: Option<String>,
    /// Lower time bound.
    pub since: Option<OffsetDateTime>,
    /// Upper time bound.
    pub until: Option<OffsetDateTime>,
    /// Page size.
    pub limit: Option<u32>,
    /// Rows skipped before the page.
    pub offset: Option<u32>,
    /// Chronological instead of newest-first order.
    pub ascending: bool,
}

impl RecordQuery {
    /// A query over every record, newest first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to one sensor.
    pub fn sensor(mut self, sensor_id: impl Into<String>) -> Self {
        self.sensor_id = Some(sensor_id.into());
        self
    }

    /// Records dated at or after `time`.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.since = Some(time);
        self
    }

    /// Records dated at or before `time`.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.until = Some(time);
        self
    }

    /// Return at most `limit` records.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip `offset` records.
    pub fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Chronological order.
    pub fn oldest_first(mut self) -> Self {
        self.ascending = true;
        self
    }

    /// The statement and its positional parameters.
    pub(crate) fn to_sql(&self) -> (String, Vec<Value>) {
        let mut filters = Vec::new();
        let mut params = Vec::new();

        if let Some(sensor_id) = &self.sensor_id {
            filters.push("sensor_id = ?");
            params.push(Value::Text(sensor_id.clone()));
        }
        if let Some(since) = self.since {
            filters.push("date >= ?");
            params.push(Value::Integer(since.unix_timestamp()));
        }
        if let Some(until) = self.until {
            filters.push("date <= ?");
            params.push(Value::Integer(until.unix_timestamp()));
        }

        let mut sql = format!("SELECT {} FROM records", RECORD_COLUMNS);
        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        sql.push_str(if self.ascending {
            " ORDER BY date ASC"
        } else {
            " ORDER BY date DESC"
        });

        // OFFSET is only valid after LIMIT; -1 means unbounded
        if self.limit.is_some() || self.offset.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(self.limit.map_or(-1, i64::from)));
            params.push(Value::Integer(i64::from(self.offset.unwrap_or(0))));
        }

        (sql, params)
    }
}

//! Heartbeat telemetry
//!
//! Heartbeats are consumed by the session itself and never fanned out to
//! subscribers. What happens with them is up to the installed sink.

use chrono::{DateTime, Utc};
use cnclink_core::DataSource;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Receives device heartbeats
pub trait TelemetrySink: Send + Sync {
    /// Called once per heartbeat; must not block
    fn heartbeat(&self, data_source: &DataSource, payload: &Value);
}

/// Per data source heartbeat bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatRecord {
    /// Heartbeats received
    pub count: u64,
    /// Time of the latest heartbeat
    pub last_seen: DateTime<Utc>,
}

/// Default sink: logs heartbeats and remembers when each source last beat
#[derive(Debug, Default)]
pub struct TracingTelemetry {
    records: RwLock<HashMap<DataSource, HeartbeatRecord>>,
}

impl TracingTelemetry {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Bookkeeping for one data source, if it ever sent a heartbeat
    pub fn record(&self, data_source: &DataSource) -> Option<HeartbeatRecord> {
        self.records.read().get(data_source).copied()
    }

    /// Milliseconds since the last heartbeat from a data source
    pub fn millis_since_last(&self, data_source: &DataSource) -> Option<i64> {
        self.record(data_source)
            .map(|r| (Utc::now() - r.last_seen).num_milliseconds())
    }
}

impl TelemetrySink for TracingTelemetry {
    fn heartbeat(&self, data_source: &DataSource, payload: &Value) {
        let now = Utc::now();
        let mut records = self.records.write();
        let record = records
            .entry(data_source.clone())
            .or_insert(HeartbeatRecord {
                count: 0,
                last_seen: now,
            });
        record.count += 1;
        record.last_seen = now;
        tracing::trace!(
            "Heartbeat #{} from {}: {}",
            record.count,
            data_source,
            payload
        );
    }
}

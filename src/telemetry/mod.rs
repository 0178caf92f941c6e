// ==========================================
// OEE Calculation Service - telemetry layer
// ==========================================
// Access to the time-series store, behind async traits
// so jobs take explicitly constructed, substitutable
// clients instead of process-wide singletons.
// ==========================================

pub mod influx;
pub mod point;

pub use influx::InfluxClient;
pub use point::{FieldValue, Point};

use crate::domain::metrics::{CalcWindow, MachineStateDurations, ProductionCounts};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// ==========================================
// Error taxonomy
// ==========================================
// "No data yet" (store not populated) is an explicit
// outcome, distinct from genuine faults: the orchestrator
// degrades both to zero observations but logs them
// differently.

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("time-series store has no data yet: {0}")]
    Empty(String),

    #[error("time-series request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("time-series store returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode time-series response: {0}")]
    Decode(String),
}

impl TelemetryError {
    /// True for the known "not yet populated" outcome.
    pub fn is_empty(&self) -> bool {
        matches!(self, TelemetryError::Empty(_))
    }
}

// ==========================================
// TagSample - latest value of one monitored field
// ==========================================

#[derive(Debug, Clone)]
pub struct TagSample {
    pub value: serde_json::Value,
    pub time: Option<DateTime<Utc>>,
}

// ==========================================
// Read/write traits
// ==========================================

/// Read side of the time-series store.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Summed seconds per machine state within the window.
    async fn state_durations(
        &self,
        machine_id: i64,
        window: CalcWindow,
    ) -> Result<MachineStateDurations, TelemetryError>;

    /// Maximum cumulative total/reject counter values observed in
    /// the window (counters are monotonic, so max = window production).
    async fn production_counts(
        &self,
        machine_id: i64,
        window: CalcWindow,
    ) -> Result<ProductionCounts, TelemetryError>;

    /// Most recent value of `measurement`.`field` for the machine.
    /// Ok(None) when no sample exists yet.
    async fn latest_field_value(
        &self,
        machine_id: i64,
        measurement: &str,
        field: &str,
    ) -> Result<Option<TagSample>, TelemetryError>;
}

/// Write side of the time-series store.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn write(&self, points: Vec<Point>) -> Result<(), TelemetryError>;
}

// ==========================================
// OEE Calculation Service - metric result entities
// ==========================================
// Window inputs and per-component results carried
// through the calculation pipeline. Values are
// computed by calculator/, not here.
// ==========================================

use crate::domain::types::MachineState;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CalcWindow - one calculation time window
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalcWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CalcWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window of `interval_seconds` ending at `end`.
    pub fn ending_at(end: DateTime<Utc>, interval_seconds: u64) -> Self {
        Self {
            start: end - Duration::seconds(interval_seconds as i64),
            end,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 1000.0
    }

    /// Shift/window identifier grouping all metrics of one batch.
    /// Compact timestamp of the window start, e.g. "202608301205".
    pub fn shift_id(&self) -> String {
        self.start.format("%Y%m%d%H%M").to_string()
    }
}

// ==========================================
// MachineStateDurations - seconds per state
// ==========================================
// Derived from time-series aggregation, never persisted
// directly. Missing states imply zero seconds.

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineStateDurations {
    by_state: HashMap<MachineState, f64>,
}

impl MachineStateDurations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, state: MachineState, seconds: f64) {
        *self.by_state.entry(state).or_insert(0.0) += seconds;
    }

    pub fn seconds(&self, state: MachineState) -> f64 {
        self.by_state.get(&state).copied().unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.by_state.is_empty()
    }
}

impl FromIterator<(MachineState, f64)> for MachineStateDurations {
    fn from_iter<I: IntoIterator<Item = (MachineState, f64)>>(iter: I) -> Self {
        let mut durations = Self::new();
        for (state, seconds) in iter {
            durations.add(state, seconds);
        }
        durations
    }
}

// ==========================================
// ProductionCounts - cumulative counters in window
// ==========================================
// Counters are monotonic cumulative counts, so the window's
// production is the counter's MAX within the window, not a sum.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionCounts {
    pub total_parts: i64,
    pub reject_parts: i64,
}

// ==========================================
// Component results
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResult {
    pub machine_id: i64,
    pub shift_id: String,
    pub window: CalcWindow,
    /// Effective planned time, after subtracting planned-downtime
    /// and excluded-category seconds.
    pub planned_time_seconds: f64,
    pub actual_run_time_seconds: f64,
    pub downtime_seconds: f64,
    pub state_running_seconds: f64,
    pub state_stopped_seconds: f64,
    pub state_faulted_seconds: f64,
    pub state_idle_seconds: f64,
    pub state_changeover_seconds: f64,
    pub state_planned_downtime_seconds: f64,
    /// actual_run / planned, in [0, 1].
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceResult {
    pub machine_id: i64,
    pub shift_id: String,
    pub window: CalcWindow,
    pub total_parts: i64,
    pub ideal_cycle_time_seconds: f64,
    pub actual_run_time_seconds: f64,
    /// (ideal cycle time x parts) / actual run time, capped at 1.0.
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityResult {
    pub machine_id: i64,
    pub shift_id: String,
    pub window: CalcWindow,
    pub total_parts: i64,
    pub good_parts: i64,
    pub reject_parts: i64,
    /// good / total, in [0, 1].
    pub value: f64,
}

// ==========================================
// OeeScore - combined result
// ==========================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OeeScore {
    pub machine_id: i64,
    pub shift_id: String,
    pub window: CalcWindow,
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    /// availability x performance x quality. The product of three
    /// values already in [0, 1] needs no further clamping.
    pub value: f64,
}

impl OeeScore {
    pub fn combine(
        availability: &AvailabilityResult,
        performance: &PerformanceResult,
        quality: &QualityResult,
    ) -> Self {
        Self {
            machine_id: availability.machine_id,
            shift_id: availability.shift_id.clone(),
            window: availability.window,
            availability: availability.value,
            performance: performance.value,
            quality: quality.value,
            value: availability.value * performance.value * quality.value,
        }
    }
}

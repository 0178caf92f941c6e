// ==========================================
// OEE Calculation Service - per-machine tuning rows
// ==========================================
// Read-only from this subsystem's perspective; rows are
// owned and edited by the configuration API.
// ==========================================

use crate::domain::types::{AnalogOperator, TagType};
use serde::{Deserialize, Serialize};

/// Availability tuning for one machine.
///
/// `excluded_category_ids` are downtime categories configured as not
/// counting against availability (e.g. planned maintenance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineAvailabilityConfig {
    pub machine_id: i64,
    pub state_tag: Option<String>,
    pub excluded_category_ids: Vec<i64>,
    /// Override for the window's planned production time. None means
    /// the full window duration is planned.
    pub planned_production_time_seconds: Option<f64>,
}

/// Performance tuning for one machine. The machine-default row has
/// `product_id = NULL`; product-specific rows are not used by the
/// background calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachinePerformanceConfig {
    pub machine_id: i64,
    pub product_id: Option<i64>,
    pub ideal_cycle_time_seconds: f64,
    pub cycle_count_tag: Option<String>,
}

/// Quality tuning for one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineQualityConfig {
    pub machine_id: i64,
    pub product_id: Option<i64>,
    pub good_parts_tag: Option<String>,
    pub reject_parts_tag: Option<String>,
}

/// One downtime monitoring rule: watch the latest value of
/// `measurement_name`.`tag_field` for the machine and open/close
/// downtime events when the condition flips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeTagConfig {
    pub id: i64,
    pub machine_id: i64,
    pub measurement_name: String,
    pub tag_field: String,
    pub tag_type: TagType,
    /// Digital: the string value that signals downtime.
    pub digital_downtime_value: Option<String>,
    /// Analog: comparison against `analog_threshold`.
    pub analog_operator: Option<AnalogOperator>,
    pub analog_threshold: Option<f64>,
    pub downtime_category_id: Option<i64>,
    pub is_enabled: bool,
}

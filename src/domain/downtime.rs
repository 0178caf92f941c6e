// ==========================================
// OEE Calculation Service - downtime event entity
// ==========================================
// The tag monitor is the sole writer of tag-sourced events'
// end_time. Manually created events (source_tag_config_id NULL)
// are owned by the UI and never touched here.
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A time-bounded record of a machine's non-productive period.
///
/// Invariant: at most one open event (`end_time` None) exists per
/// `source_tag_config_id` at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeEvent {
    pub id: i64,
    pub machine_id: i64,
    pub start_time: DateTime<Utc>,
    /// None while the event is open.
    pub end_time: Option<DateTime<Utc>>,
    /// None for manually created events.
    pub source_tag_config_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl DowntimeEvent {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}

// ==========================================
// Performance: (ideal cycle time x total parts) / actual run time
// ==========================================

use crate::domain::metrics::{CalcWindow, PerformanceResult};

/// Calculate performance efficiency.
///
/// The result is capped at 1.0: part counters drawn from overlapping
/// or double-counted sources can exceed the theoretical maximum, and
/// the cap deliberately saturates that over-count rather than treating
/// it as an error. Zero actual run time or zero ideal cycle time
/// yields 0.
pub fn calculate_performance(
    machine_id: i64,
    shift_id: &str,
    window: CalcWindow,
    total_parts: i64,
    ideal_cycle_time_seconds: f64,
    actual_run_time_seconds: f64,
) -> PerformanceResult {
    let value = if actual_run_time_seconds > 0.0 && ideal_cycle_time_seconds > 0.0 {
        ((ideal_cycle_time_seconds * total_parts as f64) / actual_run_time_seconds).min(1.0)
    } else {
        0.0
    };

    PerformanceResult {
        machine_id,
        shift_id: shift_id.to_string(),
        window,
        total_parts,
        ideal_cycle_time_seconds,
        actual_run_time_seconds,
        value,
    }
}

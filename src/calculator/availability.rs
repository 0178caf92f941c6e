// ==========================================
// Availability: actual run time / planned production time
// ==========================================

use crate::domain::metrics::{AvailabilityResult, CalcWindow, MachineStateDurations};
use crate::domain::types::MachineState;

/// Calculate availability from machine state durations.
///
/// `planned_time_seconds` is the total planned production time for the
/// window. `excluded_state_seconds` is time in downtime categories
/// configured as not counting against availability (e.g. planned
/// maintenance). Missing states default to zero seconds; the result
/// value is in [0, 1].
pub fn calculate_availability(
    machine_id: i64,
    shift_id: &str,
    window: CalcWindow,
    state_durations: &MachineStateDurations,
    planned_time_seconds: f64,
    excluded_state_seconds: f64,
) -> AvailabilityResult {
    let running = state_durations.seconds(MachineState::Running);
    let stopped = state_durations.seconds(MachineState::Stopped);
    let faulted = state_durations.seconds(MachineState::Faulted);
    let idle = state_durations.seconds(MachineState::Idle);
    let changeover = state_durations.seconds(MachineState::Changeover);
    let planned_dt = state_durations.seconds(MachineState::PlannedDowntime);

    // Downtime = all non-running, non-excluded time
    let unplanned_downtime = stopped + faulted + idle + changeover;
    let total_downtime = unplanned_downtime - excluded_state_seconds;

    // Effective planned time excludes planned downtime and excluded categories
    let effective_planned =
        (planned_time_seconds - planned_dt - excluded_state_seconds).max(0.0);
    let actual_run = (effective_planned - total_downtime.max(0.0)).max(0.0);

    let value = if effective_planned > 0.0 {
        (actual_run / effective_planned).min(1.0)
    } else {
        0.0
    };

    AvailabilityResult {
        machine_id,
        shift_id: shift_id.to_string(),
        window,
        planned_time_seconds: effective_planned,
        actual_run_time_seconds: actual_run,
        downtime_seconds: total_downtime.max(0.0),
        state_running_seconds: running,
        state_stopped_seconds: stopped,
        state_faulted_seconds: faulted,
        state_idle_seconds: idle,
        state_changeover_seconds: changeover,
        state_planned_downtime_seconds: planned_dt,
        value,
    }
}

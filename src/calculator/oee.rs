// ==========================================
// OEE orchestrator - one machine, one window
// ==========================================
// Loads config, aggregates telemetry, runs the three
// component calculators in dependency order and writes
// four result records to the time-series sink.
//
// Failure semantics: a telemetry read failure degrades
// to zero observations (the calculation still runs); a
// write failure is logged and never propagated. Only a
// config-store failure aborts this machine's iteration.
// ==========================================

use crate::calculator::{calculate_availability, calculate_performance, calculate_quality};
use crate::domain::metrics::{CalcWindow, MachineStateDurations, OeeScore, ProductionCounts};
use crate::repository::{OeeConfigRepository, RepositoryResult};
use crate::telemetry::{Point, TelemetrySink, TelemetrySource};
use tracing::{debug, error, info, warn};

/// Default ideal cycle time when no performance config exists.
/// Effectively degenerate: one part per second of run time.
const DEFAULT_IDEAL_CYCLE_TIME_SECONDS: f64 = 1.0;

/// Round to the 4 decimals persisted for ratio fields.
fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Calculate and persist OEE components for one machine over a window.
pub async fn run_oee_for_machine(
    configs: &OeeConfigRepository,
    source: &dyn TelemetrySource,
    sink: &dyn TelemetrySink,
    machine_id: i64,
    window: CalcWindow,
) -> RepositoryResult<OeeScore> {
    let shift_id = window.shift_id();

    // -- 1. Configuration (absence is not an error; defaults apply) --
    let avail_cfg = configs.availability_config(machine_id)?;
    let perf_cfg = configs.performance_config(machine_id)?;
    let qual_cfg = configs.quality_config(machine_id)?;
    if qual_cfg.as_ref().and_then(|c| c.reject_parts_tag.as_ref()).is_none() {
        debug!(machine_id, "no reject tag configured; rejects come from production counters");
    }

    // -- 2. Telemetry aggregates (failures degrade to zero observations) --
    let state_durations = match source.state_durations(machine_id, window).await {
        Ok(durations) => durations,
        Err(e) if e.is_empty() => {
            debug!(machine_id, "no machine state data in window yet");
            MachineStateDurations::new()
        }
        Err(e) => {
            warn!(machine_id, error = %e, "state query failed, treating as zero observations");
            MachineStateDurations::new()
        }
    };
    let counts = match source.production_counts(machine_id, window).await {
        Ok(counts) => counts,
        Err(e) if e.is_empty() => {
            debug!(machine_id, "no production count data in window yet");
            ProductionCounts::default()
        }
        Err(e) => {
            warn!(machine_id, error = %e, "part count query failed, treating as zero counts");
            ProductionCounts::default()
        }
    };

    // -- 3. Planned time: config override, else the full window --
    let planned_time = avail_cfg
        .as_ref()
        .and_then(|cfg| cfg.planned_production_time_seconds)
        .filter(|seconds| *seconds > 0.0)
        .unwrap_or_else(|| window.duration_seconds());

    // -- 4. Components, Availability first (Performance depends on it) --
    let availability = calculate_availability(
        machine_id,
        &shift_id,
        window,
        &state_durations,
        planned_time,
        0.0,
    );

    let ideal_cycle_time = perf_cfg
        .as_ref()
        .map(|cfg| cfg.ideal_cycle_time_seconds)
        .unwrap_or(DEFAULT_IDEAL_CYCLE_TIME_SECONDS);
    let performance = calculate_performance(
        machine_id,
        &shift_id,
        window,
        counts.total_parts,
        ideal_cycle_time,
        availability.actual_run_time_seconds,
    );

    let quality = calculate_quality(
        machine_id,
        &shift_id,
        window,
        counts.total_parts,
        counts.reject_parts,
    );

    let score = OeeScore::combine(&availability, &performance, &quality);

    // -- 5. Persist four records, tagged machine + shift, at window end --
    let machine_tag = machine_id.to_string();
    let oee_point = Point::new("oee_metrics")
        .tag("machine_id", &machine_tag)
        .tag("shift_id", &shift_id)
        .field_f64("availability", round4(availability.value))
        .field_f64("performance", round4(performance.value))
        .field_f64("quality", round4(quality.value))
        .field_f64("oee", round4(score.value))
        .field_i64("planned_time_seconds", availability.planned_time_seconds as i64)
        .field_i64("actual_run_time_seconds", availability.actual_run_time_seconds as i64)
        .field_i64("downtime_seconds", availability.downtime_seconds as i64)
        .field_i64("total_parts", counts.total_parts)
        .field_i64("good_parts", quality.good_parts)
        .field_i64("reject_parts", counts.reject_parts)
        .timestamp(window.end);

    let avail_point = Point::new("availability_metrics")
        .tag("machine_id", &machine_tag)
        .tag("shift_id", &shift_id)
        .field_f64("value", round4(availability.value))
        .field_i64("planned_time_seconds", availability.planned_time_seconds as i64)
        .field_i64("actual_run_time_seconds", availability.actual_run_time_seconds as i64)
        .field_i64("downtime_seconds", availability.downtime_seconds as i64)
        .field_i64("state_running_seconds", availability.state_running_seconds as i64)
        .field_i64("state_stopped_seconds", availability.state_stopped_seconds as i64)
        .field_i64("state_faulted_seconds", availability.state_faulted_seconds as i64)
        .field_i64("state_idle_seconds", availability.state_idle_seconds as i64)
        .field_i64("state_changeover_seconds", availability.state_changeover_seconds as i64)
        .field_i64(
            "state_planned_downtime_seconds",
            availability.state_planned_downtime_seconds as i64,
        )
        .timestamp(window.end);

    let perf_point = Point::new("performance_metrics")
        .tag("machine_id", &machine_tag)
        .tag("shift_id", &shift_id)
        .field_f64("value", round4(performance.value))
        .field_i64("total_parts", counts.total_parts)
        .field_f64("ideal_cycle_time", ideal_cycle_time)
        .field_i64("actual_run_time_seconds", availability.actual_run_time_seconds as i64)
        .timestamp(window.end);

    let qual_point = Point::new("quality_metrics")
        .tag("machine_id", &machine_tag)
        .tag("shift_id", &shift_id)
        .field_f64("value", round4(quality.value))
        .field_i64("total_parts", counts.total_parts)
        .field_i64("good_parts", quality.good_parts)
        .field_i64("reject_parts", counts.reject_parts)
        .timestamp(window.end);

    match sink
        .write(vec![oee_point, avail_point, perf_point, qual_point])
        .await
    {
        Ok(()) => {
            info!(
                machine_id,
                shift_id = %shift_id,
                oee = round4(score.value),
                availability = round4(availability.value),
                performance = round4(performance.value),
                quality = round4(quality.value),
                "OEE written"
            );
        }
        Err(e) => {
            // No retry; the next tick's write supersedes this one
            error!(machine_id, error = %e, "failed to write OEE metrics");
        }
    }

    Ok(score)
}

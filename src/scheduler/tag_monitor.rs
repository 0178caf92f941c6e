// ==========================================
// Tag monitor job
// ==========================================
// Polls the latest value of each enabled monitoring
// tag and opens/closes downtime events as the condition
// flips. Two states per config: no open event / event
// open. Re-running a poll with an unchanged condition
// performs no writes.
// ==========================================

use crate::domain::oee_config::DowntimeTagConfig;
use crate::domain::types::TagType;
use crate::repository::DowntimeRepository;
use crate::scheduler::ticker::ScheduledJob;
use crate::telemetry::TelemetrySource;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info};

// ==========================================
// Condition evaluation
// ==========================================

/// Render a tag value the way the digital comparison expects:
/// bare strings stay as-is, numbers/booleans use their display form.
fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Numeric view of a tag value; numeric strings parse, everything
/// else is None.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// True when the tag value indicates a downtime condition.
///
/// Digital: string equality with the configured downtime value.
/// Analog: configured operator against the threshold; a non-numeric
/// value never matches. Incomplete configs evaluate to false.
pub fn evaluate_condition(value: &Value, config: &DowntimeTagConfig) -> bool {
    match config.tag_type {
        TagType::Digital => match &config.digital_downtime_value {
            Some(expected) => value_as_string(value) == *expected,
            None => false,
        },
        TagType::Analog => {
            let (Some(operator), Some(threshold)) =
                (config.analog_operator, config.analog_threshold)
            else {
                return false;
            };
            match value_as_f64(value) {
                Some(numeric) => operator.evaluate(numeric, threshold),
                None => false,
            }
        }
    }
}

// ==========================================
// TagMonitorJob
// ==========================================

pub struct TagMonitorJob {
    downtime: DowntimeRepository,
    source: Arc<dyn TelemetrySource>,
}

impl TagMonitorJob {
    pub fn new(downtime: DowntimeRepository, source: Arc<dyn TelemetrySource>) -> Self {
        Self { downtime, source }
    }

    /// One poll cycle over all enabled configs. A failing config is
    /// logged and skipped; it cannot block the others.
    pub async fn poll_once(&self) {
        let configs = match self.downtime.list_enabled_tag_configs() {
            Ok(configs) => configs,
            Err(e) => {
                error!(error = %e, "tag monitor: failed to fetch configs");
                return;
            }
        };

        for config in configs {
            let sample = match self
                .source
                .latest_field_value(config.machine_id, &config.measurement_name, &config.tag_field)
                .await
            {
                Ok(Some(sample)) => sample,
                Ok(None) => {
                    // No data for this tag yet: not an error, not a transition
                    debug!(config_id = config.id, machine_id = config.machine_id,
                           "tag monitor: no data for config");
                    continue;
                }
                Err(e) => {
                    debug!(config_id = config.id, machine_id = config.machine_id, error = %e,
                           "tag monitor: tag query failed");
                    continue;
                }
            };

            let is_down = evaluate_condition(&sample.value, &config);
            let now = Utc::now();

            if is_down {
                match self.downtime.open_event(config.machine_id, config.id, now) {
                    Ok(Some(event_id)) => {
                        info!(config_id = config.id, machine_id = config.machine_id, event_id,
                              "tag monitor: opened downtime event");
                    }
                    Ok(None) => {} // already open, no write
                    Err(e) => {
                        error!(config_id = config.id, error = %e,
                               "tag monitor: DB error opening event");
                    }
                }
            } else {
                match self.downtime.close_open_event(config.id, now) {
                    Ok(Some(event_id)) => {
                        info!(config_id = config.id, event_id,
                              "tag monitor: closed downtime event");
                    }
                    Ok(None) => {} // nothing open, no write
                    Err(e) => {
                        error!(config_id = config.id, error = %e,
                               "tag monitor: DB error closing event");
                    }
                }
            }
        }
    }
}

#[async_trait]
impl ScheduledJob for TagMonitorJob {
    fn name(&self) -> &'static str {
        "tag_monitor"
    }

    async fn run(&self) {
        self.poll_once().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::AnalogOperator;
    use serde_json::json;

    fn digital_config(expected: &str) -> DowntimeTagConfig {
        DowntimeTagConfig {
            id: 1,
            machine_id: 1,
            measurement_name: "machine_state".to_string(),
            tag_field: "state".to_string(),
            tag_type: TagType::Digital,
            digital_downtime_value: Some(expected.to_string()),
            analog_operator: None,
            analog_threshold: None,
            downtime_category_id: None,
            is_enabled: true,
        }
    }

    fn analog_config(operator: AnalogOperator, threshold: f64) -> DowntimeTagConfig {
        DowntimeTagConfig {
            id: 2,
            machine_id: 1,
            measurement_name: "spindle".to_string(),
            tag_field: "temperature".to_string(),
            tag_type: TagType::Analog,
            digital_downtime_value: None,
            analog_operator: Some(operator),
            analog_threshold: Some(threshold),
            downtime_category_id: None,
            is_enabled: true,
        }
    }

    #[test]
    fn test_digital_condition() {
        let config = digital_config("faulted");
        assert!(evaluate_condition(&json!("faulted"), &config));
        assert!(!evaluate_condition(&json!("running"), &config));
    }

    #[test]
    fn test_digital_numeric_value_uses_display_form() {
        let config = digital_config("1");
        assert!(evaluate_condition(&json!(1), &config));
        assert!(!evaluate_condition(&json!(0), &config));
    }

    #[test]
    fn test_analog_condition() {
        assert!(evaluate_condition(
            &json!(72.5),
            &analog_config(AnalogOperator::Gt, 70.0)
        ));
        assert!(!evaluate_condition(
            &json!(72.5),
            &analog_config(AnalogOperator::Lt, 70.0)
        ));
    }

    #[test]
    fn test_analog_numeric_string_parses() {
        assert!(evaluate_condition(
            &json!("72.5"),
            &analog_config(AnalogOperator::Gt, 70.0)
        ));
    }

    #[test]
    fn test_analog_non_numeric_is_false() {
        assert!(!evaluate_condition(
            &json!("not-a-number"),
            &analog_config(AnalogOperator::Gt, 70.0)
        ));
        assert!(!evaluate_condition(
            &json!(null),
            &analog_config(AnalogOperator::Gt, 70.0)
        ));
    }

    #[test]
    fn test_incomplete_analog_config_is_false() {
        let mut config = analog_config(AnalogOperator::Gt, 70.0);
        config.analog_threshold = None;
        assert!(!evaluate_condition(&json!(99.0), &config));
    }
}

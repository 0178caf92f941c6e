// ==========================================
// OEE Calculation Service - line protocol points
// ==========================================
// Minimal builder for InfluxDB line protocol writes.
// Only the field types the service emits (f64 ratios,
// i64 counters). Escaping rules per the line protocol
// reference: measurement escapes ',' and ' '; tag
// keys/values and field keys additionally escape '='.
// ==========================================

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
}

#[derive(Debug, Clone)]
pub struct Point {
    measurement: String,
    tags: Vec<(String, String)>,
    fields: Vec<(String, FieldValue)>,
    timestamp: Option<DateTime<Utc>>,
}

impl Point {
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    pub fn field_f64(mut self, key: impl Into<String>, value: f64) -> Self {
        self.fields.push((key.into(), FieldValue::Float(value)));
        self
    }

    pub fn field_i64(mut self, key: impl Into<String>, value: i64) -> Self {
        self.fields.push((key.into(), FieldValue::Integer(value)));
        self
    }

    pub fn timestamp(mut self, time: DateTime<Utc>) -> Self {
        self.timestamp = Some(time);
        self
    }

    /// Render as one line of line protocol (nanosecond precision).
    pub fn to_line_protocol(&self) -> String {
        let mut line = escape_measurement(&self.measurement);

        for (key, value) in &self.tags {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');
        let fields: Vec<String> = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}={}", escape_key(key), render_field(value)))
            .collect();
        line.push_str(&fields.join(","));

        if let Some(ts) = self.timestamp {
            line.push(' ');
            line.push_str(&ts.timestamp_nanos_opt().unwrap_or(0).to_string());
        }
        line
    }
}

fn escape_measurement(s: &str) -> String {
    s.replace(',', "\\,").replace(' ', "\\ ")
}

fn escape_key(s: &str) -> String {
    s.replace(',', "\\,").replace('=', "\\=").replace(' ', "\\ ")
}

fn render_field(value: &FieldValue) -> String {
    match value {
        FieldValue::Float(v) => format!("{v}"),
        FieldValue::Integer(v) => format!("{v}i"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_line_protocol_rendering() {
        let time = Utc.with_ymd_and_hms(2026, 8, 30, 12, 0, 0).unwrap();
        let point = Point::new("oee_metrics")
            .tag("machine_id", "3")
            .tag("shift_id", "202608301155")
            .field_f64("oee", 0.7083)
            .field_i64("total_parts", 90)
            .timestamp(time);

        let line = point.to_line_protocol();
        assert!(line.starts_with("oee_metrics,machine_id=3,shift_id=202608301155 "));
        assert!(line.contains("oee=0.7083"));
        assert!(line.contains("total_parts=90i"));
        assert!(line.ends_with(&time.timestamp_nanos_opt().unwrap().to_string()));
    }

    #[test]
    fn test_escaping() {
        let point = Point::new("my measurement")
            .tag("ta g", "va,lue")
            .field_f64("run=ratio", 0.5);
        assert_eq!(
            point.to_line_protocol(),
            "my\\ measurement,ta\\ g=va\\,lue run\\=ratio=0.5"
        );
    }
}

// ==========================================
// OEE Calculation Service - InfluxDB 3 client
// ==========================================
// SQL queries via /api/v3/query_sql, writes via
// /api/v3/write_lp. Raw JSON rows are mapped to typed
// structs immediately after the query so downstream
// code never touches untyped maps.
// ==========================================

use crate::domain::metrics::{CalcWindow, MachineStateDurations, ProductionCounts};
use crate::domain::types::MachineState;
use crate::telemetry::point::Point;
use crate::telemetry::{TagSample, TelemetryError, TelemetrySink, TelemetrySource};
use async_trait::async_trait;
use chrono::SecondsFormat;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Request timeout for both query and write calls.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub struct InfluxClient {
    http: reqwest::Client,
    base_url: String,
    database: String,
    token: Option<String>,
}

impl InfluxClient {
    pub fn new(
        base_url: impl Into<String>,
        database: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, TelemetryError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            database: database.into(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// True when the error body indicates the store simply has no such
    /// table/data yet (first run, before collectors have written).
    ///
    /// Compatibility note: these phrases are store-version-dependent;
    /// InfluxDB 3 currently reports missing tables through them. A
    /// structured error code would be preferable if the store exposed one.
    fn is_not_yet_populated(status: reqwest::StatusCode, body: &str) -> bool {
        if status == reqwest::StatusCode::NOT_FOUND {
            return true;
        }
        let lowered = body.to_ascii_lowercase();
        lowered.contains("not found") || lowered.contains("does not exist")
    }

    /// Run a SQL query, returning JSON rows (array of objects).
    async fn query_sql(&self, sql: &str) -> Result<Vec<Value>, TelemetryError> {
        let url = format!("{}/api/v3/query_sql", self.base_url);
        let req = self.http.post(&url).json(&json!({
            "db": self.database,
            "q": sql,
            "format": "json",
        }));
        let resp = self.authorize(req).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if Self::is_not_yet_populated(status, &body) {
                return Err(TelemetryError::Empty(body));
            }
            return Err(TelemetryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let rows: Value = resp
            .json()
            .await
            .map_err(|e| TelemetryError::Decode(e.to_string()))?;
        match rows {
            Value::Array(rows) => Ok(rows),
            other => Err(TelemetryError::Decode(format!(
                "expected JSON array of rows, got {other}"
            ))),
        }
    }

    async fn write_lp(&self, body: String) -> Result<(), TelemetryError> {
        let url = format!(
            "{}/api/v3/write_lp?db={}&precision=nanosecond",
            self.base_url, self.database
        );
        let resp = self.authorize(self.http.post(&url).body(body)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TelemetryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Identifiers interpolated into SQL come from config rows, not user
/// input; stripping quotes keeps a malformed row from breaking the query.
fn sanitize_identifier(s: &str) -> String {
    s.replace(['"', '\''], "")
}

#[async_trait]
impl TelemetrySource for InfluxClient {
    async fn state_durations(
        &self,
        machine_id: i64,
        window: CalcWindow,
    ) -> Result<MachineStateDurations, TelemetryError> {
        let sql = format!(
            "SELECT state, SUM(duration_seconds) AS total_duration \
             FROM machine_state \
             WHERE machine_id = '{machine_id}' \
               AND time >= '{}' AND time < '{}' \
             GROUP BY state",
            window.start.to_rfc3339_opts(SecondsFormat::Micros, true),
            window.end.to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        let rows = self.query_sql(&sql).await?;

        let mut durations = MachineStateDurations::new();
        for row in &rows {
            let Some(name) = row.get("state").and_then(Value::as_str) else {
                continue;
            };
            let Some(seconds) = row.get("total_duration").and_then(Value::as_f64) else {
                continue;
            };
            match MachineState::parse(name) {
                Some(state) => durations.add(state, seconds),
                None => debug!(machine_id, state = name, "ignoring unknown machine state"),
            }
        }
        Ok(durations)
    }

    async fn production_counts(
        &self,
        machine_id: i64,
        window: CalcWindow,
    ) -> Result<ProductionCounts, TelemetryError> {
        // Counters are cumulative, so MAX within the window is the window's
        // production. A counter reset mid-window (device reboot) under-counts
        // that one window and self-heals on the next.
        let sql = format!(
            "SELECT MAX(total_count) AS max_count, MAX(reject_count) AS max_reject \
             FROM production_count \
             WHERE machine_id = '{machine_id}' \
               AND time >= '{}' AND time < '{}'",
            window.start.to_rfc3339_opts(SecondsFormat::Micros, true),
            window.end.to_rfc3339_opts(SecondsFormat::Micros, true),
        );
        let rows = self.query_sql(&sql).await?;

        let row = rows.first();
        let read = |key: &str| -> i64 {
            row.and_then(|r| r.get(key))
                .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
                .unwrap_or(0)
        };
        Ok(ProductionCounts {
            total_parts: read("max_count"),
            reject_parts: read("max_reject"),
        })
    }

    async fn latest_field_value(
        &self,
        machine_id: i64,
        measurement: &str,
        field: &str,
    ) -> Result<Option<TagSample>, TelemetryError> {
        let field = sanitize_identifier(field);
        let measurement = sanitize_identifier(measurement);
        let sql = format!(
            "SELECT \"{field}\", time FROM \"{measurement}\" \
             WHERE \"machine_id\" = '{machine_id}' \
             ORDER BY time DESC \
             LIMIT 1",
        );
        let rows = match self.query_sql(&sql).await {
            Ok(rows) => rows,
            // A measurement that does not exist yet is just "no data"
            Err(e) if e.is_empty() => return Ok(None),
            Err(e) => return Err(e),
        };

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let Some(value) = row.get(&field) else {
            return Ok(None);
        };
        let time = row
            .get("time")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok());
        Ok(Some(TagSample {
            value: value.clone(),
            time,
        }))
    }
}

#[async_trait]
impl TelemetrySink for InfluxClient {
    async fn write(&self, points: Vec<Point>) -> Result<(), TelemetryError> {
        if points.is_empty() {
            return Ok(());
        }
        let body = points
            .iter()
            .map(Point::to_line_protocol)
            .collect::<Vec<_>>()
            .join("\n");
        self.write_lp(body).await
    }
}

// ==========================================
// Tag monitor integration tests
// ==========================================
// Goal: verify the open/close state machine against a
// real SQLite store and a scripted latest-value source,
// including idempotence (unchanged condition -> no writes).
// ==========================================

use async_trait::async_trait;
use oee_service::domain::metrics::{CalcWindow, MachineStateDurations, ProductionCounts};
use oee_service::repository::DowntimeRepository;
use oee_service::telemetry::{TagSample, TelemetryError, TelemetrySource};
use oee_service::{MachineRepository, TagMonitorJob};
use rusqlite::{params, Connection};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

// ==========================================
// Test helpers
// ==========================================

/// Source whose latest tag value can be swapped between polls.
struct LatestValueSource {
    value: Mutex<Option<Value>>,
}

impl LatestValueSource {
    fn new(value: Option<Value>) -> Arc<Self> {
        Arc::new(Self {
            value: Mutex::new(value),
        })
    }

    fn set(&self, value: Option<Value>) {
        *self.value.lock().unwrap() = value;
    }
}

#[async_trait]
impl TelemetrySource for LatestValueSource {
    async fn state_durations(
        &self,
        _machine_id: i64,
        _window: CalcWindow,
    ) -> Result<MachineStateDurations, TelemetryError> {
        Ok(MachineStateDurations::new())
    }

    async fn production_counts(
        &self,
        _machine_id: i64,
        _window: CalcWindow,
    ) -> Result<ProductionCounts, TelemetryError> {
        Ok(ProductionCounts::default())
    }

    async fn latest_field_value(
        &self,
        _machine_id: i64,
        _measurement: &str,
        _field: &str,
    ) -> Result<Option<TagSample>, TelemetryError> {
        Ok(self
            .value
            .lock()
            .unwrap()
            .clone()
            .map(|value| TagSample { value, time: None }))
    }
}

struct Fixture {
    _dir: TempDir,
    db_path: String,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let db_path = dir.path().join("config.db").to_str().unwrap().to_string();
        // Ensure the machines table exists before seeding rows with
        // foreign keys into it
        let _ = MachineRepository::new(&db_path).unwrap();
        Self { _dir: dir, db_path }
    }

    fn repo(&self) -> DowntimeRepository {
        DowntimeRepository::new(&self.db_path).unwrap()
    }

    fn seed_digital_config(&self, config_id: i64, machine_id: i64, downtime_value: &str) {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO machines (id, name) VALUES (?1, 'm')",
            params![machine_id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO downtime_tag_configs
               (id, machine_id, measurement_name, tag_field, tag_type,
                digital_downtime_value, is_enabled)
             VALUES (?1, ?2, 'machine_state', 'state', 'digital', ?3, 1)",
            params![config_id, machine_id, downtime_value],
        )
        .unwrap();
    }

    fn seed_analog_config(&self, config_id: i64, machine_id: i64, operator: &str, threshold: f64) {
        let conn = Connection::open(&self.db_path).unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO machines (id, name) VALUES (?1, 'm')",
            params![machine_id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO downtime_tag_configs
               (id, machine_id, measurement_name, tag_field, tag_type,
                analog_operator, analog_threshold, is_enabled)
             VALUES (?1, ?2, 'spindle', 'temperature', 'analog', ?3, ?4, 1)",
            params![config_id, machine_id, operator, threshold],
        )
        .unwrap();
    }

    fn event_counts(&self, config_id: i64) -> (i64, i64) {
        let conn = Connection::open(&self.db_path).unwrap();
        let open: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM downtime_events
                 WHERE source_tag_config_id = ?1 AND end_time IS NULL",
                params![config_id],
                |row| row.get(0),
            )
            .unwrap();
        let total: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM downtime_events WHERE source_tag_config_id = ?1",
                params![config_id],
                |row| row.get(0),
            )
            .unwrap();
        (open, total)
    }
}

// ==========================================
// Test 1: open on condition, idempotent on repeat
// ==========================================

#[tokio::test]
async fn test_open_is_idempotent() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    fixture.seed_digital_config(1, 10, "faulted");

    let source = LatestValueSource::new(Some(json!("faulted")));
    let job = TagMonitorJob::new(repo, source.clone());

    job.poll_once().await;
    assert_eq!(fixture.event_counts(1), (1, 1));

    // Same satisfying value again: zero additional events
    job.poll_once().await;
    assert_eq!(fixture.event_counts(1), (1, 1));
}

// ==========================================
// Test 2: close on condition clearing, then no-op
// ==========================================

#[tokio::test]
async fn test_close_then_noop() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    fixture.seed_digital_config(1, 10, "faulted");

    let source = LatestValueSource::new(Some(json!("faulted")));
    let job = TagMonitorJob::new(repo, source.clone());

    job.poll_once().await;
    assert_eq!(fixture.event_counts(1), (1, 1));

    source.set(Some(json!("running")));
    job.poll_once().await;
    // Exactly one event, now closed
    assert_eq!(fixture.event_counts(1), (0, 1));

    // Condition still false: zero writes
    job.poll_once().await;
    assert_eq!(fixture.event_counts(1), (0, 1));
}

// ==========================================
// Test 3: reopening after a closed event
// ==========================================

#[tokio::test]
async fn test_reopen_creates_second_event() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    fixture.seed_digital_config(1, 10, "faulted");

    let source = LatestValueSource::new(Some(json!("faulted")));
    let job = TagMonitorJob::new(repo, source.clone());

    job.poll_once().await;
    source.set(Some(json!("running")));
    job.poll_once().await;
    source.set(Some(json!("faulted")));
    job.poll_once().await;

    // At most one open at any time, two events overall
    assert_eq!(fixture.event_counts(1), (1, 2));
}

// ==========================================
// Test 4: no data -> skip, no transition
// ==========================================

#[tokio::test]
async fn test_no_data_skips_config() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    fixture.seed_digital_config(1, 10, "faulted");

    let source = LatestValueSource::new(None);
    let job = TagMonitorJob::new(repo, source);

    job.poll_once().await;
    assert_eq!(fixture.event_counts(1), (0, 0));
}

// ==========================================
// Test 5: analog threshold opens and closes
// ==========================================

#[tokio::test]
async fn test_analog_threshold_cycle() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    fixture.seed_analog_config(2, 10, ">", 70.0);

    let source = LatestValueSource::new(Some(json!(72.5)));
    let job = TagMonitorJob::new(repo, source.clone());

    job.poll_once().await;
    assert_eq!(fixture.event_counts(2), (1, 1));

    source.set(Some(json!(65.0)));
    job.poll_once().await;
    assert_eq!(fixture.event_counts(2), (0, 1));

    // Non-numeric value: condition false, nothing reopens
    source.set(Some(json!("sensor-error")));
    job.poll_once().await;
    assert_eq!(fixture.event_counts(2), (0, 1));
}

// ==========================================
// Test 6: a malformed config must not block the rest
// ==========================================

#[tokio::test]
async fn test_malformed_config_does_not_block_others() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    {
        let conn = Connection::open(&fixture.db_path).unwrap();
        conn.execute("INSERT OR IGNORE INTO machines (id, name) VALUES (10, 'm')", [])
            .unwrap();
        conn.execute(
            "INSERT INTO downtime_tag_configs
               (id, machine_id, measurement_name, tag_field, tag_type, is_enabled)
             VALUES (1, 10, 'machine_state', 'state', 'ternary', 1)",
            [],
        )
        .unwrap();
    }
    fixture.seed_digital_config(2, 10, "faulted");

    let source = LatestValueSource::new(Some(json!("faulted")));
    let job = TagMonitorJob::new(repo, source);

    job.poll_once().await;
    // The unparsable row opens nothing; the valid one still transitions
    assert_eq!(fixture.event_counts(1), (0, 0));
    assert_eq!(fixture.event_counts(2), (1, 1));
}

// ==========================================
// Test 7: disabled configs are ignored
// ==========================================

#[tokio::test]
async fn test_disabled_config_ignored() {
    let fixture = Fixture::new();
    let repo = fixture.repo();
    fixture.seed_digital_config(1, 10, "faulted");
    {
        let conn = Connection::open(&fixture.db_path).unwrap();
        conn.execute("UPDATE downtime_tag_configs SET is_enabled = 0 WHERE id = 1", [])
            .unwrap();
    }

    let source = LatestValueSource::new(Some(json!("faulted")));
    let job = TagMonitorJob::new(repo, source);

    job.poll_once().await;
    assert_eq!(fixture.event_counts(1), (0, 0));
}

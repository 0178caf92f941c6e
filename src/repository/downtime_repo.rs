// ==========================================
// OEE Calculation Service - downtime repository
// ==========================================
// Responsibility: tag monitoring rules and downtime
// events. The open/close operations enforce the
// invariant of at most one open event per source
// tag config, inside a transaction.
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::downtime::DowntimeEvent;
use crate::domain::oee_config::DowntimeTagConfig;
use crate::domain::types::{AnalogOperator, TagType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};
use tracing::error;

pub struct DowntimeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DowntimeRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        let repo = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        repo.ensure_tables()?;
        Ok(repo)
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        let repo = Self { conn };
        repo.ensure_tables()?;
        Ok(repo)
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn ensure_tables(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS downtime_tag_configs (
              id INTEGER PRIMARY KEY,
              machine_id INTEGER NOT NULL,
              measurement_name TEXT NOT NULL,
              tag_field TEXT NOT NULL,
              tag_type TEXT NOT NULL DEFAULT 'digital',
              digital_downtime_value TEXT,
              analog_operator TEXT,
              analog_threshold REAL,
              downtime_category_id INTEGER,
              is_enabled INTEGER NOT NULL DEFAULT 1,
              FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS downtime_events (
              id INTEGER PRIMARY KEY,
              machine_id INTEGER NOT NULL,
              start_time TEXT NOT NULL,
              end_time TEXT,
              source_tag_config_id INTEGER,
              created_at TEXT NOT NULL,
              FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE,
              FOREIGN KEY (source_tag_config_id)
                REFERENCES downtime_tag_configs(id) ON DELETE SET NULL
            );

            CREATE INDEX IF NOT EXISTS idx_downtime_events_source_open
              ON downtime_events(source_tag_config_id, end_time);
            CREATE INDEX IF NOT EXISTS idx_downtime_events_machine
              ON downtime_events(machine_id, start_time DESC);
            "#,
        )?;
        Ok(())
    }

    fn map_tag_config(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<DowntimeTagConfig>> {
        let id: i64 = row.get("id")?;
        let tag_type_raw: String = row.get("tag_type")?;
        let operator_raw: Option<String> = row.get("analog_operator")?;

        let Some(tag_type) = TagType::parse(&tag_type_raw) else {
            return Ok(Err(RepositoryError::FieldValueError {
                field: "tag_type".to_string(),
                message: format!("config {id}: unknown tag type '{tag_type_raw}'"),
            }));
        };
        let analog_operator = match operator_raw {
            Some(raw) => match AnalogOperator::parse(&raw) {
                Some(op) => Some(op),
                None => {
                    return Ok(Err(RepositoryError::FieldValueError {
                        field: "analog_operator".to_string(),
                        message: format!("config {id}: unknown operator '{raw}'"),
                    }))
                }
            },
            None => None,
        };

        Ok(Ok(DowntimeTagConfig {
            id,
            machine_id: row.get("machine_id")?,
            measurement_name: row.get("measurement_name")?,
            tag_field: row.get("tag_field")?,
            tag_type,
            digital_downtime_value: row.get("digital_downtime_value")?,
            analog_operator,
            analog_threshold: row.get("analog_threshold")?,
            downtime_category_id: row.get("downtime_category_id")?,
            is_enabled: row.get::<_, i64>("is_enabled")? != 0,
        }))
    }

    /// All enabled monitoring rules, ordered by id.
    ///
    /// A malformed row (unknown tag type or operator) is logged and
    /// skipped so it cannot block the remaining configs from being
    /// monitored.
    pub fn list_enabled_tag_configs(&self) -> RepositoryResult<Vec<DowntimeTagConfig>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, machine_id, measurement_name, tag_field, tag_type,
                   digital_downtime_value, analog_operator, analog_threshold,
                   downtime_category_id, is_enabled
            FROM downtime_tag_configs
            WHERE is_enabled = 1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], Self::map_tag_config)?;

        let mut configs = Vec::new();
        for row in rows {
            match row? {
                Ok(config) => configs.push(config),
                Err(e) => {
                    error!(error = %e, "skipping malformed downtime tag config");
                }
            }
        }
        Ok(configs)
    }

    fn map_event(row: &Row<'_>) -> rusqlite::Result<DowntimeEvent> {
        Ok(DowntimeEvent {
            id: row.get("id")?,
            machine_id: row.get("machine_id")?,
            start_time: row.get("start_time")?,
            end_time: row.get("end_time")?,
            source_tag_config_id: row.get("source_tag_config_id")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Most recent open event for a tag config, if any.
    pub fn find_open_event(&self, tag_config_id: i64) -> RepositoryResult<Option<DowntimeEvent>> {
        let conn = self.get_conn()?;
        let event = conn
            .query_row(
                r#"
                SELECT id, machine_id, start_time, end_time, source_tag_config_id, created_at
                FROM downtime_events
                WHERE source_tag_config_id = ?1 AND end_time IS NULL
                ORDER BY start_time DESC
                LIMIT 1
                "#,
                params![tag_config_id],
                Self::map_event,
            )
            .optional()?;
        Ok(event)
    }

    /// Open a downtime event for a tag config unless one is already open.
    ///
    /// Returns the new event id, or None when an open event already
    /// existed (no write performed). The existence check and the insert
    /// run in one transaction.
    pub fn open_event(
        &self,
        machine_id: i64,
        tag_config_id: i64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<i64>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let existing: Option<i64> = tx
            .query_row(
                r#"
                SELECT id FROM downtime_events
                WHERE source_tag_config_id = ?1 AND end_time IS NULL
                ORDER BY start_time DESC
                LIMIT 1
                "#,
                params![tag_config_id],
                |row| row.get(0),
            )
            .optional()?;
        if existing.is_some() {
            // Idempotent: unchanged condition produces no writes
            return Ok(None);
        }

        tx.execute(
            r#"
            INSERT INTO downtime_events
              (machine_id, start_time, end_time, source_tag_config_id, created_at)
            VALUES (?1, ?2, NULL, ?3, ?4)
            "#,
            params![machine_id, now, tag_config_id, now],
        )?;
        let event_id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(Some(event_id))
    }

    /// Close the open event for a tag config, if one exists.
    ///
    /// Returns the closed event id, or None when nothing was open.
    pub fn close_open_event(
        &self,
        tag_config_id: i64,
        now: DateTime<Utc>,
    ) -> RepositoryResult<Option<i64>> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let open_id: Option<i64> = tx
            .query_row(
                r#"
                SELECT id FROM downtime_events
                WHERE source_tag_config_id = ?1 AND end_time IS NULL
                ORDER BY start_time DESC
                LIMIT 1
                "#,
                params![tag_config_id],
                |row| row.get(0),
            )
            .optional()?;

        let Some(event_id) = open_id else {
            return Ok(None);
        };

        tx.execute(
            "UPDATE downtime_events SET end_time = ?1 WHERE id = ?2",
            params![now, event_id],
        )?;
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(Some(event_id))
    }
}

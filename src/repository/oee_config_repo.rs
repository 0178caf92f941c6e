// ==========================================
// OEE Calculation Service - machine OEE config repository
// ==========================================
// Responsibility: read per-machine availability /
// performance / quality tuning rows. Read-only from
// this subsystem; rows are maintained by the
// configuration API.
// ==========================================

use crate::db::{configure_sqlite_connection, open_sqlite_connection};
use crate::domain::oee_config::{
    MachineAvailabilityConfig, MachinePerformanceConfig, MachineQualityConfig,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

pub struct OeeConfigRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OeeConfigRepository {
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
            CREATE TABLE IF NOT EXISTS machine_availability_configs (
              id INTEGER PRIMARY KEY,
              machine_id INTEGER NOT NULL UNIQUE,
              state_tag TEXT,
              excluded_category_ids TEXT NOT NULL DEFAULT '[]',
              planned_production_time_seconds REAL,
              FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS machine_performance_configs (
              id INTEGER PRIMARY KEY,
              machine_id INTEGER NOT NULL,
              product_id INTEGER,
              ideal_cycle_time_seconds REAL NOT NULL,
              cycle_count_tag TEXT,
              FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE,
              UNIQUE(machine_id, product_id)
            );

            CREATE TABLE IF NOT EXISTS machine_quality_configs (
              id INTEGER PRIMARY KEY,
              machine_id INTEGER NOT NULL,
              product_id INTEGER,
              good_parts_tag TEXT,
              reject_parts_tag TEXT,
              FOREIGN KEY (machine_id) REFERENCES machines(id) ON DELETE CASCADE,
              UNIQUE(machine_id, product_id)
            );

            CREATE INDEX IF NOT EXISTS idx_avail_cfg_machine
              ON machine_availability_configs(machine_id);
            CREATE INDEX IF NOT EXISTS idx_perf_cfg_machine
              ON machine_performance_configs(machine_id);
            CREATE INDEX IF NOT EXISTS idx_qual_cfg_machine
              ON machine_quality_configs(machine_id);
            "#,
        )?;
        Ok(())
    }

    fn map_availability(row: &Row<'_>) -> rusqlite::Result<(i64, Option<String>, String, Option<f64>)> {
        Ok((
            row.get("machine_id")?,
            row.get("state_tag")?,
            row.get("excluded_category_ids")?,
            row.get("planned_production_time_seconds")?,
        ))
    }

    /// Availability config for a machine. None when not configured.
    pub fn availability_config(
        &self,
        machine_id: i64,
    ) -> RepositoryResult<Option<MachineAvailabilityConfig>> {
        let conn = self.get_conn()?;
        let raw = conn
            .query_row(
                r#"
                SELECT machine_id, state_tag, excluded_category_ids,
                       planned_production_time_seconds
                FROM machine_availability_configs
                WHERE machine_id = ?1
                "#,
                params![machine_id],
                Self::map_availability,
            )
            .optional()?;

        let Some((machine_id, state_tag, excluded_json, planned)) = raw else {
            return Ok(None);
        };

        // excluded_category_ids is stored as a JSON array of ids
        let excluded_category_ids: Vec<i64> = serde_json::from_str(&excluded_json)
            .map_err(|e| RepositoryError::FieldValueError {
                field: "excluded_category_ids".to_string(),
                message: e.to_string(),
            })?;

        Ok(Some(MachineAvailabilityConfig {
            machine_id,
            state_tag,
            excluded_category_ids,
            planned_production_time_seconds: planned,
        }))
    }

    /// Machine-default performance config (product_id IS NULL, first by id).
    pub fn performance_config(
        &self,
        machine_id: i64,
    ) -> RepositoryResult<Option<MachinePerformanceConfig>> {
        let conn = self.get_conn()?;
        let cfg = conn
            .query_row(
                r#"
                SELECT machine_id, product_id, ideal_cycle_time_seconds, cycle_count_tag
                FROM machine_performance_configs
                WHERE machine_id = ?1 AND product_id IS NULL
                ORDER BY id
                LIMIT 1
                "#,
                params![machine_id],
                |row| {
                    Ok(MachinePerformanceConfig {
                        machine_id: row.get("machine_id")?,
                        product_id: row.get("product_id")?,
                        ideal_cycle_time_seconds: row.get("ideal_cycle_time_seconds")?,
                        cycle_count_tag: row.get("cycle_count_tag")?,
                    })
                },
            )
            .optional()?;
        Ok(cfg)
    }

    /// Machine-default quality config (product_id IS NULL, first by id).
    pub fn quality_config(
        &self,
        machine_id: i64,
    ) -> RepositoryResult<Option<MachineQualityConfig>> {
        let conn = self.get_conn()?;
        let cfg = conn
            .query_row(
                r#"
                SELECT machine_id, product_id, good_parts_tag, reject_parts_tag
                FROM machine_quality_configs
                WHERE machine_id = ?1 AND product_id IS NULL
                ORDER BY id
                LIMIT 1
                "#,
                params![machine_id],
                |row| {
                    Ok(MachineQualityConfig {
                        machine_id: row.get("machine_id")?,
                        product_id: row.get("product_id")?,
                        good_parts_tag: row.get("good_parts_tag")?,
                        reject_parts_tag: row.get("reject_parts_tag")?,
                    })
                },
            )
            .optional()?;
        Ok(cfg)
    }
}

// ==========================================
// OEE Calculation Service - entrypoint
// ==========================================
// Long-running background process: two interval jobs
// (OEE calculation, tag monitor) over shared,
// explicitly constructed store clients. Exits only on
// SIGTERM/SIGINT, after a graceful scheduler stop.
// ==========================================

use anyhow::Context;
use oee_service::repository::{DowntimeRepository, MachineRepository, OeeConfigRepository};
use oee_service::scheduler::{spawn_interval_job, JobRunner, OeeCalculationJob, TagMonitorJob};
use oee_service::telemetry::{InfluxClient, TelemetrySink, TelemetrySource};
use oee_service::{db, logging, Settings};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let settings = Settings::from_env();
    info!(
        version = oee_service::VERSION,
        oee_interval_seconds = settings.oee_calc_interval_seconds,
        tag_monitor_interval_seconds = settings.tag_monitor_interval_seconds,
        "{} starting", oee_service::APP_NAME
    );

    // Long-lived, shared store clients: one SQLite connection for all
    // repositories, one HTTP client for the time-series store.
    let conn = db::open_sqlite_connection(&settings.database_path)
        .with_context(|| format!("failed to open config store at {}", settings.database_path))?;
    let conn = Arc::new(Mutex::new(conn));

    let machines = MachineRepository::from_connection(conn.clone())?;
    let configs = OeeConfigRepository::from_connection(conn.clone())?;
    let downtime = DowntimeRepository::from_connection(conn)?;

    let influx = Arc::new(InfluxClient::new(
        settings.influxdb_url.clone(),
        settings.influxdb_database.clone(),
        settings.influxdb_token.clone(),
    )?);
    let source: Arc<dyn TelemetrySource> = influx.clone();
    let sink: Arc<dyn TelemetrySink> = influx;

    let oee_job = Arc::new(JobRunner::new(Arc::new(OeeCalculationJob::new(
        machines,
        configs,
        source.clone(),
        sink,
        settings.oee_calc_interval_seconds,
    ))));
    let tag_job = Arc::new(JobRunner::new(Arc::new(TagMonitorJob::new(
        downtime, source,
    ))));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let oee_handle = spawn_interval_job(
        oee_job.clone(),
        Duration::from_secs(settings.oee_calc_interval_seconds),
        shutdown_rx.clone(),
    );
    let tag_handle = spawn_interval_job(
        tag_job.clone(),
        Duration::from_secs(settings.tag_monitor_interval_seconds),
        shutdown_rx,
    );

    // Run both jobs once immediately on startup
    oee_job.trigger().await;
    tag_job.trigger().await;

    shutdown_signal().await;
    info!("shutting down OEE service");
    let _ = shutdown_tx.send(true);
    let _ = oee_handle.await;
    let _ = tag_handle.await;

    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("failed to install SIGTERM handler");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

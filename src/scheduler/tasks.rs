// ==========================================
// OEE calculation job
// ==========================================
// Each tick: window = [now - interval, now), enumerate
// machines, run the orchestrator for each. Failures are
// isolated per machine and never abort the batch.
// ==========================================

use crate::calculator::run_oee_for_machine;
use crate::domain::metrics::CalcWindow;
use crate::repository::{MachineRepository, OeeConfigRepository};
use crate::scheduler::ticker::ScheduledJob;
use crate::telemetry::{TelemetrySink, TelemetrySource};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error};

pub struct OeeCalculationJob {
    machines: MachineRepository,
    configs: OeeConfigRepository,
    source: Arc<dyn TelemetrySource>,
    sink: Arc<dyn TelemetrySink>,
    interval_seconds: u64,
}

impl OeeCalculationJob {
    pub fn new(
        machines: MachineRepository,
        configs: OeeConfigRepository,
        source: Arc<dyn TelemetrySource>,
        sink: Arc<dyn TelemetrySink>,
        interval_seconds: u64,
    ) -> Self {
        Self {
            machines,
            configs,
            source,
            sink,
            interval_seconds,
        }
    }

    /// Run one batch over an explicit window. Split out from the job
    /// trait so tests can pin the window.
    pub async fn run_batch(&self, window: CalcWindow) {
        let machine_ids = match self.machines.list_machine_ids() {
            Ok(ids) => ids,
            Err(e) => {
                error!(error = %e, "failed to fetch machine list, skipping tick");
                return;
            }
        };
        debug!(
            machines = machine_ids.len(),
            window_start = %window.start,
            window_end = %window.end,
            "starting OEE batch"
        );

        // Sequential on purpose: per-machine read-eval-write stays
        // independent and one failure cannot cross machine boundaries.
        for machine_id in machine_ids {
            if let Err(e) = run_oee_for_machine(
                &self.configs,
                self.source.as_ref(),
                self.sink.as_ref(),
                machine_id,
                window,
            )
            .await
            {
                error!(machine_id, error = %e, "OEE calculation failed");
            }
        }
    }
}

#[async_trait]
impl ScheduledJob for OeeCalculationJob {
    fn name(&self) -> &'static str {
        "oee_calc"
    }

    async fn run(&self) {
        let window = CalcWindow::ending_at(Utc::now(), self.interval_seconds);
        self.run_batch(window).await;
    }
}

// ==========================================
// OEE Calculation Service - scheduler layer
// ==========================================
// Two independent interval-driven jobs sharing one
// process: OEE calculation and tag monitoring.
// ==========================================

pub mod tag_monitor;
pub mod tasks;
pub mod ticker;

pub use tag_monitor::{evaluate_condition, TagMonitorJob};
pub use tasks::OeeCalculationJob;
pub use ticker::{spawn_interval_job, JobRunner, ScheduledJob};

// ==========================================
// OEE Calculation Service - core library
// ==========================================
// Computes Overall Equipment Effectiveness
// (Availability x Performance x Quality) per
// machine over recurring time windows, and
// monitors telemetry tags for downtime events.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - entities and types
pub mod domain;

// Repository layer - relational config store access
pub mod repository;

// Calculator layer - OEE component math and orchestration
pub mod calculator;

// Telemetry layer - time-series store access
pub mod telemetry;

// Scheduler layer - recurring jobs
pub mod scheduler;

// Settings - environment-sourced configuration
pub mod config;

// Database infrastructure (connection init / unified PRAGMA)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports
// ==========================================

// Domain types
pub use domain::{
    AnalogOperator, AvailabilityResult, CalcWindow, DowntimeEvent, DowntimeTagConfig,
    MachineAvailabilityConfig, MachinePerformanceConfig, MachineQualityConfig, MachineState,
    MachineStateDurations, OeeScore, PerformanceResult, ProductionCounts, QualityResult, TagType,
};

// Repositories
pub use repository::{
    DowntimeRepository, MachineRepository, OeeConfigRepository, RepositoryError, RepositoryResult,
};

// Calculators
pub use calculator::{
    calculate_availability, calculate_performance, calculate_quality, run_oee_for_machine,
};

// Telemetry
pub use telemetry::{
    InfluxClient, Point, TagSample, TelemetryError, TelemetrySink, TelemetrySource,
};

// Scheduler
pub use scheduler::{OeeCalculationJob, ScheduledJob, TagMonitorJob};

// Settings
pub use config::Settings;

// ==========================================
// Constants
// ==========================================

// Service version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Service name
pub const APP_NAME: &str = "OEE Calculation Service";

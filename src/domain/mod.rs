// ==========================================
// OEE Calculation Service - domain model layer
// ==========================================
// Entities and types only: no data access, no
// calculation logic (that lives in calculator/).
// ==========================================

pub mod downtime;
pub mod metrics;
pub mod oee_config;
pub mod types;

// Re-export core types
pub use downtime::DowntimeEvent;
pub use metrics::{
    AvailabilityResult, CalcWindow, MachineStateDurations, OeeScore, PerformanceResult,
    ProductionCounts, QualityResult,
};
pub use oee_config::{
    DowntimeTagConfig, MachineAvailabilityConfig, MachinePerformanceConfig, MachineQualityConfig,
};
pub use types::{AnalogOperator, MachineState, TagType};

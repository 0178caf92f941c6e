// ==========================================
// OEE Calculation Service - calculator layer
// ==========================================
// Pure component calculators plus the per-machine
// orchestrator that feeds them from the stores.
// Dependency order: Availability before Performance
// (Performance needs actual run time); Quality is
// independent.
// ==========================================

pub mod availability;
pub mod oee;
pub mod performance;
pub mod quality;

pub use availability::calculate_availability;
pub use oee::run_oee_for_machine;
pub use performance::calculate_performance;
pub use quality::calculate_quality;

// ==========================================
// OEE Calculation Service - repository layer
// ==========================================
// Data access for the relational config store.
// No business logic; all queries parameterized.
// ==========================================

pub mod downtime_repo;
pub mod error;
pub mod machine_repo;
pub mod oee_config_repo;

pub use downtime_repo::DowntimeRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use machine_repo::MachineRepository;
pub use oee_config_repo::OeeConfigRepository;

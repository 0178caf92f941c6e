// ==========================================
// OEE Calculation Service - settings layer
// ==========================================

pub mod settings;

pub use settings::Settings;

// ==========================================
// Environment-sourced service settings
// ==========================================
// One struct, read once at startup and passed to the
// jobs explicitly. Unset variables fall back to the
// defaults below; unparsable numbers are logged and
// fall back too.
// ==========================================

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Settings {
    /// Path of the SQLite configuration store.
    pub database_path: String,
    /// Base URL of the time-series store.
    pub influxdb_url: String,
    pub influxdb_database: String,
    /// Optional bearer token; empty means unauthenticated.
    pub influxdb_token: Option<String>,
    /// OEE calculation interval (also the window length), seconds.
    pub oee_calc_interval_seconds: u64,
    /// Tag monitor poll interval, seconds.
    pub tag_monitor_interval_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: "oee.db".to_string(),
            influxdb_url: "http://influxdb:8181".to_string(),
            influxdb_database: "oeeforge".to_string(),
            influxdb_token: None,
            oee_calc_interval_seconds: 300,
            tag_monitor_interval_seconds: 60,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            database_path: env_string("OEE_DATABASE_PATH", defaults.database_path),
            influxdb_url: env_string("INFLUXDB_URL", defaults.influxdb_url),
            influxdb_database: env_string("INFLUXDB_DATABASE", defaults.influxdb_database),
            influxdb_token: std::env::var("INFLUXDB_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            oee_calc_interval_seconds: env_u64(
                "OEE_CALC_INTERVAL_SECONDS",
                defaults.oee_calc_interval_seconds,
            ),
            tag_monitor_interval_seconds: env_u64(
                "TAG_MONITOR_INTERVAL_SECONDS",
                defaults.tag_monitor_interval_seconds,
            ),
        }
    }
}

fn env_string(key: &str, default: String) -> String {
    std::env::var(key).ok().filter(|v| !v.is_empty()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, raw = %raw, default, "unparsable interval, using default");
                default
            }
        },
        Err(_) => default,
    }
}

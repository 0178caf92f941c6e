// ==========================================
// OEE Calculation Service - SQLite connection init
// ==========================================
// Goals:
// - Unify PRAGMA behavior across every Connection::open
//   (foreign keys on everywhere, not just in some repos)
// - Unify busy_timeout to reduce spurious busy errors when
//   the tag monitor and the OEE job write concurrently
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the unified PRAGMA set to a SQLite connection.
///
/// foreign_keys and busy_timeout are per-connection settings and
/// must be applied to every connection individually.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

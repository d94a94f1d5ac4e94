//! Database connection management
//!
//! Provides utilities for opening and managing SQLite connections

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::errors::{from_rusqlite, Result};

/// How long a writer waits on a locked database before failing
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    let conn = Connection::open(path).map_err(from_rusqlite)?;
    configure(&conn)?;
    Ok(conn)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().map_err(from_rusqlite)?;
    configure(&conn)?;
    Ok(conn)
}

/// Foreign keys on, WAL journal, bounded busy wait
pub fn configure(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")
        .map_err(from_rusqlite)?;
    conn.busy_timeout(BUSY_TIMEOUT).map_err(from_rusqlite)?;
    Ok(())
}

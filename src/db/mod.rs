use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::AppResult;

pub mod migrations;

pub mod repositories;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Handle to the engine's SQLite file. The schema is brought up to date once,
/// in [`DbPool::new`]; every operation afterwards opens a short-lived
/// connection of its own so separate processes can share the file.
#[derive(Clone, Debug)]
pub struct DbPool {
    path: PathBuf,
}

impl DbPool {
    pub fn new<P: Into<PathBuf>>(path: P) -> AppResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let pool = Self { path };
        let conn = pool.connect()?;
        migrations::run(&conn)?;
        info!(target: "engine::db", db_path = %pool.path.display(), "database schema ready");
        Ok(pool)
    }

    /// Opens a configured connection. Does not touch the schema.
    pub fn connect(&self) -> AppResult<Connection> {
        let mut conn = Connection::open(&self.path)?;
        apply_pragmas(&mut conn)?;
        debug!(target: "engine::db", db_path = %self.path.display(), "connection opened");
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, callback: F) -> AppResult<T>
    where
        F: FnOnce(&Connection) -> AppResult<T>,
    {
        let conn = self.connect()?;
        callback(&conn)
    }
}

fn apply_pragmas(conn: &mut Connection) -> AppResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.pragma_update(None, "foreign_keys", 1)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    Ok(())
}

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::Connection;

use crate::error::CoreError;
use crate::migrations::MIGRATIONS;

pub struct StoreDb {
    pub path: PathBuf,
    pub conn: Connection,
}

impl StoreDb {
    /// Directory for diagnostics event logs, next to the store file.
    pub fn log_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) => parent.join("logs"),
            None => PathBuf::from("logs"),
        }
    }
}

pub fn open_store(path: impl AsRef<Path>) -> Result<StoreDb, CoreError> {
    let path = path.as_ref().to_path_buf();
    let conn = Connection::open(&path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        "PRAGMA journal_mode = WAL; \
         PRAGMA synchronous = NORMAL; \
         PRAGMA foreign_keys = ON; \
         PRAGMA journal_size_limit = 67108864; \
         PRAGMA temp_store = MEMORY;",
    )?;
    apply_migrations(&conn)?;
    conn.execute(
        "UPDATE imports \
         SET status = 'failed', \
             stats_json = COALESCE(stats_json, '{\"error\":\"import interrupted\"}') \
         WHERE status = 'running';",
        [],
    )?;
    Ok(StoreDb { path, conn })
}

pub fn apply_migrations(conn: &Connection) -> Result<(), CoreError> {
    let current_version: i64 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let mut version = current_version as usize;
    for (idx, sql) in MIGRATIONS.iter().enumerate() {
        let next_version = idx + 1;
        if next_version <= version {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute_batch(&format!("PRAGMA user_version = {};", next_version))?;
        version = next_version;
    }
    Ok(())
}

//! SQLite store for variants and generation jobs.
//!
//! One connection per process, shared behind a mutex; the repo modules
//! take a `&Database` and borrow the connection for a single closure.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

pub mod error;
pub mod job_repo;
pub mod migrations;
pub mod variant_repo;

pub use error::DatabaseError;

/// Shared store handle. Clones point at the same connection.
///
/// File-backed stores run in WAL mode so `mockgen status` can read the
/// job table while a run is writing to it.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Opens the store at `path`, creating parent directories and the file
    /// as needed, and brings the schema up to date.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| DatabaseError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let db = Self::prepare(Connection::open(path)?, true)?;
        log::info!("Mockup store ready at {}", path.display());
        Ok(db)
    }

    /// Throwaway store with the full schema; used by tests.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        Self::prepare(Connection::open_in_memory()?, false)
    }

    fn prepare(conn: Connection, wal: bool) -> Result<Self, DatabaseError> {
        if wal {
            conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        }
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::run_all(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs `f` while holding the connection lock.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, DatabaseError>
    where
        F: FnOnce(&Connection) -> Result<T, DatabaseError>,
    {
        let guard = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&guard)
    }
}

/// `~/.mockgen/data/mockgen.db`, or `None` without a home directory.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".mockgen").join("data").join("mockgen.db"))
}

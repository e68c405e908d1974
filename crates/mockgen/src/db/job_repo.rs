//! Job repository: CRUD operations for the `generation_jobs` table.

use rusqlite::{params, Row};

use super::{Database, DatabaseError};

/// A raw generation job row from the database.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: String,
    pub job_type: String,
    pub status: String,
    pub total_items: i64,
    pub processed_count: i64,
    pub failed_count: i64,
    /// JSON array of `{itemId, message}` entries.
    pub error_log: String,
    pub started_at: String,
    pub last_updated_at: String,
    pub completed_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            job_type: row.get("job_type")?,
            status: row.get("status")?,
            total_items: row.get("total_items")?,
            processed_count: row.get("processed_count")?,
            failed_count: row.get("failed_count")?,
            error_log: row.get("error_log")?,
            started_at: row.get("started_at")?,
            last_updated_at: row.get("last_updated_at")?,
            completed_at: row.get("completed_at")?,
        })
    }
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO generation_jobs (id, job_type, status, total_items, processed_count,
             failed_count, error_log, started_at, last_updated_at, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                job.id,
                job.job_type,
                job.status,
                job.total_items,
                job.processed_count,
                job.failed_count,
                job.error_log,
                job.started_at,
                job.last_updated_at,
                job.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Updates an existing job row. All fields except `id`, `job_type` and
/// `started_at` are overwritten.
pub fn update(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE generation_jobs SET status=?2, total_items=?3, processed_count=?4,
             failed_count=?5, error_log=?6, last_updated_at=?7, completed_at=?8
             WHERE id=?1",
            params![
                job.id,
                job.status,
                job.total_items,
                job.processed_count,
                job.failed_count,
                job.error_log,
                job.last_updated_at,
                job.completed_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM generation_jobs WHERE id = ?1")?;
        let mut rows = stmt.query_map(params![id], JobRow::from_row)?;
        match rows.next() {
            Some(Ok(row)) => Ok(Some(row)),
            Some(Err(e)) => Err(DatabaseError::Sqlite(e)),
            None => Ok(None),
        }
    })
}

/// Most recent jobs of `job_type`, newest first.
pub fn list_recent(
    db: &Database,
    job_type: &str,
    limit: u64,
) -> Result<Vec<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM generation_jobs WHERE job_type = ?1
             ORDER BY started_at DESC, rowid DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![job_type, limit as i64], JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// The most recently started job of `job_type`.
pub fn find_latest(db: &Database, job_type: &str) -> Result<Option<JobRow>, DatabaseError> {
    Ok(list_recent(db, job_type, 1)?.into_iter().next())
}

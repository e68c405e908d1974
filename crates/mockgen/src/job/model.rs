use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::job_repo::JobRow;
use crate::db::DatabaseError;

/// Tag stored in `generation_jobs.job_type` for mockup runs.
pub const JOB_TYPE: &str = "mockup_generation";

// ─── Helpers ────────────────────────────────────────────────────────────────

fn parse_timestamp(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            log::warn!("parse_timestamp: failed to parse '{}': {}", s, e);
            Utc::now()
        })
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

// ─── JobStatus ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    fn parse(s: &str, job_id: &str) -> Self {
        match s {
            "pending" => JobStatus::Pending,
            "processing" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => {
                log::warn!(
                    "Unknown job status '{}' for job {}, defaulting to Processing",
                    other,
                    job_id
                );
                JobStatus::Processing
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Error log ──────────────────────────────────────────────────────────────

/// One failed item in a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEntry {
    pub item_id: String,
    pub message: String,
}

/// Ring of the most recent errors; the oldest entry is evicted first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorLog {
    capacity: usize,
    entries: VecDeque<ErrorEntry>,
}

impl ErrorLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, item_id: impl Into<String>, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(ErrorEntry {
            item_id: item_id.into(),
            message: message.into(),
        });
    }

    pub fn entries(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<ErrorEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_entries(capacity: usize, entries: Vec<ErrorEntry>) -> Self {
        let mut log = Self::new(capacity);
        for entry in entries {
            log.push(entry.item_id, entry.message);
        }
        log
    }
}

// ─── GenerationJob ──────────────────────────────────────────────────────────

/// The observable record of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub total_items: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    pub error_log: ErrorLog,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GenerationJob {
    /// A fresh `pending` job with a random id.
    pub fn new(error_log_capacity: usize) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), error_log_capacity)
    }

    pub fn with_id(id: String, error_log_capacity: usize) -> Self {
        let now = Utc::now();
        Self {
            id,
            job_type: JOB_TYPE.to_string(),
            status: JobStatus::Pending,
            total_items: 0,
            processed_count: 0,
            failed_count: 0,
            error_log: ErrorLog::new(error_log_capacity),
            started_at: now,
            last_updated_at: now,
            completed_at: None,
        }
    }

    /// Items resolved so far, successful or not.
    pub fn resolved_count(&self) -> u64 {
        self.processed_count + self.failed_count
    }

    pub fn remaining(&self) -> u64 {
        self.total_items.saturating_sub(self.resolved_count())
    }

    pub fn record_success(&mut self) {
        self.processed_count += 1;
        self.touch();
    }

    pub fn record_failure(&mut self, item_id: impl Into<String>, message: impl Into<String>) {
        self.failed_count += 1;
        self.error_log.push(item_id, message);
        self.touch();
    }

    /// Sets the terminal status: `failed` only when nothing succeeded.
    pub fn finalize(&mut self) {
        self.status = if self.failed_count > 0 && self.processed_count == 0 {
            JobStatus::Failed
        } else {
            JobStatus::Completed
        };
        let now = Utc::now();
        self.last_updated_at = now;
        self.completed_at = Some(now);
    }

    /// Marks the job failed after an unrecoverable error.
    pub fn abort(&mut self, message: impl Into<String>) {
        self.error_log.push("job", message);
        self.status = JobStatus::Failed;
        let now = Utc::now();
        self.last_updated_at = now;
        self.completed_at = Some(now);
    }

    fn touch(&mut self) {
        self.last_updated_at = Utc::now();
    }

    pub fn to_row(&self) -> Result<JobRow, DatabaseError> {
        let error_log =
            serde_json::to_string(&self.error_log.to_vec()).map_err(|e| DatabaseError::Json {
                column: "error_log",
                source: e,
            })?;

        Ok(JobRow {
            id: self.id.clone(),
            job_type: self.job_type.clone(),
            status: self.status.as_str().to_string(),
            total_items: self.total_items as i64,
            processed_count: self.processed_count as i64,
            failed_count: self.failed_count as i64,
            error_log,
            started_at: format_timestamp(self.started_at),
            last_updated_at: format_timestamp(self.last_updated_at),
            completed_at: self.completed_at.map(format_timestamp),
        })
    }

    pub fn from_row(row: &JobRow, error_log_capacity: usize) -> Self {
        let entries: Vec<ErrorEntry> = serde_json::from_str(&row.error_log).unwrap_or_else(|e| {
            log::warn!("Job {} has unreadable error log: {}", row.id, e);
            Vec::new()
        });

        Self {
            id: row.id.clone(),
            job_type: row.job_type.clone(),
            status: JobStatus::parse(&row.status, &row.id),
            total_items: count(row.total_items),
            processed_count: count(row.processed_count),
            failed_count: count(row.failed_count),
            error_log: ErrorLog::from_entries(error_log_capacity, entries),
            started_at: parse_timestamp(&row.started_at),
            last_updated_at: parse_timestamp(&row.last_updated_at),
            completed_at: row.completed_at.as_deref().map(parse_timestamp),
        }
    }
}

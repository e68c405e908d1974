//! Derived progress figures for a running or finished job.
//!
//! Nothing here is stored: averages and ETAs are recomputed from the job
//! record on every read so pollers always see current values.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::model::{ErrorEntry, GenerationJob, JobStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressEstimate {
    pub average_time_per_item: Option<Duration>,
    pub estimated_remaining: Option<Duration>,
}

impl ProgressEstimate {
    pub fn compute(job: &GenerationJob, now: DateTime<Utc>) -> Self {
        if job.processed_count == 0 {
            return Self::default();
        }

        // A finished job's figures freeze at completion.
        let end = job.completed_at.unwrap_or(now);
        let elapsed = (end - job.started_at).max(Duration::zero());
        let divisor = i32::try_from(job.processed_count).unwrap_or(i32::MAX);
        let average = elapsed / divisor;

        let remaining = i32::try_from(job.remaining()).unwrap_or(i32::MAX);
        Self {
            average_time_per_item: Some(average),
            estimated_remaining: Some(average * remaining),
        }
    }
}

/// Job snapshot handed to pollers.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusView {
    pub id: String,
    pub job_type: String,
    pub status: JobStatus,
    pub total_items: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    pub error_log: Vec<ErrorEntry>,
    pub started_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Milliseconds per successful item.
    pub average_time_per_item_ms: Option<i64>,
    pub estimated_remaining_ms: Option<i64>,
}

impl JobStatusView {
    pub fn from_job(job: &GenerationJob, now: DateTime<Utc>) -> Self {
        let estimate = ProgressEstimate::compute(job, now);
        Self {
            id: job.id.clone(),
            job_type: job.job_type.clone(),
            status: job.status,
            total_items: job.total_items,
            processed_count: job.processed_count,
            failed_count: job.failed_count,
            error_log: job.error_log.to_vec(),
            started_at: job.started_at,
            last_updated_at: job.last_updated_at,
            completed_at: job.completed_at,
            average_time_per_item_ms: estimate
                .average_time_per_item
                .map(|d| d.num_milliseconds()),
            estimated_remaining_ms: estimate.estimated_remaining.map(|d| d.num_milliseconds()),
        }
    }

    /// Fraction of items resolved, in `[0, 1]`.
    pub fn fraction_done(&self) -> f64 {
        if self.total_items == 0 {
            return if self.status.is_finished() { 1.0 } else { 0.0 };
        }
        let resolved = (self.processed_count + self.failed_count).min(self.total_items);
        resolved as f64 / self.total_items as f64
    }
}

//! Job progress broadcaster for real-time status streaming.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::job::{GenerationJob, JobStatus};

/// What triggered a progress event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Started,
    ItemSucceeded,
    ItemFailed,
    Cooldown,
    Finished,
}

impl std::fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressKind::Started => write!(f, "Started"),
            ProgressKind::ItemSucceeded => write!(f, "Item succeeded"),
            ProgressKind::ItemFailed => write!(f, "Item failed"),
            ProgressKind::Cooldown => write!(f, "Cooling down"),
            ProgressKind::Finished => write!(f, "Finished"),
        }
    }
}

/// Snapshot of job counters sent after every update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub job_id: String,
    pub kind: ProgressKind,
    pub status: JobStatus,
    pub total_items: u64,
    pub processed_count: u64,
    pub failed_count: u64,
    /// Variant the event refers to, for item events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<i64>,
    /// Error message, for failed items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn from_job(job: &GenerationJob, kind: ProgressKind) -> Self {
        Self {
            job_id: job.id.clone(),
            kind,
            status: job.status,
            total_items: job.total_items,
            processed_count: job.processed_count,
            failed_count: job.failed_count,
            variant_id: None,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_variant(mut self, variant_id: i64) -> Self {
        self.variant_id = Some(variant_id);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Broadcasts progress events for streaming.
#[derive(Clone)]
pub struct ProgressBroadcaster {
    sender: Arc<broadcast::Sender<ProgressEvent>>,
}

impl ProgressBroadcaster {
    /// Creates a new broadcaster with the specified channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Sends a progress event to all subscribers.
    pub fn send(&self, event: ProgressEvent) {
        // No active receivers is fine
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }
}

impl Default for ProgressBroadcaster {
    fn default() -> Self {
        Self::new(100)
    }
}

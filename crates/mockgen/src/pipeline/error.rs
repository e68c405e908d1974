use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("A mockup generation run is already in progress")]
    AlreadyRunning,

    #[error("Store access failed: {0}")]
    Store(#[from] crate::db::DatabaseError),

    #[error("Failed to start run: {0}")]
    Setup(String),
}

/// A variant dropped during discovery. Never counted in the job totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverySkip {
    pub variant_id: i64,
    pub reason: String,
}

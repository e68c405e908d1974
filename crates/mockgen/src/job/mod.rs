//! Generation job record and progress estimation.

pub mod model;
pub mod progress;

pub use model::{ErrorEntry, ErrorLog, GenerationJob, JobStatus, JOB_TYPE};
pub use progress::{JobStatusView, ProgressEstimate};

//! Broadcasting of live job progress to any number of subscribers.

pub mod job_progress;

pub use job_progress::{ProgressBroadcaster, ProgressEvent, ProgressKind};

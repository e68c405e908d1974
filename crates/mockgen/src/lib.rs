pub mod broadcast;
pub mod config;
pub mod db;
pub mod detect;
pub mod error;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod service;
pub mod vendor;

pub use broadcast::{ProgressBroadcaster, ProgressEvent, ProgressKind};
pub use config::{load_config, Config};
pub use db::Database;
pub use detect::{detect, detect_rgb, PrintArea};
pub use error::{ConfigError, MockgenError, Result};
pub use job::{GenerationJob, JobStatus, JobStatusView, ProgressEstimate};
pub use pipeline::{CancelSignal, MockupPipeline, PipelineError, RunSummary};
pub use service::{MockupService, StatusReader};
pub use vendor::{HttpVendorClient, TaskAdapter, VendorApi, VendorError};

pub mod cancel;
pub mod config;
pub mod discovery;
pub mod error;
pub mod progress;
pub mod runner;

pub use cancel::CancelSignal;
pub use config::PipelineConfig;
pub use discovery::{group_by_product, ProductGroup, WorkItem};
pub use error::{DiscoverySkip, PipelineError};
pub use progress::{BroadcastProgress, NoopProgress, ProgressReporter};
pub use runner::{MockupPipeline, RunSummary};

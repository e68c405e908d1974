//! Caller-facing operations: start a run, poll its status, count the backlog.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::broadcast::{ProgressBroadcaster, ProgressEvent};
use crate::config::Config;
use crate::db::{default_database_path, job_repo, variant_repo, Database};
use crate::detect::{HttpImageFetcher, ImageFetcher};
use crate::error::Result;
use crate::job::{GenerationJob, JobStatusView, JOB_TYPE};
use crate::pipeline::{
    BroadcastProgress, CancelSignal, MockupPipeline, PipelineConfig, PipelineError, RunSummary,
};
use crate::vendor::{HttpVendorClient, TaskAdapter, VendorApi};

/// Clears the running flag when a run ends, even by panic.
struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(running: &Arc<AtomicBool>) -> std::result::Result<Self, PipelineError> {
        running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| PipelineError::AlreadyRunning)?;
        Ok(Self {
            running: Arc::clone(running),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn open_database(config: &Config) -> Result<Database> {
    let db_path = config
        .database_path
        .clone()
        .or_else(default_database_path)
        .ok_or_else(|| {
            PipelineError::Setup("could not determine the database location".to_string())
        })?;
    Ok(Database::open(&db_path)?)
}

/// Store-only queries: job status and backlog. Needs no vendor credentials.
#[derive(Clone)]
pub struct StatusReader {
    db: Database,
    invalid_url_patterns: Vec<String>,
    error_log_capacity: usize,
}

impl StatusReader {
    pub fn new(config: &Config, db: Database) -> Self {
        Self {
            db,
            invalid_url_patterns: config.discovery.invalid_url_patterns.clone(),
            error_log_capacity: config.error_log_capacity,
        }
    }

    /// Opens the configured database without touching the vendor settings.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config, open_database(config)?))
    }

    /// Status of `job_id`, or of the most recent run when omitted.
    pub fn get_status(&self, job_id: Option<&str>) -> Result<Option<JobStatusView>> {
        let row = match job_id {
            Some(id) => job_repo::find_by_id(&self.db, id)?,
            None => job_repo::find_latest(&self.db, JOB_TYPE)?,
        };

        Ok(row.map(|row| {
            let job = GenerationJob::from_row(&row, self.error_log_capacity);
            JobStatusView::from_job(&job, Utc::now())
        }))
    }

    /// Variants that still need a mockup.
    pub fn count_pending(&self) -> Result<u64> {
        Ok(variant_repo::count_pending(
            &self.db,
            &self.invalid_url_patterns,
        )?)
    }

    pub fn recent_jobs(&self, limit: u64) -> Result<Vec<JobStatusView>> {
        let now = Utc::now();
        let rows = job_repo::list_recent(&self.db, JOB_TYPE, limit)?;
        Ok(rows
            .iter()
            .map(|row| {
                JobStatusView::from_job(&GenerationJob::from_row(row, self.error_log_capacity), now)
            })
            .collect())
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

pub struct MockupService {
    status: StatusReader,
    pipeline: Arc<MockupPipeline>,
    broadcaster: ProgressBroadcaster,
    running: Arc<AtomicBool>,
    cancel: Mutex<CancelSignal>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl MockupService {
    /// Builds a service around explicit collaborators.
    pub fn new(
        config: &Config,
        db: Database,
        vendor: Arc<dyn VendorApi>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        let broadcaster = ProgressBroadcaster::default();
        let adapter = TaskAdapter::new(
            vendor,
            config.vendor.format.clone(),
            config.schedule.poll_interval(),
            config.schedule.poll_attempts,
        );
        let pipeline = MockupPipeline::new(
            Arc::new(PipelineConfig::from_config(config)),
            db.clone(),
            adapter,
            fetcher,
            Arc::new(BroadcastProgress::new(broadcaster.clone())),
        );

        Self {
            status: StatusReader::new(config, db),
            pipeline: Arc::new(pipeline),
            broadcaster,
            running: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(CancelSignal::new()),
            handle: Mutex::new(None),
        }
    }

    /// Production constructor: opens the database and the HTTP clients.
    pub fn from_config(config: &Config) -> Result<Self> {
        let db = open_database(config)?;

        let vendor = HttpVendorClient::with_timeouts(
            &config.vendor.base_url,
            config.vendor.api_key()?,
            config.vendor.connect_timeout(),
            config.vendor.request_timeout(),
        )?;
        let fetcher = HttpImageFetcher::new()?;

        Ok(Self::new(config, db, Arc::new(vendor), Arc::new(fetcher)))
    }

    /// Starts a run in the background and returns its job id.
    ///
    /// The job record exists when this returns, so the id can be polled
    /// right away.
    pub fn start_run(&self) -> Result<String> {
        let guard = RunGuard::acquire(&self.running)?;
        let job = self.pipeline.create_job()?;
        let job_id = job.id.clone();

        let cancel = self.fresh_cancel_signal();
        let pipeline = Arc::clone(&self.pipeline);
        let handle = tokio::spawn(async move {
            let _guard = guard;
            if let Err(e) = pipeline.run_job(job, &cancel).await {
                warn!("Background mockup run failed: {}", e);
            }
        });

        if let Ok(mut slot) = self.handle.lock() {
            *slot = Some(handle);
        }

        info!(job_id = %job_id, "Mockup generation started");
        Ok(job_id)
    }

    /// Runs to completion on the current task.
    pub async fn run_now(&self) -> Result<RunSummary> {
        let _guard = RunGuard::acquire(&self.running)?;
        let cancel = self.fresh_cancel_signal();
        self.pipeline.run(&cancel).await
    }

    /// Waits for the background run started by [`Self::start_run`], if any.
    pub async fn wait(&self) {
        let handle = self.handle.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!("Background mockup run panicked: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Asks the active run to stop before its next group.
    pub fn cancel(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        if let Ok(signal) = self.cancel.lock() {
            signal.cancel();
        }
        true
    }

    pub fn get_status(&self, job_id: Option<&str>) -> Result<Option<JobStatusView>> {
        self.status.get_status(job_id)
    }

    pub fn count_pending(&self) -> Result<u64> {
        self.status.count_pending()
    }

    pub fn recent_jobs(&self, limit: u64) -> Result<Vec<JobStatusView>> {
        self.status.recent_jobs(limit)
    }

    /// Read-only handle sharing this service's database.
    pub fn status_reader(&self) -> &StatusReader {
        &self.status
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.broadcaster.subscribe()
    }

    pub fn database(&self) -> &Database {
        self.status.database()
    }

    fn fresh_cancel_signal(&self) -> CancelSignal {
        let signal = CancelSignal::new();
        match self.cancel.lock() {
            Ok(mut slot) => *slot = signal.clone(),
            Err(_) => warn!("Cancel slot lock poisoned; run will not be cancellable"),
        }
        signal
    }
}

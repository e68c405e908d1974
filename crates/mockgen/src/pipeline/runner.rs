use std::sync::Arc;

use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::broadcast::{ProgressEvent, ProgressKind};
use crate::db::{job_repo, variant_repo, Database};
use crate::db::variant_repo::AreaSource;
use crate::detect::{self, DetectError, ImageFetcher, PrintArea};
use crate::error::MockgenError;
use crate::job::{ErrorEntry, GenerationJob, JobStatus};
use crate::vendor::{RenderOutcome, TaskAdapter};

use super::cancel::CancelSignal;
use super::config::PipelineConfig;
use super::discovery::{group_by_product, ProductGroup, WorkItem};
use super::error::{DiscoverySkip, PipelineError};
use super::progress::ProgressReporter;

/// Outcome of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub job_id: String,
    pub status: JobStatus,
    pub processed_count: u64,
    pub failed_count: u64,
    /// The bounded error log as stored on the job.
    pub errors: Vec<ErrorEntry>,
    /// Variants dropped during discovery.
    pub skipped: Vec<DiscoverySkip>,
    pub cancelled: bool,
}

pub struct MockupPipeline {
    config: Arc<PipelineConfig>,
    db: Database,
    adapter: TaskAdapter,
    fetcher: Arc<dyn ImageFetcher>,
    progress: Arc<dyn ProgressReporter>,
}

impl MockupPipeline {
    pub fn new(
        config: Arc<PipelineConfig>,
        db: Database,
        adapter: TaskAdapter,
        fetcher: Arc<dyn ImageFetcher>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            config,
            db,
            adapter,
            fetcher,
            progress,
        }
    }

    /// Creates the job record for a new run in the `pending` state.
    pub fn create_job(&self) -> Result<GenerationJob, PipelineError> {
        let job = GenerationJob::new(self.config.error_log_capacity);
        job_repo::insert(&self.db, &job.to_row()?)?;
        self.progress
            .report(ProgressEvent::from_job(&job, ProgressKind::Started));
        Ok(job)
    }

    /// Runs a full generation pass with a freshly created job.
    pub async fn run(&self, cancel: &CancelSignal) -> Result<RunSummary, MockgenError> {
        let job = self.create_job()?;
        self.run_job(job, cancel).await
    }

    /// Runs a generation pass for a job created by [`Self::create_job`].
    ///
    /// A store failure aborts the run: the job is marked `failed` (best
    /// effort) and the error returned.
    pub async fn run_job(
        &self,
        mut job: GenerationJob,
        cancel: &CancelSignal,
    ) -> Result<RunSummary, MockgenError> {
        let span = info_span!("mockup_run", job_id = %job.id);

        async {
            match self.execute(&mut job, cancel).await {
                Ok(skipped) => {
                    info!(
                        status = %job.status,
                        processed = job.processed_count,
                        failed = job.failed_count,
                        skipped = skipped.len(),
                        "Mockup generation finished"
                    );
                    Ok(RunSummary {
                        job_id: job.id.clone(),
                        status: job.status,
                        processed_count: job.processed_count,
                        failed_count: job.failed_count,
                        errors: job.error_log.to_vec(),
                        skipped,
                        cancelled: cancel.is_cancelled(),
                    })
                }
                Err(e) => {
                    error!("Mockup generation aborted: {}", e);
                    job.abort(e.to_string());
                    if let Err(persist_err) = self.persist(&job) {
                        warn!("Failed to mark job as failed: {}", persist_err);
                    }
                    self.progress.report(
                        ProgressEvent::from_job(&job, ProgressKind::Finished)
                            .with_error(e.to_string()),
                    );
                    Err(e.into())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        job: &mut GenerationJob,
        cancel: &CancelSignal,
    ) -> Result<Vec<DiscoverySkip>, PipelineError> {
        // Step 1: Discover
        let items = self.step_discover()?;

        // Step 2: Resolve product ids
        let (resolved, skipped) = self
            .step_resolve_products(&items)
            .instrument(info_span!("resolve_products"))
            .await;

        // Step 3: Group and start
        let groups = group_by_product(&resolved);
        job.total_items = groups.iter().map(|g| g.variant_ids.len() as u64).sum();
        job.status = JobStatus::Processing;
        self.persist(job)?;
        self.progress
            .report(ProgressEvent::from_job(job, ProgressKind::Started));
        info!(
            groups = groups.len(),
            variants = job.total_items,
            "Starting mockup generation"
        );

        // Step 4: Render groups one at a time
        for (i, group) in groups.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("Run cancelled before product {}", group.product_id);
                break;
            }
            if i > 0 {
                self.progress
                    .report(ProgressEvent::from_job(job, ProgressKind::Cooldown));
                if !cancel.sleep(self.config.group_cooldown).await {
                    info!("Run cancelled during cooldown");
                    break;
                }
            }

            self.step_render_group(job, group)
                .instrument(info_span!(
                    "group",
                    product_id = group.product_id,
                    variants = group.variant_ids.len()
                ))
                .await?;
        }

        // Step 5: Finalize
        job.finalize();
        self.persist(job)?;
        self.progress
            .report(ProgressEvent::from_job(job, ProgressKind::Finished));

        Ok(skipped)
    }

    fn step_discover(&self) -> Result<Vec<WorkItem>, PipelineError> {
        let _step = info_span!("discover").entered();
        let rows = variant_repo::discover(&self.db, &self.config.invalid_url_patterns)?;

        let items: Vec<WorkItem> = rows
            .iter()
            .filter_map(|row| {
                let item = WorkItem::from_row(row);
                if item.is_none() {
                    debug!("Ignoring variant with invalid id {}", row.variant_id);
                }
                item
            })
            .collect();

        info!(found = items.len(), "Discovered variants without mockups");
        Ok(items)
    }

    async fn step_resolve_products(
        &self,
        items: &[WorkItem],
    ) -> (Vec<(i64, i64)>, Vec<DiscoverySkip>) {
        let mut resolved = Vec::with_capacity(items.len());
        let mut skipped = Vec::new();

        for item in items {
            if let Some(product_id) = item.product_id {
                resolved.push((item.variant_id, product_id));
                continue;
            }

            match self.adapter.variant_product(item.variant_id).await {
                Ok(product_id) => {
                    if let Err(e) = variant_repo::set_product_id(&self.db, item.variant_id, product_id)
                    {
                        warn!(
                            "Failed to store product {} for variant {}: {}",
                            product_id, item.variant_id, e
                        );
                    }
                    resolved.push((item.variant_id, product_id));
                }
                Err(e) => {
                    warn!("Skipping variant {}: product lookup failed: {}", item.variant_id, e);
                    skipped.push(DiscoverySkip {
                        variant_id: item.variant_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        (resolved, skipped)
    }

    async fn step_render_group(
        &self,
        job: &mut GenerationJob,
        group: &ProductGroup,
    ) -> Result<(), PipelineError> {
        let outcome = self
            .adapter
            .render(
                &group.variant_ids,
                &self.config.placement,
                &self.config.artwork_url,
            )
            .await;

        match outcome {
            Ok(outcome) => {
                for &variant_id in &group.variant_ids {
                    self.step_resolve_variant(job, variant_id, &outcome).await?;
                }
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Render failed for product {}: {}", group.product_id, message);
                for &variant_id in &group.variant_ids {
                    job.record_failure(variant_id.to_string(), message.clone());
                    self.persist(job)?;
                    self.progress.report(
                        ProgressEvent::from_job(job, ProgressKind::ItemFailed)
                            .with_variant(variant_id)
                            .with_error(message.clone()),
                    );
                }
            }
        }

        Ok(())
    }

    async fn step_resolve_variant(
        &self,
        job: &mut GenerationJob,
        variant_id: i64,
        outcome: &RenderOutcome,
    ) -> Result<(), PipelineError> {
        let event = match outcome.image_url_for(variant_id) {
            None => {
                let message = format!("No mockup URL for variant {}", variant_id);
                warn!("{}", message);
                job.record_failure(variant_id.to_string(), message.clone());
                ProgressEvent::from_job(job, ProgressKind::ItemFailed)
                    .with_variant(variant_id)
                    .with_error(message)
            }
            Some(url) => match self.locate_print_area(url).await {
                Ok(area) => {
                    variant_repo::save_mockup(
                        &self.db,
                        variant_id,
                        url,
                        &area.clamped(),
                        AreaSource::Detected,
                    )?;
                    debug!(variant_id, ?area, "Print area detected");
                    job.record_success();
                    ProgressEvent::from_job(job, ProgressKind::ItemSucceeded)
                        .with_variant(variant_id)
                }
                Err(e) => {
                    variant_repo::save_mockup(
                        &self.db,
                        variant_id,
                        url,
                        &PrintArea::FALLBACK,
                        AreaSource::Fallback,
                    )?;
                    let message = format!("Print area detection failed, using fallback: {}", e);
                    warn!(variant_id, "{}", message);
                    job.record_failure(variant_id.to_string(), message.clone());
                    ProgressEvent::from_job(job, ProgressKind::ItemFailed)
                        .with_variant(variant_id)
                        .with_error(message)
                }
            },
        };

        self.persist(job)?;
        self.progress.report(event);
        Ok(())
    }

    async fn locate_print_area(&self, url: &str) -> Result<PrintArea, DetectError> {
        let bytes = self.fetcher.fetch(url).await?;
        detect::detect(&bytes)
    }

    fn persist(&self, job: &GenerationJob) -> Result<(), PipelineError> {
        job_repo::update(&self.db, &job.to_row()?)?;
        Ok(())
    }
}

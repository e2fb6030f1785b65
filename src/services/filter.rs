//! Batched "reapply memory filter" run for the selected search job.
//!
//! Sequence: capture pause state, pause (best effort), stop polling, read the
//! queue size, drain batches while publishing progress, then resume and
//! restart polling unless the job was already paused beforehand.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::models::filter::{FilterProgress, FilterSummary};
use crate::services::api::ApiError;
use crate::services::dashboard::{Dashboard, DashboardError, Inner, RefreshMode};
use crate::services::notify::NotificationLevel;

/// Exclusive right to run the memory filter. Released on drop.
///
/// A run abandoned mid-drain (future dropped or panicking) still clears the
/// progress indicator and resumes the job it paused.
pub struct FilterRun {
    inner: Arc<Inner>,
    job_id: String,
    resume_pending: bool,
}

impl FilterRun {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }
}

impl Drop for FilterRun {
    fn drop(&mut self) {
        let dashboard = Dashboard {
            inner: Arc::clone(&self.inner),
        };
        if dashboard.filter_progress().is_some() {
            dashboard.set_filter_progress(None);
        }

        if self.resume_pending {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => {
                    warn!(job_id = %self.job_id, "memory filter interrupted, resuming search");
                    let job_id = self.job_id.clone();
                    runtime.spawn(async move { dashboard.resume_after_filter(&job_id).await });
                }
                Err(_) => {
                    error!(job_id = %self.job_id, "memory filter interrupted outside a runtime, search left paused");
                }
            }
        }

        self.inner.filter_running.store(false, Ordering::Release);
    }
}

impl Dashboard {
    pub fn is_filter_running(&self) -> bool {
        self.inner.filter_running.load(Ordering::Acquire)
    }

    /// Claim the coordinator for the selected job.
    ///
    /// Fails with `NoSelection` (reported to the user) or `Busy` without
    /// touching any state.
    pub fn begin_filter_run(&self) -> Result<FilterRun, DashboardError> {
        let Some(job_id) = self.selected_job_id() else {
            self.notify(NotificationLevel::Error, "please select a search first");
            return Err(DashboardError::NoSelection);
        };
        if self
            .inner
            .filter_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(DashboardError::Busy);
        }
        Ok(FilterRun {
            inner: Arc::clone(&self.inner),
            job_id,
            resume_pending: false,
        })
    }

    /// Run the memory filter against the selected job.
    pub async fn reapply_filter(&self) -> Result<FilterSummary, DashboardError> {
        let run = self.begin_filter_run()?;
        self.run_filter(run).await
    }

    /// Drive a claimed run to completion. Progress is cleared and the pause
    /// state restored on every exit path.
    pub async fn run_filter(&self, mut run: FilterRun) -> Result<FilterSummary, DashboardError> {
        let job_id = run.job_id().to_string();

        // Read before pausing so a job the user paused stays paused.
        let was_already_paused = self
            .job_status(&job_id)
            .is_some_and(|status| status.is_paused());

        info!(job_id = %job_id, was_already_paused, "reapplying memory filter");

        if !was_already_paused {
            run.resume_pending = true;
            if let Err(e) = self.api().pause_job(&job_id).await {
                warn!(job_id = %job_id, error = %e, "failed to pause search before filtering");
            }
        }
        self.inner.poller.stop();

        let outcome = self.drain_filter_queue(&job_id).await;
        self.set_filter_progress(None);

        match &outcome {
            Ok(summary) => {
                info!(
                    job_id = %job_id,
                    processed = summary.processed,
                    filtered = summary.filtered,
                    batches = summary.batches,
                    "memory filter complete"
                );
                self.state().last_filter = Some(*summary);
                metrics::counter!("memory_filter_runs_total", "outcome" => "completed").increment(1);
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "error reapplying memory filter");
                self.notify(
                    NotificationLevel::Error,
                    format!("error reapplying memory filter: {e}"),
                );
                metrics::counter!("memory_filter_runs_total", "outcome" => "failed").increment(1);
            }
        }

        if run.resume_pending {
            self.resume_after_filter(&job_id).await;
            run.resume_pending = false;
        }

        drop(run);
        outcome.map_err(DashboardError::from)
    }

    async fn drain_filter_queue(&self, job_id: &str) -> Result<FilterSummary, ApiError> {
        let total = self.api().filter_count(job_id).await?;
        let mut summary = FilterSummary {
            total,
            ..FilterSummary::default()
        };

        loop {
            let batch = self.api().filter_batch(job_id).await?;
            summary.batches += 1;
            summary.processed += batch.processed;
            summary.filtered += batch.filtered_count;
            metrics::counter!("memory_filter_batches_total").increment(1);

            self.set_filter_progress(Some(FilterProgress {
                current: summary.processed,
                total,
            }));
            debug!(
                job_id,
                batch = summary.batches,
                processed = summary.processed,
                total,
                "memory filter batch processed"
            );

            self.refresh_candidates(job_id, RefreshMode::Background).await;

            if batch.done {
                return Ok(summary);
            }
        }
    }

    /// Resume failures are logged only; polling restarts either way while the
    /// job is still the selected one.
    async fn resume_after_filter(&self, job_id: &str) {
        if let Err(e) = self.api().resume_job(job_id).await {
            warn!(job_id, error = %e, "failed to resume search after filtering");
        }
        if self.state().is_selected(job_id) {
            self.start_polling(job_id);
        }
    }
}

//! Job lifecycle actions: one request each, followed by a registry refresh.

use tracing::{error, info, warn};

use crate::services::api::ApiError;
use crate::services::dashboard::{Dashboard, DashboardError, RefreshMode};
use crate::services::notify::NotificationLevel;

/// Outcome of a delete that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The server answered `success: false`; the job stays listed.
    Rejected(String),
}

impl Dashboard {
    /// Create a search job, select it, and start polling it.
    ///
    /// A blank query is rejected before any request is made. On failure the
    /// previous selection and its candidates stay in place so the caller can retry.
    pub async fn submit_search(&self, query: &str) -> Result<String, DashboardError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DashboardError::InvalidQuery);
        }

        let job_id = match self.api().create_job(query).await {
            Ok(job_id) => job_id,
            Err(e) => {
                error!(query, error = %e, "failed to submit search");
                self.notify(NotificationLevel::Error, format!("search failed: {e}"));
                return Err(e.into());
            }
        };
        info!(job_id = %job_id, query, "search job created");
        metrics::counter!("search_jobs_submitted_total").increment(1);

        self.state().select(Some(job_id.clone()));
        self.refresh_jobs().await;
        self.refresh_candidates(&job_id, RefreshMode::Explicit).await;
        self.schedule_suggestions(&job_id);
        self.start_polling(&job_id);

        Ok(job_id)
    }

    /// Pause a job. Polling of that job stops until it is resumed.
    pub async fn pause_job(&self, job_id: &str) -> Result<(), DashboardError> {
        if let Err(e) = self.api().pause_job(job_id).await {
            error!(job_id, error = %e, "failed to pause search job");
            self.notify(NotificationLevel::Error, format!("failed to pause search: {e}"));
            return Err(e.into());
        }
        info!(job_id, "search job paused");
        self.inner.poller.stop_if_bound_to(job_id);
        self.refresh_jobs().await;
        Ok(())
    }

    /// Resume a job, restarting polling if it is the selected one.
    pub async fn resume_job(&self, job_id: &str) -> Result<(), DashboardError> {
        if let Err(e) = self.api().resume_job(job_id).await {
            error!(job_id, error = %e, "failed to resume search job");
            self.notify(NotificationLevel::Error, format!("failed to resume search: {e}"));
            return Err(e.into());
        }
        info!(job_id, "search job resumed");
        self.refresh_jobs().await;
        if self.state().is_selected(job_id) {
            self.start_polling(job_id);
        }
        Ok(())
    }

    /// Delete a job.
    ///
    /// Transport errors and non-2xx responses are returned as errors; a
    /// `success: false` answer is reported but comes back as
    /// `DeleteOutcome::Rejected`. Either way a failed delete keeps the job listed.
    pub async fn delete_job(&self, job_id: &str) -> Result<DeleteOutcome, DashboardError> {
        match self.api().delete_job(job_id).await {
            Ok(()) => {}
            Err(ApiError::Rejected(reason)) => {
                warn!(job_id, reason = %reason, "server refused to delete search job");
                self.notify(
                    NotificationLevel::Error,
                    format!("failed to delete search: {reason}"),
                );
                return Ok(DeleteOutcome::Rejected(reason));
            }
            Err(e) => {
                error!(job_id, error = %e, "error deleting search job");
                self.notify(NotificationLevel::Error, format!("error deleting search: {e}"));
                return Err(e.into());
            }
        }

        let was_selected = {
            let mut state = self.state();
            state.registry.remove(job_id);
            let was_selected = state.is_selected(job_id);
            if was_selected {
                state.select(None);
            }
            was_selected
        };
        if was_selected {
            self.inner.poller.stop();
        } else {
            self.inner.poller.stop_if_bound_to(job_id);
        }

        info!(job_id, "search job deleted");
        self.notify(NotificationLevel::Info, "search deleted");
        Ok(DeleteOutcome::Deleted)
    }
}

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::models::candidate::{Candidate, PassEvent};
use crate::models::filter::{FilterProgress, FilterSummary};
use crate::models::job::{JobStatus, SearchJob};
use crate::models::surface::DashboardSnapshot;
use crate::services::api::{ApiError, RemoteApi};
use crate::services::notify::{Notification, NotificationLevel, Notifications};
use crate::services::poller::{PollScheduler, POLL_DEADLINE, POLL_INTERVAL};
use crate::services::registry::JobRegistry;

/// Delay before the one-shot suggestion fetch after a submit.
pub const SUGGESTIONS_DELAY: Duration = Duration::from_secs(5);

/// Timing knobs of the dashboard core.
#[derive(Debug, Clone, Copy)]
pub struct DashboardSettings {
    pub poll_interval: Duration,
    pub poll_deadline: Duration,
    pub suggestions_delay: Duration,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            poll_interval: POLL_INTERVAL,
            poll_deadline: POLL_DEADLINE,
            suggestions_delay: SUGGESTIONS_DELAY,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("search query must not be empty")]
    InvalidQuery,

    #[error("please select a search first")]
    NoSelection,

    #[error("memory filter is already running")]
    Busy,

    #[error(transparent)]
    Remote(#[from] ApiError),
}

/// Who asked for a candidate refresh. Either way the result lands only if
/// the job is still selected when the response arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshMode {
    /// The user targeted this job; failures are reported.
    Explicit,
    /// Poll- or filter-driven; failures are logged only.
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateRefresh {
    Applied,
    /// The selection moved on while the request was in flight.
    Discarded,
    /// The server no longer knows the job.
    JobGone,
    Failed,
}

#[derive(Default)]
pub(crate) struct DashboardState {
    pub(crate) registry: JobRegistry,
    pub(crate) selected_job_id: Option<String>,
    pub(crate) candidates: Vec<Candidate>,
    pub(crate) filter_progress: Option<FilterProgress>,
    pub(crate) last_filter: Option<FilterSummary>,
    pub(crate) suggestions: Vec<String>,
    pub(crate) notifications: Notifications,
}

impl DashboardState {
    pub(crate) fn is_selected(&self, job_id: &str) -> bool {
        self.selected_job_id.as_deref() == Some(job_id)
    }

    /// Selection and candidates change together so a renderer never sees
    /// one job's candidates under another job's id.
    pub(crate) fn select(&mut self, job_id: Option<String>) {
        self.selected_job_id = job_id;
        self.candidates.clear();
        self.suggestions.clear();
    }
}

pub(crate) struct Inner {
    pub(crate) api: Arc<dyn RemoteApi>,
    pub(crate) settings: DashboardSettings,
    pub(crate) state: Mutex<DashboardState>,
    pub(crate) poller: PollScheduler,
    pub(crate) filter_running: AtomicBool,
    pub(crate) progress_tx: broadcast::Sender<Option<FilterProgress>>,
}

/// Owned state container for everything the dashboard shows about search jobs.
///
/// Cloning is cheap and shares state. The state lock is never held across an
/// `.await`, so each mutation is atomic and only network calls interleave.
#[derive(Clone)]
pub struct Dashboard {
    pub(crate) inner: Arc<Inner>,
}

impl Dashboard {
    pub fn new(api: Arc<dyn RemoteApi>, settings: DashboardSettings) -> Self {
        let (progress_tx, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(Inner {
                api,
                settings,
                state: Mutex::new(DashboardState::default()),
                poller: PollScheduler::new(settings.poll_interval, settings.poll_deadline),
                filter_running: AtomicBool::new(false),
                progress_tx,
            }),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, DashboardState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn api(&self) -> &dyn RemoteApi {
        self.inner.api.as_ref()
    }

    pub fn settings(&self) -> DashboardSettings {
        self.inner.settings
    }

    pub fn selected_job_id(&self) -> Option<String> {
        self.state().selected_job_id.clone()
    }

    pub fn jobs(&self) -> Arc<Vec<SearchJob>> {
        self.state().registry.jobs()
    }

    pub fn job_status(&self, job_id: &str) -> Option<JobStatus> {
        self.state().registry.status_of(job_id)
    }

    pub fn candidates(&self) -> Vec<Candidate> {
        self.state().candidates.clone()
    }

    pub fn filter_progress(&self) -> Option<FilterProgress> {
        self.state().filter_progress
    }

    pub fn suggestions(&self) -> Vec<String> {
        self.state().suggestions.clone()
    }

    pub fn polling_job(&self) -> Option<String> {
        self.inner.poller.active_job()
    }

    pub fn is_polling(&self) -> bool {
        self.inner.poller.is_active()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let polling_job_id = self.polling_job();
        let state = self.state();
        DashboardSnapshot {
            selected_job_id: state.selected_job_id.clone(),
            jobs: state.registry.jobs().as_ref().clone(),
            candidates: state.candidates.clone(),
            filter_progress: state.filter_progress,
            last_filter: state.last_filter,
            suggestions: state.suggestions.clone(),
            polling_job_id,
        }
    }

    pub fn take_notifications(&self) -> Vec<Notification> {
        self.state().notifications.drain()
    }

    /// Every filter progress change, ending with `None` when a run finishes.
    pub fn subscribe_filter_progress(&self) -> broadcast::Receiver<Option<FilterProgress>> {
        self.inner.progress_tx.subscribe()
    }

    pub(crate) fn notify(&self, level: NotificationLevel, message: impl Into<String>) {
        self.state().notifications.push(level, message);
    }

    pub(crate) fn set_filter_progress(&self, progress: Option<FilterProgress>) {
        self.state().filter_progress = progress;
        // No subscribers is fine.
        let _ = self.inner.progress_tx.send(progress);
    }

    /// Fetch the job list. Failures keep the last known list.
    pub async fn refresh_jobs(&self) -> Arc<Vec<SearchJob>> {
        match self.api().list_jobs().await {
            Ok(jobs) => {
                let mut state = self.state();
                if state.registry.apply(jobs) {
                    debug!(count = state.registry.jobs().len(), "search jobs updated");
                }
                state.registry.jobs()
            }
            Err(e) => {
                warn!(error = %e, "failed to refresh search jobs");
                self.jobs()
            }
        }
    }

    /// Fetch candidates for `job_id`; the store only ever holds the selected job's list.
    pub async fn refresh_candidates(&self, job_id: &str, mode: RefreshMode) -> CandidateRefresh {
        match self.api().job_candidates(job_id).await {
            Ok(candidates) => {
                let mut state = self.state();
                if state.is_selected(job_id) {
                    state.candidates = candidates;
                    CandidateRefresh::Applied
                } else {
                    debug!(job_id, ?mode, "discarding candidates for a job that is no longer selected");
                    CandidateRefresh::Discarded
                }
            }
            Err(ApiError::NotFound(_)) => {
                self.handle_job_gone(job_id);
                CandidateRefresh::JobGone
            }
            Err(e) => {
                warn!(job_id, error = %e, "failed to refresh candidates");
                if mode == RefreshMode::Explicit {
                    self.notify(
                        NotificationLevel::Error,
                        format!("failed to load candidates: {e}"),
                    );
                }
                CandidateRefresh::Failed
            }
        }
    }

    fn handle_job_gone(&self, job_id: &str) {
        warn!(job_id, "search job not found, stopping polling");
        let mut state = self.state();
        let was_selected = state.is_selected(job_id);
        if was_selected {
            state.select(None);
        }
        drop(state);

        if was_selected {
            self.inner.poller.stop();
        } else {
            self.inner.poller.stop_if_bound_to(job_id);
        }
    }

    /// Optimistically hide a candidate. Unknown ids are a no-op.
    pub fn remove_candidate_locally(&self, candidate_id: i64) -> Option<Candidate> {
        let mut state = self.state();
        let index = state
            .candidates
            .iter()
            .position(|candidate| candidate.id == candidate_id)?;
        Some(state.candidates.remove(index))
    }

    /// Hide the candidate now and record the pass in the background.
    ///
    /// The server call can fail without bringing the candidate back.
    pub fn pass_candidate(&self, candidate_id: i64) -> bool {
        let Some(candidate) = self.remove_candidate_locally(candidate_id) else {
            return false;
        };
        let event = PassEvent::new(&candidate, self.selected_job_id());
        let api = Arc::clone(&self.inner.api);
        tokio::spawn(async move {
            if let Err(e) = api.track_pass(&event).await {
                warn!(candidate = %event.candidate_name, error = %e, "failed to track pass");
            }
        });
        true
    }

    /// Hide the candidate and hand it to the outreach flow.
    pub fn reach_out(&self, candidate_id: i64) -> Option<Candidate> {
        let candidate = self.remove_candidate_locally(candidate_id)?;
        info!(candidate_id, name = %candidate.name, "candidate moved to outreach");
        Some(candidate)
    }

    /// Switch the selected job: stop polling, swap the store, fetch candidates.
    pub async fn select_job(&self, job_id: &str) -> CandidateRefresh {
        self.inner.poller.stop();
        self.state().select(Some(job_id.to_string()));
        self.refresh_candidates(job_id, RefreshMode::Explicit).await
    }

    pub fn clear_selection(&self) {
        self.inner.poller.stop();
        self.state().select(None);
    }

    /// Fetch suggestions; kept only while `job_id` is still selected.
    pub async fn refresh_suggestions(&self, job_id: &str) {
        match self.api().suggestions(job_id).await {
            Ok(suggestions) => {
                let mut state = self.state();
                if state.is_selected(job_id) {
                    state.suggestions = suggestions;
                }
            }
            Err(e) => warn!(job_id, error = %e, "failed to fetch search suggestions"),
        }
    }

    /// One-shot suggestion fetch after the configured delay.
    pub(crate) fn schedule_suggestions(&self, job_id: &str) {
        let weak = Arc::downgrade(&self.inner);
        let delay = self.inner.settings.suggestions_delay;
        let job_id = job_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(inner) = weak.upgrade() {
                Dashboard { inner }.refresh_suggestions(&job_id).await;
            }
        });
    }

    /// Landing view: job list plus suggestions from the first completed job.
    pub async fn load_overview(&self) {
        let jobs = self.refresh_jobs().await;
        let Some(job) = jobs.iter().find(|job| job.status == JobStatus::Completed) else {
            return;
        };
        match self.api().suggestions(&job.job_id).await {
            Ok(suggestions) => self.state().suggestions = suggestions,
            Err(e) => warn!(job_id = %job.job_id, error = %e, "failed to fetch search suggestions"),
        }
    }

    /// Poll `job_id` every period, replacing any running poll.
    pub fn start_polling(&self, job_id: &str) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.poller.start(job_id, move |job_id| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            metrics::counter!("search_poll_ticks_total").increment(1);
            let dashboard = Dashboard { inner };
            // Ticks never wait on the previous tick's requests.
            tokio::spawn(async move { dashboard.poll_tick(&job_id).await });
        });
    }

    pub fn stop_polling(&self) {
        self.inner.poller.stop();
    }

    async fn poll_tick(&self, job_id: &str) {
        tokio::join!(
            self.refresh_jobs(),
            self.refresh_candidates(job_id, RefreshMode::Background)
        );
    }
}

//! Scripted in-memory research API for driving the dashboard in tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use vc_scout_dashboard::models::candidate::{Candidate, PassEvent};
use vc_scout_dashboard::models::filter::FilterBatch;
use vc_scout_dashboard::models::job::{JobProgress, JobStatus, SearchJob};
use vc_scout_dashboard::services::api::{ApiError, RemoteApi};
use vc_scout_dashboard::services::dashboard::{Dashboard, DashboardSettings};

/// One recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateJob(String),
    ListJobs,
    Candidates(String),
    Pause(String),
    Resume(String),
    Delete(String),
    FilterCount(String),
    FilterBatch(String),
    Suggestions(String),
    TrackPass(String),
}

/// Failure a scripted operation answers with.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Rejected(&'static str),
    Status(u16),
}

impl Failure {
    fn to_error(self) -> ApiError {
        match self {
            Failure::Rejected(reason) => ApiError::Rejected(reason.to_string()),
            Failure::Status(code) => ApiError::Status(code),
        }
    }
}

/// Operations a failure can be scripted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    List,
    Pause,
    Resume,
    Delete,
    FilterCount,
    TrackPass,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    jobs: Vec<SearchJob>,
    candidates: HashMap<String, Vec<Candidate>>,
    next_job: u32,
    filter_total: u64,
    batches: VecDeque<Result<FilterBatch, Failure>>,
    suggestions: Vec<String>,
    candidate_delays: HashMap<String, Duration>,
    failures: HashMap<Op, Failure>,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeState>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn check(&self, op: Op) -> Result<(), ApiError> {
        match self.state().failures.get(&op) {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    /// Register a job server-side with the given candidates.
    pub fn add_job(&self, job_id: &str, status: JobStatus, candidates: Vec<Candidate>) {
        let mut state = self.state();
        state.jobs.push(job(job_id, status, candidates.len() as u32));
        state.candidates.insert(job_id.to_string(), candidates);
    }

    pub fn set_status(&self, job_id: &str, status: JobStatus) {
        if let Some(job) = self.state().jobs.iter_mut().find(|j| j.job_id == job_id) {
            job.status = status;
        }
    }

    pub fn set_candidates(&self, job_id: &str, candidates: Vec<Candidate>) {
        let mut state = self.state();
        let count = candidates.len() as u32;
        if let Some(job) = state.jobs.iter_mut().find(|j| j.job_id == job_id) {
            job.candidate_count = count;
        }
        state.candidates.insert(job_id.to_string(), candidates);
    }

    /// Delete a job behind the client's back.
    pub fn remove_job(&self, job_id: &str) {
        let mut state = self.state();
        state.jobs.retain(|j| j.job_id != job_id);
        state.candidates.remove(job_id);
    }

    pub fn delay_candidates(&self, job_id: &str, delay: Duration) {
        self.state()
            .candidate_delays
            .insert(job_id.to_string(), delay);
    }

    pub fn fail(&self, op: Op, failure: Failure) {
        self.state().failures.insert(op, failure);
    }

    pub fn script_filter(&self, total: u64, batches: Vec<Result<FilterBatch, Failure>>) {
        let mut state = self.state();
        state.filter_total = total;
        state.batches = batches.into();
    }

    pub fn set_suggestions(&self, suggestions: &[&str]) {
        self.state().suggestions = suggestions.iter().map(|s| s.to_string()).collect();
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, call: &Call) -> usize {
        self.state().calls.iter().filter(|c| *c == call).count()
    }

    pub fn position(&self, call: &Call) -> Option<usize> {
        self.state().calls.iter().position(|c| c == call)
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    fn record(&self, call: Call) {
        self.state().calls.push(call);
    }
}

#[async_trait::async_trait]
impl RemoteApi for FakeApi {
    async fn create_job(&self, query: &str) -> Result<String, ApiError> {
        self.record(Call::CreateJob(query.to_string()));
        self.check(Op::Create)?;
        let mut state = self.state();
        state.next_job += 1;
        let job_id = format!("job-{}", state.next_job);
        let mut created = job(&job_id, JobStatus::Pending, 0);
        created.query = query.to_string();
        state.jobs.push(created);
        state.candidates.insert(job_id.clone(), Vec::new());
        Ok(job_id)
    }

    async fn list_jobs(&self) -> Result<Vec<SearchJob>, ApiError> {
        self.record(Call::ListJobs);
        self.check(Op::List)?;
        Ok(self.state().jobs.clone())
    }

    async fn job_candidates(&self, job_id: &str) -> Result<Vec<Candidate>, ApiError> {
        self.record(Call::Candidates(job_id.to_string()));
        let delay = self.state().candidate_delays.get(job_id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let found = self.state().candidates.get(job_id).cloned();
        found.ok_or_else(|| ApiError::NotFound(job_id.to_string()))
    }

    async fn pause_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.record(Call::Pause(job_id.to_string()));
        self.check(Op::Pause)?;
        self.set_status(job_id, JobStatus::Paused);
        Ok(())
    }

    async fn resume_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.record(Call::Resume(job_id.to_string()));
        self.check(Op::Resume)?;
        self.set_status(job_id, JobStatus::Running);
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<(), ApiError> {
        self.record(Call::Delete(job_id.to_string()));
        self.check(Op::Delete)?;
        self.remove_job(job_id);
        Ok(())
    }

    async fn filter_count(&self, job_id: &str) -> Result<u64, ApiError> {
        self.record(Call::FilterCount(job_id.to_string()));
        self.check(Op::FilterCount)?;
        let total = self.state().filter_total;
        Ok(total)
    }

    async fn filter_batch(&self, job_id: &str) -> Result<FilterBatch, ApiError> {
        self.record(Call::FilterBatch(job_id.to_string()));
        let next = self.state().batches.pop_front();
        match next {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Ok(FilterBatch {
                done: true,
                ..FilterBatch::default()
            }),
        }
    }

    async fn suggestions(&self, job_id: &str) -> Result<Vec<String>, ApiError> {
        self.record(Call::Suggestions(job_id.to_string()));
        let suggestions = self.state().suggestions.clone();
        Ok(suggestions)
    }

    async fn track_pass(&self, event: &PassEvent) -> Result<(), ApiError> {
        self.record(Call::TrackPass(event.candidate_name.clone()));
        self.check(Op::TrackPass)
    }
}

pub fn job(job_id: &str, status: JobStatus, candidate_count: u32) -> SearchJob {
    SearchJob {
        job_id: job_id.to_string(),
        query: format!("query for {job_id}"),
        status,
        progress: JobProgress::default(),
        candidate_count,
        created_at: None,
        started_at: None,
        completed_at: None,
    }
}

pub fn candidate(id: i64, name: &str) -> Candidate {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "linkedin_url": format!("https://linkedin.com/in/{id}"),
        "current_company": "Acme Robotics"
    }))
    .unwrap()
}

pub fn candidates(ids: &[i64]) -> Vec<Candidate> {
    ids.iter()
        .map(|id| candidate(*id, &format!("Candidate {id}")))
        .collect()
}

pub fn batch(processed: u64, filtered_count: u64, done: bool) -> Result<FilterBatch, Failure> {
    Ok(FilterBatch {
        processed,
        filtered_count,
        done,
    })
}

pub fn dashboard(api: &Arc<FakeApi>) -> Dashboard {
    let api: Arc<dyn RemoteApi> = api.clone();
    Dashboard::new(api, DashboardSettings::default())
}

pub fn candidate_ids(dashboard: &Dashboard) -> Vec<i64> {
    dashboard.candidates().iter().map(|c| c.id).collect()
}

/// Let spawned tasks run; under a paused clock this returns once they are idle.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

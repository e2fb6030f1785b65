use garde::Validate;
use serde::{Deserialize, Serialize};

use crate::models::candidate::Candidate;
use crate::models::filter::{FilterProgress, FilterSummary};
use crate::models::job::SearchJob;

/// Request to start a new candidate search.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitSearchRequest {
    #[garde(length(min = 1, max = 500))]
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitSearchResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct FilterStartedResponse {
    pub job_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReachOutResponse {
    pub candidate: Candidate,
}

/// Everything the presentation layer renders.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub selected_job_id: Option<String>,
    pub jobs: Vec<SearchJob>,
    pub candidates: Vec<Candidate>,
    pub filter_progress: Option<FilterProgress>,
    pub last_filter: Option<FilterSummary>,
    pub suggestions: Vec<String>,
    pub polling_job_id: Option<String>,
}

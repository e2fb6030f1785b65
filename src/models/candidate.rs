use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::job::lenient_timestamp;

/// A person surfaced by a search job. Profile fields are display data only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub current_company: Option<String>,
    #[serde(default)]
    pub current_title: Option<String>,
    #[serde(default)]
    pub company_headcount: Option<String>,
    #[serde(default)]
    pub tenure_years: Option<f64>,
    #[serde(default)]
    pub detected_industries: Vec<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub personal_email: Option<String>,
    #[serde(default)]
    pub email_status: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub enrichment_status: Option<String>,
    #[serde(default)]
    pub ai_fit_score: Option<f64>,
    #[serde(default)]
    pub ai_reasoning: Option<String>,
    #[serde(default)]
    pub ai_key_strengths: Vec<String>,
    #[serde(default)]
    pub ai_concerns: Vec<String>,
    #[serde(default)]
    pub ai_talking_points: Vec<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Payload recorded server-side when the user passes on a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PassEvent {
    pub candidate_name: String,
    pub candidate_linkedin_url: Option<String>,
    pub current_title: Option<String>,
    pub current_company: Option<String>,
    pub headline: Option<String>,
    pub search_id: Option<String>,
}

impl PassEvent {
    pub fn new(candidate: &Candidate, search_id: Option<String>) -> Self {
        Self {
            candidate_name: candidate.name.clone(),
            candidate_linkedin_url: candidate.linkedin_url.clone(),
            current_title: candidate.current_title.clone(),
            current_company: candidate.current_company.clone(),
            headline: candidate.headline.clone(),
            search_id,
        }
    }
}

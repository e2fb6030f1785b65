use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

/// Status of a search job as reported by the research API.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Paused,
    /// Older API builds report a paused job as `cancelled`.
    Cancelled,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// `cancelled` is displayed and handled exactly like `paused`.
    pub fn is_paused(self) -> bool {
        matches!(self, JobStatus::Paused | JobStatus::Cancelled)
    }

    /// Label shown to the user.
    pub fn display_label(self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Paused | JobStatus::Cancelled => "paused",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unknown => "unknown",
        }
    }
}

/// Progress counters; monotonic while the job runs, frozen otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JobProgress {
    pub searches_completed: u32,
    pub searches_total: u32,
    pub candidates_found: u32,
    pub candidates_filtered: u32,
    pub current_phase: String,
}

/// A server-tracked candidate search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchJob {
    pub job_id: String,
    #[serde(default)]
    pub query: String,
    pub status: JobStatus,
    #[serde(default)]
    pub progress: JobProgress,
    #[serde(default)]
    pub candidate_count: u32,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl SearchJob {
    /// Fields whose change is worth re-rendering the job list for.
    pub fn differs_from(&self, other: &SearchJob) -> bool {
        self.job_id != other.job_id
            || self.status != other.status
            || self.candidate_count != other.candidate_count
    }
}

/// Accepts RFC 3339 as well as the naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` form
/// the API emits, reading the latter as UTC. Unparseable values become `None`.
pub(crate) fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_cancelled_is_paused_alias() {
        let status: JobStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, JobStatus::Cancelled);
        assert!(status.is_paused());
        assert_eq!(status.display_label(), "paused");
        assert!(!JobStatus::Running.is_paused());
    }

    #[test]
    fn test_unknown_status_does_not_fail_parsing() {
        let status: JobStatus = serde_json::from_str("\"archived\"").unwrap();
        assert_eq!(status, JobStatus::Unknown);
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(JobStatus::Completed.to_string(), "completed");
        assert_eq!(JobStatus::from_str("running").unwrap(), JobStatus::Running);
    }

    #[test]
    fn test_search_job_with_naive_timestamps() {
        let job: SearchJob = serde_json::from_value(serde_json::json!({
            "job_id": "job-1",
            "query": "ai founders",
            "status": "running",
            "progress": { "searches_completed": 2, "searches_total": 8, "current_phase": "scoring" },
            "candidate_count": 3,
            "created_at": "2025-01-02T03:04:05.123456",
            "started_at": "2025-01-02T03:04:06+00:00",
            "completed_at": null
        }))
        .unwrap();

        assert_eq!(job.progress.searches_completed, 2);
        assert_eq!(job.progress.candidates_found, 0);
        assert_eq!(job.created_at.unwrap().timestamp(), 1735787045);
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn test_garbage_timestamp_is_dropped() {
        assert!(parse_timestamp("yesterday").is_none());
    }
}

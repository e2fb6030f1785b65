use std::sync::Arc;

use crate::models::job::{JobStatus, SearchJob};

/// Latest server-reported list of search jobs.
///
/// The list lives behind an `Arc` so an unchanged refresh can keep handing
/// out the same allocation; consumers compare with `Arc::ptr_eq` to skip
/// redundant re-renders.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Arc<Vec<SearchJob>>,
}

impl JobRegistry {
    pub fn jobs(&self) -> Arc<Vec<SearchJob>> {
        Arc::clone(&self.jobs)
    }

    pub fn get(&self, job_id: &str) -> Option<&SearchJob> {
        self.jobs.iter().find(|job| job.job_id == job_id)
    }

    pub fn status_of(&self, job_id: &str) -> Option<JobStatus> {
        self.get(job_id).map(|job| job.status)
    }

    /// Store a freshly fetched list. Returns `true` if the stored list was replaced.
    pub fn apply(&mut self, fresh: Vec<SearchJob>) -> bool {
        if !has_changes(&self.jobs, &fresh) {
            return false;
        }
        self.jobs = Arc::new(fresh);
        true
    }

    /// Drop a job locally after a confirmed delete.
    pub fn remove(&mut self, job_id: &str) -> bool {
        if self.get(job_id).is_none() {
            return false;
        }
        let remaining = self
            .jobs
            .iter()
            .filter(|job| job.job_id != job_id)
            .cloned()
            .collect();
        self.jobs = Arc::new(remaining);
        true
    }
}

/// Positional diff on the fields the job list renders from.
pub fn has_changes(current: &[SearchJob], fresh: &[SearchJob]) -> bool {
    current.len() != fresh.len()
        || current
            .iter()
            .zip(fresh)
            .any(|(old, new)| old.differs_from(new))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobProgress;

    fn job(id: &str, status: JobStatus, candidate_count: u32) -> SearchJob {
        SearchJob {
            job_id: id.to_string(),
            query: format!("query for {id}"),
            status,
            progress: JobProgress::default(),
            candidate_count,
            created_at: None,
            started_at: None,
            completed_at: None,
        }
    }

    #[test]
    fn test_identical_refresh_keeps_list() {
        let mut registry = JobRegistry::default();
        assert!(registry.apply(vec![job("a", JobStatus::Running, 3)]));
        let before = registry.jobs();

        assert!(!registry.apply(vec![job("a", JobStatus::Running, 3)]));
        assert!(Arc::ptr_eq(&before, &registry.jobs()));
    }

    #[test]
    fn test_progress_only_change_is_ignored() {
        let mut registry = JobRegistry::default();
        registry.apply(vec![job("a", JobStatus::Running, 3)]);
        let before = registry.jobs();

        let mut moved = job("a", JobStatus::Running, 3);
        moved.progress.searches_completed = 5;
        assert!(!registry.apply(vec![moved]));
        assert!(Arc::ptr_eq(&before, &registry.jobs()));
    }

    #[test]
    fn test_status_or_count_change_replaces_list() {
        let mut registry = JobRegistry::default();
        registry.apply(vec![job("a", JobStatus::Running, 3)]);

        assert!(registry.apply(vec![job("a", JobStatus::Paused, 3)]));
        assert_eq!(registry.status_of("a"), Some(JobStatus::Paused));

        assert!(registry.apply(vec![job("a", JobStatus::Paused, 4)]));
        assert_eq!(registry.get("a").unwrap().candidate_count, 4);
    }

    #[test]
    fn test_length_change_replaces_list() {
        let mut registry = JobRegistry::default();
        registry.apply(vec![job("a", JobStatus::Running, 3)]);

        assert!(registry.apply(vec![
            job("a", JobStatus::Running, 3),
            job("b", JobStatus::Pending, 0),
        ]));
        assert_eq!(registry.jobs().len(), 2);
    }

    #[test]
    fn test_swapped_job_with_same_status_replaces_list() {
        let mut registry = JobRegistry::default();
        registry.apply(vec![job("a", JobStatus::Running, 3)]);
        let before = registry.jobs();

        assert!(registry.apply(vec![job("b", JobStatus::Running, 3)]));
        assert!(!Arc::ptr_eq(&before, &registry.jobs()));
        assert!(registry.get("a").is_none());
        assert!(registry.get("b").is_some());
    }

    #[test]
    fn test_remove() {
        let mut registry = JobRegistry::default();
        registry.apply(vec![job("a", JobStatus::Running, 3), job("b", JobStatus::Paused, 1)]);

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.jobs().len(), 1);
        assert!(registry.get("b").is_some());
    }

    #[test]
    fn test_empty_refresh_on_empty_registry_is_noop() {
        let mut registry = JobRegistry::default();
        let before = registry.jobs();
        assert!(!registry.apply(Vec::new()));
        assert!(Arc::ptr_eq(&before, &registry.jobs()));
    }
}

use crate::core::processor::{BatchEvent, CommentProcessor};
use crate::core::{CommentSource, TrackingStore};
use crate::domain::model::{Status, TrackingResult};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

pub type SharedProcessor = Arc<CommentProcessor<dyn CommentSource, dyn TrackingStore>>;

#[derive(Debug, Clone)]
pub struct Job {
    pub is_running: bool,
    pub progress: usize,
    pub total: usize,
    pub current_url: String,
    pub results: Vec<TrackingResult>,
    pub error: Option<String>,
    pub started_at: Instant,
}

impl Job {
    fn new(total: usize) -> Self {
        Self {
            is_running: true,
            progress: 0,
            total,
            current_url: String::new(),
            results: Vec::new(),
            error: None,
            started_at: Instant::now(),
        }
    }
}

/// Body of `GET /api/status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobStatus {
    pub is_running: bool,
    pub progress: usize,
    pub total: usize,
    pub current_url: String,
    pub results_count: usize,
    pub error: Option<String>,
}

impl From<&Job> for JobStatus {
    fn from(job: &Job) -> Self {
        Self {
            is_running: job.is_running,
            progress: job.progress,
            total: job.total,
            current_url: job.current_url.clone(),
            results_count: job.results.len(),
            error: job.error.clone(),
        }
    }
}

/// One tracking job per browser session.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<String, Job>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Job>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Job>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.read()
            .get(session_id)
            .map(|job| job.is_running)
            .unwrap_or(false)
    }

    /// Registers a fresh job, replacing a finished one. Returns `false` when the
    /// session already has a running job.
    pub fn try_start(&self, session_id: &str, total: usize) -> bool {
        let mut jobs = self.write();
        if jobs.get(session_id).is_some_and(|job| job.is_running) {
            return false;
        }
        jobs.insert(session_id.to_string(), Job::new(total));
        true
    }

    pub fn status(&self, session_id: &str) -> JobStatus {
        self.read()
            .get(session_id)
            .map(JobStatus::from)
            .unwrap_or_default()
    }

    pub fn results(&self, session_id: &str) -> Vec<TrackingResult> {
        self.read()
            .get(session_id)
            .map(|job| job.results.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn update<F: FnOnce(&mut Job)>(&self, session_id: &str, f: F) {
        // 已被清理的工作不再更新
        if let Some(job) = self.write().get_mut(session_id) {
            f(job);
        }
    }

    pub fn record(&self, session_id: &str, event: BatchEvent<'_>) {
        self.update(session_id, |job| match event {
            BatchEvent::Started { index, url } => {
                job.progress = index;
                job.current_url = url.to_string();
            }
            BatchEvent::Finished(result) => job.results.push(result.clone()),
        });
    }

    pub fn finish(&self, session_id: &str) {
        self.update(session_id, |job| {
            job.progress = job.total;
            job.is_running = false;
        });
    }

    pub fn fail(&self, session_id: &str, error: String) {
        self.update(session_id, |job| {
            job.error = Some(error);
            job.is_running = false;
        });
    }

    /// Removes jobs started more than `ttl` ago and returns their session ids.
    pub fn purge_older_than(&self, ttl: Duration) -> Vec<String> {
        self.purge_expired_at(ttl, Instant::now())
    }

    fn purge_expired_at(&self, ttl: Duration, now: Instant) -> Vec<String> {
        let mut jobs = self.write();
        let expired: Vec<String> = jobs
            .iter()
            .filter(|(_, job)| now.saturating_duration_since(job.started_at) > ttl)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &expired {
            jobs.remove(id);
            tracing::info!("Cleaned up old job: {}", id);
        }
        expired
    }

    pub fn spawn_cleanup(&self, interval: Duration, ttl: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // 第一次 tick 會立即觸發
            ticker.tick().await;
            loop {
                ticker.tick().await;
                registry.purge_older_than(ttl);
            }
        })
    }

    /// Processes `comment_urls` in the background for `session_id`. The job must
    /// have been registered with [`JobRegistry::try_start`].
    pub fn spawn_job(
        &self,
        session_id: String,
        comment_urls: Vec<String>,
        processor: SharedProcessor,
    ) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let worker = {
                let registry = registry.clone();
                let session_id = session_id.clone();
                tokio::spawn(async move {
                    processor
                        .process_batch_with_progress(&comment_urls, Status::Error, |event| {
                            registry.record(&session_id, event)
                        })
                        .await
                })
            };

            match worker.await {
                Ok(results) => {
                    tracing::info!(
                        "Job for session {} finished with {} results",
                        session_id,
                        results.len()
                    );
                    registry.finish(&session_id);
                }
                Err(e) => {
                    tracing::error!("Background task error: {}", e);
                    registry.fail(&session_id, e.to_string());
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(url: &str) -> TrackingResult {
        TrackingResult::fallback(url, Status::Error)
    }

    #[test]
    fn test_one_running_job_per_session() {
        let registry = JobRegistry::new();
        assert!(registry.try_start("s1", 2));
        assert!(!registry.try_start("s1", 3));
        assert!(registry.try_start("s2", 1));
        assert_eq!(registry.len(), 2);

        registry.finish("s1");
        assert!(!registry.is_running("s1"));
        assert!(registry.try_start("s1", 5));
        assert_eq!(registry.status("s1").total, 5);
    }

    #[test]
    fn test_events_update_status() {
        let registry = JobRegistry::new();
        registry.try_start("s", 2);

        registry.record("s", BatchEvent::Started { index: 1, url: "u2" });
        let first = result("u1");
        registry.record("s", BatchEvent::Finished(&first));

        let status = registry.status("s");
        assert!(status.is_running);
        assert_eq!(status.progress, 1);
        assert_eq!(status.current_url, "u2");
        assert_eq!(status.results_count, 1);

        registry.finish("s");
        let status = registry.status("s");
        assert_eq!(status.progress, 2);
        assert!(!status.is_running);
        assert_eq!(registry.results("s"), vec![first]);
    }

    #[test]
    fn test_unknown_session_has_empty_status() {
        let registry = JobRegistry::new();
        registry.record("ghost", BatchEvent::Started { index: 0, url: "u" });
        assert_eq!(registry.status("ghost"), JobStatus::default());
        assert!(registry.results("ghost").is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_purge_removes_expired_jobs() {
        let registry = JobRegistry::new();
        registry.try_start("old", 1);
        registry.try_start("new", 1);
        let later = Instant::now() + Duration::from_secs(7200);
        registry.update("new", |job| job.started_at = later);

        let purged = registry.purge_expired_at(Duration::from_secs(3600), later);
        assert_eq!(purged, vec!["old".to_string()]);
        assert_eq!(registry.len(), 1);
        assert!(registry.is_running("new"));
    }

    #[test]
    fn test_fail_records_error() {
        let registry = JobRegistry::new();
        registry.try_start("s", 1);
        registry.fail("s", "boom".to_string());
        let status = registry.status("s");
        assert!(!status.is_running);
        assert_eq!(status.error.as_deref(), Some("boom"));
    }
}

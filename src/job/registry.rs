//! In-memory job registry.
//!
//! The only state shared across orchestration tasks. Each record is an
//! `Arc<RwLock<Job>>`: one writer (the job's orchestration task) plus any
//! number of polling readers. Every transition happens inside a single
//! write-lock critical section, so a reader can never observe a status
//! without its dependent field.
//!
//! No deletion, no eviction: jobs accumulate for process lifetime.

use crate::job::types::{Job, JobSpec, JobView};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to one job record.
pub type JobHandle = Arc<RwLock<Job>>;

/// Map of job id → job record. Construct once at startup and pass by
/// reference; there is no ambient instance.
#[derive(Default)]
pub struct JobRegistry {
    jobs: RwLock<HashMap<String, JobHandle>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pending job and return its id together with the view the
    /// creating request reports back.
    pub async fn create(&self, spec: JobSpec) -> (String, JobView) {
        let job = Job::new(spec);
        let id = job.id.clone();
        let view = job.view();
        self.jobs
            .write()
            .await
            .insert(id.clone(), Arc::new(RwLock::new(job)));
        (id, view)
    }

    /// O(1) lookup of the shared record.
    pub async fn get(&self, id: &str) -> Option<JobHandle> {
        self.jobs.read().await.get(id).cloned()
    }

    /// Snapshot the polling projection of a job.
    pub async fn view(&self, id: &str) -> Option<JobView> {
        let handle = self.get(id).await?;
        let view = handle.read().await.view();
        Some(view)
    }

    /// Number of jobs ever created (registry never shrinks).
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

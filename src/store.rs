use crate::error::JobError;
use crate::job::{Job, JobId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

pub type JobStoreRef = Arc<dyn JobStore>;

/// A mutation applied to one job record under its lock. Returns whether it
/// actually changed the record, so callers can distinguish an applied
/// transition from a stale no-op.
pub type JobMutation = Box<dyn FnOnce(&mut Job) -> bool + Send>;

/// Authoritative table of job records. Mutation of a single job is mutually
/// exclusive; different jobs never contend with each other.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Insert a freshly created record. Identifiers are never reused, so a
    /// collision is a caller bug and is rejected.
    async fn insert(&self, job: Job) -> Result<(), JobError>;

    /// Snapshot of the record, if it exists.
    async fn get(&self, job_id: &JobId) -> Option<Job>;

    /// Apply `mutate` under the job's lock. Returns `(applied, snapshot)`
    /// with the post-mutation snapshot, or `None` for an unknown id.
    async fn update(&self, job_id: &JobId, mutate: JobMutation) -> Option<(bool, Job)>;

    async fn len(&self) -> usize;
}

/// Volatile in-memory store. Each record sits behind its own mutex; the
/// outer map lock is only held long enough to clone the entry handle.
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<JobId, Arc<Mutex<Job>>>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
        }
    }

    async fn entry(&self, job_id: &JobId) -> Option<Arc<Mutex<Job>>> {
        self.jobs.read().await.get(job_id).cloned()
    }
}

impl Default for InMemoryJobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn insert(&self, job: Job) -> Result<(), JobError> {
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&job.job_id) {
            return Err(JobError::Validation(format!(
                "job id already exists: {}",
                job.job_id
            )));
        }
        jobs.insert(job.job_id.clone(), Arc::new(Mutex::new(job)));
        Ok(())
    }

    async fn get(&self, job_id: &JobId) -> Option<Job> {
        let entry = self.entry(job_id).await?;
        let job = entry.lock().await;
        Some(job.clone())
    }

    async fn update(&self, job_id: &JobId, mutate: JobMutation) -> Option<(bool, Job)> {
        let entry = self.entry(job_id).await?;
        let mut job = entry.lock().await;
        let applied = mutate(&mut job);
        Some((applied, job.clone()))
    }

    async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }
}

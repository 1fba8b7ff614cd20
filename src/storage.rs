use std::path::PathBuf;

use ahash::AHashMap;
use anyhow::Context;
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::jobs::Job;

/// Durable mirror of job metadata. The engine writes through it at creation,
/// on terminal transitions, at periodic checkpoints and on deletion.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn save_job(&self, job: &Job) -> anyhow::Result<()>;
    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>>;
    async fn delete_job(&self, id: &str) -> anyhow::Result<()>;
    /// Bulk checkpoint of everything currently known to the store.
    async fn save(&self) -> anyhow::Result<()>;
}

/// Job store backed by a single JSON file mapping job id to job record.
pub struct FileJobStore {
    path: PathBuf,
    jobs: RwLock<AHashMap<String, Job>>,
    flush_lock: Mutex<()>,
}

impl FileJobStore {
    /// Open the store, loading any previously persisted jobs.
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let mut jobs = AHashMap::new();
        if path.exists() {
            let data = std::fs::read(&path)
                .with_context(|| format!("failed to read job store {}", path.display()))?;
            if !data.is_empty() {
                jobs = serde_json::from_slice(&data)
                    .with_context(|| format!("failed to parse job store {}", path.display()))?;
                tracing::info!(count = jobs.len(), path = %path.display(), "loaded persisted jobs");
            }
        } else {
            tracing::info!(path = %path.display(), "creating new job store");
        }
        Ok(Self { path, jobs: RwLock::new(jobs), flush_lock: Mutex::new(()) })
    }

    // Serialize under the lock, write without it.
    fn snapshot(&self) -> anyhow::Result<Vec<u8>> {
        let jobs = self.jobs.read();
        Ok(serde_json::to_vec_pretty(&*jobs)?)
    }

    // Flushes are serialized and go through a temp file followed by a
    // rename, so a reader never observes a partially written store and
    // concurrent runners cannot interleave writes.
    async fn flush(&self) -> anyhow::Result<()> {
        let _guard = self.flush_lock.lock().await;
        let bytes = self.snapshot()?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, bytes)
            .await
            .with_context(|| format!("failed to write job store {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("failed to replace job store {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl JobStore for FileJobStore {
    async fn save_job(&self, job: &Job) -> anyhow::Result<()> {
        tracing::debug!(job_id = %job.id, "saving job");
        self.jobs.write().insert(job.id.clone(), job.clone());
        self.flush().await
    }

    async fn list_jobs(&self) -> anyhow::Result<Vec<Job>> {
        Ok(self.jobs.read().values().cloned().collect())
    }

    async fn delete_job(&self, id: &str) -> anyhow::Result<()> {
        if self.jobs.write().remove(id).is_none() {
            anyhow::bail!("job not found: {id}");
        }
        tracing::debug!(job_id = %id, "deleted job from store");
        self.flush().await
    }

    async fn save(&self) -> anyhow::Result<()> {
        self.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::{JobStatus, JobType};

    #[tokio::test]
    async fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let store = FileJobStore::open(&path).unwrap();
        let mut job = Job::new("deadbeef".into(), "http://example.com", "wl-1", JobType::Directory);
        job.status = JobStatus::Completed;
        job.progress = 100;
        store.save_job(&job).await.unwrap();

        let reopened = FileJobStore::open(&path).unwrap();
        let jobs = reopened.list_jobs().await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "deadbeef");
        assert_eq!(jobs[0].status, JobStatus::Completed);
        assert_eq!(jobs[0].progress, 100);
    }

    #[tokio::test]
    async fn delete_removes_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");

        let store = FileJobStore::open(&path).unwrap();
        let job = Job::new("cafe0001".into(), "http://example.com", "wl-1", JobType::Subdomain);
        store.save_job(&job).await.unwrap();
        store.delete_job("cafe0001").await.unwrap();

        assert!(store.delete_job("cafe0001").await.is_err());
        let reopened = FileJobStore::open(&path).unwrap();
        assert!(reopened.list_jobs().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_saves_keep_the_file_parseable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.json");
        let store = std::sync::Arc::new(FileJobStore::open(&path).unwrap());

        let mut handles = Vec::new();
        for i in 0..16u64 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let job = Job::new(
                    format!("{i:016x}"),
                    "http://example.com",
                    "wl-1",
                    JobType::Directory,
                );
                store.save_job(&job).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let reopened = FileJobStore::open(&path).unwrap();
        assert_eq!(reopened.list_jobs().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn open_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJobStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.list_jobs().await.unwrap().is_empty());
    }
}

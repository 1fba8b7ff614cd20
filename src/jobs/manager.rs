use std::sync::Arc;

use ahash::AHashMap;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, EngineResult};
use crate::jobs::{Finding, Job, JobStatus, JobType};
use crate::limiter::ProbeLimiter;
use crate::probe::{self, ProbeClient};
use crate::storage::JobStore;
use crate::utils::generate_id;
use crate::wordlist::WordlistProvider;

#[derive(Debug, Clone)]
pub struct JobManagerOptions {
    /// Probes per second, shared across every running job.
    pub rate_limit: f64,
    /// Bulk-checkpoint the store every N wordlist entries.
    pub checkpoint_interval: usize,
    /// How many levels of follow-up jobs a subdomain hit may spawn.
    /// Zero disables expansion entirely.
    pub max_recursion_depth: usize,
}

impl Default for JobManagerOptions {
    fn default() -> Self {
        Self { rate_limit: 10.0, checkpoint_interval: 100, max_recursion_depth: 3 }
    }
}

/// Single source of truth for job existence and state.
///
/// The registry table is the one shared mutable resource: runners mutate
/// their job only through methods here, under the table's write lock, so
/// listing jobs always sees a consistent snapshot.
pub struct JobManager {
    jobs: RwLock<AHashMap<String, Job>>,
    cancels: DashMap<String, CancellationToken>,
    store: Arc<dyn JobStore>,
    wordlists: Arc<dyn WordlistProvider>,
    limiter: ProbeLimiter,
    client: ProbeClient,
    shutdown: CancellationToken,
    checkpoint_interval: usize,
    max_recursion_depth: usize,
}

impl JobManager {
    pub fn new(
        store: Arc<dyn JobStore>,
        wordlists: Arc<dyn WordlistProvider>,
        client: ProbeClient,
        shutdown: CancellationToken,
        options: JobManagerOptions,
    ) -> Arc<Self> {
        tracing::info!(rate_limit = options.rate_limit, "created job manager");
        Arc::new(Self {
            jobs: RwLock::new(AHashMap::new()),
            cancels: DashMap::new(),
            store,
            wordlists,
            limiter: ProbeLimiter::new(options.rate_limit),
            client,
            shutdown,
            checkpoint_interval: options.checkpoint_interval.max(1),
            max_recursion_depth: options.max_recursion_depth,
        })
    }

    /// Register a new job and hand it to a runner task. Returns as soon as
    /// the job exists; the run itself proceeds in the background.
    ///
    /// A failed initial persist rolls the job back out of memory. An unknown
    /// wordlist leaves the job registered but immediately Failed, so callers
    /// can still see the attempt.
    pub async fn start_job(
        self: &Arc<Self>,
        target: &str,
        wordlist_id: &str,
        kind: JobType,
    ) -> EngineResult<String> {
        let job = Job::new(generate_id(), target, wordlist_id, kind);
        let id = job.id.clone();
        tracing::info!(job_id = %id, %target, kind = %kind, "starting new job");

        self.jobs.write().insert(id.clone(), job.clone());
        if let Err(e) = self.store.save_job(&job).await {
            self.jobs.write().remove(&id);
            tracing::error!(job_id = %id, error = %e, "failed to persist new job");
            return Err(EngineError::Persistence(e));
        }

        if self.wordlists.get(wordlist_id).is_none() {
            tracing::error!(job_id = %id, wordlist_id, "wordlist not found");
            self.transition(&id, JobStatus::Failed).await;
            return Err(EngineError::WordlistNotFound(wordlist_id.to_string()));
        }

        self.spawn_runner(id.clone(), 0);
        Ok(id)
    }

    /// Request cooperative cancellation of a running job. A no-op success on
    /// jobs that already reached a terminal state.
    pub async fn stop_job(&self, id: &str) -> EngineResult<()> {
        if !self.jobs.read().contains_key(id) {
            tracing::error!(job_id = %id, "attempted to stop unknown job");
            return Err(EngineError::JobNotFound(id.to_string()));
        }
        tracing::info!(job_id = %id, "stopping job");
        if let Some(token) = self.cancels.get(id) {
            token.cancel();
        }
        self.transition(id, JobStatus::Stopped).await;
        Ok(())
    }

    /// Remove a job from memory and from the store. A still-running job is
    /// force-stopped first: its token is cancelled before the entry goes
    /// away, so the runner's remaining writes hit a missing entry and no-op.
    pub async fn delete_job(&self, id: &str) -> EngineResult<()> {
        if let Some((_, token)) = self.cancels.remove(id) {
            token.cancel();
        }
        if self.jobs.write().remove(id).is_none() {
            tracing::error!(job_id = %id, "attempted to delete unknown job");
            return Err(EngineError::JobNotFound(id.to_string()));
        }
        tracing::info!(job_id = %id, "deleting job");
        if let Err(e) = self.store.delete_job(id).await {
            tracing::warn!(job_id = %id, error = %e, "failed to delete job from store");
        }
        if let Err(e) = self.store.save().await {
            tracing::warn!(error = %e, "failed to checkpoint store after delete");
        }
        Ok(())
    }

    /// Snapshot of all known jobs. Persisted jobs we have no memory of
    /// (usually from a previous run) are merged in first; in-memory entries
    /// always win.
    pub async fn get_jobs(&self) -> Vec<Job> {
        match self.store.list_jobs().await {
            Ok(stored) => {
                let mut jobs = self.jobs.write();
                for job in stored {
                    jobs.entry(job.id.clone()).or_insert(job);
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to list persisted jobs"),
        }
        let jobs = self.jobs.read();
        tracing::debug!(count = jobs.len(), "listing jobs");
        jobs.values().cloned().collect()
    }

    pub fn get_job(&self, id: &str) -> EngineResult<Job> {
        self.jobs
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::JobNotFound(id.to_string()))
    }

    pub fn update_rate_limit(&self, rate: f64) {
        tracing::info!(old = self.limiter.rate(), new = rate, "updating rate limit");
        self.limiter.set_rate(rate);
    }

    fn spawn_runner(self: &Arc<Self>, id: String, depth: usize) {
        let token = self.shutdown.child_token();
        self.cancels.insert(id.clone(), token.clone());
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            manager.run_job(&id, token, depth).await;
            manager.cancels.remove(&id);
        });
    }

    /// The per-job runner: walk the wordlist, probing each entry under the
    /// shared limiter, and finish with exactly one terminal transition.
    async fn run_job(self: &Arc<Self>, id: &str, token: CancellationToken, depth: usize) {
        let Some((target, wordlist_id, kind)) = self
            .jobs
            .read()
            .get(id)
            .map(|j| (j.target.clone(), j.wordlist_id.clone(), j.kind))
        else {
            return;
        };
        tracing::info!(job_id = %id, %target, kind = %kind, "running job");

        let Some(wordlist) = self.wordlists.get(&wordlist_id) else {
            // Lost a race with wordlist removal after registration.
            tracing::error!(job_id = %id, wordlist_id = %wordlist_id, "wordlist vanished before run");
            self.transition(id, JobStatus::Failed).await;
            return;
        };
        let total = wordlist.words.len();

        for (i, word) in wordlist.words.iter().enumerate() {
            if token.is_cancelled() {
                tracing::info!(job_id = %id, "job stopped");
                self.transition(id, JobStatus::Stopped).await;
                return;
            }
            if !self.limiter.acquire(&token).await {
                // Cancelled while waiting for a token: skip the entry; the
                // next loop check performs the stop transition.
                continue;
            }

            self.set_progress(id, progress_pct(i + 1, total));

            match kind {
                JobType::Directory => {
                    if let Some(url) = probe::directory::check(&self.client, &target, word).await {
                        tracing::info!(job_id = %id, %url, "directory found");
                        self.add_finding(id, url, kind);
                    }
                }
                JobType::Subdomain => {
                    if let Some(url) = probe::vhost::check(&self.client, &target, word).await {
                        tracing::info!(job_id = %id, %url, "virtual host found");
                        self.add_finding(id, url.clone(), kind);
                        self.spawn_discovered(&url, &wordlist_id, depth).await;
                    }
                }
            }

            if i % self.checkpoint_interval == 0 {
                if let Err(e) = self.store.save().await {
                    tracing::warn!(job_id = %id, error = %e, "checkpoint save failed");
                }
            }
        }

        if token.is_cancelled() {
            tracing::info!(job_id = %id, "job stopped");
            self.transition(id, JobStatus::Stopped).await;
            return;
        }
        self.set_progress(id, 100);
        tracing::info!(job_id = %id, "job completed");
        self.transition(id, JobStatus::Completed).await;
    }

    /// Register and start a follow-up subdomain job for a discovered host.
    /// The job is a first-class registry entry, visible and stoppable like
    /// any other. Expansion stops at the configured recursion depth.
    async fn spawn_discovered(self: &Arc<Self>, target: &str, wordlist_id: &str, depth: usize) {
        if depth >= self.max_recursion_depth {
            tracing::debug!(%target, depth, "recursion depth cap reached, not expanding");
            return;
        }
        let job = Job::new(generate_id(), target, wordlist_id, JobType::Subdomain);
        let id = job.id.clone();
        tracing::info!(job_id = %id, %target, depth = depth + 1, "spawning follow-up job");
        self.jobs.write().insert(id.clone(), job.clone());
        if let Err(e) = self.store.save_job(&job).await {
            // Unlike start_job this is not a caller-visible failure; the run
            // proceeds and the record catches up at the next checkpoint.
            tracing::warn!(job_id = %id, error = %e, "failed to persist follow-up job");
        }
        self.spawn_runner(id, depth + 1);
    }

    /// Apply a terminal transition and persist it. Only `Running` jobs move;
    /// repeated or late transitions on a terminal or deleted job no-op.
    async fn transition(&self, id: &str, status: JobStatus) {
        debug_assert!(status.is_terminal());
        let updated = {
            let mut jobs = self.jobs.write();
            match jobs.get_mut(id) {
                Some(job) if job.status == JobStatus::Running => {
                    job.status = status;
                    Some(job.clone())
                }
                _ => None,
            }
        };
        if let Some(job) = updated {
            tracing::info!(job_id = %id, status = %status, "job status updated");
            if let Err(e) = self.store.save_job(&job).await {
                tracing::warn!(job_id = %id, error = %e, "failed to persist status change");
            }
        }
    }

    fn set_progress(&self, id: &str, progress: u8) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(id) {
            // Monotone while running; frozen once terminal.
            if job.status == JobStatus::Running && progress > job.progress {
                job.progress = progress;
            }
        }
    }

    fn add_finding(&self, id: &str, url: String, kind: JobType) {
        let mut jobs = self.jobs.write();
        if let Some(job) = jobs.get_mut(id) {
            if job.status != JobStatus::Running {
                return;
            }
            job.findings.push(Finding { url, kind, found: Utc::now() });
        }
    }
}

fn progress_pct(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 / total as f64) * 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_floored_percent() {
        assert_eq!(progress_pct(1, 3), 33);
        assert_eq!(progress_pct(2, 3), 66);
        assert_eq!(progress_pct(3, 3), 100);
        assert_eq!(progress_pct(1, 200), 0);
        assert_eq!(progress_pct(0, 0), 100);
    }
}

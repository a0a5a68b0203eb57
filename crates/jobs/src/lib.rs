mod config;
mod error;
mod kind;

pub use config::*;
pub use error::*;
pub use kind::*;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use homeroom_types::JobId;
use tokio::task::AbortHandle;

/// Executes a due job; bound once by the application after the engine is
/// constructed
pub trait JobRunner: Send + Sync {
    fn run(&self, job: &JobKind) -> Result<(), JobError>;
}

/// Job submission seam consumed by the engine
///
/// `schedule` returns an opaque handle that `cancel` accepts directly;
/// there is no name-and-args lookup of queued work.
pub trait JobQueue: Send + Sync {
    fn schedule(&self, job: JobKind, delay: Duration) -> JobId;

    /// Best-effort: true only if the job was found and had not completed
    fn cancel(&self, handle: JobId) -> bool;
}

struct Inner {
    runner: OnceLock<Arc<dyn JobRunner>>,
    tasks: Mutex<HashMap<JobId, AbortHandle>>,
    next_id: AtomicU64,
    policy: RetryPolicy,
}

impl Inner {
    fn tasks(&self) -> MutexGuard<'_, HashMap<JobId, AbortHandle>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn execute_with_retry(&self, job: &JobKind) {
        let mut attempts = 0u32;
        loop {
            let outcome = match self.runner.get() {
                Some(runner) => runner.run(job),
                None => Err(JobError::Transient("no runner bound".to_string())),
            };
            match outcome {
                Ok(()) => {
                    tracing::info!(job = job.name(), "job completed");
                    return;
                }
                Err(err) if err.is_terminal() => {
                    tracing::warn!(job = job.name(), %err, "job failed terminally, not retried");
                    return;
                }
                Err(err) => {
                    if attempts >= self.policy.max_retries {
                        tracing::warn!(job = job.name(), %err, "job dropped after {attempts} retries");
                        return;
                    }
                    attempts += 1;
                    tracing::warn!(job = job.name(), %err, attempt = attempts, "job failed, retrying");
                    tokio::time::sleep(self.policy.backoff).await;
                }
            }
        }
    }
}

/// Tokio-backed deferred job scheduler
///
/// One task per job: sleep the delay, run through the bound runner,
/// classify failures. Must be constructed and used inside a tokio
/// runtime. Submission is fire-and-forget from the caller's perspective.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

impl Scheduler {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            inner: Arc::new(Inner {
                runner: OnceLock::new(),
                tasks: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
                policy,
            }),
        }
    }

    /// Bind the callback target. Jobs firing before this is called fail
    /// transiently and retry, so binding shortly after startup is safe.
    pub fn bind_runner(&self, runner: Arc<dyn JobRunner>) {
        let _ = self.inner.runner.set(runner);
    }

    /// Run `job` every day at `at` (UTC), retrying each firing per policy
    pub fn schedule_daily(&self, job: JobKind, at: NaiveTime) -> JobId {
        let id = self.allocate_id();
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(delay_until(Utc::now(), at)).await;
                inner.execute_with_retry(&job).await;
                // step past the firing instant so the next delay lands tomorrow
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
        self.track(id, handle.abort_handle());
        id
    }

    fn allocate_id(&self) -> JobId {
        JobId(self.inner.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn track(&self, id: JobId, handle: AbortHandle) {
        let mut tasks = self.inner.tasks();
        tasks.retain(|_, h| !h.is_finished());
        tasks.insert(id, handle);
    }
}

impl JobQueue for Scheduler {
    fn schedule(&self, job: JobKind, delay: Duration) -> JobId {
        let id = self.allocate_id();
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.execute_with_retry(&job).await;
        });
        self.track(id, handle.abort_handle());
        id
    }

    fn cancel(&self, handle: JobId) -> bool {
        match self.inner.tasks().remove(&handle) {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            }
            _ => false,
        }
    }
}

/// Delay from `now` to the next occurrence of the `at` wall-clock time
fn delay_until(now: DateTime<Utc>, at: NaiveTime) -> Duration {
    let today = now.date_naive().and_time(at).and_utc();
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

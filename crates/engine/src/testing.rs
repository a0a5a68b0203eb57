//! Deterministic stand-ins for the wall clock and the job queue,
//! shared by the unit and integration tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use homeroom_jobs::{JobKind, JobQueue};
use homeroom_types::JobId;

use crate::clock::Clock;

/// Clock pinned to an explicit instant, advanced by hand
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += TimeDelta::seconds(secs);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// One `schedule` call as the queue saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledJob {
    pub id: JobId,
    pub job: JobKind,
    pub delay: Duration,
}

/// Queue that records submissions instead of running them, so tests can
/// assert on what was scheduled and cancelled
#[derive(Default)]
pub struct RecordingQueue {
    next_id: AtomicU64,
    scheduled: Mutex<Vec<ScheduledJob>>,
    cancelled: Mutex<Vec<JobId>>,
}

impl RecordingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduled(&self) -> Vec<ScheduledJob> {
        self.scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn cancelled(&self) -> Vec<JobId> {
        self.cancelled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Scheduled jobs that have not been cancelled
    pub fn live_jobs(&self) -> Vec<ScheduledJob> {
        let cancelled = self.cancelled();
        self.scheduled()
            .into_iter()
            .filter(|s| !cancelled.contains(&s.id))
            .collect()
    }
}

impl JobQueue for RecordingQueue {
    fn schedule(&self, job: JobKind, delay: Duration) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ScheduledJob { id, job, delay });
        id
    }

    fn cancel(&self, handle: JobId) -> bool {
        let known = self
            .scheduled
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|s| s.id == handle);
        let mut cancelled = self.cancelled.lock().unwrap_or_else(|e| e.into_inner());
        if known && !cancelled.contains(&handle) {
            cancelled.push(handle);
            true
        } else {
            false
        }
    }
}

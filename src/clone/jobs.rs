// src/clone/jobs.rs
//! Clone job tracking
//!
//! - Track job status (pending, cloning, ready, failed)
//! - Prevent stampedes: while a clone for a name is in flight, later
//!   dispatches can join it instead of cloning again
//! - Clean up finished jobs after a TTL

use super::{CloneCompleter, CloneHandle};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// How long finished jobs stay visible (1 hour)
pub const DEFAULT_JOB_TTL: Duration = Duration::from_secs(3600);

/// Unique job identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting for a clone slot
    Pending,
    /// git clone running
    Cloning,
    /// Mirror landed in the repo root
    Ready,
    /// Clone failed
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Failed(_))
    }
}

/// A clone job
#[derive(Debug, Clone)]
pub struct CloneJob {
    pub id: JobId,
    pub name: String,
    pub source_url: String,
    pub status: JobStatus,
    pub created_at: Instant,
    /// When the job finished (for TTL cleanup)
    pub completed_at: Option<Instant>,
    handle: CloneHandle,
}

/// Result of claiming a job slot for a name
#[derive(Debug)]
pub enum JobSlot {
    /// A clone for this name is already in flight
    Joined(CloneHandle),
    /// A new job was registered; the caller must run it and complete it
    Started {
        id: JobId,
        completer: CloneCompleter,
        handle: CloneHandle,
    },
}

#[derive(Default)]
struct JobTable {
    jobs: HashMap<JobId, CloneJob>,
    /// Most recent job per package name
    name_to_id: HashMap<String, JobId>,
}

/// Registry of clone jobs
pub struct CloneJobs {
    table: Mutex<JobTable>,
    job_ttl: Duration,
}

impl CloneJobs {
    pub fn new(job_ttl: Duration) -> Self {
        Self {
            table: Mutex::new(JobTable::default()),
            job_ttl,
        }
    }

    /// Claim the job slot for `name`
    ///
    /// With `coalesce`, a pending or cloning job for the same name is joined.
    /// Otherwise, or when the previous job already finished, a new job is
    /// registered and becomes the name's current job.
    pub fn claim(&self, name: &str, source_url: &str, coalesce: bool) -> JobSlot {
        let mut table = self.table.lock();

        if coalesce
            && let Some(id) = table.name_to_id.get(name)
            && let Some(job) = table.jobs.get(id)
            && !job.status.is_terminal()
        {
            return JobSlot::Joined(job.handle.clone());
        }

        let id = JobId::new();
        let (completer, handle) = CloneHandle::channel(name);
        let job = CloneJob {
            id,
            name: name.to_string(),
            source_url: source_url.to_string(),
            status: JobStatus::Pending,
            created_at: Instant::now(),
            completed_at: None,
            handle: handle.clone(),
        };

        table.jobs.insert(id, job);
        table.name_to_id.insert(name.to_string(), id);

        JobSlot::Started {
            id,
            completer,
            handle,
        }
    }

    /// Get the current job for a package name
    pub fn get_by_name(&self, name: &str) -> Option<CloneJob> {
        let table = self.table.lock();
        let id = table.name_to_id.get(name)?;
        table.jobs.get(id).cloned()
    }

    /// Update job status
    pub fn update_status(&self, id: JobId, status: JobStatus) {
        let mut table = self.table.lock();
        if let Some(job) = table.jobs.get_mut(&id) {
            if status.is_terminal() {
                job.completed_at = Some(Instant::now());
            }
            job.status = status;
        }
    }

    /// Drop finished jobs older than the TTL, returning how many were removed
    pub fn cleanup_expired(&self) -> usize {
        let mut table = self.table.lock();
        let now = Instant::now();
        let ttl = self.job_ttl;

        let expired: Vec<JobId> = table
            .jobs
            .values()
            .filter(|job| {
                job.completed_at
                    .is_some_and(|t| now.duration_since(t) >= ttl)
            })
            .map(|job| job.id)
            .collect();

        for id in &expired {
            if let Some(job) = table.jobs.remove(id)
                && table.name_to_id.get(&job.name) == Some(id)
            {
                table.name_to_id.remove(&job.name);
            }
        }

        expired.len()
    }

    /// Get statistics
    pub fn stats(&self) -> JobStats {
        let table = self.table.lock();
        let mut stats = JobStats {
            total: table.jobs.len(),
            ..JobStats::default()
        };

        for job in table.jobs.values() {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Cloning => stats.cloning += 1,
                JobStatus::Ready => stats.ready += 1,
                JobStatus::Failed(_) => stats.failed += 1,
            }
        }

        stats
    }
}

impl Default for CloneJobs {
    fn default() -> Self {
        Self::new(DEFAULT_JOB_TTL)
    }
}

/// Job statistics
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct JobStats {
    pub pending: usize,
    pub cloning: usize,
    pub ready: usize,
    pub failed: usize,
    pub total: usize,
}

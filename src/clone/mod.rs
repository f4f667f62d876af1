// src/clone/mod.rs
//! Asynchronous clone dispatch
//!
//! A dispatch starts a clone in the background and hands back a
//! [`CloneHandle`]. The caller waits on the handle at most once, for a
//! bounded time; a timeout leaves the clone running to completion.

mod git;
mod jobs;

pub use git::{GitCloneDispatcher, GitCloneOptions, clone_repository};
pub use jobs::{CloneJob, CloneJobs, JobId, JobSlot, JobStats, JobStatus};

use crate::mirror::MirrorEntry;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

/// Final result of a clone job, shared with every waiter
pub type CloneOutcome = std::result::Result<MirrorEntry, String>;

/// Why waiting on a clone produced no mirror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AwaitError {
    #[error("clone still in progress")]
    TimedOut,

    #[error("clone failed: {0}")]
    Failed(String),

    #[error("clone job ended without reporting a result")]
    Abandoned,
}

/// Starts clones of upstream repositories into the mirror store
pub trait CloneDispatcher: Send + Sync {
    /// Start cloning `source_url` as mirror `name`
    ///
    /// Returns as soon as the job is queued.
    fn dispatch(&self, name: &str, source_url: &str) -> CloneHandle;
}

/// Waitable view of a dispatched clone
#[derive(Debug, Clone)]
pub struct CloneHandle {
    name: String,
    rx: watch::Receiver<Option<CloneOutcome>>,
}

/// Producer side of a [`CloneHandle`]
#[derive(Debug)]
pub struct CloneCompleter {
    tx: watch::Sender<Option<CloneOutcome>>,
}

impl CloneHandle {
    /// Create a pending handle together with the completer that resolves it
    pub fn channel(name: impl Into<String>) -> (CloneCompleter, CloneHandle) {
        let (tx, rx) = watch::channel(None);
        (
            CloneCompleter { tx },
            CloneHandle {
                name: name.into(),
                rx,
            },
        )
    }

    /// A handle whose clone already finished successfully
    pub fn ready(entry: MirrorEntry) -> Self {
        let name = entry.name.clone();
        Self::finished(name, Ok(entry))
    }

    /// A handle whose clone already failed
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::finished(name, Err(reason.into()))
    }

    fn finished(name: impl Into<String>, outcome: CloneOutcome) -> Self {
        let (_tx, rx) = watch::channel(Some(outcome));
        Self {
            name: name.into(),
            rx,
        }
    }

    /// Package name being cloned
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Wait for the clone to finish, giving up after `timeout`
    ///
    /// Dropping the returned future stops the wait only; the clone itself
    /// keeps running.
    pub async fn await_result(mut self, timeout: Duration) -> Result<MirrorEntry, AwaitError> {
        let waited = tokio::time::timeout(timeout, self.rx.wait_for(Option::is_some)).await;

        match waited {
            Err(_) => Err(AwaitError::TimedOut),
            Ok(Err(_)) => Err(AwaitError::Abandoned),
            Ok(Ok(outcome)) => match outcome.as_ref() {
                Some(Ok(entry)) => Ok(entry.clone()),
                Some(Err(reason)) => Err(AwaitError::Failed(reason.clone())),
                None => Err(AwaitError::Abandoned),
            },
        }
    }
}

impl CloneCompleter {
    /// Publish the outcome to every current and future waiter
    pub fn complete(self, outcome: CloneOutcome) {
        self.tx.send_replace(Some(outcome));
    }
}

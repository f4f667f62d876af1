// src/clone/git.rs
//! git-backed clone dispatcher
//!
//! Each job runs `git clone --mirror` into a hidden staging directory under
//! the repo root and renames the result into place, so the mirror store
//! never observes a half-written repository.

use super::{CloneCompleter, CloneDispatcher, CloneHandle, CloneJobs, JobId, JobSlot, JobStatus};
use crate::error::{Error, Result};
use crate::mirror::{GitMirrorStore, MirrorEntry, MirrorStore, validate_name};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Knobs for the git dispatcher
#[derive(Debug, Clone)]
pub struct GitCloneOptions {
    /// git executable
    pub git: PathBuf,
    /// Hard limit for a single clone; the child is killed when exceeded
    pub timeout: Duration,
    /// Maximum clones running at once
    pub max_concurrent: usize,
    /// Join in-flight clones of the same name instead of starting another
    pub coalesce: bool,
}

impl Default for GitCloneOptions {
    fn default() -> Self {
        Self {
            git: PathBuf::from("git"),
            timeout: Duration::from_secs(600),
            max_concurrent: 4,
            coalesce: true,
        }
    }
}

/// Dispatcher running git clones on the Tokio runtime
pub struct GitCloneDispatcher {
    repo_root: PathBuf,
    options: GitCloneOptions,
    jobs: Arc<CloneJobs>,
    semaphore: Arc<Semaphore>,
}

impl GitCloneDispatcher {
    pub fn new(repo_root: impl Into<PathBuf>, options: GitCloneOptions) -> Self {
        Self::with_jobs(repo_root, options, Arc::new(CloneJobs::default()))
    }

    /// Create a dispatcher that records jobs in a shared registry
    pub fn with_jobs(
        repo_root: impl Into<PathBuf>,
        options: GitCloneOptions,
        jobs: Arc<CloneJobs>,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(options.max_concurrent.max(1)));
        Self {
            repo_root: repo_root.into(),
            options,
            jobs,
            semaphore,
        }
    }

    /// Job registry used by this dispatcher
    pub fn jobs(&self) -> &Arc<CloneJobs> {
        &self.jobs
    }

    fn spawn_job(&self, id: JobId, name: &str, source_url: &str, completer: CloneCompleter) {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Cannot start clone of {}: no async runtime ({})", name, e);
                let reason = "no async runtime available to run the clone".to_string();
                self.jobs.update_status(id, JobStatus::Failed(reason.clone()));
                completer.complete(Err(reason));
                return;
            }
        };

        let task = CloneTask {
            id,
            name: name.to_string(),
            source_url: source_url.to_string(),
            repo_root: self.repo_root.clone(),
            git: self.options.git.clone(),
            timeout: self.options.timeout,
            jobs: Arc::clone(&self.jobs),
            semaphore: Arc::clone(&self.semaphore),
        };

        runtime.spawn(task.run(completer));
    }
}

impl CloneDispatcher for GitCloneDispatcher {
    fn dispatch(&self, name: &str, source_url: &str) -> CloneHandle {
        match self.jobs.claim(name, source_url, self.options.coalesce) {
            JobSlot::Joined(handle) => {
                info!("Joining in-flight clone of {}", handle.name());
                handle
            }
            JobSlot::Started {
                id,
                completer,
                handle,
            } => {
                info!("Queued clone job {} for {} from {}", id, name, source_url);
                self.spawn_job(id, name, source_url, completer);
                handle
            }
        }
    }
}

/// Everything a background clone needs, detached from the dispatcher
struct CloneTask {
    id: JobId,
    name: String,
    source_url: String,
    repo_root: PathBuf,
    git: PathBuf,
    timeout: Duration,
    jobs: Arc<CloneJobs>,
    semaphore: Arc<Semaphore>,
}

impl CloneTask {
    async fn run(self, completer: CloneCompleter) {
        let _permit = match Arc::clone(&self.semaphore).acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => {
                let reason = "clone dispatcher shut down".to_string();
                self.jobs.update_status(self.id, JobStatus::Failed(reason.clone()));
                completer.complete(Err(reason));
                return;
            }
        };

        self.jobs.update_status(self.id, JobStatus::Cloning);
        info!("Cloning {} from {} (job {})", self.name, self.source_url, self.id);

        let result = clone_repository(
            &self.repo_root,
            &self.git,
            self.timeout,
            &self.name,
            &self.source_url,
        )
        .await;

        match result {
            Ok(entry) => {
                info!("Clone complete: {} (job {})", self.name, self.id);
                self.jobs.update_status(self.id, JobStatus::Ready);
                completer.complete(Ok(entry));
            }
            Err(e) => {
                error!("Clone failed: {} - {} (job {})", self.name, e, self.id);
                self.jobs.update_status(self.id, JobStatus::Failed(e.to_string()));
                completer.complete(Err(e.to_string()));
            }
        }
    }
}

/// Clone `source_url` as mirror `name` under `repo_root`
///
/// Returns the existing mirror untouched if one is already present.
pub async fn clone_repository(
    repo_root: &Path,
    git: &Path,
    timeout: Duration,
    name: &str,
    source_url: &str,
) -> Result<MirrorEntry> {
    validate_name(name)?;

    let store = GitMirrorStore::new(repo_root);
    if let Some(existing) = store.get(name)? {
        debug!("{} is already mirrored, skipping clone", name);
        return Ok(existing);
    }

    tokio::fs::create_dir_all(repo_root).await.map_err(|e| {
        Error::IoError(format!(
            "Failed to create repo root {}: {e}",
            repo_root.display()
        ))
    })?;

    // Removed on drop, whatever happens below
    let staging = tempfile::Builder::new()
        .prefix(".clone-")
        .tempdir_in(repo_root)
        .map_err(|e| Error::IoError(format!("Failed to create staging directory: {e}")))?;
    let target = staging.path().join(name);

    let child = Command::new(git)
        .arg("clone")
        .arg("--mirror")
        .arg("--quiet")
        .arg("--")
        .arg(source_url)
        .arg(&target)
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::CloneError(format!("Failed to run {}: {e}", git.display())))?;

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => output
            .map_err(|e| Error::CloneError(format!("Failed to wait for git: {e}")))?,
        Err(_) => {
            return Err(Error::CloneError(format!(
                "git clone of {} timed out after {}s",
                source_url,
                timeout.as_secs()
            )));
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::CloneError(format!(
            "git clone of {} exited with {}: {}",
            source_url,
            output.status,
            stderr.trim()
        )));
    }

    let dest = store.mirror_path(name);
    if let Err(e) = tokio::fs::rename(&target, &dest).await {
        if dest.exists() {
            // Another job landed the same mirror first
            warn!("Mirror {} appeared during clone, keeping existing copy", name);
        } else {
            return Err(Error::IoError(format!(
                "Failed to move clone into {}: {e}",
                dest.display()
            )));
        }
    }

    store.get(name)?.ok_or_else(|| {
        Error::CloneError(format!("Clone of {} did not produce a git repository", name))
    })
}

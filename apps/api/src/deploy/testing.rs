//! Scripted collaborator fakes shared by the deploy tests.

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::deploy::hosting::{
    DeploymentFile, DeploymentHandle, DeploymentStatus, HostingError, HostingPlatform, ReadyState,
};
use crate::deploy::source_control::{RepoHandle, SourceControl, SourceControlError};
use crate::deploy::workspace::DirRemover;

pub fn status(state: ReadyState) -> Result<DeploymentStatus, HostingError> {
    Ok(DeploymentStatus {
        state,
        url: None,
        alias: vec![],
        error_message: None,
    })
}

pub fn building() -> Result<DeploymentStatus, HostingError> {
    status(ReadyState::Building)
}

pub fn ready(url: &str) -> Result<DeploymentStatus, HostingError> {
    Ok(DeploymentStatus {
        state: ReadyState::Ready,
        url: Some(url.to_string()),
        alias: vec![],
        error_message: None,
    })
}

pub fn failed(message: &str) -> Result<DeploymentStatus, HostingError> {
    Ok(DeploymentStatus {
        state: ReadyState::Error,
        url: None,
        alias: vec![],
        error_message: Some(message.to_string()),
    })
}

pub fn http_error(status: u16) -> Result<DeploymentStatus, HostingError> {
    Err(HostingError::Api {
        status,
        message: format!("status {status}"),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Hosting
// ────────────────────────────────────────────────────────────────────────────

/// Replays a fixed status sequence; once exhausted it keeps answering BUILDING.
pub struct ScriptedHosting {
    statuses: Mutex<VecDeque<Result<DeploymentStatus, HostingError>>>,
    create_error: Mutex<Option<HostingError>>,
    project_id: Option<String>,
    relax_fails: bool,
    created: Mutex<Vec<(String, usize, String)>>,
    status_calls: AtomicUsize,
    relax_calls: AtomicUsize,
}

impl ScriptedHosting {
    pub fn new(statuses: Vec<Result<DeploymentStatus, HostingError>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            create_error: Mutex::new(None),
            project_id: Some("prj_test".to_string()),
            relax_fails: false,
            created: Mutex::new(Vec::new()),
            status_calls: AtomicUsize::new(0),
            relax_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_create(self, error: HostingError) -> Self {
        *self.create_error.lock().unwrap() = Some(error);
        self
    }

    pub fn failing_relax(mut self) -> Self {
        self.relax_fails = true;
        self
    }

    pub fn without_project_id(mut self) -> Self {
        self.project_id = None;
        self
    }

    /// `(name, file count, target)` per create call.
    pub fn created(&self) -> Vec<(String, usize, String)> {
        self.created.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn relax_calls(&self) -> usize {
        self.relax_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostingPlatform for ScriptedHosting {
    async fn create_deployment(
        &self,
        name: &str,
        files: Vec<DeploymentFile>,
        target: &str,
    ) -> Result<DeploymentHandle, HostingError> {
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), files.len(), target.to_string()));

        if let Some(err) = self.create_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(DeploymentHandle {
            deployment_id: "dpl_test".to_string(),
            project_id: self.project_id.clone(),
        })
    }

    async fn deployment_status(&self, _deployment_id: &str) -> Result<DeploymentStatus, HostingError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses.lock().unwrap().pop_front().unwrap_or_else(building)
    }

    async fn relax_access_protection(&self, _project_id: &str) -> Result<(), HostingError> {
        self.relax_calls.fetch_add(1, Ordering::SeqCst);
        if self.relax_fails {
            return Err(HostingError::Api {
                status: 403,
                message: "forbidden".to_string(),
            });
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Source control
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSourceControl {
    create_error: Option<String>,
    push_error: Option<String>,
    created: Mutex<Vec<String>>,
    /// Files present in the pushed directory, captured at push time.
    pushed_files: Mutex<Vec<Vec<String>>>,
}

impl FakeSourceControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_create(mut self, message: &str) -> Self {
        self.create_error = Some(message.to_string());
        self
    }

    pub fn failing_push(mut self, message: &str) -> Self {
        self.push_error = Some(message.to_string());
        self
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn push_calls(&self) -> usize {
        self.pushed_files.lock().unwrap().len()
    }

    pub fn pushed_files(&self) -> Vec<Vec<String>> {
        self.pushed_files.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceControl for FakeSourceControl {
    async fn create_repository(&self, name: &str, _private: bool) -> Result<RepoHandle, SourceControlError> {
        self.created.lock().unwrap().push(name.to_string());
        if let Some(message) = &self.create_error {
            return Err(SourceControlError::Api {
                status: 422,
                message: message.clone(),
            });
        }
        Ok(RepoHandle {
            name: name.to_string(),
            html_url: format!("https://github.com/tester/{name}"),
            clone_url: format!("https://github.com/tester/{name}.git"),
        })
    }

    async fn push(&self, local_dir: &Path, _repo: &RepoHandle) -> Result<(), SourceControlError> {
        self.pushed_files.lock().unwrap().push(list_files(local_dir));
        if let Some(message) = &self.push_error {
            return Err(SourceControlError::Git {
                command: "push".to_string(),
                stderr: message.clone(),
            });
        }
        Ok(())
    }
}

/// Relative paths of every file under `root`, sorted.
fn list_files(root: &Path) -> Vec<String> {
    fn walk(dir: &Path, root: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                walk(&path, root, out);
            } else if let Ok(rel) = path.strip_prefix(root) {
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }
    let mut out = Vec::new();
    walk(root, root, &mut out);
    out.sort();
    out
}

// ────────────────────────────────────────────────────────────────────────────
// Filesystem
// ────────────────────────────────────────────────────────────────────────────

/// Fails the first `failures` removals, then removes for real.
pub struct FlakyRemover {
    failures: AtomicUsize,
    attempts: AtomicUsize,
}

impl FlakyRemover {
    pub fn new(failures: usize) -> Self {
        Self {
            failures: AtomicUsize::new(failures),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DirRemover for FlakyRemover {
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(io::Error::new(io::ErrorKind::Other, "simulated removal failure"));
        }
        tokio::fs::remove_dir_all(path).await
    }
}

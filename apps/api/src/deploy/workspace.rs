//! Per-job working directory: created empty, filled with the rendered site,
//! and always removed when the job ends.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, error, warn};

use crate::deploy::renderer::RenderedSite;
use crate::deploy::slug::derive_slug;
use crate::deploy::DeployError;

/// Removal attempts before giving up on a working directory.
pub const CLEANUP_ATTEMPTS: u32 = 3;

/// Consecutive slugs tried before a job gives up on claiming a directory.
pub const SLUG_ATTEMPTS: u64 = 16;

/// Recursive directory removal, injectable so cleanup failures can be simulated.
#[async_trait]
pub trait DirRemover: Send + Sync {
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

pub struct FsRemover;

#[async_trait]
impl DirRemover for FsRemover {
    async fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        tokio::fs::remove_dir_all(path).await
    }
}

#[derive(Debug)]
pub struct JobWorkspace {
    path: PathBuf,
}

impl JobWorkspace {
    /// Claims a fresh `<root>/<name>-<millis>` directory. A taken candidate is
    /// never reused: the next millisecond is tried instead, up to
    /// `SLUG_ATTEMPTS` times. Returns the workspace and the slug it was made for.
    pub async fn claim(root: &Path, full_name: &str, millis: u64) -> Result<(Self, String), DeployError> {
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            DeployError::Internal(format!("could not create work root {}: {e}", root.display()))
        })?;

        for offset in 0..SLUG_ATTEMPTS {
            let slug = derive_slug(full_name, millis.saturating_add(offset));
            let path = root.join(&slug);
            match tokio::fs::create_dir(&path).await {
                Ok(()) => {
                    debug!(path = %path.display(), "Created working directory");
                    return Ok((Self { path }, slug));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!(slug = %slug, "Working directory already taken, trying next slug");
                }
                Err(e) => {
                    return Err(DeployError::Internal(format!(
                        "could not create working directory {}: {e}",
                        path.display()
                    )))
                }
            }
        }

        Err(DeployError::Internal(format!(
            "no free working directory under {} after {SLUG_ATTEMPTS} attempts",
            root.display()
        )))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every site file under the working directory at its relative path.
    pub async fn materialize(&self, site: &RenderedSite) -> Result<(), DeployError> {
        for file in site.files() {
            let dest = self.path.join(&file.path);
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    DeployError::Internal(format!("could not create {}: {e}", parent.display()))
                })?;
            }
            tokio::fs::write(&dest, &file.contents).await.map_err(|e| {
                DeployError::Internal(format!("could not write {}: {e}", file.path))
            })?;
        }
        Ok(())
    }
}

/// Removes `path`, retrying up to `CLEANUP_ATTEMPTS` times. A directory that
/// is already gone counts as removed. Failures are logged, never returned.
pub async fn cleanup(remover: &dyn DirRemover, path: &Path) -> bool {
    for attempt in 1..=CLEANUP_ATTEMPTS {
        match remover.remove_dir_all(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Removed working directory");
                return true;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return true,
            Err(e) => warn!(
                path = %path.display(),
                attempt,
                "Working directory removal failed: {e}"
            ),
        }
    }

    error!(
        path = %path.display(),
        "Giving up on working directory removal after {CLEANUP_ATTEMPTS} attempts"
    );
    false
}

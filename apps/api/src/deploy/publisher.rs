//! Repository Publisher: one new public repository per job, one commit.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info};

use crate::deploy::source_control::SourceControl;
use crate::deploy::DeployError;

#[derive(Clone)]
pub struct RepositoryPublisher {
    source_control: Arc<dyn SourceControl>,
}

impl RepositoryPublisher {
    pub fn new(source_control: Arc<dyn SourceControl>) -> Self {
        Self { source_control }
    }

    /// Creates repository `slug` and pushes `working_dir` to it. Returns the
    /// repository's browser URL.
    ///
    /// A push failure leaves the created repository in place.
    pub async fn publish(&self, slug: &str, working_dir: &Path) -> Result<String, DeployError> {
        info!(slug, "Creating remote repository");
        let repo = self
            .source_control
            .create_repository(slug, false)
            .await
            .map_err(|e| DeployError::RepoCreation(e.to_string()))?;

        info!(slug, repo = %repo.name, repo_url = %repo.html_url, "Pushing files to remote repository");
        if let Err(e) = self.source_control.push(working_dir, &repo).await {
            error!(slug, repo_url = %repo.html_url, "Push failed; repository left in place: {e}");
            return Err(DeployError::Push(e.to_string()));
        }

        Ok(repo.html_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deploy::testing::FakeSourceControl;

    #[tokio::test]
    async fn test_publish_creates_then_pushes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<h1>Jane</h1>").unwrap();
        let sc = Arc::new(FakeSourceControl::new());

        let url = RepositoryPublisher::new(sc.clone())
            .publish("jane-doe-1", dir.path())
            .await
            .unwrap();

        assert_eq!(url, "https://github.com/tester/jane-doe-1");
        assert_eq!(sc.created(), vec!["jane-doe-1"]);
        assert_eq!(sc.pushed_files(), vec![vec!["index.html".to_string()]]);
    }

    #[tokio::test]
    async fn test_creation_failure_skips_push() {
        let dir = tempfile::tempdir().unwrap();
        let sc = Arc::new(FakeSourceControl::new().failing_create("name already exists on this account"));

        let err = RepositoryPublisher::new(sc.clone())
            .publish("jane-doe-1", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::RepoCreation(ref m) if m.contains("already exists")));
        assert_eq!(sc.push_calls(), 0);
    }

    #[tokio::test]
    async fn test_push_failure_is_push_error() {
        let dir = tempfile::tempdir().unwrap();
        let sc = Arc::new(FakeSourceControl::new().failing_push("remote rejected"));

        let err = RepositoryPublisher::new(sc.clone())
            .publish("jane-doe-1", dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Push(_)));
        assert_eq!(sc.created().len(), 1);
    }
}

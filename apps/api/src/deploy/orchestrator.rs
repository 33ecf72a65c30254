//! Orchestrator: runs one deployment job end to end.
//!
//! Flow: validate → slug + working dir → render + assets → materialize →
//!       (publish ∥ trigger) → poll → cleanup.
//!
//! A job removes only the working directory it claimed itself, on every exit
//! path after the claim. Remote resources created before a failure
//! (repository, hosting project) are left in place.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::PollSettings;
use crate::deploy::assets::{collect_local_assets, load_assets};
use crate::deploy::hosting::HostingPlatform;
use crate::deploy::poller::DeploymentPoller;
use crate::deploy::publisher::RepositoryPublisher;
use crate::deploy::renderer::{SiteRenderer, TemplateCatalog, TemplateSelector};
use crate::deploy::source_control::SourceControl;
use crate::deploy::trigger::DeploymentTrigger;
use crate::deploy::workspace::{cleanup, DirRemover, JobWorkspace};
use crate::deploy::DeployError;
use crate::models::profile::ProfileDocument;

// ────────────────────────────────────────────────────────────────────────────
// Job record
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Accepted,
    Rendering,
    Publishing,
    Polling,
    Live,
    Failed,
}

/// Structured failure captured on the job before it is surfaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobError {
    pub kind: &'static str,
    pub message: String,
}

/// One generation request. Lives only for the duration of `Orchestrator::run`.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentJob {
    pub id: Uuid,
    pub slug: String,
    pub template: TemplateSelector,
    pub status: JobStatus,
    pub deployment_url: Option<String>,
    pub repo_url: Option<String>,
    pub error: Option<JobError>,
    pub created_at: DateTime<Utc>,
}

impl DeploymentJob {
    fn new(slug: String, template: &TemplateSelector, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            slug,
            template: template.clone(),
            status: JobStatus::Accepted,
            deployment_url: None,
            repo_url: None,
            error: None,
            created_at: now,
        }
    }

    fn advance(&mut self, status: JobStatus) {
        info!(job_id = %self.id, slug = %self.slug, from = ?self.status, to = ?status, "Job status");
        self.status = status;
    }

    fn fail(&mut self, err: &DeployError) {
        self.error = Some(JobError {
            kind: err.kind(),
            message: err.to_string(),
        });
        self.advance(JobStatus::Failed);
    }
}

/// What a successful job hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutcome {
    pub slug: String,
    pub deployment_url: String,
    pub repo_url: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

/// Filesystem locations and polling budget for jobs.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub templates_dir: PathBuf,
    /// Local upload paths (`uploads/...`) are resolved relative to this.
    pub uploads_root: PathBuf,
    /// Parent of every job's working directory.
    pub work_dir: PathBuf,
    pub poll: PollSettings,
}

pub struct Orchestrator {
    renderer: SiteRenderer,
    publisher: RepositoryPublisher,
    trigger: DeploymentTrigger,
    poller: DeploymentPoller,
    remover: Arc<dyn DirRemover>,
    uploads_root: PathBuf,
    work_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        settings: OrchestratorSettings,
        source_control: Arc<dyn SourceControl>,
        hosting: Arc<dyn HostingPlatform>,
        remover: Arc<dyn DirRemover>,
    ) -> Self {
        Self {
            renderer: SiteRenderer::new(TemplateCatalog::new(settings.templates_dir)),
            publisher: RepositoryPublisher::new(source_control),
            trigger: DeploymentTrigger::new(hosting.clone()),
            poller: DeploymentPoller::new(hosting, settings.poll),
            remover,
            uploads_root: settings.uploads_root,
            work_dir: settings.work_dir,
        }
    }

    /// Runs a full job. Never leaves its working directory behind.
    pub async fn run(
        &self,
        template: &TemplateSelector,
        profile: &ProfileDocument,
    ) -> Result<JobOutcome, DeployError> {
        self.run_at(template, profile, Utc::now()).await
    }

    async fn run_at(
        &self,
        template: &TemplateSelector,
        profile: &ProfileDocument,
        now: DateTime<Utc>,
    ) -> Result<JobOutcome, DeployError> {
        let full_name = profile
            .full_name()
            .ok_or_else(|| DeployError::Validation("Full Name is required".to_string()))?;

        let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
        let (workspace, slug) = JobWorkspace::claim(&self.work_dir, full_name, millis)
            .await
            .map_err(|e| {
                error!(kind = e.kind(), "Could not claim a working directory: {e}");
                e
            })?;

        let mut job = DeploymentJob::new(slug, template, now);
        info!(job_id = %job.id, slug = %job.slug, template = %template, "Deployment job accepted");

        let result = self.execute(&mut job, &workspace, template, profile).await;

        if !cleanup(self.remover.as_ref(), workspace.path()).await {
            warn!(job_id = %job.id, path = %workspace.path().display(), "Working directory left behind");
        }

        match result {
            Ok(outcome) => {
                job.advance(JobStatus::Live);
                info!(
                    job_id = %job.id,
                    deployment_url = %outcome.deployment_url,
                    repo_url = %outcome.repo_url,
                    "Deployment job succeeded"
                );
                Ok(outcome)
            }
            Err(e) => {
                job.fail(&e);
                error!(
                    job_id = %job.id,
                    slug = %job.slug,
                    kind = e.kind(),
                    repo_url = ?job.repo_url,
                    "Deployment job failed: {e}"
                );
                Err(e)
            }
        }
    }

    async fn execute(
        &self,
        job: &mut DeploymentJob,
        workspace: &JobWorkspace,
        template: &TemplateSelector,
        profile: &ProfileDocument,
    ) -> Result<JobOutcome, DeployError> {
        let slug = job.slug.clone();

        job.advance(JobStatus::Rendering);
        let mut site = self.renderer.render(template, profile).await?;

        let asset_paths = collect_local_assets(profile);
        for asset in load_assets(&self.uploads_root, &asset_paths).await? {
            site.insert(asset);
        }
        workspace.materialize(&site).await?;
        info!(
            job_id = %job.id,
            files = site.files().len(),
            assets = asset_paths.len(),
            entry_bytes = site.entry_point().map(|f| f.contents.len()),
            "Site rendered"
        );

        job.advance(JobStatus::Publishing);
        let (repo_url, deployment) = tokio::try_join!(
            self.publisher.publish(&slug, workspace.path()),
            self.trigger.deploy(&slug, &site),
        )?;
        job.repo_url = Some(repo_url.clone());

        job.advance(JobStatus::Polling);
        let deployment_url = self.poller.wait_until_live(&deployment.deployment_id).await?;
        job.deployment_url = Some(deployment_url.clone());

        Ok(JobOutcome {
            slug,
            deployment_url,
            repo_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::deploy::hosting::HostingError;
    use crate::deploy::testing::{
        building, failed, ready, FakeSourceControl, FlakyRemover, ScriptedHosting,
    };
    use crate::deploy::workspace::{FsRemover, SLUG_ATTEMPTS};

    struct Harness {
        _root: tempfile::TempDir,
        work_dir: PathBuf,
        uploads_root: PathBuf,
        source_control: Arc<FakeSourceControl>,
        hosting: Arc<ScriptedHosting>,
    }

    impl Harness {
        fn new(source_control: FakeSourceControl, hosting: ScriptedHosting) -> Self {
            let root = tempfile::tempdir().unwrap();
            let work_dir = root.path().join("temp-repos");
            let uploads_root = root.path().join("data");
            std::fs::create_dir_all(uploads_root.join("uploads")).unwrap();
            Self {
                work_dir,
                uploads_root,
                _root: root,
                source_control: Arc::new(source_control),
                hosting: Arc::new(hosting),
            }
        }

        fn orchestrator(&self, remover: Arc<dyn DirRemover>) -> Orchestrator {
            Orchestrator::new(
                OrchestratorSettings {
                    templates_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("templates"),
                    uploads_root: self.uploads_root.clone(),
                    work_dir: self.work_dir.clone(),
                    poll: PollSettings::default(),
                },
                self.source_control.clone(),
                self.hosting.clone(),
                remover,
            )
        }

        /// Job directories still present under the work dir.
        fn leftover_dirs(&self) -> usize {
            match std::fs::read_dir(&self.work_dir) {
                Ok(entries) => entries.count(),
                Err(_) => 0,
            }
        }
    }

    fn jane() -> ProfileDocument {
        ProfileDocument::with_name("Jane Doe")
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path_returns_urls_with_slug() {
        let h = Harness::new(
            FakeSourceControl::new(),
            ScriptedHosting::new(vec![building(), ready("jane-doe.vercel.app")]),
        );

        let outcome = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &jane())
            .await
            .unwrap();

        assert!(outcome.slug.starts_with("jane-doe-"));
        assert_eq!(outcome.deployment_url, "https://jane-doe.vercel.app");
        assert!(outcome.repo_url.contains(&outcome.slug));
        assert_eq!(h.source_control.created(), vec![outcome.slug.clone()]);
        assert_eq!(h.hosting.created()[0].0, outcome.slug);
        assert_eq!(h.hosting.status_calls(), 2);
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pushed_tree_contains_site_and_assets() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![ready("x")]));
        std::fs::write(h.uploads_root.join("uploads/me.png"), b"png").unwrap();

        let mut profile = jane();
        profile.personal_info.profile_image = "uploads/me.png".to_string();
        profile.testimonials = vec![crate::models::profile::Testimonial {
            avatar: "uploads/me.png".to_string(),
            ..Default::default()
        }];

        h.orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &profile)
            .await
            .unwrap();

        assert_eq!(
            h.source_control.pushed_files(),
            vec![vec![
                "index.html".to_string(),
                "uploads/me.png".to_string(),
                "vercel.json".to_string()
            ]]
        );
        // entry point, rewrite config, one deduplicated asset
        assert_eq!(h.hosting.created()[0].1, 3);
    }

    #[tokio::test]
    async fn test_blank_name_is_rejected_before_anything_happens() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![]));

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &ProfileDocument::with_name("  "))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Validation(_)));
        assert!(h.source_control.created().is_empty());
        assert!(h.hosting.created().is_empty());
        assert!(!h.work_dir.exists());
    }

    #[tokio::test]
    async fn test_unknown_template_fails_without_remote_side_effects() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![]));

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(404), &jane())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::TemplateNotFound(_)));
        assert!(h.source_control.created().is_empty());
        assert!(h.hosting.created().is_empty());
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test]
    async fn test_missing_asset_fails_before_publishing() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![]));
        let mut profile = jane();
        profile.personal_info.profile_image = "uploads/gone.png".to_string();

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &profile)
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Render(_)));
        assert!(h.source_control.created().is_empty());
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_publisher_failure_never_polls() {
        let h = Harness::new(
            FakeSourceControl::new().failing_create("Bad credentials"),
            ScriptedHosting::new(vec![ready("x")]),
        );

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &jane())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::RepoCreation(_)));
        assert_eq!(h.hosting.status_calls(), 0);
        assert_eq!(h.source_control.push_calls(), 0);
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_push_failure_never_polls() {
        let h = Harness::new(
            FakeSourceControl::new().failing_push("remote rejected"),
            ScriptedHosting::new(vec![ready("x")]),
        );

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &jane())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Push(_)));
        assert_eq!(h.hosting.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_trigger_failure_never_polls() {
        let h = Harness::new(
            FakeSourceControl::new(),
            ScriptedHosting::new(vec![ready("x")]).failing_create(HostingError::Api {
                status: 400,
                message: "Invalid request".into(),
            }),
        );

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &jane())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::DeployTrigger(ref m) if m == "Invalid request"));
        assert_eq!(h.hosting.status_calls(), 0);
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deployment_error_is_surfaced_and_cleaned_up() {
        let h = Harness::new(
            FakeSourceControl::new(),
            ScriptedHosting::new(vec![building(), failed("Build failed")]),
        );

        let err = h
            .orchestrator(Arc::new(FsRemover))
            .run(&TemplateSelector::Number(1), &jane())
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::DeploymentFailed(ref m) if m == "Build failed"));
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_survives_a_failing_first_removal_on_success() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![ready("x")]));
        let remover = Arc::new(FlakyRemover::new(1));

        let outcome = h
            .orchestrator(remover.clone())
            .run(&TemplateSelector::Number(1), &jane())
            .await;

        assert!(outcome.is_ok());
        assert_eq!(remover.attempts(), 2);
        assert_eq!(h.leftover_dirs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_survives_a_failing_first_removal_on_every_failure_path() {
        let cases: Vec<(FakeSourceControl, ScriptedHosting, TemplateSelector)> = vec![
            (FakeSourceControl::new(), ScriptedHosting::new(vec![]), TemplateSelector::Number(404)),
            (
                FakeSourceControl::new().failing_create("nope"),
                ScriptedHosting::new(vec![]),
                TemplateSelector::Number(1),
            ),
            (
                FakeSourceControl::new().failing_push("nope"),
                ScriptedHosting::new(vec![]),
                TemplateSelector::Number(1),
            ),
            (
                FakeSourceControl::new(),
                ScriptedHosting::new(vec![]).failing_create(HostingError::Api {
                    status: 500,
                    message: "down".into(),
                }),
                TemplateSelector::Number(1),
            ),
            (
                FakeSourceControl::new(),
                ScriptedHosting::new(vec![failed("boom")]),
                TemplateSelector::Number(1),
            ),
            (FakeSourceControl::new(), ScriptedHosting::new(vec![]), TemplateSelector::Number(1)),
        ];

        for (source_control, hosting, template) in cases {
            let h = Harness::new(source_control, hosting);
            let remover = Arc::new(FlakyRemover::new(1));

            let result = h.orchestrator(remover.clone()).run(&template, &jane()).await;

            assert!(result.is_err());
            assert_eq!(h.leftover_dirs(), 0, "working dir left behind for {result:?}");
        }
    }

    /// Pre-creates `<work_dir>/jane-doe-<ms>` directories owned by some other job.
    fn occupy(h: &Harness, millis: impl IntoIterator<Item = u64>) -> Vec<PathBuf> {
        millis
            .into_iter()
            .map(|ms| {
                let dir = h.work_dir.join(format!("jane-doe-{ms}"));
                std::fs::create_dir_all(&dir).unwrap();
                std::fs::write(dir.join("owner"), "other job").unwrap();
                dir
            })
            .collect()
    }

    fn at_millis(ms: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp_millis(ms).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_millisecond_job_takes_next_slug_and_spares_the_other() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![ready("x")]));
        let taken = occupy(&h, [1_700_000_000_000]);

        let outcome = h
            .orchestrator(Arc::new(FsRemover))
            .run_at(&TemplateSelector::Number(1), &jane(), at_millis(1_700_000_000_000))
            .await
            .unwrap();

        assert_eq!(outcome.slug, "jane-doe-1700000000001");
        assert_eq!(h.source_control.created(), vec![outcome.slug.clone()]);
        assert_eq!(std::fs::read_to_string(taken[0].join("owner")).unwrap(), "other job");
        assert_eq!(h.leftover_dirs(), 1);
    }

    #[tokio::test]
    async fn test_unclaimable_workspace_fails_without_deleting_anything() {
        let h = Harness::new(FakeSourceControl::new(), ScriptedHosting::new(vec![]));
        let start = 1_700_000_000_000u64;
        let taken = occupy(&h, start..start + SLUG_ATTEMPTS);
        let remover = Arc::new(FlakyRemover::new(0));

        let err = h
            .orchestrator(remover.clone())
            .run_at(&TemplateSelector::Number(1), &jane(), at_millis(start as i64))
            .await
            .unwrap_err();

        assert!(matches!(err, DeployError::Internal(_)));
        assert_eq!(remover.attempts(), 0);
        assert!(h.source_control.created().is_empty());
        assert!(h.hosting.created().is_empty());
        assert_eq!(h.leftover_dirs(), taken.len());
        for dir in taken {
            assert_eq!(std::fs::read_to_string(dir.join("owner")).unwrap(), "other job");
        }
    }

    #[test]
    fn test_job_records_structured_error() {
        let mut job = DeploymentJob::new("jane-doe-1".into(), &TemplateSelector::Number(1), Utc::now());
        assert_eq!(job.status, JobStatus::Accepted);

        job.fail(&DeployError::DeploymentCanceled);

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(
            job.error,
            Some(JobError {
                kind: "DEPLOYMENT_CANCELED",
                message: "Deployment was canceled".to_string(),
            })
        );
    }
}

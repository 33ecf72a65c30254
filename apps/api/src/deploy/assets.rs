//! Asset Resolver: finds the previously uploaded local files a profile
//! references so they can be bundled with the rendered site.

use std::collections::HashSet;
use std::path::{Component, Path};

use bytes::Bytes;
use tracing::debug;

use crate::deploy::renderer::SiteFile;
use crate::deploy::DeployError;
use crate::models::profile::ProfileDocument;

/// Paths saved by the upload handler start with this prefix. Anything else
/// (e.g. an `https://` URL) is left as-is and not bundled.
pub const UPLOADS_PREFIX: &str = "uploads/";

/// Returns every distinct local upload path referenced by the profile image,
/// project images, technology images and testimonial avatars, in first-seen order.
pub fn collect_local_assets(profile: &ProfileDocument) -> Vec<String> {
    let candidates = std::iter::once(profile.personal_info.profile_image.as_str())
        .chain(profile.projects.iter().map(|p| p.image.as_str()))
        .chain(profile.technologies.iter().map(|t| t.image.as_str()))
        .chain(profile.testimonials.iter().map(|t| t.avatar.as_str()));

    let mut seen = HashSet::new();
    candidates
        .filter(|p| is_local_upload(p))
        .filter(|p| seen.insert(*p))
        .map(str::to_string)
        .collect()
}

pub fn is_local_upload(path: &str) -> bool {
    !path.is_empty() && path.starts_with(UPLOADS_PREFIX)
}

/// Reads each asset from `uploads_root`, keeping its relative path.
///
/// Every resolved path must end up in the site, so an unreadable file or a
/// path escaping the uploads tree fails the job.
pub async fn load_assets(uploads_root: &Path, paths: &[String]) -> Result<Vec<SiteFile>, DeployError> {
    let mut files = Vec::with_capacity(paths.len());

    for rel in paths {
        if !is_contained(rel) {
            return Err(DeployError::Render(format!(
                "asset path '{rel}' is not a plain relative path"
            )));
        }

        let source = uploads_root.join(rel);
        let contents = tokio::fs::read(&source).await.map_err(|e| {
            DeployError::Render(format!("asset '{rel}' could not be read: {e}"))
        })?;

        debug!(asset = %rel, bytes = contents.len(), "Included asset");
        files.push(SiteFile::new(rel.clone(), Bytes::from(contents)));
    }

    Ok(files)
}

/// Relative, no `..`, no root or drive prefix.
fn is_contained(rel: &str) -> bool {
    Path::new(rel)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

//! Site Renderer: turns a template and a profile document into the flat
//! file set that gets pushed and deployed.
//!
//! Templates live on disk as `<templates_dir>/<template dir>/index.hbs` and
//! are rendered with Handlebars in non-strict mode, so absent optional data
//! renders blank instead of failing.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::deploy::DeployError;
use crate::models::profile::ProfileDocument;

pub const ENTRY_POINT: &str = "index.html";
pub const REWRITE_CONFIG: &str = "vercel.json";
pub const TEMPLATE_FILE: &str = "index.hbs";

// ────────────────────────────────────────────────────────────────────────────
// Template selection
// ────────────────────────────────────────────────────────────────────────────

/// Names a template: a number `n` means directory `template{n}`, a slug names
/// the directory directly. Numeric strings behave like numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateSelector {
    Number(u32),
    Slug(String),
}

impl TemplateSelector {
    /// Directory name under the catalog root, or `None` if the selector
    /// could not be a safe single path segment.
    pub fn dir_name(&self) -> Option<String> {
        match self {
            TemplateSelector::Number(n) => Some(format!("template{n}")),
            TemplateSelector::Slug(s) => {
                let s = s.trim();
                if let Ok(n) = s.parse::<u32>() {
                    return Some(format!("template{n}"));
                }
                let valid = !s.is_empty()
                    && s.chars()
                        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
                valid.then(|| s.to_string())
            }
        }
    }
}

impl fmt::Display for TemplateSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateSelector::Number(n) => write!(f, "{n}"),
            TemplateSelector::Slug(s) => write!(f, "{s}"),
        }
    }
}

/// A resolved template: where it came from and its source text.
#[derive(Debug, Clone)]
pub struct TemplateDefinition {
    pub name: String,
    pub path: PathBuf,
    pub source: String,
}

/// Resolves selectors against the templates directory.
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    root: PathBuf,
}

impl TemplateCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn resolve(&self, selector: &TemplateSelector) -> Result<TemplateDefinition, DeployError> {
        let name = selector
            .dir_name()
            .ok_or_else(|| DeployError::TemplateNotFound(selector.to_string()))?;
        let path = self.root.join(&name).join(TEMPLATE_FILE);

        match tokio::fs::read_to_string(&path).await {
            Ok(source) => Ok(TemplateDefinition { name, path, source }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                DeployError::TemplateNotFound(format!("{selector} at {}", path.display())),
            ),
            Err(e) => Err(DeployError::Render(format!(
                "could not read template {}: {e}",
                path.display()
            ))),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendered output
// ────────────────────────────────────────────────────────────────────────────

/// One file of the rendered site, addressed by its path relative to the site root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFile {
    pub path: String,
    pub contents: Bytes,
}

impl SiteFile {
    pub fn new(path: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// The complete artifact set: entry point, rewrite config, then assets.
#[derive(Debug, Clone, Default)]
pub struct RenderedSite {
    files: Vec<SiteFile>,
}

impl RenderedSite {
    pub fn files(&self) -> &[SiteFile] {
        &self.files
    }

    pub fn get(&self, path: &str) -> Option<&SiteFile> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn entry_point(&self) -> Option<&SiteFile> {
        self.get(ENTRY_POINT)
    }

    /// Adds a file, replacing any existing file at the same path.
    pub fn insert(&mut self, file: SiteFile) {
        match self.files.iter_mut().find(|f| f.path == file.path) {
            Some(existing) => *existing = file,
            None => self.files.push(file),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Renderer
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SiteRenderer {
    catalog: TemplateCatalog,
}

impl SiteRenderer {
    pub fn new(catalog: TemplateCatalog) -> Self {
        Self { catalog }
    }

    /// Produces `index.html` and `vercel.json`. Assets are added by the caller.
    pub async fn render(
        &self,
        selector: &TemplateSelector,
        profile: &ProfileDocument,
    ) -> Result<RenderedSite, DeployError> {
        let template = self.catalog.resolve(selector).await?;
        debug!(template = %template.name, path = %template.path.display(), "Rendering site");

        let html = render_template(&template, profile)?;

        let mut site = RenderedSite::default();
        site.insert(SiteFile::new(ENTRY_POINT, html));
        site.insert(SiteFile::new(REWRITE_CONFIG, rewrite_config()?));
        Ok(site)
    }
}

fn render_template(template: &TemplateDefinition, profile: &ProfileDocument) -> Result<String, DeployError> {
    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);

    handlebars
        .render_template(&template.source, profile)
        .map_err(|e| DeployError::Render(format!("template {}: {e}", template.name)))
}

/// Hosting config that routes every path to the entry point (SPA fallback).
pub fn rewrite_config() -> Result<String, DeployError> {
    let config = json!({
        "rewrites": [
            { "source": "/(.*)", "destination": format!("/{ENTRY_POINT}") }
        ]
    });
    serde_json::to_string_pretty(&config)
        .map_err(|e| DeployError::Internal(format!("failed to serialize {REWRITE_CONFIG}: {e}")))
}

//! Shared state for project commands
//!
//! `RuntimeContext` opens the project repository, loads the effective policy
//! and prepares the values hooks see (`${REPO_ROOT}`, `REPO_PROJECT`, ...).
//! It is built once per invocation and passed to every command.

use crate::error::Result;
use crate::git::{ProjectRepo, find_checkout_root};
use preupload_config::{ConfigLoader, EffectivePolicy};
use preupload_engine::{ExpansionContext, Project};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Runtime context for a project command
#[derive(Debug)]
pub struct RuntimeContext {
    /// Opened project repository
    pub repo: ProjectRepo,
    /// Top of the multi-repository checkout, or the project itself
    pub checkout_root: PathBuf,
    /// Policy merged from the global and project configuration
    pub policy: EffectivePolicy,
    /// Values exposed to hooks
    pub env: ExpansionContext,
}

impl RuntimeContext {
    /// Open the project at `dir` (or the current directory) and load its policy
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found or the configuration is
    /// unreadable or invalid.
    pub fn new(dir: Option<&Path>, project_name: Option<String>) -> Result<Self> {
        let start = match dir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        let repo = ProjectRepo::discover(&start)?;
        let project_dir = repo.workdir().to_path_buf();
        let checkout_root =
            find_checkout_root(&project_dir).unwrap_or_else(|| project_dir.clone());
        debug!(
            project = %project_dir.display(),
            checkout = %checkout_root.display(),
            "Opened project"
        );

        let policy = ConfigLoader::for_repo_checkout(&checkout_root, &project_dir).load()?;

        let project = Project {
            name: project_name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| default_project_name(&project_dir)),
            path: project_dir.display().to_string(),
            remote: repo.upstream_remote(),
        };
        let env = ExpansionContext::new(project_dir).with_project(project);

        Ok(Self {
            repo,
            checkout_root,
            policy,
            env,
        })
    }

    /// Root of the project work tree
    pub fn project_dir(&self) -> &Path {
        self.env.repo_root()
    }
}

fn default_project_name(project_dir: &Path) -> String {
    project_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

//! Config file discovery
//!
//! A run reads at most two documents: the global `GLOBAL-PREUPLOAD.cfg` and
//! the project-local `PREUPLOAD.cfg`. Missing files are not errors.

use crate::parser::ConfigDocument;
use crate::policy::EffectivePolicy;
use preupload_core::Result;
use std::path::{Path, PathBuf};

/// Project-local config file name
pub const LOCAL_FILENAME: &str = "PREUPLOAD.cfg";

/// Global config file name
pub const GLOBAL_FILENAME: &str = "GLOBAL-PREUPLOAD.cfg";

/// Finds and loads the config documents for one project
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    project_dir: PathBuf,
    global_dirs: Vec<PathBuf>,
}

impl ConfigLoader {
    /// Loader that only reads the project-local file
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
            global_dirs: Vec::new(),
        }
    }

    /// Loader for a project inside a multi-repository checkout
    ///
    /// The global file is searched in `<repo_root>/.repo/manifests`, then in
    /// `<repo_root>` itself.
    pub fn for_repo_checkout(repo_root: &Path, project_dir: impl Into<PathBuf>) -> Self {
        Self::new(project_dir)
            .global_dir(repo_root.join(".repo").join("manifests"))
            .global_dir(repo_root)
    }

    /// Add a directory to search for the global file
    ///
    /// Directories are searched in the order they were added.
    #[must_use]
    pub fn global_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.global_dirs.push(dir.into());
        self
    }

    /// Project directory holding the local file
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// First existing global file, if any
    pub fn find_global(&self) -> Option<PathBuf> {
        self.global_dirs
            .iter()
            .map(|dir| dir.join(GLOBAL_FILENAME))
            .find(|path| path.is_file())
    }

    /// The local file, if it exists
    pub fn find_local(&self) -> Option<PathBuf> {
        let path = self.project_dir.join(LOCAL_FILENAME);
        path.is_file().then_some(path)
    }

    /// Parse the documents that exist, merge them and validate the result
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` if either document fails to parse or
    /// the merged policy is invalid.
    #[tracing::instrument(skip(self), fields(project = %self.project_dir.display()))]
    pub fn load(&self) -> Result<EffectivePolicy> {
        let global = self
            .find_global()
            .map(|path| ConfigDocument::from_path(&path))
            .transpose()?;
        let local = self
            .find_local()
            .map(|path| ConfigDocument::from_path(&path))
            .transpose()?;

        if global.is_none() && local.is_none() {
            tracing::debug!("No config files found");
        }

        let policy = EffectivePolicy::merge(global.as_ref(), local.as_ref());
        policy.validate()?;

        tracing::debug!(
            sources = policy.sources.len(),
            hook_scripts = policy.hook_scripts.len(),
            builtin_hooks = policy.builtin_hooks.len(),
            "Loaded effective policy"
        );
        Ok(policy)
    }
}

//! Per-commit and per-run inputs to hook execution

use indexmap::IndexMap;
use preupload_core::{BuildOs, CURRENT_PLATFORM};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One commit to check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitContext {
    /// Full commit id
    pub commit: String,
    /// Full commit message, newlines preserved
    pub message: String,
    /// Changed paths relative to the repository root, in diff order
    pub files: Vec<String>,
    /// Whether the commit has more than one parent
    pub merge: bool,
}

impl CommitContext {
    /// Non-merge commit with the given id, message and changed files
    pub fn new(commit: impl Into<String>, message: impl Into<String>, files: Vec<String>) -> Self {
        Self {
            commit: commit.into(),
            message: message.into(),
            files,
            merge: false,
        }
    }

    /// Mark the commit as a merge
    #[must_use]
    pub fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or_default()
    }

    /// Abbreviated commit id for display
    pub fn short_id(&self) -> &str {
        self.commit.get(..12).unwrap_or(&self.commit)
    }
}

/// Identity of the project being uploaded
///
/// Exported to hooks as `REPO_PROJECT`, `REPO_PATH` and `REPO_REMOTE`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Project {
    /// Project name on the remote
    pub name: String,
    /// Absolute path of the project checkout
    pub path: String,
    /// Name of the remote the upload goes to
    pub remote: String,
}

/// Values that are the same for every commit of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionContext {
    /// Absolute repository root; hooks run here
    pub repo_root: PathBuf,
    /// Value of `${BUILD_OS}`
    pub build_os: BuildOs,
    /// Project identity exported to hooks
    pub project: Project,
}

impl ExpansionContext {
    /// Context for the host platform
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            build_os: CURRENT_PLATFORM.build_os(),
            project: Project::default(),
        }
    }

    /// Override the detected platform
    #[must_use]
    pub fn with_build_os(mut self, build_os: BuildOs) -> Self {
        self.build_os = build_os;
        self
    }

    /// Set the project identity
    #[must_use]
    pub fn with_project(mut self, project: Project) -> Self {
        self.project = project;
        self
    }

    /// Directory hooks run in
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// `${REPO_ROOT}` value
    pub fn repo_root_str(&self) -> String {
        self.repo_root.display().to_string()
    }

    /// Variables added to the inherited environment of every hook process
    pub fn child_env(&self, commit: &CommitContext) -> IndexMap<String, String> {
        IndexMap::from([
            ("REPO_PROJECT".to_string(), self.project.name.clone()),
            ("REPO_PATH".to_string(), self.project.path.clone()),
            ("REPO_REMOTE".to_string(), self.project.remote.clone()),
            ("PREUPLOAD_COMMIT".to_string(), commit.commit.clone()),
            ("PREUPLOAD_COMMIT_MESSAGE".to_string(), commit.message.clone()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_summary_and_short_id() {
        let commit = CommitContext::new(
            "0123456789abcdef0123456789abcdef01234567",
            "Fix the widget\n\nBug: 1234\n",
            vec![],
        );
        assert_eq!(commit.summary(), "Fix the widget");
        assert_eq!(commit.short_id(), "0123456789ab");

        let short = CommitContext::new("abc", "", vec![]);
        assert_eq!(short.short_id(), "abc");
        assert_eq!(short.summary(), "");
    }

    #[test]
    fn test_child_env() {
        let env = ExpansionContext::new("/work/proj").with_project(Project {
            name: "platform/build".to_string(),
            path: "build/make".to_string(),
            remote: "aosp".to_string(),
        });
        let commit = CommitContext::new("deadbeef", "Subject\n\nBody", vec![]);

        let vars = env.child_env(&commit);
        assert_eq!(vars["REPO_PROJECT"], "platform/build");
        assert_eq!(vars["REPO_PATH"], "build/make");
        assert_eq!(vars["REPO_REMOTE"], "aosp");
        assert_eq!(vars["PREUPLOAD_COMMIT"], "deadbeef");
        assert_eq!(vars["PREUPLOAD_COMMIT_MESSAGE"], "Subject\n\nBody");
    }
}

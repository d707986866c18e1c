//! Git access for the commits under review
//!
//! Opens the project repository with git2 and turns commits into
//! `CommitContext`s. Changed files are taken from the diff against the first
//! parent; deleted paths are left out since there is nothing left to check.
//! File contents for the checks come from the commit's tree through
//! [`GitFileSource`], never from the work tree.

use crate::error::{CommandError, Result};
use git2::{Delta, ErrorCode, Oid, Repository, Sort};
use preupload_engine::{CommitContext, FileSource};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// The project repository
pub struct ProjectRepo {
    repo: Repository,
    workdir: PathBuf,
}

impl std::fmt::Debug for ProjectRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRepo")
            .field("workdir", &self.workdir)
            .finish_non_exhaustive()
    }
}

impl ProjectRepo {
    /// Find the repository containing `start`
    ///
    /// # Errors
    ///
    /// Returns an error if `start` is not inside a git work tree.
    pub fn discover(start: &Path) -> Result<Self> {
        let repo = Repository::discover(start).map_err(|source| CommandError::NotARepository {
            path: start.to_path_buf(),
            source,
        })?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| CommandError::BareRepository(repo.path().to_path_buf()))?;
        let workdir = normalize_workdir(workdir);
        Ok(Self { repo, workdir })
    }

    /// Root of the work tree
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Remote of the upstream branch of HEAD, or an empty string
    pub fn upstream_remote(&self) -> String {
        let Ok(head) = self.repo.head() else {
            return String::new();
        };
        let Some(refname) = head.name().filter(|_| head.is_branch()) else {
            return String::new();
        };
        self.repo
            .branch_upstream_remote(refname)
            .ok()
            .and_then(|buf| buf.as_str().map(ToString::to_string))
            .unwrap_or_default()
    }

    /// Commits to check when none are named: everything on HEAD that is not
    /// on its upstream, oldest first. Without an upstream only HEAD is checked.
    ///
    /// # Errors
    ///
    /// Returns an error if HEAD cannot be resolved or history cannot be walked.
    pub fn pending_commits(&self) -> Result<Vec<CommitContext>> {
        let head = self.repo.head()?;
        let head_oid = head.peel_to_commit()?.id();

        let Some(upstream) = self.upstream_oid(&head) else {
            debug!("No upstream branch, checking HEAD only");
            return Ok(vec![self.commit_context(head_oid)?]);
        };

        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        walk.push(head_oid)?;
        walk.hide(upstream)?;

        walk.map(|oid| self.commit_context(oid?)).collect()
    }

    /// Resolve commits named on the command line, keeping their order
    ///
    /// # Errors
    ///
    /// Returns `UnknownCommit` for a revision that does not name a commit.
    pub fn named_commits(&self, revs: &[String]) -> Result<Vec<CommitContext>> {
        revs.iter()
            .map(|rev| {
                let oid = self
                    .repo
                    .revparse_single(rev)
                    .and_then(|object| object.peel_to_commit())
                    .map_err(|source| CommandError::UnknownCommit {
                        rev: rev.clone(),
                        source,
                    })?
                    .id();
                self.commit_context(oid)
            })
            .collect()
    }

    /// Named commits if any, otherwise the pending ones
    ///
    /// # Errors
    ///
    /// See [`Self::named_commits`] and [`Self::pending_commits`].
    pub fn upload_commits(&self, revs: &[String]) -> Result<Vec<CommitContext>> {
        if revs.is_empty() {
            self.pending_commits()
        } else {
            self.named_commits(revs)
        }
    }

    /// Message, changed files and merge flag of one commit
    ///
    /// # Errors
    ///
    /// Returns an error if the commit or its trees cannot be read.
    pub fn commit_context(&self, oid: Oid) -> Result<CommitContext> {
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        let files = diff
            .deltas()
            .filter(|delta| delta.status() != Delta::Deleted)
            .filter_map(|delta| delta.new_file().path())
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        let message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
        Ok(CommitContext::new(oid.to_string(), message, files).with_merge(commit.parent_count() > 1))
    }

    /// Source reading files out of commits of this repository
    ///
    /// # Errors
    ///
    /// Returns an error if the repository cannot be opened a second time.
    pub fn file_source(&self) -> Result<GitFileSource> {
        let repo = Repository::open(self.repo.path())?;
        Ok(GitFileSource {
            repo: Mutex::new(repo),
        })
    }

    fn upstream_oid(&self, head: &git2::Reference<'_>) -> Option<Oid> {
        if !head.is_branch() {
            return None;
        }
        let name = head.shorthand()?;
        let branch = self.repo.find_branch(name, git2::BranchType::Local).ok()?;
        branch.upstream().ok()?.get().target()
    }
}

/// Blob contents at a commit, looked up in the object database
pub struct GitFileSource {
    repo: Mutex<Repository>,
}

impl std::fmt::Debug for GitFileSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitFileSource").finish_non_exhaustive()
    }
}

impl FileSource for GitFileSource {
    fn read(&self, commit: &CommitContext, path: &str) -> io::Result<Vec<u8>> {
        let guard = self
            .repo
            .lock()
            .map_err(|_| io::Error::other("repository lock poisoned"))?;
        let repo = &*guard;

        let oid = Oid::from_str(&commit.commit).map_err(io::Error::other)?;
        let blob = repo
            .find_commit(oid)
            .and_then(|found| found.tree())
            .and_then(|tree| tree.get_path(Path::new(path)))
            .and_then(|entry| entry.to_object(repo))
            .and_then(|object| object.peel_to_blob())
            .map_err(|e| match e.code() {
                ErrorCode::NotFound => io::Error::new(io::ErrorKind::NotFound, e),
                _ => io::Error::other(e),
            })?;
        Ok(blob.content().to_vec())
    }
}

/// Top of a multi-repository checkout: the nearest ancestor holding `.repo`
pub fn find_checkout_root(project_dir: &Path) -> Option<PathBuf> {
    project_dir
        .ancestors()
        .find(|dir| dir.join(".repo").is_dir())
        .map(Path::to_path_buf)
}

fn normalize_workdir(path: &Path) -> PathBuf {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    // git2 reports work trees with a trailing separator
    path.components().collect()
}

//! File contents as of the commit under review
//!
//! Checks that read files themselves (`jsonlint`, and `gofmt` through its
//! stdin) go through [`FileSource`], so every commit of an upload is judged
//! by its own content rather than by the working tree.

use crate::context::CommitContext;
use std::io;
use std::path::PathBuf;

/// Reads a file at a given commit
pub trait FileSource: Send + Sync {
    /// Content of `path` (relative to the repository root) in `commit`
    ///
    /// # Errors
    ///
    /// Returns an error if the path does not exist in that commit or cannot
    /// be read.
    fn read(&self, commit: &CommitContext, path: &str) -> io::Result<Vec<u8>>;
}

/// Implement FileSource for closures
impl<F> FileSource for F
where
    F: Fn(&CommitContext, &str) -> io::Result<Vec<u8>> + Send + Sync,
{
    fn read(&self, commit: &CommitContext, path: &str) -> io::Result<Vec<u8>> {
        self(commit, path)
    }
}

/// Reads from a checked-out directory, ignoring the commit
///
/// Only right when the directory holds exactly the commit being checked.
#[derive(Debug, Clone)]
pub struct WorkingTree {
    root: PathBuf,
}

impl WorkingTree {
    /// Source rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for WorkingTree {
    fn read(&self, _commit: &CommitContext, path: &str) -> io::Result<Vec<u8>> {
        std::fs::read(self.root.join(path))
    }
}

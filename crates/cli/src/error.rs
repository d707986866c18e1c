//! Error types for CLI commands
//!
//! Structured errors for the parts the CLI owns (git access, output), with
//! engine and config errors passed through unchanged.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during command execution
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum CommandError {
    /// No git work tree contains the starting directory
    #[error("Not inside a git repository: {}", .path.display())]
    NotARepository {
        /// Directory the search started from
        path: PathBuf,
        /// The underlying git error
        #[source]
        source: git2::Error,
    },

    /// The repository has no work tree to run hooks in
    #[error("Repository has no work tree: {}", .0.display())]
    BareRepository(PathBuf),

    /// A commit given on the command line could not be resolved
    #[error("Unknown commit '{rev}'")]
    UnknownCommit {
        /// The revision as given
        rev: String,
        /// The underlying git error
        #[source]
        source: git2::Error,
    },

    /// Git operation error
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// Configuration or engine error
    #[error(transparent)]
    Preupload(#[from] preupload_core::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for command operations
pub type Result<T> = std::result::Result<T, CommandError>;

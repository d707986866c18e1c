//! Base error types for preupload
//!
//! Only fatal conditions live here. A hook that fails, or whose process cannot
//! be started, is recorded as a hook result by the engine instead of an error.

use std::path::PathBuf;
use thiserror::Error;

/// Base error type shared by all crates
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A config document has a syntax error, an unknown or duplicate section,
    /// or a value that cannot be used
    #[error("Malformed config{}: {message}", origin(.path, .line))]
    MalformedConfig {
        /// File the problem was found in
        path: Option<PathBuf>,
        /// 1-based line, when known
        line: Option<usize>,
        /// What is wrong
        message: String,
    },

    /// A builtin hook name that is not in the registry
    #[error("Unknown builtin hook '{name}' in [{section}]")]
    UnknownHook {
        /// Name as written
        name: String,
        /// Section it appeared in
        section: &'static str,
    },

    /// A `[Tool Paths]` key that no builtin hook uses
    #[error("Unknown tool '{name}' in [Tool Paths]")]
    UnknownTool {
        /// Key as written
        name: String,
    },

    /// The run was cancelled while hooks were executing
    #[error("Run interrupted")]
    Interrupted,

    /// Generic error message
    #[error("{0}")]
    Message(String),
}

impl Error {
    /// Build a `MalformedConfig` error that is not tied to a file position
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedConfig {
            path: None,
            line: None,
            message: message.into(),
        }
    }

    /// Whether this error aborts a run before any hook executes
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedConfig { .. } | Error::UnknownHook { .. } | Error::UnknownTool { .. }
        )
    }
}

fn origin(path: &Option<PathBuf>, line: &Option<usize>) -> String {
    match (path, line) {
        (Some(path), Some(line)) => format!(" ({}:{line})", path.display()),
        (Some(path), None) => format!(" ({})", path.display()),
        (None, Some(line)) => format!(" (line {line})"),
        (None, None) => String::new(),
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

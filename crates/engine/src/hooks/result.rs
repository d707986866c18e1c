//! Per-hook outcomes

use serde::Serialize;

/// Outcome class of one hook on one commit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookStatus {
    /// No changed file matched; no process was spawned
    #[serde(rename = "skipped-no-matching-files")]
    Skipped,
    /// The check was satisfied
    Passed,
    /// The check found problems
    Failed,
    /// The hook could not be run at all
    ExecutionError,
}

impl HookStatus {
    /// Whether this status makes the run fail
    pub fn is_failure(self) -> bool {
        matches!(self, HookStatus::Failed | HookStatus::ExecutionError)
    }

    /// Name used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            HookStatus::Skipped => "skipped-no-matching-files",
            HookStatus::Passed => "passed",
            HookStatus::Failed => "failed",
            HookStatus::ExecutionError => "execution-error",
        }
    }
}

/// Result of one hook on one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookResult {
    /// Hook name
    pub hook: String,
    /// Outcome class
    pub status: HookStatus,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
    /// `None` if no process ran or it was killed by a signal
    pub exit_code: Option<i32>,
    /// Files the hook was applied to
    pub files: Vec<String>,
    /// Arguments that were executed, program first
    pub argv: Vec<String>,
}

impl HookResult {
    /// Result with no output
    pub fn new(hook: impl Into<String>, status: HookStatus) -> Self {
        Self {
            hook: hook.into(),
            status,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            files: Vec::new(),
            argv: Vec::new(),
        }
    }

    /// Combined diagnostic output, stdout first
    pub fn output(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

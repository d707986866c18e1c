//! Command trait for the preupload CLI

use crate::common::RuntimeContext;
use crate::error::Result;

/// A subcommand that works on an opened project
///
/// Implementors get the repository, the effective policy and the hook
/// environment through `RuntimeContext`; `run` returns a `Verdict` while
/// listing commands return `()`.
pub trait Command {
    /// Value produced on success
    type Output;

    /// # Errors
    ///
    /// Returns a `CommandError` for git, configuration or output failures.
    /// Hook failures are part of the output, not errors.
    fn execute(&self, context: &RuntimeContext) -> Result<Self::Output>;
}

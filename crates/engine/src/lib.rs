//! # Preupload Engine
//!
//! Turns an effective policy into concrete hook invocations and runs them
//! against a series of commits.
//!
//! - **Hooks**: builtin registry, token expansion, tool paths, spec building
//!   and single-hook execution
//! - **Process**: the seam through which child processes are spawned
//! - **Source**: the seam through which file contents at a commit are read
//! - **Runner**: orchestration across commits and the final verdict
//!
//! # Example
//!
//! ```ignore
//! use preupload_engine::{CommitContext, ExpansionContext, HookRunner, build_hook_specs};
//!
//! let policy = ConfigLoader::new(&project_dir).load()?;
//! let env = ExpansionContext::new(&repo_root);
//! let specs = build_hook_specs(&policy, &env)?;
//!
//! let report = HookRunner::new().run_all(&commits, &specs, &env)?;
//! std::process::exit(report.verdict().exit_code());
//! ```

pub mod cancel;
pub mod context;
pub mod hooks;
pub mod process;
pub mod runner;
pub mod source;

// Re-export error types from core
pub use preupload_core::{Error, Result};

// Re-export commonly used types
pub use cancel::CancellationToken;
pub use context::{CommitContext, ExpansionContext, Project};
pub use hooks::{
    ArgTemplate, BuiltinHook, CheckKind, FileFilter, FileInput, HookExecutor, HookKind, HookResult,
    HookSpec, HookStatus, build_hook_specs, expand, resolve_tool,
};
pub use process::{DuctRunner, ProcessOutcome, ProcessOutput, ProcessRequest, ProcessRunner};
pub use runner::{CommitReport, HookRunner, HookRunnerBuilder, RunReport, Verdict, run_all};
pub use source::{FileSource, WorkingTree};

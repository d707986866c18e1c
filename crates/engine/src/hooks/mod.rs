//! Hook resolution and execution
//!
//! ## Module Organization
//!
//! - `registry`: the builtin hook catalogue
//! - `expand`: `${TOKEN}` expansion of argument templates
//! - `tools`: `[Tool Paths]` resolution
//! - `spec`: effective policy → runnable hook specs
//! - `executor`: runs one hook against one commit
//! - `result`: per-hook outcomes

pub mod executor;
pub mod expand;
pub mod registry;
pub mod result;
pub mod spec;
pub mod tools;

// Re-export main types for convenience
pub use executor::HookExecutor;
pub use expand::{ArgTemplate, Token, TokenValues, Word, expand};
pub use registry::{BuiltinHook, CheckKind, FileFilter, FileInput, KNOWN_TOOLS, is_known_tool};
pub use result::{HookResult, HookStatus};
pub use spec::{HookKind, HookSpec, build_hook_specs};
pub use tools::{resolve_tool, validate_tool_paths};

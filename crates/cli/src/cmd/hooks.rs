//! Hooks command implementation
//!
//! Lists the hooks the effective policy resolves to, in run order, without
//! running anything.

use clap::Args;
use owo_colors::OwoColorize;
use preupload_engine::hooks::TokenValues;
use preupload_engine::{BuiltinHook, ExpansionContext, HookKind, HookSpec, build_hook_specs};
use serde::Serialize;
use std::io::Write;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;
use crate::ui;

/// List resolved hooks
#[derive(Debug, Clone, Args)]
pub struct HooksCommand {
    /// Also list builtins the policy disables
    #[arg(short, long)]
    pub all: bool,

    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

/// One row of the listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookListing {
    /// Config key of the hook
    pub name: String,
    /// `script` or `builtin`
    pub kind: &'static str,
    /// What a builtin checks; absent for scripts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    /// Whether the hook runs
    pub enabled: bool,
    /// Extensions the hook applies to, `*` for every file
    pub files: String,
    /// Command with process-wide tokens expanded; empty for in-process checks
    pub command: Vec<String>,
}

impl HookListing {
    fn new(spec: &HookSpec, env: &ExpansionContext) -> Self {
        let values = TokenValues::process_wide(env);
        Self {
            name: spec.name.clone(),
            kind: match spec.kind {
                HookKind::Script => "script",
                HookKind::Builtin(_) => "builtin",
            },
            description: spec.builtin_hook().map(BuiltinHook::description),
            enabled: spec.enabled,
            files: spec.files.to_string(),
            command: spec
                .command
                .words()
                .iter()
                .map(|word| word.render(&values, None))
                .collect(),
        }
    }
}

/// Resolve the listing for a policy
///
/// # Errors
///
/// Returns an error if the policy names unknown hooks or tools, or a command
/// cannot be parsed.
pub fn list_hooks(context: &RuntimeContext, all: bool) -> Result<Vec<HookListing>> {
    Ok(build_hook_specs(&context.policy, &context.env)?
        .iter()
        .filter(|spec| all || spec.enabled)
        .map(|spec| HookListing::new(spec, &context.env))
        .collect())
}

impl Command for HooksCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let listing = list_hooks(context, self.all)?;
        let mut out = std::io::stdout().lock();

        if self.json {
            serde_json::to_writer_pretty(&mut out, &listing)?;
            writeln!(out)?;
            return Ok(());
        }

        if listing.is_empty() {
            writeln!(out, "No hooks enabled.")?;
            return Ok(());
        }

        let color = ui::stdout_color();
        for hook in &listing {
            let name = if !color {
                hook.name.clone()
            } else if hook.enabled {
                hook.name.bold().to_string()
            } else {
                hook.name.dimmed().to_string()
            };
            let state = if hook.enabled { "" } else { " (disabled)" };
            writeln!(out, "{name} [{}]{state}", hook.kind)?;
            if let Some(description) = hook.description {
                writeln!(out, "  {description}")?;
            }
            writeln!(out, "  files:   {}", hook.files)?;
            if hook.command.is_empty() {
                writeln!(out, "  command: (built in)")?;
            } else {
                writeln!(out, "  command: {}", hook.command.join(" "))?;
            }
        }
        Ok(())
    }
}

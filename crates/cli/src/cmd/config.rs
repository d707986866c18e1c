//! Config command implementation
//!
//! Shows the effective policy after merging, along with the files it came
//! from.

use clap::Args;
use indexmap::IndexMap;
use owo_colors::OwoColorize;
use preupload_config::{EffectivePolicy, Section};
use serde_json::json;
use std::fmt::Display;
use std::io::Write;

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;
use crate::ui;

/// Show the effective configuration
#[derive(Debug, Clone, Args)]
pub struct ConfigCommand {
    /// Print the policy as JSON
    #[arg(long)]
    pub json: bool,
}

impl Command for ConfigCommand {
    type Output = ();

    fn execute(&self, context: &RuntimeContext) -> Result<()> {
        let mut out = std::io::stdout().lock();
        if self.json {
            serde_json::to_writer_pretty(&mut out, &policy_json(&context.policy))?;
            writeln!(out)?;
        } else {
            write_policy(&context.policy, ui::stdout_color(), &mut out)?;
        }
        Ok(())
    }
}

/// The policy as a JSON object keyed by section name
pub fn policy_json(policy: &EffectivePolicy) -> serde_json::Value {
    json!({
        "sources": policy.sources,
        (Section::HookScripts.name()): policy.hook_scripts,
        (Section::BuiltinHooks.name()): policy.builtin_hooks,
        (Section::BuiltinHooksOptions.name()): policy.builtin_hooks_options,
        (Section::ToolPaths.name()): policy.tool_paths,
        (Section::Options.name()): policy.options,
    })
}

/// Write the policy in config file syntax; empty sections are left out
///
/// # Errors
///
/// Returns an error if writing to `out` fails.
pub fn write_policy(
    policy: &EffectivePolicy,
    color: bool,
    out: &mut impl Write,
) -> std::io::Result<()> {
    if policy.sources.is_empty() {
        writeln!(out, "# No configuration found")?;
    }
    for source in &policy.sources {
        writeln!(out, "# {}", source.display())?;
    }

    write_section(out, Section::HookScripts, &policy.hook_scripts, color)?;
    write_section(out, Section::BuiltinHooks, &policy.builtin_hooks, color)?;
    write_section(out, Section::BuiltinHooksOptions, &policy.builtin_hooks_options, color)?;
    write_section(out, Section::ToolPaths, &policy.tool_paths, color)?;
    write_section(out, Section::Options, &policy.options, color)
}

fn write_section<V: Display>(
    out: &mut impl Write,
    section: Section,
    entries: &IndexMap<String, V>,
    color: bool,
) -> std::io::Result<()> {
    if entries.is_empty() {
        return Ok(());
    }
    let header = format!("[{}]", section.name());
    writeln!(out)?;
    if color {
        writeln!(out, "{}", header.cyan().bold())?;
    } else {
        writeln!(out, "{header}")?;
    }
    for (key, value) in entries {
        writeln!(out, "{key} = {value}")?;
    }
    Ok(())
}

//! Preupload CLI library
//!
//! This library contains all the CLI logic for preupload, making it reusable
//! for testing and integration with other tools.

pub mod cmd;
pub mod command;
pub mod common;
pub mod error;
pub mod git;
pub mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::path::PathBuf;

use command::Command;
use common::RuntimeContext;

pub use preupload_config::logging;
pub use preupload_engine::Verdict;

/// Preupload - run configured checks on commits before they are uploaded
#[derive(Debug, Parser)]
#[command(name = "preupload")]
#[command(about = "Run configured checks on commits before they are uploaded")]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(long_about = "Run configured checks on commits before they are uploaded

Hooks are configured in PREUPLOAD.cfg at the project root, on top of an
optional GLOBAL-PREUPLOAD.cfg at the top of a multi-repository checkout.

Exit status:
  0    all hooks passed
  1    a hook failed or the configuration is invalid
  2    the checks were bypassed
  130  interrupted")]
pub struct Cli {
    /// Project directory (default: the git work tree containing the current directory)
    #[arg(long, env = "PREUPLOAD_DIR", value_name = "DIR", global = true)]
    pub dir: Option<PathBuf>,

    /// Project name passed to hooks as REPO_PROJECT (default: directory name)
    #[arg(long, env = "REPO_PROJECT", value_name = "NAME", global = true)]
    pub project: Option<String>,

    /// Enable verbose output (shows DEBUG level logs and every hook result)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write logs to a file (useful for debugging)
    #[arg(long, env = "PREUPLOAD_LOG_FILE", value_name = "FILE", global = true)]
    pub log_file: Option<PathBuf>,

    /// Subcommand to execute (default: run)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Arguments of the implicit `run`
    #[command(flatten)]
    pub run: cmd::run::RunCommand,
}

/// Available commands for preupload CLI
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the hooks over commits
    Run(cmd::run::RunCommand),

    /// List the hooks the configuration resolves to
    Hooks(cmd::hooks::HooksCommand),

    /// Show the effective configuration
    Config(cmd::config::ConfigCommand),
}

fn execute_command(command: Commands, context: &RuntimeContext) -> Result<Verdict> {
    match command {
        Commands::Run(run) => Ok(run.execute(context)?),
        Commands::Hooks(hooks) => {
            hooks.execute(context)?;
            Ok(Verdict::Passed)
        }
        Commands::Config(config) => {
            config.execute(context)?;
            Ok(Verdict::Passed)
        }
    }
}

/// Main entry point for the CLI application
///
/// # Errors
///
/// Returns an error if logging cannot be set up, the project cannot be
/// opened, or the configuration is invalid. Hook failures are not errors;
/// they are reported through the returned [`Verdict`].
pub fn run(cli: Cli) -> Result<Verdict> {
    // Initialize logging based on verbosity
    logging::init(cli.verbose, cli.log_file.as_deref())?;

    let command = match cli.command {
        Some(Commands::Run(run)) => Commands::Run(run.with_verbose(cli.verbose)),
        Some(command) => command,
        None => Commands::Run(cli.run.with_verbose(cli.verbose)),
    };

    if let Commands::Run(run) = &command
        && run.bypass
    {
        eprintln!("{}", "Preupload checks bypassed.".yellow());
        return Ok(Verdict::Bypassed);
    }

    let context = RuntimeContext::new(cli.dir.as_deref(), cli.project)
        .context("Failed to open project")?;
    execute_command(command, &context)
}

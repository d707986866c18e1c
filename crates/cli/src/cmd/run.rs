//! Run command implementation
//!
//! Checks the commits about to be uploaded against every enabled hook.

use clap::Args;
use preupload_core::Error;
use preupload_engine::{CancellationToken, HookRunner, Verdict, build_hook_specs};
use tracing::{debug, info, warn};

use crate::command::Command;
use crate::common::RuntimeContext;
use crate::error::Result;
use crate::ui::{self, ReportRenderer};

/// Run the hooks over commits
#[derive(Debug, Clone, Args)]
pub struct RunCommand {
    /// Commits to check (default: commits on HEAD not yet on its upstream)
    #[arg(value_name = "COMMIT")]
    pub commits: Vec<String>,

    /// Number of hooks to run at once on a commit
    #[arg(short, long, default_value_t = 1, value_name = "N")]
    pub jobs: usize,

    /// Print the full report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Skip all checks for this upload
    #[arg(long)]
    pub bypass: bool,

    /// List every hook result, not only failures
    #[arg(skip)]
    pub verbose: bool,
}

impl RunCommand {
    /// Set whether passing results are listed too
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Command for RunCommand {
    type Output = Verdict;

    fn execute(&self, context: &RuntimeContext) -> Result<Verdict> {
        let specs = build_hook_specs(&context.policy, &context.env)?;
        if !specs.iter().any(|spec| spec.enabled) {
            debug!("No hooks enabled");
            return Ok(Verdict::Passed);
        }

        let commits = context.repo.upload_commits(&self.commits)?;
        if commits.is_empty() {
            debug!("No commits to check");
            return Ok(Verdict::Passed);
        }
        info!(commits = commits.len(), hooks = specs.len(), "Running hooks");

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        if let Err(e) = ctrlc::set_handler(move || trigger.cancel()) {
            warn!("Cannot install interrupt handler: {e}");
        }

        let runner = HookRunner::builder()
            .file_source(context.repo.file_source()?)
            .cancellation(cancel)
            .jobs(self.jobs)
            .skip_merge_commits(context.policy.ignore_merged_commits()?)
            .build();

        let report = match runner.run_all(&commits, &specs, &context.env) {
            Ok(report) => report,
            Err(Error::Interrupted) => {
                eprintln!("Interrupted");
                return Ok(Verdict::Interrupted);
            }
            Err(e) => return Err(e.into()),
        };

        if self.json {
            ui::write_json(&report, &mut std::io::stdout().lock())?;
        } else {
            ReportRenderer::new(ui::stderr_color()).render(
                &report,
                &context.env.project.name,
                self.verbose,
                &mut std::io::stderr().lock(),
            )?;
        }

        Ok(report.verdict())
    }
}

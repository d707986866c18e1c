//! Run orchestration
//!
//! Commits are processed in the order given, oldest first. For each commit
//! every enabled hook runs in policy order, regardless of earlier failures.
//! With `jobs > 1` the hooks of one commit run on a bounded thread pool, but
//! results are still reported in policy order. Commits never overlap.

use crate::cancel::CancellationToken;
use crate::context::{CommitContext, ExpansionContext};
use crate::hooks::{HookExecutor, HookResult, HookSpec};
use crate::process::{DuctRunner, ProcessRunner};
use crate::source::FileSource;
use preupload_core::{Error, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

/// Results of every hook on one commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    /// The commit checked
    pub commit: CommitContext,
    /// Merge commit skipped because of `ignore_merged_commits`
    pub skipped_merge: bool,
    /// One result per enabled hook, in policy order
    pub results: Vec<HookResult>,
}

/// Results of a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Per-commit reports, oldest first
    pub commits: Vec<CommitReport>,
    /// True iff no hook failed or hit an execution error
    pub success: bool,
}

impl RunReport {
    fn new(commits: Vec<CommitReport>) -> Self {
        let success = commits
            .iter()
            .flat_map(|report| &report.results)
            .all(|result| !result.status.is_failure());
        Self { commits, success }
    }

    /// Failed hooks with the commit they failed on
    pub fn failures(&self) -> impl Iterator<Item = (&CommitContext, &HookResult)> {
        self.commits.iter().flat_map(|report| {
            report
                .results
                .iter()
                .filter(|result| result.status.is_failure())
                .map(move |result| (&report.commit, result))
        })
    }

    /// Passed or Failed, from `success`
    pub fn verdict(&self) -> Verdict {
        if self.success {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

/// Final outcome of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every hook passed or was skipped
    Passed,
    /// A hook failed, a hook could not run, or the configuration was invalid
    Failed,
    /// The checks were bypassed on request
    Bypassed,
    /// The run was cancelled
    Interrupted,
}

impl Verdict {
    /// Process exit status for the verdict
    pub const fn exit_code(self) -> i32 {
        match self {
            Verdict::Passed => 0,
            Verdict::Failed => 1,
            Verdict::Bypassed => 2,
            Verdict::Interrupted => 130,
        }
    }
}

/// Run every enabled hook on every commit with default settings
///
/// # Errors
///
/// Returns `Error::Interrupted` if the run was cancelled.
pub fn run_all(commits: &[CommitContext], specs: &[HookSpec], env: &ExpansionContext) -> Result<RunReport> {
    HookRunner::new().run_all(commits, specs, env)
}

/// Runs hooks across commits
///
/// # Examples
///
/// ```ignore
/// let runner = HookRunner::builder()
///     .cancellation(token.clone())
///     .jobs(4)
///     .skip_merge_commits(policy.ignore_merged_commits()?)
///     .build();
///
/// let report = runner.run_all(&commits, &specs, &env)?;
/// ```
pub struct HookRunner<P = DuctRunner>
where
    P: ProcessRunner,
{
    executor: HookExecutor<P>,
    jobs: usize,
    skip_merge_commits: bool,
}

impl HookRunner<DuctRunner> {
    /// Sequential runner that spawns real processes
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Start configuring a runner
    pub fn builder() -> HookRunnerBuilder<DuctRunner> {
        HookRunnerBuilder::new()
    }
}

impl Default for HookRunner<DuctRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> HookRunner<P>
where
    P: ProcessRunner,
{
    /// The single-hook executor
    pub fn executor(&self) -> &HookExecutor<P> {
        &self.executor
    }

    /// Run every enabled hook on every commit
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` if the run was cancelled; no partial
    /// report is returned.
    #[tracing::instrument(skip_all, fields(commits = commits.len(), hooks = specs.len(), jobs = self.jobs))]
    pub fn run_all(
        &self,
        commits: &[CommitContext],
        specs: &[HookSpec],
        env: &ExpansionContext,
    ) -> Result<RunReport> {
        let enabled: Vec<&HookSpec> = specs.iter().filter(|spec| spec.enabled).collect();
        tracing::debug!(enabled = enabled.len(), "Running hooks");

        let pool = if self.jobs > 1 {
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(self.jobs)
                    .build()
                    .map_err(|e| Error::Message(format!("failed to start worker pool: {e}")))?,
            )
        } else {
            None
        };

        let mut reports = Vec::with_capacity(commits.len());
        for commit in commits {
            let span = tracing::info_span!("commit", commit = %commit.short_id());
            let _guard = span.enter();

            if self.skip_merge_commits && commit.merge {
                tracing::debug!("Skipping merge commit");
                reports.push(CommitReport {
                    commit: commit.clone(),
                    skipped_merge: true,
                    results: Vec::new(),
                });
                continue;
            }

            let results = match &pool {
                // Parallel execution within one commit, collected in policy order
                Some(pool) => pool.install(|| {
                    enabled
                        .par_iter()
                        .map(|spec| self.executor.run(spec, commit, env))
                        .collect::<Result<Vec<_>>>()
                }),
                None => enabled
                    .iter()
                    .map(|spec| self.executor.run(spec, commit, env))
                    .collect::<Result<Vec<_>>>(),
            };

            let results = match results {
                Ok(results) => results,
                Err(e) => {
                    // Stop hooks still running on other workers
                    self.executor.cancellation_token().cancel();
                    return Err(e);
                }
            };

            reports.push(CommitReport {
                commit: commit.clone(),
                skipped_merge: false,
                results,
            });
        }

        let report = RunReport::new(reports);
        tracing::debug!(success = report.success, "Run finished");
        Ok(report)
    }
}

/// Builder for [`HookRunner`]
pub struct HookRunnerBuilder<P = DuctRunner> {
    process_runner: P,
    file_source: Option<Arc<dyn FileSource>>,
    cancel: CancellationToken,
    jobs: usize,
    skip_merge_commits: bool,
}

impl HookRunnerBuilder<DuctRunner> {
    /// Builder with real processes, one job and the working tree as source
    pub fn new() -> Self {
        Self {
            process_runner: DuctRunner::new(),
            file_source: None,
            cancel: CancellationToken::new(),
            jobs: 1,
            skip_merge_commits: false,
        }
    }
}

impl Default for HookRunnerBuilder<DuctRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> HookRunnerBuilder<P> {
    /// Replace the process runner
    pub fn process_runner<Q>(self, process_runner: Q) -> HookRunnerBuilder<Q>
    where
        Q: ProcessRunner,
    {
        HookRunnerBuilder {
            process_runner,
            file_source: self.file_source,
            cancel: self.cancel,
            jobs: self.jobs,
            skip_merge_commits: self.skip_merge_commits,
        }
    }

    /// Where hooks read file contents at a commit
    #[must_use]
    pub fn file_source(mut self, source: impl FileSource + 'static) -> Self {
        self.file_source = Some(Arc::new(source));
        self
    }

    /// Token that stops the run when cancelled
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Hooks run at once within a commit (minimum 1)
    #[must_use]
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Report merge commits without running hooks on them
    #[must_use]
    pub fn skip_merge_commits(mut self, skip: bool) -> Self {
        self.skip_merge_commits = skip;
        self
    }

    /// Finish the runner
    pub fn build(self) -> HookRunner<P>
    where
        P: ProcessRunner,
    {
        let mut executor = HookExecutor::with_process_runner(self.process_runner).cancellation(self.cancel);
        if let Some(source) = self.file_source {
            executor = executor.shared_file_source(source);
        }
        HookRunner {
            executor,
            jobs: self.jobs,
            skip_merge_commits: self.skip_merge_commits,
        }
    }
}

//! Hook execution
//!
//! Runs one [`HookSpec`] against one commit and classifies the outcome. A
//! failing check or a program that cannot be started is a result, not an
//! error; only cancellation aborts.

use super::expand::TokenValues;
use super::registry::{CheckKind, FileInput};
use super::result::{HookResult, HookStatus};
use super::spec::HookSpec;
use crate::cancel::CancellationToken;
use crate::context::{CommitContext, ExpansionContext};
use crate::process::{DuctRunner, ProcessOutcome, ProcessOutput, ProcessRequest, ProcessRunner};
use crate::source::{FileSource, WorkingTree};
use preupload_core::{Error, Result};
use std::fmt;
use std::io;
use std::sync::Arc;

// Printed by git-clang-format for every file that needs reformatting
const DIFF_MARKER_PREFIX: &str = "+++ b/";

// Printed when none of the changed files is a clang-format source
const NO_MODIFIED_FILES: &str = "no modified files to format";

// Name a stdin-fed tool gives its input
const STDIN_NAME: &str = "<standard input>";

/// Runs single hooks
///
/// File contents come from the configured [`FileSource`]; without one they
/// are read from the working tree at the repository root.
#[derive(Clone, Default)]
pub struct HookExecutor<P = DuctRunner> {
    runner: P,
    cancel: CancellationToken,
    source: Option<Arc<dyn FileSource>>,
}

impl<P: fmt::Debug> fmt::Debug for HookExecutor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookExecutor")
            .field("runner", &self.runner)
            .field("cancel", &self.cancel)
            .field("file_source", &self.source.is_some())
            .finish()
    }
}

impl HookExecutor<DuctRunner> {
    /// Executor that spawns real processes
    pub fn new() -> Self {
        Self::default()
    }
}

impl<P> HookExecutor<P>
where
    P: ProcessRunner,
{
    /// Executor that spawns through `runner`
    pub fn with_process_runner(runner: P) -> Self {
        Self {
            runner,
            cancel: CancellationToken::new(),
            source: None,
        }
    }

    /// Share a cancellation token with the executor
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Read file contents through `source`
    #[must_use]
    pub fn file_source(self, source: impl FileSource + 'static) -> Self {
        self.shared_file_source(Arc::new(source))
    }

    /// Like [`file_source`](Self::file_source), for a source already shared
    #[must_use]
    pub fn shared_file_source(mut self, source: Arc<dyn FileSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// The process seam in use
    pub fn process_runner(&self) -> &P {
        &self.runner
    }

    /// Token that aborts running hooks
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Run `spec` against `ctx`
    ///
    /// 1. Select the changed files the hook applies to; with none (and a
    ///    filter other than "always") the hook is skipped without spawning.
    /// 2. Expand the command template.
    /// 3. Run it in the repository root with the hook environment added;
    ///    stdin-fed hooks run once per file with its content at the commit.
    /// 4. Judge the output according to the hook's check.
    ///
    /// # Errors
    ///
    /// Returns `Error::Interrupted` if cancellation was requested before or
    /// while the hook ran.
    #[tracing::instrument(skip_all, fields(hook = %spec.name, commit = %ctx.short_id()))]
    pub fn run(&self, spec: &HookSpec, ctx: &CommitContext, env: &ExpansionContext) -> Result<HookResult> {
        if self.cancel.is_cancelled() {
            return Err(Error::Interrupted);
        }

        let files = spec.files.select(&ctx.files);
        if files.is_empty() && !spec.files.is_always() {
            tracing::debug!("Skipping hook: no matching files");
            return Ok(HookResult::new(&spec.name, HookStatus::Skipped));
        }

        if spec.check == CheckKind::JsonSyntax {
            return Ok(self.check_json(spec, files, ctx, env));
        }

        let values = TokenValues::for_commit(ctx, env);
        let argv = match spec.input {
            FileInput::Arguments => spec.command.expand(&values.with_files(&files)),
            FileInput::Stdin => spec.command.expand(&values.with_files(&[])),
        };
        let child_env = env.child_env(ctx);

        let start = std::time::Instant::now();
        let mut result = HookResult::new(&spec.name, HookStatus::Passed);
        match spec.input {
            FileInput::Arguments => {
                let request = ProcessRequest {
                    argv: &argv,
                    cwd: env.repo_root(),
                    env: &child_env,
                    stdin: None,
                };
                let outcome = self.runner.run(&request, &self.cancel);
                absorb(&mut result, spec.check, outcome)?;
            }
            FileInput::Stdin => {
                for file in &files {
                    if self.cancel.is_cancelled() {
                        return Err(Error::Interrupted);
                    }
                    let content = match self.read(ctx, env, file) {
                        Ok(content) => content,
                        Err(e) => {
                            result.status = HookStatus::ExecutionError;
                            result.stderr = format!("{file}: cannot read file: {e}");
                            break;
                        }
                    };
                    let request = ProcessRequest {
                        argv: &argv,
                        cwd: env.repo_root(),
                        env: &child_env,
                        stdin: Some(content.as_slice()),
                    };
                    let mut outcome = self.runner.run(&request, &self.cancel);
                    if let ProcessOutcome::Exited(output) = &mut outcome {
                        output.stdout = output.stdout.replace(STDIN_NAME, file);
                    }
                    absorb(&mut result, spec.check, outcome)?;
                    if result.status == HookStatus::ExecutionError {
                        break;
                    }
                }
            }
        }

        if spec.check == CheckKind::ClangFormatDiff && result.status == HookStatus::Failed {
            result.stdout = clang_format_report(&argv, &result.stdout);
        }

        tracing::debug!(
            status = result.status.as_str(),
            elapsed_ms = start.elapsed().as_millis(),
            "Hook finished"
        );

        result.files = files;
        result.argv = argv;
        Ok(result)
    }

    fn read(&self, ctx: &CommitContext, env: &ExpansionContext, file: &str) -> io::Result<Vec<u8>> {
        match &self.source {
            Some(source) => source.read(ctx, file),
            None => WorkingTree::new(env.repo_root()).read(ctx, file),
        }
    }

    /// Parse every file as JSON, in process
    fn check_json(
        &self,
        spec: &HookSpec,
        files: Vec<String>,
        ctx: &CommitContext,
        env: &ExpansionContext,
    ) -> HookResult {
        let mut invalid = Vec::new();
        let mut unreadable = Vec::new();

        for file in &files {
            match self.read(ctx, env, file) {
                Ok(bytes) => {
                    if let Err(e) = serde_json::from_slice::<serde_json::Value>(&bytes) {
                        invalid.push(format!("{file}: {e}"));
                    }
                }
                Err(e) => unreadable.push(format!("{file}: cannot read file: {e}")),
            }
        }

        let mut result = HookResult::new(&spec.name, HookStatus::Passed);
        if !unreadable.is_empty() {
            result.status = HookStatus::ExecutionError;
            result.stderr = unreadable.join("\n");
        } else if !invalid.is_empty() {
            result.status = HookStatus::Failed;
        }
        if !invalid.is_empty() {
            result.stdout = invalid.join("\n");
        }
        result.files = files;
        result
    }
}

/// Fold one process outcome into `result`
///
/// Output accumulates across runs; the first failing run decides the exit
/// code shown.
fn absorb(result: &mut HookResult, check: CheckKind, outcome: ProcessOutcome) -> Result<()> {
    match outcome {
        ProcessOutcome::Interrupted => return Err(Error::Interrupted),
        ProcessOutcome::SpawnFailed(message) => {
            tracing::debug!(error = %message, "Hook could not be started");
            result.status = HookStatus::ExecutionError;
            result.stderr.push_str(&message);
        }
        ProcessOutcome::Exited(output) => {
            let status = judge(check, &output);
            if result.status == HookStatus::Passed {
                result.status = status;
                result.exit_code = output.exit_code;
            }
            result.stdout.push_str(&output.stdout);
            result.stderr.push_str(&output.stderr);
        }
    }
    Ok(())
}

fn judge(check: CheckKind, output: &ProcessOutput) -> HookStatus {
    let passed = match check {
        CheckKind::ExitStatus | CheckKind::JsonSyntax => output.success(),
        CheckKind::EmptyOutput => output.success() && output.stdout.trim().is_empty(),
        CheckKind::ClangFormatDiff => {
            output.stdout.trim_end_matches('\n') == NO_MODIFIED_FILES
                || (output.success() && diff_files(&output.stdout).is_empty())
        }
    };

    if passed {
        HookStatus::Passed
    } else {
        HookStatus::Failed
    }
}

fn diff_files(stdout: &str) -> Vec<&str> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(DIFF_MARKER_PREFIX))
        .map(str::trim_end)
        .collect()
}

/// Summary of files that need reformatting, followed by the raw diff
fn clang_format_report(argv: &[String], stdout: &str) -> String {
    let files = diff_files(stdout);
    if files.is_empty() {
        return stdout.to_string();
    }

    // The fix command is the check command without `--diff` and what follows
    let fix_len = argv
        .iter()
        .position(|arg| arg == "--diff")
        .unwrap_or(argv.len());

    let mut report = String::from("The following files have formatting errors:\n");
    for file in files {
        report.push('\t');
        report.push_str(file);
        report.push('\n');
    }
    report.push_str(&format!(
        "You can run `{}` to fix this\n\n",
        shell_words::join(&argv[..fix_len])
    ));
    report.push_str(stdout);
    report
}

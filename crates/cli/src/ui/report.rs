//! Rendering of run reports
//!
//! Failures are grouped per commit:
//!
//! ```text
//! ERROR: platform/build: hooks failed
//! COMMIT: 0123456789ab (Fix the widget)
//! HOOK: jsonlint
//!   FILES: a.json
//!     a.json: expected value at line 1 column 1
//!
//! FATAL: Preupload failed due to above error(s).
//! ```

use owo_colors::OwoColorize;
use preupload_engine::{HookResult, HookStatus, RunReport};
use std::io::{self, Write};

/// Writes human readable reports
#[derive(Debug, Clone, Copy)]
pub struct ReportRenderer {
    color: bool,
}

impl ReportRenderer {
    /// Renderer with or without ANSI colors
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Write every failure of `report`, then the closing verdict line
    ///
    /// Nothing is written for a clean run unless `verbose` is set, in which
    /// case each hook gets a one-line status.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `out` fails.
    pub fn render(
        &self,
        report: &RunReport,
        project: &str,
        verbose: bool,
        out: &mut impl Write,
    ) -> io::Result<()> {
        for commit_report in &report.commits {
            if verbose {
                self.render_statuses(commit_report, out)?;
            }

            let failures: Vec<&HookResult> = commit_report
                .results
                .iter()
                .filter(|result| result.status.is_failure())
                .collect();
            if failures.is_empty() {
                continue;
            }

            writeln!(out, "{}: {project}: hooks failed", self.error("ERROR"))?;
            writeln!(
                out,
                "{}: {} ({})",
                self.heading("COMMIT"),
                commit_report.commit.short_id(),
                commit_report.commit.summary()
            )?;
            for result in failures {
                self.render_failure(result, out)?;
            }
        }

        if !report.success {
            writeln!(
                out,
                "{}: Preupload failed due to above error(s).",
                self.error("FATAL")
            )?;
        }
        Ok(())
    }

    fn render_failure(&self, result: &HookResult, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}: {}", self.heading("HOOK"), result.hook)?;
        if !result.files.is_empty() {
            writeln!(out, "  FILES: {}", result.files.join(" "))?;
        }
        if result.status == HookStatus::ExecutionError {
            writeln!(out, "  {}", self.warning("could not be run"))?;
        }
        for line in result.output().lines() {
            writeln!(out, "    {line}")?;
        }
        writeln!(out)
    }

    fn render_statuses(
        &self,
        commit_report: &preupload_engine::CommitReport,
        out: &mut impl Write,
    ) -> io::Result<()> {
        let commit = &commit_report.commit;
        if commit_report.skipped_merge {
            writeln!(out, "{} {} (merge commit)", self.dim("skip"), commit.short_id())?;
            return Ok(());
        }
        for result in &commit_report.results {
            let status = match result.status {
                HookStatus::Passed => self.success(result.status.as_str()),
                HookStatus::Skipped => self.dim(result.status.as_str()),
                HookStatus::Failed | HookStatus::ExecutionError => {
                    self.error(result.status.as_str())
                }
            };
            writeln!(out, "{} {}: {status}", commit.short_id(), result.hook)?;
        }
        Ok(())
    }

    fn error(&self, text: &str) -> String {
        if self.color {
            text.red().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn warning(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn success(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

/// Write `report` as pretty JSON followed by a newline
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &RunReport, out: &mut impl Write) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use preupload_engine::{CommitContext, CommitReport};

    fn commit() -> CommitContext {
        CommitContext::new(
            "0123456789abcdef0123456789abcdef01234567",
            "Fix the widget\n\nBug: 1\n",
            vec!["a.json".to_string(), "b.txt".to_string()],
        )
    }

    fn result(hook: &str, status: HookStatus, stdout: &str) -> HookResult {
        let mut result = HookResult::new(hook, status);
        result.stdout = stdout.to_string();
        result
    }

    fn report(results: Vec<HookResult>) -> RunReport {
        let success = results.iter().all(|r| !r.status.is_failure());
        RunReport {
            commits: vec![CommitReport {
                commit: commit(),
                skipped_merge: false,
                results,
            }],
            success,
        }
    }

    fn render(report: &RunReport, verbose: bool) -> String {
        let mut out = Vec::new();
        ReportRenderer::new(false)
            .render(report, "platform/build", verbose, &mut out)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_clean_run_prints_nothing() {
        let report = report(vec![result("jsonlint", HookStatus::Passed, "")]);
        assert_eq!(render(&report, false), "");
    }

    #[test]
    fn test_failure_layout() {
        let mut failed = result("jsonlint", HookStatus::Failed, "a.json: bad\nsecond line\n");
        failed.files = vec!["a.json".to_string()];
        let report = report(vec![result("gofmt", HookStatus::Skipped, ""), failed]);

        assert_eq!(
            render(&report, false),
            "ERROR: platform/build: hooks failed\n\
             COMMIT: 0123456789ab (Fix the widget)\n\
             HOOK: jsonlint\n  FILES: a.json\n    a.json: bad\n    second line\n\n\
             FATAL: Preupload failed due to above error(s).\n"
        );
    }

    #[test]
    fn test_execution_error_is_marked() {
        let mut broken = result("pylint", HookStatus::ExecutionError, "");
        broken.stderr = "pylint: not found".to_string();
        let output = render(&report(vec![broken]), false);

        assert!(output.contains("HOOK: pylint\n  could not be run\n    pylint: not found\n"));
        assert!(output.ends_with("FATAL: Preupload failed due to above error(s).\n"));
    }

    #[test]
    fn test_verbose_lists_every_hook() {
        let report = report(vec![
            result("jsonlint", HookStatus::Passed, ""),
            result("gofmt", HookStatus::Skipped, ""),
        ]);
        assert_eq!(
            render(&report, true),
            "0123456789ab jsonlint: passed\n0123456789ab gofmt: skipped-no-matching-files\n"
        );
    }

    #[test]
    fn test_json_report() {
        let report = report(vec![result("jsonlint", HookStatus::Failed, "bad")]);
        let mut out = Vec::new();
        write_json(&report, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["commits"][0]["results"][0]["status"], "failed");
        assert_eq!(value["commits"][0]["commit"]["files"][1], "b.txt");
    }
}

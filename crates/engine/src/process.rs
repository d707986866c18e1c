//! Child process execution
//!
//! Hooks spawn processes through the [`ProcessRunner`] trait. [`DuctRunner`]
//! is the real implementation; tests substitute closures to observe what
//! would have been run.

use crate::cancel::CancellationToken;
use indexmap::IndexMap;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use std::time::Duration;

/// A process to run
#[derive(Debug, Clone, Copy)]
pub struct ProcessRequest<'a> {
    /// Program first, then arguments
    pub argv: &'a [String],
    /// Working directory of the child
    pub cwd: &'a Path,
    /// Added to the inherited environment
    pub env: &'a IndexMap<String, String>,
    /// Bytes written to the child's stdin; `None` closes it
    pub stdin: Option<&'a [u8]>,
}

/// Captured result of a process that ran to completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
    /// `None` when terminated by a signal
    pub exit_code: Option<i32>,
}

impl ProcessOutput {
    /// Exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// What happened to a process
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process ran to completion
    Exited(ProcessOutput),
    /// The process could not be started; the message says why
    SpawnFailed(String),
    /// Cancellation was requested and the process was killed
    Interrupted,
}

/// Runs child processes
pub trait ProcessRunner: Send + Sync {
    /// Run to completion, or until `cancel` is set
    fn run(&self, request: &ProcessRequest<'_>, cancel: &CancellationToken) -> ProcessOutcome;
}

/// Implement ProcessRunner for closures
impl<F> ProcessRunner for F
where
    F: Fn(&ProcessRequest<'_>, &CancellationToken) -> ProcessOutcome + Send + Sync,
{
    fn run(&self, request: &ProcessRequest<'_>, cancel: &CancellationToken) -> ProcessOutcome {
        self(request, cancel)
    }
}

/// Spawns processes with duct, without a shell
///
/// stdout and stderr are captured separately; stdin gets the request's
/// bytes or is closed. While the child runs the cancellation token is
/// polled; once it is set the child is killed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuctRunner;

// How often a running child is checked for exit and cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(20);

impl DuctRunner {
    /// Runner for real child processes
    pub fn new() -> Self {
        Self
    }
}

impl ProcessRunner for DuctRunner {
    #[tracing::instrument(skip_all, fields(program = ?request.argv.first(), cwd = %request.cwd.display()))]
    fn run(&self, request: &ProcessRequest<'_>, cancel: &CancellationToken) -> ProcessOutcome {
        let Some((program, args)) = request.argv.split_first() else {
            return ProcessOutcome::SpawnFailed("empty command".to_string());
        };

        let program = match resolve_program(program, request.cwd) {
            Ok(path) => path,
            Err(message) => return ProcessOutcome::SpawnFailed(message),
        };

        tracing::debug!("Executing: {} {:?}", program.display(), args);

        // Inherits the parent environment
        let expression = duct::cmd(program.clone(), args).dir(request.cwd);
        let expression = match request.stdin {
            Some(bytes) => expression.stdin_bytes(bytes.to_vec()),
            None => expression.stdin_null(),
        };
        let mut expression = expression
            .stdout_capture()
            .stderr_capture()
            .unchecked();
        for (key, value) in request.env {
            expression = expression.env(key, value);
        }

        let handle = match expression.start() {
            Ok(handle) => handle,
            Err(e) => {
                return ProcessOutcome::SpawnFailed(format!(
                    "failed to start '{}': {e}",
                    program.display()
                ));
            }
        };

        loop {
            if cancel.is_cancelled() {
                tracing::debug!("Cancellation requested, killing child");
                if let Err(e) = handle.kill() {
                    tracing::warn!(error = %e, "Failed to kill child process");
                }
                return ProcessOutcome::Interrupted;
            }

            match handle.try_wait() {
                Ok(Some(output)) => {
                    return ProcessOutcome::Exited(ProcessOutput {
                        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                        exit_code: output.status.code(),
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    return ProcessOutcome::SpawnFailed(format!(
                        "failed to wait for '{}': {e}",
                        program.display()
                    ));
                }
            }
        }
    }
}

/// Locate the executable for `program`
///
/// - `tools/lint.sh` → `<cwd>/tools/lint.sh`
/// - `/usr/bin/lint` → unchanged
/// - `lint` → looked up on `PATH`
fn resolve_program(program: &str, cwd: &Path) -> Result<PathBuf, String> {
    let path = Path::new(program);

    if program.contains('/') || program.contains(MAIN_SEPARATOR) {
        return Ok(if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        });
    }

    which::which(program).map_err(|e| format!("{program}: command not found ({e})"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_resolve_relative_program_against_cwd() {
        let resolved = resolve_program("tools/check.sh", Path::new("/work/proj")).unwrap();
        assert_eq!(resolved, PathBuf::from("/work/proj/tools/check.sh"));

        let resolved = resolve_program("/bin/true", Path::new("/work/proj")).unwrap();
        assert_eq!(resolved, PathBuf::from("/bin/true"));
    }

    #[test]
    fn test_resolve_missing_program() {
        let message = resolve_program("definitely-not-a-real-tool-xyz", Path::new("/")).unwrap_err();
        assert!(message.contains("command not found"));
    }

    #[test]
    fn test_closure_runner() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = {
            let seen = Arc::clone(&seen);
            move |request: &ProcessRequest<'_>, _: &CancellationToken| {
                seen.lock().unwrap().push(request.argv.to_vec());
                ProcessOutcome::Exited(ProcessOutput::default())
            }
        };

        let argv = vec!["lint".to_string(), "a.c".to_string()];
        let env = IndexMap::new();
        let request = ProcessRequest {
            argv: &argv,
            cwd: Path::new("/"),
            env: &env,
            stdin: None,
        };
        recorder.run(&request, &CancellationToken::new());
        assert_eq!(seen.lock().unwrap().as_slice(), &[argv]);
    }

    #[cfg(unix)]
    #[test]
    fn test_duct_runner_captures_streams_separately() {
        let temp = tempfile::tempdir().unwrap();
        let argv: Vec<String> = ["sh", "-c", "echo out; echo err >&2; exit 3"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let env = IndexMap::new();
        let request = ProcessRequest {
            argv: &argv,
            cwd: temp.path(),
            env: &env,
            stdin: None,
        };

        match DuctRunner::new().run(&request, &CancellationToken::new()) {
            ProcessOutcome::Exited(output) => {
                assert_eq!(output.stdout, "out\n");
                assert_eq!(output.stderr, "err\n");
                assert_eq!(output.exit_code, Some(3));
                assert!(!output.success());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_duct_runner_passes_env_and_cwd() {
        let temp = tempfile::tempdir().unwrap();
        let argv: Vec<String> = ["sh", "-c", "printf '%s' \"$PREUPLOAD_COMMIT\"; pwd >&2"]
            .iter()
            .map(ToString::to_string)
            .collect();
        let env = IndexMap::from([("PREUPLOAD_COMMIT".to_string(), "abc".to_string())]);
        let request = ProcessRequest {
            argv: &argv,
            cwd: temp.path(),
            env: &env,
            stdin: None,
        };

        let ProcessOutcome::Exited(output) = DuctRunner::new().run(&request, &CancellationToken::new())
        else {
            panic!("process did not exit normally");
        };
        assert_eq!(output.stdout, "abc");
        let cwd = std::fs::canonicalize(temp.path()).unwrap();
        assert_eq!(
            std::fs::canonicalize(output.stderr.trim()).unwrap(),
            cwd
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_duct_runner_feeds_stdin() {
        let temp = tempfile::tempdir().unwrap();
        let argv: Vec<String> = ["sh", "-c", "tr a-z A-Z"].iter().map(ToString::to_string).collect();
        let env = IndexMap::new();
        let request = ProcessRequest {
            argv: &argv,
            cwd: temp.path(),
            env: &env,
            stdin: Some(b"package main\n".as_slice()),
        };

        let ProcessOutcome::Exited(output) = DuctRunner::new().run(&request, &CancellationToken::new())
        else {
            panic!("process did not exit normally");
        };
        assert_eq!(output.stdout, "PACKAGE MAIN\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_duct_runner_cancellation_kills_child() {
        let temp = tempfile::tempdir().unwrap();
        let argv: Vec<String> = ["sleep", "30"].iter().map(ToString::to_string).collect();
        let env = IndexMap::new();
        let request = ProcessRequest {
            argv: &argv,
            cwd: temp.path(),
            env: &env,
            stdin: None,
        };

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let timer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let start = std::time::Instant::now();
        let outcome = DuctRunner::new().run(&request, &cancel);
        timer.join().unwrap();

        assert_eq!(outcome, ProcessOutcome::Interrupted);
        assert!(start.elapsed() < Duration::from_secs(10));
    }
}

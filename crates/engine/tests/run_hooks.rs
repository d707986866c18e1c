//! End-to-end runs with real processes

use preupload_config::{ConfigDocument, EffectivePolicy};
use preupload_engine::{
    CommitContext, ExpansionContext, HookRunner, HookStatus, Verdict, build_hook_specs, run_all,
};
use std::fs;
use tempfile::TempDir;

fn policy(text: &str) -> EffectivePolicy {
    EffectivePolicy::merge(None, Some(&ConfigDocument::parse(text).unwrap()))
}

fn commit(files: &[&str]) -> CommitContext {
    CommitContext::new(
        "0123456789abcdef0123456789abcdef01234567",
        "Add files\n\nTest: none",
        files.iter().map(ToString::to_string).collect(),
    )
}

#[test]
fn test_jsonlint_end_to_end() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.json"), "{\"valid\": true}\n").unwrap();
    fs::write(temp.path().join("b.txt"), "not json at all").unwrap();

    let env = ExpansionContext::new(temp.path());
    let specs = build_hook_specs(&policy("[Builtin Hooks]\njsonlint = true\n"), &env).unwrap();

    let report = run_all(&[commit(&["a.json", "b.txt"])], &specs, &env).unwrap();

    assert_eq!(report.commits.len(), 1);
    let results = &report.commits[0].results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].hook, "jsonlint");
    assert_eq!(results[0].status, HookStatus::Passed);
    assert_eq!(results[0].files, vec!["a.json"]);
    assert!(report.success);
}

#[cfg(unix)]
#[test]
fn test_spaced_file_name_reaches_script_as_one_argument() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("my file.txt"), "x").unwrap();

    let env = ExpansionContext::new(temp.path());
    let specs = build_hook_specs(
        &policy(
            "[Hook Scripts]\nexists = sh -c 'for f in \"$@\"; do test -f \"$f\" || exit 1; done' hook ${PREUPLOAD_FILES}\n",
        ),
        &env,
    )
    .unwrap();

    let report = run_all(&[commit(&["my file.txt"])], &specs, &env).unwrap();
    let result = &report.commits[0].results[0];
    assert_eq!(result.status, HookStatus::Passed, "{}", result.output());
    assert_eq!(result.argv.last().map(String::as_str), Some("my file.txt"));
}

#[cfg(unix)]
#[test]
fn test_failing_script_fails_the_run() {
    let temp = TempDir::new().unwrap();
    let env = ExpansionContext::new(temp.path());
    let specs = build_hook_specs(
        &policy("[Hook Scripts]\nfail = sh -c 'echo \"bad commit $PREUPLOAD_COMMIT\"; exit 4'\npass = true\n"),
        &env,
    )
    .unwrap();

    let report = run_all(&[commit(&[])], &specs, &env).unwrap();
    let results = &report.commits[0].results;

    assert_eq!(results[0].status, HookStatus::Failed);
    assert_eq!(results[0].exit_code, Some(4));
    assert_eq!(
        results[0].stdout,
        "bad commit 0123456789abcdef0123456789abcdef01234567\n"
    );
    assert_eq!(results[1].status, HookStatus::Passed);
    assert!(!report.success);
    assert_eq!(report.verdict(), Verdict::Failed);
}

#[cfg(unix)]
#[test]
fn test_script_relative_to_repo_root() {
    use std::os::unix::fs::PermissionsExt;

    let temp = TempDir::new().unwrap();
    let tools = temp.path().join("tools");
    fs::create_dir_all(&tools).unwrap();
    let script = tools.join("check.sh");
    fs::write(&script, "#!/bin/sh\necho \"$1\"\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let env = ExpansionContext::new(temp.path());
    let specs = build_hook_specs(
        &policy("[Hook Scripts]\nlocal = tools/check.sh ${BUILD_OS}\n"),
        &env,
    )
    .unwrap();

    let report = HookRunner::builder()
        .jobs(2)
        .build()
        .run_all(&[commit(&[])], &specs, &env)
        .unwrap();
    let result = &report.commits[0].results[0];
    assert_eq!(result.status, HookStatus::Passed, "{}", result.output());
    assert_eq!(result.stdout.trim(), env.build_os.as_str());
}

#[test]
fn test_missing_tool_is_execution_error() {
    let temp = TempDir::new().unwrap();
    let env = ExpansionContext::new(temp.path());
    let specs = build_hook_specs(
        &policy(
            "[Builtin Hooks]\npylint = true\n[Tool Paths]\npylint = ${REPO_ROOT}/no/such/pylint\n",
        ),
        &env,
    )
    .unwrap();

    let report = run_all(&[commit(&["a.py"])], &specs, &env).unwrap();
    assert_eq!(report.commits[0].results[0].status, HookStatus::ExecutionError);
    assert!(!report.success);
}

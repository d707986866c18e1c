//! `[Tool Paths]` resolution

use super::expand::{TokenValues, Word};
use super::registry::is_known_tool;
use crate::context::ExpansionContext;
use preupload_config::EffectivePolicy;
use preupload_core::{Error, Result};

/// Executable to run for `tool`
///
/// Returns the `[Tool Paths]` entry with `${REPO_ROOT}` and `${BUILD_OS}`
/// substituted, or the bare tool name when there is no entry. Other tokens
/// are left as written. The result is not checked for existence.
pub fn resolve_tool(tool: &str, policy: &EffectivePolicy, env: &ExpansionContext) -> String {
    match policy.tool_path(tool) {
        Some(path) => Word::parse(path.trim()).render(&TokenValues::process_wide(env), None),
        None => tool.to_string(),
    }
}

/// Reject `[Tool Paths]` keys no builtin uses
///
/// # Errors
///
/// Returns `Error::UnknownTool` for the first unknown key.
pub fn validate_tool_paths(policy: &EffectivePolicy) -> Result<()> {
    match policy.tool_paths.keys().find(|tool| !is_known_tool(tool)) {
        Some(tool) => Err(Error::UnknownTool { name: tool.clone() }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use preupload_config::ConfigDocument;
    use preupload_core::BuildOs;

    fn policy(text: &str) -> EffectivePolicy {
        EffectivePolicy::merge(None, Some(&ConfigDocument::parse(text).unwrap()))
    }

    fn env() -> ExpansionContext {
        ExpansionContext::new("/work/proj").with_build_os(BuildOs::Linux)
    }

    #[test]
    fn test_repo_root_tool_path() {
        let policy = policy("[Tool Paths]\nclang-format = ${REPO_ROOT}/bin/cf\n");
        assert_eq!(resolve_tool("clang-format", &policy, &env()), "/work/proj/bin/cf");
    }

    #[test]
    fn test_build_os_tool_path() {
        let policy = policy("[Tool Paths]\ngofmt = ${REPO_ROOT}/prebuilts/go/${BUILD_OS}/bin/gofmt\n");
        assert_eq!(
            resolve_tool("gofmt", &policy, &env()),
            "/work/proj/prebuilts/go/linux-x86/bin/gofmt"
        );
    }

    #[test]
    fn test_default_is_bare_name() {
        let policy = policy("[Tool Paths]\ngofmt = /opt/gofmt\n");
        assert_eq!(resolve_tool("pylint", &policy, &env()), "pylint");
    }

    #[test]
    fn test_other_tokens_stay_literal() {
        let policy = policy("[Tool Paths]\npylint = /opt/${PREUPLOAD_COMMIT}/${HOME}/pylint\n");
        assert_eq!(
            resolve_tool("pylint", &policy, &env()),
            "/opt/${PREUPLOAD_COMMIT}/${HOME}/pylint"
        );
    }

    #[test]
    fn test_unknown_tool_rejected() {
        let err = validate_tool_paths(&policy("[Tool Paths]\neslint = /bin/eslint\n")).unwrap_err();
        assert!(matches!(err, Error::UnknownTool { ref name } if name == "eslint"));
        assert!(validate_tool_paths(&policy("[Tool Paths]\ncpplint = /x\n")).is_ok());
    }
}

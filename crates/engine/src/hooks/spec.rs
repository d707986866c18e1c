//! Resolution of an effective policy into runnable hook specs

use super::expand::{ArgTemplate, Word};
use super::registry::{BuiltinHook, CheckKind, FileFilter, FileInput};
use super::tools::{resolve_tool, validate_tool_paths};
use crate::context::ExpansionContext;
use preupload_config::{EffectivePolicy, Section};
use preupload_core::{Error, Result};

/// Where a hook comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    /// `[Hook Scripts]` entry
    Script,
    /// `[Builtin Hooks]` entry
    Builtin(BuiltinHook),
}

/// One resolved check, ready to run against any commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSpec {
    /// Config key of the hook
    pub name: String,
    /// Script or builtin
    pub kind: HookKind,
    /// Full command template, program first; empty for in-process checks
    pub command: ArgTemplate,
    /// Changed files the hook applies to
    pub files: FileFilter,
    /// Whether the runner executes it
    pub enabled: bool,
    /// How the outcome is judged
    pub check: CheckKind,
    /// How the files reach the command
    pub input: FileInput,
}

impl HookSpec {
    /// Spec for a `[Hook Scripts]` entry
    ///
    /// The first word of the command is the program. Hook scripts apply to
    /// every changed file and run even when there are none.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` if the command is blank or not a valid
    /// shell word sequence.
    pub fn script(name: impl Into<String>, command: &str) -> Result<Self> {
        let name = name.into();
        let template = ArgTemplate::parse(command)?;
        if template.is_empty() {
            return Err(Error::malformed(format!(
                "[{}] hook '{name}' cannot be blank",
                Section::HookScripts.name()
            )));
        }

        Ok(Self {
            name,
            kind: HookKind::Script,
            command: template,
            files: FileFilter::Always,
            enabled: true,
            check: CheckKind::ExitStatus,
            input: FileInput::Arguments,
        })
    }

    /// Spec for a builtin, with the policy's toggle, options and tool paths
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` if the options cannot be split into
    /// words, or if options are given to a builtin that takes none.
    pub fn builtin(hook: BuiltinHook, policy: &EffectivePolicy, env: &ExpansionContext) -> Result<Self> {
        let enabled = policy
            .builtin_enabled(hook.name())
            .unwrap_or(hook.default_enabled());

        let options = match policy.builtin_options(hook.name()) {
            Some(_) if !hook.accepts_options() => {
                return Err(Error::malformed(format!(
                    "[{}] builtin hook '{hook}' takes no options",
                    Section::BuiltinHooksOptions.name()
                )));
            }
            Some(options) => ArgTemplate::parse(options)?,
            None => ArgTemplate::parse(hook.default_options())?,
        };

        let command = match hook.tool() {
            None => ArgTemplate::default(),
            Some(tool) => {
                let mut words = vec![Word::literal(resolve_tool(tool, policy, env))];
                if hook == BuiltinHook::ClangFormat {
                    words.push(Word::literal("--binary"));
                    words.push(Word::literal(resolve_tool("clang-format", policy, env)));
                    words.push(Word::literal("--commit"));
                    words.push(Word::parse("${PREUPLOAD_COMMIT}^"));
                    words.extend(options.words().iter().cloned());
                    words.push(Word::literal("--diff"));
                    words.push(Word::literal("--"));
                    words.push(Word::parse("${PREUPLOAD_FILES}"));
                    ArgTemplate::from_words(words)
                } else {
                    let mut command = ArgTemplate::from_words(words);
                    command.extend(options);
                    command
                }
            }
        };

        Ok(Self {
            name: hook.name().to_string(),
            kind: HookKind::Builtin(hook),
            command,
            files: hook.files(),
            enabled,
            check: hook.check(),
            input: hook.input(),
        })
    }

    /// The builtin behind the spec, if it is one
    pub fn builtin_hook(&self) -> Option<BuiltinHook> {
        match self.kind {
            HookKind::Builtin(hook) => Some(hook),
            HookKind::Script => None,
        }
    }

    /// Program word, if the hook spawns a process
    pub fn program(&self) -> Option<&Word> {
        self.command.words().first()
    }
}

/// Resolve every hook of a policy
///
/// Hook scripts come first, then builtins, each in policy order. Builtins
/// switched off in `[Builtin Hooks]` are included with `enabled == false`.
/// All validation happens here, before any hook runs.
///
/// # Errors
///
/// - `Error::MalformedConfig` for an invalid policy value or template
/// - `Error::UnknownHook` for a name under `[Builtin Hooks]` or
///   `[Builtin Hooks Options]` that is not a builtin
/// - `Error::UnknownTool` for an unknown `[Tool Paths]` key
#[tracing::instrument(skip_all, fields(repo_root = %env.repo_root.display()))]
pub fn build_hook_specs(policy: &EffectivePolicy, env: &ExpansionContext) -> Result<Vec<HookSpec>> {
    policy.validate()?;
    validate_tool_paths(policy)?;
    for name in policy.builtin_hooks_options.keys() {
        BuiltinHook::lookup(name, Section::BuiltinHooksOptions)?;
    }

    let mut specs = Vec::with_capacity(policy.hook_scripts.len() + policy.builtin_hooks.len());

    for (name, command) in &policy.hook_scripts {
        specs.push(HookSpec::script(name.clone(), command)?);
    }

    for name in policy.builtin_hooks.keys() {
        let hook = BuiltinHook::lookup(name, Section::BuiltinHooks)?;
        specs.push(HookSpec::builtin(hook, policy, env)?);
    }

    tracing::debug!(
        total = specs.len(),
        enabled = specs.iter().filter(|spec| spec.enabled).count(),
        "Resolved hook specs"
    );
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CommitContext;
    use crate::hooks::expand::TokenValues;
    use preupload_config::ConfigDocument;

    fn policy(text: &str) -> EffectivePolicy {
        EffectivePolicy::merge(None, Some(&ConfigDocument::parse(text).unwrap()))
    }

    fn env() -> ExpansionContext {
        ExpansionContext::new("/work/proj")
    }

    fn argv(spec: &HookSpec, files: &[&str]) -> Vec<String> {
        let commit = CommitContext::new(
            "abc123",
            "msg",
            files.iter().map(ToString::to_string).collect(),
        );
        spec.command.expand(&TokenValues::for_commit(&commit, &env()))
    }

    #[test]
    fn test_order_scripts_then_builtins() {
        let specs = build_hook_specs(
            &policy(
                "[Builtin Hooks]\npylint = true\njsonlint = false\n[Hook Scripts]\nz_hook = z\na_hook = a\n",
            ),
            &env(),
        )
        .unwrap();

        let names: Vec<_> = specs.iter().map(|spec| spec.name.as_str()).collect();
        assert_eq!(names, vec!["z_hook", "a_hook", "pylint", "jsonlint"]);
        assert!(specs[2].enabled);
        assert!(!specs[3].enabled);
    }

    #[test]
    fn test_script_program_is_first_word() {
        let spec = HookSpec::script("check", "${REPO_ROOT}/check.sh --all ${PREUPLOAD_FILES}").unwrap();
        assert_eq!(spec.kind, HookKind::Script);
        assert!(spec.files.is_always());
        assert_eq!(argv(&spec, &["a.c"]), vec!["/work/proj/check.sh", "--all", "a.c"]);
    }

    #[test]
    fn test_blank_script_rejected() {
        assert!(HookSpec::script("blank", "   ").is_err());
    }

    #[test]
    fn test_script_with_bad_quoting_rejected() {
        let err = build_hook_specs(&policy("[Hook Scripts]\nbad = tool 'oops\n"), &env()).unwrap_err();
        assert!(matches!(err, Error::MalformedConfig { .. }));
    }

    #[test]
    fn test_builtin_default_options() {
        let spec = HookSpec::builtin(BuiltinHook::Gofmt, &policy(""), &env()).unwrap();
        assert!(!spec.enabled);
        assert_eq!(spec.check, CheckKind::EmptyOutput);
        assert_eq!(spec.input, FileInput::Stdin);
        assert_eq!(argv(&spec, &["main.go"]), vec!["gofmt", "-l"]);
    }

    #[test]
    fn test_builtin_options_and_tool_path() {
        let policy = policy(
            "[Builtin Hooks]\ncpplint = true\n[Builtin Hooks Options]\ncpplint = --quiet ${PREUPLOAD_FILES}\n[Tool Paths]\ncpplint = ${REPO_ROOT}/tools/cpplint.py\n",
        );
        let spec = HookSpec::builtin(BuiltinHook::Cpplint, &policy, &env()).unwrap();
        assert!(spec.enabled);
        assert_eq!(
            argv(&spec, &["a.cc"]),
            vec!["/work/proj/tools/cpplint.py", "--quiet", "a.cc"]
        );
    }

    #[test]
    fn test_clang_format_command() {
        let policy = policy("[Tool Paths]\nclang-format = ${REPO_ROOT}/bin/cf\n");
        let spec = HookSpec::builtin(BuiltinHook::ClangFormat, &policy, &env()).unwrap();
        assert_eq!(
            argv(&spec, &["a.cc", "b.h"]),
            vec![
                "git-clang-format",
                "--binary",
                "/work/proj/bin/cf",
                "--commit",
                "abc123^",
                "--style",
                "file",
                "--diff",
                "--",
                "a.cc",
                "b.h",
            ]
        );
    }

    #[test]
    fn test_jsonlint_rejects_options() {
        let err = build_hook_specs(
            &policy("[Builtin Hooks]\njsonlint = true\n[Builtin Hooks Options]\njsonlint = --strict\n"),
            &env(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("takes no options"));
    }

    #[test]
    fn test_jsonlint_has_no_command() {
        let spec = HookSpec::builtin(BuiltinHook::Jsonlint, &policy(""), &env()).unwrap();
        assert!(spec.program().is_none());
        assert_eq!(spec.builtin_hook(), Some(BuiltinHook::Jsonlint));
    }

    #[test]
    fn test_unknown_builtin_names() {
        let err = build_hook_specs(&policy("[Builtin Hooks]\nyamllint = true\n"), &env()).unwrap_err();
        assert!(matches!(err, Error::UnknownHook { section: "Builtin Hooks", .. }));

        let err = build_hook_specs(
            &policy("[Builtin Hooks Options]\nyamllint = --strict\n"),
            &env(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownHook { section: "Builtin Hooks Options", .. }));
    }

    #[test]
    fn test_unknown_tool_is_fatal() {
        let err = build_hook_specs(&policy("[Tool Paths]\neslint = /bin/eslint\n"), &env()).unwrap_err();
        assert!(matches!(err, Error::UnknownTool { .. }));
    }

    #[test]
    fn test_options_only_builtin_is_not_listed() {
        let specs = build_hook_specs(&policy("[Builtin Hooks Options]\npylint = -E\n"), &env()).unwrap();
        assert!(specs.is_empty());
    }
}

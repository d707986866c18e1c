//! Effective policy: the global and project-local documents merged into one
//!
//! Merging is two-level only. Local entries override global entries with the
//! same key in the same section; keys found on one side only are kept as they
//! are. Keys keep the position of their first appearance, so global keys come
//! first, followed by keys that only the local document defines.

use crate::parser::{ConfigDocument, Section};
use indexmap::IndexMap;
use preupload_core::{Error, Result};
use std::path::PathBuf;

/// `[Options]` key: skip every hook for commits with more than one parent
pub const OPTION_IGNORE_MERGED_COMMITS: &str = "ignore_merged_commits";

const KNOWN_OPTIONS: &[&str] = &[OPTION_IGNORE_MERGED_COMMITS];

/// Merged configuration driving one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePolicy {
    /// Files that contributed to this policy, global first
    pub sources: Vec<PathBuf>,
    /// `[Hook Scripts]`: name to command
    pub hook_scripts: IndexMap<String, String>,
    /// `[Builtin Hooks]`: name to toggle
    pub builtin_hooks: IndexMap<String, bool>,
    /// `[Builtin Hooks Options]`: name to argument template
    pub builtin_hooks_options: IndexMap<String, String>,
    /// `[Tool Paths]`: tool to path template
    pub tool_paths: IndexMap<String, String>,
    /// `[Options]`
    pub options: IndexMap<String, String>,
}

impl EffectivePolicy {
    /// Merge a global and a local document
    ///
    /// Either side may be absent, in which case it counts as empty. This is a
    /// pure function of its inputs.
    ///
    /// # Examples
    ///
    /// ```
    /// use preupload_config::{ConfigDocument, EffectivePolicy};
    ///
    /// let global = ConfigDocument::parse("[Builtin Hooks]\njsonlint = true\ngofmt = true\n").unwrap();
    /// let local = ConfigDocument::parse("[Builtin Hooks]\ngofmt = false\n").unwrap();
    ///
    /// let policy = EffectivePolicy::merge(Some(&global), Some(&local));
    /// assert_eq!(policy.builtin_enabled("jsonlint"), Some(true));
    /// assert_eq!(policy.builtin_enabled("gofmt"), Some(false));
    /// ```
    #[must_use]
    pub fn merge(global: Option<&ConfigDocument>, local: Option<&ConfigDocument>) -> Self {
        let mut policy = Self::default();

        for doc in [global, local].into_iter().flatten() {
            policy.sources.extend(doc.path.clone());
            overlay(&mut policy.hook_scripts, &doc.hook_scripts);
            overlay(&mut policy.builtin_hooks, &doc.builtin_hooks);
            overlay(&mut policy.builtin_hooks_options, &doc.builtin_hooks_options);
            overlay(&mut policy.tool_paths, &doc.tool_paths);
            overlay(&mut policy.options, &doc.options);
        }

        policy
    }

    /// Check the merged values that do not depend on the builtin registry
    ///
    /// Checks for:
    /// - Blank `[Hook Scripts]` commands
    /// - Unknown `[Options]` keys
    /// - Non-boolean `ignore_merged_commits`
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` naming the offending entry.
    pub fn validate(&self) -> Result<()> {
        for (name, command) in &self.hook_scripts {
            if command.trim().is_empty() {
                return Err(Error::malformed(format!(
                    "[{}] hook '{name}' cannot be blank",
                    Section::HookScripts.name()
                )));
            }
        }

        for key in self.options.keys() {
            if !KNOWN_OPTIONS.contains(&key.as_str()) {
                return Err(Error::malformed(format!(
                    "unknown option '{key}' in [{}]. Valid options: {}",
                    Section::Options.name(),
                    KNOWN_OPTIONS.join(", ")
                )));
            }
        }

        self.ignore_merged_commits()?;
        Ok(())
    }

    /// Whether the policy has no entries at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hook_scripts.is_empty()
            && self.builtin_hooks.is_empty()
            && self.builtin_hooks_options.is_empty()
            && self.tool_paths.is_empty()
            && self.options.is_empty()
    }

    /// `[Builtin Hooks]` value for `name`, if the policy sets one
    #[must_use]
    pub fn builtin_enabled(&self, name: &str) -> Option<bool> {
        self.builtin_hooks.get(name).copied()
    }

    /// `[Builtin Hooks Options]` template for `name`, if the policy sets one
    #[must_use]
    pub fn builtin_options(&self, name: &str) -> Option<&str> {
        self.builtin_hooks_options.get(name).map(String::as_str)
    }

    /// `[Tool Paths]` template for `tool`, if the policy sets one
    #[must_use]
    pub fn tool_path(&self, tool: &str) -> Option<&str> {
        self.tool_paths.get(tool).map(String::as_str)
    }

    /// The `ignore_merged_commits` option (default: false)
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` if the value is not a boolean.
    pub fn ignore_merged_commits(&self) -> Result<bool> {
        match self.options.get(OPTION_IGNORE_MERGED_COMMITS) {
            None => Ok(false),
            Some(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(Error::malformed(format!(
                    "[{}] value for '{OPTION_IGNORE_MERGED_COMMITS}' must be true or false, got '{value}'",
                    Section::Options.name()
                ))),
            },
        }
    }
}

fn overlay<V: Clone>(base: &mut IndexMap<String, V>, layer: &IndexMap<String, V>) {
    for (key, value) in layer {
        base.insert(key.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ConfigDocument {
        ConfigDocument::parse(text).unwrap()
    }

    #[test]
    fn test_merge_both_absent() {
        let policy = EffectivePolicy::merge(None, None);
        assert!(policy.is_empty());
        assert!(policy.sources.is_empty());
    }

    #[test]
    fn test_merge_global_only_key_preserved() {
        let global = doc("[Tool Paths]\ngofmt = /opt/gofmt\n[Hook Scripts]\na = run-a\n");
        let local = doc("[Hook Scripts]\nb = run-b\n");

        let policy = EffectivePolicy::merge(Some(&global), Some(&local));
        assert_eq!(policy.tool_path("gofmt"), Some("/opt/gofmt"));
        assert_eq!(policy.hook_scripts["a"], "run-a");
        assert_eq!(policy.hook_scripts["b"], "run-b");
    }

    #[test]
    fn test_merge_local_overrides_global() {
        let global = doc(
            "[Hook Scripts]\nlint = global-lint\n[Builtin Hooks Options]\ncpplint = --a\n[Tool Paths]\npylint = /g/pylint\n",
        );
        let local = doc(
            "[Hook Scripts]\nlint = local-lint\n[Builtin Hooks Options]\ncpplint = --b\n[Tool Paths]\npylint = /l/pylint\n",
        );

        let policy = EffectivePolicy::merge(Some(&global), Some(&local));
        assert_eq!(policy.hook_scripts["lint"], "local-lint");
        assert_eq!(policy.builtin_options("cpplint"), Some("--b"));
        assert_eq!(policy.tool_path("pylint"), Some("/l/pylint"));
    }

    #[test]
    fn test_merge_builtin_toggle_override() {
        let global = doc("[Builtin Hooks]\njsonlint = true\npylint = true\n");
        let local = doc("[Builtin Hooks]\npylint = false\n");

        let policy = EffectivePolicy::merge(Some(&global), Some(&local));
        assert_eq!(policy.builtin_enabled("jsonlint"), Some(true));
        assert_eq!(policy.builtin_enabled("pylint"), Some(false));
        assert_eq!(policy.builtin_enabled("gofmt"), None);
    }

    #[test]
    fn test_merge_order_global_first() {
        let global = doc("[Hook Scripts]\none = 1\ntwo = 2\n");
        let local = doc("[Hook Scripts]\nthree = 3\none = 1b\n");

        let policy = EffectivePolicy::merge(Some(&global), Some(&local));
        let names: Vec<_> = policy.hook_scripts.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["one", "two", "three"]);
        assert_eq!(policy.hook_scripts["one"], "1b");
    }

    #[test]
    fn test_merge_local_only() {
        let local = doc("[Builtin Hooks]\ngofmt = true\n");
        let policy = EffectivePolicy::merge(None, Some(&local));
        assert_eq!(policy, EffectivePolicy::merge(Some(&ConfigDocument::default()), Some(&local)));
        assert_eq!(policy.builtin_enabled("gofmt"), Some(true));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let global = doc("[Hook Scripts]\na = 1\n[Options]\nignore_merged_commits = true\n");
        let local = doc("[Hook Scripts]\nb = 2\n");
        assert_eq!(
            EffectivePolicy::merge(Some(&global), Some(&local)),
            EffectivePolicy::merge(Some(&global), Some(&local))
        );
    }

    #[test]
    fn test_merge_records_sources() {
        let mut global = doc("[Hook Scripts]\na = 1\n");
        global.path = Some(PathBuf::from("/repo/GLOBAL-PREUPLOAD.cfg"));
        let mut local = doc("[Hook Scripts]\nb = 2\n");
        local.path = Some(PathBuf::from("/repo/project/PREUPLOAD.cfg"));

        let policy = EffectivePolicy::merge(Some(&global), Some(&local));
        assert_eq!(
            policy.sources,
            vec![
                PathBuf::from("/repo/GLOBAL-PREUPLOAD.cfg"),
                PathBuf::from("/repo/project/PREUPLOAD.cfg")
            ]
        );
    }

    #[test]
    fn test_validate_blank_hook_script() {
        let policy = EffectivePolicy::merge(None, Some(&doc("[Hook Scripts]\nempty =\n")));
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("hook 'empty' cannot be blank"));
    }

    #[test]
    fn test_validate_unknown_option() {
        let policy = EffectivePolicy::merge(None, Some(&doc("[Options]\nfast_mode = true\n")));
        let err = policy.validate().unwrap_err();
        assert!(matches!(err, Error::MalformedConfig { .. }));
        assert!(err.to_string().contains("unknown option 'fast_mode'"));
    }

    #[test]
    fn test_ignore_merged_commits() {
        let policy = EffectivePolicy::merge(None, None);
        assert!(!policy.ignore_merged_commits().unwrap());

        let policy = EffectivePolicy::merge(
            None,
            Some(&doc("[Options]\nignore_merged_commits = True\n")),
        );
        assert!(policy.ignore_merged_commits().unwrap());
        assert!(policy.validate().is_ok());

        let policy = EffectivePolicy::merge(
            None,
            Some(&doc("[Options]\nignore_merged_commits = sometimes\n")),
        );
        assert!(policy.validate().is_err());
    }
}

//! INI-style parser for preupload config documents.
//!
//! A document is a sequence of `[Section]` headers, each followed by
//! `key = value` (or `key: value`) entries:
//!
//! ```text
//! # Comments start with '#' or ';'
//! [Hook Scripts]
//! commit_msg = ${REPO_ROOT}/tools/check_msg.sh "${PREUPLOAD_COMMIT_MESSAGE}"
//!
//! [Builtin Hooks]
//! jsonlint = true
//! gofmt = false
//!
//! [Builtin Hooks Options]
//! cpplint = --filter=-build/include ${PREUPLOAD_FILES}
//!
//! [Tool Paths]
//! clang-format = ${REPO_ROOT}/prebuilts/clang/${BUILD_OS}/bin/clang-format
//! ```
//!
//! Parsing is purely syntactic. Hook and tool names are checked later, when
//! the merged policy is resolved against the builtin registry, so an unknown
//! name is reported on its own instead of as a parse failure.
//!
//! # Example
//!
//! ```
//! use preupload_config::ConfigDocument;
//!
//! let doc = ConfigDocument::parse("[Builtin Hooks]\njsonlint = true\n").unwrap();
//! assert_eq!(doc.builtin_hooks.get("jsonlint"), Some(&true));
//! ```

use indexmap::IndexMap;
use preupload_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Known section of a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `[Hook Scripts]`: arbitrary commands keyed by hook name
    HookScripts,
    /// `[Builtin Hooks]`: builtin hook toggles
    BuiltinHooks,
    /// `[Builtin Hooks Options]`: argument templates overriding builtin defaults
    BuiltinHooksOptions,
    /// `[Tool Paths]`: executable overrides for builtin tools
    ToolPaths,
    /// `[Options]`: engine switches
    Options,
}

impl Section {
    /// All sections in canonical order
    pub const ALL: [Section; 5] = [
        Section::HookScripts,
        Section::BuiltinHooks,
        Section::BuiltinHooksOptions,
        Section::ToolPaths,
        Section::Options,
    ];

    /// Header text of this section (without brackets)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Section::HookScripts => "Hook Scripts",
            Section::BuiltinHooks => "Builtin Hooks",
            Section::BuiltinHooksOptions => "Builtin Hooks Options",
            Section::ToolPaths => "Tool Paths",
            Section::Options => "Options",
        }
    }

    /// Look a section up by its header text
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|section| section.name() == name)
    }
}

/// One parsed config document.
///
/// Every section keeps the order in which its keys first appeared. A key
/// repeated within a section keeps its first position and takes the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    /// File the document was read from, if any
    pub path: Option<PathBuf>,
    /// `[Hook Scripts]`: hook name → command template
    pub hook_scripts: IndexMap<String, String>,
    /// `[Builtin Hooks]`: builtin name → enabled
    pub builtin_hooks: IndexMap<String, bool>,
    /// `[Builtin Hooks Options]`: builtin name → argument template
    pub builtin_hooks_options: IndexMap<String, String>,
    /// `[Tool Paths]`: tool name → path template
    pub tool_paths: IndexMap<String, String>,
    /// `[Options]`: option name → raw value
    pub options: IndexMap<String, String>,
}

/// A value together with the line its key appeared on
#[derive(Debug, Clone)]
struct RawEntry {
    value: String,
    line: usize,
}

type RawSections = IndexMap<Section, IndexMap<String, RawEntry>>;

impl ConfigDocument {
    /// Parse document text that did not come from a file
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` on a syntax error, an unknown or
    /// duplicate section, or a non-boolean `[Builtin Hooks]` value.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with_origin(text, None)
    }

    /// Read and parse a config file
    ///
    /// Errors carry the file path so they can be attributed.
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` if the file cannot be read, or any
    /// error of [`ConfigDocument::parse`].
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::MalformedConfig {
            path: Some(path.to_path_buf()),
            line: None,
            message: format!("cannot read file: {e}"),
        })?;
        tracing::debug!(path = %path.display(), "Parsing config document");
        Self::parse_with_origin(&text, Some(path))
    }

    /// Whether the document has no entries in any section
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hook_scripts.is_empty()
            && self.builtin_hooks.is_empty()
            && self.builtin_hooks_options.is_empty()
            && self.tool_paths.is_empty()
            && self.options.is_empty()
    }

    fn parse_with_origin(text: &str, path: Option<&Path>) -> Result<Self> {
        let malformed = |line: usize, message: String| Error::MalformedConfig {
            path: path.map(Path::to_path_buf),
            line: Some(line),
            message,
        };

        let sections = parse_sections(text).map_err(|(line, message)| malformed(line, message))?;

        let mut doc = ConfigDocument {
            path: path.map(Path::to_path_buf),
            ..Self::default()
        };

        for (section, entries) in sections {
            for (key, entry) in entries {
                match section {
                    Section::HookScripts => {
                        doc.hook_scripts.insert(key, entry.value);
                    }
                    Section::BuiltinHooks => {
                        let enabled = parse_bool(&entry.value).ok_or_else(|| {
                            malformed(
                                entry.line,
                                format!(
                                    "[{}] value for '{key}' must be true or false, got '{}'",
                                    section.name(),
                                    entry.value
                                ),
                            )
                        })?;
                        doc.builtin_hooks.insert(key, enabled);
                    }
                    Section::BuiltinHooksOptions => {
                        doc.builtin_hooks_options.insert(key, entry.value);
                    }
                    Section::ToolPaths => {
                        doc.tool_paths.insert(key, entry.value);
                    }
                    Section::Options => {
                        doc.options.insert(key, entry.value);
                    }
                }
            }
        }

        Ok(doc)
    }
}

/// Split document text into sections of raw entries.
///
/// Errors are `(line number, message)` pairs; the caller attaches the path.
fn parse_sections(text: &str) -> std::result::Result<RawSections, (usize, String)> {
    let mut sections = RawSections::new();
    let mut current: Option<Section> = None;
    let mut last_key: Option<String> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = line.trim();

        // Skip empty lines and comment-only lines
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        // Indented lines continue the previous value
        if line.starts_with(char::is_whitespace) {
            let entry = current
                .zip(last_key.as_ref())
                .and_then(|(section, key)| sections.get_mut(&section)?.get_mut(key));
            let Some(entry) = entry else {
                return Err((line_no, "continuation line without a preceding key".to_string()));
            };
            entry.value.push('\n');
            entry.value.push_str(trimmed);
            continue;
        }

        if let Some(name) = parse_section_header(trimmed) {
            let section = Section::from_name(name)
                .ok_or_else(|| (line_no, format!("unknown section [{name}]")))?;
            if sections.contains_key(&section) {
                return Err((line_no, format!("duplicate section [{name}]")));
            }
            sections.insert(section, IndexMap::new());
            current = Some(section);
            last_key = None;
            continue;
        }

        let Some(section) = current else {
            return Err((line_no, "entry outside of any section".to_string()));
        };

        let (key, value) =
            split_entry(trimmed).ok_or_else(|| (line_no, format!("expected 'key = value', got '{trimmed}'")))?;
        if key.is_empty() {
            return Err((line_no, "empty key".to_string()));
        }

        let key = key.to_lowercase();
        sections.entry(section).or_default().insert(
            key.clone(),
            RawEntry {
                value: value.to_string(),
                line: line_no,
            },
        );
        last_key = Some(key);
    }

    Ok(sections)
}

/// Parse a section header line.
///
/// - `[Tool Paths]` → `Some("Tool Paths")`
/// - `key = value` → `None`
fn parse_section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')?.strip_suffix(']').map(str::trim)
}

/// Split `key = value` or `key: value` at the first delimiter
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(|c| c == '=' || c == ':')?;
    Some((line[..idx].trim(), line[idx + 1..].trim()))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

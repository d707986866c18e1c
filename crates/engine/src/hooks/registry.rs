//! Builtin hook registry
//!
//! The fixed catalogue of checks that projects can switch on under
//! `[Builtin Hooks]`. Every builtin is disabled unless the policy enables it.

use preupload_config::Section;
use preupload_core::{Error, Result};
use std::fmt;
use std::path::Path;

/// Tool names accepted as `[Tool Paths]` keys
pub const KNOWN_TOOLS: &[&str] = &[
    "checkpatch.pl",
    "clang-format",
    "cpplint",
    "git-clang-format",
    "gofmt",
    "pylint",
    "xmllint",
];

const CHECKPATCH_EXTENSIONS: &[&str] = &["c", "h"];

const CLANG_FORMAT_EXTENSIONS: &[&str] = &[
    "c", "cc", "cpp", "cu", "cuh", "cxx", "h", "hh", "hpp", "hxx", "inc", "java", "m", "mm",
    "proto",
];

// Matches what cpplint itself accepts
const CPPLINT_EXTENSIONS: &[&str] = &["cc", "h", "cpp", "cu", "cuh"];

const XMLLINT_EXTENSIONS: &[&str] = &[
    "dbus-xml", "dia", "dtd", "fml", "form", "fxml", "glade", "grd", "iml", "kml", "mxml", "nib",
    "plist", "pom", "sgml", "svg", "uml", "vcproj", "vcxproj", "wxs", "xhtml", "xib", "xlb",
    "xml", "xsd", "xsl",
];

/// A builtin check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinHook {
    /// `checkpatch.pl` on C sources
    Checkpatch,
    /// `git-clang-format` over the lines a commit touches
    ClangFormat,
    /// `cpplint`
    Cpplint,
    /// `gofmt -l`, fed each file on stdin
    Gofmt,
    /// In-process JSON syntax check
    Jsonlint,
    /// `pylint`
    Pylint,
    /// `xmllint`
    Xmllint,
}

/// How a hook receives the files it checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileInput {
    /// Paths as arguments, through `${PREUPLOAD_FILES}`
    Arguments,
    /// One process per file, with the file's content at the commit on stdin
    Stdin,
}

/// Which changed files a hook applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    /// Every changed file; the hook runs even when there are none
    Always,
    /// Files whose extension is in the list
    Extensions(&'static [&'static str]),
}

/// How the outcome of a hook is judged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckKind {
    /// Exit status 0 passes
    ExitStatus,
    /// Exit status 0 and no output passes
    EmptyOutput,
    /// `git-clang-format --diff` output must name no files
    ClangFormatDiff,
    /// Every file must parse as JSON; no process is spawned
    JsonSyntax,
}

impl BuiltinHook {
    /// All builtins, sorted by name
    pub const ALL: [BuiltinHook; 7] = [
        BuiltinHook::Checkpatch,
        BuiltinHook::ClangFormat,
        BuiltinHook::Cpplint,
        BuiltinHook::Gofmt,
        BuiltinHook::Jsonlint,
        BuiltinHook::Pylint,
        BuiltinHook::Xmllint,
    ];

    /// Name used in config sections
    pub const fn name(self) -> &'static str {
        match self {
            BuiltinHook::Checkpatch => "checkpatch",
            BuiltinHook::ClangFormat => "clang_format",
            BuiltinHook::Cpplint => "cpplint",
            BuiltinHook::Gofmt => "gofmt",
            BuiltinHook::Jsonlint => "jsonlint",
            BuiltinHook::Pylint => "pylint",
            BuiltinHook::Xmllint => "xmllint",
        }
    }

    /// Builtin called `name`, if any
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|hook| hook.name() == name)
    }

    /// Look up a name found in a config section
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownHook` if no builtin has that name.
    pub fn lookup(name: &str, section: Section) -> Result<Self> {
        Self::from_name(name).ok_or_else(|| Error::UnknownHook {
            name: name.to_string(),
            section: section.name(),
        })
    }

    /// Toggle used when `[Builtin Hooks]` does not name the hook
    pub const fn default_enabled(self) -> bool {
        false
    }

    /// Executable the hook runs, or `None` for in-process checks
    pub const fn tool(self) -> Option<&'static str> {
        match self {
            BuiltinHook::Checkpatch => Some("checkpatch.pl"),
            BuiltinHook::ClangFormat => Some("git-clang-format"),
            BuiltinHook::Cpplint => Some("cpplint"),
            BuiltinHook::Gofmt => Some("gofmt"),
            BuiltinHook::Jsonlint => None,
            BuiltinHook::Pylint => Some("pylint"),
            BuiltinHook::Xmllint => Some("xmllint"),
        }
    }

    /// Second executable passed to the main tool
    pub const fn helper_tool(self) -> Option<&'static str> {
        match self {
            BuiltinHook::ClangFormat => Some("clang-format"),
            _ => None,
        }
    }

    /// Changed files the hook looks at
    pub const fn files(self) -> FileFilter {
        match self {
            BuiltinHook::Checkpatch => FileFilter::Extensions(CHECKPATCH_EXTENSIONS),
            BuiltinHook::ClangFormat => FileFilter::Extensions(CLANG_FORMAT_EXTENSIONS),
            BuiltinHook::Cpplint => FileFilter::Extensions(CPPLINT_EXTENSIONS),
            BuiltinHook::Gofmt => FileFilter::Extensions(&["go"]),
            BuiltinHook::Jsonlint => FileFilter::Extensions(&["json"]),
            BuiltinHook::Pylint => FileFilter::Extensions(&["py"]),
            BuiltinHook::Xmllint => FileFilter::Extensions(XMLLINT_EXTENSIONS),
        }
    }

    /// Argument template used when `[Builtin Hooks Options]` has no entry
    pub const fn default_options(self) -> &'static str {
        match self {
            BuiltinHook::Checkpatch => "--no-tree --quiet --file ${PREUPLOAD_FILES}",
            BuiltinHook::ClangFormat => "--style file",
            BuiltinHook::Gofmt => "-l",
            BuiltinHook::Jsonlint => "",
            BuiltinHook::Cpplint | BuiltinHook::Pylint | BuiltinHook::Xmllint => {
                "${PREUPLOAD_FILES}"
            }
        }
    }

    /// Whether `[Builtin Hooks Options]` may set an argument template
    pub const fn accepts_options(self) -> bool {
        !matches!(self, BuiltinHook::Jsonlint)
    }

    /// How the hook's outcome is judged
    pub const fn check(self) -> CheckKind {
        match self {
            BuiltinHook::ClangFormat => CheckKind::ClangFormatDiff,
            BuiltinHook::Gofmt => CheckKind::EmptyOutput,
            BuiltinHook::Jsonlint => CheckKind::JsonSyntax,
            BuiltinHook::Checkpatch
            | BuiltinHook::Cpplint
            | BuiltinHook::Pylint
            | BuiltinHook::Xmllint => CheckKind::ExitStatus,
        }
    }

    /// How the hook receives its files
    pub const fn input(self) -> FileInput {
        match self {
            BuiltinHook::Gofmt => FileInput::Stdin,
            _ => FileInput::Arguments,
        }
    }

    /// Short description for listings
    pub const fn description(self) -> &'static str {
        match self {
            BuiltinHook::Checkpatch => "Linux kernel style checks on C sources",
            BuiltinHook::ClangFormat => "Formatting of changed lines with clang-format",
            BuiltinHook::Cpplint => "C++ style checks",
            BuiltinHook::Gofmt => "Go files are gofmt-formatted",
            BuiltinHook::Jsonlint => "JSON files are well formed",
            BuiltinHook::Pylint => "Python lint",
            BuiltinHook::Xmllint => "XML files are well formed",
        }
    }
}

impl fmt::Display for BuiltinHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether `name` may appear under `[Tool Paths]`
pub fn is_known_tool(name: &str) -> bool {
    KNOWN_TOOLS.contains(&name)
}

impl FileFilter {
    /// Whether `path` is one of the hook's files
    pub fn matches(&self, path: &str) -> bool {
        match self {
            FileFilter::Always => true,
            FileFilter::Extensions(extensions) => Path::new(path)
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.contains(&ext)),
        }
    }

    /// Matching files, in their original order
    pub fn select(&self, files: &[String]) -> Vec<String> {
        files
            .iter()
            .filter(|file| self.matches(file))
            .cloned()
            .collect()
    }

    /// Whether the hook runs with no matching files
    pub fn is_always(&self) -> bool {
        matches!(self, FileFilter::Always)
    }
}

impl fmt::Display for FileFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFilter::Always => f.write_str("*"),
            FileFilter::Extensions(extensions) => {
                let list: Vec<String> = extensions.iter().map(|ext| format!(".{ext}")).collect();
                f.write_str(&list.join(" "))
            }
        }
    }
}

//! Token expansion for hook argument templates
//!
//! A template is split into words with shell quoting rules (without running a
//! shell), then each word is scanned for `${NAME}` tokens:
//!
//! | Token | Value |
//! |---|---|
//! | `${PREUPLOAD_FILES}` | one argument per matching file |
//! | `${PREUPLOAD_COMMIT}` | commit id |
//! | `${PREUPLOAD_COMMIT_MESSAGE}` | full commit message |
//! | `${REPO_ROOT}` | absolute repository root |
//! | `${BUILD_OS}` | `linux-x86` or `darwin-x86` |
//!
//! Any other `${...}` text is left untouched. Substituted values are never
//! split again, so a file name containing spaces stays a single argument.
//!
//! A word that contains `${PREUPLOAD_FILES}` is repeated once per file with the
//! surrounding text kept (`--file=${PREUPLOAD_FILES}` gives `--file=a.c
//! --file=b.c`). With no files such a word produces no argument at all.

use crate::context::{CommitContext, ExpansionContext};
use preupload_core::{BuildOs, Error, Result};

/// A token recognized inside templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// `${PREUPLOAD_FILES}`, one argument per file
    Files,
    /// `${PREUPLOAD_COMMIT}`
    Commit,
    /// `${PREUPLOAD_COMMIT_MESSAGE}`
    CommitMessage,
    /// `${REPO_ROOT}`
    RepoRoot,
    /// `${BUILD_OS}`
    BuildOs,
}

impl Token {
    /// Every token
    pub const ALL: [Token; 5] = [
        Token::Files,
        Token::Commit,
        Token::CommitMessage,
        Token::RepoRoot,
        Token::BuildOs,
    ];

    /// Name between `${` and `}`
    pub const fn name(self) -> &'static str {
        match self {
            Token::Files => "PREUPLOAD_FILES",
            Token::Commit => "PREUPLOAD_COMMIT",
            Token::CommitMessage => "PREUPLOAD_COMMIT_MESSAGE",
            Token::RepoRoot => "REPO_ROOT",
            Token::BuildOs => "BUILD_OS",
        }
    }

    /// Token spelled `name`, if any
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|token| token.name() == name)
    }
}

/// Piece of a word
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text kept as is
    Literal(String),
    /// A recognized `${NAME}`
    Token(Token),
}

/// One argument of a template, before expansion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Word {
    segments: Vec<Segment>,
}

impl Word {
    /// Scan unquoted word text for tokens
    ///
    /// Unknown names and an unterminated `${` stay literal.
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(start) = rest.find("${") {
            literal.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find('}') else {
                literal.push_str(&rest[start..]);
                rest = "";
                break;
            };

            match Token::from_name(&after[..end]) {
                Some(token) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Token(token));
                }
                None => literal.push_str(&rest[start..start + end + 3]),
            }
            rest = &after[end + 1..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// A word with no tokens
    pub fn literal(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![Segment::Literal(text)],
        }
    }

    /// Literal and token pieces, in order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the word contains `${PREUPLOAD_FILES}`
    pub fn has_files(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| *segment == Segment::Token(Token::Files))
    }

    /// Append the arguments this word expands to
    pub fn expand_into(&self, values: &TokenValues<'_>, out: &mut Vec<String>) {
        match values.files {
            Some(files) if self.has_files() => {
                out.extend(files.iter().map(|file| self.render(values, Some(file))));
            }
            _ => out.push(self.render(values, None)),
        }
    }

    /// Render as a single string; tokens without a value stay as `${NAME}`
    pub fn render(&self, values: &TokenValues<'_>, file: Option<&str>) -> String {
        let mut text = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => text.push_str(literal),
                Segment::Token(Token::Files) => match file {
                    Some(file) => text.push_str(file),
                    None => push_token(&mut text, Token::Files),
                },
                Segment::Token(token) => match values.value(*token) {
                    Some(value) => text.push_str(value),
                    None => push_token(&mut text, *token),
                },
            }
        }
        text
    }
}

fn push_token(text: &mut String, token: Token) {
    text.push_str("${");
    text.push_str(token.name());
    text.push('}');
}

/// A pre-parsed argument template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgTemplate {
    words: Vec<Word>,
}

impl ArgTemplate {
    /// Split `text` into words and scan each word for tokens
    ///
    /// # Errors
    ///
    /// Returns `Error::MalformedConfig` if the text is not a valid shell word
    /// sequence (for example an unterminated quote).
    pub fn parse(text: &str) -> Result<Self> {
        let words = shell_words::split(text).map_err(|e| {
            Error::malformed(format!("cannot split arguments '{text}': {e}"))
        })?;

        Ok(Self {
            words: words.iter().map(|word| Word::parse(word)).collect(),
        })
    }

    /// Template made of `words`
    pub fn from_words(words: Vec<Word>) -> Self {
        Self { words }
    }

    /// Words, program first
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Whether the template has no words
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Append the words of another template
    pub fn extend(&mut self, other: ArgTemplate) {
        self.words.extend(other.words);
    }

    /// Expand into the final argument vector
    pub fn expand(&self, values: &TokenValues<'_>) -> Vec<String> {
        let mut args = Vec::with_capacity(self.words.len());
        for word in &self.words {
            word.expand_into(values, &mut args);
        }
        args
    }
}

/// Token values available to an expansion
#[derive(Debug, Clone)]
pub struct TokenValues<'a> {
    repo_root: String,
    build_os: BuildOs,
    commit: Option<&'a CommitContext>,
    files: Option<&'a [String]>,
}

impl<'a> TokenValues<'a> {
    /// All tokens, with the commit's full file list
    pub fn for_commit(commit: &'a CommitContext, env: &ExpansionContext) -> Self {
        Self {
            repo_root: env.repo_root_str(),
            build_os: env.build_os,
            commit: Some(commit),
            files: Some(&commit.files),
        }
    }

    /// Only `${REPO_ROOT}` and `${BUILD_OS}`; everything else stays literal
    pub fn process_wide(env: &ExpansionContext) -> Self {
        Self {
            repo_root: env.repo_root_str(),
            build_os: env.build_os,
            commit: None,
            files: None,
        }
    }

    /// Replace the file list
    #[must_use]
    pub fn with_files(mut self, files: &'a [String]) -> Self {
        self.files = Some(files);
        self
    }

    fn value(&self, token: Token) -> Option<&str> {
        match token {
            Token::RepoRoot => Some(&self.repo_root),
            Token::BuildOs => Some(self.build_os.as_str()),
            Token::Commit => self.commit.map(|commit| commit.commit.as_str()),
            Token::CommitMessage => self.commit.map(|commit| commit.message.as_str()),
            Token::Files => None,
        }
    }
}

/// Expand a raw template against one commit
///
/// # Errors
///
/// Returns `Error::MalformedConfig` if the template cannot be split into words.
///
/// # Examples
///
/// ```
/// use preupload_engine::{CommitContext, ExpansionContext, expand};
///
/// let commit = CommitContext::new("abc123", "msg", vec!["my file.c".to_string()]);
/// let env = ExpansionContext::new("/work/proj");
///
/// let args = expand("lint --root ${REPO_ROOT} ${PREUPLOAD_FILES}", &commit, &env).unwrap();
/// assert_eq!(args, vec!["lint", "--root", "/work/proj", "my file.c"]);
/// ```
pub fn expand(template: &str, ctx: &CommitContext, env: &ExpansionContext) -> Result<Vec<String>> {
    let template = ArgTemplate::parse(template)?;
    Ok(template.expand(&TokenValues::for_commit(ctx, env)))
}

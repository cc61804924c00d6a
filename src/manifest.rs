//! # Workspace and Module Manifests
//!
//! Parsing and rendering for `go.work` (workspace) and `go.mod` (module)
//! files. Only as much of the syntax is understood as is needed to read and
//! rewrite path-valued directives:
//!
//! - `use <dir>` entries (workspace manifests).
//! - `replace <old> [<old-version>] => <new> [<new-version>]` entries.
//! - The `go <version>` directive.
//!
//! Every other directive (`module`, `require`, `toolchain`, `exclude`, ...)
//! is kept as an opaque token list so it survives a rewrite.
//!
//! ## Immutability
//!
//! A parsed [`Manifest`] is never edited in place. Rewrites go through
//! [`Manifest::map_replacements`] or [`Manifest::to_canonical_workspace`],
//! which build a new value that is then rendered to fresh text with
//! [`Manifest::render`]. Formatting is canonical (tab-indented blocks, single
//! blank lines) rather than byte-for-byte preserving.

use std::borrow::Cow;
use std::path::Path;

use crate::error::{Error, Result};

/// File name of a workspace manifest.
pub const WORKSPACE_FILE: &str = "go.work";

/// File name of a module manifest.
pub const MODULE_FILE: &str = "go.mod";

const ARROW: &str = "=>";

/// Which kind of manifest a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    /// A `go.work` file.
    Workspace,
    /// A `go.mod` file.
    Module,
}

impl ManifestKind {
    /// Identify a manifest by its exact file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        match name {
            WORKSPACE_FILE => Some(ManifestKind::Workspace),
            MODULE_FILE => Some(ManifestKind::Module),
            _ => None,
        }
    }

    /// The file name this kind of manifest is stored under.
    pub fn file_name(self) -> &'static str {
        match self {
            ManifestKind::Workspace => WORKSPACE_FILE,
            ManifestKind::Module => MODULE_FILE,
        }
    }
}

/// Tokens of one directive line, with its trailing comment if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// Unquoted tokens, not including the verb.
    pub tokens: Vec<String>,
    /// Trailing comment including its leading `//`.
    pub comment: Option<String>,
}

/// An entry inside a parenthesized block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Line(Line),
    Comment(String),
    Blank,
}

/// A top-level statement of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `verb tokens...`
    Directive { verb: String, line: Line },
    /// `verb ( ... )`
    Block {
        verb: String,
        comment: Option<String>,
        items: Vec<Item>,
    },
    Comment(String),
    Blank,
}

impl Statement {
    fn verb(&self) -> Option<&str> {
        match self {
            Statement::Directive { verb, .. } | Statement::Block { verb, .. } => Some(verb),
            Statement::Comment(_) | Statement::Blank => None,
        }
    }
}

/// A module path with an optional version, one side of a `replace`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRef {
    pub path: String,
    pub version: Option<String>,
}

impl ModuleRef {
    /// A versionless reference, typically a filesystem path.
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: None,
        }
    }

    fn from_tokens(tokens: &[String]) -> Option<Self> {
        match tokens {
            [path] => Some(Self {
                path: path.clone(),
                version: None,
            }),
            [path, version] => Some(Self {
                path: path.clone(),
                version: Some(version.clone()),
            }),
            _ => None,
        }
    }

    fn push_tokens(&self, out: &mut Vec<String>) {
        out.push(self.path.clone());
        if let Some(version) = &self.version {
            out.push(version.clone());
        }
    }
}

/// One `replace` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub old: ModuleRef,
    pub new: ModuleRef,
    /// Trailing comment carried over when the entry is re-rendered.
    pub comment: Option<String>,
}

impl Replacement {
    /// Whether the replacement target names a directory rather than a
    /// registry version.
    pub fn is_path_based(&self) -> bool {
        self.new.version.as_deref().map_or(true, str::is_empty) && !self.new.path.is_empty()
    }

    /// Same replacement pointing at a new, versionless directory token.
    pub fn with_new_path(&self, path: impl Into<String>) -> Self {
        Self {
            old: self.old.clone(),
            new: ModuleRef::path(path),
            comment: self.comment.clone(),
        }
    }

    fn from_line(line: &Line) -> Option<Self> {
        let arrow = line.tokens.iter().position(|t| t == ARROW)?;
        let old = ModuleRef::from_tokens(&line.tokens[..arrow])?;
        let new = ModuleRef::from_tokens(&line.tokens[arrow + 1..])?;
        Some(Self {
            old,
            new,
            comment: line.comment.clone(),
        })
    }

    fn to_line(&self) -> Line {
        let mut tokens = Vec::with_capacity(5);
        self.old.push_tokens(&mut tokens);
        tokens.push(ARROW.to_string());
        self.new.push_tokens(&mut tokens);
        Line {
            tokens,
            comment: self.comment.clone(),
        }
    }
}

/// A parsed `go.work` or `go.mod` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    kind: ManifestKind,
    statements: Vec<Statement>,
}

impl Manifest {
    /// Parse manifest text. `source` is only used in error messages.
    pub fn parse(kind: ManifestKind, text: &str, source: &Path) -> Result<Self> {
        Parser::new(source).parse(kind, text)
    }

    /// Read and parse a manifest file, inferring its kind from the file name.
    pub fn from_file(path: &Path) -> Result<Self> {
        let kind = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(ManifestKind::from_file_name)
            .ok_or_else(|| Error::ManifestParse {
                path: path.display().to_string(),
                line: 0,
                message: "not a go.work or go.mod file".to_string(),
            })?;
        let text = std::fs::read_to_string(path)?;
        Self::parse(kind, &text, path)
    }

    pub fn kind(&self) -> ManifestKind {
        self.kind
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Version named by the `go` directive, if present.
    pub fn go_version(&self) -> Option<&str> {
        self.statements.iter().find_map(|s| match s {
            Statement::Directive { verb, line } if verb == "go" => {
                line.tokens.first().map(String::as_str)
            }
            _ => None,
        })
    }

    fn lines_of<'a>(&'a self, wanted: &'a str) -> impl Iterator<Item = &'a Line> + 'a {
        self.statements.iter().flat_map(move |s| {
            let lines: Vec<&Line> = match s {
                Statement::Directive { verb, line } if verb == wanted => vec![line],
                Statement::Block { verb, items, .. } if verb == wanted => items
                    .iter()
                    .filter_map(|item| match item {
                        Item::Line(line) => Some(line),
                        _ => None,
                    })
                    .collect(),
                _ => Vec::new(),
            };
            lines
        })
    }

    /// Directory tokens of every `use` entry, in file order.
    pub fn uses(&self) -> Vec<String> {
        self.lines_of("use")
            .filter_map(|line| line.tokens.first().cloned())
            .collect()
    }

    /// Every `replace` entry, in file order.
    pub fn replacements(&self) -> Vec<Replacement> {
        self.lines_of("replace")
            .filter_map(Replacement::from_line)
            .collect()
    }

    /// Build a new manifest with every `replace` entry passed through `f`.
    ///
    /// All other statements, and the position of each replacement, are kept.
    pub fn map_replacements<F>(&self, mut f: F) -> Result<Manifest>
    where
        F: FnMut(&Replacement) -> Result<Replacement>,
    {
        let mut map_line = |line: &Line| -> Result<Line> {
            match Replacement::from_line(line) {
                Some(replacement) => Ok(f(&replacement)?.to_line()),
                None => Ok(line.clone()),
            }
        };

        let mut statements = Vec::with_capacity(self.statements.len());
        for statement in &self.statements {
            let mapped = match statement {
                Statement::Directive { verb, line } if verb == "replace" => Statement::Directive {
                    verb: verb.clone(),
                    line: map_line(line)?,
                },
                Statement::Block {
                    verb,
                    comment,
                    items,
                } if verb == "replace" => {
                    let mut mapped_items = Vec::with_capacity(items.len());
                    for item in items {
                        mapped_items.push(match item {
                            Item::Line(line) => Item::Line(map_line(line)?),
                            other => other.clone(),
                        });
                    }
                    Statement::Block {
                        verb: verb.clone(),
                        comment: comment.clone(),
                        items: mapped_items,
                    }
                }
                other => other.clone(),
            };
            statements.push(mapped);
        }

        Ok(Manifest {
            kind: self.kind,
            statements,
        })
    }

    /// Build the minimal canonical workspace form.
    ///
    /// Layout: the `go` directive, any other directives (such as `toolchain`)
    /// in their original order, a `use` block and a `replace` block. Empty
    /// blocks are omitted. A kept directive brings along the comment lines
    /// directly above it; every other top-level comment is dropped.
    pub fn to_canonical_workspace(&self, uses: &[String], replacements: &[Replacement]) -> Manifest {
        let mut statements = self.kept_with_comments(|verb| verb == "go");

        let others = self.kept_with_comments(|verb| verb != "go" && verb != "use" && verb != "replace");
        if !others.is_empty() {
            statements.push(Statement::Blank);
            statements.extend(others);
        }

        if !uses.is_empty() {
            statements.push(Statement::Blank);
            statements.push(Statement::Block {
                verb: "use".to_string(),
                comment: None,
                items: uses
                    .iter()
                    .map(|u| {
                        Item::Line(Line {
                            tokens: vec![u.clone()],
                            comment: None,
                        })
                    })
                    .collect(),
            });
        }

        if !replacements.is_empty() {
            statements.push(Statement::Blank);
            statements.push(Statement::Block {
                verb: "replace".to_string(),
                comment: None,
                items: replacements.iter().map(|r| Item::Line(r.to_line())).collect(),
            });
        }

        Manifest {
            kind: ManifestKind::Workspace,
            statements,
        }
    }

    /// Directives whose verb passes `keep`, each preceded by the comment
    /// lines attached directly above it.
    fn kept_with_comments(&self, keep: impl Fn(&str) -> bool) -> Vec<Statement> {
        let mut kept = Vec::new();
        for (index, statement) in self.statements.iter().enumerate() {
            if !statement.verb().is_some_and(&keep) {
                continue;
            }
            let start = self.statements[..index]
                .iter()
                .rposition(|s| !matches!(s, Statement::Comment(_)))
                .map_or(0, |p| p + 1);
            kept.extend(self.statements[start..=index].iter().cloned());
        }
        kept
    }

    /// Render to text. Leading, trailing and repeated blank lines are dropped.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let mut last_blank = true;

        for statement in &self.statements {
            match statement {
                Statement::Blank => {
                    if !last_blank {
                        out.push('\n');
                        last_blank = true;
                    }
                    continue;
                }
                Statement::Comment(text) => {
                    out.push_str(text);
                    out.push('\n');
                }
                Statement::Directive { verb, line } => {
                    out.push_str(verb);
                    out.push(' ');
                    render_line(&mut out, line);
                }
                Statement::Block {
                    verb,
                    comment,
                    items,
                } => {
                    out.push_str(verb);
                    out.push_str(" (");
                    if let Some(comment) = comment {
                        out.push(' ');
                        out.push_str(comment);
                    }
                    out.push('\n');
                    for item in items {
                        match item {
                            Item::Line(line) => {
                                out.push('\t');
                                render_line(&mut out, line);
                            }
                            Item::Comment(text) => {
                                out.push('\t');
                                out.push_str(text);
                                out.push('\n');
                            }
                            Item::Blank => out.push('\n'),
                        }
                    }
                    out.push_str(")\n");
                }
            }
            last_blank = false;
        }

        while out.ends_with("\n\n") {
            out.pop();
        }
        out
    }
}

fn render_line(out: &mut String, line: &Line) {
    let rendered: Vec<Cow<'_, str>> = line.tokens.iter().map(|t| quote_token(t)).collect();
    out.push_str(&rendered.join(" "));
    if let Some(comment) = &line.comment {
        out.push(' ');
        out.push_str(comment);
    }
    out.push('\n');
}

fn quote_token(token: &str) -> Cow<'_, str> {
    if token == ARROW {
        return Cow::Borrowed(token);
    }
    let needs_quotes = token.is_empty()
        || token.contains("//")
        || token.contains(ARROW)
        || token
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '"' | '`' | '(' | ')'));
    if needs_quotes {
        Cow::Owned(format!(
            "\"{}\"",
            token.replace('\\', "\\\\").replace('"', "\\\"")
        ))
    } else {
        Cow::Borrowed(token)
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Quoted(String),
    Open,
    Close,
    Arrow,
}

impl Token {
    fn into_text(self) -> String {
        match self {
            Token::Word(s) | Token::Quoted(s) => s,
            Token::Open => "(".to_string(),
            Token::Close => ")".to_string(),
            Token::Arrow => ARROW.to_string(),
        }
    }

    fn is_paren(&self) -> bool {
        matches!(self, Token::Open | Token::Close)
    }
}

struct OpenBlock {
    verb: String,
    comment: Option<String>,
    items: Vec<Item>,
    start_line: usize,
}

struct Parser<'a> {
    source: &'a Path,
}

impl<'a> Parser<'a> {
    fn new(source: &'a Path) -> Self {
        Self { source }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> Error {
        Error::ManifestParse {
            path: self.source.display().to_string(),
            line,
            message: message.into(),
        }
    }

    fn parse(&self, kind: ManifestKind, text: &str) -> Result<Manifest> {
        let mut statements = Vec::new();
        let mut block: Option<OpenBlock> = None;

        for (index, raw) in text.lines().enumerate() {
            let line_no = index + 1;
            let (tokens, comment) = self.tokenize(raw, line_no)?;

            if let Some(open) = block.as_mut() {
                if tokens.is_empty() {
                    open.items
                        .push(comment.map(Item::Comment).unwrap_or(Item::Blank));
                    continue;
                }
                if tokens.len() == 1 && tokens[0] == Token::Close {
                    if let Some(done) = block.take() {
                        statements.push(Statement::Block {
                            verb: done.verb,
                            comment: done.comment,
                            items: done.items,
                        });
                    }
                    continue;
                }
                if tokens.iter().any(Token::is_paren) {
                    return Err(self.error(line_no, "unexpected parenthesis inside block"));
                }
                let line = Line {
                    tokens: tokens.into_iter().map(Token::into_text).collect(),
                    comment,
                };
                self.validate(&open.verb, &line, line_no)?;
                open.items.push(Item::Line(line));
                continue;
            }

            if tokens.is_empty() {
                statements.push(comment.map(Statement::Comment).unwrap_or(Statement::Blank));
                continue;
            }

            let mut tokens = tokens.into_iter();
            let verb = match tokens.next() {
                Some(Token::Word(verb)) => verb,
                _ => return Err(self.error(line_no, "expected a directive keyword")),
            };
            let rest: Vec<Token> = tokens.collect();

            match rest.as_slice() {
                [Token::Open] => {
                    block = Some(OpenBlock {
                        verb,
                        comment,
                        items: Vec::new(),
                        start_line: line_no,
                    });
                }
                [Token::Open, Token::Close] => statements.push(Statement::Block {
                    verb,
                    comment,
                    items: Vec::new(),
                }),
                _ if rest.iter().any(Token::is_paren) => {
                    return Err(self.error(line_no, "unexpected parenthesis"));
                }
                _ => {
                    let line = Line {
                        tokens: rest.into_iter().map(Token::into_text).collect(),
                        comment,
                    };
                    self.validate(&verb, &line, line_no)?;
                    statements.push(Statement::Directive { verb, line });
                }
            }
        }

        if let Some(open) = block {
            return Err(self.error(
                open.start_line,
                format!("unterminated {} block", open.verb),
            ));
        }

        Ok(Manifest { kind, statements })
    }

    fn validate(&self, verb: &str, line: &Line, line_no: usize) -> Result<()> {
        match verb {
            "use" | "go" if line.tokens.len() != 1 => Err(self.error(
                line_no,
                format!("{} expects exactly one argument", verb),
            )),
            "replace" if Replacement::from_line(line).is_none() => Err(self.error(
                line_no,
                "replace expects '<old> [<version>] => <new> [<version>]'",
            )),
            _ => Ok(()),
        }
    }

    fn tokenize(&self, raw: &str, line_no: usize) -> Result<(Vec<Token>, Option<String>)> {
        let mut tokens = Vec::new();
        let mut word = String::new();
        let mut chars = raw.char_indices().peekable();

        fn flush(word: &mut String, tokens: &mut Vec<Token>) {
            if !word.is_empty() {
                tokens.push(Token::Word(std::mem::take(word)));
            }
        }

        while let Some((pos, c)) = chars.next() {
            match c {
                '/' if raw[pos..].starts_with("//") => {
                    flush(&mut word, &mut tokens);
                    return Ok((tokens, Some(raw[pos..].trim_end().to_string())));
                }
                '=' if raw[pos..].starts_with(ARROW) => {
                    flush(&mut word, &mut tokens);
                    chars.next();
                    tokens.push(Token::Arrow);
                }
                '(' => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token::Open);
                }
                ')' => {
                    flush(&mut word, &mut tokens);
                    tokens.push(Token::Close);
                }
                '"' => {
                    flush(&mut word, &mut tokens);
                    let mut text = String::new();
                    let mut closed = false;
                    while let Some((_, q)) = chars.next() {
                        match q {
                            '"' => {
                                closed = true;
                                break;
                            }
                            '\\' => match chars.next() {
                                Some((_, 'n')) => text.push('\n'),
                                Some((_, 't')) => text.push('\t'),
                                Some((_, other)) => text.push(other),
                                None => break,
                            },
                            other => text.push(other),
                        }
                    }
                    if !closed {
                        return Err(self.error(line_no, "unterminated quoted string"));
                    }
                    tokens.push(Token::Quoted(text));
                }
                '`' => {
                    flush(&mut word, &mut tokens);
                    let mut text = String::new();
                    let mut closed = false;
                    for (_, q) in chars.by_ref() {
                        if q == '`' {
                            closed = true;
                            break;
                        }
                        text.push(q);
                    }
                    if !closed {
                        return Err(self.error(line_no, "unterminated raw string"));
                    }
                    tokens.push(Token::Quoted(text));
                }
                c if c.is_whitespace() => flush(&mut word, &mut tokens),
                c => word.push(c),
            }
        }

        flush(&mut word, &mut tokens);
        Ok((tokens, None))
    }
}

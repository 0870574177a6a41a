//! Owned statement tree for Python sources.
//!
//! The tree-sitter concrete syntax tree is lowered into a small sum type
//! ([`Statement`]) that the compressor rebuilds pass by pass. Nothing in the
//! lowered tree borrows from the parser, so each pass can consume its input
//! and hand back a fresh tree.

mod python;

use std::cell::RefCell;

use thiserror::Error;
use tree_sitter::{Node, Parser, Tree};

pub use python::parse_module;

// Thread-local parser caching to avoid re-initialization overhead.
//
// Parser initialization can fail (grammar ABI mismatch); that surfaces as
// `SyntaxError::ParserInit` rather than a panic.
thread_local! {
    static PYTHON_PARSER: RefCell<Option<Parser>> = const { RefCell::new(None) };
}

fn init_python_parser() -> Result<Parser, tree_sitter::LanguageError> {
    let mut p = Parser::new();
    p.set_language(&tree_sitter_python::LANGUAGE.into())?;
    Ok(p)
}

/// Execute a function with a cached Python parser.
pub(crate) fn with_python_parser<F, R>(f: F) -> Result<R, SyntaxError>
where
    F: FnOnce(&mut Parser) -> R,
{
    PYTHON_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        if slot.is_none() {
            *slot = Some(init_python_parser().map_err(|_| SyntaxError::ParserInit)?);
        }

        let parser = slot.as_mut().ok_or(SyntaxError::ParserInit)?;
        Ok(f(parser))
    })
}

/// Parse `content` and reject trees containing error or missing nodes.
pub(crate) fn parse_tree(content: &str) -> Result<Tree, SyntaxError> {
    let tree = with_python_parser(|parser| parser.parse(content, None))?
        .ok_or(SyntaxError::ParserInit)?;

    let root = tree.root_node();
    if root.has_error() {
        return Err(match find_error(root) {
            Some(node) => SyntaxError::Invalid {
                line: node.start_position().row + 1,
                column: node.start_position().column + 1,
                message: if node.is_missing() {
                    format!("missing `{}`", node.kind())
                } else {
                    "invalid syntax".to_string()
                },
            },
            None => SyntaxError::Invalid {
                line: 1,
                column: 1,
                message: "invalid syntax".to_string(),
            },
        });
    }

    if let Some((node, message)) = find_legacy_syntax(root) {
        return Err(SyntaxError::Invalid {
            line: node.start_position().row + 1,
            column: node.start_position().column + 1,
            message: message.to_string(),
        });
    }

    Ok(tree)
}

/// Python 2 productions the grammar accepts but Python 3 rejects.
fn legacy_message(node: Node) -> Option<&'static str> {
    match node.kind() {
        "print_statement" => Some("missing parentheses in call to 'print'"),
        "exec_statement" => Some("missing parentheses in call to 'exec'"),
        "<>" if !node.is_named() => Some("invalid syntax"),
        _ => None,
    }
}

fn find_legacy_syntax(node: Node) -> Option<(Node, &'static str)> {
    if let Some(message) = legacy_message(node) {
        return Some((node, message));
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(find_legacy_syntax)
}

fn find_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter().find_map(find_error)
}

/// Find a child node by kind.
pub(crate) fn find_child_by_kind<'a>(node: Node<'a>, kind: &str) -> Option<Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// Extract node text from content.
pub(crate) fn node_text<'a>(node: Node, content: &'a str) -> &'a str {
    &content[node.byte_range()]
}

/// Errors raised while turning text into a statement tree.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("failed to initialize python parser")]
    ParserInit,

    #[error("line {line}, column {column}: {message}")]
    Invalid {
        line: usize,
        column: usize,
        message: String,
    },
}

/// Source location of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    /// 1-indexed start line.
    pub start_line: usize,
    /// 1-indexed end line (inclusive).
    pub end_line: usize,
}

impl LineSpan {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    pub fn single_line(line: usize) -> Self {
        Self::new(line, line)
    }

    /// Number of lines covered, counting both ends.
    pub fn lines(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Total source-line span of a statement sequence.
///
/// Statements are assumed not to overlap, which holds for siblings of a
/// well-formed tree. Synthetic statements carry no span and count zero.
///
/// # Examples
///
/// ```
/// use distill::syntax::{parse_module, total_line_span};
///
/// let module = parse_module("x = 1\ny = [\n    2,\n]\n").unwrap();
/// assert_eq!(total_line_span(&module.body), 4);
/// ```
pub fn total_line_span(statements: &[Statement]) -> usize {
    statements
        .iter()
        .filter_map(Statement::span)
        .map(|span| span.lines())
        .sum()
}

/// Prefix shared by every placeholder text.
pub const PLACEHOLDER_PREFIX: &str = "<Content purposely removed";

/// Synthetic statement standing in for removed body content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Placeholder {
    removed_lines: Option<usize>,
}

impl Placeholder {
    /// Placeholder without a line annotation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder reporting how many source lines it replaced.
    pub fn with_line_count(lines: usize) -> Self {
        Self {
            removed_lines: Some(lines),
        }
    }

    pub fn removed_lines(&self) -> Option<usize> {
        self.removed_lines
    }

    /// The string value carried by the placeholder literal.
    pub fn text(&self) -> String {
        match self.removed_lines {
            Some(lines) => format!("{PLACEHOLDER_PREFIX}: {lines} lines>"),
            None => format!("{PLACEHOLDER_PREFIX}>"),
        }
    }
}

/// Classification of a statement that is neither a declaration nor a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `import x`, `from x import y`, `from __future__ import y`.
    Import,
    /// A bare string literal expression.
    Docstring,
    /// `x = ...`, `x: T = ...`, `x: T`.
    Assignment,
    /// `if`, `for`, `while`, `try`, `with`, `match`.
    Compound,
    Simple,
}

/// A piece of a verbatim statement.
///
/// Compound statements are kept as text, except for the declarations nested
/// inside them, which are lowered so they can be summarized in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Nested(Statement),
}

/// A statement reproduced from its source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherStatement {
    pub kind: StatementKind,
    pub span: LineSpan,
    pub parts: Vec<Fragment>,
}

impl OtherStatement {
    /// Statement made of a single verbatim text run.
    pub fn verbatim(kind: StatementKind, span: LineSpan, text: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            parts: vec![Fragment::Text(text.into())],
        }
    }
}

/// A class or function declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Decorators and signature, up to and including the colon opening the body.
    pub header: String,
    /// Whitespace placed before each body statement.
    pub body_indent: String,
    pub body: Vec<Statement>,
    /// Lines from the `def`/`class` keyword to the end of the body.
    pub span: LineSpan,
}

impl Declaration {
    /// Leading docstring statement, if the body starts with one.
    pub fn docstring(&self) -> Option<&Statement> {
        self.body.first().filter(|stmt| stmt.is_docstring())
    }
}

/// A statement of the lowered tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    ClassDecl(Declaration),
    /// Covers both `def` and `async def`.
    FunctionDecl(Declaration),
    Placeholder(Placeholder),
    Other(OtherStatement),
}

impl Statement {
    /// Source span; `None` for synthetic statements.
    pub fn span(&self) -> Option<LineSpan> {
        match self {
            Statement::ClassDecl(decl) | Statement::FunctionDecl(decl) => Some(decl.span),
            Statement::Placeholder(_) => None,
            Statement::Other(other) => Some(other.span),
        }
    }

    pub fn kind(&self) -> Option<StatementKind> {
        match self {
            Statement::Other(other) => Some(other.kind),
            _ => None,
        }
    }

    pub fn is_declaration(&self) -> bool {
        matches!(self, Statement::ClassDecl(_) | Statement::FunctionDecl(_))
    }

    pub fn is_docstring(&self) -> bool {
        self.kind() == Some(StatementKind::Docstring)
    }

    pub fn is_import(&self) -> bool {
        self.kind() == Some(StatementKind::Import)
    }

    pub fn is_assignment(&self) -> bool {
        self.kind() == Some(StatementKind::Assignment)
    }
}

/// Root of a parsed source unit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleRoot {
    pub body: Vec<Statement>,
}

impl ModuleRoot {
    /// Leading module docstring, if any.
    pub fn docstring(&self) -> Option<&Statement> {
        self.body.first().filter(|stmt| stmt.is_docstring())
    }

    /// Number of declarations, including those nested in compound statements
    /// and declaration bodies.
    pub fn declaration_count(&self) -> usize {
        fn count(stmt: &Statement) -> usize {
            match stmt {
                Statement::ClassDecl(decl) | Statement::FunctionDecl(decl) => {
                    1 + decl.body.iter().map(count).sum::<usize>()
                }
                Statement::Placeholder(_) => 0,
                Statement::Other(other) => other
                    .parts
                    .iter()
                    .map(|part| match part {
                        Fragment::Nested(nested) => count(nested),
                        Fragment::Text(_) => 0,
                    })
                    .sum(),
            }
        }
        self.body.iter().map(count).sum()
    }
}

//! Structural compression of Python modules.
//!
//! Keeps the shape of a module (signatures, and optionally docstrings,
//! imports and class attributes) while replacing declaration bodies with a
//! placeholder literal. The result is valid Python, so it can be fed back
//! through any tool that expects source code.

mod render;

use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::syntax::{
    parse_module, total_line_span, Declaration, Fragment, ModuleRoot, OtherStatement,
    Placeholder, Statement, SyntaxError,
};

/// What survives compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// Keep module, class and function docstrings.
    pub keep_docstrings: bool,
    /// Keep module-level import statements.
    pub keep_imports: bool,
    /// Keep simple assignments directly inside class bodies.
    pub keep_class_attributes: bool,
    /// Annotate placeholders with the number of lines they replace.
    pub include_line_count: bool,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            keep_docstrings: false,
            keep_imports: false,
            keep_class_attributes: true,
            include_line_count: true,
        }
    }
}

/// Errors during compression.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompressError {
    #[error("failed to initialize python parser")]
    ParserInit,

    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("compressed output is not valid python: {message}")]
    Serialization { message: String },
}

impl From<SyntaxError> for CompressError {
    fn from(err: SyntaxError) -> Self {
        match err {
            SyntaxError::ParserInit => CompressError::ParserInit,
            SyntaxError::Invalid {
                line,
                column,
                message,
            } => CompressError::Parse {
                line,
                column,
                message,
            },
        }
    }
}

/// Compress a Python module.
///
/// The passes run in a fixed order: module-level imports are dropped, then
/// the module docstring, then every declaration body is summarized.
///
/// # Examples
///
/// ```
/// use distill::compress::{compress, CompressionConfig};
///
/// let source = "def add(a, b):\n    total = a + b\n    return total\n";
/// let compressed = compress(source, &CompressionConfig::default()).unwrap();
/// assert_eq!(
///     compressed,
///     "def add(a, b):\n    \"<Content purposely removed: 2 lines>\"\n"
/// );
/// ```
pub fn compress(source: &str, config: &CompressionConfig) -> Result<String, CompressError> {
    let module = parse_module(source)?;
    let declarations = module.declaration_count();

    let module = if config.keep_imports {
        module
    } else {
        strip_imports(module)
    };
    let module = if config.keep_docstrings {
        module
    } else {
        strip_module_docstring(module)
    };
    let module = summarize_module(module, config);

    let rendered = render::render_module(&module);
    verify(&rendered)?;

    debug!(
        declarations,
        original_bytes = source.len(),
        compressed_bytes = rendered.len(),
        "compressed module"
    );
    Ok(rendered)
}

fn verify(rendered: &str) -> Result<(), CompressError> {
    match parse_module(rendered) {
        Ok(_) => Ok(()),
        Err(SyntaxError::ParserInit) => Err(CompressError::ParserInit),
        Err(err @ SyntaxError::Invalid { .. }) => Err(CompressError::Serialization {
            message: err.to_string(),
        }),
    }
}

/// Outcome of compressing one file of a batch.
#[derive(Debug, Clone)]
pub struct CompressedFile {
    pub path: PathBuf,
    pub result: Result<String, CompressError>,
}

/// Compress many files in parallel. Results keep the input order.
pub fn compress_many(files: &[(PathBuf, String)], config: &CompressionConfig) -> Vec<CompressedFile> {
    files
        .par_iter()
        .map(|(path, content)| {
            let result = compress(content, config);
            if let Err(e) = &result {
                debug!(path = %path.display(), error = %e, "compression failed");
            }
            CompressedFile {
                path: path.clone(),
                result,
            }
        })
        .collect()
}

/// Drop module-level imports. Imports nested in other statements stay.
fn strip_imports(module: ModuleRoot) -> ModuleRoot {
    ModuleRoot {
        body: module
            .body
            .into_iter()
            .filter(|stmt| !stmt.is_import())
            .collect(),
    }
}

fn strip_module_docstring(module: ModuleRoot) -> ModuleRoot {
    let mut body = module.body;
    if body.first().is_some_and(Statement::is_docstring) {
        body.remove(0);
    }
    ModuleRoot { body }
}

fn summarize_module(module: ModuleRoot, config: &CompressionConfig) -> ModuleRoot {
    ModuleRoot {
        body: module
            .body
            .into_iter()
            .map(|stmt| summarize_statement(stmt, config))
            .collect(),
    }
}

fn summarize_statement(stmt: Statement, config: &CompressionConfig) -> Statement {
    match stmt {
        Statement::ClassDecl(decl) => Statement::ClassDecl(summarize_class(decl, config)),
        Statement::FunctionDecl(decl) => Statement::FunctionDecl(summarize_function(decl, config)),
        Statement::Other(other) => Statement::Other(OtherStatement {
            parts: other
                .parts
                .into_iter()
                .map(|part| match part {
                    Fragment::Nested(nested) => {
                        Fragment::Nested(summarize_statement(nested, config))
                    }
                    text @ Fragment::Text(_) => text,
                })
                .collect(),
            ..other
        }),
        placeholder @ Statement::Placeholder(_) => placeholder,
    }
}

fn placeholder_for(body: &[Statement], config: &CompressionConfig) -> Statement {
    Statement::Placeholder(if config.include_line_count {
        Placeholder::with_line_count(total_line_span(body))
    } else {
        Placeholder::new()
    })
}

/// Class body: docstring, then simple assignments in order, then a placeholder.
fn summarize_class(decl: Declaration, config: &CompressionConfig) -> Declaration {
    let placeholder = placeholder_for(&decl.body, config);
    let Declaration {
        header,
        body_indent,
        body,
        span,
    } = decl;

    let mut statements = body.into_iter().peekable();
    let mut summary = Vec::new();

    if let Some(docstring) = statements.next_if(Statement::is_docstring) {
        if config.keep_docstrings {
            summary.push(docstring);
        }
    }
    if config.keep_class_attributes {
        summary.extend(statements.filter(Statement::is_assignment));
    }
    summary.push(placeholder);

    Declaration {
        header,
        body_indent,
        body: summary,
        span,
    }
}

/// Function body: docstring, then a placeholder. Nested declarations go with
/// the rest of the body.
fn summarize_function(decl: Declaration, config: &CompressionConfig) -> Declaration {
    let placeholder = placeholder_for(&decl.body, config);
    let Declaration {
        header,
        body_indent,
        body,
        span,
    } = decl;

    let mut summary: Vec<Statement> = if config.keep_docstrings {
        body.into_iter().next().filter(Statement::is_docstring).into_iter().collect()
    } else {
        Vec::new()
    };
    summary.push(placeholder);

    Declaration {
        header,
        body_indent,
        body: summary,
        span,
    }
}

//! Serialization of a statement tree back to Python text.

use crate::syntax::{Declaration, Fragment, ModuleRoot, Statement};

/// Render a module: one statement per line, declarations set apart by a
/// blank line. Non-empty output ends with a newline.
pub(super) fn render_module(module: &ModuleRoot) -> String {
    let mut out = String::new();
    let mut previous: Option<&Statement> = None;

    for stmt in &module.body {
        if let Some(prev) = previous {
            out.push('\n');
            if prev.is_declaration() || stmt.is_declaration() {
                out.push('\n');
            }
        }
        render_statement(stmt, &mut out);
        previous = Some(stmt);
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Render a statement starting at the current column; continuation lines
/// carry their own indentation.
fn render_statement(stmt: &Statement, out: &mut String) {
    match stmt {
        Statement::ClassDecl(decl) | Statement::FunctionDecl(decl) => {
            render_declaration(decl, out)
        }
        Statement::Placeholder(placeholder) => {
            out.push('"');
            out.push_str(&placeholder.text());
            out.push('"');
        }
        Statement::Other(other) => {
            for part in &other.parts {
                match part {
                    Fragment::Text(text) => out.push_str(text),
                    Fragment::Nested(nested) => render_statement(nested, out),
                }
            }
        }
    }
}

fn render_declaration(decl: &Declaration, out: &mut String) {
    out.push_str(&decl.header);
    for stmt in &decl.body {
        out.push('\n');
        out.push_str(&decl.body_indent);
        render_statement(stmt, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{LineSpan, OtherStatement, Placeholder, StatementKind};

    fn simple(text: &str) -> Statement {
        Statement::Other(OtherStatement::verbatim(
            StatementKind::Simple,
            LineSpan::single_line(1),
            text,
        ))
    }

    fn function(header: &str, body: Vec<Statement>) -> Statement {
        Statement::FunctionDecl(Declaration {
            header: header.to_string(),
            body_indent: "    ".to_string(),
            body,
            span: LineSpan::single_line(1),
        })
    }

    #[test]
    fn test_empty_module_renders_nothing() {
        assert_eq!(render_module(&ModuleRoot::default()), "");
    }

    #[test]
    fn test_declarations_are_separated_by_blank_lines() {
        let module = ModuleRoot {
            body: vec![
                simple("x = 1"),
                simple("y = 2"),
                function("def f():", vec![Statement::Placeholder(Placeholder::new())]),
                simple("f()"),
            ],
        };
        assert_eq!(
            render_module(&module),
            "x = 1\ny = 2\n\ndef f():\n    \"<Content purposely removed>\"\n\nf()\n"
        );
    }

    #[test]
    fn test_nested_fragments_render_in_place() {
        let nested = Statement::FunctionDecl(Declaration {
            header: "def g():".to_string(),
            body_indent: "        ".to_string(),
            body: vec![Statement::Placeholder(Placeholder::with_line_count(3))],
            span: LineSpan::new(2, 5),
        });
        let compound = Statement::Other(OtherStatement {
            kind: StatementKind::Compound,
            span: LineSpan::new(1, 5),
            parts: vec![
                Fragment::Text("if DEBUG:\n    ".to_string()),
                Fragment::Nested(nested),
            ],
        });
        let module = ModuleRoot {
            body: vec![compound],
        };
        assert_eq!(
            render_module(&module),
            "if DEBUG:\n    def g():\n        \"<Content purposely removed: 3 lines>\"\n"
        );
    }
}

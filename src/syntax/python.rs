//! Lowering of the tree-sitter Python grammar into [`Statement`]s.

use tree_sitter::Node;

use super::{
    Declaration, Fragment, LineSpan, ModuleRoot, OtherStatement, Statement, StatementKind,
    SyntaxError, PLACEHOLDER_PREFIX, find_child_by_kind, node_text, parse_tree,
};

const COMPOUND_KINDS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "try_statement",
    "with_statement",
    "match_statement",
];

/// Indentation used for bodies written on the header line (`def f(): pass`).
const INDENT_UNIT: &str = "    ";

/// Parse Python source into a [`ModuleRoot`].
///
/// Fails on any syntax error; partial trees are never returned.
pub fn parse_module(content: &str) -> Result<ModuleRoot, SyntaxError> {
    let tree = parse_tree(content)?;
    Ok(ModuleRoot {
        body: lower_block(tree.root_node(), content),
    })
}

fn lower_block(node: Node, content: &str) -> Vec<Statement> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect();

    children
        .into_iter()
        .map(|child| lower_statement(child, content))
        .collect()
}

fn lower_statement(node: Node, content: &str) -> Statement {
    match node.kind() {
        "function_definition" => lower_declaration(node, node, content)
            .map(Statement::FunctionDecl)
            .unwrap_or_else(|| verbatim(node, content, StatementKind::Simple)),
        "class_definition" => lower_declaration(node, node, content)
            .map(Statement::ClassDecl)
            .unwrap_or_else(|| verbatim(node, content, StatementKind::Simple)),
        "decorated_definition" => {
            let lowered = node.child_by_field_name("definition").and_then(|def| {
                let decl = lower_declaration(node, def, content)?;
                Some(if def.kind() == "class_definition" {
                    Statement::ClassDecl(decl)
                } else {
                    Statement::FunctionDecl(decl)
                })
            });
            lowered.unwrap_or_else(|| verbatim(node, content, StatementKind::Simple))
        }
        "import_statement" | "import_from_statement" | "future_import_statement" => {
            verbatim(node, content, StatementKind::Import)
        }
        "expression_statement" => {
            let kind = if is_docstring(node, content) {
                StatementKind::Docstring
            } else if is_assignment(node) {
                StatementKind::Assignment
            } else {
                StatementKind::Simple
            };
            verbatim(node, content, kind)
        }
        kind if COMPOUND_KINDS.contains(&kind) => Statement::Other(OtherStatement {
            kind: StatementKind::Compound,
            span: span_of(node, node, content),
            parts: lower_fragments(node, content),
        }),
        _ => verbatim(node, content, StatementKind::Simple),
    }
}

fn verbatim(node: Node, content: &str, kind: StatementKind) -> Statement {
    Statement::Other(OtherStatement::verbatim(
        kind,
        span_of(node, node, content),
        statement_text(node, content),
    ))
}

/// Lower a declaration. `outer` is the decorated wrapper when there is one,
/// `def` the `function_definition`/`class_definition` itself.
fn lower_declaration(outer: Node, def: Node, content: &str) -> Option<Declaration> {
    let body = def.child_by_field_name("body")?;

    // The colon opening the body is a direct child; colons inside parameters
    // and annotations belong to nested nodes.
    let mut cursor = def.walk();
    let colon = def
        .children(&mut cursor)
        .filter(|c| c.kind() == ":" && c.end_byte() <= body.start_byte())
        .last()?;

    let header = content[outer.start_byte()..colon.end_byte()].to_string();
    let statements = lower_block(body, content);

    let body_indent = match body
        .named_children(&mut body.walk())
        .find(|c| !c.is_extra())
    {
        Some(first) if first.start_position().row > colon.start_position().row => {
            line_indent(first, content).to_string()
        }
        _ => format!("{}{INDENT_UNIT}", line_indent(outer, content)),
    };

    Some(Declaration {
        header,
        body_indent,
        body: statements,
        span: span_of(def, outer, content),
    })
}

/// Split a compound statement into verbatim text and the declarations nested
/// anywhere inside it.
fn lower_fragments(node: Node, content: &str) -> Vec<Fragment> {
    let end = node.start_byte() + statement_text(node, content).len();
    let mut pos = node.start_byte();
    let mut parts = Vec::new();

    collect_nested(node, content, &mut pos, &mut parts);

    if pos < end {
        parts.push(Fragment::Text(content[pos..end].to_string()));
    }
    parts
}

fn collect_nested(node: Node, content: &str, pos: &mut usize, parts: &mut Vec<Fragment>) {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.named_children(&mut cursor).collect();

    for child in children {
        match child.kind() {
            "function_definition" | "class_definition" | "decorated_definition" => {
                if *pos < child.start_byte() {
                    parts.push(Fragment::Text(
                        content[*pos..child.start_byte()].to_string(),
                    ));
                }
                parts.push(Fragment::Nested(lower_statement(child, content)));
                *pos = child.start_byte() + statement_text(child, content).len();
            }
            _ => collect_nested(child, content, pos, parts),
        }
    }
}

/// Node text without trailing whitespace.
fn statement_text<'a>(node: Node, content: &'a str) -> &'a str {
    node_text(node, content).trim_end()
}

/// Leading whitespace of the line `node` starts on.
fn line_indent<'a>(node: Node, content: &'a str) -> &'a str {
    let line_start = node.start_byte() - node.start_position().column;
    let prefix = &content[line_start..node.start_byte()];
    let width = prefix.len() - prefix.trim_start().len();
    &prefix[..width]
}

/// 1-indexed span from the start of `first` to the last line of code in
/// `last`. Comments trailing a block belong to the enclosing node in the
/// grammar but are not part of any statement, so they do not extend the span.
fn span_of(first: Node, last: Node, content: &str) -> LineSpan {
    let start_line = first.start_position().row + 1;
    let leaf = last_code_token(last);
    let text = statement_text(leaf, content);
    let end_line = leaf.start_position().row + 1 + text.matches('\n').count();
    LineSpan::new(start_line, end_line.max(start_line))
}

/// Deepest last descendant of `node` that is neither a comment nor another
/// extra, nor empty.
fn last_code_token(node: Node) -> Node {
    let mut current = node;
    loop {
        let mut cursor = current.walk();
        let last = current
            .children(&mut cursor)
            .filter(|c| !c.is_extra() && c.end_byte() > c.start_byte())
            .last();
        match last {
            Some(child) => current = child,
            None => return current,
        }
    }
}

fn significant_children(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor)
        .filter(|c| !c.is_extra())
        .collect()
}

/// A statement consisting solely of a plain string literal, or an implicit
/// concatenation of them. Placeholder literals are excluded so summarized
/// output never mistakes its own markers for documentation.
fn is_docstring(node: Node, content: &str) -> bool {
    let children = significant_children(node);
    let [expr] = children.as_slice() else {
        return false;
    };

    match expr.kind() {
        "string" => is_text_literal(*expr, content) && !is_placeholder_literal(*expr, content),
        "concatenated_string" => {
            let parts = significant_children(*expr);
            !parts.is_empty()
                && parts.iter().all(|s| s.kind() == "string" && is_text_literal(*s, content))
        }
        _ => false,
    }
}

/// Excludes f-strings, t-strings and bytes, which are not documentation.
fn is_text_literal(node: Node, content: &str) -> bool {
    let text = node_text(node, content);
    let prefix: String = text
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();

    let templated = prefix
        .chars()
        .any(|c| matches!(c.to_ascii_lowercase(), 'f' | 't' | 'b'));

    !templated && find_child_by_kind(node, "interpolation").is_none()
}

fn is_placeholder_literal(node: Node, content: &str) -> bool {
    node_text(node, content)
        .trim_start_matches(|c: char| c.is_ascii_alphabetic())
        .trim_start_matches(['"', '\''])
        .starts_with(PLACEHOLDER_PREFIX)
}

fn is_assignment(node: Node) -> bool {
    significant_children(node)
        .first()
        .is_some_and(|c| c.kind() == "assignment")
}

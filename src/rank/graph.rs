//! Direct import relationships between modules.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use tree_sitter::Node;

use crate::syntax::{node_text, parse_tree, SyntaxError};

/// Read-only view of a project's import graph.
///
/// An edge `a -> b` means module `a` directly imports module `b`. Lookups
/// for modules absent from the graph return empty sets.
pub trait ImportGraph {
    /// Modules `module` imports directly.
    fn modules_directly_imported_by(&self, module: &str) -> BTreeSet<String>;

    /// Modules that directly import `module`.
    fn modules_that_directly_import(&self, module: &str) -> BTreeSet<String>;
}

/// In-memory import graph over module names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleGraph {
    imports: BTreeMap<String, BTreeSet<String>>,
    importers: BTreeMap<String, BTreeSet<String>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module with no edges.
    pub fn add_module(&mut self, module: impl Into<String>) {
        let module = module.into();
        self.importers.entry(module.clone()).or_default();
        self.imports.entry(module).or_default();
    }

    /// Record that `importer` directly imports `imported`.
    pub fn add_import(&mut self, importer: impl Into<String>, imported: impl Into<String>) {
        let importer = importer.into();
        let imported = imported.into();
        self.add_module(importer.clone());
        self.add_module(imported.clone());

        self.importers
            .entry(imported.clone())
            .or_default()
            .insert(importer.clone());
        self.imports.entry(importer).or_default().insert(imported);
    }

    pub fn contains(&self, module: &str) -> bool {
        self.imports.contains_key(module)
    }

    /// All modules, in name order.
    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.imports.keys().map(String::as_str)
    }

    pub fn edge_count(&self) -> usize {
        self.imports.values().map(BTreeSet::len).sum()
    }

    /// Build the graph of internal imports between `sources`.
    ///
    /// Only modules listed in `sources` become nodes; imports of anything
    /// else (stdlib, third party) are ignored. Sources that fail to parse
    /// contribute no edges.
    pub fn from_sources<'a, I>(sources: I) -> Self
    where
        I: IntoIterator<Item = SourceModule<'a>>,
    {
        let sources: Vec<SourceModule<'a>> = sources.into_iter().collect();

        let mut graph = Self::new();
        for source in &sources {
            graph.add_module(source.name);
        }
        let known: BTreeSet<String> = graph.imports.keys().cloned().collect();

        for source in &sources {
            let imports = match extract_imports(source.content) {
                Ok(imports) => imports,
                Err(e) => {
                    warn!(module = %source.name, error = %e, "skipping imports of unparseable module");
                    continue;
                }
            };

            for import in &imports {
                for target in resolve(source, import, &known) {
                    if target != source.name {
                        graph.add_import(source.name, target);
                    }
                }
            }
        }

        debug!(
            modules = graph.imports.len(),
            edges = graph.edge_count(),
            "built import graph"
        );
        graph
    }
}

impl ImportGraph for ModuleGraph {
    fn modules_directly_imported_by(&self, module: &str) -> BTreeSet<String> {
        self.imports.get(module).cloned().unwrap_or_default()
    }

    fn modules_that_directly_import(&self, module: &str) -> BTreeSet<String> {
        self.importers.get(module).cloned().unwrap_or_default()
    }
}

/// A module handed to [`ModuleGraph::from_sources`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceModule<'a> {
    pub name: &'a str,
    /// Whether the file is a package marker (`__init__.py`), which makes the
    /// module its own package for relative imports.
    pub is_package: bool,
    pub content: &'a str,
}

impl<'a> SourceModule<'a> {
    pub fn new(name: &'a str, is_package: bool, content: &'a str) -> Self {
        Self {
            name,
            is_package,
            content,
        }
    }
}

/// An import statement as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportRef {
    /// Dotted module path after the leading dots (may be empty: `from . import x`).
    pub module: String,
    /// Names after `import` in a `from` import. Empty for plain and wildcard imports.
    pub names: Vec<String>,
    /// Number of leading dots.
    pub level: usize,
    pub is_from: bool,
}

/// Collect every import statement in `content`, at any nesting depth.
pub(crate) fn extract_imports(content: &str) -> Result<Vec<ImportRef>, SyntaxError> {
    let tree = parse_tree(content)?;
    let mut imports = Vec::new();
    collect_imports(tree.root_node(), content, &mut imports);
    Ok(imports)
}

fn collect_imports(node: Node, content: &str, imports: &mut Vec<ImportRef>) {
    match node.kind() {
        "import_statement" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                imports.push(ImportRef {
                    module: dotted(imported_name(name), content),
                    names: Vec::new(),
                    level: 0,
                    is_from: false,
                });
            }
        }
        "import_from_statement" => {
            let Some(module) = node.child_by_field_name("module_name") else {
                return;
            };

            let (level, module) = if module.kind() == "relative_import" {
                let level = node_text(module, content)
                    .chars()
                    .take_while(|c| *c == '.')
                    .count();
                let mut cursor = module.walk();
                let path = module
                    .named_children(&mut cursor)
                    .find(|c| c.kind() == "dotted_name")
                    .map(|n| dotted(n, content))
                    .unwrap_or_default();
                (level, path)
            } else {
                (0, dotted(module, content))
            };

            let mut cursor = node.walk();
            let names = node
                .children_by_field_name("name", &mut cursor)
                .map(|n| dotted(imported_name(n), content))
                .collect();

            imports.push(ImportRef {
                module,
                names,
                level,
                is_from: true,
            });
        }
        // `from __future__ import ...` never names a project module.
        "future_import_statement" => {}
        _ => {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.named_children(&mut cursor).collect();
            for child in children {
                collect_imports(child, content, imports);
            }
        }
    }
}

/// The imported path of `x as y` is `x`.
fn imported_name(node: Node) -> Node {
    if node.kind() == "aliased_import" {
        node.child_by_field_name("name").unwrap_or(node)
    } else {
        node
    }
}

fn dotted(node: Node, content: &str) -> String {
    node_text(node, content)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

/// Resolve an import to the known modules it refers to.
fn resolve(importer: &SourceModule, import: &ImportRef, known: &BTreeSet<String>) -> BTreeSet<String> {
    let mut targets = BTreeSet::new();

    let Some(base) = absolute_base(importer, import) else {
        return targets;
    };

    if !import.is_from || import.names.is_empty() {
        targets.extend(longest_known_prefix(&base, known));
        return targets;
    }

    // `from pkg import name` refers to the submodule `pkg.name` when there is
    // one, otherwise to something defined in `pkg` itself.
    for name in &import.names {
        let candidate = if base.is_empty() {
            name.clone()
        } else {
            format!("{base}.{name}")
        };
        if known.contains(&candidate) {
            targets.insert(candidate);
        } else {
            targets.extend(longest_known_prefix(&base, known));
        }
    }
    targets
}

/// Absolute dotted path an import starts from. `None` when a relative import
/// climbs above the top-level package.
fn absolute_base(importer: &SourceModule, import: &ImportRef) -> Option<String> {
    if import.level == 0 {
        return Some(import.module.clone());
    }

    let mut package: Vec<&str> = importer.name.split('.').filter(|p| !p.is_empty()).collect();
    if !importer.is_package {
        package.pop()?;
    }
    for _ in 1..import.level {
        package.pop()?;
    }
    if !import.module.is_empty() {
        package.extend(import.module.split('.'));
    }
    Some(package.join("."))
}

fn longest_known_prefix(dotted: &str, known: &BTreeSet<String>) -> Option<String> {
    let parts: Vec<&str> = dotted.split('.').filter(|p| !p.is_empty()).collect();
    (1..=parts.len())
        .rev()
        .map(|len| parts[..len].join("."))
        .find(|candidate| known.contains(candidate))
}

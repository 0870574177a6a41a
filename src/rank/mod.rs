//! Importance ranking of project files.
//!
//! Scores every file with a small integer heuristic built from its position
//! in the tree, its size and its direct import edges, then orders files so
//! that a limited context budget goes to the most central ones first.
//!
//! The score is relative: it only means something next to other scores from
//! the same ranking pass.

mod graph;
mod naming;

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use tracing::debug;

pub use graph::{ImportGraph, ModuleGraph, SourceModule};
pub use naming::{ModuleNamer, PackageLayout, PACKAGE_MARKER};

/// File stems that mark an entry point.
pub const ENTRY_POINT_NAMES: [&str; 4] = ["main", "app", "__main__", "core"];

/// Starting score of every non-empty file.
pub const BASE_SCORE: i64 = 10;
/// Bonus for files named like an entry point.
pub const ENTRY_POINT_BONUS: i64 = 1000;
/// Depth bonus budget; each path segment spends `DEPTH_PENALTY` of it.
pub const SHALLOW_BONUS: i64 = 60;
pub const DEPTH_PENALTY: i64 = 10;
/// Points per module this file imports.
pub const IMPORT_WEIGHT: i64 = 10;
/// Points per module importing this file.
pub const IMPORTED_IN_WEIGHT: i64 = 5;
/// One point is subtracted per this many lines.
pub const LINES_PER_PENALTY: i64 = 50;

/// A project file with its import edges and importance score.
///
/// Built once per ranking pass and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLoaded {
    name: String,
    path: PathBuf,
    content: String,
    importance: i64,
    imports: BTreeSet<String>,
    imported_in: BTreeSet<String>,
}

impl FileLoaded {
    /// Create a record and score it.
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        content: impl Into<String>,
        imports: BTreeSet<String>,
        imported_in: BTreeSet<String>,
    ) -> Self {
        let mut file = Self {
            name: name.into(),
            path: path.into(),
            content: content.into(),
            importance: 0,
            imports,
            imported_in,
        };
        file.importance = importance(&file);
        file
    }

    /// Module-qualified name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn importance(&self) -> i64 {
        self.importance
    }

    /// Modules this file imports directly.
    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }

    /// Modules that import this file directly.
    pub fn imported_in(&self) -> &BTreeSet<String> {
        &self.imported_in
    }

    /// Number of path segments.
    pub fn depth(&self) -> usize {
        self.path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .count()
    }

    /// Length of the content in characters.
    pub fn content_length(&self) -> usize {
        self.content.chars().count()
    }

    /// Number of newlines plus one.
    pub fn line_count(&self) -> usize {
        bytecount::count(self.content.as_bytes(), b'\n') + 1
    }

    pub fn is_entry_point(&self) -> bool {
        self.path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| ENTRY_POINT_NAMES.contains(&stem))
    }
}

/// Importance of a file. Depends only on its path, content size and the
/// number of its import edges. Unbounded below: very long files can score
/// negative, and such scores are compared as they are.
fn importance(file: &FileLoaded) -> i64 {
    if file.content.is_empty() {
        return 0;
    }

    let mut score = BASE_SCORE;
    if file.is_entry_point() {
        score += ENTRY_POINT_BONUS;
    }
    score += (SHALLOW_BONUS - DEPTH_PENALTY * to_i64(file.depth())).max(0);
    score += IMPORT_WEIGHT * to_i64(file.imports.len());
    score += IMPORTED_IN_WEIGHT * to_i64(file.imported_in.len());
    score -= to_i64(file.line_count()) / LINES_PER_PENALTY;
    score
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Builds [`FileLoaded`] records from file contents and an import graph.
pub struct Ranker<'g, G: ?Sized, N> {
    graph: &'g G,
    namer: N,
}

impl<'g, G, N> Ranker<'g, G, N>
where
    G: ImportGraph + ?Sized,
    N: ModuleNamer,
{
    pub fn new(graph: &'g G, namer: N) -> Self {
        Self { graph, namer }
    }

    /// Name a file, look up its direct edges and score it.
    pub fn load(&self, path: impl Into<PathBuf>, content: impl Into<String>) -> FileLoaded {
        let path = path.into();
        let name = self.namer.module_name(&path);
        let imports = self.graph.modules_directly_imported_by(&name);
        let imported_in = self.graph.modules_that_directly_import(&name);
        FileLoaded::new(name, path, content, imports, imported_in)
    }

    /// Load every file and sort by descending importance.
    ///
    /// The sort is stable: files with equal scores keep their input order.
    pub fn rank<I, P, S>(&self, files: I) -> Vec<FileLoaded>
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let mut loaded: Vec<FileLoaded> = files
            .into_iter()
            .map(|(path, content)| self.load(path, content))
            .collect();

        loaded.sort_by(|a, b| b.importance.cmp(&a.importance));

        debug!(
            files = loaded.len(),
            top = loaded.first().map(FileLoaded::name).unwrap_or_default(),
            "ranked files"
        );
        loaded
    }
}

/// Rank files using the conventional package layout.
///
/// # Examples
///
/// ```
/// use distill::rank::{rank, ModuleGraph};
///
/// let mut graph = ModuleGraph::new();
/// graph.add_import("app.main", "app.db");
///
/// let ranked = rank(
///     [("app/db.py", "def connect():\n    pass\n"), ("app/main.py", "import app.db\n")],
///     &graph,
/// );
/// assert_eq!(ranked[0].name(), "app.main");
/// ```
pub fn rank<G, I, P, S>(files: I, graph: &G) -> Vec<FileLoaded>
where
    G: ImportGraph + ?Sized,
    I: IntoIterator<Item = (P, S)>,
    P: Into<PathBuf>,
    S: Into<String>,
{
    Ranker::new(graph, PackageLayout::default()).rank(files)
}

/// A file's share of the total content.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentShare {
    pub path: PathBuf,
    /// Content length in characters.
    pub length: usize,
    /// Percentage of the total content length, 0 when everything is empty.
    pub percent: f64,
}

/// Content shares, largest file first. Equal lengths keep input order.
pub fn content_shares(files: &[FileLoaded]) -> Vec<ContentShare> {
    let total: usize = files.iter().map(FileLoaded::content_length).sum();

    let mut shares: Vec<ContentShare> = files
        .iter()
        .map(|file| {
            let length = file.content_length();
            let percent = if total > 0 {
                length as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            ContentShare {
                path: file.path.clone(),
                length,
                percent,
            }
        })
        .collect();

    shares.sort_by(|a, b| b.length.cmp(&a.length));
    shares
}

//! Python file discovery.
//!
//! Walks a project with the `ignore` crate so .gitignore, .git/info/exclude,
//! the global gitignore and `.distillignore` are honoured.

use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use thiserror::Error;
use tracing::{debug, warn};

/// Name of the project-local ignore file.
pub const IGNORE_FILE: &str = ".distillignore";

/// Extensions treated as Python sources.
pub const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

/// Errors that can occur during directory walking.
#[derive(Debug, Error)]
pub enum WalkError {
    #[error("path not found: {path}")]
    NotFound { path: PathBuf },

    #[error("not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("symlink loop detected: {path}")]
    SymlinkLoop { path: PathBuf },
}

/// Options for directory walking.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Maximum depth to recurse (None = unlimited).
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub include_hidden: bool,
    pub respect_gitignore: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            include_hidden: false,
            respect_gitignore: true,
        }
    }
}

impl WalkOptions {
    pub fn with_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    pub fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }
}

/// Whether `path` has a Python source extension.
pub fn is_python_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| PYTHON_EXTENSIONS.contains(&ext))
}

/// Collect every Python file under `root`, sorted by path.
///
/// # Examples
///
/// ```no_run
/// use distill::walker::{python_files, WalkOptions};
/// use std::path::Path;
///
/// for path in python_files(Path::new("."), &WalkOptions::default()).unwrap() {
///     println!("{}", path.display());
/// }
/// ```
pub fn python_files(root: &Path, options: &WalkOptions) -> Result<Vec<PathBuf>, WalkError> {
    if !root.exists() {
        return Err(WalkError::NotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(WalkError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(!options.include_hidden)
        .git_ignore(options.respect_gitignore)
        .git_global(options.respect_gitignore)
        .git_exclude(options.respect_gitignore)
        .follow_links(options.follow_symlinks)
        .max_depth(options.max_depth)
        .add_custom_ignore_filename(IGNORE_FILE)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for result in builder.build() {
        match result {
            Ok(entry) => {
                let is_file = entry.file_type().is_some_and(|ft| ft.is_file());
                if is_file && is_python_file(entry.path()) {
                    files.push(entry.into_path());
                }
            }
            Err(err) => {
                if let Some(err) = convert_error(err, root) {
                    return Err(err);
                }
            }
        }
    }

    files.sort();
    debug!(root = %root.display(), files = files.len(), "collected python files");
    Ok(files)
}

/// Map an `ignore` error onto [`WalkError`]. Ignore-file syntax problems are
/// logged and skipped.
fn convert_error(err: ignore::Error, path: &Path) -> Option<WalkError> {
    match err {
        ignore::Error::WithPath { path, err } => convert_error(*err, &path),
        ignore::Error::WithDepth { err, .. } => convert_error(*err, path),
        ignore::Error::WithLineNumber { err, .. } => convert_error(*err, path),
        ignore::Error::Loop { child, .. } => Some(WalkError::SymlinkLoop { path: child }),
        ignore::Error::Io(source) if source.kind() == io::ErrorKind::PermissionDenied => {
            Some(WalkError::PermissionDenied {
                path: path.to_path_buf(),
            })
        }
        ignore::Error::Io(source) => Some(WalkError::Io {
            path: path.to_path_buf(),
            source,
        }),
        other => {
            warn!(path = %path.display(), error = %other, "ignoring walk error");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("pkg/sub")).unwrap();
        fs::write(dir.path().join("pkg/__init__.py"), "").unwrap();
        fs::write(dir.path().join("pkg/core.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("pkg/sub/stubs.pyi"), "def f() -> int: ...\n").unwrap();
        fs::write(dir.path().join("README.md"), "# readme").unwrap();
        fs::write(dir.path().join("setup.cfg"), "[metadata]").unwrap();

        dir
    }

    fn names(dir: &TempDir, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(dir.path())
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn test_python_files_filters_and_sorts() {
        let dir = create_test_dir();
        let files = python_files(dir.path(), &WalkOptions::default()).unwrap();

        assert_eq!(
            names(&dir, &files),
            vec!["pkg/__init__.py", "pkg/core.py", "pkg/sub/stubs.pyi"]
        );
    }

    #[test]
    fn test_is_python_file() {
        assert!(is_python_file(Path::new("a/b.py")));
        assert!(is_python_file(Path::new("b.pyi")));
        assert!(!is_python_file(Path::new("b.pyc")));
        assert!(!is_python_file(Path::new("py")));
    }

    #[test]
    fn test_nonexistent_root() {
        let err = python_files(Path::new("/nonexistent/path"), &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, WalkError::NotFound { .. }));
    }

    #[test]
    fn test_file_root_is_rejected() {
        let dir = create_test_dir();
        let err = python_files(&dir.path().join("pkg/core.py"), &WalkOptions::default()).unwrap_err();
        assert!(matches!(err, WalkError::NotADirectory { .. }));
    }

    #[test]
    fn test_respects_gitignore() {
        let dir = TempDir::new().unwrap();

        // The ignore crate only reads .gitignore inside a repository.
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("kept.py"), "").unwrap();
        fs::write(dir.path().join("generated.py"), "").unwrap();
        fs::write(dir.path().join(".gitignore"), "generated.py\n").unwrap();

        let files = python_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&dir, &files), vec!["kept.py"]);

        let options = WalkOptions::default().respect_gitignore(false);
        let files = python_files(dir.path(), &options).unwrap();
        assert_eq!(names(&dir, &files), vec!["generated.py", "kept.py"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_reported_when_following_links() {
        let dir = TempDir::new().unwrap();

        fs::create_dir(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/mod.py"), "").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("pkg/loop")).unwrap();

        // Not followed: the link is skipped.
        let files = python_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&dir, &files), vec!["pkg/mod.py"]);

        let options = WalkOptions::default().follow_symlinks(true);
        let err = python_files(dir.path(), &options).unwrap_err();
        assert!(matches!(err, WalkError::SymlinkLoop { .. }));
    }

    #[test]
    fn test_respects_distillignore() {
        let dir = TempDir::new().unwrap();

        fs::create_dir(dir.path().join("migrations")).unwrap();
        fs::write(dir.path().join("models.py"), "").unwrap();
        fs::write(dir.path().join("migrations/0001_initial.py"), "").unwrap();
        fs::write(dir.path().join(IGNORE_FILE), "migrations/\n").unwrap();

        let files = python_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&dir, &files), vec!["models.py"]);
    }

    #[test]
    fn test_hidden_files() {
        let dir = TempDir::new().unwrap();

        fs::write(dir.path().join("visible.py"), "").unwrap();
        fs::write(dir.path().join(".hidden.py"), "").unwrap();

        let files = python_files(dir.path(), &WalkOptions::default()).unwrap();
        assert_eq!(names(&dir, &files), vec!["visible.py"]);

        let options = WalkOptions::default().with_hidden(true);
        let files = python_files(dir.path(), &options).unwrap();
        assert_eq!(names(&dir, &files), vec![".hidden.py", "visible.py"]);
    }

    #[test]
    fn test_max_depth() {
        let dir = TempDir::new().unwrap();

        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::write(dir.path().join("a/b/c/deep.py"), "").unwrap();
        fs::write(dir.path().join("a/shallow.py"), "").unwrap();

        let options = WalkOptions::default().max_depth(2);
        let files = python_files(dir.path(), &options).unwrap();
        assert_eq!(names(&dir, &files), vec!["a/shallow.py"]);
    }
}

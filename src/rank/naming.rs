//! Mapping from file paths to dotted module names.

use std::path::{Component, Path, PathBuf};

/// Derives the module-qualified name of a source file.
///
/// Kept behind a trait so projects with unusual layouts (namespace packages,
/// `src/` roots) can substitute their own mapping without touching the ranker.
pub trait ModuleNamer {
    fn module_name(&self, path: &Path) -> String;
}

impl<F> ModuleNamer for F
where
    F: Fn(&Path) -> String,
{
    fn module_name(&self, path: &Path) -> String {
        self(path)
    }
}

/// Stem of the file that marks a directory as a package.
pub const PACKAGE_MARKER: &str = "__init__";

/// Conventional Python package layout.
///
/// Drops the extension, addresses `pkg/__init__.py` as `pkg`, and joins path
/// components with dots. An optional root is prefixed to every path, for
/// projects whose files are listed relative to the package directory itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageLayout {
    root: Option<PathBuf>,
}

impl PackageLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix every path with `root` before naming it.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    /// Whether `path` is a package marker file.
    pub fn is_package(path: &Path) -> bool {
        path.file_stem().is_some_and(|stem| stem == PACKAGE_MARKER)
    }
}

impl ModuleNamer for PackageLayout {
    fn module_name(&self, path: &Path) -> String {
        let full = match &self.root {
            Some(root) => root.join(path),
            None => path.to_path_buf(),
        };

        let mut parts: Vec<String> = full
            .with_extension("")
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        if parts.last().is_some_and(|last| last == PACKAGE_MARKER) {
            parts.pop();
        }

        parts.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_name() {
        let layout = PackageLayout::new();
        assert_eq!(layout.module_name(Path::new("pkg/sub/mod.py")), "pkg.sub.mod");
        assert_eq!(layout.module_name(Path::new("main.py")), "main");
        assert_eq!(layout.module_name(Path::new("./pkg/util.pyi")), "pkg.util");
    }

    #[test]
    fn test_package_marker_names_the_directory() {
        let layout = PackageLayout::new();
        assert_eq!(layout.module_name(Path::new("pkg/sub/__init__.py")), "pkg.sub");
        assert!(PackageLayout::is_package(Path::new("pkg/__init__.py")));
        assert!(!PackageLayout::is_package(Path::new("pkg/init.py")));
    }

    #[test]
    fn test_root_prefix() {
        let layout = PackageLayout::with_root("myapp");
        assert_eq!(layout.root(), Some(Path::new("myapp")));
        assert_eq!(PackageLayout::new().root(), None);
        assert_eq!(layout.module_name(Path::new("core.py")), "myapp.core");
        assert_eq!(layout.module_name(Path::new("__init__.py")), "myapp");
    }

    #[test]
    fn test_closure_namer() {
        let namer = |path: &Path| path.display().to_string();
        assert_eq!(namer.module_name(Path::new("a/b.py")), "a/b.py");
    }
}

//! Distill - Shrink Python codebases for size-constrained readers.
//!
//! Distill does two things with a Python project:
//!
//! - **compress** a source file down to its structure: class and function
//!   signatures survive, optionally with docstrings and class attributes,
//!   while bodies are replaced by a placeholder that records how many lines
//!   were removed;
//! - **rank** files by estimated architectural importance from their
//!   position in the package tree and the direct import graph.
//!
//! # Quick Start
//!
//! ```
//! use distill::compress::{compress, CompressionConfig};
//!
//! let source = "def add(a, b):\n    \"\"\"Sum.\"\"\"\n    return a + b\n";
//! let compressed = compress(source, &CompressionConfig::default()).unwrap();
//! assert_eq!(
//!     compressed,
//!     "def add(a, b):\n    \"<Content purposely removed: 2 lines>\"\n"
//! );
//! ```
//!
//! # Modules
//!
//! - [`syntax`] - Python parsing into an owned statement tree
//! - [`compress`] - Structural compression of a single source file
//! - [`rank`] - Import graph and importance ranking
//! - [`config`] - TOML configuration
//! - [`walker`] - Python file discovery with gitignore support
//! - [`output`] - Text and JSON reports

pub mod syntax;
pub mod compress;
pub mod rank;
pub mod config;
pub mod errors;
pub mod walker;
pub mod output;

// Re-export key types at crate root for convenience
pub use compress::{compress, compress_many, CompressError, CompressedFile, CompressionConfig};
pub use config::{Config, ConfigError};
pub use errors::DistillError;
pub use output::{OutputError, OutputFormat};
pub use rank::{rank, FileLoaded, ImportGraph, ModuleGraph, ModuleNamer, PackageLayout, Ranker};
pub use syntax::SyntaxError;
pub use walker::WalkError;

//! Error types for distill.

use std::path::PathBuf;

use crate::compress::CompressError;
use crate::config::ConfigError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for distill operations.
#[derive(Debug, thiserror::Error)]
pub enum DistillError {
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("no python files found in {0}")]
    NoFilesFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("{path}: {source}")]
    Compress {
        path: PathBuf,
        #[source]
        source: CompressError,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &DistillError) -> i32 {
    match error {
        DistillError::PathNotFound(_) => 3,
        DistillError::NoFilesFound(_) => 5,
        DistillError::Io(_) => 1,
        DistillError::ReadFailed { .. } => 1,
        DistillError::Walk(WalkError::PermissionDenied { .. }) => 4,
        DistillError::Walk(_) => 2,
        DistillError::Compress {
            source: CompressError::Parse { .. },
            ..
        } => 6,
        DistillError::Compress { .. } => 1,
        DistillError::Config(_) => 7,
        DistillError::Output(_) => 1,
    }
}

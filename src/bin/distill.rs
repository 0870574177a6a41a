//! Distill CLI - Compress Python sources and rank files by importance.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use distill::compress::{compress_many, CompressionConfig};
use distill::config::Config;
use distill::errors::{exit_code, DistillError};
use distill::output::{format_compressed, format_ranking, format_shares, OutputFormat};
use distill::rank::{content_shares, ModuleGraph, ModuleNamer, PackageLayout, Ranker, SourceModule};
use distill::walker::{python_files, WalkError, WalkOptions};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "DISTILL_LOG";

#[derive(Parser)]
#[command(name = "distill")]
#[command(about = "Compress Python sources to their structure and rank files by importance")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace function and class bodies with placeholders
    Compress {
        /// Python files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// TOML file with a [compress] table
        #[arg(long)]
        config: Option<PathBuf>,

        /// Keep module, class and function docstrings
        #[arg(long)]
        keep_docstrings: bool,

        /// Keep module-level import statements
        #[arg(long)]
        keep_imports: bool,

        /// Drop simple assignments from class bodies
        #[arg(long)]
        drop_class_attributes: bool,

        /// Omit the removed line count from placeholders
        #[arg(long)]
        no_line_count: bool,
    },

    /// Rank Python files by estimated architectural importance
    Rank {
        /// Project directory to scan
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Include hidden files and directories
        #[arg(long)]
        include_hidden: bool,

        /// Maximum directory depth
        #[arg(long)]
        max_depth: Option<usize>,

        /// Print each file's share of the total content instead of the ranking
        #[arg(long)]
        shares: bool,

        /// Also scan files excluded by .gitignore
        #[arg(long)]
        no_gitignore: bool,

        /// Follow symbolic links while scanning
        #[arg(long)]
        follow_symlinks: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Command-line overrides applied on top of the configured compression options.
#[derive(Debug, Clone, Copy, Default)]
struct CompressFlags {
    keep_docstrings: bool,
    keep_imports: bool,
    drop_class_attributes: bool,
    no_line_count: bool,
}

impl CompressFlags {
    fn apply(self, mut config: CompressionConfig) -> CompressionConfig {
        if self.keep_docstrings {
            config.keep_docstrings = true;
        }
        if self.keep_imports {
            config.keep_imports = true;
        }
        if self.drop_class_attributes {
            config.keep_class_attributes = false;
        }
        if self.no_line_count {
            config.include_line_count = false;
        }
        config
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let json_output = json_flag(&cli.command);

    let result = match cli.command {
        Commands::Compress {
            files,
            json,
            config,
            keep_docstrings,
            keep_imports,
            drop_class_attributes,
            no_line_count,
        } => run_compress(
            &files,
            json,
            config.as_deref(),
            CompressFlags {
                keep_docstrings,
                keep_imports,
                drop_class_attributes,
                no_line_count,
            },
        ),
        Commands::Rank {
            path,
            json,
            include_hidden,
            max_depth,
            shares,
            no_gitignore,
            follow_symlinks,
        } => {
            let mut options = WalkOptions::default()
                .with_hidden(include_hidden)
                .respect_gitignore(!no_gitignore)
                .follow_symlinks(follow_symlinks);
            if let Some(depth) = max_depth {
                options = options.max_depth(depth);
            }
            run_rank(&path, json, &options, shares)
        }
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "distill", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
                code: i32,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
                code: exit_code(&e),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn init_logging(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn json_flag(cmd: &Commands) -> bool {
    match cmd {
        Commands::Compress { json, .. } => *json,
        Commands::Rank { json, .. } => *json,
        Commands::Completions { .. } => false,
    }
}

// --- Compress command ---

fn run_compress(
    paths: &[PathBuf],
    json: bool,
    config_path: Option<&Path>,
    flags: CompressFlags,
) -> Result<(), DistillError> {
    let config = match config_path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let options = flags.apply(config.compress);
    debug!(?options, "compression options");

    let mut sources = Vec::with_capacity(paths.len());
    for path in paths {
        sources.push((path.clone(), read_source(path)?));
    }

    let results = compress_many(&sources, &options);

    let mut compressed = Vec::with_capacity(results.len());
    for (file, (_, original)) in results.into_iter().zip(&sources) {
        let text = file.result.map_err(|source| DistillError::Compress {
            path: file.path.clone(),
            source,
        })?;
        compressed.push((file.path, original.as_str(), text));
    }
    info!(files = compressed.len(), "compressed files");

    let view: Vec<(&Path, &str, &str)> = compressed
        .iter()
        .map(|(path, original, text)| (path.as_path(), *original, text.as_str()))
        .collect();
    print!("{}", format_compressed(&view, OutputFormat::from_json_flag(json))?);
    if json {
        println!();
    }
    Ok(())
}

fn read_source(path: &Path) -> Result<String, DistillError> {
    if !path.exists() {
        return Err(DistillError::PathNotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| DistillError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

// --- Rank command ---

fn run_rank(
    root: &Path,
    json: bool,
    options: &WalkOptions,
    shares: bool,
) -> Result<(), DistillError> {
    let paths = match python_files(root, options) {
        Ok(paths) => paths,
        Err(WalkError::NotFound { path }) => return Err(DistillError::PathNotFound(path)),
        Err(e) => return Err(e.into()),
    };
    if paths.is_empty() {
        return Err(DistillError::NoFilesFound(root.to_path_buf()));
    }

    let mut files: Vec<(PathBuf, String)> = Vec::with_capacity(paths.len());
    for path in &paths {
        let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        files.push((relative, read_source(path)?));
    }

    let layout = layout_for(root)?;
    let names: Vec<String> = files
        .iter()
        .map(|(path, _)| layout.module_name(path))
        .collect();
    let graph = ModuleGraph::from_sources(files.iter().zip(&names).map(|((path, content), name)| {
        SourceModule::new(name, PackageLayout::is_package(path), content)
    }));
    info!(
        files = files.len(),
        edges = graph.edge_count(),
        "built import graph"
    );

    let ranked = Ranker::new(&graph, layout).rank(files);
    let format = OutputFormat::from_json_flag(json);
    let report = if shares {
        format_shares(&content_shares(&ranked), format)?
    } else {
        format_ranking(&ranked, format)?
    };

    print!("{report}");
    if json {
        println!();
    }
    Ok(())
}

/// A scanned directory that is itself a package contributes its own name to
/// every module path.
fn layout_for(root: &Path) -> Result<PackageLayout, DistillError> {
    if !root.join("__init__.py").is_file() {
        return Ok(PackageLayout::new());
    }

    let canonical = fs::canonicalize(root)?;
    Ok(match canonical.file_name() {
        Some(name) => PackageLayout::with_root(name),
        None => PackageLayout::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let flags = CompressFlags {
            keep_docstrings: true,
            drop_class_attributes: true,
            ..Default::default()
        };
        let config = flags.apply(CompressionConfig::default());
        assert!(config.keep_docstrings);
        assert!(!config.keep_imports);
        assert!(!config.keep_class_attributes);
        assert!(config.include_line_count);
    }

    #[test]
    fn test_unset_flags_keep_config_values() {
        let base = CompressionConfig {
            keep_imports: true,
            include_line_count: false,
            ..Default::default()
        };
        assert_eq!(CompressFlags::default().apply(base), base);
    }

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }
}

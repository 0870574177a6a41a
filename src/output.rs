//! Output formatting for the command line.
//!
//! Every report has a plain text rendering for terminals and a JSON
//! rendering for programmatic access.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::rank::{ContentShare, FileLoaded};

/// Errors that can occur during output formatting.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

#[derive(Serialize)]
struct JsonRankedFile<'a> {
    rank: usize,
    name: &'a str,
    path: String,
    importance: i64,
    depth: usize,
    lines: usize,
    imports: Vec<&'a str>,
    imported_in: Vec<&'a str>,
}

#[derive(Serialize)]
struct JsonCompressedFile<'a> {
    path: String,
    original_lines: usize,
    compressed_lines: usize,
    content: &'a str,
}

/// Format ranked files, most important first.
pub fn format_ranking(files: &[FileLoaded], format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Text => Ok(format_ranking_text(files)),
        OutputFormat::Json => {
            let entries: Vec<JsonRankedFile> = files
                .iter()
                .enumerate()
                .map(|(i, file)| JsonRankedFile {
                    rank: i + 1,
                    name: file.name(),
                    path: display_path(file.path()),
                    importance: file.importance(),
                    depth: file.depth(),
                    lines: file.line_count(),
                    imports: file.imports().iter().map(String::as_str).collect(),
                    imported_in: file.imported_in().iter().map(String::as_str).collect(),
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
    }
}

fn format_ranking_text(files: &[FileLoaded]) -> String {
    let width = files
        .iter()
        .map(|f| format_score(f.importance()).len())
        .max()
        .unwrap_or(0);

    let mut output = String::with_capacity(files.len() * 64);
    for (i, file) in files.iter().enumerate() {
        output.push_str(&format!(
            "{:>3}. {:>width$}  {} ({}, {} imports, imported by {})\n",
            i + 1,
            format_score(file.importance()),
            display_path(file.path()),
            file.name(),
            file.imports().len(),
            file.imported_in().len(),
        ));
    }
    output
}

/// Format content shares, largest first.
pub fn format_shares(shares: &[ContentShare], format: OutputFormat) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(shares)?),
        OutputFormat::Text => {
            let mut output = String::new();
            for share in shares {
                output.push_str(&format!(
                    "{:>6.2}%  {:>10} chars  {}\n",
                    share.percent,
                    format_number(share.length),
                    display_path(&share.path),
                ));
            }
            Ok(output)
        }
    }
}

/// Format compressed sources as `(path, original, compressed)` triples.
pub fn format_compressed(
    files: &[(&Path, &str, &str)],
    format: OutputFormat,
) -> Result<String, OutputError> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<JsonCompressedFile> = files
                .iter()
                .map(|(path, original, compressed)| JsonCompressedFile {
                    path: display_path(path),
                    original_lines: count_lines(original),
                    compressed_lines: count_lines(compressed),
                    content: *compressed,
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
        OutputFormat::Text => {
            // A lone file is printed bare so the output stays valid Python.
            if let [(_, _, compressed)] = files {
                return Ok(compressed.to_string());
            }

            let mut output = String::new();
            for (path, original, compressed) in files {
                output.push_str(&format!(
                    "# --- {} ({} -> {} lines) ---\n",
                    display_path(path),
                    format_number(count_lines(original)),
                    format_number(count_lines(compressed)),
                ));
                output.push_str(compressed);
                if !compressed.is_empty() && !compressed.ends_with('\n') {
                    output.push('\n');
                }
                output.push('\n');
            }
            Ok(output)
        }
    }
}

fn count_lines(text: &str) -> usize {
    let newlines = bytecount::count(text.as_bytes(), b'\n');
    if text.is_empty() || text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn format_score(score: i64) -> String {
    let digits = format_number(score.unsigned_abs() as usize);
    if score < 0 {
        format!("-{digits}")
    } else {
        digits
    }
}

/// Format a number with thousands separators.
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

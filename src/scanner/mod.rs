//! Source scanner that turns a directory tree into code samples.
//!
//! Respects configuration for extensions, excludes and file size limits.
//! Each sample is keyed by its path relative to the scan root.

use crate::models::CodeSample;
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for file scanning.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// File extensions to include (e.g., ["py", "rs"])
    pub extensions: Vec<String>,
    /// Names to exclude (e.g., ["node_modules", "target", ".git"])
    pub excludes: Vec<String>,
    /// Maximum file size in bytes
    pub max_file_size: usize,
    /// Maximum number of files to scan
    pub max_files: Option<usize>,
    /// Show a spinner while walking
    pub show_progress: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            extensions: crate::config::default_extensions(),
            excludes: crate::config::default_excludes(),
            max_file_size: 256 * 1024,
            max_files: None,
            show_progress: false,
        }
    }
}

impl From<&crate::config::ScannerConfig> for ScanConfig {
    fn from(config: &crate::config::ScannerConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            excludes: config.excludes.clone(),
            max_file_size: config.max_file_size,
            max_files: Some(config.max_files),
            show_progress: false,
        }
    }
}

/// Scanned file information.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Relative path from the scan root
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// Language name derived from the extension
    pub language: String,
}

/// File scanner for discovering source files.
pub struct FileScanner {
    config: ScanConfig,
    root: PathBuf,
}

impl FileScanner {
    /// Create a new file scanner.
    pub fn new(root: PathBuf, config: ScanConfig) -> Self {
        Self { config, root }
    }

    /// Scan for all matching files, sorted by path.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        if !self.root.is_dir() {
            anyhow::bail!("Not a directory: {}", self.root.display());
        }

        let spinner = self.spinner();
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_excluded(e));

        for entry in walker {
            if let Some(max) = self.config.max_files {
                if files.len() >= max {
                    debug!("Reached max_files limit of {}", max);
                    break;
                }
            }

            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.matches(entry.path()) {
                continue;
            }

            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    debug!("Cannot stat {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let rel_path = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if let Some(ref pb) = spinner {
                pb.set_message(rel_path.display().to_string());
            }

            files.push(ScannedFile {
                path: rel_path.to_string_lossy().to_string(),
                size,
                language: language_for(entry.path()).to_string(),
            });
        }

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        info!("Found {} source files under {}", files.len(), self.root.display());
        Ok(files)
    }

    /// Scan and read every matching file into a code sample.
    ///
    /// Unreadable or non-UTF-8 files are skipped with a warning.
    pub fn collect_samples(&self) -> Result<Vec<CodeSample>> {
        let scanned = self
            .scan()
            .with_context(|| format!("Failed to scan {}", self.root.display()))?;

        let mut samples = Vec::with_capacity(scanned.len());
        for file in scanned {
            let full_path = self.root.join(&file.path);
            match fs::read_to_string(&full_path) {
                Ok(code) => samples.push(CodeSample {
                    commit_hash: file.path,
                    code,
                    language: file.language,
                }),
                Err(e) => warn!("Failed to read {}: {}", file.path, e),
            }
        }

        Ok(samples)
    }

    /// Check if a file matches scan criteria.
    pub fn matches(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)) {
            return false;
        }

        match fs::metadata(path) {
            Ok(metadata) => metadata.len() <= self.config.max_file_size as u64,
            Err(_) => false,
        }
    }

    /// Hidden entries and configured names are skipped.
    fn is_excluded(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || self.config.excludes.iter().any(|pattern| name == pattern.as_str())
    }

    fn spinner(&self) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        let template = "{spinner:.green} Scanning {msg}";
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Language name for a file, by extension.
pub fn language_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "py" => "python",
        "rs" => "rust",
        "js" | "jsx" | "mjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "go" => "go",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "cc" | "hpp" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        "kt" => "kotlin",
        "scala" => "scala",
        _ => "unknown",
    }
}

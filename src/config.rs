//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.devpulse.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE: &str = ".devpulse.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Sentiment classifier settings.
    #[serde(default)]
    pub sentiment: SentimentConfig,

    /// Anomaly detection settings.
    #[serde(default)]
    pub anomaly: AnomalySettings,

    /// Code quality heuristics.
    #[serde(default)]
    pub quality: QualityConfig,

    /// Source scanner settings.
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default report path for `analyze`.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "devpulse_report.md".to_string()
}

/// Which text classifier backs the sentiment scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Built-in word lists, no network
    #[default]
    Lexicon,
    /// Local LLM through the Ollama chat API
    Ollama,
}

/// Sentiment classifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    #[serde(default)]
    pub classifier: ClassifierKind,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Ollama model name.
    #[serde(default = "default_model")]
    pub model: String,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Per-comment request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Input budget per text, in characters.
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierKind::default(),
            ollama_url: default_ollama_url(),
            model: default_model(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_input_chars() -> usize {
    crate::sentiment::DEFAULT_MAX_INPUT_CHARS
}

/// Anomaly detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySettings {
    /// Expected outlier fraction, in (0, 0.5].
    #[serde(default = "default_contamination")]
    pub contamination: f64,

    /// Number of isolation trees.
    #[serde(default = "default_estimators")]
    pub n_estimators: usize,

    /// Per-tree subsample cap.
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fewer activities than this produce no anomalies at all.
    #[serde(default = "default_min_activities")]
    pub min_activities: usize,

    /// Rolling window for productivity drops, in days.
    #[serde(default = "default_window_days")]
    pub window_days: usize,

    /// A day below this fraction of the window average is a drop.
    #[serde(default = "default_drop_ratio")]
    pub drop_ratio: f64,

    /// Window average must exceed this before drops are considered.
    #[serde(default = "default_min_baseline")]
    pub min_baseline: f64,
}

impl Default for AnomalySettings {
    fn default() -> Self {
        Self {
            contamination: default_contamination(),
            n_estimators: default_estimators(),
            max_samples: default_max_samples(),
            seed: default_seed(),
            min_activities: default_min_activities(),
            window_days: default_window_days(),
            drop_ratio: default_drop_ratio(),
            min_baseline: default_min_baseline(),
        }
    }
}

fn default_contamination() -> f64 {
    0.1
}

fn default_estimators() -> usize {
    100
}

fn default_max_samples() -> usize {
    256
}

fn default_seed() -> u64 {
    42
}

fn default_min_activities() -> usize {
    10
}

fn default_window_days() -> usize {
    7
}

fn default_drop_ratio() -> f64 {
    0.3
}

fn default_min_baseline() -> f64 {
    2.0
}

/// Code quality heuristics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    /// Lines longer than this count as a standards violation.
    #[serde(default = "default_max_line_length")]
    pub max_line_length: usize,

    /// Python functions with more non-empty lines are reported.
    #[serde(default = "default_max_function_lines")]
    pub max_function_lines: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            max_line_length: default_max_line_length(),
            max_function_lines: default_max_function_lines(),
        }
    }
}

fn default_max_line_length() -> usize {
    100
}

fn default_max_function_lines() -> usize {
    50
}

/// Source scanner settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum files to analyze.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// File extensions to include.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory or file names to skip.
    #[serde(default = "default_excludes")]
    pub excludes: Vec<String>,

    /// Maximum file size in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            extensions: default_extensions(),
            excludes: default_excludes(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_max_files() -> usize {
    100
}

pub fn default_extensions() -> Vec<String> {
    vec![
        "py", "rs", "js", "ts", "jsx", "tsx", "go", "java", "c", "cpp", "h", "hpp", "cs", "rb",
        "php", "swift", "kt", "scala",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

pub fn default_excludes() -> Vec<String> {
    vec![
        ".git",
        "target",
        "node_modules",
        "vendor",
        "dist",
        "build",
        "__pycache__",
        ".venv",
        "venv",
        ".idea",
        ".vscode",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_max_file_size() -> usize {
    256 * 1024
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence, but only when given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(classifier) = args.classifier {
            self.sentiment.classifier = classifier;
        }
        if let Some(ref url) = args.ollama_url {
            self.sentiment.ollama_url = url.clone();
        }
        if let Some(ref model) = args.model {
            self.sentiment.model = model.clone();
        }
        if let Some(timeout) = args.timeout {
            self.sentiment.timeout_seconds = timeout;
        }

        if let Some(max_files) = args.max_files {
            self.scanner.max_files = max_files;
        }
        if let Some(ref extensions) = args.extensions {
            self.scanner.extensions = extensions.clone();
        }
        if let Some(ref excludes) = args.exclude {
            self.scanner.excludes = excludes.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::ClassifierKind;
use crate::models::Severity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DevPulse - developer activity analyzer
///
/// Scores review-comment sentiment and code quality, flags productivity
/// drops and unusual activity, and turns the results into alerts and
/// recommendations. Inputs are JSON payloads (use `-` for stdin), a local
/// git repository, or a source directory.
///
/// Examples:
///   devpulse sentiment --text "This looks great, thanks!"
///   devpulse anomalies --git . --author dev@example.com --since 2025-01-01
///   devpulse quality --path ./src
///   devpulse analyze --input developer.json --format json --fail-on high
///   devpulse --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(subcommand_required = false, arg_required_else_help = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .devpulse.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output format for `analyze` reports (markdown, json)
    ///
    /// Single-operation commands always print JSON.
    #[arg(long, default_value = "markdown", value_name = "FORMAT", global = true)]
    pub format: OutputFormat,

    /// Report path for `analyze` (`-` for stdout)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub output: Option<PathBuf>,

    /// Sentiment classifier backend
    #[arg(long, value_name = "KIND", global = true)]
    pub classifier: Option<ClassifierKind>,

    /// Ollama API endpoint URL
    #[arg(long, env = "OLLAMA_URL", global = true)]
    pub ollama_url: Option<String>,

    /// Ollama model for the sentiment classifier
    #[arg(short, long, env = "DEVPULSE_MODEL", global = true)]
    pub model: Option<String>,

    /// Per-comment classifier timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    /// Maximum number of source files to scan
    #[arg(long, value_name = "COUNT", global = true)]
    pub max_files: Option<usize>,

    /// File extensions to scan (comma-separated)
    ///
    /// Example: --extensions py,rs
    #[arg(long, value_name = "EXTS", value_delimiter = ',', global = true)]
    pub extensions: Option<Vec<String>>,

    /// Names to skip while scanning (comma-separated)
    #[arg(long, value_name = "NAMES", value_delimiter = ',', global = true)]
    pub exclude: Option<Vec<String>>,

    /// Fail if alerts at or above this severity are produced
    ///
    /// Useful for CI pipelines. Exit code 2 when threshold is exceeded.
    /// Values: high, medium, low
    #[arg(long, value_name = "LEVEL", global = true)]
    pub fail_on: Option<FailOnLevel>,

    /// Generate a default .devpulse.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Score the sentiment of one text
    Sentiment {
        /// Text to score
        #[arg(long, conflicts_with = "input")]
        text: Option<String>,

        /// JSON payload `{"text": ...}`
        #[arg(short, long, value_name = "FILE")]
        input: Option<PathBuf>,
    },

    /// Score every comment of a pull request, plus the average
    Comments {
        /// JSON payload `{"comments": [...]}`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Detect productivity drops and unusual activity
    Anomalies {
        #[command(flatten)]
        source: ActivitySource,
    },

    /// Score code quality of a snippet or a source tree
    Quality {
        /// JSON payload `{"commitHash", "code", "language"}`
        #[arg(short, long, value_name = "FILE", required_unless_present = "path")]
        input: Option<PathBuf>,

        /// Directory to scan for source files
        #[arg(long, value_name = "DIR", conflicts_with = "input")]
        path: Option<PathBuf>,
    },

    /// Generate recommendations from prior analysis results
    Recommend {
        /// JSON payload with `developerId`, `activities`, `anomalies`,
        /// `qualityReports` and `sentimentScores`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Generate alerts
    Alerts {
        #[command(subcommand)]
        kind: AlertsCommand,
    },

    /// Run every analysis for one developer and write a report
    Analyze {
        #[command(flatten)]
        source: ActivitySource,

        /// Directory to scan for code samples
        #[arg(long, value_name = "DIR")]
        path: Option<PathBuf>,
    },

    /// Report whether the analysis engine can be constructed
    Health,
}

#[derive(Subcommand, Debug, Clone)]
pub enum AlertsCommand {
    /// Alerts for one quality report
    Quality {
        /// JSON payload `{"qualityReport": {...}}`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },

    /// Alerts for the comment sentiments of one pull request
    Sentiment {
        /// JSON payload `{"prNumber", "sentimentScores"}`
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

/// Where activities come from: a JSON payload, a git repository, or both.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ActivitySource {
    /// JSON payload with `developerId` and `activities`
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Local git repository to read commits from
    #[arg(long, value_name = "DIR")]
    pub git: Option<PathBuf>,

    /// Only commits whose author e-mail or name matches
    #[arg(long, value_name = "AUTHOR", requires = "git")]
    pub author: Option<String>,

    /// Only commits on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", requires = "git")]
    pub since: Option<chrono::NaiveDate>,

    /// Developer id to report under (defaults to the payload's or the author)
    #[arg(long, value_name = "ID")]
    pub developer: Option<String>,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Severity level for --fail-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
}

impl From<FailOnLevel> for Severity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => Severity::Low,
            FailOnLevel::Medium => Severity::Medium,
            FailOnLevel::High => Severity::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.command.is_none() {
            return Err("A subcommand is required (see --help)".to_string());
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if self.max_files == Some(0) {
            return Err("Max files must be at least 1".to_string());
        }

        match &self.command {
            Some(Command::Sentiment { text: None, input: None }) => {
                return Err("sentiment needs --text or --input".to_string());
            }
            Some(Command::Anomalies { source }) => {
                if source.input.is_none() && source.git.is_none() {
                    return Err("anomalies needs --input or --git".to_string());
                }
                validate_dir(source.git.as_ref())?;
            }
            Some(Command::Analyze { source, path }) => {
                if source.input.is_none() && source.git.is_none() && path.is_none() {
                    return Err("analyze needs --input, --git or --path".to_string());
                }
                validate_dir(source.git.as_ref())?;
                validate_dir(path.as_ref())?;
            }
            Some(Command::Quality { path, .. }) => validate_dir(path.as_ref())?,
            _ => {}
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

fn validate_dir(path: Option<&PathBuf>) -> Result<(), String> {
    if let Some(path) = path {
        if !path.exists() {
            return Err(format!("Directory does not exist: {}", path.display()));
        }
        if !path.is_dir() {
            return Err(format!("Path is not a directory: {}", path.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_sentiment_text() {
        let args = parse(&["devpulse", "sentiment", "--text", "nice work"]);
        assert!(args.validate().is_ok());
        match args.command {
            Some(Command::Sentiment { text, input }) => {
                assert_eq!(text.as_deref(), Some("nice work"));
                assert!(input.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_sentiment_needs_text_or_input() {
        let args = parse(&["devpulse", "sentiment"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&[
            "devpulse",
            "analyze",
            "--input",
            "-",
            "--format",
            "json",
            "--fail-on",
            "medium",
            "--classifier",
            "ollama",
        ]);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.fail_on, Some(FailOnLevel::Medium));
        assert_eq!(args.classifier, Some(ClassifierKind::Ollama));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_since_parses_date() {
        let args = parse(&["devpulse", "anomalies", "--git", ".", "--since", "2025-02-01"]);
        match args.command {
            Some(Command::Anomalies { source }) => {
                assert_eq!(source.since, chrono::NaiveDate::from_ymd_opt(2025, 2, 1));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_author_requires_git() {
        assert!(Args::try_parse_from(["devpulse", "anomalies", "--author", "me"]).is_err());
    }

    #[test]
    fn test_alerts_subcommands() {
        let args = parse(&["devpulse", "alerts", "sentiment", "--input", "pr.json"]);
        assert!(matches!(
            args.command,
            Some(Command::Alerts {
                kind: AlertsCommand::Sentiment { .. }
            })
        ));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["devpulse", "--verbose", "--quiet", "health"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_directory() {
        let args = parse(&["devpulse", "quality", "--path", "/definitely/not/here"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_fail_on_maps_to_severity() {
        assert_eq!(Severity::from(FailOnLevel::High), Severity::High);
        assert!(Severity::from(FailOnLevel::Low) < Severity::from(FailOnLevel::Medium));
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["devpulse", "health"]);
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}

//! DevPulse - developer activity analyzer
//!
//! A CLI tool that scores review sentiment and code quality, detects
//! anomalies in activity patterns, and turns the results into alerts and
//! recommendations.
//!
//! Exit codes:
//!   0 - Success (no alerts above threshold, or no --fail-on set)
//!   1 - Runtime error (bad payload, config, engine unavailable, etc.)
//!   2 - Alerts found at or above the --fail-on threshold

mod alerts;
mod analysis;
mod anomaly;
mod cli;
mod config;
mod engine;
mod error;
mod ingest;
mod models;
mod payload;
mod quality;
mod recommend;
mod report;
mod scanner;
mod sentiment;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{ActivitySource, AlertsCommand, Args, Command, FailOnLevel, OutputFormat};
use config::Config;
use engine::{AnalysisCoordinator, Health};
use models::{Activity, Alert, CodeSample, Severity};
use payload::{
    read_payload, AnalyzeRequest, AnomaliesRequest, CommentsRequest, QualityAlertRequest,
    QualityRequest, RecommendRequest, SentimentAlertRequest, SentimentRequest,
};
use report::{Report, ReportMetadata};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("DevPulse v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .devpulse.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(config::CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            config::CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", config::CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", config::CONFIG_FILE);
    println!("   Edit it to customize the classifier, anomaly thresholds, and scanner.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Dispatch the subcommand. Returns the process exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let Some(command) = args.command.clone() else {
        return Ok(0);
    };

    if let Command::Health = command {
        return handle_health(&config);
    }

    let coordinator = AnalysisCoordinator::from_config(&config)?;

    match command {
        Command::Sentiment { text, input } => {
            let text = match (text, input) {
                (Some(text), _) => text,
                (None, Some(path)) => read_payload::<SentimentRequest>(&path)?.text,
                (None, None) => anyhow::bail!("sentiment needs --text or --input"),
            };
            print_json(&coordinator.analyze_sentiment(&text))?;
            Ok(0)
        }
        Command::Comments { input } => {
            let request: CommentsRequest = read_payload(&input)?;
            let sentiments = coordinator.analyze_pr_comments(&request.comments);
            let average = coordinator.average_sentiment(&request.comments);
            print_json(&json!({ "sentiments": sentiments, "average": average }))?;
            Ok(0)
        }
        Command::Anomalies { source } => {
            let (developer_id, activities) = match source.input {
                Some(ref path) => {
                    let request: AnomaliesRequest = read_payload(path)?;
                    (request.developer_id, request.activities)
                }
                None => (String::new(), Vec::new()),
            };
            let (developer_id, activities) =
                gather_activities(&source, developer_id, activities, args.quiet)?;

            let anomalies = coordinator.detect_anomalies(&developer_id, &activities);
            print_json(&json!({ "anomalies": anomalies }))?;
            Ok(0)
        }
        Command::Quality { input, path } => {
            if let Some(dir) = path {
                let samples = scan_samples(&dir, &config, args.quiet)?;
                let reports: Vec<_> = samples
                    .iter()
                    .map(|s| coordinator.analyze_code_quality(&s.commit_hash, &s.code, &s.language))
                    .collect();
                print_json(&json!({ "reports": reports }))?;
            } else if let Some(input) = input {
                let request: QualityRequest = read_payload(&input)?;
                let report = coordinator.analyze_code_quality(
                    &request.commit_hash,
                    &request.code,
                    &request.language,
                );
                print_json(&report)?;
            }
            Ok(0)
        }
        Command::Recommend { input } => {
            let request: RecommendRequest = read_payload(&input)?;
            let recommendations = coordinator.generate_recommendations(
                &request.developer_id,
                &request.activities,
                &request.anomalies,
                &request.quality_reports,
                &request.sentiment_scores,
            );
            print_json(&json!({ "recommendations": recommendations }))?;
            Ok(0)
        }
        Command::Alerts { kind } => {
            let alerts = match kind {
                AlertsCommand::Quality { input } => {
                    let request: QualityAlertRequest = read_payload(&input)?;
                    coordinator.generate_quality_alerts(&request.quality_report)
                }
                AlertsCommand::Sentiment { input } => {
                    let request: SentimentAlertRequest = read_payload(&input)?;
                    coordinator
                        .generate_sentiment_alerts(request.pr_number, &request.sentiment_scores)
                }
            };
            print_json(&json!({ "alerts": alerts }))?;
            Ok(fail_on_exit_code(args.fail_on, &alerts))
        }
        Command::Analyze { source, path } => {
            run_analyze(&args, &config, &coordinator, &source, path.as_deref())
        }
        Command::Health => handle_health(&config),
    }
}

/// Print readiness. A coordinator that cannot be built reports `degraded`.
fn handle_health(config: &Config) -> Result<i32> {
    match AnalysisCoordinator::from_config(config) {
        Ok(coordinator) => {
            print_json(&coordinator.health())?;
            Ok(0)
        }
        Err(e) => {
            warn!("Analysis engine unavailable: {:#}", e);
            print_json(&Health::degraded())?;
            Ok(1)
        }
    }
}

/// Run the comprehensive workflow and write the report.
fn run_analyze(
    args: &Args,
    config: &Config,
    coordinator: &AnalysisCoordinator,
    source: &ActivitySource,
    path: Option<&Path>,
) -> Result<i32> {
    let start_time = Instant::now();

    let request: AnalyzeRequest = match source.input {
        Some(ref input) => read_payload(input)?,
        None => AnalyzeRequest::default(),
    };

    let (developer_id, activities) =
        gather_activities(source, request.developer_id, request.activities, args.quiet)?;

    let mut code_samples = request.code_samples;
    if let Some(dir) = path {
        code_samples.extend(scan_samples(dir, config, args.quiet)?);
    }

    if !args.quiet {
        eprintln!("🔬 Analyzing {}...", developer_id);
        eprintln!("   Activities: {}", activities.len());
        eprintln!("   Code samples: {}", code_samples.len());
        eprintln!("   Pull requests: {}", request.pr_comments.len());
    }

    let analysis = coordinator.analyze_developer_comprehensive(
        &developer_id,
        &activities,
        &code_samples,
        &request.pr_comments,
    );

    let metadata = ReportMetadata {
        developer_id: developer_id.clone(),
        generated_at: Utc::now(),
        classifier: format!("{:?}", config.sentiment.classifier).to_lowercase(),
        activities_analyzed: activities.len(),
        code_samples_analyzed: code_samples.len(),
        pull_requests_analyzed: request.pr_comments.len(),
        duration_seconds: start_time.elapsed().as_secs_f64(),
    };
    let report = Report::new(metadata, analysis);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    if config.general.output == "-" {
        println!("{}", output);
    } else {
        let output_path = PathBuf::from(&config.general.output);
        report::write_report(&output, &output_path)?;
        info!("Report saved to {}", output_path.display());
    }

    if !args.quiet {
        let summary = &report.summary;
        eprintln!("\n📊 Analysis Summary:");
        eprintln!("   Anomalies: {}", summary.anomalies.total);
        eprintln!("   Recommendations: {}", summary.recommendations);
        eprintln!("   Alerts: {}", summary.alerts.total);
        eprintln!(
            "   - {} High: {} | {} Medium: {} | {} Low: {}",
            Severity::High.emoji(),
            summary.alerts.high,
            Severity::Medium.emoji(),
            summary.alerts.medium,
            Severity::Low.emoji(),
            summary.alerts.low
        );
        eprintln!("   Duration: {:.1}s", report.metadata.duration_seconds);
    }

    Ok(fail_on_exit_code(args.fail_on, &report.analysis.alerts))
}

/// Append commit activities from `--git` and settle on a developer id.
///
/// `--developer` wins over the payload id, which wins over `--author`.
fn gather_activities(
    source: &ActivitySource,
    developer_id: String,
    mut activities: Vec<Activity>,
    quiet: bool,
) -> Result<(String, Vec<Activity>)> {
    let mut developer_id = source.developer.clone().unwrap_or(developer_id);
    if developer_id.is_empty() {
        developer_id = source.author.clone().unwrap_or_default();
    }

    if let Some(ref repo_path) = source.git {
        let options = ingest::IngestOptions {
            author: source.author.clone(),
            since: source.since,
            developer_id: (!developer_id.is_empty()).then(|| developer_id.clone()),
            show_progress: !quiet,
        };
        let commits = ingest::read_commit_activities(repo_path, &options)
            .with_context(|| format!("Failed to read git history from {}", repo_path.display()))?;
        activities.extend(commits);
        activities.sort_by_key(|a| a.timestamp);
    }

    if developer_id.is_empty() {
        developer_id = activities
            .first()
            .map(|a| a.developer_id.clone())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| "unknown".to_string());
    }

    Ok((developer_id, activities))
}

fn scan_samples(dir: &Path, config: &Config, quiet: bool) -> Result<Vec<CodeSample>> {
    let mut scan_config = scanner::ScanConfig::from(&config.scanner);
    scan_config.show_progress = !quiet;

    let file_scanner = scanner::FileScanner::new(dir.to_path_buf(), scan_config);
    let samples = file_scanner.collect_samples()?;
    info!("Collected {} code samples from {}", samples.len(), dir.display());
    Ok(samples)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

/// Exit code 2 when any alert is at or above the `--fail-on` level.
fn fail_on_exit_code(fail_on: Option<FailOnLevel>, alerts: &[Alert]) -> i32 {
    let Some(level) = fail_on else {
        return 0;
    };

    let threshold: Severity = level.into();
    match analysis::max_alert_severity(alerts) {
        Some(max) if max >= threshold => {
            eprintln!(
                "\n⛔ Alerts found at or above {:?} severity. Failing (exit code 2).",
                level
            );
            2
        }
        _ => 0,
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", config::CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}

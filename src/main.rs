//! DocReviews - rating averages for document review workflows
//!
//! A CLI tool that fetches the review workflows of documents from a
//! document-management server and reports per-category rating averages.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, connection, every document failed, etc.)
//!   2 - Some documents could not be loaded

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod source;
mod view;

use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use models::{FailedDocument, Report, ReportMetadata};
use source::{FileReviewSource, HttpReviewSource, ReviewSource};
use std::time::Duration;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
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

    // The config file can turn on verbose logging, so it is read first
    let config = match load_config(&args) {
        Ok(mut config) => {
            config.merge_with_args(&args);
            config
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose))?;

    info!("DocReviews v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .docreviews.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging on stderr; stdout is reserved for the report.
///
/// `RUST_LOG` takes precedence over the verbosity flags.
fn init_logging(level: Level) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Fetch, aggregate and report. Returns the exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let source = build_source(&args, &config)?;
    let options = config.aggregate_options();
    let concurrency = config.general.concurrency.max(1);

    info!(
        "Loading {} document(s) from {} (overall: {}, invalid ratings: {:?})",
        args.document_ids.len(),
        source.describe(),
        options.include_overall,
        options.on_invalid
    );

    let progress = fetch_progress(args.document_ids.len(), args.quiet, &config)?;
    let source_ref: &dyn ReviewSource = source.as_ref();
    let progress_ref = &progress;

    // Results keep the command-line order.
    let results: Vec<_> = stream::iter(args.document_ids.iter())
        .map(|document_id| async move {
            let result = view::load_document_reviews(source_ref, document_id, &options).await;
            progress_ref.inc(1);
            (document_id.clone(), result)
        })
        .buffered(concurrency)
        .collect()
        .await;

    progress.finish_and_clear();

    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for (document_id, result) in results {
        match result {
            Ok(view) => documents.push(view),
            Err(e) => {
                warn!("{}", e);
                failures.push(FailedDocument {
                    document_id,
                    error: error_chain(&e),
                });
            }
        }
    }

    let report = Report {
        metadata: ReportMetadata {
            source: source.describe(),
            generated_at: Utc::now(),
            documents_loaded: documents.len(),
            documents_failed: failures.len(),
            include_overall: options.include_overall,
        },
        documents,
        failures,
    };

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    match config.report.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path))?;
            info!("Report saved to {}", path);
        }
        None => print!("{}", output),
    }

    let exit_code = if report.failures.is_empty() {
        0
    } else if report.documents.is_empty() {
        error!("No document could be loaded");
        1
    } else {
        warn!(
            "{} of {} documents could not be loaded",
            report.failures.len(),
            report.failures.len() + report.documents.len()
        );
        2
    };

    Ok(exit_code)
}

/// Pick the review source: local files with --input, the server otherwise.
fn build_source(args: &Args, config: &Config) -> Result<Box<dyn ReviewSource>> {
    if let Some(ref input) = args.input {
        info!("Reading reviews from {}", input.display());
        return Ok(Box::new(FileReviewSource::new(input)));
    }

    let source = HttpReviewSource::new(
        &config.server.url,
        config.server.auth_token.clone(),
        config.server.timeout_seconds,
    )?;
    Ok(Box::new(source))
}

/// Spinner on stderr while documents are fetched.
///
/// Hidden with --quiet and when the report goes to stdout.
fn fetch_progress(documents: usize, quiet: bool, config: &Config) -> Result<ProgressBar> {
    if quiet || config.report.output.is_none() {
        return Ok(ProgressBar::hidden());
    }

    let pb = ProgressBar::new(documents as u64);
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] fetching reviews {pos}/{len}")
            .context("Invalid progress template")?,
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    Ok(pb)
}

/// Render an error with its sources, outermost first.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !message.contains(&cause_text) {
            message.push_str(": ");
            message.push_str(&cause_text);
        }
        source = cause.source();
    }
    message
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_hidden_when_report_goes_to_stdout() {
        let mut config = Config::default();
        assert!(fetch_progress(2, false, &config).unwrap().is_hidden());

        config.report.output = Some("report.md".to_string());
        assert!(fetch_progress(2, true, &config).unwrap().is_hidden());

        let pb = fetch_progress(2, false, &config).unwrap();
        assert_eq!(pb.length(), Some(2));
        pb.finish_and_clear();
    }

    #[test]
    fn test_error_chain_appends_sources_once() {
        let err = error::ReviewError::FetchFailed {
            document_id: "doc-1".to_string(),
            source: error::FetchError::NotFound,
        };
        assert_eq!(
            error_chain(&err),
            "failed to fetch reviews for doc-1: document not found"
        );
    }
}

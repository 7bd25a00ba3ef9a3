//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::analysis::InvalidRatingPolicy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// DocReviews - rating averages for document review workflows
///
/// Fetches the review workflows of one or more documents and reports
/// the ratings per category, with an "Overall" summary per workflow.
///
/// Examples:
///   docreviews 3d7f5d6f-24f7-4e8e-8b4b-3e7e44b4a7b2 --server https://docs.example.com
///   docreviews doc-1 doc-2 --format json --output reviews.json
///   docreviews doc-1 --input ./exports --no-overall
///   docreviews --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Document IDs to report on
    #[arg(value_name = "DOCUMENT_ID", required_unless_present = "init_config")]
    pub document_ids: Vec<String>,

    /// Document server base URL
    ///
    /// Reviews are fetched from {URL}/api/reviews/{DOCUMENT_ID}.
    #[arg(short, long, value_name = "URL", env = "DOCREVIEWS_SERVER")]
    pub server: Option<String>,

    /// Session token, sent as the auth_token cookie
    #[arg(long, value_name = "TOKEN", env = "DOCREVIEWS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Read reviews from a JSON file or a directory of {DOCUMENT_ID}.json
    /// files instead of the server
    #[arg(short, long, value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Leave the "Overall" entry out of the averages
    #[arg(long)]
    pub no_overall: bool,

    /// What to do with malformed ratings (skip, abort)
    #[arg(long, value_name = "POLICY")]
    pub on_invalid: Option<InvalidRatingPolicy>,

    /// Output file path for the report (stdout if omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .docreviews.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Number of documents fetched at the same time
    #[arg(long, value_name = "NUM")]
    pub concurrency: Option<usize>,

    /// Generate a default .docreviews.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
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

        if self.document_ids.is_empty() {
            return Err("At least one document ID is required".to_string());
        }

        // Validate server URL format (not needed when reading local files)
        if self.input.is_none() {
            if let Some(ref server) = self.server {
                if !server.starts_with("http://") && !server.starts_with("https://") {
                    return Err("Server URL must start with 'http://' or 'https://'".to_string());
                }
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

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(format!("Input path does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `general.verbose` from the config file; `--quiet` wins over both.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            document_ids: vec!["doc-1".to_string()],
            server: Some("http://localhost:8080".to_string()),
            token: None,
            input: None,
            no_overall: false,
            on_invalid: None,
            output: None,
            format: None,
            config: None,
            verbose: false,
            quiet: false,
            timeout: None,
            concurrency: None,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::parse_from([
            "docreviews",
            "doc-1",
            "doc-2",
            "--server",
            "https://docs.example.com",
            "--on-invalid",
            "abort",
            "--format",
            "json",
            "-o",
            "out.json",
        ]);

        assert_eq!(args.document_ids, vec!["doc-1", "doc-2"]);
        assert_eq!(args.server.as_deref(), Some("https://docs.example.com"));
        assert_eq!(args.on_invalid, Some(InvalidRatingPolicy::Abort));
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(!args.no_overall);
    }

    #[test]
    fn test_document_id_required_unless_init_config() {
        assert!(Args::try_parse_from(["docreviews"]).is_err());
        assert!(Args::try_parse_from(["docreviews", "--init-config"]).is_ok());
    }

    #[test]
    fn test_validation_invalid_url() {
        let mut args = make_args();
        args.server = Some("localhost:8080".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_values() {
        let mut args = make_args();
        args.timeout = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.concurrency = Some(0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_input() {
        let mut args = make_args();
        args.input = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}

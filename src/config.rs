//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.docreviews.toml` files.

use crate::analysis::{AggregateOptions, InvalidRatingPolicy};
use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".docreviews.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Reviews server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Number of documents fetched at the same time.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    4
}

/// Reviews server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the document server (without `/api`).
    #[serde(default = "default_server_url")]
    pub url: String,

    /// Session token sent as the `auth_token` cookie.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            auth_token: None,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,

    /// Output file; stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Add the "Overall" entry to every workflow's averages.
    #[serde(default = "default_true")]
    pub include_overall: bool,

    /// What to do with malformed ratings.
    #[serde(default)]
    pub on_invalid: InvalidRatingPolicy,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            output: None,
            include_overall: true,
            on_invalid: InvalidRatingPolicy::default(),
        }
    }
}

fn default_true() -> bool {
    true
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
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.docreviews.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    /// This method only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref server) = args.server {
            self.server.url = server.clone();
        }
        if let Some(ref token) = args.token {
            self.server.auth_token = Some(token.clone());
        }
        if let Some(timeout) = args.timeout {
            self.server.timeout_seconds = timeout;
        }

        if let Some(format) = args.format {
            self.report.format = format;
        }
        if let Some(ref output) = args.output {
            self.report.output = Some(output.display().to_string());
        }
        if args.no_overall {
            self.report.include_overall = false;
        }
        if let Some(policy) = args.on_invalid {
            self.report.on_invalid = policy;
        }

        if let Some(concurrency) = args.concurrency {
            self.general.concurrency = concurrency;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Aggregation options derived from the report settings.
    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            include_overall: self.report.include_overall,
            on_invalid: self.report.on_invalid,
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.url, "http://localhost:8080");
        assert_eq!(config.server.timeout_seconds, 30);
        assert_eq!(config.general.concurrency, 4);
        assert!(config.report.include_overall);
        assert_eq!(config.report.on_invalid, InvalidRatingPolicy::Skip);
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
verbose = true

[server]
url = "https://docs.example.com"
auth_token = "abc"

[report]
format = "json"
include_overall = false
on_invalid = "abort"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.general.verbose);
        assert_eq!(config.general.concurrency, 4);
        assert_eq!(config.server.url, "https://docs.example.com");
        assert_eq!(config.server.auth_token.as_deref(), Some("abc"));
        assert_eq!(config.server.timeout_seconds, 30);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert!(!config.report.include_overall);
        assert_eq!(config.report.on_invalid, InvalidRatingPolicy::Abort);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[report]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.server.url, Config::default().server.url);
    }

    #[test]
    fn test_load_from_dir() {
        let temp_dir = TempDir::new().unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).unwrap().is_none());

        std::fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "[server]\ntimeout_seconds = 5\n",
        )
        .unwrap();
        let config = Config::load_from_dir(temp_dir.path()).unwrap().unwrap();
        assert_eq!(config.server.timeout_seconds, 5);

        std::fs::write(temp_dir.path().join(CONFIG_FILE_NAME), "[server\n").unwrap();
        assert!(Config::load_from_dir(temp_dir.path()).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config: Config = toml::from_str(
            r#"
[server]
url = "https://docs.example.com"
auth_token = "from-file"

[report]
include_overall = true
"#,
        )
        .unwrap();

        let args = crate::cli::Args::parse_from([
            "docreviews",
            "doc-1",
            "--token",
            "from-cli",
            "--no-overall",
            "--format",
            "json",
            "--concurrency",
            "2",
        ]);
        config.merge_with_args(&args);

        assert_eq!(config.server.url, "https://docs.example.com");
        assert_eq!(config.server.auth_token.as_deref(), Some("from-cli"));
        assert!(!config.report.include_overall);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.general.concurrency, 2);

        let options = config.aggregate_options();
        assert!(!options.include_overall);
        assert_eq!(options.on_invalid, InvalidRatingPolicy::Skip);
    }

    #[test]
    fn test_verbose_from_file_sets_log_level() {
        let mut config: Config = toml::from_str("[general]\nverbose = true\n").unwrap();
        let args = crate::cli::Args::parse_from(["docreviews", "doc-1"]);
        config.merge_with_args(&args);

        assert!(config.general.verbose);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);

        let quiet = crate::cli::Args::parse_from(["docreviews", "doc-1", "--quiet"]);
        assert_eq!(quiet.log_level(config.general.verbose), tracing::Level::ERROR);
    }
}

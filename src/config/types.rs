//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_FHIR_VERSION, DEFAULT_QUEUE_NAME, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Probe configuration.
///
/// Parsed from the command line by the binary, or constructed programmatically
/// by library callers.
///
/// # Examples
///
/// ```no_run
/// use capability_status::Config;
///
/// let config = Config {
///     endpoints: vec!["https://fhir.example.com/r4".to_string()],
///     timeout_seconds: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "capability_status",
    about = "Probes FHIR endpoints for their capability statement and validates it."
)]
pub struct Config {
    /// FHIR endpoint URLs to probe
    #[arg(required = true, num_args = 1..)]
    pub endpoints: Vec<String>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// Overall deadline for one endpoint's probe, in seconds (no deadline if omitted)
    #[arg(long)]
    pub deadline_seconds: Option<u64>,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// FHIR version to validate against when the capability statement does not declare one
    #[arg(long, default_value = DEFAULT_FHIR_VERSION)]
    pub fhir_version: String,

    /// Skip the /.well-known/smart-configuration probe
    #[arg(long)]
    pub skip_smart: bool,

    /// Queue the capability messages are published to
    #[arg(long, default_value = DEFAULT_QUEUE_NAME)]
    pub queue_name: String,
}

impl Config {
    /// Deadline for a single endpoint, if one was configured.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            deadline_seconds: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fhir_version: DEFAULT_FHIR_VERSION.to_string(),
            skip_smart: false,
            queue_name: DEFAULT_QUEUE_NAME.to_string(),
        }
    }
}

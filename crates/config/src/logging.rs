//! Logging configuration
//!
//! Controls the internal logging behavior of Apex services.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;

/// Log level
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Convert to tracing level filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console output (default)
    #[default]
    Console,
    /// JSON structured logging
    Json,
}

/// Log output destination
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    /// Write to stderr (default, keeps stdout for command output)
    #[default]
    Stderr,
    Stdout,
    /// Append to a file
    #[serde(untagged)]
    File(String),
}

/// Logging configuration
///
/// # Example
///
/// ```toml
/// [log]
/// level = "info"
/// format = "json"
/// output = "/var/log/apex/apex.log"
///
/// [log.targets]
/// apex_license = "debug"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level for every target
    pub level: LogLevel,

    pub format: LogFormat,

    pub output: LogOutput,

    /// Per-target level overrides, keyed by module path
    pub targets: BTreeMap<String, LogLevel>,
}

impl LogConfig {
    /// `EnvFilter` directive string, e.g. `info,apex_license=debug`.
    ///
    /// `level` replaces the configured default level when given.
    pub fn filter_directives(&self, level: Option<LogLevel>) -> String {
        let mut directives = vec![level.unwrap_or(self.level).as_str().to_string()];
        directives.extend(
            self.targets
                .iter()
                .map(|(target, level)| format!("{target}={}", level.as_str())),
        );
        directives.join(",")
    }
}

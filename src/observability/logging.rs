//! Structured logging configuration.

use crate::config::LoggingSettings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default filter when neither the environment nor the config names one.
const DEFAULT_FILTER: &str = "warn";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses a format name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug)]
pub struct LoggingConfig {
    /// Event filter.
    pub filter: EnvFilter,
    /// Output format.
    pub format: LogFormat,
    /// Append output to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl LoggingConfig {
    /// Builds a logging configuration from config-file settings.
    ///
    /// The filter is taken from `VECDB_LOG`, then `RUST_LOG`, then the
    /// settings' `level`. `verbose` raises the fallback to `debug`.
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        Self::resolve(settings, verbose, |key| std::env::var(key).ok())
    }

    fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let fallback = if verbose {
            "debug".to_string()
        } else {
            settings
                .and_then(|s| s.level.clone())
                .unwrap_or_else(|| DEFAULT_FILTER.to_string())
        };
        let directive = lookup("VECDB_LOG")
            .or_else(|| lookup("RUST_LOG"))
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(fallback);
        let filter =
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let format = settings
            .and_then(|s| s.format.as_deref())
            .and_then(LogFormat::parse)
            .unwrap_or_default();

        Self {
            filter,
            format,
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}

// ABOUTME: Logging configuration and structured sync event logging for the CGM sync engine
// ABOUTME: Configures the tracing subscriber and emits per-patient sync, status, and fleet events
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging setup and sync event helpers

use std::env;
use std::io;

use anyhow::Result;
use tracing::{info, warn, Level};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};
use uuid::Uuid;

use crate::models::{ConnectionStatus, FleetOutcome, ProviderKind};

/// Service name reported at startup
pub const SERVICE_NAME: &str = "cgm-sync-engine";

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Environment label
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` lines for production
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact single-line format
    Compact,
}

impl LogFormat {
    /// Parse a `LOG_FORMAT` value, falling back to pretty
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            "compact" => Self::Compact,
            _ => Self::Pretty,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let level = env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
        let format = env::var("LOG_FORMAT").map_or(LogFormat::Pretty, |v| LogFormat::parse(&v));
        let environment = env::var("CGM_ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: is_production || env::var("LOG_INCLUDE_SPANS").is_ok(),
            environment,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let directive = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        EnvFilter::new(directive)
            .add_directive("sqlx=warn".parse().unwrap_or_else(|_| Level::WARN.into()))
            .add_directive(
                "sqlx::query=warn"
                    .parse()
                    .unwrap_or_else(|_| Level::WARN.into()),
            )
            .add_directive(
                format!("cgm_sync_engine={}", self.level)
                    .parse()
                    .unwrap_or_else(|_| Level::INFO.into()),
            )
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();
                registry.with(layer).try_init()?;
            }
            LogFormat::Pretty => {
                let layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);
                registry.with(layer).try_init()?;
            }
            LogFormat::Compact => {
                let layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stdout);
                registry.with(layer).try_init()?;
            }
        }

        info!(
            service.name = SERVICE_NAME,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "CGM sync engine starting up"
        );
        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Sync-specific structured log events
pub struct SyncLogger;

impl SyncLogger {
    /// Log the end of a per-patient sync
    pub fn log_sync_completed(
        config_id: &str,
        provider: ProviderKind,
        batch_id: Uuid,
        returned: usize,
        persisted: usize,
        inserted: usize,
    ) {
        info!(
            sync.config_id = %config_id,
            sync.provider = %provider,
            sync.batch_id = %batch_id,
            sync.returned = returned,
            sync.persisted = persisted,
            sync.inserted = inserted,
            "Glucose sync completed"
        );
    }

    /// Log a failed sync together with the resulting status
    pub fn log_sync_failed(
        config_id: &str,
        error: &str,
        status: ConnectionStatus,
        error_count: u32,
    ) {
        warn!(
            sync.config_id = %config_id,
            sync.error = %error,
            sync.status = %status,
            sync.error_count = error_count,
            "Glucose sync failed"
        );
    }

    /// Log a connection status change
    ///
    /// Moves away from `active` are warnings; recoveries are info.
    pub fn log_status_transition(config_id: &str, from: ConnectionStatus, to: ConnectionStatus) {
        if from == to {
            return;
        }
        if to == ConnectionStatus::Active {
            info!(
                sync.config_id = %config_id,
                status.from = %from,
                status.to = %to,
                "Connection status recovered"
            );
        } else {
            warn!(
                sync.config_id = %config_id,
                status.from = %from,
                status.to = %to,
                "Connection status degraded"
            );
        }
    }

    /// Log the summary of a fleet run
    pub fn log_fleet_summary(outcome: &FleetOutcome) {
        info!(
            fleet.total = outcome.total,
            fleet.attempted = outcome.attempted,
            fleet.successful = outcome.successful,
            fleet.failed = outcome.failed(),
            fleet.persisted = outcome.total_persisted,
            fleet.cancelled = outcome.was_cancelled(),
            "Fleet sync finished"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!(LogFormat::parse("json"), LogFormat::Json);
        assert_eq!(LogFormat::parse("compact"), LogFormat::Compact);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Pretty);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(!config.include_spans);
    }
}

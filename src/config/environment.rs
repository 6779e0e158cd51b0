// ABOUTME: Environment configuration for the CGM sync engine
// ABOUTME: Parses database URL, secret key, provider deadline, and fleet concurrency from environment variables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration management for deployment

use std::env;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use cgm_providers::DEFAULT_PROVIDER_TIMEOUT;

/// Environment variable names
pub mod env_vars {
    /// SQLite URL for the sync store
    pub const DATABASE_URL: &str = "CGM_DATABASE_URL";
    /// Base64 AES-256-GCM key protecting stored provider secrets
    pub const SECRET_KEY: &str = "CGM_SECRET_KEY";
    /// Per-provider-call deadline in seconds
    pub const PROVIDER_TIMEOUT_SECS: &str = "CGM_PROVIDER_TIMEOUT_SECS";
    /// Number of patients a fleet sync works on at once
    pub const FLEET_CONCURRENCY: &str = "CGM_FLEET_CONCURRENCY";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "CGM_ENVIRONMENT";
}

/// Default SQLite location
pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/cgm_sync.db";

/// Default fleet concurrency: one patient at a time
pub const DEFAULT_FLEET_CONCURRENCY: usize = 1;

/// Deployment environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Runtime configuration for the sync engine
#[derive(Clone, PartialEq, Eq)]
pub struct SyncEngineConfig {
    /// Deployment environment
    pub environment: Environment,
    /// SQLite URL for the sync store
    pub database_url: String,
    /// Base64 secret key, if configured
    pub secret_key: Option<String>,
    /// Deadline for one provider call
    pub provider_timeout: Duration,
    /// Patients a fleet sync works on at once
    pub fleet_concurrency: usize,
}

impl fmt::Debug for SyncEngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngineConfig")
            .field("environment", &self.environment)
            .field("database_url", &self.database_url)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("provider_timeout", &self.provider_timeout)
            .field("fleet_concurrency", &self.fleet_concurrency)
            .finish()
    }
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            secret_key: None,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            fleet_concurrency: DEFAULT_FLEET_CONCURRENCY,
        }
    }
}

impl SyncEngineConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or is zero
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse or is zero
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup(env_vars::ENVIRONMENT)
            .map(|value| Environment::from_str_or_default(&value))
            .unwrap_or_default();

        let database_url = lookup(env_vars::DATABASE_URL)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_owned());

        let secret_key = lookup(env_vars::SECRET_KEY).filter(|value| !value.trim().is_empty());
        if secret_key.is_none() {
            warn!(
                "{} not set; stored provider secrets cannot be decrypted across restarts",
                env_vars::SECRET_KEY
            );
        }

        let provider_timeout = match lookup(env_vars::PROVIDER_TIMEOUT_SECS) {
            Some(raw) => Duration::from_secs(parse_positive(env_vars::PROVIDER_TIMEOUT_SECS, &raw)?),
            None => DEFAULT_PROVIDER_TIMEOUT,
        };

        let fleet_concurrency = match lookup(env_vars::FLEET_CONCURRENCY) {
            Some(raw) => usize::try_from(parse_positive(env_vars::FLEET_CONCURRENCY, &raw)?)
                .map_err(|e| anyhow!("{} out of range: {e}", env_vars::FLEET_CONCURRENCY))?,
            None => DEFAULT_FLEET_CONCURRENCY,
        };

        let config = Self {
            environment,
            database_url,
            secret_key,
            provider_timeout,
            fleet_concurrency,
        };
        info!(
            environment = %config.environment,
            database_url = %config.database_url,
            provider_timeout_secs = config.provider_timeout.as_secs(),
            fleet_concurrency = config.fleet_concurrency,
            "CGM sync configuration loaded"
        );
        Ok(config)
    }
}

fn parse_positive(name: &str, raw: &str) -> Result<u64> {
    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|e| anyhow!("{name} must be a positive integer, got '{raw}': {e}"))?;
    if value == 0 {
        return Err(anyhow!("{name} must be greater than zero"));
    }
    Ok(value)
}

// ABOUTME: Connection status state machine for per-patient upstream links
// ABOUTME: Classifies failures as authentication or transient and escalates repeated transient failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Failure classification and status transitions
//!
//! Classification and transition are separate: a [`FailureClassifier`] turns
//! an error into a [`FailureClass`], and [`next_status`] maps the class plus
//! the stored counter to the next status. Swapping the matching strategy
//! leaves the transition rule untouched.

use chrono::{DateTime, Utc};

use crate::constants::escalation::{AUTH_FAILURE_MARKERS, ERROR_THRESHOLD};
use crate::errors::{ProviderError, SyncError};
use crate::models::{ConfigurationUpdate, ConnectionStatus};

/// Kind of failure as far as the status machine cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Credentials were rejected; needs user action
    Authentication,
    /// Anything else; retried and escalated by count
    Transient,
}

/// Decides the class of a sync failure
pub trait FailureClassifier: Send + Sync {
    /// Classify `error`
    fn classify(&self, error: &SyncError) -> FailureClass;
}

/// Case-insensitive substring match of upstream text against markers
///
/// Only text that came from the provider is searched. Failures the engine
/// raises itself are classified by variant, so identifiers and numbers it
/// formats into its own messages never look like an auth rejection.
#[derive(Debug, Clone)]
pub struct AuthMarkerClassifier {
    markers: Vec<String>,
}

impl Default for AuthMarkerClassifier {
    fn default() -> Self {
        Self::new(AUTH_FAILURE_MARKERS.iter().copied())
    }
}

impl AuthMarkerClassifier {
    /// Classifier over custom markers
    pub fn new<'a>(markers: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            markers: markers.into_iter().map(str::to_lowercase).collect(),
        }
    }

    /// Classify a raw message
    #[must_use]
    pub fn classify_message(&self, message: &str) -> FailureClass {
        let message = message.to_lowercase();
        if self.markers.iter().any(|marker| message.contains(marker.as_str())) {
            FailureClass::Authentication
        } else {
            FailureClass::Transient
        }
    }
}

impl FailureClassifier for AuthMarkerClassifier {
    fn classify(&self, error: &SyncError) -> FailureClass {
        match error {
            SyncError::Provider(ProviderError::AuthenticationFailed { .. }) => {
                FailureClass::Authentication
            }
            SyncError::Provider(ProviderError::Api { status: 401, .. }) => {
                FailureClass::Authentication
            }
            SyncError::Provider(
                ProviderError::Api { message, .. }
                | ProviderError::Network { message, .. }
                | ProviderError::MalformedResponse { message, .. },
            ) => self.classify_message(message),
            SyncError::Provider(
                ProviderError::Timeout { .. }
                | ProviderError::RateLimitExceeded { .. }
                | ProviderError::Unavailable { .. },
            )
            | SyncError::NotConfigured { .. }
            | SyncError::ConfigurationRemoved { .. }
            | SyncError::NoSourceConfigured { .. }
            | SyncError::Decryption(_)
            | SyncError::Persistence(_) => FailureClass::Transient,
        }
    }
}

/// Status and counter to store after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusDecision {
    /// Next connection status
    pub status: ConnectionStatus,
    /// Next consecutive-failure counter
    pub error_count: u32,
}

/// Transition rule for one failure
///
/// Authentication failures go straight to `unauthorized` and leave the
/// counter alone. Transient failures bump the counter and escalate to
/// `error` once it reaches the threshold; below it the current status stays.
#[must_use]
pub const fn next_status(
    current: ConnectionStatus,
    error_count: u32,
    class: FailureClass,
) -> StatusDecision {
    match class {
        FailureClass::Authentication => StatusDecision {
            status: ConnectionStatus::Unauthorized,
            error_count,
        },
        FailureClass::Transient => {
            let error_count = error_count.saturating_add(1);
            let status = if error_count >= ERROR_THRESHOLD {
                ConnectionStatus::Error
            } else {
                current
            };
            StatusDecision {
                status,
                error_count,
            }
        }
    }
}

impl StatusDecision {
    /// Configuration update recording this decision
    #[must_use]
    pub fn into_update(self, message: String, attempted_at: DateTime<Utc>) -> ConfigurationUpdate {
        ConfigurationUpdate {
            connection_status: Some(self.status),
            sync_error_count: Some(self.error_count),
            last_sync_error: Some(Some(message)),
            last_sync_attempt_at: Some(attempted_at),
            last_successful_sync_at: None,
        }
    }
}

/// Update recording a sync that stored readings
#[must_use]
pub fn success_update(completed_at: DateTime<Utc>) -> ConfigurationUpdate {
    ConfigurationUpdate {
        connection_status: Some(ConnectionStatus::Active),
        sync_error_count: Some(0),
        last_sync_error: Some(None),
        last_sync_attempt_at: Some(completed_at),
        last_successful_sync_at: Some(completed_at),
    }
}

/// Update recording a reachable provider that returned nothing
///
/// The counter is not touched; an empty window is not a failure.
#[must_use]
pub fn empty_update(attempted_at: DateTime<Utc>, message: &str) -> ConfigurationUpdate {
    ConfigurationUpdate {
        connection_status: Some(ConnectionStatus::Active),
        sync_error_count: None,
        last_sync_error: Some(Some(message.to_owned())),
        last_sync_attempt_at: Some(attempted_at),
        last_successful_sync_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_matching_is_case_insensitive() {
        let classifier = AuthMarkerClassifier::default();
        for message in [
            "HTTP 401",
            "Unauthorized",
            "AccountPasswordInvalid",
            "bad Credentials",
            "AUTH required",
        ] {
            assert_eq!(
                classifier.classify_message(message),
                FailureClass::Authentication,
                "{message}"
            );
        }
        assert_eq!(
            classifier.classify_message("connection reset by peer"),
            FailureClass::Transient
        );
    }

    #[test]
    fn test_engine_text_is_never_searched() {
        let classifier = AuthMarkerClassifier::default();
        let engine_failures = [
            SyncError::NoSourceConfigured {
                config_id: "c9e4015a-7d1b-4c5e-9a3f-2b8d6e0f1a2c".to_owned(),
            },
            SyncError::Provider(ProviderError::Timeout {
                provider: "dexcom_share".to_owned(),
                seconds: 401,
            }),
            SyncError::Provider(ProviderError::RateLimitExceeded {
                provider: "dexcom_share".to_owned(),
                retry_after_secs: 1401,
            }),
            SyncError::Provider(ProviderError::Unavailable {
                provider: "invalid_provider".to_owned(),
            }),
            SyncError::Decryption("stored secret failed to open".to_owned()),
        ];
        for error in &engine_failures {
            assert_eq!(classifier.classify(error), FailureClass::Transient, "{error}");
        }
    }

    #[test]
    fn test_upstream_text_is_searched() {
        let classifier = AuthMarkerClassifier::default();
        let network = SyncError::Provider(ProviderError::Network {
            provider: "libre_linkup".to_owned(),
            message: "upstream said: Unauthorized".to_owned(),
        });
        assert_eq!(classifier.classify(&network), FailureClass::Authentication);

        let forbidden = SyncError::Provider(ProviderError::Api {
            provider: "nightscout".to_owned(),
            status: 403,
            message: "invalid API secret".to_owned(),
        });
        assert_eq!(classifier.classify(&forbidden), FailureClass::Authentication);

        let unavailable = SyncError::Provider(ProviderError::Api {
            provider: "nightscout".to_owned(),
            status: 503,
            message: "service unavailable".to_owned(),
        });
        assert_eq!(classifier.classify(&unavailable), FailureClass::Transient);
    }

    #[test]
    fn test_typed_auth_and_missing_source() {
        let classifier = AuthMarkerClassifier::default();
        let auth = SyncError::Provider(ProviderError::AuthenticationFailed {
            provider: "dexcom_share".to_owned(),
            reason: "rejected".to_owned(),
        });
        assert_eq!(classifier.classify(&auth), FailureClass::Authentication);

        let missing = SyncError::NoSourceConfigured {
            config_id: "cfg-1".to_owned(),
        };
        assert_eq!(classifier.classify(&missing), FailureClass::Transient);
    }

    #[test]
    fn test_auth_failure_ignores_counter() {
        for count in [0, 2, 5] {
            let decision = next_status(ConnectionStatus::Error, count, FailureClass::Authentication);
            assert_eq!(decision.status, ConnectionStatus::Unauthorized);
            assert_eq!(decision.error_count, count);
        }
    }

    #[test]
    fn test_transient_failures_escalate_on_third() {
        let mut status = ConnectionStatus::Active;
        let mut count = 0;
        let mut seen = Vec::new();
        for _ in 0..3 {
            let decision = next_status(status, count, FailureClass::Transient);
            status = decision.status;
            count = decision.error_count;
            seen.push((status, count));
        }
        assert_eq!(
            seen,
            vec![
                (ConnectionStatus::Active, 1),
                (ConnectionStatus::Active, 2),
                (ConnectionStatus::Error, 3),
            ]
        );
    }

    #[test]
    fn test_success_update_resets() {
        let now = Utc::now();
        let update = success_update(now);
        assert_eq!(update.connection_status, Some(ConnectionStatus::Active));
        assert_eq!(update.sync_error_count, Some(0));
        assert_eq!(update.last_sync_error, Some(None));
        assert_eq!(update.last_successful_sync_at, Some(now));
    }
}

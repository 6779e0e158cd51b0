// ABOUTME: Structured error types for glucose provider adapter calls
// ABOUTME: Carries the raw upstream message so connection status classification can inspect it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use thiserror::Error;

use super::ErrorCode;

/// Errors returned by a provider adapter or by the registry wrapping it
///
/// `Network`, `Api` and `MalformedResponse` carry upstream text verbatim;
/// the other variants hold only values the engine produced itself.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Upstream rejected the login
    #[error("{provider} authentication failed: {reason}")]
    AuthenticationFailed {
        /// Provider name
        provider: String,
        /// Upstream reason
        reason: String,
    },

    /// Upstream throttled the request
    #[error("{provider} rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimitExceeded {
        /// Provider name
        provider: String,
        /// Seconds until the upstream accepts requests again
        retry_after_secs: u64,
    },

    /// Transport-level failure
    #[error("{provider} network error: {message}")]
    Network {
        /// Provider name
        provider: String,
        /// Raw transport message
        message: String,
    },

    /// The call exceeded its deadline
    #[error("{provider} request timed out after {seconds}s")]
    Timeout {
        /// Provider name
        provider: String,
        /// Deadline that expired
        seconds: u64,
    },

    /// Upstream answered with a non-success status
    #[error("{provider} returned status {status}: {message}")]
    Api {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Raw response body or message
        message: String,
    },

    /// Upstream answered but the payload could not be mapped to readings
    #[error("{provider} returned malformed data: {message}")]
    MalformedResponse {
        /// Provider name
        provider: String,
        /// Parse failure detail
        message: String,
    },

    /// No adapter is registered for the selected provider
    #[error("no adapter registered for {provider}")]
    Unavailable {
        /// Provider name
        provider: String,
    },
}

impl ProviderError {
    /// Provider name the error originated from
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::AuthenticationFailed { provider, .. }
            | Self::RateLimitExceeded { provider, .. }
            | Self::Network { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::Api { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::Unavailable { provider } => provider,
        }
    }

    /// Standard error code for this failure
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AuthenticationFailed { .. } => ErrorCode::ExternalAuthFailed,
            Self::RateLimitExceeded { .. } => ErrorCode::ExternalRateLimited,
            Self::Timeout { .. } => ErrorCode::ExternalTimeout,
            Self::Api { status: 401, .. } => ErrorCode::ExternalAuthFailed,
            Self::Network { .. }
            | Self::Api { .. }
            | Self::MalformedResponse { .. }
            | Self::Unavailable { .. } => ErrorCode::ExternalServiceError,
        }
    }
}

/// Result alias for provider adapter calls
pub type ProviderResult<T> = Result<T, ProviderError>;

// ABOUTME: Unified error handling for the CGM sync engine
// ABOUTME: Standard error codes plus provider, store and sync error taxonomies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Unified Error Handling System
//!
//! Every failure the sync engine can surface maps onto an [`ErrorCode`], which
//! in turn carries the HTTP status an on-demand sync handler should answer with.

use serde::{Deserialize, Serialize};

/// Provider adapter errors
pub mod provider;
/// Persistent store errors
pub mod store;
/// Sync engine errors
pub mod sync;

pub use provider::{ProviderError, ProviderResult};
pub use store::{StoreError, StoreResult};
pub use sync::{SyncError, SyncResult};

/// Standard error codes used throughout the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration (1000-1999)
    /// No sync configuration matches the requested patient
    ConfigNotFound = 1000,
    /// Configuration exists but has no usable provider credential set
    ConfigMissing = 1001,

    // External Services (5000-5999)
    /// Upstream provider failed
    ExternalServiceError = 5000,
    /// Upstream provider rejected the stored credentials
    ExternalAuthFailed = 5001,
    /// Upstream provider throttled the request
    ExternalRateLimited = 5002,
    /// Upstream provider did not answer in time
    ExternalTimeout = 5003,

    // Internal Errors (9000-9999)
    /// Persistent store failure
    DatabaseError = 9001,
    /// Stored secret could not be decrypted
    DecryptionError = 9002,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::ConfigNotFound => 404,
            Self::ConfigMissing => 422,
            Self::ExternalServiceError => 502,
            Self::ExternalAuthFailed => 401,
            Self::ExternalRateLimited => 429,
            Self::ExternalTimeout => 504,
            Self::DatabaseError | Self::DecryptionError => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_http_status() {
        assert_eq!(ErrorCode::ConfigNotFound.http_status(), 404);
        assert_eq!(ErrorCode::ExternalAuthFailed.http_status(), 401);
        assert_eq!(ErrorCode::ExternalTimeout.http_status(), 504);
        assert_eq!(ErrorCode::DatabaseError.http_status(), 500);
    }

    #[test]
    fn test_sync_error_codes() {
        let missing = SyncError::NotConfigured {
            phone: "+15551234567".to_owned(),
        };
        assert_eq!(missing.code(), ErrorCode::ConfigNotFound);

        let rejected = SyncError::Provider(ProviderError::Api {
            provider: "dexcom_share".to_owned(),
            status: 401,
            message: "session expired".to_owned(),
        });
        assert_eq!(rejected.code().http_status(), 401);
    }
}

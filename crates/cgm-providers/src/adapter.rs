// ABOUTME: Core glucose provider trait and the shared request types every adapter accepts
// ABOUTME: Credential sets hold decrypted secrets in zeroizing buffers and redact them in Debug output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Provider Adapter Contract
//!
//! Every upstream glucose source exposes the same capability: given
//! credentials and a time window, return readings or fail.
//!
//! ## Request Side
//!
//! - **Credentials**: [`ProviderCredentials`], one variant per provider, with
//!   secrets already decrypted
//! - **Window**: [`FetchWindow`], minutes back from now plus a point cap
//!
//! ## Response Side
//!
//! - `Vec<Reading>` on success, possibly empty
//! - [`ProviderError`] carrying the raw upstream message on failure
//!
//! Adapters convert their own DTOs into [`Reading`] internally and tag each
//! reading with their [`ProviderKind`].

use std::fmt;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::constants::windows;
use crate::errors::ProviderResult;
use crate::models::{ProviderKind, Reading};

/// How far back to fetch and how many points to accept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    /// Minutes back from now
    pub window_minutes: u32,
    /// Maximum number of readings to return
    pub max_count: u32,
}

impl FetchWindow {
    /// Create a window
    #[must_use]
    pub const fn new(window_minutes: u32, max_count: u32) -> Self {
        Self {
            window_minutes,
            max_count,
        }
    }

    /// Window for a provider and sync mode
    ///
    /// Dexcom and Libre honor `backfill` (14 days / 4032 points instead of
    /// 3 days / 864). Nightscout always uses 24 hours / 288 points.
    #[must_use]
    pub const fn for_provider(kind: ProviderKind, backfill: bool) -> Self {
        match (kind, backfill) {
            (ProviderKind::Nightscout, _) => Self::new(
                windows::NIGHTSCOUT_WINDOW_MINUTES,
                windows::NIGHTSCOUT_MAX_COUNT,
            ),
            (_, true) => Self::new(
                windows::BACKFILL_WINDOW_MINUTES,
                windows::BACKFILL_MAX_COUNT,
            ),
            (_, false) => Self::new(windows::DEFAULT_WINDOW_MINUTES, windows::DEFAULT_MAX_COUNT),
        }
    }
}

/// Decrypted credential set for one provider
#[derive(Clone)]
pub enum ProviderCredentials {
    /// Dexcom Share login
    DexcomShare {
        /// Account username
        username: String,
        /// Plaintext password
        password: Zeroizing<String>,
    },
    /// `LibreLinkUp` login
    LibreLinkUp {
        /// Account email
        email: String,
        /// Plaintext password
        password: Zeroizing<String>,
        /// Region code, when the account is not in the default region
        region: Option<String>,
    },
    /// Nightscout site
    Nightscout {
        /// Site base URL
        url: String,
        /// Plaintext API secret, absent for public sites
        api_secret: Option<Zeroizing<String>>,
    },
}

impl ProviderCredentials {
    /// Provider these credentials belong to
    #[must_use]
    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::DexcomShare { .. } => ProviderKind::DexcomShare,
            Self::LibreLinkUp { .. } => ProviderKind::LibreLinkUp,
            Self::Nightscout { .. } => ProviderKind::Nightscout,
        }
    }

    /// Non-secret account identifier (username, email or site URL)
    #[must_use]
    pub fn account(&self) -> &str {
        match self {
            Self::DexcomShare { username, .. } => username,
            Self::LibreLinkUp { email, .. } => email,
            Self::Nightscout { url, .. } => url,
        }
    }
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DexcomShare { username, .. } => f
                .debug_struct("DexcomShare")
                .field("username", username)
                .field("password", &"[REDACTED]")
                .finish(),
            Self::LibreLinkUp { email, region, .. } => f
                .debug_struct("LibreLinkUp")
                .field("email", email)
                .field("password", &"[REDACTED]")
                .field("region", region)
                .finish(),
            Self::Nightscout { url, api_secret } => f
                .debug_struct("Nightscout")
                .field("url", url)
                .field("api_secret", &api_secret.as_ref().map(|_| "[REDACTED]"))
                .finish(),
        }
    }
}

/// Upstream glucose data source
///
/// Implementations must be `Send + Sync`; one adapter instance serves every
/// patient using that provider, so per-patient state travels in the
/// credentials argument.
#[async_trait]
pub trait GlucoseProvider: Send + Sync {
    /// Provider this adapter talks to
    fn kind(&self) -> ProviderKind;

    /// Fetch readings taken within `window`, newest first, at most `window.max_count`
    ///
    /// An empty vector means the provider was reachable but had no data.
    async fn fetch_readings(
        &self,
        credentials: &ProviderCredentials,
        window: FetchWindow,
    ) -> ProviderResult<Vec<Reading>>;
}

// ABOUTME: Connection status and provider kind enumerations with stable string forms
// ABOUTME: String forms are what the store persists and what logs report
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Health of a patient's upstream data link
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Link is healthy, or has fewer than the threshold of consecutive transient failures
    #[default]
    Active,
    /// Upstream rejected the login; needs the patient to fix credentials
    Unauthorized,
    /// Repeated transient failures
    Error,
}

impl ConnectionStatus {
    /// Stored string form
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Unauthorized => "unauthorized",
            Self::Error => "error",
        }
    }

    /// Whether a fleet sync should attempt this configuration
    #[must_use]
    pub const fn is_fleet_eligible(self) -> bool {
        matches!(self, Self::Active | Self::Error)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized stored enum value
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized {kind} value: {value}")]
pub struct ParseStatusError {
    /// Which enum failed to parse
    pub kind: &'static str,
    /// Offending value
    pub value: String,
}

impl FromStr for ConnectionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "unauthorized" => Ok(Self::Unauthorized),
            "error" => Ok(Self::Error),
            other => Err(ParseStatusError {
                kind: "connection status",
                value: other.to_owned(),
            }),
        }
    }
}

/// Upstream glucose data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Dexcom Share
    DexcomShare,
    /// Abbott `LibreLinkUp`
    LibreLinkUp,
    /// Self-hosted Nightscout site
    Nightscout,
}

impl ProviderKind {
    /// All providers, in selection priority order
    pub const PRIORITY: [Self; 3] = [Self::DexcomShare, Self::LibreLinkUp, Self::Nightscout];

    /// Source tag stored on each persisted reading
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DexcomShare => "dexcom_share",
            Self::LibreLinkUp => "libre_linkup",
            Self::Nightscout => "nightscout",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dexcom_share" => Ok(Self::DexcomShare),
            "libre_linkup" => Ok(Self::LibreLinkUp),
            "nightscout" => Ok(Self::Nightscout),
            other => Err(ParseStatusError {
                kind: "provider",
                value: other.to_owned(),
            }),
        }
    }
}
